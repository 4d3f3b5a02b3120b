// Poll reconciliation and settlement core
pub mod ingest;
pub mod models;
pub mod pending;
pub mod scheduler;
