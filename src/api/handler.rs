use std::sync::Arc;

use alloy::primitives::Address;
use axum::{extract::State, Json};
use tracing::info;
use validator::Validate;

use super::models::{GetHashRequest, GetHashResponse};
use crate::commitment::CommitmentHashService;
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct AppState {
    pub commitments: Arc<CommitmentHashService>,
}

/// Liveness marker.
/// GET /
pub async fn index() -> &'static str {
    "Hello World!"
}

/// Issue the commitment hash binding a bettor's hidden choice.
/// POST /api/v1/getHash
pub async fn get_hash(
    State(state): State<AppState>,
    Json(request): Json<GetHashRequest>,
) -> AppResult<Json<GetHashResponse>> {
    request.validate()?;

    let contract = parse_address("contract", &request.contract)?;
    let bettor = parse_address("address", &request.address)?;

    let salt = state
        .commitments
        .get_or_create_salt(contract, request.poll_id)
        .await?;
    let hash = CommitmentHashService::compute_hash(request.choice, bettor, salt);

    info!(poll_id = request.poll_id, "issued commitment hash");
    Ok(Json(GetHashResponse {
        hash: hash.to_string(),
    }))
}

fn parse_address(field: &str, value: &str) -> AppResult<Address> {
    if !value.starts_with("0x") {
        return Err(AppError::Validation(format!(
            "The {field} should be a 0x-prefixed address."
        )));
    }
    value
        .parse()
        .map_err(|_| AppError::Validation(format!("The {field} is not a well-formed address.")))
}
