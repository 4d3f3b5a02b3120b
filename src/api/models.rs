use serde::{Deserialize, Serialize};
use validator::Validate;

// ========== REQUEST MODELS ==========

/// Body of `POST /api/v1/getHash`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GetHashRequest {
    #[validate(length(equal = 42, message = "The length of contract address should be 42."))]
    pub contract: String,

    #[validate(range(max = 9999, message = "The pollId should be less than 10000."))]
    pub poll_id: u64,

    #[validate(range(min = 1, max = 10, message = "The number of choices should be less than 11."))]
    pub choice: u8,

    #[validate(length(equal = 42, message = "The address length should be 42."))]
    pub address: String,
}

// ========== RESPONSE MODELS ==========

#[derive(Debug, Serialize)]
pub struct GetHashResponse {
    pub hash: String,
}
