use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::VerdictDetail;
use crate::fee::{FeeAmount, FeeBreakdown, FeeInputs};
use crate::interpreter::LIBRARY_VERSION;

/// Verdict of a validation request.
#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub request_id: Uuid,

    /// Contract address (upper-case hex)
    pub contract: String,

    /// Registry version the contract was compiled from
    pub registry_version: String,

    /// Built-in function set the rules ran against
    pub library_version: u32,

    #[serde(flatten)]
    pub detail: VerdictDetail,
}

impl ValidateResponse {
    pub fn new(contract: String, registry_version: String, detail: VerdictDetail) -> Self {
        ValidateResponse {
            request_id: Uuid::new_v4(),
            contract,
            registry_version,
            library_version: LIBRARY_VERSION,
            detail,
        }
    }
}

/// Fee of a transaction with its terms.
#[derive(Debug, Serialize)]
pub struct FeeResponse {
    pub request_id: Uuid,

    /// Fee in the smallest UCO unit
    pub fee: FeeAmount,

    /// Same fee in UCO
    pub fee_uco: Decimal,

    pub breakdown: FeeBreakdown,

    pub inputs: FeeInputs,
}

impl FeeResponse {
    pub fn new(inputs: FeeInputs, breakdown: FeeBreakdown) -> Self {
        FeeResponse {
            request_id: Uuid::new_v4(),
            fee: breakdown.total,
            fee_uco: breakdown.total.to_uco(),
            breakdown,
            inputs,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub registry_version: String,
    pub uptime_secs: u64,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub registry_version: String,
    pub contracts: usize,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        ErrorResponse {
            error: error.into(),
            code: code.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ErrorResponse::new(message, "BAD_REQUEST")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ErrorResponse::new(message, "NOT_FOUND")
    }
}
