//! RPC Error Types
//!
//! Maps application errors to JSON-RPC error codes (ADR-020).

use jsonrpsee::types::ErrorObjectOwned;
use ome_core::domain::DomainError;
use ome_core::error::AppError;

/// RPC Error Codes (ADR-020)
pub mod code {
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const NOT_FOUND: i32 = 4001;
    pub const CONFLICT: i32 = 4002;
    pub const THROTTLED: i32 = 4003;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const EXECUTIONER_ERROR: i32 = 5002;
}

/// Convert AppError to JSON-RPC ErrorObject
pub fn to_rpc_error(err: AppError) -> ErrorObjectOwned {
    let code = match &err {
        AppError::Validation(_) | AppError::Serialization(_) => code::VALIDATION_ERROR,
        AppError::NotFound(_) => code::NOT_FOUND,
        AppError::Conflict(_) => code::CONFLICT,
        AppError::Domain(e) => domain_code(e),
        AppError::Executioner(_) => code::EXECUTIONER_ERROR,
        AppError::Config(_) | AppError::Internal(_) => code::INTERNAL_ERROR,
    };
    ErrorObjectOwned::owned(code, err.to_string(), None::<()>)
}

fn domain_code(err: &DomainError) -> i32 {
    match err {
        DomainError::OrderNotFound(_) => code::NOT_FOUND,
        DomainError::DuplicateOrder(_) => code::CONFLICT,
        _ => code::VALIDATION_ERROR,
    }
}

pub fn throttled() -> ErrorObjectOwned {
    ErrorObjectOwned::owned(
        code::THROTTLED,
        "Rate limit exceeded. Please slow down.",
        None::<()>,
    )
}
