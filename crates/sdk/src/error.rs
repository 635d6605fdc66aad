//! SDK Error Types

use thiserror::Error;

/// SDK Result type
pub type Result<T> = std::result::Result<T, SdkError>;

/// SDK Error
#[derive(Debug, Error)]
pub enum SdkError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("RPC error ({code}): {message}")]
    Rpc { code: i32, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<jsonrpsee::core::ClientError> for SdkError {
    fn from(e: jsonrpsee::core::ClientError) -> Self {
        match e {
            jsonrpsee::core::ClientError::Call(call_err) => SdkError::Rpc {
                code: call_err.code(),
                message: call_err.message().to_string(),
            },
            jsonrpsee::core::ClientError::Transport(e) => {
                SdkError::Transport(format!("Transport error: {}", e))
            }
            jsonrpsee::core::ClientError::RestartNeeded(_) => {
                SdkError::Connection("Connection restart needed".to_string())
            }
            jsonrpsee::core::ClientError::ParseError(e) => {
                SdkError::Other(format!("Parse error: {}", e))
            }
            _ => SdkError::Other(e.to_string()),
        }
    }
}

/// Engine error codes carried in `SdkError::Rpc`
pub mod code {
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const NOT_FOUND: i32 = 4001;
    pub const CONFLICT: i32 = 4002;
    pub const THROTTLED: i32 = 4003;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const EXECUTIONER_ERROR: i32 = 5002;
}

impl SdkError {
    /// Engine error code, if the call reached the engine
    pub fn rpc_code(&self) -> Option<i32> {
        match self {
            SdkError::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.rpc_code() == Some(code::NOT_FOUND)
    }

    /// Worth retrying later (rate limited)
    pub fn is_throttled(&self) -> bool {
        self.rpc_code() == Some(code::THROTTLED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonrpsee::types::ErrorObjectOwned;

    #[test]
    fn test_call_error_keeps_code() {
        let err = SdkError::from(jsonrpsee::core::ClientError::Call(ErrorObjectOwned::owned(
            code::NOT_FOUND,
            "Market 0xaa not found",
            None::<()>,
        )));

        assert_eq!(err.rpc_code(), Some(code::NOT_FOUND));
        assert!(err.is_not_found());
        assert!(!err.is_throttled());
        assert!(err.to_string().contains("Market 0xaa not found"));
    }

    #[test]
    fn test_non_rpc_error_has_no_code() {
        let err = SdkError::Connection("refused".to_string());
        assert_eq!(err.rpc_code(), None);
    }
}
