//! Error codes and the response envelope
//!
//! Every command answers with `{"Result": ..., "Error": <code>}`. A failure
//! without its own message carries the code's description as the result.

use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Wire error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrCode {
    Success,
    Error,
    PowServiceNotStarted,
    InvalidMethod,
    InvalidParams,
    InvalidTransaction,
    InvalidAsset,
    UnknownTransaction,
    UnknownAsset,
    UnknownBlock,
    InternalError,
    TransmitFailed,
}

impl ErrCode {
    pub fn code(self) -> i64 {
        match self {
            ErrCode::Success => 0,
            ErrCode::Error => -1,
            ErrCode::PowServiceNotStarted => 41004,
            ErrCode::InvalidMethod => 42001,
            ErrCode::InvalidParams => 42002,
            ErrCode::InvalidTransaction => 43001,
            ErrCode::InvalidAsset => 43002,
            ErrCode::UnknownTransaction => 44001,
            ErrCode::UnknownAsset => 44002,
            ErrCode::UnknownBlock => 44003,
            ErrCode::InternalError => 45002,
            ErrCode::TransmitFailed => 45012,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ErrCode::Success => "Success",
            ErrCode::Error => "Unclassified error",
            ErrCode::PowServiceNotStarted => "pow service not started",
            ErrCode::InvalidMethod => "Invalid method",
            ErrCode::InvalidParams => "Invalid Params",
            ErrCode::InvalidTransaction => "Invalid transaction",
            ErrCode::InvalidAsset => "Invalid asset",
            ErrCode::UnknownTransaction => "Unknown Transaction",
            ErrCode::UnknownAsset => "Unknown asset",
            ErrCode::UnknownBlock => "Unknown Block",
            ErrCode::InternalError => "Internal error",
            ErrCode::TransmitFailed => "Transmit failed",
        }
    }
}

impl fmt::Display for ErrCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl Serialize for ErrCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.code())
    }
}

/// A failed command
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code} ({}): {message}", .code.code())]
pub struct RpcError {
    pub code: ErrCode,
    /// Empty when the code's description says enough
    pub message: String,
}

impl RpcError {
    pub fn new(code: ErrCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Failure reported with the code's description only
    pub fn from_code(code: ErrCode) -> Self {
        Self::new(code, "")
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrCode::InvalidParams, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrCode::InternalError, message)
    }
}

pub type RpcResult = Result<Value, RpcError>;

/// Standard response envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    #[serde(rename = "Result")]
    pub result: Value,
    #[serde(rename = "Error")]
    pub error: ErrCode,
}

impl Response {
    pub fn success(result: Value) -> Self {
        Self {
            result,
            error: ErrCode::Success,
        }
    }

    pub fn failure(err: RpcError) -> Self {
        let result = if err.message.is_empty() {
            Value::String(err.code.description().to_string())
        } else {
            Value::String(err.message)
        };
        Self {
            result,
            error: err.code,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error == ErrCode::Success
    }
}

impl From<RpcResult> for Response {
    fn from(result: RpcResult) -> Self {
        match result {
            Ok(value) => Response::success(value),
            Err(err) => Response::failure(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_codes() {
        assert_eq!(ErrCode::Success.code(), 0);
        assert_eq!(ErrCode::Error.code(), -1);
        assert_eq!(ErrCode::InvalidMethod.code(), 42001);
        assert_eq!(ErrCode::InvalidParams.code(), 42002);
        assert_eq!(ErrCode::UnknownBlock.code(), 44003);
        assert_eq!(ErrCode::InternalError.code(), 45002);
        assert_eq!(ErrCode::TransmitFailed.code(), 45012);
    }

    #[test]
    fn test_empty_message_uses_description() {
        let response = Response::failure(RpcError::from_code(ErrCode::InvalidMethod));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"Result": "Invalid method", "Error": 42001})
        );
    }

    #[test]
    fn test_explicit_message_kept() {
        let result: RpcResult = Err(RpcError::internal("block hash unknown"));
        let response = Response::from(result);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"Result": "block hash unknown", "Error": 45002})
        );
        assert!(!response.is_success());
    }

    #[test]
    fn test_success_envelope() {
        let result: RpcResult = Ok(json!(true));
        let response = Response::from(result);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"Result": true, "Error": 0})
        );
    }
}
