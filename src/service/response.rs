//! Structured responses of the service facade

use serde::{Deserialize, Serialize};

/// Payload of responses that carry nothing but their outcome
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Empty {}

/// `{"result": bool, "error"?: string, ...payload}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub result: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(flatten)]
    pub payload: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(payload: T) -> Self {
        Self {
            result: true,
            error: None,
            payload: Some(payload),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            result: false,
            error: Some(message.into()),
            payload: None,
        }
    }
}

impl ApiResponse<Empty> {
    pub fn success() -> Self {
        Self::ok(Empty {})
    }
}
