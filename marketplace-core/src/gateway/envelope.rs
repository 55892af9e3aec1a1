//! Wire envelope: `{success: true, data}` or `{success: false, message}`

use serde::Deserialize;
use serde_json::Value;

use super::NetworkError;

/// Parsed service response
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawEnvelope")]
pub enum ServiceResponse {
    Success { data: Value },
    Failure { message: String },
}

#[derive(Deserialize)]
struct RawEnvelope {
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

impl TryFrom<RawEnvelope> for ServiceResponse {
    type Error = String;

    fn try_from(raw: RawEnvelope) -> Result<Self, Self::Error> {
        if raw.success {
            return Ok(ServiceResponse::Success { data: raw.data.unwrap_or(Value::Null) });
        }
        match raw.message {
            Some(message) => Ok(ServiceResponse::Failure { message }),
            None => Err("failure envelope without message".to_string()),
        }
    }
}

impl ServiceResponse {
    /// Parse a response body received for `path`
    pub fn from_slice(path: &str, body: &[u8]) -> Result<Self, NetworkError> {
        serde_json::from_slice(body).map_err(|e| NetworkError::MalformedBody {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }
}
