//! Response envelope shared by every HTTP route.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FieldViolation, FieldforgeError};

pub const SUCCESS: i32 = 0;
pub const INVALID_REQUEST: i32 = 400;
pub const UNAUTHORIZED: i32 = 403;
pub const INTERNAL_ERROR: i32 = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response<T> {
    /// 0 on success, otherwise one of the error codes above
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<FieldViolation>,
    /// Correlates a generic internal-error message with the server log
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub timestamp: DateTime<Utc>,
}

impl<T> Response<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: SUCCESS,
            message: "Success".to_string(),
            violations: Vec::new(),
            incident_id: None,
            data: Some(data),
            timestamp: Utc::now(),
        }
    }

    /// Map an error to its envelope.
    ///
    /// Internal and configuration failures are logged in full and reported
    /// with a generic message and an incident id.
    pub fn from_error(err: &FieldforgeError) -> Self {
        let (code, message, incident_id) = match err {
            FieldforgeError::Validation { message, .. } => (INVALID_REQUEST, message.clone(), None),
            FieldforgeError::NotFound(_) | FieldforgeError::StorageConflict(_) => {
                (INVALID_REQUEST, err.to_string(), None)
            }
            FieldforgeError::Authorization(_) => (UNAUTHORIZED, err.to_string(), None),
            FieldforgeError::Configuration(_) | FieldforgeError::Internal(_) => {
                let incident = Uuid::new_v4();
                tracing::error!(incident = %incident, "Request failed: {}", err);
                (
                    INTERNAL_ERROR,
                    format!("An unexpected error occurred (incident {})", incident),
                    Some(incident),
                )
            }
        };

        Self {
            code,
            message,
            violations: err.violations().to_vec(),
            incident_id,
            data: None,
            timestamp: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == SUCCESS
    }
}

impl<T> From<crate::error::Result<T>> for Response<T> {
    fn from(result: crate::error::Result<T>) -> Self {
        match result {
            Ok(data) => Response::success(data),
            Err(err) => Response::from_error(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let invalid: Response<()> = Response::from_error(&FieldforgeError::invalid_field("field1", "bad"));
        assert_eq!(invalid.code, INVALID_REQUEST);
        assert!(invalid.message.contains("field1"));
        assert_eq!(invalid.violations.len(), 1);

        let missing: Response<()> = Response::from_error(&FieldforgeError::NotFound("extension 'x'".into()));
        assert_eq!(missing.code, INVALID_REQUEST);

        let denied: Response<()> = Response::from_error(&FieldforgeError::Authorization("x".into()));
        assert_eq!(denied.code, UNAUTHORIZED);
    }

    #[test]
    fn test_internal_errors_do_not_leak_details() {
        let response: Response<()> =
            Response::from_error(&FieldforgeError::Internal("connection string secret".into()));

        assert_eq!(response.code, INTERNAL_ERROR);
        assert!(!response.message.contains("secret"));
        let incident = response.incident_id.unwrap();
        assert!(response.message.contains(&incident.to_string()));
    }

    #[test]
    fn test_success_serialization() {
        let response = Response::success(vec![1, 2]);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["code"], 0);
        assert_eq!(json["data"], serde_json::json!([1, 2]));
        assert!(json.get("violations").is_none());
    }
}
