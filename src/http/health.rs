//! Liveness route.

use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    /// RFC 3339 UTC timestamp with millisecond precision.
    pub timestamp: String,
}

impl HealthStatus {
    pub fn now() -> Self {
        Self {
            status: "ok",
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// `GET /health`: always 200 while the process is serving.
pub async fn health_handler() -> Json<HealthStatus> {
    Json(HealthStatus::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn test_health_status() {
        let health = HealthStatus::now();
        assert_eq!(health.status, "ok");
        assert!(health.timestamp.ends_with('Z'));
        assert!(DateTime::parse_from_rfc3339(&health.timestamp).is_ok());
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(HealthStatus::now()).unwrap();
        assert_eq!(json["status"], "ok");
        assert!(json["timestamp"].is_string());
        assert_eq!(json.as_object().unwrap().len(), 2);
    }
}
