//! API response types

use ferry_core::MigrationMeta;
use serde::{Deserialize, Serialize};

/// `GET /migrations/all`: executed followed by pending
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllResponse {
    /// Every known migration
    pub all: Vec<MigrationMeta>,
}

/// `GET /migrations/pending`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingResponse {
    /// Migrations not yet executed
    pub pending: Vec<MigrationMeta>,
}

/// `GET /migrations/executed`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutedResponse {
    /// Migrations already executed
    pub executed: Vec<MigrationMeta>,
}

/// Every `POST` run endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationsResponse {
    /// Migrations applied or reverted by the call, in run order
    pub migrations: Vec<MigrationMeta>,
}

/// Body of 401 and 500 responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable failure
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_keys() {
        let meta = vec![MigrationMeta::named("m1")];

        let all = serde_json::to_value(AllResponse { all: meta.clone() }).unwrap();
        assert_eq!(all, json!({ "all": [{ "name": "m1" }] }));

        let runs = serde_json::to_value(MigrationsResponse { migrations: Vec::new() }).unwrap();
        assert_eq!(runs, json!({ "migrations": [] }));
    }

    #[test]
    fn test_error_response_roundtrip() {
        let parsed: ErrorResponse =
            serde_json::from_value(json!({ "message": "Invalid secret key" })).unwrap();
        assert_eq!(parsed.message, "Invalid secret key");
    }
}
