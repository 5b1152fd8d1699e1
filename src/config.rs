//! Tap configuration
//!
//! The configuration is a flat JSON object supplied with `--config`. Required
//! fields are validated up front so a bad config fails before any request.

use crate::auth::AuthConfig;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Default API base URL
pub const DEFAULT_API_URL: &str = "https://api.bitbucket.org/2.0";

const REQUIRED_FIELDS: &[&str] = &["auth_username", "auth_password", "workspaces"];

/// Validated tap configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct TapConfig {
    /// Username for HTTP basic auth
    pub auth_username: String,

    /// App password for HTTP basic auth
    pub auth_password: String,

    /// Workspace slugs to sync
    pub workspaces: Vec<String>,

    /// Repository full names to sync; empty means all repositories
    #[serde(default)]
    pub repositories: Vec<String>,

    /// Earliest record timestamp to sync when no bookmark exists
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,

    /// API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl TapConfig {
    /// Parse and validate a configuration JSON value
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::config("Config must be a JSON object"))?;

        for field in REQUIRED_FIELDS {
            if obj.get(*field).is_none_or(Value::is_null) {
                return Err(Error::missing_field(*field));
            }
        }

        if let Some(start_date) = obj.get("start_date").filter(|v| !v.is_null()) {
            let valid = start_date
                .as_str()
                .is_some_and(|s| DateTime::parse_from_rfc3339(s).is_ok());
            if !valid {
                return Err(Error::invalid_value(
                    "start_date",
                    format!("expected an RFC 3339 timestamp, got {start_date}"),
                ));
            }
        }

        let config: Self = serde_json::from_value(value.clone())
            .map_err(|e| Error::config(format!("Invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a configuration JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Invalid config JSON: {e}")))?;
        Self::from_value(&value)
    }

    fn validate(&self) -> Result<()> {
        if self.workspaces.is_empty() {
            return Err(Error::invalid_value(
                "workspaces",
                "at least one workspace is required",
            ));
        }
        if self.workspaces.iter().any(|w| w.trim().is_empty()) {
            return Err(Error::invalid_value(
                "workspaces",
                "workspace slugs must not be empty",
            ));
        }
        url::Url::parse(&self.api_url)
            .map_err(|e| Error::invalid_value("api_url", e.to_string()))?;
        Ok(())
    }

    /// Basic auth credentials for the HTTP client
    pub fn auth(&self) -> AuthConfig {
        AuthConfig::basic(&self.auth_username, &self.auth_password)
    }

    /// JSON schema describing the configuration, as printed by `spec`
    pub fn json_schema() -> Value {
        json!({
            "type": "object",
            "title": "tap-bitbucket",
            "properties": {
                "auth_username": {
                    "type": "string",
                    "title": "Username",
                    "secret": true
                },
                "auth_password": {
                    "type": "string",
                    "title": "App password",
                    "secret": true
                },
                "workspaces": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Workspace slugs to sync"
                },
                "repositories": {
                    "type": "array",
                    "items": {"type": "string"},
                    "default": [],
                    "description": "Repository full names (workspace/slug) to sync; empty syncs all"
                },
                "start_date": {
                    "type": "string",
                    "format": "date-time",
                    "description": "Earliest record timestamp to sync"
                },
                "api_url": {
                    "type": "string",
                    "format": "uri",
                    "default": DEFAULT_API_URL
                }
            },
            "required": REQUIRED_FIELDS
        })
    }
}

impl std::fmt::Debug for TapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TapConfig")
            .field("auth_username", &self.auth_username)
            .field("auth_password", &"***")
            .field("workspaces", &self.workspaces)
            .field("repositories", &self.repositories)
            .field("start_date", &self.start_date)
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn base() -> Value {
        json!({
            "auth_username": "alice",
            "auth_password": "secret",
            "workspaces": ["acme"]
        })
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config = TapConfig::from_value(&base()).unwrap();

        assert_eq!(config.workspaces, vec!["acme"]);
        assert!(config.repositories.is_empty());
        assert!(config.start_date.is_none());
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_full_config() {
        let config = TapConfig::from_json(
            r#"{
                "auth_username": "alice",
                "auth_password": "secret",
                "workspaces": ["acme", "globex"],
                "repositories": ["acme/widgets"],
                "start_date": "2024-01-01T00:00:00Z",
                "api_url": "http://localhost:8080/2.0"
            }"#,
        )
        .unwrap();

        assert_eq!(config.repositories, vec!["acme/widgets"]);
        assert_eq!(
            config.start_date,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(config.api_url, "http://localhost:8080/2.0");
    }

    #[test_case("auth_username")]
    #[test_case("auth_password")]
    #[test_case("workspaces")]
    fn test_missing_required_field(field: &str) {
        let mut value = base();
        value.as_object_mut().unwrap().remove(field);

        let err = TapConfig::from_value(&value).unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { field: f } if f == field));
    }

    #[test]
    fn test_null_required_field_is_missing() {
        let mut value = base();
        value["auth_password"] = Value::Null;

        assert!(matches!(
            TapConfig::from_value(&value),
            Err(Error::MissingConfigField { .. })
        ));
    }

    #[test_case(json!("yesterday") ; "not a timestamp")]
    #[test_case(json!(20240101) ; "not a string")]
    fn test_invalid_start_date(start_date: Value) {
        let mut value = base();
        value["start_date"] = start_date;

        let err = TapConfig::from_value(&value).unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { field, .. } if field == "start_date"));
    }

    #[test]
    fn test_empty_workspaces_rejected() {
        let mut value = base();
        value["workspaces"] = json!([]);

        assert!(matches!(
            TapConfig::from_value(&value),
            Err(Error::InvalidConfigValue { .. })
        ));
    }

    #[test]
    fn test_not_an_object() {
        assert!(matches!(
            TapConfig::from_value(&json!(["acme"])),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = TapConfig::from_value(&base()).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("alice"));
    }

    #[test]
    fn test_json_schema_required() {
        let schema = TapConfig::json_schema();
        assert_eq!(
            schema["required"],
            json!(["auth_username", "auth_password", "workspaces"])
        );
        assert_eq!(schema["properties"]["repositories"]["default"], json!([]));
    }
}
