//! API configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Environment variables that must be set before the server starts.
const REQUIRED_VARS: &[&str] = &[
    "API_KEY_MINIMAX",
    "PROJECT_ID_FIREBASE",
    "STORAGE_BUCKET_FIREBASE",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Lists every missing variable at once so a broken deployment is
    /// fixed in one pass, not one variable per restart.
    #[error("Missing required environment variables: {0}")]
    MissingVars(String),
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max request body size (bounds the source video upload)
    pub max_body_size: usize,
    /// Directory for per-job temp artifacts
    pub scratch_dir: PathBuf,
    /// Generation service bearer token
    pub minimax_api_key: String,
    /// Firestore project id
    pub firebase_project_id: String,
    /// Storage bucket name
    pub firebase_storage_bucket: String,
}

impl ApiConfig {
    /// Create config from environment variables.
    ///
    /// Fails before binding the listener if any required variable is
    /// missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let missing: Vec<&str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|key| lookup(key).map_or(true, |v| v.trim().is_empty()))
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingVars(missing.join(", ")));
        }

        Ok(Self {
            host: lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("API_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(8000),
            cors_origins: lookup("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|| vec!["*".to_string()]),
            max_body_size: lookup("MAX_BODY_SIZE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(100 * 1024 * 1024), // 100MB
            scratch_dir: lookup("SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join("vidgen")),
            minimax_api_key: lookup("API_KEY_MINIMAX").unwrap_or_default(),
            firebase_project_id: lookup("PROJECT_ID_FIREBASE").unwrap_or_default(),
            firebase_storage_bucket: lookup("STORAGE_BUCKET_FIREBASE").unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_lookup_reports_every_missing_var() {
        let vars = env(&[("API_KEY_MINIMAX", "key")]);
        let err = ApiConfig::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("PROJECT_ID_FIREBASE"));
        assert!(message.contains("STORAGE_BUCKET_FIREBASE"));
        assert!(!message.contains("API_KEY_MINIMAX"));
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let vars = env(&[
            ("API_KEY_MINIMAX", "key"),
            ("PROJECT_ID_FIREBASE", "  "),
            ("STORAGE_BUCKET_FIREBASE", "bucket"),
        ]);
        let err = ApiConfig::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(err.to_string().contains("PROJECT_ID_FIREBASE"));
    }

    #[test]
    fn test_defaults_applied_when_optionals_absent() {
        let vars = env(&[
            ("API_KEY_MINIMAX", "key"),
            ("PROJECT_ID_FIREBASE", "proj"),
            ("STORAGE_BUCKET_FIREBASE", "bucket"),
        ]);
        let config = ApiConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.cors_origins, vec!["*".to_string()]);
        assert_eq!(config.max_body_size, 100 * 1024 * 1024);
    }

    #[test]
    fn test_overrides_win() {
        let vars = env(&[
            ("API_KEY_MINIMAX", "key"),
            ("PROJECT_ID_FIREBASE", "proj"),
            ("STORAGE_BUCKET_FIREBASE", "bucket"),
            ("API_PORT", "9001"),
            ("CORS_ORIGINS", "https://a.test, https://b.test"),
        ]);
        let config = ApiConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.port, 9001);
        assert_eq!(
            config.cors_origins,
            vec!["https://a.test".to_string(), "https://b.test".to_string()]
        );
    }
}
