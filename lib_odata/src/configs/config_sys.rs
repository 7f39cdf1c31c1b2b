use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use static_init::dynamic;
use thiserror::Error;
use url::Url;

/// Environment variable naming the configuration file to load.
const CONFIG_ENV_VAR: &str = "CAMPUS_CONFIG";
/// Configuration file name used when nothing else is specified.
const CONFIG_DEFAULT_NAME: &str = "config.json";

#[derive(Debug, Error, Clone)]
/// Errors raised while loading or validating the system configuration.
pub enum SysConfigError {
    /// The configuration file could not be read.
    #[error("I/O error occurred while reading {path}: {detail}")]
    IoError {
        /// The file that failed to load.
        path: String,
        /// The underlying error text.
        detail: String,
    },

    /// The configuration file was not valid JSON.
    #[error("JSON parse error: {0}")]
    JsonError(String),

    /// A required value was present neither in the file nor the environment.
    #[error("Missing required configuration value: {0}")]
    MissingValue(&'static str),

    /// The integration URI did not parse as an absolute URL.
    #[error("Invalid integration URI '{uri}': {detail}")]
    InvalidUri {
        /// The rejected URI.
        uri: String,
        /// The underlying error text.
        detail: String,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// Credentials and endpoint for the CNS OData service.
pub struct CnsConfig {
    /// The service account used for basic authentication.
    #[serde(default)]
    pub username: String,
    /// The service account's password.
    #[serde(default)]
    pub password: String,
    /// Base URI of the integration endpoint, always with a trailing slash.
    #[serde(default)]
    pub integration_uri: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// The full system configuration for the extraction tooling.
pub struct SysConfig {
    /// CNS service settings.
    #[serde(default)]
    pub cns: CnsConfig,
    /// Redis connection string for the shared query cache, when one is
    /// deployed.
    #[serde(default)]
    pub redis_url: Option<String>,
    /// Hours a cached query response stays valid.
    #[serde(default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: u64,
}

fn default_cache_ttl_hours() -> u64 {
    48
}

// Load the configuration once per process; every consumer gets a copy.
#[dynamic]
static SYS_CONFIG: Result<SysConfig, SysConfigError> = load_sys_config(None);

/// Loads the system configuration.
///
/// The file is taken from `path`, then the `CAMPUS_CONFIG` environment
/// variable, then `./config.json`; a missing file is not an error, the
/// values can come entirely from the environment. Environment variables
/// `CNS_USERNAME`, `CNS_PASSWORD`, `CNS_INTEGRATION_URI` and
/// `CAMPUS_REDIS_URL` override their file counterparts.
///
/// Credentials and the integration URI are required; the URI must be an
/// absolute URL and is normalized to end with `/` so endpoint paths can be
/// appended directly.
pub fn load_sys_config(path: Option<&Path>) -> Result<SysConfig, SysConfigError> {
    // 1. Resolve the configuration file location
    let config_path: PathBuf = match path {
        Some(explicit) => explicit.to_path_buf(),
        None => env::var(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(CONFIG_DEFAULT_NAME)),
    };

    // 2. Parse the file when it exists
    let mut config: SysConfig = if config_path.is_file() {
        let content = std::fs::read_to_string(&config_path).map_err(|e| SysConfigError::IoError {
            path: config_path.display().to_string(),
            detail: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| SysConfigError::JsonError(e.to_string()))?
    } else {
        SysConfig::default()
    };

    // 3. Apply environment overrides
    if let Ok(username) = env::var("CNS_USERNAME") {
        config.cns.username = username;
    }
    if let Ok(password) = env::var("CNS_PASSWORD") {
        config.cns.password = password;
    }
    if let Ok(uri) = env::var("CNS_INTEGRATION_URI") {
        config.cns.integration_uri = uri;
    }
    if let Ok(redis_url) = env::var("CAMPUS_REDIS_URL") {
        config.redis_url = Some(redis_url);
    }

    // 4. Validate
    if config.cns.username.is_empty() {
        return Err(SysConfigError::MissingValue("cns.username"));
    }
    if config.cns.password.is_empty() {
        return Err(SysConfigError::MissingValue("cns.password"));
    }
    if config.cns.integration_uri.is_empty() {
        return Err(SysConfigError::MissingValue("cns.integration_uri"));
    }
    if let Err(e) = Url::parse(&config.cns.integration_uri) {
        return Err(SysConfigError::InvalidUri {
            uri: config.cns.integration_uri.clone(),
            detail: e.to_string(),
        });
    }
    if !config.cns.integration_uri.ends_with('/') {
        config.cns.integration_uri.push('/');
    }

    Ok(config)
}

/// Returns a copy of the process-wide configuration loaded at startup.
pub fn get_sys_config() -> Result<SysConfig, SysConfigError> {
    match &*SYS_CONFIG {
        Ok(config) => Ok(config.clone()),
        Err(e) => Err(e.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_a_complete_configuration_file() {
        let file = write_config(
            r#"{
                "cns": {
                    "username": "svc_extract",
                    "password": "hunter2",
                    "integration_uri": "https://cns.example.edu/api"
                },
                "redis_url": "redis://127.0.0.1/",
                "cache_ttl_hours": 12
            }"#,
        );

        let config = load_sys_config(Some(file.path())).unwrap();
        assert_eq!(config.cns.username, "svc_extract");
        // The integration URI is normalized to carry a trailing slash.
        assert_eq!(config.cns.integration_uri, "https://cns.example.edu/api/");
        assert_eq!(config.redis_url.as_deref(), Some("redis://127.0.0.1/"));
        assert_eq!(config.cache_ttl_hours, 12);
    }

    #[test]
    fn cache_ttl_defaults_to_48_hours() {
        let file = write_config(
            r#"{
                "cns": {
                    "username": "svc_extract",
                    "password": "hunter2",
                    "integration_uri": "https://cns.example.edu/api/"
                }
            }"#,
        );

        let config = load_sys_config(Some(file.path())).unwrap();
        assert_eq!(config.cache_ttl_hours, 48);
        assert!(config.redis_url.is_none());
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let file = write_config(r#"{"cns": {"integration_uri": "https://cns.example.edu/"}}"#);
        let outcome = load_sys_config(Some(file.path()));
        assert!(matches!(outcome, Err(SysConfigError::MissingValue(_))));
    }

    #[test]
    fn a_relative_integration_uri_is_rejected() {
        let file = write_config(
            r#"{
                "cns": {
                    "username": "svc_extract",
                    "password": "hunter2",
                    "integration_uri": "cns.example.edu/api"
                }
            }"#,
        );

        let outcome = load_sys_config(Some(file.path()));
        assert!(matches!(outcome, Err(SysConfigError::InvalidUri { .. })));
    }

    #[test]
    fn malformed_json_is_reported() {
        let file = write_config("{ not json");
        let outcome = load_sys_config(Some(file.path()));
        assert!(matches!(outcome, Err(SysConfigError::JsonError(_))));
    }
}
