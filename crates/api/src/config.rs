use serde::Deserialize;
use std::net::SocketAddr;

use domain::services::{CollectionIds, ControllerConfig};
use persistence::BackendConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub backend: BackendSettings,
    pub collections: CollectionsConfig,
    pub storage: StorageConfig,
    pub functions: FunctionsConfig,
    pub limits: LimitsConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Upper bound for request bodies; drafts may carry a base64 image.
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Connection to the hosted backend.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendSettings {
    pub endpoint: String,

    pub project_id: String,

    /// Server API key; empty to call the backend without one
    #[serde(default)]
    pub api_key: String,

    pub database_id: String,

    #[serde(default = "default_backend_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionsConfig {
    #[serde(default = "default_activities_collection")]
    pub activities: String,

    #[serde(default = "default_registrations_collection")]
    pub activity_registrations: String,

    #[serde(default = "default_users_collection")]
    pub users: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_images_bucket")]
    pub images_bucket: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionsConfig {
    /// Function executed by approval links
    #[serde(default = "default_request_approval_function")]
    pub request_approval: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    /// Maximum registrations fetched for one activity
    #[serde(default = "default_fetch_limit")]
    pub registration_fetch_limit: u32,

    /// Maximum user ids per join query
    #[serde(default = "default_fetch_limit")]
    pub user_batch_limit: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Expected `X-Admin-Key`; empty disables the check
    #[serde(default)]
    pub admin_key: String,

    #[serde(default)]
    pub cors_origins: Vec<String>,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_body_size() -> usize {
    10_485_760
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_backend_timeout_ms() -> u64 {
    15_000
}
fn default_activities_collection() -> String {
    "activities".to_string()
}
fn default_registrations_collection() -> String {
    "activity_registrations".to_string()
}
fn default_users_collection() -> String {
    "users".to_string()
}
fn default_images_bucket() -> String {
    "images".to_string()
}
fn default_request_approval_function() -> String {
    "request-approval".to_string()
}
fn default_page_size() -> u32 {
    10
}
fn default_max_page_size() -> u32 {
    100
}
fn default_fetch_limit() -> u32 {
    100
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with DORM__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("DORM")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("security.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// Defaults are embedded so tests do not depend on config files.
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30
            max_body_size = 10485760

            [logging]
            level = "info"
            format = "json"

            [backend]
            endpoint = ""
            project_id = ""
            api_key = ""
            database_id = "main"
            timeout_ms = 15000

            [collections]
            activities = "activities"
            activity_registrations = "activity_registrations"
            users = "users"

            [storage]
            images_bucket = "images"

            [functions]
            request_approval = "request-approval"

            [limits]
            default_page_size = 10
            max_page_size = 100
            registration_fetch_limit = 100
            user_batch_limit = 100

            [security]
            admin_key = ""
            cors_origins = []
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        // Skip validation in tests to allow partial configs
        Ok(cfg)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.backend.endpoint.trim().is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "DORM__BACKEND__ENDPOINT environment variable must be set".to_string(),
            ));
        }

        if self.backend.project_id.trim().is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "DORM__BACKEND__PROJECT_ID environment variable must be set".to_string(),
            ));
        }

        if self.backend.database_id.trim().is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "backend.database_id must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        for (name, value) in [
            ("limits.default_page_size", self.limits.default_page_size),
            ("limits.max_page_size", self.limits.max_page_size),
            ("limits.registration_fetch_limit", self.limits.registration_fetch_limit),
            ("limits.user_batch_limit", self.limits.user_batch_limit),
        ] {
            if value == 0 {
                return Err(ConfigValidationError::InvalidValue(format!(
                    "{} cannot be 0",
                    name
                )));
            }
        }

        if self.limits.default_page_size > self.limits.max_page_size {
            return Err(ConfigValidationError::InvalidValue(
                "default_page_size cannot exceed max_page_size".to_string(),
            ));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }

    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            endpoint: self.backend.endpoint.clone(),
            project_id: self.backend.project_id.clone(),
            api_key: self.backend.api_key.clone(),
            database_id: self.backend.database_id.clone(),
            timeout_ms: self.backend.timeout_ms,
        }
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            collections: CollectionIds {
                activities: self.collections.activities.clone(),
                activity_registrations: self.collections.activity_registrations.clone(),
                users: self.collections.users.clone(),
            },
            images_bucket: self.storage.images_bucket.clone(),
            registration_fetch_limit: self.limits.registration_fetch_limit,
            user_batch_limit: self.limits.user_batch_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_overrides() -> Vec<(&'static str, &'static str)> {
        vec![
            ("backend.endpoint", "https://backend.test/v1"),
            ("backend.project_id", "dorm-admin"),
        ]
    }

    #[test]
    fn test_config_load_with_defaults() {
        let config = Config::load_for_test(&valid_overrides()).expect("Failed to load config");

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.limits.registration_fetch_limit, 100);
        assert_eq!(config.collections.activities, "activities");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_env_override() {
        let mut overrides = valid_overrides();
        overrides.push(("server.port", "9000"));
        overrides.push(("limits.user_batch_limit", "25"));
        let config = Config::load_for_test(&overrides).expect("Failed to load config");

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.controller_config().user_batch_limit, 25);
    }

    #[test]
    fn test_config_validation_missing_endpoint() {
        let config = Config::load_for_test(&[]).expect("Failed to load config");
        let result = config.validate();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("DORM__BACKEND__ENDPOINT"));
    }

    #[test]
    fn test_config_validation_zero_limit() {
        let mut overrides = valid_overrides();
        overrides.push(("limits.registration_fetch_limit", "0"));
        let config = Config::load_for_test(&overrides).expect("Failed to load config");

        let result = config.validate();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("registration_fetch_limit"));
    }

    #[test]
    fn test_config_validation_page_size_bounds() {
        let mut overrides = valid_overrides();
        overrides.push(("limits.default_page_size", "500"));
        let config = Config::load_for_test(&overrides).expect("Failed to load config");

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_socket_addr() {
        let mut overrides = valid_overrides();
        overrides.push(("server.host", "127.0.0.1"));
        overrides.push(("server.port", "3000"));
        let config = Config::load_for_test(&overrides).expect("Failed to load config");

        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn test_backend_config_mapping() {
        let config = Config::load_for_test(&valid_overrides()).expect("Failed to load config");
        let backend = config.backend_config();
        assert_eq!(backend.endpoint, "https://backend.test/v1");
        assert_eq!(backend.project_id, "dorm-admin");
        assert_eq!(backend.database_id, "main");
        assert_eq!(backend.timeout_ms, 15_000);
    }
}
