//! Configuration types for a conversion run.
//!
//! This module provides plain configuration structs for library usage,
//! without any CLI framework dependencies. The binary maps its flags onto
//! [`TransformConfig`]; library users build it with the `with_*` methods.
//!
//! # Example
//!
//! ```rust
//! use slack2mm::config::{RedisConfig, TransformConfig};
//!
//! let config = TransformConfig::new()
//!     .with_attachments_dir("attachments")
//!     .with_skip_attachments(true)
//!     .with_redis(RedisConfig::new("localhost:6379"));
//!
//! assert!(config.redis.is_some());
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{MigrateError, Result};

/// Maximum serialized size of post props accepted by Mattermost, in characters.
pub const DEFAULT_MAX_PROPS_RUNES: usize = 800_000;

/// Settings that drive [`Transformer::transform`](crate::core::transform::Transformer::transform).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Directory attachments are copied into (default: `bulk-export-attachments`)
    pub attachments_dir: PathBuf,

    /// Do not copy attachments from the export (default: false)
    pub skip_attachments: bool,

    /// Drop the whole message when its props are too large, instead of
    /// dropping only the props (default: false)
    pub discard_invalid_props: bool,

    /// Use the user's email as SSO auth data (default: false)
    pub auth_data_as_email: bool,

    /// SSO auth service name, used together with `auth_data_as_email`
    pub auth_service: Option<String>,

    /// Import bot/workflow messages under a synthesized user (default: false)
    pub import_workflow_messages: bool,

    /// Transform channels but no posts (default: false)
    pub skip_posts: bool,

    /// Transform neither channels nor posts (default: false)
    pub skip_channels: bool,

    /// Maximum serialized props size in characters (default: 800 000)
    pub max_props_runes: usize,

    /// Remote thread-store parameters; `Some` selects the Redis-backed store
    pub redis: Option<RedisConfig>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            attachments_dir: PathBuf::from("bulk-export-attachments"),
            skip_attachments: false,
            discard_invalid_props: false,
            auth_data_as_email: false,
            auth_service: None,
            import_workflow_messages: false,
            skip_posts: false,
            skip_channels: false,
            max_props_runes: DEFAULT_MAX_PROPS_RUNES,
            redis: None,
        }
    }
}

impl TransformConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the attachments directory.
    #[must_use]
    pub fn with_attachments_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.attachments_dir = dir.into();
        self
    }

    /// Sets whether attachments are skipped.
    #[must_use]
    pub fn with_skip_attachments(mut self, skip: bool) -> Self {
        self.skip_attachments = skip;
        self
    }

    /// Sets whether messages with oversized props are discarded entirely.
    #[must_use]
    pub fn with_discard_invalid_props(mut self, discard: bool) -> Self {
        self.discard_invalid_props = discard;
        self
    }

    /// Uses the email address as auth data for the given SSO service.
    #[must_use]
    pub fn with_auth_service(mut self, service: impl Into<String>) -> Self {
        self.auth_data_as_email = true;
        self.auth_service = Some(service.into());
        self
    }

    /// Sets whether bot/workflow messages are imported.
    #[must_use]
    pub fn with_import_workflow_messages(mut self, import: bool) -> Self {
        self.import_workflow_messages = import;
        self
    }

    /// Sets whether posts are skipped.
    #[must_use]
    pub fn with_skip_posts(mut self, skip: bool) -> Self {
        self.skip_posts = skip;
        self
    }

    /// Sets whether channels (and therefore posts) are skipped.
    #[must_use]
    pub fn with_skip_channels(mut self, skip: bool) -> Self {
        self.skip_channels = skip;
        self
    }

    /// Sets the props size limit.
    #[must_use]
    pub fn with_max_props_runes(mut self, limit: usize) -> Self {
        self.max_props_runes = limit;
        self
    }

    /// Enables the Redis-backed thread store.
    #[must_use]
    pub fn with_redis(mut self, redis: RedisConfig) -> Self {
        self.redis = Some(redis);
        self
    }

    /// Returns the auth service to apply to users, if any.
    pub fn effective_auth_service(&self) -> Option<&str> {
        if !self.auth_data_as_email {
            return None;
        }
        self.auth_service.as_deref().filter(|s| !s.is_empty())
    }
}

/// Connection parameters for the Redis thread store.
///
/// `endpoint` is either `host:port` or a full `redis://` / `rediss://` URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedisConfig {
    pub endpoint: String,
    pub login: Option<String>,
    pub password: Option<String>,
}

impl RedisConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            login: None,
            password: None,
        }
    }

    #[must_use]
    pub fn with_login(mut self, login: impl Into<String>) -> Self {
        self.login = Some(login.into());
        self
    }

    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Checks the parameters without touching the network.
    pub fn validate(&self) -> Result<()> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(MigrateError::invalid_config("redis endpoint is empty"));
        }
        if endpoint.chars().any(char::is_whitespace) {
            return Err(MigrateError::invalid_config(format!(
                "redis endpoint '{}' contains whitespace",
                endpoint
            )));
        }
        if self.password.is_some() && self.login.as_deref().is_some_and(str::is_empty) {
            return Err(MigrateError::invalid_config(
                "redis login must not be empty when a password is given",
            ));
        }
        Ok(())
    }

    /// Returns the endpoint as a URL, adding the `redis://` scheme if missing.
    pub fn url(&self) -> String {
        let endpoint = self.endpoint.trim();
        if endpoint.starts_with("redis://")
            || endpoint.starts_with("rediss://")
            || endpoint.starts_with("redis+unix://")
        {
            endpoint.to_string()
        } else {
            format!("redis://{}", endpoint)
        }
    }

    /// Builds redis connection info with the credentials applied.
    #[cfg(feature = "redis")]
    pub fn connection_info(&self) -> Result<redis::ConnectionInfo> {
        use redis::IntoConnectionInfo;

        self.validate()?;
        let mut info = self.url().into_connection_info().map_err(|e| {
            MigrateError::invalid_config(format!("malformed redis endpoint '{}': {}", self.endpoint, e))
        })?;
        if let Some(login) = self.login.as_ref().filter(|l| !l.is_empty()) {
            info.redis.username = Some(login.clone());
        }
        if let Some(password) = self.password.as_ref().filter(|p| !p.is_empty()) {
            info.redis.password = Some(password.clone());
        }
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_config_defaults() {
        let config = TransformConfig::default();
        assert_eq!(config.attachments_dir, PathBuf::from("bulk-export-attachments"));
        assert!(!config.skip_attachments);
        assert!(!config.discard_invalid_props);
        assert!(!config.import_workflow_messages);
        assert_eq!(config.max_props_runes, DEFAULT_MAX_PROPS_RUNES);
        assert!(config.redis.is_none());
    }

    #[test]
    fn test_transform_config_builder() {
        let config = TransformConfig::new()
            .with_attachments_dir("/tmp/att")
            .with_skip_attachments(true)
            .with_discard_invalid_props(true)
            .with_import_workflow_messages(true)
            .with_skip_posts(true)
            .with_max_props_runes(10);

        assert_eq!(config.attachments_dir, PathBuf::from("/tmp/att"));
        assert!(config.skip_attachments);
        assert!(config.discard_invalid_props);
        assert!(config.import_workflow_messages);
        assert!(config.skip_posts);
        assert_eq!(config.max_props_runes, 10);
    }

    #[test]
    fn test_effective_auth_service() {
        assert_eq!(TransformConfig::new().effective_auth_service(), None);

        let config = TransformConfig::new().with_auth_service("gitlab");
        assert_eq!(config.effective_auth_service(), Some("gitlab"));

        let mut config = TransformConfig::new().with_auth_service("");
        assert_eq!(config.effective_auth_service(), None);
        config.auth_service = Some("saml".into());
        config.auth_data_as_email = false;
        assert_eq!(config.effective_auth_service(), None);
    }

    #[test]
    fn test_redis_url_adds_scheme() {
        assert_eq!(RedisConfig::new("localhost:6379").url(), "redis://localhost:6379");
        assert_eq!(RedisConfig::new("rediss://cache:6380").url(), "rediss://cache:6380");
    }

    #[test]
    fn test_redis_validate() {
        assert!(RedisConfig::new("localhost:6379").validate().is_ok());
        assert!(RedisConfig::new("  ").validate().unwrap_err().is_invalid_config());
        assert!(RedisConfig::new("local host").validate().is_err());
        assert!(
            RedisConfig::new("localhost")
                .with_login("")
                .with_password("secret")
                .validate()
                .is_err()
        );
    }

    #[cfg(feature = "redis")]
    #[test]
    fn test_redis_connection_info_applies_credentials() {
        let info = RedisConfig::new("localhost:6379")
            .with_login("importer")
            .with_password("s3cret")
            .connection_info()
            .unwrap();
        assert_eq!(info.redis.username.as_deref(), Some("importer"));
        assert_eq!(info.redis.password.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = TransformConfig::new().with_redis(RedisConfig::new("cache:6379"));
        let json = serde_json::to_string(&config).unwrap();
        let parsed: TransformConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.redis, config.redis);
    }
}
