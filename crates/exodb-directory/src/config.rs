//! Directory connection configuration.

use serde::{Deserialize, Serialize};

use crate::error::{DirectoryError, DirectoryResult};

/// Configuration for a directory-database connection.
#[derive(Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Directory server hostname or IP address.
    pub host: String,

    /// Directory server port (389 for LDAP).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Use STARTTLS upgrade on the plain connection.
    #[serde(default)]
    pub use_starttls: bool,

    /// Base DN of the message database (e.g., "dc=example,dc=com").
    pub base_dn: String,

    /// Bind DN for authentication (e.g., "cn=admin,dc=example,dc=com").
    #[serde(default)]
    pub bind_dn: String,

    /// Bind password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_password: Option<String>,

    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_port() -> u16 {
    389
}

fn default_connect_timeout_secs() -> u64 {
    30
}

impl DirectoryConfig {
    /// Create a configuration for an anonymous connection.
    pub fn new(host: impl Into<String>, base_dn: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            use_starttls: false,
            base_dn: base_dn.into(),
            bind_dn: String::new(),
            bind_password: None,
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }

    /// Set bind credentials.
    #[must_use]
    pub fn with_bind(mut self, bind_dn: impl Into<String>, password: impl Into<String>) -> Self {
        self.bind_dn = bind_dn.into();
        self.bind_password = Some(password.into());
        self
    }

    /// Enable STARTTLS.
    #[must_use]
    pub fn with_starttls(mut self) -> Self {
        self.use_starttls = true;
        self
    }

    /// The connection URL for this configuration.
    pub fn url(&self) -> String {
        format!("ldap://{}:{}", self.host, self.port)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> DirectoryResult<()> {
        if self.host.is_empty() {
            return Err(DirectoryError::InvalidConfiguration {
                message: "directory host must not be empty".to_string(),
            });
        }
        if self.base_dn.is_empty() {
            return Err(DirectoryError::InvalidConfiguration {
                message: "base DN must not be empty".to_string(),
            });
        }
        if self.port == 0 {
            return Err(DirectoryError::InvalidConfiguration {
                message: "directory port must not be zero".to_string(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for DirectoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("use_starttls", &self.use_starttls)
            .field("base_dn", &self.base_dn)
            .field("bind_dn", &self.bind_dn)
            .field(
                "bind_password",
                &self.bind_password.as_ref().map(|_| "***"),
            )
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DirectoryConfig::new("ldap.example.com", "dc=example,dc=com");
        assert_eq!(config.port, 389);
        assert!(!config.use_starttls);
        assert_eq!(config.url(), "ldap://ldap.example.com:389");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_host() {
        let config = DirectoryConfig::new("", "dc=example,dc=com");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_base_dn() {
        let config = DirectoryConfig::new("ldap.example.com", "");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = DirectoryConfig::new("ldap.example.com", "dc=example,dc=com")
            .with_bind("cn=admin,dc=example,dc=com", "hunter2");
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_deserialize_applies_defaults() {
        let config: DirectoryConfig = serde_json::from_str(
            r#"{"host": "ldap.example.com", "base_dn": "dc=example,dc=com"}"#,
        )
        .unwrap();
        assert_eq!(config.port, 389);
        assert_eq!(config.connect_timeout_secs, 30);
    }
}
