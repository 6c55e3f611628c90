//! CLI configuration: a TOML file plus environment overrides.

use std::path::Path;

use serde::Deserialize;

use exodb_directory::DirectoryConfig;

use crate::error::{CliError, CliResult};

/// Environment variable overriding the bind password, so it can stay out
/// of the config file.
const PASSWORD_ENV: &str = "EXODB_BIND_PASSWORD";

#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
    /// Server object name of the message database.
    pub server: String,

    /// DN of the first organization container.
    pub first_org_dn: String,

    /// Directory of override LDIF templates; embedded templates are used
    /// when unset.
    #[serde(default)]
    pub template_dir: Option<String>,

    /// Directory connection settings.
    pub directory: DirectoryConfig,
}

impl CliConfig {
    /// Load the configuration file and apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> CliResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| CliError::Config(format!("cannot read {}: {e}", path.display())))?;
        let mut config: Self = toml::from_str(&text)
            .map_err(|e| CliError::Config(format!("cannot parse {}: {e}", path.display())))?;

        if let Ok(password) = std::env::var(PASSWORD_ENV) {
            config.directory.bind_password = Some(password);
        }

        config.directory.validate()?;
        if config.server.is_empty() {
            return Err(CliError::Config("server name must not be empty".into()));
        }
        if config.first_org_dn.is_empty() {
            return Err(CliError::Config("first_org_dn must not be empty".into()));
        }

        Ok(config)
    }
}
