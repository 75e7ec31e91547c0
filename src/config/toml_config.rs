use crate::domain::catalog::AnalysisKind;
use crate::domain::cim::CimExportOptions;
use crate::utils::error::{NeplanError, Result};
use crate::utils::validation::{
    validate_file_extensions, validate_non_empty_string, validate_password_hash, validate_range,
    validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File-based defaults; every section is optional and the CLI overrides it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub connection: Option<ConnectionSection>,
    pub analysis: Option<AnalysisSection>,
    pub export: Option<CimExportOptions>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionSection {
    pub server: Option<String>,
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub accept_invalid_certs: Option<bool>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisSection {
    pub module: Option<String>,
    pub output_dir: Option<String>,
    pub operational_state: Option<String>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| NeplanError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| NeplanError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        if let Some(connection) = &self.connection {
            if let Some(server) = &connection.server {
                validate_url("connection.server", server)?;
            }
            if let Some(username) = &connection.username {
                validate_non_empty_string("connection.username", username)?;
            }
            if let Some(hash) = &connection.password_hash {
                validate_password_hash("connection.password_hash", hash)?;
            }
            if let Some(timeout) = connection.timeout_seconds {
                validate_range("connection.timeout_seconds", timeout, 1, 86_400)?;
            }
        }

        if let Some(module) = self.analysis.as_ref().and_then(|a| a.module.as_deref()) {
            module
                .parse::<AnalysisKind>()
                .map_err(|_| NeplanError::InvalidConfigValueError {
                    field: "analysis.module".to_string(),
                    value: module.to_string(),
                    reason: "Unknown analysis module".to_string(),
                })?;
        }

        if let Some(boundary) = self.export.as_ref().and_then(|e| e.boundary_path.clone()) {
            validate_file_extensions("export.boundary_path", &[boundary], &["zip"])?;
        }

        Ok(())
    }

    pub fn analysis_module(&self) -> Option<&str> {
        self.analysis.as_ref().and_then(|a| a.module.as_deref())
    }

    pub fn output_dir(&self) -> Option<&str> {
        self.analysis.as_ref().and_then(|a| a.output_dir.as_deref())
    }

    pub fn operational_state(&self) -> Option<&str> {
        self.analysis
            .as_ref()
            .and_then(|a| a.operational_state.as_deref())
    }

    pub fn export_options(&self) -> CimExportOptions {
        self.export.clone().unwrap_or_default()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
