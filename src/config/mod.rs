pub mod cli;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::utils::error::{NeplanError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_password_hash, validate_range, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use toml_config::TomlConfig;

/// Resolved settings of one service session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub server: String,
    pub username: String,
    pub password_hash: String,
    #[serde(default)]
    pub accept_invalid_certs: bool,
    pub timeout_seconds: Option<u64>,
}

impl ConfigProvider for ConnectionConfig {
    fn server_url(&self) -> &str {
        &self.server
    }

    fn username(&self) -> &str {
        &self.username
    }

    fn password_hash(&self) -> &str {
        &self.password_hash
    }

    fn accept_invalid_certs(&self) -> bool {
        self.accept_invalid_certs
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

impl Validate for ConnectionConfig {
    fn validate(&self) -> Result<()> {
        validate_url("server", &self.server)?;
        validate_non_empty_string("username", &self.username)?;
        validate_password_hash("password_hash", &self.password_hash)?;
        if let Some(timeout) = self.timeout_seconds {
            validate_range("timeout_seconds", timeout, 1, 86_400)?;
        }
        Ok(())
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Parser)]
#[command(name = "neplan")]
#[command(about = "Command-line client for the NEPLAN external web service")]
pub struct CliConfig {
    /// TOML file with connection, analysis and export defaults
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log as JSON lines")]
    pub log_json: bool,

    #[arg(long, global = true, help = "Accept self-signed or otherwise invalid TLS certificates")]
    pub insecure: bool,

    #[arg(long, global = true, help = "Print the last sent and received SOAP messages when done")]
    pub dump_exchange: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Default, Args)]
pub struct ConnectionArgs {
    #[arg(short = 'w', long = "web-ser", help = "WebService address")]
    pub web_service: Option<String>,

    #[arg(short, long, help = "Username")]
    pub user: Option<String>,

    #[arg(short, long, help = "Password as SHA1 hash, use `neplan crypt` to create it")]
    pub passwd: Option<String>,

}

#[cfg(feature = "cli")]
impl ConnectionArgs {
    /// Command-line values win over the config file.
    pub fn resolve(&self, file: Option<&TomlConfig>, insecure: bool) -> Result<ConnectionConfig> {
        let section = file.and_then(|f| f.connection.clone()).unwrap_or_default();

        let required = |cli: &Option<String>, from_file: Option<String>, field: &str| {
            cli.clone()
                .or(from_file)
                .ok_or_else(|| NeplanError::MissingConfigError {
                    field: field.to_string(),
                })
        };

        Ok(ConnectionConfig {
            server: required(&self.web_service, section.server, "web-ser / connection.server")?,
            username: required(&self.user, section.username, "user / connection.username")?,
            password_hash: required(
                &self.passwd,
                section.password_hash,
                "passwd / connection.password_hash",
            )?,
            accept_invalid_certs: insecure || section.accept_invalid_certs.unwrap_or(false),
            timeout_seconds: section.timeout_seconds,
        })
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SingleCommand {
    #[value(name = "getProjects")]
    GetProjects,
    #[value(name = "DeleteMarked")]
    DeleteMarked,
    #[value(name = "getLogOnUrl")]
    GetLogOnUrl,
    #[value(name = "getUserLog")]
    GetUserLog,
    #[value(name = "getElements")]
    GetElements,
}

#[cfg(feature = "cli")]
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload NEPLAN list files and import each as a project
    ImportFiles {
        #[command(flatten)]
        connection: ConnectionArgs,

        #[arg(short = 'i', long = "ifile", help = "Input file")]
        input_file: String,

        #[arg(short = 'L', long = "list-file", help = "Text file naming further input files, one per line")]
        list_file: Option<String>,

        #[arg(short = 'n', long, help = "Project name, defaults to the input file stem")]
        project: Option<String>,

        #[arg(long, default_value = "", help = "Project to copy calculation settings from")]
        copy_settings_from: String,
    },

    /// Run a load flow and store its result and log
    LoadFlow {
        #[command(flatten)]
        connection: ConnectionArgs,

        #[arg(short = 'n', long, help = "Project name that has to be analyzed")]
        project: String,

        #[arg(
            short = 'o',
            long = "output-dir",
            help = "Existing directory for the result files, defaults to analysis.output_dir"
        )]
        output_dir: Option<String>,

        #[arg(long)]
        operational_state: Option<String>,

        #[arg(long, help = "Correlation id for the run, generated when absent")]
        reference_id: Option<String>,

        #[arg(long, help = "Analysis module, LoadFlow by default")]
        module: Option<String>,
    },

    /// Execute a single service command
    Single {
        #[command(flatten)]
        connection: ConnectionArgs,

        #[arg(short = 'c', long, value_enum)]
        command: SingleCommand,

        #[arg(short = 'n', long, help = "Project for project-scoped commands")]
        project: Option<String>,

        #[arg(long, help = "Write the element table to this CSV file")]
        csv: Option<String>,
    },

    /// Export a project as CGMES files
    CimExport {
        #[command(flatten)]
        connection: ConnectionArgs,

        #[arg(short = 'n', long)]
        project: String,

        #[arg(short = 'o', long, default_value = "Export.zip")]
        output: String,

        #[arg(long, help = "Local boundary zip to upload and export against")]
        boundary: Option<String>,

        #[arg(long)]
        period: Option<String>,

        #[arg(long = "version")]
        model_version: Option<String>,

        #[arg(long)]
        mas: Option<String>,

        #[arg(long, help = "Scenario time, e.g. 2023-10-18T08:30 (UTC)")]
        scenario_time: Option<String>,

        #[arg(long)]
        operational_state: Option<String>,

        #[arg(long)]
        run_power_flow: bool,
    },

    /// Hash a password for later use with --passwd
    Crypt {
        #[arg(short, long, help = "Password that should be hashed")]
        password: String,
    },
}

#[cfg(feature = "cli")]
impl Command {
    pub fn connection(&self) -> Option<&ConnectionArgs> {
        match self {
            Command::ImportFiles { connection, .. }
            | Command::LoadFlow { connection, .. }
            | Command::Single { connection, .. }
            | Command::CimExport { connection, .. } => Some(connection),
            Command::Crypt { .. } => None,
        }
    }
}
