use crate::config::cli::LocalStorage;
use crate::config::toml_config::TomlConfig;
use crate::config::{CliConfig, Command, SingleCommand};
use crate::core::artifacts::{describe_outcome, save_run};
use crate::core::{AnalysisOrchestrator, RunOutcome, RunRequest};
use crate::domain::catalog::AnalysisKind;
use crate::domain::ports::RemoteGateway;
use crate::domain::ProjectRef;
use crate::service::NeplanService;
use crate::utils::crypt::hash_password;
use crate::utils::error::{NeplanError, Result};
use crate::utils::validation::{validate_existing_dir, validate_file_extensions, Validate};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::path::{Path, PathBuf};

/// Runs one parsed command line and returns the process exit code.
pub async fn execute(cli: CliConfig) -> Result<i32> {
    if let Command::Crypt { password } = &cli.command {
        println!("Copy below SHA1 Hash for later use in Service for Auth");
        println!("{}", hash_password(password));
        return Ok(0);
    }

    let file_config = match &cli.config {
        Some(path) => {
            let config = TomlConfig::from_file(path)?;
            config.validate()?;
            tracing::debug!("Loaded config file {}", path);
            Some(config)
        }
        None => None,
    };

    let Some(connection_args) = cli.command.connection().cloned() else {
        return Ok(0);
    };

    let connection = connection_args.resolve(file_config.as_ref(), cli.insecure)?;
    connection.validate()?;
    if connection.accept_invalid_certs {
        tracing::warn!("TLS certificate verification is disabled");
    }

    let service = NeplanService::connect(&connection)?;
    let outcome = run_remote(&service, cli.command, file_config.unwrap_or_default()).await;

    if cli.dump_exchange {
        match service.format_last_exchange() {
            Some(exchange) => println!("{}", exchange),
            None => println!("No messages were exchanged"),
        }
    }
    outcome
}

async fn run_remote<G: RemoteGateway>(
    service: &NeplanService<G>,
    command: Command,
    file_config: TomlConfig,
) -> Result<i32> {
    match command {
        Command::ImportFiles {
            input_file,
            list_file,
            project,
            copy_settings_from,
            ..
        } => {
            let files = collect_input_files(&input_file, list_file.as_deref())?;
            import_files(service, &files, project.as_deref(), &copy_settings_from).await
        }
        Command::LoadFlow {
            project,
            output_dir,
            operational_state,
            reference_id,
            module,
            ..
        } => {
            let module = module
                .as_deref()
                .or(file_config.analysis_module())
                .map(str::parse::<AnalysisKind>)
                .transpose()?
                .unwrap_or_default();
            let request = RunRequest {
                project_name: project,
                operational_state: operational_state
                    .or_else(|| file_config.operational_state().map(str::to_string)),
                correlation_id: reference_id,
                module,
            };
            let output_dir = output_dir
                .or_else(|| file_config.output_dir().map(str::to_string))
                .ok_or_else(|| NeplanError::MissingConfigError {
                    field: "output-dir / analysis.output_dir".to_string(),
                })?;
            load_flow(service, request, &output_dir).await
        }
        Command::Single {
            command, project, csv, ..
        } => single(service, command, project.as_deref(), csv.as_deref()).await,
        Command::CimExport {
            project,
            output,
            boundary,
            period,
            model_version,
            mas,
            scenario_time,
            operational_state,
            run_power_flow,
            ..
        } => {
            let mut options = file_config.export_options();
            if let Some(boundary) = boundary {
                validate_file_extensions("boundary", std::slice::from_ref(&boundary), &["zip"])?;
                options.boundary_path = Some(boundary);
            }
            if let Some(period) = period {
                options.period = period;
            }
            if let Some(version) = model_version {
                options.version = version;
            }
            if let Some(mas) = mas {
                options.mas = mas;
            }
            if let Some(time) = scenario_time {
                options.scenario_date_time = parse_scenario_time(&time)?;
            }

            let project = require_project(service, &project).await?;
            let report = service
                .cim_export(
                    &project,
                    Path::new(&output),
                    options,
                    operational_state.as_deref(),
                    run_power_flow,
                )
                .await?;

            if !report.written() {
                eprintln!("❌ Export of {} is empty", report.path.display());
                return Ok(1);
            }
            println!("✅ Exported {} bytes to {}", report.bytes_written, report.path.display());
            for entry in &report.entries {
                println!("   {}", entry);
            }
            Ok(0)
        }
        Command::Crypt { .. } => Ok(0),
    }
}

async fn load_flow<G: RemoteGateway>(
    service: &NeplanService<G>,
    request: RunRequest,
    output_dir: &str,
) -> Result<i32> {
    validate_existing_dir("output-dir", output_dir)?;

    let run = AnalysisOrchestrator::new(service).run(request).await;
    let storage = LocalStorage::new(output_dir);
    let written = save_run(&storage, &run).await?;

    for file in &written {
        println!("📁 {}", storage.base_path().join(file).display());
    }
    println!("Run {}: {}", run.correlation_id, describe_outcome(&run.outcome));

    Ok(match &run.outcome {
        RunOutcome::Completed => 0,
        RunOutcome::ResultFileDisabled { logon_url } => {
            println!(
                "💡 Enable 'Write XML result file' under Parameters -> Storage/Messages: {}",
                logon_url.as_deref().unwrap_or("<no logon url>")
            );
            0
        }
        RunOutcome::ProjectNotFound => 1,
        RunOutcome::Partial { .. } => 2,
    })
}

async fn single<G: RemoteGateway>(
    service: &NeplanService<G>,
    command: SingleCommand,
    project: Option<&str>,
    csv: Option<&str>,
) -> Result<i32> {
    match command {
        SingleCommand::GetProjects => {
            let projects = service.get_projects().await?;
            for project in &projects {
                println!("{}", project);
            }
            println!("{} project(s)", projects.len());
        }
        SingleCommand::DeleteMarked => {
            let deleted = service.delete_marked_as_deleted_projects().await?;
            println!("Number of deleted projects: {}", deleted);
        }
        SingleCommand::GetLogOnUrl => {
            println!("{}", service.get_log_on_url().await?);
        }
        SingleCommand::GetUserLog => {
            for line in service.get_log_file_as_list().await? {
                println!("{}", line);
            }
        }
        SingleCommand::GetElements => {
            let name = project.ok_or_else(|| NeplanError::MissingConfigError {
                field: "project (-n)".to_string(),
            })?;
            let project = require_project(service, name).await?;
            let table = service.get_all_elements_of_project(&project).await?;

            for (element_type, count) in table.type_counts() {
                println!("{:<30} {}", element_type, count);
            }
            println!("{} element(s)", table.len());

            if let Some(path) = csv {
                table.write_csv(std::fs::File::create(path)?)?;
                println!("📁 {}", path);
            }
        }
    }
    Ok(0)
}

async fn import_files<G: RemoteGateway>(
    service: &NeplanService<G>,
    files: &[PathBuf],
    project: Option<&str>,
    copy_settings_from: &str,
) -> Result<i32> {
    for file in files {
        let project_name = match project {
            Some(name) => name.to_string(),
            None => project_name_from_file(file)?,
        };
        let report = service
            .import_from_list_file(file, &project_name, copy_settings_from)
            .await?;
        println!(
            "✅ {} -> {}",
            file.display(),
            report.actual_created_project_name().unwrap_or(&project_name)
        );
    }
    Ok(0)
}

async fn require_project<G: RemoteGateway>(
    service: &NeplanService<G>,
    name: &str,
) -> Result<ProjectRef> {
    service
        .resolve_project(name)
        .await?
        .ok_or_else(|| NeplanError::ValidationError {
            message: format!("Project '{}' not found", name),
        })
}

/// The input file plus every non-empty line of the optional list file.
fn collect_input_files(input_file: &str, list_file: Option<&str>) -> Result<Vec<PathBuf>> {
    let mut files = vec![PathBuf::from(input_file)];
    if let Some(list_file) = list_file {
        let content = std::fs::read_to_string(list_file)?;
        files.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(PathBuf::from),
        );
    }
    Ok(files)
}

fn project_name_from_file(file: &Path) -> Result<String> {
    file.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .ok_or_else(|| NeplanError::ValidationError {
            message: format!("Cannot derive a project name from {}", file.display()),
        })
}

/// RFC 3339, or a naive `YYYY-MM-DDTHH:MM[:SS]` taken as UTC.
pub fn parse_scenario_time(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(time) = DateTime::parse_from_rfc3339(value) {
        return Ok(time.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| NeplanError::InvalidConfigValueError {
            field: "scenario-time".to_string(),
            value: value.to_string(),
            reason: "Expected e.g. 2023-10-18T08:30 or an RFC 3339 timestamp".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn parses_short_and_rfc3339_scenario_times() {
        let expected = Utc.with_ymd_and_hms(2023, 10, 18, 8, 30, 0).unwrap();
        assert_eq!(parse_scenario_time("2023-10-18T08:30").unwrap(), expected);
        assert_eq!(parse_scenario_time("2023-10-18T10:30:00+02:00").unwrap(), expected);
        assert!(parse_scenario_time("18.10.2023").is_err());
    }

    #[test]
    fn list_file_adds_inputs_and_skips_blank_lines() {
        let mut list = NamedTempFile::new().unwrap();
        writeln!(list, "second.ndt\n\n# comment\n  third.ndt  ").unwrap();

        let files =
            collect_input_files("first.ndt", Some(list.path().to_str().unwrap())).unwrap();
        assert_eq!(
            files,
            vec![
                PathBuf::from("first.ndt"),
                PathBuf::from("second.ndt"),
                PathBuf::from("third.ndt")
            ]
        );
    }

    #[test]
    fn project_name_defaults_to_file_stem() {
        assert_eq!(
            project_name_from_file(Path::new("/data/Grid_2024.ndt")).unwrap(),
            "Grid_2024"
        );
    }

    #[tokio::test]
    async fn crypt_needs_no_connection() {
        use clap::Parser;
        let cli = CliConfig::try_parse_from(["neplan", "crypt", "-p", "password"]).unwrap();
        assert_eq!(execute(cli).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn crypt_ignores_the_config_file() {
        use clap::Parser;
        let cli = CliConfig::try_parse_from([
            "neplan",
            "crypt",
            "-p",
            "password",
            "--config",
            "/nonexistent/neplan.toml",
        ])
        .unwrap();
        assert_eq!(execute(cli).await.unwrap(), 0);
    }
}
