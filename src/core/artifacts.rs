use crate::core::orchestrator::{AnalysisRun, RunOutcome};
use crate::domain::model::AnalysisResponse;
use crate::domain::ports::Storage;
use crate::utils::error::Result;
use serde::Serialize;

pub const RESULT_FILE: &str = "CalculationResult.xml";
pub const LOG_FILE: &str = "AnalysisProcess.log";
pub const SUMMARY_FILE: &str = "run_summary.json";

#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    correlation_id: &'a str,
    project_id: Option<&'a str>,
    project_name: Option<&'a str>,
    outcome: String,
    logon_url: Option<&'a str>,
    response: Option<&'a AnalysisResponse>,
    failures: Vec<String>,
    step_seconds: Vec<(String, f64)>,
}

pub fn describe_outcome(outcome: &RunOutcome) -> String {
    match outcome {
        RunOutcome::Completed => "completed".to_string(),
        RunOutcome::ProjectNotFound => "project not found".to_string(),
        RunOutcome::Partial { step, message } => format!("{} failed: {}", step, message),
        RunOutcome::ResultFileDisabled { .. } => "no result file (writing disabled)".to_string(),
    }
}

/// Writes whatever the run produced and returns the written file names.
pub async fn save_run<S: Storage>(storage: &S, run: &AnalysisRun) -> Result<Vec<String>> {
    let mut written = Vec::new();

    match run.result.as_deref() {
        Some(result) if !result.is_empty() => {
            tracing::info!("Writing {} ({} bytes)", RESULT_FILE, result.len());
            storage.write_file(RESULT_FILE, result).await?;
            written.push(RESULT_FILE.to_string());
        }
        _ => tracing::warn!("No result to write"),
    }

    if let Some(log) = run.process_log.as_deref() {
        storage.write_file(LOG_FILE, log).await?;
        written.push(LOG_FILE.to_string());
    }

    let summary = RunSummary {
        correlation_id: &run.correlation_id,
        project_id: run.project.id(),
        project_name: run.project.name(),
        outcome: describe_outcome(&run.outcome),
        logon_url: match &run.outcome {
            RunOutcome::ResultFileDisabled { logon_url } => logon_url.as_deref(),
            _ => None,
        },
        response: run.response.as_ref(),
        failures: run
            .failures
            .iter()
            .map(|f| format!("{}: {}", f.step, f.message))
            .collect(),
        step_seconds: run
            .durations
            .iter()
            .map(|(step, d)| (step.to_string(), d.as_secs_f64()))
            .collect(),
    };
    let json = serde_json::to_vec_pretty(&summary)?;
    storage.write_file(SUMMARY_FILE, &json).await?;
    written.push(SUMMARY_FILE.to_string());

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::orchestrator::{RunStep, StepFailure};
    use crate::domain::ProjectRef;
    use crate::utils::error::NeplanError;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().await.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                NeplanError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.files.lock().await.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    fn run(result: Option<Vec<u8>>, outcome: RunOutcome) -> AnalysisRun {
        AnalysisRun {
            correlation_id: "corr-9".to_string(),
            project: ProjectRef::from_fields([("ProjectID", "p-1"), ("ProjectName", "Grid")]),
            response: Some(AnalysisResponse::default()),
            process_log: Some(b"converged in 4 iterations".to_vec()),
            result,
            outcome,
            failures: Vec::new(),
            durations: vec![(RunStep::Analyse, std::time::Duration::from_millis(1500))],
        }
    }

    #[tokio::test]
    async fn writes_result_log_and_summary() {
        let storage = MockStorage::default();
        let written = save_run(&storage, &run(Some(b"<R/>".to_vec()), RunOutcome::Completed))
            .await
            .unwrap();

        assert_eq!(written, vec![RESULT_FILE, LOG_FILE, SUMMARY_FILE]);
        assert_eq!(storage.get_file(RESULT_FILE).await.unwrap(), b"<R/>".to_vec());

        let summary: serde_json::Value =
            serde_json::from_slice(&storage.read_file(SUMMARY_FILE).await.unwrap()).unwrap();
        assert_eq!(summary["outcome"], "completed");
        assert_eq!(summary["project_name"], "Grid");
        assert_eq!(summary["step_seconds"][0][1], 1.5);
    }

    #[tokio::test]
    async fn empty_result_is_not_written_but_summary_has_url() {
        let storage = MockStorage::default();
        let mut partial = run(
            Some(Vec::new()),
            RunOutcome::ResultFileDisabled {
                logon_url: Some("https://neplan/?s=1".to_string()),
            },
        );
        partial.failures.push(StepFailure {
            step: RunStep::FetchLog,
            message: "expired".to_string(),
        });

        let written = save_run(&storage, &partial).await.unwrap();
        assert!(!written.contains(&RESULT_FILE.to_string()));

        let summary: serde_json::Value =
            serde_json::from_slice(&storage.get_file(SUMMARY_FILE).await.unwrap()).unwrap();
        assert_eq!(summary["logon_url"], "https://neplan/?s=1");
        assert_eq!(summary["failures"][0], "log retrieval: expired");
    }
}
