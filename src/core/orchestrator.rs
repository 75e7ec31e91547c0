use crate::domain::catalog::AnalysisKind;
use crate::domain::model::{AnalysisResponse, ProjectRef};
use crate::domain::ports::RemoteGateway;
use crate::service::{AnalysisRequest, NeplanService};
use crate::utils::error::NeplanError;
use crate::utils::monitor::StepTimer;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStep {
    ResolveProject,
    Analyse,
    FetchLog,
    FetchResult,
}

impl fmt::Display for RunStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunStep::ResolveProject => "resolve project",
            RunStep::Analyse => "analysis",
            RunStep::FetchLog => "log retrieval",
            RunStep::FetchResult => "result retrieval",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    ProjectNotFound,
    Partial { step: RunStep, message: String },
    /// The run succeeded but produced no result file; writing it is a project setting.
    ResultFileDisabled { logon_url: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    pub step: RunStep,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub project_name: String,
    pub operational_state: Option<String>,
    /// Generated per run when absent.
    pub correlation_id: Option<String>,
    pub module: AnalysisKind,
}

/// Everything a run produced, whatever failed along the way.
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    pub correlation_id: String,
    pub project: ProjectRef,
    pub response: Option<AnalysisResponse>,
    pub process_log: Option<Vec<u8>>,
    pub result: Option<Vec<u8>>,
    pub outcome: RunOutcome,
    pub failures: Vec<StepFailure>,
    pub durations: Vec<(RunStep, Duration)>,
}

impl AnalysisRun {
    pub fn is_completed(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }

    pub fn process_log_text(&self) -> Option<String> {
        self.process_log
            .as_deref()
            .map(|log| String::from_utf8_lossy(log).into_owned())
    }
}

/// Resolve project, run the analysis, fetch the process log, fetch the result.
pub struct AnalysisOrchestrator<'a, G: RemoteGateway> {
    service: &'a NeplanService<G>,
}

impl<'a, G: RemoteGateway> AnalysisOrchestrator<'a, G> {
    pub fn new(service: &'a NeplanService<G>) -> Self {
        Self { service }
    }

    pub async fn run(&self, request: RunRequest) -> AnalysisRun {
        let mut timer = StepTimer::start();
        let mut failures = Vec::new();
        let mut durations = Vec::new();

        let mut analysis = AnalysisRequest::new(request.module);
        if let Some(id) = request.correlation_id {
            analysis = analysis.with_reference_id(id);
        }
        if let Some(state) = request.operational_state {
            analysis = analysis.with_operational_state(state);
        }

        let mut project_missing = false;
        let project = match self.service.resolve_project(&request.project_name).await {
            Ok(Some(project)) => project,
            Ok(None) => {
                tracing::error!(
                    "Project '{}' not found, continuing with an unresolved reference",
                    request.project_name
                );
                project_missing = true;
                ProjectRef::unresolved()
            }
            Err(e) => {
                record(&mut failures, RunStep::ResolveProject, &e);
                ProjectRef::unresolved()
            }
        };
        durations.push((RunStep::ResolveProject, timer.lap("Project loaded")));

        let response = match self.service.analyse_variant(&project, &analysis).await {
            Ok(response) => Some(response),
            Err(e) => {
                record(&mut failures, RunStep::Analyse, &e);
                None
            }
        };
        durations.push((RunStep::Analyse, timer.lap(&format!("{} finished", analysis.module))));

        let mut process_log = None;
        let mut result = None;
        if let Some(response) = &response {
            process_log = match &response.log_filename {
                Some(name) => match self.service.get_analysis_log_file(name).await {
                    Ok(log) => Some(log),
                    Err(e) => {
                        record(&mut failures, RunStep::FetchLog, &e);
                        None
                    }
                },
                None => {
                    tracing::warn!("Analysis response names no log file");
                    None
                }
            };
            durations.push((RunStep::FetchLog, timer.lap("Log file retrieved")));

            result = match &response.result_filename {
                Some(name) => match self.service.get_analysis_result_file(name).await {
                    Ok(bytes) => Some(bytes),
                    Err(e) => {
                        record(&mut failures, RunStep::FetchResult, &e);
                        None
                    }
                },
                None => Some(Vec::new()),
            };
            durations.push((RunStep::FetchResult, timer.lap("Results file retrieved")));
        } else {
            tracing::warn!("No analysis response, skipping log and result retrieval");
        }

        let outcome = if project_missing {
            RunOutcome::ProjectNotFound
        } else if let Some(first) = failures.first() {
            RunOutcome::Partial {
                step: first.step,
                message: first.message.clone(),
            }
        } else if result.as_ref().is_some_and(|bytes| !bytes.is_empty()) {
            tracing::info!("XML result file received");
            RunOutcome::Completed
        } else {
            let logon_url = match self.service.get_log_on_url_with_project(&project).await {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::warn!("Could not get a logon URL: {}", e);
                    None
                }
            };
            tracing::warn!(
                "No XML results returned: 'Write XML result file' is not enabled under Parameters -> Storage/Messages. Open the project at: {}",
                logon_url.as_deref().unwrap_or("<unavailable>")
            );
            RunOutcome::ResultFileDisabled { logon_url }
        };
        timer.log_total("Analysis run");

        AnalysisRun {
            correlation_id: analysis.reference_id,
            project,
            response,
            process_log,
            result,
            outcome,
            failures,
            durations,
        }
    }
}

fn record(failures: &mut Vec<StepFailure>, step: RunStep, error: &NeplanError) {
    tracing::error!("{} failed: {}", step, error);
    failures.push(StepFailure {
        step,
        message: error.to_string(),
    });
}
