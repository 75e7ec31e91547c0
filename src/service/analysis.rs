use crate::core::orchestrator::{AnalysisOrchestrator, AnalysisRun, RunRequest};
use crate::domain::catalog::AnalysisKind;
use crate::domain::model::{AnalysisResponse, KeyValueTable, ProjectRef};
use crate::domain::ports::RemoteGateway;
use crate::service::NeplanService;
use crate::soap::{Param, XmlNode};
use crate::utils::error::{NeplanError, Result};
use uuid::Uuid;

/// Arguments of `AnalyseVariant`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    /// Correlation identifier echoed by the service; the only aid to deduplicating runs.
    pub reference_id: String,
    pub module: AnalysisKind,
    /// Operational state (calculation name) to analyse; empty for the current one.
    pub calc_name_id: String,
    pub method: String,
    pub conditions: String,
    pub load_option_xml: String,
}

impl AnalysisRequest {
    pub fn new(module: AnalysisKind) -> Self {
        Self {
            reference_id: Uuid::new_v4().to_string(),
            module,
            calc_name_id: String::new(),
            method: String::new(),
            conditions: String::new(),
            load_option_xml: String::new(),
        }
    }

    pub fn with_reference_id(mut self, reference_id: impl Into<String>) -> Self {
        self.reference_id = reference_id.into();
        self
    }

    pub fn with_operational_state(mut self, state: impl Into<String>) -> Self {
        self.calc_name_id = state.into();
        self
    }
}

impl Default for AnalysisRequest {
    fn default() -> Self {
        Self::new(AnalysisKind::default())
    }
}

impl<G: RemoteGateway> NeplanService<G> {
    /// Runs an analysis on the project. Every call starts a new remote run.
    pub async fn analyse_variant(
        &self,
        project: &ProjectRef,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResponse> {
        tracing::info!(
            "Running {} on {} (reference {})",
            request.module,
            project,
            request.reference_id
        );
        let result = self
            .invoke_result(
                "AnalyseVariant",
                vec![
                    Param::new("project", project.to_soap()),
                    // sic, the service contract spells it this way
                    Param::new("analysisRefenceID", request.reference_id.as_str()),
                    Param::new("analysisModule", request.module.as_str()),
                    Param::new("calcNameID", request.calc_name_id.as_str()),
                    Param::new("analysisMethode", request.method.as_str()),
                    Param::new("conditions", request.conditions.as_str()),
                    Param::new("analysisLoadOptionXML", request.load_option_xml.as_str()),
                ],
            )
            .await?
            .ok_or_else(|| NeplanError::unexpected("AnalyseVariant", "no AnalysisReturnInfo returned"))?;

        Ok(AnalysisResponse::from_node(&result))
    }

    /// Result artifact named by `AnalysisResponse::result_filename`. Empty when
    /// writing the XML result file is disabled in the project parameters.
    pub async fn get_analysis_result_file(&self, file_name: &str) -> Result<Vec<u8>> {
        self.invoke_bytes("GetAnalysisResultFile", vec![Param::new("fileName", file_name)])
            .await
    }

    /// Process log named by `AnalysisResponse::log_filename`.
    pub async fn get_analysis_log_file(&self, file_name: &str) -> Result<Vec<u8>> {
        self.invoke_bytes("GetAnaylsisLogFile", vec![Param::new("fileName", file_name)])
            .await
    }

    pub async fn get_all_element_results(
        &self,
        project: &ProjectRef,
        analysis_type: AnalysisKind,
    ) -> Result<Vec<XmlNode>> {
        let result = self
            .invoke_result(
                "GetAllElementResults",
                vec![
                    Param::new("project", project.to_soap()),
                    Param::new("analysisType", analysis_type.as_str()),
                ],
            )
            .await?;
        Ok(result.map(|list| list.children).unwrap_or_default())
    }

    /// Calculation parameters of the analysis type as set in the project.
    pub async fn get_calc_parameter_attributes(
        &self,
        project: &ProjectRef,
        analysis_type: AnalysisKind,
    ) -> Result<KeyValueTable> {
        let result = self
            .invoke_result(
                "GetCalcParameterAttributes",
                vec![
                    Param::new("project", project.to_soap()),
                    Param::new("analysisType", analysis_type.as_str()),
                ],
            )
            .await?;
        Ok(result.as_ref().map(KeyValueTable::from_node).unwrap_or_default())
    }

    pub async fn get_calc_parameter_attributes_description(
        &self,
        analysis_type: AnalysisKind,
    ) -> Result<KeyValueTable> {
        let result = self
            .invoke_result(
                "GetCalcParameterAttributesDescription",
                vec![Param::new("analysisType", analysis_type.as_str())],
            )
            .await?;
        let table = result.as_ref().map(KeyValueTable::from_node).unwrap_or_default();
        if table.is_empty() {
            tracing::warn!("No parameter descriptions returned for {}", analysis_type);
        }
        Ok(table)
    }

    /// Basic load flow on a project, optionally for one operational state.
    pub async fn run_loadflow(&self, project_name: &str, operational_state: Option<&str>) -> AnalysisRun {
        AnalysisOrchestrator::new(self)
            .run(RunRequest {
                project_name: project_name.to_string(),
                operational_state: operational_state.map(str::to_string),
                ..Default::default()
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::*;
    use crate::soap::SoapValue;

    #[test]
    fn each_request_gets_its_own_reference() {
        let a = AnalysisRequest::default();
        let b = AnalysisRequest::default();
        assert_ne!(a.reference_id, b.reference_id);
        assert_eq!(a.module.as_str(), "LoadFlow");
    }

    #[tokio::test]
    async fn analyse_variant_passes_reference_and_state() {
        let gateway = ScriptedGateway::new().reply(
            "AnalyseVariant",
            struct_response(
                "AnalyseVariant",
                vec![
                    XmlNode::with_text("LogFilename", "run.log"),
                    XmlNode::with_text("ResultFilename", "run.xml"),
                ],
            ),
        );
        let service = NeplanService::new(gateway);
        let project = ProjectRef::from_fields([("ProjectID", "p-1")]);
        let request = AnalysisRequest::default()
            .with_reference_id("ref-42")
            .with_operational_state("Winter peak");

        let response = service.analyse_variant(&project, &request).await.unwrap();
        assert_eq!(response.result_filename.as_deref(), Some("run.xml"));

        let params = service.gateway().params_of("AnalyseVariant");
        assert_eq!(params[1].name, "analysisRefenceID");
        assert_eq!(params[1].value, SoapValue::Text("ref-42".to_string()));
        assert_eq!(params[2].value, SoapValue::Text("LoadFlow".to_string()));
        assert_eq!(params[3].value, SoapValue::Text("Winter peak".to_string()));
    }

    #[tokio::test]
    async fn result_file_is_decoded() {
        let gateway = ScriptedGateway::new().reply(
            "GetAnalysisResultFile",
            text_response("GetAnalysisResultFile", "PFJlc3VsdC8+"),
        );
        let service = NeplanService::new(gateway);
        let bytes = service.get_analysis_result_file("run.xml").await.unwrap();
        assert_eq!(bytes, b"<Result/>".to_vec());
    }

    #[tokio::test]
    async fn calc_parameters_are_read_as_key_values() {
        let kv = |key: &str, value: &str| {
            XmlNode::with_children(
                "KeyValueOfstringstring",
                vec![XmlNode::with_text("Key", key), XmlNode::with_text("Value", value)],
            )
        };
        let gateway = ScriptedGateway::new()
            .reply(
                "GetCalcParameterAttributes",
                struct_response(
                    "GetCalcParameterAttributes",
                    vec![kv("MaxIterations", "50"), kv("Tolerance", "0.001")],
                ),
            )
            .reply(
                "GetAllElementResults",
                struct_response(
                    "GetAllElementResults",
                    vec![XmlNode::with_text("ElementResult", "L-1")],
                ),
            );
        let service = NeplanService::new(gateway);
        let project = ProjectRef::from_fields([("ProjectID", "p-1")]);

        let table = service
            .get_calc_parameter_attributes(&project, AnalysisKind::default())
            .await
            .unwrap();
        assert_eq!(table.get("MaxIterations"), Some("50"));
        assert_eq!(table.len(), 2);

        let results = service
            .get_all_element_results(&project, AnalysisKind::default())
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(
            service.gateway().params_of("GetAllElementResults")[1].value,
            SoapValue::Text("LoadFlow".to_string())
        );
    }
}
