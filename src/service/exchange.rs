use crate::domain::cim::CimExportOptions;
use crate::domain::model::{ExportReport, ImportReport, ProjectRef};
use crate::domain::ports::RemoteGateway;
use crate::service::NeplanService;
use crate::soap::{Param, SoapValue};
use crate::utils::error::{NeplanError, Result};
use std::io::Cursor;
use std::path::Path;

impl<G: RemoteGateway> NeplanService<G> {
    /// Uploads a zip archive and returns its server-side path.
    pub async fn zip_upload(&self, data: Vec<u8>) -> Result<String> {
        self.invoke_required_text("ZipUpload", vec![Param::new("stream", SoapValue::Bytes(data))])
            .await
    }

    /// Uploads an XML (list) file and returns the name it was stored under.
    pub async fn xml_upload(&self, data: Vec<u8>) -> Result<String> {
        self.invoke_required_text("XMLUpload", vec![Param::new("stream", SoapValue::Bytes(data))])
            .await
    }

    /// CGMES export of the project into `file_path`.
    ///
    /// A local `boundary_path` is uploaded first and replaced by its server-side
    /// path. An empty export is written as an empty file and reported with
    /// `written() == false`.
    pub async fn cim_export(
        &self,
        project: &ProjectRef,
        file_path: &Path,
        mut options: CimExportOptions,
        operational_state: Option<&str>,
        run_power_flow: bool,
    ) -> Result<ExportReport> {
        if let Some(local_boundary) = options.boundary_path.take() {
            tracing::info!("Uploading boundary {} to the service", local_boundary);
            let data = std::fs::read(&local_boundary)?;
            let server_path = self.zip_upload(data).await?;
            tracing::info!("Boundary stored as {}", server_path);
            options.boundary_path = Some(server_path);
        }

        let data = self
            .invoke_bytes(
                "CIMExport",
                vec![
                    Param::new("project", project.to_soap()),
                    Param::new("cimExportOptions", options.to_soap()),
                    Param::new("operationalState", operational_state),
                    Param::new("runPowerFlow", run_power_flow),
                ],
            )
            .await?;

        tracing::info!("Exporting CIM data to {}", file_path.display());
        std::fs::write(file_path, &data)?;

        let entries = if data.is_empty() {
            tracing::error!("Exported file is empty: {}", file_path.display());
            Vec::new()
        } else {
            archive_entries(&data)
        };

        Ok(ExportReport {
            path: file_path.to_path_buf(),
            bytes_written: data.len(),
            entries,
        })
    }

    /// Imports CIM files already present on the server (or on its local disk with `is_local_path`).
    pub async fn cim_import(
        &self,
        project_name: &str,
        input_files: &[String],
        is_local_path: bool,
    ) -> Result<ImportReport> {
        let username = self.username().to_string();
        let response = self
            .invoke(
                "CIMImport",
                vec![
                    Param::new("inputFiles", SoapValue::strings(input_files.iter().cloned())),
                    Param::new("isLocalPath", is_local_path),
                    Param::new("projectName", project_name),
                    Param::new("userName", username),
                ],
            )
            .await?;
        Ok(ImportReport::from_response("CIMImport", &response))
    }

    /// Uploads a local NEPLAN list file and imports it as a new project.
    pub async fn import_from_list_file(
        &self,
        input_file: &Path,
        project_name: &str,
        copy_settings_from: &str,
    ) -> Result<ImportReport> {
        if !input_file.is_file() {
            return Err(NeplanError::ValidationError {
                message: format!("Could not find {}", input_file.display()),
            });
        }
        tracing::info!("Importing {} into project {}", input_file.display(), project_name);

        let data = std::fs::read(input_file)?;
        let upload_name = self.xml_upload(data).await?;
        tracing::info!("Uploaded as {}", upload_name);

        let outcome = self
            .invoke(
                "ImportFromListFile",
                vec![
                    Param::new("uploadName", upload_name),
                    Param::new("projectName", project_name),
                    Param::new("copySettingsFromProjectName", copy_settings_from),
                ],
            )
            .await;

        match outcome {
            Ok(response) => Ok(ImportReport::from_response("ImportFromListFile", &response)),
            Err(fault @ NeplanError::Fault { .. }) => {
                tracing::error!("Import rejected: {}", fault.user_friendly_message());
                if let Some(exchange) = self.format_last_exchange() {
                    tracing::error!("Last message exchange:\n{}", exchange);
                }
                Err(fault)
            }
            Err(other) => Err(other),
        }
    }
}

/// Entry names of a zip payload; empty (with a warning) when it is not a zip.
fn archive_entries(data: &[u8]) -> Vec<String> {
    match zip::ZipArchive::new(Cursor::new(data)) {
        Ok(archive) => {
            let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
            names.sort();
            names
        }
        Err(e) => {
            tracing::warn!("Export is not a zip archive ({}), entries not listed", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn zip_with(names: &[&str]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for name in names {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(b"<rdf:RDF/>").unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn lists_zip_entries_sorted() {
        let data = zip_with(&["SV.xml", "EQ.xml"]);
        assert_eq!(archive_entries(&data), vec!["EQ.xml", "SV.xml"]);
        assert!(archive_entries(b"not a zip").is_empty());
    }

    #[tokio::test]
    async fn cim_import_sends_session_user() {
        let gateway = ScriptedGateway::new().reply("CIMImport", text_response("CIMImport", "done"));
        let service = NeplanService::new(gateway);

        let report = service
            .cim_import("Baltic CGM", &["EQ.xml".to_string()], false)
            .await
            .unwrap();
        assert_eq!(report.result.as_deref(), Some("done"));

        let params = service.gateway().params_of("CIMImport");
        assert_eq!(params[3].value, SoapValue::Text("planner".to_string()));
        assert_eq!(params[0].value, SoapValue::strings(["EQ.xml"]));
    }

    #[tokio::test]
    async fn missing_list_file_is_rejected_before_upload() {
        let service = NeplanService::new(ScriptedGateway::new());
        let result = service
            .import_from_list_file(Path::new("/nonexistent/list.xml"), "P", "")
            .await;
        assert!(matches!(result, Err(NeplanError::ValidationError { .. })));
        assert!(service.gateway().operations().is_empty());
    }
}
