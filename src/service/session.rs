use crate::domain::model::ProjectRef;
use crate::domain::ports::RemoteGateway;
use crate::service::NeplanService;
use crate::soap::Param;
use crate::utils::error::Result;

impl<G: RemoteGateway> NeplanService<G> {
    /// Appends a line to the user activity log. The service knows `Info`, `Warning` and `Error`.
    pub async fn write_message_to_log_file(
        &self,
        project: &ProjectRef,
        message: &str,
        log_level: Option<&str>,
    ) -> Result<()> {
        self.invoke(
            "WriteMessageToLogFile",
            vec![
                Param::new("project", project.to_soap()),
                Param::new("text", message),
                Param::new("logLvl", log_level.unwrap_or("Info")),
            ],
        )
        .await?;
        Ok(())
    }

    /// Whole user activity log, one entry per line.
    pub async fn get_log_file_as_list(&self) -> Result<Vec<String>> {
        let result = self.invoke_result("GetLogFileAsList", vec![]).await?;
        Ok(result
            .map(|list| {
                list.children
                    .iter()
                    .filter_map(|entry| entry.value().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default())
    }

    pub async fn get_log_file_as_string(&self) -> Result<String> {
        Ok(self
            .invoke_text("GetLogFileAsString", vec![])
            .await?
            .unwrap_or_default())
    }

    /// Session id to append to the NEPLAN base URL for a browser login.
    pub async fn get_log_on_session_id(&self, project: &ProjectRef) -> Result<String> {
        self.invoke_required_text(
            "GetLogOnSessionID",
            vec![Param::new("project", project.to_soap())],
        )
        .await
    }

    pub async fn get_log_on_url(&self) -> Result<String> {
        let url = self.invoke_required_text("GetLogOnUrl", vec![]).await?;
        self.update_url_to_current_server(&url)
    }

    pub async fn get_log_on_url_with_project(&self, project: &ProjectRef) -> Result<String> {
        let url = self
            .invoke_required_text(
                "GetLogOnUrlWithProject",
                vec![Param::new("project", project.to_soap())],
            )
            .await?;
        self.update_url_to_current_server(&url)
    }
}
