//! `NeplanService`: one authenticated session and every remote operation the
//! crate exposes, grouped by concern in the submodules.

pub mod analysis;
pub mod exchange;
pub mod project;
pub mod session;

use crate::domain::ports::{ConfigProvider, RemoteGateway};
use crate::soap::{HttpGateway, Param, XmlNode};
use crate::utils::error::{NeplanError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use url::Url;

pub use analysis::AnalysisRequest;

pub struct NeplanService<G: RemoteGateway> {
    gateway: G,
}

impl NeplanService<HttpGateway> {
    pub fn connect<C: ConfigProvider>(config: &C) -> Result<Self> {
        let gateway = HttpGateway::new(config)?;
        tracing::info!("Connected to {} as {}", gateway.endpoint(), config.username());
        Ok(Self::new(gateway))
    }
}

impl<G: RemoteGateway> NeplanService<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn username(&self) -> &str {
        self.gateway.username()
    }

    /// Last sent and received SOAP messages, pretty-printed.
    pub fn format_last_exchange(&self) -> Option<String> {
        self.gateway.last_exchange().map(|exchange| exchange.format())
    }

    /// The service reports URLs on its own (often `localhost`) host; point them at the configured server.
    pub fn update_url_to_current_server(&self, service_url: &str) -> Result<String> {
        rewrite_host(service_url, self.gateway.server_url())
    }

    pub(crate) async fn invoke(&self, operation: &str, params: Vec<Param>) -> Result<XmlNode> {
        tracing::debug!("Calling {} with {} parameter(s)", operation, params.len());
        self.gateway.call(operation, params).await
    }

    /// The `{operation}Result` element; `None` when absent or nil.
    pub(crate) async fn invoke_result(
        &self,
        operation: &str,
        params: Vec<Param>,
    ) -> Result<Option<XmlNode>> {
        let response = self.invoke(operation, params).await?;
        let result_name = format!("{}Result", operation);
        Ok(response.take_child(&result_name).filter(|node| !node.nil))
    }

    pub(crate) async fn invoke_text(
        &self,
        operation: &str,
        params: Vec<Param>,
    ) -> Result<Option<String>> {
        Ok(self
            .invoke_result(operation, params)
            .await?
            .map(|node| node.text))
    }

    pub(crate) async fn invoke_required_text(
        &self,
        operation: &str,
        params: Vec<Param>,
    ) -> Result<String> {
        self.invoke_text(operation, params)
            .await?
            .ok_or_else(|| NeplanError::unexpected(operation, "no result returned"))
    }

    /// Base64 stream body; an absent or empty stream is an empty vector.
    pub(crate) async fn invoke_bytes(&self, operation: &str, params: Vec<Param>) -> Result<Vec<u8>> {
        match self.invoke_text(operation, params).await? {
            Some(text) => decode_stream(&text),
            None => Ok(Vec::new()),
        }
    }
}

pub(crate) fn decode_stream(text: &str) -> Result<Vec<u8>> {
    let cleaned: String = text.split_whitespace().collect();
    if cleaned.is_empty() {
        return Ok(Vec::new());
    }
    Ok(STANDARD.decode(cleaned)?)
}

pub fn rewrite_host(service_url: &str, server_url: &str) -> Result<String> {
    let mut url = Url::parse(service_url)
        .map_err(|e| NeplanError::unexpected("GetLogOnUrl", format!("invalid URL '{}': {}", service_url, e)))?;
    let server = Url::parse(server_url).map_err(|e| NeplanError::InvalidConfigValueError {
        field: "server".to_string(),
        value: server_url.to_string(),
        reason: e.to_string(),
    })?;
    let host = server
        .host_str()
        .ok_or_else(|| NeplanError::InvalidConfigValueError {
            field: "server".to_string(),
            value: server_url.to_string(),
            reason: "URL has no host".to_string(),
        })?;

    url.set_host(Some(host))
        .map_err(|e| NeplanError::unexpected("GetLogOnUrl", e.to_string()))?;
    url.set_port(server.port())
        .map_err(|_| NeplanError::unexpected("GetLogOnUrl", "URL cannot carry a port"))?;
    Ok(url.into())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::soap::MessageExchange;
    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    /// In-memory gateway answering from scripted replies, recording every call.
    pub(crate) struct ScriptedGateway {
        server: String,
        replies: Mutex<HashMap<String, VecDeque<Result<XmlNode>>>>,
        calls: Mutex<Vec<(String, Vec<Param>)>>,
    }

    impl ScriptedGateway {
        pub(crate) fn new() -> Self {
            Self {
                server: "https://neplan.example.com:8443".to_string(),
                replies: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn reply(self, operation: &str, response: XmlNode) -> Self {
            self.push(operation, Ok(response));
            self
        }

        pub(crate) fn fail(self, operation: &str, error: NeplanError) -> Self {
            self.push(operation, Err(error));
            self
        }

        fn push(&self, operation: &str, reply: Result<XmlNode>) {
            self.replies
                .lock()
                .unwrap()
                .entry(operation.to_string())
                .or_default()
                .push_back(reply);
        }

        pub(crate) fn operations(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|(op, _)| op.clone()).collect()
        }

        pub(crate) fn params_of(&self, operation: &str) -> Vec<Param> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .find(|(op, _)| op == operation)
                .map(|(_, params)| params.clone())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl RemoteGateway for ScriptedGateway {
        async fn call(&self, operation: &str, params: Vec<Param>) -> Result<XmlNode> {
            self.calls
                .lock()
                .unwrap()
                .push((operation.to_string(), params));
            self.replies
                .lock()
                .unwrap()
                .get_mut(operation)
                .and_then(|queue| queue.pop_front())
                .unwrap_or_else(|| Err(NeplanError::unexpected(operation, "no scripted reply")))
        }

        fn server_url(&self) -> &str {
            &self.server
        }

        fn username(&self) -> &str {
            "planner"
        }

        fn last_exchange(&self) -> Option<MessageExchange> {
            None
        }
    }

    pub(crate) fn response(operation: &str, result: XmlNode) -> XmlNode {
        XmlNode::with_children(&format!("{}Response", operation), vec![result])
    }

    pub(crate) fn text_response(operation: &str, text: &str) -> XmlNode {
        response(operation, XmlNode::with_text(&format!("{}Result", operation), text))
    }

    pub(crate) fn struct_response(operation: &str, fields: Vec<XmlNode>) -> XmlNode {
        response(
            operation,
            XmlNode::with_children(&format!("{}Result", operation), fields),
        )
    }

    pub(crate) fn project_response(id: &str, name: &str) -> XmlNode {
        struct_response(
            "GetProject",
            vec![
                XmlNode::with_text("ProjectID", id),
                XmlNode::with_text("ProjectName", name),
                XmlNode::with_text("VariantID", "v-1"),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn rewrites_host_and_port_keeping_path() {
        let url = rewrite_host(
            "http://localhost/Neplan/Login.aspx?sessionId=abc",
            "https://neplan.example.com:8443",
        )
        .unwrap();
        assert_eq!(url, "http://neplan.example.com:8443/Neplan/Login.aspx?sessionId=abc");
    }

    #[test]
    fn stream_decoding_ignores_line_breaks() {
        assert_eq!(decode_stream("PD94\nbWw+").unwrap(), b"<?xml>".to_vec());
        assert!(decode_stream("  ").unwrap().is_empty());
        assert!(decode_stream("!!!").is_err());
    }

    #[tokio::test]
    async fn nil_result_is_none() {
        let mut nil = XmlNode::new("GetLogOnUrlResult");
        nil.nil = true;
        let gateway = ScriptedGateway::new().reply("GetLogOnUrl", response("GetLogOnUrl", nil));
        let service = NeplanService::new(gateway);

        assert_eq!(service.invoke_text("GetLogOnUrl", vec![]).await.unwrap(), None);
        assert!(service.invoke_text("GetLogOnUrl", vec![]).await.is_err());
    }
}
