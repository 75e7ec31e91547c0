#![allow(dead_code)]

use httpmock::prelude::*;
use neplan_ws::soap::envelope::{soap_action, DATA_NS, SERVICE_NS};
use neplan_ws::soap::transport::SERVICE_PATH;
use neplan_ws::ConnectionConfig;

pub const HASH: &str = "5baa61e4c9b93f3f0682250b6cf8331b7ee68fd8";

pub fn connection(server: &MockServer) -> ConnectionConfig {
    ConnectionConfig {
        server: server.base_url(),
        username: "planner".to_string(),
        password_hash: HASH.to_string(),
        accept_invalid_certs: false,
        timeout_seconds: Some(10),
    }
}

pub fn soap_reply(operation: &str, inner: &str) -> String {
    format!(
        r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><{op}Response xmlns="{ns}">{inner}</{op}Response></s:Body></s:Envelope>"#,
        op = operation,
        ns = SERVICE_NS,
        inner = inner
    )
}

pub fn result_reply(operation: &str, text: &str) -> String {
    soap_reply(
        operation,
        &format!("<{op}Result>{text}</{op}Result>", op = operation, text = text),
    )
}

pub fn struct_reply(operation: &str, fields: &[(&str, &str)]) -> String {
    let body: String = fields
        .iter()
        .map(|(name, value)| format!("<a:{n}>{v}</a:{n}>", n = name, v = value))
        .collect();
    soap_reply(
        operation,
        &format!(
            r#"<{op}Result xmlns:a="{ns}" xmlns:i="http://www.w3.org/2001/XMLSchema-instance">{body}</{op}Result>"#,
            op = operation,
            ns = DATA_NS,
            body = body
        ),
    )
}

pub fn project_reply(id: &str, name: &str) -> String {
    struct_reply(
        "GetProject",
        &[("ProjectID", id), ("ProjectName", name), ("VariantID", "v-1")],
    )
}

pub fn nil_project_reply() -> String {
    soap_reply(
        "GetProject",
        r#"<GetProjectResult i:nil="true" xmlns:i="http://www.w3.org/2001/XMLSchema-instance"/>"#,
    )
}

pub fn fault_reply(code: &str, reason: &str, detail: &str) -> String {
    format!(
        r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><s:Fault><faultcode>{}</faultcode><faultstring xml:lang="en-US">{}</faultstring><detail><ExceptionDetail><Message>{}</Message></ExceptionDetail></detail></s:Fault></s:Body></s:Envelope>"#,
        code, reason, detail
    )
}

/// Mocks one operation, told apart by its SOAPAction header.
pub async fn mock_operation<'a>(
    server: &'a MockServer,
    operation: &str,
    status: u16,
    body: String,
) -> httpmock::Mock<'a> {
    let action = soap_action(operation);
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path(SERVICE_PATH)
                .header("SOAPAction", action.as_str());
            then.status(status)
                .header("Content-Type", "text/xml; charset=utf-8")
                .body(body);
        })
        .await
}
