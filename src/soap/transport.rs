use crate::domain::ports::{ConfigProvider, RemoteGateway};
use crate::soap::envelope::{
    build_envelope, read_response, redact_credentials, soap_action, Param, UsernameToken,
};
use crate::soap::xml::{pretty_print, XmlNode};
use crate::utils::error::{NeplanError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::fmt::Write as _;
use std::sync::Mutex;

pub const SERVICE_PATH: &str = "/Services/External/NeplanService.svc/basic";
const CONTENT_TYPE: &str = "text/xml; charset=utf-8";
const MAX_ERROR_BODY: usize = 2_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    pub headers: Vec<(String, String)>,
    pub envelope: String,
}

/// Last request/reply pair, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageExchange {
    pub operation: String,
    pub sent: MessageRecord,
    pub received: Option<MessageRecord>,
}

impl MessageExchange {
    pub fn format(&self) -> String {
        let mut out = String::new();
        let sections = [("SENT", Some(&self.sent)), ("RECEIVED", self.received.as_ref())];
        for (label, record) in sections {
            let _ = writeln!(out, "---{}--- {}", label, self.operation);
            let Some(record) = record else {
                let _ = writeln!(out, "(no reply)");
                continue;
            };
            let _ = writeln!(out, "### http header ###");
            for (name, value) in &record.headers {
                let _ = writeln!(out, "{}: {}", name, value);
            }
            let _ = writeln!(out, "### {} envelope START ###", label);
            match pretty_print(&record.envelope) {
                Ok(pretty) => out.push_str(&pretty),
                Err(_) => out.push_str(&record.envelope),
            }
            let _ = writeln!(out);
            let _ = writeln!(out, "### {} envelope END ###", label);
        }
        out
    }
}

/// HTTP binding of the service. One instance is one authenticated session.
pub struct HttpGateway {
    client: Client,
    server: String,
    endpoint: String,
    token: UsernameToken,
    history: Mutex<Option<MessageExchange>>,
}

impl HttpGateway {
    pub fn new<C: ConfigProvider>(config: &C) -> Result<Self> {
        let mut builder = Client::builder().danger_accept_invalid_certs(config.accept_invalid_certs());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let server = config.server_url().trim_end_matches('/').to_string();

        tracing::debug!("Service created for {}", server);
        Ok(Self {
            client: builder.build()?,
            endpoint: format!("{}{}", server, SERVICE_PATH),
            server,
            token: UsernameToken {
                username: config.username().to_string(),
                password_hash: config.password_hash().to_string(),
            },
            history: Mutex::new(None),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn record_sent(&self, operation: &str, sent: MessageRecord) {
        if let Ok(mut history) = self.history.lock() {
            *history = Some(MessageExchange {
                operation: operation.to_string(),
                sent,
                received: None,
            });
        }
    }

    fn record_received(&self, received: MessageRecord) {
        if let Ok(mut history) = self.history.lock() {
            if let Some(exchange) = history.as_mut() {
                exchange.received = Some(received);
            }
        }
    }
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    async fn call(&self, operation: &str, params: Vec<Param>) -> Result<XmlNode> {
        let envelope = build_envelope(operation, &params, &self.token)?;
        let action = soap_action(operation);

        let redacted = redact_credentials(&envelope)?;
        tracing::debug!("→ {} ({} bytes)", operation, envelope.len());
        tracing::debug!("sent envelope: {}", redacted);
        self.record_sent(
            operation,
            MessageRecord {
                headers: vec![
                    ("Content-Type".to_string(), CONTENT_TYPE.to_string()),
                    ("SOAPAction".to_string(), action.clone()),
                ],
                envelope: redacted,
            },
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .header("SOAPAction", action)
            .body(envelope)
            .send()
            .await?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    value.to_str().unwrap_or("<binary>").to_string(),
                )
            })
            .collect();
        let body = response.text().await?;

        tracing::debug!("← {} HTTP {} ({} bytes)", operation, status, body.len());
        tracing::debug!("received envelope: {}", body);
        let parsed = read_response(operation, &body);
        let result = if status.is_success() {
            parsed
        } else {
            match parsed {
                Err(fault @ NeplanError::Fault { .. }) => Err(fault),
                _ => Err(NeplanError::HttpStatus {
                    operation: operation.to_string(),
                    status: status.as_u16(),
                    body: body.chars().take(MAX_ERROR_BODY).collect(),
                }),
            }
        };
        self.record_received(MessageRecord {
            headers,
            envelope: body,
        });
        result
    }

    fn server_url(&self) -> &str {
        &self.server
    }

    fn username(&self) -> &str {
        &self.token.username
    }

    fn last_exchange(&self) -> Option<MessageExchange> {
        self.history.lock().ok().and_then(|history| history.clone())
    }
}
