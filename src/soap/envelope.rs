use crate::soap::xml::{parse_document, XmlNode};
use crate::utils::error::{NeplanError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use regex::Regex;

pub const SERVICE_NS: &str = "http://www.neplan.ch/Web/External";
pub const DATA_NS: &str = "http://schemas.datacontract.org/2004/07/Neplan.Web.External";
pub const ARRAYS_NS: &str = "http://schemas.microsoft.com/2003/10/Serialization/Arrays";

const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const WSSE_NS: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd";
const PASSWORD_TEXT: &str = "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-username-token-profile-1.0#PasswordText";
const REDACTED: &str = "***";

/// Namespace a struct's fields are written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ns {
    Service,
    Data,
    Arrays,
}

impl Ns {
    fn prefix(self) -> &'static str {
        match self {
            Ns::Service => "ns0",
            Ns::Data => "ns1",
            Ns::Arrays => "arr",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SoapValue {
    Nil,
    Text(String),
    Bool(bool),
    Int(i64),
    DateTime(DateTime<Utc>),
    /// `xsd:base64Binary` stream body.
    Bytes(Vec<u8>),
    Struct {
        ns: Ns,
        fields: Vec<(String, SoapValue)>,
    },
    /// Items are always written in the serialization-arrays namespace.
    Array {
        item: String,
        items: Vec<SoapValue>,
    },
}

impl SoapValue {
    pub fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SoapValue::Array {
            item: "string".to_string(),
            items: items.into_iter().map(|s| SoapValue::Text(s.into())).collect(),
        }
    }

    pub fn empty_dictionary() -> Self {
        SoapValue::Array {
            item: "KeyValueOfstringstring".to_string(),
            items: Vec::new(),
        }
    }
}

impl From<&str> for SoapValue {
    fn from(value: &str) -> Self {
        SoapValue::Text(value.to_string())
    }
}

impl From<String> for SoapValue {
    fn from(value: String) -> Self {
        SoapValue::Text(value)
    }
}

impl From<bool> for SoapValue {
    fn from(value: bool) -> Self {
        SoapValue::Bool(value)
    }
}

impl From<i64> for SoapValue {
    fn from(value: i64) -> Self {
        SoapValue::Int(value)
    }
}

impl From<DateTime<Utc>> for SoapValue {
    fn from(value: DateTime<Utc>) -> Self {
        SoapValue::DateTime(value)
    }
}

impl<T: Into<SoapValue>> From<Option<T>> for SoapValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SoapValue::Nil)
    }
}

/// One operation argument, written as `ns0:{name}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub value: SoapValue,
}

impl Param {
    pub fn new(name: &str, value: impl Into<SoapValue>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UsernameToken {
    pub username: String,
    pub password_hash: String,
}

pub fn soap_action(operation: &str) -> String {
    format!("\"{}/NeplanService/{}\"", SERVICE_NS, operation)
}

pub fn build_envelope(operation: &str, params: &[Param], token: &UsernameToken) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let envelope = BytesStart::new("soapenv:Envelope").with_attributes([
        ("xmlns:soapenv", SOAP_ENV_NS),
        ("xmlns:xsi", XSI_NS),
        ("xmlns:ns0", SERVICE_NS),
        ("xmlns:ns1", DATA_NS),
        ("xmlns:arr", ARRAYS_NS),
    ]);
    writer.write_event(Event::Start(envelope))?;

    writer.write_event(Event::Start(BytesStart::new("soapenv:Header")))?;
    writer.write_event(Event::Start(
        BytesStart::new("wsse:Security")
            .with_attributes([("xmlns:wsse", WSSE_NS), ("soapenv:mustUnderstand", "1")]),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("wsse:UsernameToken")))?;
    write_text(&mut writer, BytesStart::new("wsse:Username"), &token.username)?;
    write_text(
        &mut writer,
        BytesStart::new("wsse:Password").with_attributes([("Type", PASSWORD_TEXT)]),
        &token.password_hash,
    )?;
    writer.write_event(Event::End(BytesEnd::new("wsse:UsernameToken")))?;
    writer.write_event(Event::End(BytesEnd::new("wsse:Security")))?;
    writer.write_event(Event::End(BytesEnd::new("soapenv:Header")))?;

    writer.write_event(Event::Start(BytesStart::new("soapenv:Body")))?;
    let op_tag = format!("ns0:{}", operation);
    writer.write_event(Event::Start(BytesStart::new(op_tag.as_str())))?;
    for param in params {
        write_value(&mut writer, &format!("ns0:{}", param.name), &param.value)?;
    }
    writer.write_event(Event::End(BytesEnd::new(op_tag.as_str())))?;
    writer.write_event(Event::End(BytesEnd::new("soapenv:Body")))?;
    writer.write_event(Event::End(BytesEnd::new("soapenv:Envelope")))?;

    String::from_utf8(writer.into_inner())
        .map_err(|e| NeplanError::unexpected(operation, format!("non UTF-8 envelope: {}", e)))
}

/// Copy of an envelope with the `wsse:Password` content masked, for logs and history.
pub fn redact_credentials(envelope: &str) -> Result<String> {
    let re = Regex::new(r"(<wsse:Password\b[^>]*>)[^<]*(</wsse:Password>)")
        .map_err(|e| NeplanError::unexpected("redact", e.to_string()))?;
    Ok(re
        .replace_all(envelope, format!("${{1}}{}${{2}}", REDACTED).as_str())
        .into_owned())
}

fn write_text(writer: &mut Writer<Vec<u8>>, start: BytesStart<'_>, text: &str) -> Result<()> {
    let end = start.to_end().into_owned();
    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(end))?;
    Ok(())
}

fn write_value(writer: &mut Writer<Vec<u8>>, tag: &str, value: &SoapValue) -> Result<()> {
    match value {
        SoapValue::Nil => {
            writer.write_event(Event::Empty(
                BytesStart::new(tag).with_attributes([("xsi:nil", "true")]),
            ))?;
        }
        SoapValue::Text(text) => write_text(writer, BytesStart::new(tag), text)?,
        SoapValue::Bool(flag) => {
            write_text(writer, BytesStart::new(tag), if *flag { "true" } else { "false" })?
        }
        SoapValue::Int(number) => write_text(writer, BytesStart::new(tag), &number.to_string())?,
        SoapValue::DateTime(at) => write_text(
            writer,
            BytesStart::new(tag),
            &at.to_rfc3339_opts(SecondsFormat::Secs, true),
        )?,
        SoapValue::Bytes(bytes) => write_text(writer, BytesStart::new(tag), &STANDARD.encode(bytes))?,
        SoapValue::Struct { ns, fields } => {
            writer.write_event(Event::Start(BytesStart::new(tag)))?;
            for (name, field) in fields {
                write_value(writer, &format!("{}:{}", ns.prefix(), name), field)?;
            }
            writer.write_event(Event::End(BytesEnd::new(tag)))?;
        }
        SoapValue::Array { item, items } => {
            writer.write_event(Event::Start(BytesStart::new(tag)))?;
            let item_tag = format!("{}:{}", Ns::Arrays.prefix(), item);
            for entry in items {
                write_value(writer, &item_tag, entry)?;
            }
            writer.write_event(Event::End(BytesEnd::new(tag)))?;
        }
    }
    Ok(())
}

/// Extracts the `{operation}Response` element, turning a SOAP fault into an error.
pub fn read_response(operation: &str, xml: &str) -> Result<XmlNode> {
    let body = parse_document(xml)?
        .take_child("Envelope")
        .and_then(|envelope| envelope.take_child("Body"))
        .ok_or_else(|| NeplanError::unexpected(operation, "reply has no SOAP body"))?;

    let payload = body
        .children
        .into_iter()
        .next()
        .ok_or_else(|| NeplanError::unexpected(operation, "empty SOAP body"))?;

    if payload.name == "Fault" {
        return Err(fault_from(&payload));
    }

    let expected = format!("{}Response", operation);
    if payload.name != expected {
        return Err(NeplanError::unexpected(
            operation,
            format!("expected <{}>, got <{}>", expected, payload.name),
        ));
    }
    Ok(payload)
}

fn fault_from(fault: &XmlNode) -> NeplanError {
    // SOAP 1.1 first, SOAP 1.2 shape as fallback
    let code = fault
        .child_text("faultcode")
        .or_else(|| fault.child("Code").and_then(|c| c.child_text("Value")))
        .unwrap_or("unknown")
        .to_string();
    let reason = fault
        .child_text("faultstring")
        .or_else(|| fault.child("Reason").and_then(|r| r.child_text("Text")))
        .unwrap_or("no reason given")
        .to_string();
    let detail = fault
        .child("detail")
        .or_else(|| fault.child("Detail"))
        .map(|d| d.leaf_summary().join("; "))
        .filter(|d| !d.is_empty());

    NeplanError::Fault {
        code,
        reason,
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> UsernameToken {
        UsernameToken {
            username: "planner".to_string(),
            password_hash: "5baa61e4c9b93f3f0682250b6cf8331b7ee68fd8".to_string(),
        }
    }

    #[test]
    fn envelope_carries_token_and_params_in_order() {
        let params = vec![
            Param::new("projectName", "Grid <North>"),
            Param::new("variantName", ""),
            Param::new("operationalState", None::<String>),
        ];
        let xml = build_envelope("GetProject", &params, &token()).unwrap();

        assert!(xml.contains("<wsse:Username>planner</wsse:Username>"));
        assert!(xml.contains("#PasswordText\">5baa61e4c9b93f3f0682250b6cf8331b7ee68fd8</wsse:Password>"));
        assert!(xml.contains("<ns0:projectName>Grid &lt;North&gt;</ns0:projectName>"));
        assert!(xml.contains("<ns0:operationalState xsi:nil=\"true\"/>"));
        let name_at = xml.find("ns0:projectName").unwrap();
        let variant_at = xml.find("ns0:variantName").unwrap();
        assert!(name_at < variant_at);

        let parsed = parse_document(&xml).unwrap();
        let op = parsed.find("GetProject").unwrap();
        assert_eq!(op.children.len(), 3);
    }

    #[test]
    fn redacted_envelope_masks_only_the_password() {
        let xml = build_envelope("GetProjects", &[], &token()).unwrap();
        let redacted = redact_credentials(&xml).unwrap();

        assert!(!redacted.contains("5baa61e4c9b93f3f0682250b6cf8331b7ee68fd8"));
        assert!(redacted.contains("#PasswordText\">***</wsse:Password>"));
        assert!(redacted.contains("<wsse:Username>planner</wsse:Username>"));
        assert!(redacted.contains("<ns0:GetProjects>"));
        assert!(parse_document(&redacted).is_ok());
    }

    #[test]
    fn bytes_are_base64_and_arrays_use_array_namespace() {
        let params = vec![
            Param::new("stream", SoapValue::Bytes(b"PK\x03\x04".to_vec())),
            Param::new("inputFiles", SoapValue::strings(["a.xml", "b.xml"])),
        ];
        let xml = build_envelope("CIMImport", &params, &token()).unwrap();

        assert!(xml.contains("<ns0:stream>UEsDBA==</ns0:stream>"));
        assert!(xml.contains("<ns0:inputFiles><arr:string>a.xml</arr:string><arr:string>b.xml</arr:string></ns0:inputFiles>"));
    }

    #[test]
    fn soap_action_is_quoted() {
        assert_eq!(
            soap_action("GetProjects"),
            "\"http://www.neplan.ch/Web/External/NeplanService/GetProjects\""
        );
    }

    #[test]
    fn reads_operation_response() {
        let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
            <s:Body><GetLogOnUrlResponse xmlns="http://www.neplan.ch/Web/External">
                <GetLogOnUrlResult>http://localhost/Neplan</GetLogOnUrlResult>
            </GetLogOnUrlResponse></s:Body></s:Envelope>"#;

        let response = read_response("GetLogOnUrl", xml).unwrap();
        assert_eq!(
            response.child_text("GetLogOnUrlResult"),
            Some("http://localhost/Neplan")
        );
    }

    #[test]
    fn fault_becomes_error_with_detail() {
        let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
            <s:Body><s:Fault>
                <faultcode>s:Client</faultcode>
                <faultstring>Import failed</faultstring>
                <detail><ExceptionDetail><Message>Project name exists</Message></ExceptionDetail></detail>
            </s:Fault></s:Body></s:Envelope>"#;

        match read_response("ImportFromListFile", xml) {
            Err(NeplanError::Fault {
                code,
                reason,
                detail,
            }) => {
                assert_eq!(code, "s:Client");
                assert_eq!(reason, "Import failed");
                assert_eq!(detail.as_deref(), Some("Message: Project name exists"));
            }
            other => panic!("expected fault, got {:?}", other),
        }
    }

    #[test]
    fn wrong_response_element_is_rejected() {
        let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
            <s:Body><GetProjectsResponse/></s:Body></s:Envelope>"#;
        assert!(matches!(
            read_response("GetProject", xml),
            Err(NeplanError::UnexpectedResponse { .. })
        ));
    }
}
