use crate::soap::{Ns, SoapValue, XmlNode};
use crate::utils::error::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Opaque project handle (`ExternalProject`) echoed back to the service as received.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectRef {
    fields: Vec<XmlNode>,
}

impl ProjectRef {
    /// Stand-in used when a lookup failed; sent as `xsi:nil`.
    pub fn unresolved() -> Self {
        Self::default()
    }

    /// `None` when the service answered nil or a project without `ProjectID`.
    pub fn from_node(node: &XmlNode) -> Option<Self> {
        if node.nil {
            return None;
        }
        let project = Self {
            fields: node.children.clone(),
        };
        project.is_resolved().then_some(project)
    }

    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| XmlNode::with_text(k.as_ref(), v.as_ref()))
                .collect(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .and_then(|f| f.value())
    }

    pub fn id(&self) -> Option<&str> {
        self.field("ProjectID").filter(|id| !id.is_empty())
    }

    pub fn name(&self) -> Option<&str> {
        self.field("ProjectName")
    }

    pub fn variant_id(&self) -> Option<&str> {
        self.field("VariantID")
    }

    pub fn is_resolved(&self) -> bool {
        self.id().is_some()
    }

    pub fn to_soap(&self) -> SoapValue {
        if self.fields.is_empty() {
            return SoapValue::Nil;
        }
        node_fields_to_soap(&self.fields)
    }
}

fn node_fields_to_soap(fields: &[XmlNode]) -> SoapValue {
    SoapValue::Struct {
        ns: Ns::Data,
        fields: fields
            .iter()
            .map(|f| {
                let value = if f.nil {
                    SoapValue::Nil
                } else if f.is_leaf() {
                    SoapValue::Text(f.text.clone())
                } else {
                    node_fields_to_soap(&f.children)
                };
                (f.name.clone(), value)
            })
            .collect(),
    }
}

impl fmt::Display for ProjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.name(), self.id()) {
            (Some(name), Some(id)) => write!(f, "{} ({})", name, id),
            (None, Some(id)) => write!(f, "{}", id),
            _ => write!(f, "<unresolved project>"),
        }
    }
}

/// `AnalysisReturnInfo`. File names stay valid only for the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisResponse {
    pub log_filename: Option<String>,
    pub result_filename: Option<String>,
    pub fields: BTreeMap<String, String>,
}

impl AnalysisResponse {
    pub fn from_node(node: &XmlNode) -> Self {
        let non_empty = |name: &str| {
            node.child_text(name)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let fields = node
            .children
            .iter()
            .filter_map(|c| c.value().map(|v| (c.name.clone(), v.to_string())))
            .collect();

        Self {
            log_filename: non_empty("LogFilename"),
            result_filename: non_empty("ResultFilename"),
            fields,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeyValueTable {
    pub rows: Vec<(String, String)>,
}

impl KeyValueTable {
    pub fn from_node(node: &XmlNode) -> Self {
        Self {
            rows: node.key_values(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rows.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementRow {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "NAME")]
    pub name: String,
    #[serde(rename = "TYPE")]
    pub element_type: String,
}

/// Elements of a project: names and types joined on element ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ElementTable {
    pub rows: Vec<ElementRow>,
}

impl ElementTable {
    /// Inner join in the order of `names`; IDs without a type are dropped.
    pub fn join(names: &KeyValueTable, types: &KeyValueTable) -> Self {
        let types: BTreeMap<&str, &str> = types.iter().collect();
        let rows = names
            .iter()
            .filter_map(|(id, name)| {
                types.get(id).map(|element_type| ElementRow {
                    id: id.to_string(),
                    name: name.to_string(),
                    element_type: element_type.to_string(),
                })
            })
            .collect();
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn type_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for row in &self.rows {
            *counts.entry(row.element_type.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn of_type<'a>(&'a self, element_type: &'a str) -> impl Iterator<Item = &'a ElementRow> + 'a {
        self.rows.iter().filter(move |r| r.element_type == element_type)
    }

    pub fn write_csv<W: std::io::Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for row in &self.rows {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

/// Reply of `CIMImport` / `ImportFromListFile`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub result: Option<String>,
    pub fields: BTreeMap<String, String>,
}

impl ImportReport {
    /// Built from the whole `{operation}Response`: the result plus any output parameters.
    pub fn from_response(operation: &str, response: &XmlNode) -> Self {
        let mut fields = BTreeMap::new();
        for child in &response.children {
            collect_leaf_fields(child, &mut fields);
        }
        Self {
            result: response
                .child_text(&format!("{}Result", operation))
                .filter(|v| !v.is_empty())
                .map(str::to_string),
            fields,
        }
    }

    pub fn actual_created_project_name(&self) -> Option<&str> {
        self.fields
            .get("actualCreatedProjectName")
            .map(String::as_str)
    }
}

fn collect_leaf_fields(node: &XmlNode, fields: &mut BTreeMap<String, String>) {
    if node.is_leaf() {
        if let Some(value) = node.value() {
            fields.insert(node.name.clone(), value.to_string());
        }
        return;
    }
    for child in &node.children {
        collect_leaf_fields(child, fields);
    }
}

/// Outcome of a CIM export written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub path: PathBuf,
    pub bytes_written: usize,
    pub entries: Vec<String>,
}

impl ExportReport {
    pub fn written(&self) -> bool {
        self.bytes_written > 0
    }
}
