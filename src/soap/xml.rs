use crate::utils::error::{NeplanError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::fmt;

/// Namespace-stripped element tree of a reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    pub name: String,
    pub text: String,
    pub nil: bool,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_text(name: &str, text: &str) -> Self {
        Self {
            name: name.to_string(),
            text: text.to_string(),
            ..Default::default()
        }
    }

    pub fn with_children(name: &str, children: Vec<XmlNode>) -> Self {
        Self {
            name: name.to_string(),
            children,
            ..Default::default()
        }
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let mut node = XmlNode::new(&String::from_utf8_lossy(start.local_name().as_ref()));
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::InvalidAttr)?;
            if attr.key.local_name().as_ref() == b"nil" && attr.value.as_ref() == b"true" {
                node.nil = true;
            }
        }
        Ok(node)
    }

    /// Indentation around child elements is not content.
    fn drop_layout_text(&mut self) {
        if !self.children.is_empty() && self.text.trim().is_empty() {
            self.text.clear();
        }
    }

    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn take_child(self, name: &str) -> Option<XmlNode> {
        self.children.into_iter().find(|c| c.name == name)
    }

    /// Depth-first search, self included.
    pub fn find(&self, name: &str) -> Option<&XmlNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    /// Text content, `None` for `xsi:nil` elements.
    pub fn value(&self) -> Option<&str> {
        if self.nil {
            None
        } else {
            Some(self.text.as_str())
        }
    }

    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(|c| c.value())
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// `Key`/`Value` pairs of every `KeyValueOf...` element below this node.
    pub fn key_values(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        self.collect_key_values(&mut pairs);
        pairs
    }

    fn collect_key_values(&self, pairs: &mut Vec<(String, String)>) {
        if self.name.starts_with("KeyValueOf") {
            if let Some(key) = self.child_text("Key") {
                let value = self.child_text("Value").unwrap_or_default();
                pairs.push((key.to_string(), value.to_string()));
            }
            return;
        }
        for child in &self.children {
            child.collect_key_values(pairs);
        }
    }

    /// `Name: text` for every non-empty leaf, in document order.
    pub fn leaf_summary(&self) -> Vec<String> {
        let mut lines = Vec::new();
        self.collect_leaves(&mut lines);
        lines
    }

    fn collect_leaves(&self, lines: &mut Vec<String>) {
        if self.is_leaf() {
            if !self.text.is_empty() {
                lines.push(format!("{}: {}", self.name, self.text));
            }
            return;
        }
        for child in &self.children {
            child.collect_leaves(lines);
        }
    }
}

impl fmt::Display for XmlNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nil {
            return write!(f, "{}: <nil>", self.name);
        }
        if self.is_leaf() {
            return write!(f, "{}: {}", self.name, self.text);
        }
        write!(f, "{} {{ {} }}", self.name, self.leaf_summary().join(", "))
    }
}

/// Parses a whole document; the returned root is a synthetic `#document` node.
/// Leaf text is kept verbatim; whitespace between child elements is dropped.
pub fn parse_document(xml: &str) -> Result<XmlNode> {
    let mut reader = Reader::from_str(xml);

    let mut stack = vec![XmlNode::new("#document")];
    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(XmlNode::from_start(&start)?),
            Event::Empty(start) => {
                let node = XmlNode::from_start(&start)?;
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(node);
                }
            }
            Event::End(_) => {
                let mut node = stack
                    .pop()
                    .ok_or_else(|| NeplanError::unexpected("xml", "closing tag without opening tag"))?;
                node.drop_layout_text();
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => return Err(NeplanError::unexpected("xml", "unbalanced document")),
                }
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() != 1 {
        return Err(NeplanError::unexpected("xml", "document ended inside an element"));
    }
    let mut document = stack
        .pop()
        .ok_or_else(|| NeplanError::unexpected("xml", "empty document"))?;
    document.drop_layout_text();
    Ok(document)
}

/// Re-indents an XML document for human inspection.
pub fn pretty_print(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            event => writer.write_event(event)?,
        }
    }

    String::from_utf8(writer.into_inner())
        .map_err(|e| NeplanError::unexpected("xml", format!("non UTF-8 output: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_namespaced_tree_with_nil() {
        let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"
            xmlns:i="http://www.w3.org/2001/XMLSchema-instance">
            <s:Body><a:Item><a:Name>Line &amp; Bus</a:Name><a:Zone i:nil="true"/></a:Item></s:Body>
        </s:Envelope>"#;

        let doc = parse_document(xml).unwrap();
        let item = doc.find("Item").unwrap();
        assert_eq!(item.child_text("Name"), Some("Line & Bus"));
        assert!(item.child("Zone").unwrap().nil);
        assert_eq!(item.child_text("Zone"), None);
    }

    #[test]
    fn collects_key_values() {
        let xml = r#"<Root xmlns:b="arr">
            <b:KeyValueOfstringstring><b:Key>1</b:Key><b:Value>Line</b:Value></b:KeyValueOfstringstring>
            <b:KeyValueOfstringstring><b:Key>2</b:Key><b:Value>Busbar</b:Value></b:KeyValueOfstringstring>
        </Root>"#;

        let doc = parse_document(xml).unwrap();
        assert_eq!(
            doc.key_values(),
            vec![
                ("1".to_string(), "Line".to_string()),
                ("2".to_string(), "Busbar".to_string())
            ]
        );
    }

    #[test]
    fn leaf_text_keeps_surrounding_whitespace() {
        let xml = "<Root>\n  <Log>\n  line1\nline2  \n</Log>\n  <Name> Grid </Name>\n  <Blank>   </Blank>\n</Root>";

        let doc = parse_document(xml).unwrap();
        let root = doc.child("Root").unwrap();
        assert_eq!(root.text, "");
        assert_eq!(root.child_text("Log"), Some("\n  line1\nline2  \n"));
        assert_eq!(root.child_text("Name"), Some(" Grid "));
        assert_eq!(root.child_text("Blank"), Some("   "));
    }

    #[test]
    fn rejects_mismatched_tags() {
        assert!(parse_document("<a><b></a>").is_err());
    }

    #[test]
    fn pretty_print_indents() {
        let pretty = pretty_print("<a><b>x</b></a>").unwrap();
        assert!(pretty.contains("\n  <b>x</b>"));
    }
}
