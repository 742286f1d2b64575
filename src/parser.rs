//! Document Parsing
//!
//! Turns XML or JSON text into a [`Document`] tree:
//!
//! - every element becomes one instance in the sequence under its parent's field
//!   of the same name, so repeated elements keep their multiplicity,
//! - attributes become the node's attribute set,
//! - an element with child elements becomes a fields node; otherwise it is a
//!   scalar holding its text, with whitespace-only text normalized to `""`.
//!
//! JSON input follows the same shape: `{"root": {"field": [ ... ]}}`, where `$`
//! holds attributes and `_` holds the text of an element that also has attributes.
//!
//! XML nesting is capped at [`MAX_DEPTH`] elements; serde_json applies its own
//! recursion limit to JSON.

use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde_json::Value;
use tracing::trace;

use crate::error::{ParseError, ParseResult};
use crate::tree::{Attributes, DataNode, Document, Fields};

const JSON_ATTRIBUTES_KEY: &str = "$";
const JSON_TEXT_KEY: &str = "_";

/// Deepest element nesting accepted from XML input, root included
pub const MAX_DEPTH: usize = 1024;

/// Source format of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Xml,
    Json,
}

impl DocumentFormat {
    /// `.json` files are JSON; everything else is read as XML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Xml,
        }
    }
}

/// Parse `content` in the given format
pub fn parse_document(content: &str, format: DocumentFormat) -> ParseResult<Document> {
    match format {
        DocumentFormat::Xml => parse_xml(content),
        DocumentFormat::Json => parse_json(content),
    }
}

/// Element whose end tag has not been seen yet
struct OpenElement {
    name: String,
    attributes: Attributes,
    fields: Fields,
    text: String,
}

impl OpenElement {
    fn from_start(start: &BytesStart<'_>, position: u64) -> ParseResult<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();

        let mut attributes = Attributes::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| xml_error(position, e))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| xml_error(position, e))?
                .into_owned();
            attributes.insert(key, value);
        }

        Ok(Self {
            name,
            attributes,
            fields: Fields::new(),
            text: String::new(),
        })
    }

    fn finish(self) -> (String, DataNode) {
        let mut node = if self.fields.is_empty() {
            if self.text.trim().is_empty() {
                DataNode::scalar("")
            } else {
                DataNode::scalar(self.text)
            }
        } else {
            // Text interleaved with child elements is dropped.
            DataNode::fields(self.fields)
        };
        node.attributes = self.attributes;
        (self.name, node)
    }
}

fn xml_error(position: u64, err: impl std::fmt::Display) -> ParseError {
    ParseError::Xml {
        position,
        details: err.to_string(),
    }
}

/// Parse an XML document into a data tree
pub fn parse_xml(content: &str) -> ParseResult<Document> {
    let mut reader = Reader::from_str(content);
    let mut stack: Vec<OpenElement> = Vec::new();
    let mut document: Option<Document> = None;

    loop {
        let position = reader.buffer_position() as u64;
        let event = reader.read_event().map_err(|e| xml_error(position, e))?;

        match event {
            Event::Start(start) => {
                if stack.len() >= MAX_DEPTH {
                    return Err(ParseError::TooDeep { depth: MAX_DEPTH });
                }
                stack.push(OpenElement::from_start(&start, position)?);
            }
            Event::Empty(start) => {
                let (name, node) = OpenElement::from_start(&start, position)?.finish();
                attach(&mut stack, &mut document, name, node)?;
            }
            Event::End(end) => {
                let element = stack.pop().ok_or_else(|| ParseError::UnexpectedEndTag {
                    name: String::from_utf8_lossy(end.name().as_ref()).into_owned(),
                })?;
                let (name, node) = element.finish();
                attach(&mut stack, &mut document, name, node)?;
            }
            Event::Text(text) => {
                if let Some(open) = stack.last_mut() {
                    let unescaped = text.unescape().map_err(|e| xml_error(position, e))?;
                    open.text.push_str(&unescaped);
                }
            }
            Event::CData(cdata) => {
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&String::from_utf8_lossy(&cdata));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(ParseError::UnclosedElement { name: open.name });
    }

    document.ok_or(ParseError::NoRootElement)
}

fn attach(
    stack: &mut [OpenElement],
    document: &mut Option<Document>,
    name: String,
    node: DataNode,
) -> ParseResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.fields.push(name, node),
        None if document.is_some() => return Err(ParseError::MultipleRoots { name }),
        None => *document = Some(Document::new(name, node)),
    }
    Ok(())
}

/// Parse a JSON document shaped like the XML tree convention
pub fn parse_json(content: &str) -> ParseResult<Document> {
    let value: Value = serde_json::from_str(content)?;

    let Value::Object(top) = value else {
        return Err(ParseError::InvalidJsonRoot);
    };
    if top.len() != 1 {
        return Err(ParseError::InvalidJsonRoot);
    }
    let Some((root_name, root_value)) = top.into_iter().next() else {
        return Err(ParseError::InvalidJsonRoot);
    };

    let root = json_node(root_value).ok_or(ParseError::InvalidJsonRoot)?;
    Ok(Document::new(root_name, root))
}

/// Convert one JSON value into a node; `None` for shapes that cannot be a node
fn json_node(value: Value) -> Option<DataNode> {
    match value {
        Value::String(text) => Some(DataNode::scalar(text)),
        Value::Number(number) => Some(DataNode::scalar(number.to_string())),
        Value::Bool(flag) => Some(DataNode::scalar(flag.to_string())),
        Value::Null => Some(DataNode::scalar("")),
        Value::Array(_) => None,
        Value::Object(map) => {
            let mut attributes = Attributes::new();
            let mut text = String::new();
            let mut fields = Fields::new();

            for (key, value) in map {
                match (key.as_str(), value) {
                    (JSON_ATTRIBUTES_KEY, Value::Object(attrs)) => {
                        for (name, value) in attrs {
                            if let Some(value) = json_scalar(value) {
                                attributes.insert(name, value);
                            }
                        }
                    }
                    (JSON_TEXT_KEY, value) => {
                        text = json_scalar(value).unwrap_or_default();
                    }
                    (_, Value::Array(instances)) => {
                        for instance in instances {
                            match json_node(instance) {
                                Some(node) => fields.push(key.clone(), node),
                                None => trace!(field = %key, "skipping nested array instance"),
                            }
                        }
                    }
                    // A field that is not a sequence is treated as absent.
                    (_, _) => trace!(field = %key, "skipping non-sequence field"),
                }
            }

            let mut node = if fields.is_empty() {
                DataNode::scalar(if text.trim().is_empty() { String::new() } else { text })
            } else {
                DataNode::fields(fields)
            };
            node.attributes = attributes;
            Some(node)
        }
    }
}

fn json_scalar(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}
