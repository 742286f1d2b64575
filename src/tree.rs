//! Generic Data Tree
//!
//! Format-agnostic representation of a parsed document. Every element decodes to
//! an entry in a sequence under its parent so that repetition is preserved by
//! multiplicity: a field name maps to one or more [`DataNode`]s, or is absent.

use std::collections::BTreeMap;

/// Attribute set attached to a node (e.g. `count="3"`)
pub type Attributes = BTreeMap<String, String>;

/// Name of the attribute declaring the expected number of repetitions
pub const COUNT_ATTRIBUTE: &str = "count";

/// Ordered mapping from field name to its non-empty sequence of instances
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    entries: Vec<(String, Vec<DataNode>)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instance under `name`, keeping first-seen field order
    pub fn push(&mut self, name: impl Into<String>, node: DataNode) {
        let name = name.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, instances)) => instances.push(node),
            None => self.entries.push((name, vec![node])),
        }
    }

    /// All instances under `name`, or `None` when the field is absent.
    ///
    /// A present field always has at least one instance.
    pub fn get(&self, name: &str) -> Option<&[DataNode]> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, instances)| instances.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterate fields in document order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[DataNode])> {
        self.entries
            .iter()
            .map(|(key, instances)| (key.as_str(), instances.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<DataNode>)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, Vec<DataNode>)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (name, instances) in iter {
            let name = name.into();
            for node in instances {
                fields.push(name.clone(), node);
            }
        }
        fields
    }
}

/// Content of a node: either text or nested fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeValue {
    Scalar(String),
    Fields(Fields),
}

/// A single node of the data tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataNode {
    pub value: NodeValue,
    pub attributes: Attributes,
}

impl DataNode {
    pub fn scalar(text: impl Into<String>) -> Self {
        Self {
            value: NodeValue::Scalar(text.into()),
            attributes: Attributes::new(),
        }
    }

    pub fn fields(fields: Fields) -> Self {
        Self {
            value: NodeValue::Fields(fields),
            attributes: Attributes::new(),
        }
    }

    /// Build an interior node from `(name, instances)` pairs
    pub fn element<K, I>(children: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Vec<DataNode>)>,
    {
        Self::fields(children.into_iter().collect())
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match &self.value {
            NodeValue::Scalar(text) => Some(text),
            NodeValue::Fields(_) => None,
        }
    }

    pub fn as_fields(&self) -> Option<&Fields> {
        match &self.value {
            NodeValue::Fields(fields) => Some(fields),
            NodeValue::Scalar(_) => None,
        }
    }

    pub fn is_interior(&self) -> bool {
        matches!(self.value, NodeValue::Fields(_))
    }

    /// Instances under `name`; a scalar node has no fields, so this is `None`
    pub fn field(&self, name: &str) -> Option<&[DataNode]> {
        self.as_fields().and_then(|fields| fields.get(name))
    }

    /// First instance under `name`
    pub fn first(&self, name: &str) -> Option<&DataNode> {
        self.field(name).and_then(|instances| instances.first())
    }
}

/// A parsed document: the root element's name and its node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub root_name: String,
    pub root: DataNode,
}

impl Document {
    pub fn new(root_name: impl Into<String>, root: DataNode) -> Self {
        Self {
            root_name: root_name.into(),
            root,
        }
    }

    /// Instances of `record_tag` directly under the root, in document order
    pub fn records(&self, record_tag: &str) -> &[DataNode] {
        self.root.field(record_tag).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_merges_repeated_fields() {
        let mut fields = Fields::new();
        fields.push("item", DataNode::scalar("a"));
        fields.push("other", DataNode::scalar("x"));
        fields.push("item", DataNode::scalar("b"));

        assert_eq!(fields.len(), 2);
        let items = fields.get("item").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].as_scalar(), Some("b"));

        let order: Vec<&str> = fields.iter().map(|(name, _)| name).collect();
        assert_eq!(order, vec!["item", "other"]);
    }

    #[test]
    fn test_absent_field_is_none() {
        let node = DataNode::element([("a", vec![DataNode::scalar("1")])]);
        assert!(node.field("b").is_none());
        assert!(node.first("b").is_none());
        assert_eq!(node.first("a").and_then(DataNode::as_scalar), Some("1"));
    }

    #[test]
    fn test_scalar_has_no_fields() {
        let node = DataNode::scalar("text");
        assert!(node.field("anything").is_none());
        assert!(!node.is_interior());
    }

    #[test]
    fn test_attributes() {
        let node = DataNode::scalar("x").with_attribute(COUNT_ATTRIBUTE, "3");
        assert_eq!(node.attribute("count"), Some("3"));
        assert_eq!(node.attribute("missing"), None);
    }

    #[test]
    fn test_document_records() {
        let root = DataNode::element([(
            "transaction",
            vec![DataNode::fields(Fields::new()), DataNode::fields(Fields::new())],
        )]);
        let doc = Document::new("root", root);
        assert_eq!(doc.records("transaction").len(), 2);
        assert!(doc.records("payment").is_empty());

        let scalar_doc = Document::new("root", DataNode::scalar(""));
        assert!(scalar_doc.records("transaction").is_empty());
    }
}
