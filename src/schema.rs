//! Mandatory-Field Schema
//!
//! A schema is a tree of field names. A [`SchemaNode::Leaf`] requires the field to
//! exist with a non-empty value; a [`SchemaNode::Interior`] requires the field to
//! exist and its first instance to satisfy the nested fields.
//!
//! Schema files are TOML or JSON. `true` marks a leaf, a table marks an interior
//! node, and key order in the file is the traversal order:
//!
//! ```toml
//! transactionId = true
//! amount = true
//!
//! [payee.address]
//! city = true
//! ```

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, Unexpected, Visitor};

use crate::error::{SchemaError, SchemaResult};

/// Ordered, unique-keyed children of an interior schema node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaFields {
    children: Vec<(String, SchemaNode)>,
}

impl SchemaFields {
    /// Iterate children in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaNode)> {
        self.children
            .iter()
            .map(|(name, node)| (name.as_str(), node))
    }

    pub fn get(&self, name: &str) -> Option<&SchemaNode> {
        self.children
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, node)| node)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn insert(&mut self, name: String, node: SchemaNode) -> SchemaResult<()> {
        if self.get(&name).is_some() {
            return Err(SchemaError::DuplicateKey { key: name });
        }
        self.children.push((name, node));
        Ok(())
    }
}

/// A node of the mandatory-field schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaNode {
    /// Field must be present and non-empty
    Leaf,
    /// Field must be present; its first instance is matched against these fields
    Interior(SchemaFields),
}

impl SchemaNode {
    pub fn leaf() -> Self {
        SchemaNode::Leaf
    }

    /// Build an interior node, rejecting duplicate keys
    pub fn interior<K, I>(children: I) -> SchemaResult<Self>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, SchemaNode)>,
    {
        let mut fields = SchemaFields::default();
        for (name, node) in children {
            fields.insert(name.into(), node)?;
        }
        Ok(SchemaNode::Interior(fields))
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, SchemaNode::Leaf)
    }

    /// Children of an interior node; `None` for a leaf
    pub fn children(&self) -> Option<&SchemaFields> {
        match self {
            SchemaNode::Interior(fields) => Some(fields),
            SchemaNode::Leaf => None,
        }
    }

    /// Number of nodes below this one
    pub fn field_count(&self) -> usize {
        self.children()
            .map(|fields| fields.iter().map(|(_, node)| 1 + node.field_count()).sum())
            .unwrap_or(0)
    }

    /// Depth of the deepest leaf below this node
    pub fn depth(&self) -> usize {
        self.children()
            .map(|fields| {
                fields
                    .iter()
                    .map(|(_, node)| 1 + node.depth())
                    .max()
                    .unwrap_or(0)
            })
            .unwrap_or(0)
    }
}

impl<'de> Deserialize<'de> for SchemaNode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(SchemaNodeVisitor)
    }
}

struct SchemaNodeVisitor;

impl<'de> Visitor<'de> for SchemaNodeVisitor {
    type Value = SchemaNode;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("`true` for a required field or a table of nested fields")
    }

    fn visit_bool<E>(self, value: bool) -> Result<SchemaNode, E>
    where
        E: de::Error,
    {
        if value {
            Ok(SchemaNode::Leaf)
        } else {
            Err(E::invalid_value(Unexpected::Bool(false), &self))
        }
    }

    fn visit_map<A>(self, mut map: A) -> Result<SchemaNode, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut fields = SchemaFields::default();
        while let Some(name) = map.next_key::<String>()? {
            let node = map.next_value::<SchemaNode>()?;
            fields.insert(name, node).map_err(de::Error::custom)?;
        }
        Ok(SchemaNode::Interior(fields))
    }
}

/// Root of a mandatory-field schema. Always an interior node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    root: SchemaNode,
}

impl Schema {
    pub fn new(root: SchemaNode) -> SchemaResult<Self> {
        if root.is_leaf() {
            return Err(SchemaError::RootNotInterior);
        }
        Ok(Self { root })
    }

    pub fn from_toml_str(content: &str) -> SchemaResult<Self> {
        let root: SchemaNode = toml::from_str(content)?;
        Self::new(root)
    }

    pub fn from_json_str(content: &str) -> SchemaResult<Self> {
        let root: SchemaNode = serde_json::from_str(content)?;
        Self::new(root)
    }

    pub fn root(&self) -> &SchemaNode {
        &self.root
    }
}
