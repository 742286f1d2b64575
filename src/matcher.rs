//! Schema Matching
//!
//! Walks a [`SchemaNode`] in lockstep with a [`DataNode`] and reports every
//! required field that is absent or blank. Only the first instance of a field is
//! examined; repetition is the concern of [`crate::reconcile`].

use crate::schema::SchemaNode;
use crate::tree::DataNode;
use crate::violation::{FieldPath, Violation};

/// Match `data` against `schema`, reporting paths relative to `prefix`.
///
/// Violations come out in schema traversal order. A leaf schema has no
/// children and therefore matches anything.
pub fn match_schema(data: &DataNode, schema: &SchemaNode, prefix: &FieldPath) -> Vec<Violation> {
    let mut violations = Vec::new();
    collect(data, schema, prefix, &mut violations);
    violations
}

fn collect(data: &DataNode, schema: &SchemaNode, prefix: &FieldPath, out: &mut Vec<Violation>) {
    let Some(children) = schema.children() else {
        return;
    };

    for (key, child_schema) in children.iter() {
        let path = prefix.child(key);

        // A scalar where fields were expected counts as absent.
        let Some(first) = data.first(key) else {
            out.push(Violation::missing(path));
            continue;
        };

        match child_schema {
            SchemaNode::Interior(_) => collect(first, child_schema, &path, out),
            SchemaNode::Leaf => {
                if first.as_scalar() == Some("") {
                    out.push(Violation::empty(path));
                }
            }
        }
    }
}
