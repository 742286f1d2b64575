//! Count Reconciliation
//!
//! Scans the whole data tree, independently of any schema, for fields whose first
//! instance carries a `count` attribute and checks it against the number of
//! instances actually present.

use tracing::trace;

use crate::tree::{COUNT_ATTRIBUTE, DataNode};
use crate::violation::{FieldPath, Violation};

/// Reconcile declared repetition counts in `data`, reporting paths relative to `prefix`.
///
/// Every node is visited exactly once. Missing or unparseable `count`
/// attributes are skipped.
pub fn reconcile_counts(data: &DataNode, prefix: &FieldPath) -> Vec<Violation> {
    let mut violations = Vec::new();
    collect(data, prefix, &mut violations);
    violations
}

fn collect(data: &DataNode, prefix: &FieldPath, out: &mut Vec<Violation>) {
    let Some(fields) = data.as_fields() else {
        return;
    };

    for (key, instances) in fields.iter() {
        let path = prefix.child(key);

        if let Some(expected) = instances.first().and_then(declared_count) {
            let actual = instances.len();
            if actual as u64 != expected {
                out.push(Violation::count_mismatch(path.clone(), expected, actual));
            }
        }

        for instance in instances.iter().filter(|node| node.is_interior()) {
            collect(instance, &path, out);
        }
    }
}

fn declared_count(node: &DataNode) -> Option<u64> {
    let raw = node.attribute(COUNT_ATTRIBUTE)?;
    match raw.trim().parse::<u64>() {
        Ok(count) => Some(count),
        Err(e) => {
            trace!(value = raw, error = %e, "ignoring unparseable count attribute");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::violation::ViolationKind;

    fn item(count: Option<&str>) -> DataNode {
        let node = DataNode::scalar("x");
        match count {
            Some(count) => node.with_attribute("count", count),
            None => node,
        }
    }

    #[test]
    fn test_count_mismatch() {
        let record = DataNode::element([("item", vec![item(Some("3")), item(None)])]);

        let violations = reconcile_counts(&record, &FieldPath::root());

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path.to_string(), "item");
        assert_eq!(
            violations[0].kind,
            ViolationKind::CountMismatch {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn test_count_match_is_silent() {
        let record = DataNode::element([("item", vec![item(Some("2")), item(None)])]);
        assert!(reconcile_counts(&record, &FieldPath::root()).is_empty());
    }

    #[test]
    fn test_only_first_instance_declares_count() {
        let record = DataNode::element([("item", vec![item(None), item(Some("5"))])]);
        assert!(reconcile_counts(&record, &FieldPath::root()).is_empty());
    }

    #[test]
    fn test_unparseable_counts_are_skipped() {
        for raw in ["three", "-1", "", "2.5"] {
            let record = DataNode::element([("item", vec![item(Some(raw))])]);
            assert!(
                reconcile_counts(&record, &FieldPath::root()).is_empty(),
                "count={raw:?} should be ignored"
            );
        }
    }

    #[test]
    fn test_count_with_whitespace() {
        let record = DataNode::element([("item", vec![item(Some(" 1 "))])]);
        assert!(reconcile_counts(&record, &FieldPath::root()).is_empty());
    }

    #[test]
    fn test_zero_count_with_one_instance() {
        let record = DataNode::element([("item", vec![item(Some("0"))])]);
        let violations = reconcile_counts(&record, &FieldPath::root());
        assert_eq!(
            violations[0].kind,
            ViolationKind::CountMismatch {
                expected: 0,
                actual: 1
            }
        );
    }

    #[test]
    fn test_nested_counts_in_every_instance() {
        let line = |skus: usize, declared: &str| {
            let mut instances = vec![item(Some(declared))];
            instances.extend((1..skus).map(|_| item(None)));
            DataNode::element([("sku", instances)])
        };
        let record = DataNode::element([(
            "lines",
            vec![DataNode::element([(
                "line",
                vec![line(2, "2"), line(1, "4")],
            )])
            .with_attribute("count", "1")],
        )]);

        let violations = reconcile_counts(&record, &FieldPath::root());

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path.to_string(), "lines -> line -> sku");
        assert_eq!(
            violations[0].kind,
            ViolationKind::CountMismatch {
                expected: 4,
                actual: 1
            }
        );
    }

    #[test]
    fn test_parent_and_child_violations_in_traversal_order() {
        let record = DataNode::element([
            (
                "group",
                vec![
                    DataNode::element([("entry", vec![item(Some("2"))])])
                        .with_attribute("count", "3"),
                ],
            ),
            ("tail", vec![item(Some("2"))]),
        ]);

        let paths: Vec<String> = reconcile_counts(&record, &FieldPath::root())
            .iter()
            .map(|v| v.path.to_string())
            .collect();

        assert_eq!(paths, vec!["group", "group -> entry", "tail"]);
    }

    #[test]
    fn test_scalar_root_has_nothing_to_reconcile() {
        assert!(reconcile_counts(&DataNode::scalar("x"), &FieldPath::root()).is_empty());
    }

    #[test]
    fn test_idempotent() {
        let record = DataNode::element([
            ("a", vec![item(Some("2"))]),
            ("b", vec![item(Some("3")), item(None)]),
        ]);
        let first = reconcile_counts(&record, &FieldPath::root());
        let second = reconcile_counts(&record, &FieldPath::root());
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }
}
