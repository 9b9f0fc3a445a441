//! Derived indices over object source text.
//!
//! Rebuilt wholesale on every load; never incrementally patched.

mod scanner;

pub(crate) use scanner::canonical_component;

use crate::object::ObjectRecord;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Component usage index and reference graph for one snapshot.
#[derive(Debug, Default)]
pub struct SourceIndex {
    /// Canonical component name → ids of objects invoking it.
    pub component_index: HashMap<String, BTreeSet<String>>,
    /// Object id → ids it statically references. Directed, may be cyclic,
    /// targets may be absent from the snapshot.
    pub reference_graph: HashMap<String, BTreeSet<String>>,
}

impl SourceIndex {
    /// Objects invoking `component` (any accepted spelling).
    pub fn users_of(&self, component: &str) -> Option<&BTreeSet<String>> {
        self.component_index.get(&canonical_component(component))
    }

    /// Direct reference targets of `id`.
    pub fn references_from(&self, id: &str) -> Option<&BTreeSet<String>> {
        self.reference_graph.get(id)
    }
}

/// Scan every object with source text and build the derived indices.
pub fn build_index(objects: &[ObjectRecord]) -> SourceIndex {
    let mut index = SourceIndex::default();

    for object in objects {
        let Some(source) = object.source_text.as_deref() else {
            continue;
        };
        let scan = scanner::scan_source(source);

        for component in scan.components {
            index
                .component_index
                .entry(component)
                .or_default()
                .insert(object.id.clone());
        }
        if !scan.references.is_empty() {
            index
                .reference_graph
                .entry(object.id.clone())
                .or_default()
                .extend(scan.references);
        }
    }

    debug!(
        "Indexed {} components and {} referencing objects across {} objects",
        index.component_index.len(),
        index.reference_graph.len(),
        objects.len()
    );
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectKind;

    fn object(id: &str, source: Option<&str>) -> ObjectRecord {
        ObjectRecord {
            id: id.into(),
            kind: ObjectKind::Interface,
            name: id.into(),
            description: None,
            source_text: source.map(String::from),
            entry: None,
        }
    }

    #[test]
    fn test_component_membership_not_count() {
        let objects = vec![object("A", Some("a!gridField(x) a!gridField(y)"))];
        let index = build_index(&objects);

        let users = index.users_of("gridField").unwrap();
        assert_eq!(users.iter().collect::<Vec<_>>(), vec!["A"]);
    }

    #[test]
    fn test_lookup_accepts_all_spellings() {
        let objects = vec![object("A", Some("a!gridField(x)"))];
        let index = build_index(&objects);

        for spelling in [
            "gridField",
            "a!gridField",
            "SYSTEM_SYSRULES_gridField",
            "SYSTEM_SYSRULES_gridField_v2",
            "GRIDFIELD",
        ] {
            assert!(index.users_of(spelling).is_some(), "spelling {}", spelling);
        }
    }

    #[test]
    fn test_reference_edges() {
        let objects = vec![
            object("A", Some(r#"#"X1"(ri!x)"#)),
            object("X1", Some("a!textField()")),
        ];
        let index = build_index(&objects);

        assert_eq!(
            index.references_from("A").unwrap().iter().collect::<Vec<_>>(),
            vec!["X1"]
        );
        assert!(index.references_from("X1").is_none());
    }

    #[test]
    fn test_objects_without_source_are_skipped() {
        let objects = vec![object("R", None)];
        let index = build_index(&objects);
        assert!(index.component_index.is_empty());
        assert!(index.reference_graph.is_empty());
    }
}
