//! Read-only queries over a [`Snapshot`].
//!
//! Everything here is a pure function of the snapshot; callers hold an
//! `Arc<Snapshot>` and are unaffected by concurrent reloads.

use crate::error::{Result, SailError};
use crate::object::{ObjectKind, ObjectRecord, ObjectSummary};
use crate::store::Snapshot;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};

/// Which field of an object matched a search query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchField {
    Name,
    Description,
    Source,
}

/// One search result.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub summary: ObjectSummary,
    pub matched: MatchField,
}

/// One node reached by [`find_references`].
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceHit {
    pub id: String,
    /// Hops from the starting object; direct references are 1.
    pub distance: u32,
    /// Present when the referenced id exists in the snapshot.
    pub resolved: Option<ObjectSummary>,
}

/// Summaries of objects matching the filters, ordered by name.
pub fn list_objects(
    snapshot: &Snapshot,
    kind_filter: Option<ObjectKind>,
    name_pattern: Option<&str>,
) -> Vec<ObjectSummary> {
    let pattern = name_pattern.map(str::to_lowercase);
    let mut summaries: Vec<ObjectSummary> = snapshot
        .objects
        .values()
        .filter(|o| kind_filter.is_none_or(|k| o.kind == k))
        .filter(|o| {
            pattern
                .as_deref()
                .is_none_or(|p| o.name.to_lowercase().contains(p))
        })
        .map(ObjectRecord::summary)
        .collect();
    summaries.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    summaries
}

/// The full record for one object.
pub fn get_source<'a>(snapshot: &'a Snapshot, id: &str) -> Result<&'a ObjectRecord> {
    snapshot
        .objects
        .get(id)
        .ok_or_else(|| SailError::ObjectNotFound { id: id.to_string() })
}

/// Case-insensitive substring search over name, description, and source.
///
/// Each object appears at most once, attributed to its best-ranked matching
/// field. Name matches rank above description matches, which rank above
/// source matches; within a rank, results are ordered by name.
pub fn search(snapshot: &Snapshot, query_text: &str) -> Vec<SearchHit> {
    let needle = query_text.to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut hits: Vec<SearchHit> = snapshot
        .objects
        .values()
        .filter_map(|o| {
            let matched = if o.name.to_lowercase().contains(&needle) {
                MatchField::Name
            } else if o
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
            {
                MatchField::Description
            } else if o
                .source_text
                .as_deref()
                .is_some_and(|s| s.to_lowercase().contains(&needle))
            {
                MatchField::Source
            } else {
                return None;
            };
            Some(SearchHit {
                summary: o.summary(),
                matched,
            })
        })
        .collect();

    hits.sort_by(|a, b| {
        a.matched
            .cmp(&b.matched)
            .then_with(|| a.summary.name.cmp(&b.summary.name))
            .then_with(|| a.summary.id.cmp(&b.summary.id))
    });
    hits
}

/// Objects whose source invokes the given component.
///
/// Accepts `a!name`, `rule!name`, bare, and `SYSTEM_SYSRULES_` spellings;
/// unknown components yield an empty list rather than an error.
pub fn find_users_of_component(snapshot: &Snapshot, component: &str) -> Vec<ObjectSummary> {
    let mut summaries: Vec<ObjectSummary> = snapshot
        .index
        .users_of(component)
        .into_iter()
        .flatten()
        .filter_map(|id| snapshot.objects.get(id.as_str()))
        .map(ObjectRecord::summary)
        .collect();
    summaries.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    summaries
}

/// Breadth-first walk of the reference graph starting at `id`.
///
/// `depth` bounds the number of hops; `None` walks until the frontier is
/// exhausted. The starting object itself is not reported. Targets missing
/// from the snapshot appear with `resolved: None` and are not expanded.
pub fn find_references(
    snapshot: &Snapshot,
    id: &str,
    depth: Option<u32>,
) -> Result<Vec<ReferenceHit>> {
    // Fail on an unknown starting point rather than return an empty walk.
    get_source(snapshot, id)?;

    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(id);
    let mut queue: VecDeque<(&str, u32)> = VecDeque::new();
    queue.push_back((id, 0));

    let mut hits = Vec::new();
    while let Some((current, distance)) = queue.pop_front() {
        if depth.is_some_and(|limit| distance >= limit) {
            continue;
        }
        for target in snapshot.index.references_from(current).into_iter().flatten() {
            if !visited.insert(target) {
                continue;
            }
            let resolved = snapshot.objects.get(target.as_str());
            hits.push(ReferenceHit {
                id: target.clone(),
                distance: distance + 1,
                resolved: resolved.map(ObjectRecord::summary),
            });
            if resolved.is_some() {
                queue.push_back((target, distance + 1));
            }
        }
    }
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::build_index;

    fn object(
        id: &str,
        kind: ObjectKind,
        name: &str,
        description: Option<&str>,
        source: Option<&str>,
    ) -> ObjectRecord {
        ObjectRecord {
            id: id.into(),
            kind,
            name: name.into(),
            description: description.map(Into::into),
            source_text: source.map(Into::into),
            entry: None,
        }
    }

    fn fixture() -> Snapshot {
        let objects = vec![
            object(
                "uuid-dashboard",
                ObjectKind::Interface,
                "ACME_Dashboard",
                Some("Landing page grid"),
                Some(r#"a!gridField(data: rule!ACME_listRows(), label: "Rows")"#),
            ),
            object(
                "uuid-list-rows",
                ObjectKind::ExpressionRule,
                "ACME_listRows",
                None,
                Some(r#"#"uuid-constant-env"(  )"#),
            ),
            object(
                "uuid-constant-env",
                ObjectKind::Constant,
                "ACME_ENV",
                Some("Environment name"),
                None,
            ),
            object(
                "uuid-detail",
                ObjectKind::Interface,
                "ACME_Detail",
                None,
                Some(r#"a!textField(value: "the grid lives elsewhere")"#),
            ),
        ];
        let index = build_index(&objects);
        Snapshot::new("acme", objects, index, Vec::new())
    }

    #[test]
    fn test_list_objects_filters_and_order() {
        let snap = fixture();
        let all = list_objects(&snap, None, None);
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].name, "ACME_Dashboard");

        let interfaces = list_objects(&snap, Some(ObjectKind::Interface), None);
        assert_eq!(interfaces.len(), 2);

        let by_name = list_objects(&snap, None, Some("listrows"));
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, "uuid-list-rows");
    }

    #[test]
    fn test_get_source_not_found() {
        let snap = fixture();
        assert!(get_source(&snap, "uuid-dashboard").is_ok());
        let err = get_source(&snap, "nope").unwrap_err();
        assert!(matches!(err, SailError::ObjectNotFound { .. }));
    }

    #[test]
    fn test_search_ranks_name_over_description_over_source() {
        let snap = fixture();
        let hits = search(&snap, "grid");
        // "grid" is in uuid-dashboard's description and source, and in
        // uuid-detail's source only. No name contains it.
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].summary.id, "uuid-dashboard");
        assert_eq!(hits[0].matched, MatchField::Description);
        assert_eq!(hits[1].summary.id, "uuid-detail");
        assert_eq!(hits[1].matched, MatchField::Source);

        let by_name = search(&snap, "dashboard");
        assert_eq!(by_name[0].matched, MatchField::Name);
    }

    #[test]
    fn test_search_empty_query() {
        let snap = fixture();
        assert!(search(&snap, "").is_empty());
    }

    #[test]
    fn test_find_users_accepts_all_spellings() {
        let snap = fixture();
        for spelling in ["gridField", "a!gridField", "SYSTEM_SYSRULES_gridField"] {
            let users = find_users_of_component(&snap, spelling);
            assert_eq!(users.len(), 1, "spelling {spelling:?}");
            assert_eq!(users[0].id, "uuid-dashboard");
        }
        // "grid" appears in uuid-detail only inside a string literal.
        assert!(find_users_of_component(&snap, "nothing").is_empty());
    }

    #[test]
    fn test_find_references_depth_and_resolution() {
        let snap = fixture();
        let direct = find_references(&snap, "uuid-list-rows", Some(1)).unwrap();
        assert_eq!(direct.len(), 1);
        assert_eq!(direct[0].id, "uuid-constant-env");
        assert_eq!(direct[0].distance, 1);
        assert!(direct[0].resolved.is_some());

        let none = find_references(&snap, "uuid-constant-env", None).unwrap();
        assert!(none.is_empty());

        let err = find_references(&snap, "missing", None).unwrap_err();
        assert!(matches!(err, SailError::ObjectNotFound { .. }));
    }

    #[test]
    fn test_find_references_cycle_terminates() {
        let objects = vec![
            object(
                "uuid-a",
                ObjectKind::ExpressionRule,
                "A",
                None,
                Some(r#"#"uuid-b"()"#),
            ),
            object(
                "uuid-b",
                ObjectKind::ExpressionRule,
                "B",
                None,
                Some(r#"#"uuid-a"() + #"uuid-gone"()"#),
            ),
        ];
        let index = build_index(&objects);
        let snap = Snapshot::new("cycle", objects, index, Vec::new());

        let hits = find_references(&snap, "uuid-a", None).unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["uuid-b", "uuid-gone"]);
        assert!(hits[1].resolved.is_none());
        assert_eq!(hits[1].distance, 2);

        // Bounded walk is a prefix of the unbounded one.
        let bounded = find_references(&snap, "uuid-a", Some(1)).unwrap();
        assert_eq!(bounded.len(), 1);
        assert_eq!(bounded[0].id, "uuid-b");
    }
}
