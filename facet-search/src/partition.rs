//! Splits facet selections into conjunctive clauses and disjunctive groups.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::query::{Clause, ClauseGroup, ClauseKind};
use crate::types::{FacetSelections, Selection};

/// Selected label to the predicate it stands for, e.g. `"0-10"` to
/// `{"gte": 0, "lt": 10}`.
pub type Translation = BTreeMap<String, Value>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    pub must: Vec<Clause>,
    pub or_groups: Vec<Clause>,
}

impl Partition {
    pub fn extend(&mut self, other: Partition) {
        self.must.extend(other.must);
        self.or_groups.extend(other.or_groups);
    }
}

/// Turns the selection for facet `name` into clauses of the given kind.
///
/// `AnyOf` selections go to `or_groups`, everything else to `must`. Values
/// missing from `translation` are used verbatim.
pub fn partition(
    name: &str,
    selections: &FacetSelections,
    kind: ClauseKind,
    translation: Option<&Translation>,
) -> Partition {
    let mut out = Partition::default();

    let Some(selection) = selections.get(name) else {
        return out;
    };

    let clause = |value: &String| {
        let value = translation
            .and_then(|t| t.get(value))
            .cloned()
            .unwrap_or_else(|| Value::String(value.clone()));
        Clause::new(kind, name, value)
    };

    match selection {
        Selection::Exact(value) => out.must.push(clause(value)),
        Selection::AllOf(values) => out.must.extend(values.iter().map(clause)),
        Selection::AnyOf(values) => out.or_groups.extend(values.iter().map(clause)),
    }

    out
}

/// Folds disjunctive clauses into one group per clause kind, keeping the
/// order in which kinds first appear.
pub fn fold_or_groups(clauses: Vec<Clause>) -> Vec<ClauseGroup> {
    let mut groups: Vec<ClauseGroup> = Vec::new();

    for clause in clauses {
        match groups.iter_mut().find(|g| g.kind == clause.kind) {
            Some(group) => group.clauses.push(clause),
            None => groups.push(ClauseGroup {
                kind: clause.kind,
                clauses: vec![clause],
            }),
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn selections() -> FacetSelections {
        FacetSelections::new()
            .with("color", Selection::AnyOf(vec!["red".into(), "blue".into()]))
            .with("size", Selection::Exact("L".into()))
            .with("tag", Selection::AllOf(vec!["sale".into(), "new".into()]))
            .with("price", Selection::AnyOf(vec!["cheap".into(), "custom".into()]))
    }

    #[test]
    fn missing_facet_is_a_no_op() {
        let out = partition("brand", &selections(), ClauseKind::Term, None);
        assert_eq!(out, Partition::default());
    }

    #[test]
    fn exact_selection_is_one_must_clause() {
        let out = partition("size", &selections(), ClauseKind::Term, None);
        assert_eq!(out.must, vec![Clause::new(ClauseKind::Term, "size", json!("L"))]);
        assert!(out.or_groups.is_empty());
    }

    #[test]
    fn list_selection_is_one_must_clause_per_value() {
        let out = partition("tag", &selections(), ClauseKind::Term, None);
        assert_eq!(out.must.len(), 2);
        assert_eq!(out.must[1].value, json!("new"));
    }

    #[test]
    fn any_of_selection_goes_to_or_groups() {
        let out = partition("color", &selections(), ClauseKind::Term, None);
        assert!(out.must.is_empty());

        let groups = fold_or_groups(out.or_groups);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].clauses.len(), 2);
        assert_eq!(groups[0].minimum_should_match(), 2);
        assert_eq!(groups[0].clauses[0].value, json!("red"));
        assert_eq!(groups[0].clauses[1].value, json!("blue"));
    }

    #[test]
    fn translation_maps_known_labels_only() {
        let translation: Translation =
            [("cheap".to_string(), json!({ "lt": 10 }))].into_iter().collect();

        let out = partition("price", &selections(), ClauseKind::Range, Some(&translation));
        assert_eq!(out.or_groups[0].value, json!({ "lt": 10 }));
        assert_eq!(out.or_groups[1].value, json!("custom"));
    }

    #[test]
    fn fold_groups_by_kind_in_first_seen_order() {
        let clauses = vec![
            Clause::new(ClauseKind::Range, "price", json!({ "lt": 10 })),
            Clause::new(ClauseKind::Term, "color", json!("red")),
            Clause::new(ClauseKind::Range, "weight", json!({ "gte": 1 })),
        ];

        let groups = fold_or_groups(clauses);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].kind, ClauseKind::Range);
        assert_eq!(groups[0].minimum_should_match(), 2);
        assert_eq!(groups[1].kind, ClauseKind::Term);
        assert_eq!(groups[1].minimum_should_match(), 1);
    }
}
