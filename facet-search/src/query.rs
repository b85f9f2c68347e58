//! Compiled query document and its rendering into the backend's query DSL.

use std::fmt;

use serde_json::{json, Map, Value};

/// Predicate type of a facet clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClauseKind {
    Term,
    Range,
}

impl ClauseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClauseKind::Term => "term",
            ClauseKind::Range => "range",
        }
    }
}

/// One predicate over one field, e.g. `{"term": {"brand": "Acme"}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub kind: ClauseKind,
    pub field: String,
    pub value: Value,
}

impl Clause {
    pub fn new(kind: ClauseKind, field: impl Into<String>, value: Value) -> Self {
        Self {
            kind,
            field: field.into(),
            value,
        }
    }

    pub fn to_json(&self) -> Value {
        let mut predicate = Map::new();
        predicate.insert(self.field.clone(), self.value.clone());

        let mut clause = Map::new();
        clause.insert(self.kind.as_str().to_string(), Value::Object(predicate));
        Value::Object(clause)
    }
}

/// Disjunctive clauses of one kind, folded into a single bool group.
///
/// `minimum_should_match` always equals the number of members, so a group
/// only matches when every member does.
#[derive(Debug, Clone, PartialEq)]
pub struct ClauseGroup {
    pub kind: ClauseKind,
    pub clauses: Vec<Clause>,
}

impl ClauseGroup {
    pub fn minimum_should_match(&self) -> usize {
        self.clauses.len()
    }

    pub fn to_json(&self) -> Value {
        json!({
            "bool": {
                "should": self.clauses.iter().map(Clause::to_json).collect::<Vec<_>>(),
                "minimum_should_match": self.minimum_should_match(),
            }
        })
    }
}

/// A field name with its relevance boost, rendered as `name^weight`.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedField {
    pub name: String,
    pub weight: f64,
}

impl WeightedField {
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight,
        }
    }
}

impl fmt::Display for WeightedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}^{}", self.name, self.weight)
    }
}

/// The scored `query_string` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct FullTextClause {
    pub fields: Vec<String>,
    pub query: String,
    pub fuzziness: Option<Value>,
}

impl FullTextClause {
    pub fn to_json(&self) -> Value {
        let mut query_string = Map::new();
        query_string.insert("fields".into(), json!(self.fields));
        query_string.insert("query".into(), Value::String(self.query.clone()));
        if let Some(fuzziness) = &self.fuzziness {
            query_string.insert("fuzziness".into(), fuzziness.clone());
        }
        json!({ "query_string": query_string })
    }
}

/// A terms aggregation feeding one facet widget.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationSpec {
    pub name: String,
    pub field: String,
}

impl AggregationSpec {
    pub fn terms(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
        }
    }
}

/// Output of the query compiler. Rendered with [`CompiledQuery::to_document`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledQuery {
    pub full_text: Option<FullTextClause>,
    pub must: Vec<Clause>,
    pub filter_or_groups: Vec<ClauseGroup>,
    pub scored_fields: Vec<WeightedField>,
    pub aggregations: Vec<AggregationSpec>,
    pub highlight: bool,
    /// Top level fragments contributed by the `post_facet_filter` hook,
    /// merged over the rendered document.
    pub extensions: Map<String, Value>,
}

impl CompiledQuery {
    /// True when there is something to match documents against.
    pub fn has_primary_clause(&self) -> bool {
        self.full_text.is_some()
            || !self.must.is_empty()
            || !self.filter_or_groups.is_empty()
            || self.extensions.contains_key("query")
    }

    /// True when the query is not worth sending.
    ///
    /// The tenant and taxonomy aggregations are attached to every query, so
    /// only aggregations contributed through extensions count here.
    pub fn is_empty(&self) -> bool {
        !self.has_primary_clause() && !self.extensions.contains_key("aggs")
    }

    /// Aggregation names the decoder should look for, without duplicates.
    pub fn aggregation_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.aggregations.iter().map(|a| a.name.clone()).collect();

        if let Some(Value::Object(extra)) = self.extensions.get("aggs") {
            for name in extra.keys() {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }

        names
    }

    fn query_json(&self) -> Option<Value> {
        let must: Vec<Value> = self
            .full_text
            .iter()
            .map(FullTextClause::to_json)
            .chain(self.must.iter().map(Clause::to_json))
            .collect();
        let filter: Vec<Value> = self
            .filter_or_groups
            .iter()
            .map(ClauseGroup::to_json)
            .collect();

        if must.is_empty() && filter.is_empty() {
            return None;
        }

        let mut bool_query = Map::new();
        if !must.is_empty() {
            bool_query.insert("must".into(), Value::Array(must));
        }
        if !filter.is_empty() {
            bool_query.insert("filter".into(), Value::Array(filter));
        }
        Some(json!({ "bool": bool_query }))
    }

    /// Renders the `query`, `aggs` and `highlight` sections, then merges the
    /// extensions over them.
    pub fn to_document(&self) -> Map<String, Value> {
        let mut document = Map::new();

        if let Some(query) = self.query_json() {
            document.insert("query".into(), query);
        }

        if !self.aggregations.is_empty() {
            let aggs: Map<String, Value> = self
                .aggregations
                .iter()
                .map(|a| (a.name.clone(), json!({ "terms": { "field": a.field } })))
                .collect();
            document.insert("aggs".into(), Value::Object(aggs));
        }

        if self.highlight {
            document.insert(
                "highlight".into(),
                json!({ "fields": { "*": { "type": "plain" } } }),
            );
        }

        merge_fragment(&mut document, self.extensions.clone());
        document
    }
}

/// Merges `fragment` into `base`: objects merge key by key, arrays are
/// concatenated, anything else is replaced.
pub fn merge_fragment(base: &mut Map<String, Value>, fragment: Map<String, Value>) {
    for (key, incoming) in fragment {
        match base.get_mut(&key) {
            Some(existing) => merge_value(existing, incoming),
            None => {
                base.insert(key, incoming);
            }
        }
    }
}

fn merge_value(existing: &mut Value, incoming: Value) {
    match (existing, incoming) {
        (Value::Object(base), Value::Object(fragment)) => merge_fragment(base, fragment),
        (Value::Array(base), Value::Array(fragment)) => base.extend(fragment),
        (slot, incoming) => *slot = incoming,
    }
}
