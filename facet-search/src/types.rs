//! Core types for the search domain.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use strum::Display;

use crate::ids::{DocumentId, TenantId};
use crate::traits::BackendError;

/// Default number of results per page when a request doesn't say otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Which part of the catalog a field comes from. Scores are looked up per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[strum(serialize = "tax")]
    #[serde(rename = "tax")]
    Taxonomy,
    #[strum(serialize = "field")]
    Field,
    #[strum(serialize = "meta")]
    Meta,
    #[strum(serialize = "custom")]
    Custom,
}

/// A selected value (or values) for one facet.
///
/// Deserializes from the query-string shapes hosts send around:
/// `"red"` is [`Selection::Exact`], `["red", "blue"]` is [`Selection::AllOf`]
/// and `{"or": ["red", "blue"]}` is [`Selection::AnyOf`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "SelectionRepr")]
pub enum Selection {
    /// Must match this value.
    Exact(String),
    /// Must match every value.
    AllOf(Vec<String>),
    /// Disjunctive selection, compiled into a filter group.
    AnyOf(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SelectionRepr {
    Exact(String),
    AllOf(Vec<String>),
    AnyOf { or: OneOrMany },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<SelectionRepr> for Selection {
    fn from(repr: SelectionRepr) -> Self {
        match repr {
            SelectionRepr::Exact(value) => Selection::Exact(value),
            SelectionRepr::AllOf(values) => Selection::AllOf(values),
            SelectionRepr::AnyOf { or: OneOrMany::One(value) } => Selection::AnyOf(vec![value]),
            SelectionRepr::AnyOf {
                or: OneOrMany::Many(values),
            } => Selection::AnyOf(values),
        }
    }
}

/// Facet name to selection. Keyed by taxonomy, field or custom facet name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct FacetSelections(BTreeMap<String, Selection>);

impl FacetSelections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, facet: impl Into<String>, selection: Selection) -> Self {
        self.0.insert(facet.into(), selection);
        self
    }

    pub fn get(&self, facet: &str) -> Option<&Selection> {
        self.0.get(facet)
    }
}

/// A named numeric range a facet value can select, e.g. `"0-10"`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct NumericRange {
    #[serde(default)]
    pub from: Option<Number>,
    #[serde(default)]
    pub to: Option<Number>,
}

impl NumericRange {
    pub fn new(from: Option<Number>, to: Option<Number>) -> Self {
        Self { from, to }
    }

    /// Range predicate body: inclusive lower bound, exclusive upper bound.
    /// Absent bounds are left out.
    pub fn to_predicate(&self) -> Value {
        let mut predicate = Map::new();
        if let Some(from) = &self.from {
            predicate.insert("gte".into(), Value::Number(from.clone()));
        }
        if let Some(to) = &self.to {
            predicate.insert("lt".into(), Value::Number(to.clone()));
        }
        Value::Object(predicate)
    }
}

/// A single search invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub text: String,
    pub page_index: u32,
    pub page_size: u32,
    pub facet_selections: FacetSelections,
    pub sort_by_date: bool,
    /// Tenant the request was made from. Used for hits that don't carry one.
    pub current_tenant: Option<TenantId>,
}

impl SearchRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
            facet_selections: FacetSelections::default(),
            sort_by_date: false,
            current_tenant: None,
        }
    }

    pub fn page(mut self, page_index: u32, page_size: u32) -> Self {
        self.page_index = page_index;
        self.page_size = page_size;
        self
    }

    pub fn facets(mut self, facet_selections: FacetSelections) -> Self {
        self.facet_selections = facet_selections;
        self
    }

    pub fn sort_by_date(mut self, sort_by_date: bool) -> Self {
        self.sort_by_date = sort_by_date;
        self
    }

    pub fn tenant(mut self, tenant: TenantId) -> Self {
        self.current_tenant = Some(tenant);
        self
    }
}

/// Backend response reduced to what decoding needs.
///
/// `total_hits` and `hits` are optional so that a response missing them can be
/// reported as malformed instead of being mistaken for zero matches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResponse {
    pub total_hits: Option<u64>,
    pub hits: Option<Vec<RawHit>>,
    pub aggregations: BTreeMap<String, Vec<RawBucket>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawHit {
    pub id: DocumentId,
    pub tenant_id: Option<TenantId>,
    /// Field to fragments, in backend order.
    pub highlights: Vec<(String, Vec<String>)>,
}

impl RawHit {
    pub fn new(id: impl Into<DocumentId>, tenant_id: Option<TenantId>) -> Self {
        Self {
            id: id.into(),
            tenant_id,
            highlights: Vec::new(),
        }
    }

    pub fn with_highlight(mut self, field: impl Into<String>, fragments: Vec<String>) -> Self {
        self.highlights.push((field.into(), fragments));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawBucket {
    pub key: String,
    pub doc_count: u64,
}

/// Facet option count shown next to a facet value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Highlight {
    pub field: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedHit {
    pub id: DocumentId,
    /// Position in the overall ranking, starting at 0.
    pub rank: usize,
    pub highlights: Vec<Highlight>,
}

impl RankedHit {
    pub fn highlight(&self, field: &str) -> Option<&str> {
        self.highlights
            .iter()
            .find(|h| h.field == field)
            .map(|h| h.text.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantGroup {
    pub tenant_id: TenantId,
    pub hits: Vec<RankedHit>,
}

/// Decoded search results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultSet {
    pub total: u64,
    /// Ids in rank order.
    pub ids: Vec<DocumentId>,
    /// Hits grouped by tenant, groups ordered by their best ranked hit.
    pub grouped_ids: Vec<TenantGroup>,
    pub aggregations: BTreeMap<String, Vec<Bucket>>,
}

impl ResultSet {
    pub fn group(&self, tenant_id: &TenantId) -> Option<&[RankedHit]> {
        self.grouped_ids
            .iter()
            .find(|g| &g.tenant_id == tenant_id)
            .map(|g| g.hits.as_slice())
    }

    pub(crate) fn push_hit(&mut self, tenant_id: TenantId, hit: RankedHit) {
        self.ids.push(hit.id.clone());

        match self
            .grouped_ids
            .iter_mut()
            .find(|g| g.tenant_id == tenant_id)
        {
            Some(group) => group.hits.push(hit),
            None => self.grouped_ids.push(TenantGroup {
                tenant_id,
                hits: vec![hit],
            }),
        }
    }
}

/// Outcome of a search call.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Found(ResultSet),
    /// Nothing to search for; the backend was not called.
    Empty,
    /// The backend failed. Not the same as zero matches.
    Unavailable(BackendError),
    /// Search is switched off in the catalog.
    Disabled,
}

impl SearchOutcome {
    /// Results to render. `Empty` yields an empty set, `Unavailable` and
    /// `Disabled` yield `None`.
    pub fn into_results(self) -> Option<ResultSet> {
        match self {
            SearchOutcome::Found(results) => Some(results),
            SearchOutcome::Empty => Some(ResultSet::default()),
            SearchOutcome::Unavailable(_) | SearchOutcome::Disabled => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, SearchOutcome::Unavailable(_))
    }
}
