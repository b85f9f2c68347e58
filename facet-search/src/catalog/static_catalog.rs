//! Catalog read from settings.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;
use serde_json::{Number, Value};

use crate::traits::CatalogProvider;
use crate::types::{FieldKind, NumericRange};

/// A labelled entry of a numeric field's range table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NamedRange {
    pub label: String,
    #[serde(default)]
    pub from: Option<Number>,
    #[serde(default)]
    pub to: Option<Number>,
}

/// In-memory [`CatalogProvider`], deserialized from the `catalog` section of
/// the settings or assembled with the builder methods.
///
/// ```yaml
/// catalog:
///   fields: [post_title, post_content, price]
///   taxonomies: [category]
///   scores:
///     field: { post_title: 3 }
///   numeric: [price]
///   ranges:
///     price:
///       - { label: cheap, to: 10 }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticCatalog {
    enabled: bool,
    fields: Vec<String>,
    meta_fields: Vec<String>,
    taxonomies: Vec<String>,
    custom_facets: Vec<String>,
    scores: BTreeMap<FieldKind, BTreeMap<String, f64>>,
    numeric: BTreeSet<String>,
    not_analyzed: BTreeSet<String>,
    fuzzy: Option<Value>,
    ranges: BTreeMap<String, Vec<NamedRange>>,
    post_type_relevance: Vec<u32>,
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self {
            enabled: true,
            fields: Vec::new(),
            meta_fields: Vec::new(),
            taxonomies: Vec::new(),
            custom_facets: Vec::new(),
            scores: BTreeMap::new(),
            numeric: BTreeSet::new(),
            not_analyzed: BTreeSet::new(),
            fuzzy: None,
            ranges: BTreeMap::new(),
            post_type_relevance: Vec::new(),
        }
    }
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fields(mut self, fields: &[&str]) -> Self {
        self.fields = owned(fields);
        self
    }

    pub fn with_meta_fields(mut self, fields: &[&str]) -> Self {
        self.meta_fields = owned(fields);
        self
    }

    pub fn with_taxonomies(mut self, taxonomies: &[&str]) -> Self {
        self.taxonomies = owned(taxonomies);
        self
    }

    pub fn with_custom_facets(mut self, facets: &[&str]) -> Self {
        self.custom_facets = owned(facets);
        self
    }

    pub fn with_score(mut self, kind: FieldKind, name: &str, score: f64) -> Self {
        self.scores
            .entry(kind)
            .or_default()
            .insert(name.to_string(), score);
        self
    }

    /// Marks `field` numeric and sets its range table.
    pub fn with_ranges(mut self, field: &str, ranges: Vec<NamedRange>) -> Self {
        self.numeric.insert(field.to_string());
        self.ranges.insert(field.to_string(), ranges);
        self
    }

    pub fn with_not_analyzed(mut self, field: &str) -> Self {
        self.not_analyzed.insert(field.to_string());
        self
    }

    pub fn with_fuzziness(mut self, fuzziness: Value) -> Self {
        self.fuzzy = Some(fuzziness);
        self
    }

    pub fn with_post_type_relevance(mut self, levels: Vec<u32>) -> Self {
        self.post_type_relevance = levels;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

impl NamedRange {
    pub fn new(label: &str, from: Option<Number>, to: Option<Number>) -> Self {
        Self {
            label: label.to_string(),
            from,
            to,
        }
    }
}

impl CatalogProvider for StaticCatalog {
    fn fields(&self) -> &[String] {
        &self.fields
    }

    fn meta_fields(&self) -> &[String] {
        &self.meta_fields
    }

    fn taxonomies(&self) -> &[String] {
        &self.taxonomies
    }

    fn custom_facets(&self) -> &[String] {
        &self.custom_facets
    }

    fn score(&self, kind: FieldKind, name: &str) -> f64 {
        self.scores
            .get(&kind)
            .and_then(|scores| scores.get(name))
            .copied()
            .unwrap_or(0.0)
    }

    fn is_numeric(&self, field: &str) -> bool {
        self.numeric.contains(field)
    }

    fn is_not_analyzed(&self, field: &str) -> bool {
        self.not_analyzed.contains(field)
    }

    fn fuzziness(&self) -> Option<Value> {
        self.fuzzy.clone()
    }

    fn ranges(&self, field: &str) -> Vec<(String, NumericRange)> {
        self.ranges
            .get(field)
            .map(|ranges| {
                ranges
                    .iter()
                    .map(|r| (r.label.clone(), NumericRange::new(r.from.clone(), r.to.clone())))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn post_type_relevance(&self) -> Vec<u32> {
        self.post_type_relevance.clone()
    }
}
