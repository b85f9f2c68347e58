//! Query compiler.
//!
//! Compiles free text, facet selections and the field catalog into a
//! [`CompiledQuery`]. Compilation is pure: the same inputs always produce the
//! same document.

use crate::config::TenantSettings;
use crate::hooks::SearchHooks;
use crate::partition::{fold_or_groups, partition, Partition, Translation};
use crate::query::{
    merge_fragment, AggregationSpec, ClauseKind, CompiledQuery, FullTextClause, WeightedField,
};
use crate::traits::CatalogProvider;
use crate::types::{FacetSelections, FieldKind};

/// Marks a fuzzy term in the query string, e.g. `shoe~`.
pub const FUZZY_MARKER: char = '~';

/// Analyzer suffix used for scored fields unless the `string_language` hook
/// says otherwise.
pub const DEFAULT_LANGUAGE: &str = "english";

/// Fields never scored or filtered on unless the `exclude_fields` hook
/// says otherwise.
pub const DEFAULT_EXCLUDED_FIELDS: &[&str] = &["post_date"];

pub const POST_TYPE_FIELD: &str = "post_type";

/// Compiles search input against a catalog.
pub struct QueryCompiler<'a, C>
where
    C: CatalogProvider + ?Sized,
{
    catalog: &'a C,
    hooks: &'a SearchHooks,
    tenant: &'a TenantSettings,
}

impl<'a, C> QueryCompiler<'a, C>
where
    C: CatalogProvider + ?Sized,
{
    pub fn new(catalog: &'a C, hooks: &'a SearchHooks, tenant: &'a TenantSettings) -> Self {
        Self {
            catalog,
            hooks,
            tenant,
        }
    }

    /// Compiles `text` and `selections` into a query.
    ///
    /// Empty text yields no full-text clause and no highlighting; empty text
    /// and no selections yield a query for which [`CompiledQuery::is_empty`]
    /// holds.
    pub fn compile(&self, text: &str, selections: &FacetSelections) -> CompiledQuery {
        let search = normalize_operators(text);
        let has_text = !search.is_empty();

        let mut collected = Partition::default();
        let mut scored = Vec::new();

        for taxonomy in self.catalog.taxonomies() {
            if has_text {
                let score = match self.catalog.score(FieldKind::Taxonomy, taxonomy) {
                    score if score == 0.0 => 1.0,
                    score => score,
                };

                if score > 0.0 {
                    scored.push(WeightedField::new(format!("{}_name", taxonomy), score));
                }
            }

            collected.extend(partition(taxonomy, selections, ClauseKind::Term, None));
        }

        let excluded = self.hooks.exclude_fields(
            DEFAULT_EXCLUDED_FIELDS
                .iter()
                .map(|f| f.to_string())
                .collect(),
        );
        let language = self.hooks.string_language(DEFAULT_LANGUAGE.to_string());

        let passes = [
            (FieldKind::Field, self.catalog.fields()),
            (FieldKind::Meta, self.catalog.meta_fields()),
            (FieldKind::Custom, self.catalog.custom_facets()),
        ];

        for (kind, fields) in passes {
            for field in fields.iter().filter(|f| !excluded.contains(*f)) {
                if has_text {
                    scored.extend(self.score_field(kind, field, &search, &language));
                }

                collected.extend(self.filter_field(kind, field, selections));
            }
        }

        let full_text = (has_text && !scored.is_empty()).then(|| {
            let clause = FullTextClause {
                fields: scored.iter().map(ToString::to_string).collect(),
                query: self.with_post_type_relevance(search),
                fuzziness: self
                    .catalog
                    .fuzziness()
                    .filter(|_| text.contains(FUZZY_MARKER)),
            };
            self.hooks.query_string(clause)
        });

        if self.catalog.fields().iter().any(|f| f == POST_TYPE_FIELD) {
            collected.extend(partition(
                POST_TYPE_FIELD,
                selections,
                ClauseKind::Term,
                None,
            ));
        }

        let mut compiled = CompiledQuery {
            full_text,
            must: collected.must,
            filter_or_groups: fold_or_groups(collected.or_groups),
            scored_fields: scored,
            aggregations: self.aggregations(),
            highlight: !text.is_empty(),
            extensions: Default::default(),
        };

        let fragment = self.hooks.post_facet_filter(&compiled);
        merge_fragment(&mut compiled.extensions, fragment);

        tracing::debug!(
            must = compiled.must.len(),
            or_groups = compiled.filter_or_groups.len(),
            scored = compiled.scored_fields.len(),
            "compiled query"
        );

        compiled
    }

    /// Scored name for a field: the raw name for fuzzy queries and
    /// not-analyzed fields, the language sub-field otherwise.
    fn score_field(
        &self,
        kind: FieldKind,
        field: &str,
        search: &str,
        language: &str,
    ) -> Option<WeightedField> {
        let score = self.catalog.score(kind, field);
        if score <= 0.0 {
            return None;
        }

        if search.contains(FUZZY_MARKER) || self.catalog.is_not_analyzed(field) {
            Some(WeightedField::new(field, score))
        } else {
            Some(WeightedField::new(format!("{}.{}", field, language), score))
        }
    }

    fn filter_field(&self, kind: FieldKind, field: &str, selections: &FacetSelections) -> Partition {
        let ranges = if self.catalog.is_numeric(field) {
            self.catalog.ranges(field)
        } else {
            Vec::new()
        };

        if !ranges.is_empty() {
            let translation: Translation = ranges
                .into_iter()
                .map(|(label, range)| (label, range.to_predicate()))
                .collect();
            partition(field, selections, ClauseKind::Range, Some(&translation))
        } else if kind == FieldKind::Custom {
            partition(field, selections, ClauseKind::Term, None)
        } else {
            Partition::default()
        }
    }

    /// Appends post type relevance boosts, e.g.
    /// `shoes AND ((post_type_relevance:2)^1 OR (post_type_relevance:0))`.
    fn with_post_type_relevance(&self, search: String) -> String {
        let levels = self.catalog.post_type_relevance();
        if levels.is_empty() {
            return search;
        }

        let mut boosts: Vec<String> = levels
            .iter()
            .map(|level| {
                format!(
                    "(post_type_relevance:{})^{}",
                    level,
                    f64::from(*level) / 2.0
                )
            })
            .collect();
        boosts.push("(post_type_relevance:0)".to_string());

        format!("{} AND ({})", search, boosts.join(" OR "))
    }

    fn aggregations(&self) -> Vec<AggregationSpec> {
        std::iter::once(AggregationSpec::terms(
            self.tenant.aggregation.clone(),
            self.tenant.name_field.clone(),
        ))
        .chain(
            self.catalog
                .taxonomies()
                .iter()
                .map(|t| AggregationSpec::terms(t.clone(), format!("{}_name", t))),
        )
        .collect()
    }
}

/// Upper-cases the boolean operators `and` / `or` between words. Everything
/// else is left to the backend's analyzer.
pub fn normalize_operators(text: &str) -> String {
    let text = replace_ascii_case_insensitive(text, " and ", " AND ");
    replace_ascii_case_insensitive(&text, " or ", " OR ")
}

fn replace_ascii_case_insensitive(text: &str, needle: &str, replacement: &str) -> String {
    // ASCII lowercasing keeps byte offsets, so matches index into `text`.
    let lowered = text.to_ascii_lowercase();
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for (idx, _) in lowered.match_indices(needle) {
        out.push_str(&text[last..idx]);
        out.push_str(replacement);
        last = idx + needle.len();
    }

    out.push_str(&text[last..]);
    out
}
