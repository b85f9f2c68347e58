//! Decodes backend responses into [`ResultSet`]s.

use crate::ids::TenantId;
use crate::query::CompiledQuery;
use crate::traits::{Result, SearchError};
use crate::types::{Bucket, Highlight, RankedHit, RawResponse, ResultSet};

pub struct ResultDecoder {
    declared: Vec<String>,
    fallback_tenant: TenantId,
}

impl ResultDecoder {
    /// `declared` lists the aggregations to read; `fallback_tenant` is used
    /// for hits that carry no tenant id.
    pub fn new(declared: Vec<String>, fallback_tenant: TenantId) -> Self {
        Self {
            declared,
            fallback_tenant,
        }
    }

    pub fn for_query(compiled: &CompiledQuery, fallback_tenant: TenantId) -> Self {
        Self::new(compiled.aggregation_names(), fallback_tenant)
    }

    /// Hits keep backend order; `rank` is the position in that order.
    /// Aggregations without buckets are left out.
    pub fn decode(&self, response: &RawResponse) -> Result<ResultSet> {
        let total = response.total_hits.ok_or_else(|| {
            SearchError::MalformedResponse("response has no hit total".to_string())
        })?;
        let hits = response
            .hits
            .as_ref()
            .ok_or_else(|| SearchError::MalformedResponse("response has no hit list".to_string()))?;

        let mut results = ResultSet {
            total,
            ..Default::default()
        };

        for (rank, hit) in hits.iter().enumerate() {
            let highlights = hit
                .highlights
                .iter()
                .filter_map(|(field, fragments)| {
                    fragments.first().map(|text| Highlight {
                        field: field.clone(),
                        text: text.clone(),
                    })
                })
                .collect();

            let tenant = hit
                .tenant_id
                .clone()
                .unwrap_or_else(|| self.fallback_tenant.clone());

            results.push_hit(
                tenant,
                RankedHit {
                    id: hit.id.clone(),
                    rank,
                    highlights,
                },
            );
        }

        for name in &self.declared {
            let Some(buckets) = response.aggregations.get(name) else {
                continue;
            };
            if buckets.is_empty() {
                continue;
            }

            results.aggregations.insert(
                name.clone(),
                buckets
                    .iter()
                    .map(|b| Bucket {
                        label: b.key.clone(),
                        count: b.doc_count,
                    })
                    .collect(),
            );
        }

        tracing::debug!(
            total = results.total,
            hits = results.ids.len(),
            groups = results.grouped_ids.len(),
            "decoded response"
        );

        Ok(results)
    }
}
