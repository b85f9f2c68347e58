//! Turns ranked hits back into host documents.

use std::collections::HashMap;

use crate::ids::DocumentId;
use crate::traits::{DocumentResolver, Result};
use crate::types::ResultSet;

/// Loads the documents of every tenant group and merges them back into the
/// overall rank order of `results.ids`.
///
/// The resolver is called once per non-empty group, in group order.
/// Documents the resolver returns that were not hits are dropped.
pub async fn resolve_ranked_documents<R>(
    resolver: &R,
    results: &ResultSet,
) -> Result<Vec<R::Document>>
where
    R: DocumentResolver + ?Sized,
{
    let mut ranked: Vec<(usize, R::Document)> = Vec::with_capacity(results.ids.len());

    for group in &results.grouped_ids {
        if group.hits.is_empty() {
            continue;
        }

        let ranks: HashMap<&DocumentId, usize> =
            group.hits.iter().map(|h| (&h.id, h.rank)).collect();
        let ids: Vec<DocumentId> = group.hits.iter().map(|h| h.id.clone()).collect();

        let resolved = resolver.resolve_documents(&group.tenant_id, &ids).await?;

        for document in resolved {
            let id = resolver.document_id(&document);
            match ranks.get(&id) {
                Some(rank) => ranked.push((*rank, document)),
                None => tracing::warn!(
                    tenant = %group.tenant_id,
                    id = %id,
                    "resolver returned a document that was not a hit"
                ),
            }
        }
    }

    ranked.sort_by_key(|(rank, _)| *rank);
    Ok(ranked.into_iter().map(|(_, document)| document).collect())
}
