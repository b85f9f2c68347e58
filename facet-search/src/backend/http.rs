//! Elasticsearch-compatible backend over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use search_client::{SearchClient, SearchClientError, SearchResponse, SearchURL};
use serde_json::Value;

use crate::config::{BackendSettings, TenantSettings};
use crate::ids::{DocumentId, TenantId};
use crate::traits::{BackendError, Result, SearchBackend, SearchError};
use crate::types::{RawBucket, RawHit, RawResponse};

/// [`SearchBackend`] backed by a [`SearchClient`].
#[derive(Clone)]
pub struct HttpSearchBackend {
    client: SearchClient,
    tenant_field: String,
}

impl HttpSearchBackend {
    pub fn new(backend: &BackendSettings, tenant: &TenantSettings) -> Result<Self> {
        let client = SearchClient::new(
            SearchURL::new(backend.url.clone()),
            &backend.index,
            Duration::from_secs(backend.timeout_secs),
        )
        .map_err(|e| SearchError::ConfigError(e.to_string()))?;

        tracing::info!("search backend at {}", client.search_url().as_ref());

        Ok(Self {
            client,
            tenant_field: tenant.id_field.clone(),
        })
    }
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    async fn search(&self, body: &Value) -> std::result::Result<RawResponse, BackendError> {
        let response = self.client.search(body).await.map_err(map_client_error)?;
        Ok(to_raw_response(response, &self.tenant_field))
    }
}

fn to_raw_response(response: SearchResponse, tenant_field: &str) -> RawResponse {
    let aggregations = response
        .aggregations
        .as_ref()
        .map(|aggs| {
            aggs.keys()
                .filter_map(|name| {
                    let terms = response.terms_aggregation(name)?;
                    let buckets = terms
                        .buckets
                        .iter()
                        .map(|b| RawBucket {
                            key: b.label(),
                            doc_count: b.doc_count,
                        })
                        .collect();
                    Some((name.clone(), buckets))
                })
                .collect()
        })
        .unwrap_or_default();

    let (total_hits, hits) = match response.hits {
        Some(envelope) => (
            envelope.total.map(|t| t.value()),
            envelope.hits.map(|hits| {
                hits.into_iter()
                    .map(|hit| {
                        let tenant_id =
                            hit.source_value(tenant_field).and_then(TenantId::from_json);
                        let highlights = hit
                            .highlight
                            .unwrap_or_default()
                            .into_iter()
                            .map(|(field, fragments)| (field, fragment_strings(fragments)))
                            .collect();

                        RawHit {
                            id: DocumentId::new(hit.id),
                            tenant_id,
                            highlights,
                        }
                    })
                    .collect()
            }),
        ),
        None => (None, None),
    };

    RawResponse {
        total_hits,
        hits,
        aggregations,
    }
}

fn fragment_strings(fragments: Value) -> Vec<String> {
    match fragments {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(text) => Some(text),
                _ => None,
            })
            .collect(),
        Value::String(text) => vec![text],
        _ => Vec::new(),
    }
}

fn map_client_error(e: SearchClientError) -> BackendError {
    match e {
        SearchClientError::Timeout => BackendError::Timeout,
        SearchClientError::ResponseError(msg) | SearchClientError::Other(msg) => {
            BackendError::Transport(msg)
        }
        SearchClientError::QueryError { status, reason } => BackendError::Query { status, reason },
        SearchClientError::ParsingError(msg) => BackendError::MalformedResponse(msg),
    }
}
