//! Trait definitions for the search boundaries.
//!
//! The catalog, the backend and the document source are all external to the
//! query compiler; these traits let them be swapped out and mocked in tests.

use async_trait::async_trait;
use serde_json::Value;

use crate::ids::{DocumentId, TenantId};
use crate::types::{FieldKind, NumericRange, RawResponse};

/// Error type for search operations.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Document resolution failed: {0}")]
    ResolveError(String),
}

impl From<config::ConfigError> for SearchError {
    fn from(e: config::ConfigError) -> Self {
        SearchError::ConfigError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;

/// Failure talking to the search backend.
///
/// Never escapes the executor; it is turned into
/// [`SearchOutcome::Unavailable`](crate::SearchOutcome::Unavailable).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    #[error("search backend timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("backend rejected query ({status}): {reason}")]
    Query { status: u16, reason: String },

    #[error("unreadable backend response: {0}")]
    MalformedResponse(String),
}

/// Read-only view of the searchable field catalog.
///
/// Implementations must be safe to read from concurrent searches.
pub trait CatalogProvider: Send + Sync {
    /// Indexed post fields, in scoring order.
    fn fields(&self) -> &[String];

    fn meta_fields(&self) -> &[String];

    fn taxonomies(&self) -> &[String];

    fn custom_facets(&self) -> &[String];

    /// Relevance weight. `0` means the field is not scored, except for
    /// taxonomies where it means the default weight of `1`.
    fn score(&self, kind: FieldKind, name: &str) -> f64;

    fn is_numeric(&self, field: &str) -> bool;

    /// Fields indexed without a language analyzer; scored by raw name.
    fn is_not_analyzed(&self, field: &str) -> bool;

    /// Fuzziness to attach to fuzzy (`~`) queries.
    fn fuzziness(&self) -> Option<Value>;

    /// Named ranges selectable for a numeric field, in display order.
    fn ranges(&self, field: &str) -> Vec<(String, NumericRange)>;

    /// Whether search runs at all.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Post type relevance levels used to boost the full-text query.
    fn post_type_relevance(&self) -> Vec<u32> {
        Vec::new()
    }
}

/// Executes a rendered search request.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, body: &Value) -> std::result::Result<RawResponse, BackendError>;
}

/// Loads documents of one tenant by id.
///
/// Called once per tenant group after a search; see
/// [`resolve_ranked_documents`](crate::resolve_ranked_documents).
#[async_trait]
pub trait DocumentResolver: Send + Sync {
    type Document: Send;

    async fn resolve_documents(
        &self,
        tenant_id: &TenantId,
        ids: &[DocumentId],
    ) -> Result<Vec<Self::Document>>;

    fn document_id(&self, document: &Self::Document) -> DocumentId;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Verify traits are object-safe (can be used as trait objects)
    fn _assert_catalog_object_safe(_: &dyn CatalogProvider) {}
    fn _assert_backend_object_safe(_: &dyn SearchBackend) {}
    fn _assert_resolver_object_safe(_: &dyn DocumentResolver<Document = String>) {}

    #[test]
    fn search_error_from_config_error() {
        let err: SearchError = config::ConfigError::Message("missing backend.url".into()).into();
        assert_eq!(err.to_string(), "Configuration error: missing backend.url");
    }

    #[test]
    fn backend_error_messages() {
        let err = BackendError::Query {
            status: 400,
            reason: "parsing_exception".into(),
        };
        assert_eq!(
            err.to_string(),
            "backend rejected query (400): parsing_exception"
        );
        assert_eq!(BackendError::Timeout.to_string(), "search backend timed out");
    }
}
