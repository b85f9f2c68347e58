//! Faceted full-text search over a multi-tenant content index.
//!
//! Free text and facet selections are compiled against a field catalog into
//! an Elasticsearch-style query document, sent to a search backend, and the
//! response is decoded into ranked document ids grouped by tenant, plus
//! facet bucket counts.
//!
//! # Architecture
//!
//! - [`QueryCompiler`] - text + selections + catalog to [`CompiledQuery`]
//! - [`QueryExecutor`] - paging, sort and the backend call
//! - [`ResultDecoder`] - backend response to [`ResultSet`]
//! - [`FacetedSearch`] - all three in one call
//! - [`resolve_ranked_documents`] - ids back to host documents, per tenant
//!
//! The catalog, the backend and the document source sit behind the
//! [`CatalogProvider`], [`SearchBackend`] and [`DocumentResolver`] traits.
//! Behavior at fixed steps can be adjusted with [`SearchHooks`].
//!
//! # Example
//!
//! ```ignore
//! use facet_search::{read_config, FacetedSearch, HttpSearchBackend, SearchRequest};
//!
//! let settings = read_config(Path::new("config"))?;
//! let backend = HttpSearchBackend::new(&settings.backend, &settings.search.tenant)?;
//! let search = FacetedSearch::new(backend, settings.catalog, settings.search);
//!
//! let outcome = search.search(&SearchRequest::new("blue shoes")).await?;
//! ```
//!
//! # Facet selections
//!
//! Selections deserialize from the shapes a query string produces:
//!
//! - `"brand": "Acme"` - exactly this value
//! - `"size": ["L", "XL"]` - all of these values
//! - `"color": {"or": ["red", "blue"]}` - any of these values

mod backend;
mod catalog;
mod compiler;
mod decoder;
mod executor;
mod hooks;
mod ids;
mod partition;
mod query;
mod resolve;
mod service;
mod traits;
mod types;

pub mod config;

pub use backend::HttpSearchBackend;
pub use catalog::{NamedRange, StaticCatalog};
pub use compiler::{normalize_operators, QueryCompiler};
pub use crate::config::{read_config, Settings};
pub use decoder::ResultDecoder;
pub use executor::{Execution, QueryExecutor};
pub use hooks::SearchHooks;
pub use ids::{DocumentId, TenantId};
pub use partition::{fold_or_groups, partition, Partition, Translation};
pub use query::{
    merge_fragment, AggregationSpec, Clause, ClauseGroup, ClauseKind, CompiledQuery,
    FullTextClause, WeightedField,
};
pub use resolve::resolve_ranked_documents;
pub use service::FacetedSearch;
pub use traits::{
    BackendError, CatalogProvider, DocumentResolver, Result, SearchBackend, SearchError,
};
pub use types::*;
