//! Faceted search service: compile, execute and decode in one call.

use tracing::instrument;

use crate::compiler::QueryCompiler;
use crate::config::SearchSettings;
use crate::decoder::ResultDecoder;
use crate::executor::{Execution, QueryExecutor};
use crate::hooks::SearchHooks;
use crate::query::CompiledQuery;
use crate::traits::{CatalogProvider, Result, SearchBackend, SearchError};
use crate::types::{SearchOutcome, SearchRequest};

/// Search service over one backend and one catalog.
///
/// Holds no mutable state, so a single instance can be shared behind an
/// `Arc` and searched from concurrent tasks.
///
/// # Examples
///
/// ```ignore
/// let search = FacetedSearch::new(backend, catalog, settings.search)
///     .with_hooks(SearchHooks::new().with_string_language(|_| "german".into()));
///
/// let request = SearchRequest::new("blue shoes")
///     .facets(FacetSelections::new().with("brand", Selection::Exact("Acme".into())));
///
/// match search.search(&request).await? {
///     SearchOutcome::Found(results) => render(results),
///     SearchOutcome::Unavailable(_) => show_error(),
///     _ => show_nothing(),
/// }
/// ```
pub struct FacetedSearch<B, C>
where
    B: SearchBackend,
    C: CatalogProvider,
{
    backend: B,
    catalog: C,
    hooks: SearchHooks,
    settings: SearchSettings,
}

impl<B, C> FacetedSearch<B, C>
where
    B: SearchBackend,
    C: CatalogProvider,
{
    pub fn new(backend: B, catalog: C, settings: SearchSettings) -> Self {
        Self {
            backend,
            catalog,
            hooks: SearchHooks::default(),
            settings,
        }
    }

    pub fn with_defaults(backend: B, catalog: C) -> Self {
        Self::new(backend, catalog, SearchSettings::default())
    }

    pub fn with_hooks(mut self, hooks: SearchHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Compiles a request without running it.
    pub fn compile(&self, request: &SearchRequest) -> CompiledQuery {
        QueryCompiler::new(&self.catalog, &self.hooks, &self.settings.tenant)
            .compile(request.text.trim(), &request.facet_selections)
    }

    /// Runs a search.
    ///
    /// A failing backend is an [`SearchOutcome::Unavailable`], not an error.
    /// Errors are reserved for bad requests and unreadable responses.
    #[instrument(skip(self, request), fields(text = %request.text, page = request.page_index))]
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchOutcome> {
        if !self.catalog.is_enabled() {
            tracing::debug!("search is disabled");
            return Ok(SearchOutcome::Disabled);
        }

        if request.page_size == 0 {
            return Err(SearchError::ConfigError(
                "page_size must be at least 1".to_string(),
            ));
        }

        let compiled = self.compile(request);

        let execution = QueryExecutor::new(&self.backend, &self.hooks, &self.settings)
            .execute(
                &compiled,
                request.page_index,
                request.page_size,
                request.sort_by_date,
            )
            .await?;

        let raw = match execution {
            Execution::Skipped => return Ok(SearchOutcome::Empty),
            Execution::Unavailable(e) => return Ok(SearchOutcome::Unavailable(e)),
            Execution::Completed(raw) => raw,
        };

        let fallback_tenant = request
            .current_tenant
            .clone()
            .unwrap_or_else(|| self.settings.tenant.default.clone());

        let results = ResultDecoder::for_query(&compiled, fallback_tenant).decode(&raw)?;
        let results = self.hooks.results(results, &raw);

        tracing::info!(
            total = results.total,
            returned = results.ids.len(),
            "search completed"
        );

        Ok(SearchOutcome::Found(results))
    }
}
