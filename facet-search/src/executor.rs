//! Sends compiled queries to the backend.

use serde_json::{json, Value};
use tracing::instrument;

use crate::config::SearchSettings;
use crate::hooks::SearchHooks;
use crate::query::CompiledQuery;
use crate::traits::{BackendError, Result, SearchBackend, SearchError};
use crate::types::RawResponse;

/// What happened to a compiled query.
#[derive(Debug, Clone, PartialEq)]
pub enum Execution {
    /// The query had nothing to search for and was not sent.
    Skipped,
    Completed(RawResponse),
    Unavailable(BackendError),
}

pub struct QueryExecutor<'a, B>
where
    B: SearchBackend + ?Sized,
{
    backend: &'a B,
    hooks: &'a SearchHooks,
    settings: &'a SearchSettings,
}

impl<'a, B> QueryExecutor<'a, B>
where
    B: SearchBackend + ?Sized,
{
    pub fn new(backend: &'a B, hooks: &'a SearchHooks, settings: &'a SearchSettings) -> Self {
        Self {
            backend,
            hooks,
            settings,
        }
    }

    /// Runs `compiled` for one page of results.
    ///
    /// Backend failures are reported as [`Execution::Unavailable`], never as
    /// an error. The only error is a zero `page_size`.
    #[instrument(skip(self, compiled))]
    pub async fn execute(
        &self,
        compiled: &CompiledQuery,
        page_index: u32,
        page_size: u32,
        sort_by_date: bool,
    ) -> Result<Execution> {
        if page_size == 0 {
            return Err(SearchError::ConfigError(
                "page_size must be at least 1".to_string(),
            ));
        }

        if compiled.is_empty() {
            tracing::debug!("empty query, skipping backend");
            return Ok(Execution::Skipped);
        }

        let body = self.request_body(compiled, page_index, page_size, sort_by_date);

        match self.backend.search(&body).await {
            Ok(response) => Ok(Execution::Completed(response)),
            Err(e) => {
                tracing::error!(error = %e, "search backend failed");
                self.hooks.on_failure(&e);
                Ok(Execution::Unavailable(e))
            }
        }
    }

    /// Full request document: the compiled query plus paging, source
    /// filtering and sort, passed through the `request_body` hook.
    pub fn request_body(
        &self,
        compiled: &CompiledQuery,
        page_index: u32,
        page_size: u32,
        sort_by_date: bool,
    ) -> Value {
        let mut document = compiled.to_document();

        let from = u64::from(page_index) * u64::from(page_size);
        document.insert("from".into(), json!(from));
        document.insert("size".into(), json!(page_size));
        document.insert("_source".into(), json!([self.settings.tenant.id_field]));

        if !document.contains_key("sort") {
            let date_field = &self.settings.date_field;
            let sort = if sort_by_date {
                json!([{ date_field: { "order": "desc" } }])
            } else {
                json!([{ "_score": { "order": "desc" } }])
            };
            document.insert("sort".into(), sort);
        }

        self.hooks.request_body(Value::Object(document))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::backend::MockSearchBackend;
    use crate::query::{Clause, ClauseKind};

    fn brand_query() -> CompiledQuery {
        CompiledQuery {
            must: vec![Clause::new(ClauseKind::Term, "brand", json!("Acme"))],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn empty_query_never_reaches_backend() {
        let backend = MockSearchBackend::new();
        let hooks = SearchHooks::new();
        let settings = SearchSettings::default();
        let executor = QueryExecutor::new(&backend, &hooks, &settings);

        let execution = executor
            .execute(&CompiledQuery::default(), 0, 10, false)
            .await
            .unwrap();

        assert_eq!(execution, Execution::Skipped);
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn zero_page_size_is_rejected() {
        let backend = MockSearchBackend::new();
        let hooks = SearchHooks::new();
        let settings = SearchSettings::default();
        let executor = QueryExecutor::new(&backend, &hooks, &settings);

        let result = executor.execute(&brand_query(), 0, 0, false).await;

        assert!(matches!(result, Err(SearchError::ConfigError(_))));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn timeout_is_unavailable_and_fires_failure_hook() {
        let backend = MockSearchBackend::new().failing(BackendError::Timeout);
        let failures = Arc::new(AtomicUsize::new(0));
        let counter = failures.clone();
        let hooks = SearchHooks::new().with_on_failure(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let settings = SearchSettings::default();
        let executor = QueryExecutor::new(&backend, &hooks, &settings);

        let execution = executor.execute(&brand_query(), 0, 10, false).await.unwrap();

        assert_eq!(execution, Execution::Unavailable(BackendError::Timeout));
        assert_eq!(failures.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn sends_paged_body() {
        let backend = MockSearchBackend::new();
        let hooks = SearchHooks::new();
        let settings = SearchSettings::default();
        let executor = QueryExecutor::new(&backend, &hooks, &settings);

        let execution = executor.execute(&brand_query(), 2, 20, false).await.unwrap();
        assert!(matches!(execution, Execution::Completed(_)));

        let body = backend.last_body().unwrap();
        assert_eq!(body["from"], json!(40));
        assert_eq!(body["size"], json!(20));
        assert_eq!(body["_source"], json!(["blog_id"]));
        assert_eq!(body["sort"], json!([{ "_score": { "order": "desc" } }]));
        assert_eq!(
            body["query"],
            json!({ "bool": { "must": [{ "term": { "brand": "Acme" } }] } })
        );
    }

    #[test]
    fn sorts_by_date_field_when_asked() {
        let backend = MockSearchBackend::new();
        let hooks = SearchHooks::new();
        let settings = SearchSettings::default();
        let executor = QueryExecutor::new(&backend, &hooks, &settings);

        let body = executor.request_body(&brand_query(), 0, 10, true);
        assert_eq!(body["sort"], json!([{ "post_date": { "order": "desc" } }]));
    }

    #[test]
    fn explicit_sort_is_kept() {
        let backend = MockSearchBackend::new();
        let hooks = SearchHooks::new();
        let settings = SearchSettings::default();
        let executor = QueryExecutor::new(&backend, &hooks, &settings);

        let mut compiled = brand_query();
        compiled
            .extensions
            .insert("sort".into(), json!([{ "price": "asc" }]));

        let body = executor.request_body(&compiled, 0, 10, true);
        assert_eq!(body["sort"], json!([{ "price": "asc" }]));
    }

    #[test]
    fn request_body_hook_sees_final_document() {
        let backend = MockSearchBackend::new();
        let hooks = SearchHooks::new().with_request_body(|mut body| {
            body["track_total_hits"] = json!(true);
            body
        });
        let settings = SearchSettings::default();
        let executor = QueryExecutor::new(&backend, &hooks, &settings);

        let body = executor.request_body(&brand_query(), 1, 5, false);
        assert_eq!(body["track_total_hits"], json!(true));
        assert_eq!(body["from"], json!(5));
    }

    #[test]
    fn large_pages_do_not_overflow() {
        let backend = MockSearchBackend::new();
        let hooks = SearchHooks::new();
        let settings = SearchSettings::default();
        let executor = QueryExecutor::new(&backend, &hooks, &settings);

        let body = executor.request_body(&brand_query(), u32::MAX, u32::MAX, false);
        assert_eq!(
            body["from"],
            json!(u64::from(u32::MAX) * u64::from(u32::MAX))
        );
    }
}
