//! Extension points applied at fixed steps of a search.
//!
//! Each hook is optional; an unset hook passes its input through unchanged.
//!
//! | hook | step |
//! |---|---|
//! | `exclude_fields` | fields skipped by the compiler (default `post_date`) |
//! | `string_language` | analyzer suffix for scored fields (default `english`) |
//! | `query_string` | the full-text clause before it is stored |
//! | `post_facet_filter` | fragment merged over the compiled document |
//! | `request_body` | final request body before it is sent |
//! | `on_failure` | notified when the backend fails |
//! | `results` | decoded results before they are returned |

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::query::{CompiledQuery, FullTextClause};
use crate::traits::BackendError;
use crate::types::{RawResponse, ResultSet};

type ExcludeFieldsHook = dyn Fn(Vec<String>) -> Vec<String> + Send + Sync;
type StringLanguageHook = dyn Fn(String) -> String + Send + Sync;
type QueryStringHook = dyn Fn(FullTextClause) -> FullTextClause + Send + Sync;
type PostFacetFilterHook = dyn Fn(&CompiledQuery) -> Map<String, Value> + Send + Sync;
type RequestBodyHook = dyn Fn(Value) -> Value + Send + Sync;
type FailureHook = dyn Fn(&BackendError) + Send + Sync;
type ResultsHook = dyn Fn(ResultSet, &RawResponse) -> ResultSet + Send + Sync;

#[derive(Clone, Default)]
pub struct SearchHooks {
    exclude_fields: Option<Arc<ExcludeFieldsHook>>,
    string_language: Option<Arc<StringLanguageHook>>,
    query_string: Option<Arc<QueryStringHook>>,
    post_facet_filter: Option<Arc<PostFacetFilterHook>>,
    request_body: Option<Arc<RequestBodyHook>>,
    on_failure: Option<Arc<FailureHook>>,
    results: Option<Arc<ResultsHook>>,
}

impl SearchHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exclude_fields(
        mut self,
        hook: impl Fn(Vec<String>) -> Vec<String> + Send + Sync + 'static,
    ) -> Self {
        self.exclude_fields = Some(Arc::new(hook));
        self
    }

    pub fn with_string_language(
        mut self,
        hook: impl Fn(String) -> String + Send + Sync + 'static,
    ) -> Self {
        self.string_language = Some(Arc::new(hook));
        self
    }

    pub fn with_query_string(
        mut self,
        hook: impl Fn(FullTextClause) -> FullTextClause + Send + Sync + 'static,
    ) -> Self {
        self.query_string = Some(Arc::new(hook));
        self
    }

    pub fn with_post_facet_filter(
        mut self,
        hook: impl Fn(&CompiledQuery) -> Map<String, Value> + Send + Sync + 'static,
    ) -> Self {
        self.post_facet_filter = Some(Arc::new(hook));
        self
    }

    pub fn with_request_body(
        mut self,
        hook: impl Fn(Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.request_body = Some(Arc::new(hook));
        self
    }

    pub fn with_on_failure(mut self, hook: impl Fn(&BackendError) + Send + Sync + 'static) -> Self {
        self.on_failure = Some(Arc::new(hook));
        self
    }

    pub fn with_results(
        mut self,
        hook: impl Fn(ResultSet, &RawResponse) -> ResultSet + Send + Sync + 'static,
    ) -> Self {
        self.results = Some(Arc::new(hook));
        self
    }

    pub(crate) fn exclude_fields(&self, fields: Vec<String>) -> Vec<String> {
        match &self.exclude_fields {
            Some(hook) => hook(fields),
            None => fields,
        }
    }

    pub(crate) fn string_language(&self, language: String) -> String {
        match &self.string_language {
            Some(hook) => hook(language),
            None => language,
        }
    }

    pub(crate) fn query_string(&self, clause: FullTextClause) -> FullTextClause {
        match &self.query_string {
            Some(hook) => hook(clause),
            None => clause,
        }
    }

    pub(crate) fn post_facet_filter(&self, compiled: &CompiledQuery) -> Map<String, Value> {
        match &self.post_facet_filter {
            Some(hook) => hook(compiled),
            None => Map::new(),
        }
    }

    pub(crate) fn request_body(&self, body: Value) -> Value {
        match &self.request_body {
            Some(hook) => hook(body),
            None => body,
        }
    }

    pub(crate) fn on_failure(&self, error: &BackendError) {
        if let Some(hook) = &self.on_failure {
            hook(error);
        }
    }

    pub(crate) fn results(&self, results: ResultSet, raw: &RawResponse) -> ResultSet {
        match &self.results {
            Some(hook) => hook(results, raw),
            None => results,
        }
    }
}

impl fmt::Debug for SearchHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchHooks")
            .field("exclude_fields", &self.exclude_fields.is_some())
            .field("string_language", &self.string_language.is_some())
            .field("query_string", &self.query_string.is_some())
            .field("post_facet_filter", &self.post_facet_filter.is_some())
            .field("request_body", &self.request_body.is_some())
            .field("on_failure", &self.on_failure.is_some())
            .field("results", &self.results.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unset_hooks_pass_through() {
        let hooks = SearchHooks::new();

        assert_eq!(
            hooks.exclude_fields(vec!["post_date".into()]),
            vec!["post_date".to_string()]
        );
        assert_eq!(hooks.string_language("english".into()), "english");
        assert!(hooks.post_facet_filter(&CompiledQuery::default()).is_empty());
        assert_eq!(hooks.request_body(json!({ "size": 1 })), json!({ "size": 1 }));
    }

    #[test]
    fn set_hooks_replace_values() {
        let hooks = SearchHooks::new()
            .with_string_language(|_| "german".to_string())
            .with_exclude_fields(|mut fields| {
                fields.push("post_modified".into());
                fields
            });

        assert_eq!(hooks.string_language("english".into()), "german");
        assert_eq!(
            hooks.exclude_fields(vec!["post_date".into()]),
            vec!["post_date".to_string(), "post_modified".to_string()]
        );
    }

    #[test]
    fn debug_lists_registered_hooks() {
        let hooks = SearchHooks::new().with_on_failure(|_| {});
        let debug = format!("{:?}", hooks);
        assert!(debug.contains("on_failure: true"));
        assert!(debug.contains("results: false"));
    }
}
