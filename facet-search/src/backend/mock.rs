//! Mock search backend for testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use crate::traits::{BackendError, SearchBackend};
use crate::types::RawResponse;

/// Backend returning a configured response and recording what it was sent.
///
/// By default every search matches nothing.
#[derive(Clone, Default)]
pub struct MockSearchBackend {
    response: Arc<RwLock<Option<Result<RawResponse, BackendError>>>>,
    call_count: Arc<AtomicUsize>,
    last_body: Arc<RwLock<Option<Value>>>,
}

impl MockSearchBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every search with `response`.
    pub fn returning(self, response: RawResponse) -> Self {
        *self.response.write().unwrap() = Some(Ok(response));
        self
    }

    /// Fail every search with `error`.
    pub fn failing(self, error: BackendError) -> Self {
        *self.response.write().unwrap() = Some(Err(error));
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Body of the most recent search, if any.
    pub fn last_body(&self) -> Option<Value> {
        self.last_body.read().unwrap().clone()
    }
}

#[async_trait]
impl SearchBackend for MockSearchBackend {
    async fn search(&self, body: &Value) -> Result<RawResponse, BackendError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        *self.last_body.write().unwrap() = Some(body.clone());

        self.response
            .read()
            .unwrap()
            .clone()
            .unwrap_or_else(|| {
                Ok(RawResponse {
                    total_hits: Some(0),
                    hits: Some(Vec::new()),
                    ..Default::default()
                })
            })
    }
}
