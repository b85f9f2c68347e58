use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::{ErrorResponse, SearchResponse, SearchURL};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Thin client for the `_search` endpoint of a single index.
#[derive(Clone)]
pub struct SearchClient {
    http: reqwest::Client,
    search_url: SearchURL,
}

impl SearchClient {
    pub fn new(
        base_url: SearchURL,
        index: &str,
        timeout: Duration,
    ) -> Result<Self, SearchClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchClientError::Other(e.to_string()))?;

        Ok(Self {
            http,
            search_url: base_url.append_path(index).append_path("_search"),
        })
    }

    pub fn search_url(&self) -> &SearchURL {
        &self.search_url
    }

    pub async fn search(&self, body: &Value) -> Result<SearchResponse, SearchClientError> {
        tracing::debug!("POST {}", self.search_url.as_ref());

        let resp = self
            .http
            .post(self.search_url.as_ref())
            .json(body)
            .send()
            .await
            .map_err(SearchClientError::from_transport)?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp
                .text()
                .await
                .map_err(SearchClientError::from_transport)?;
            let reason = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error.reason())
                .unwrap_or(text);

            return Err(SearchClientError::QueryError {
                status: status.as_u16(),
                reason,
            });
        }

        let resp_data = resp.json::<SearchResponse>().await.map_err(|e| {
            if e.is_timeout() {
                SearchClientError::Timeout
            } else {
                SearchClientError::ParsingError(format!(
                    "Failed to parse response as JSON: {}",
                    e
                ))
            }
        })?;

        if resp_data.timed_out {
            tracing::warn!("search on {} timed out server side", self.search_url.as_ref());
        }

        Ok(resp_data)
    }
}

#[derive(Error, Debug)]
pub enum SearchClientError {
    #[error("Timeout")]
    Timeout,
    #[error("ResponseError: {0}")]
    ResponseError(String),
    #[error("QueryError ({status}): {reason}")]
    QueryError { status: u16, reason: String },
    #[error("ParsingError: {0}")]
    ParsingError(String),
    #[error("Other: {0}")]
    Other(String),
}

impl SearchClientError {
    fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SearchClientError::Timeout
        } else {
            SearchClientError::ResponseError(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn client_for(server: &mockito::ServerGuard) -> SearchClient {
        SearchClient::new(SearchURL::new(server.url()), "posts", DEFAULT_TIMEOUT).unwrap()
    }

    #[tokio::test]
    async fn search_posts_body_and_parses_hits() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/posts/_search")
            .match_body(mockito::Matcher::Json(json!({ "size": 10 })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "took": 3,
                    "timed_out": false,
                    "hits": {
                        "total": { "value": 1, "relation": "eq" },
                        "hits": [{ "_id": "11", "_source": { "blog_id": 1 } }]
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server).await;
        let response = client.search(&json!({ "size": 10 })).await.unwrap();

        mock.assert_async().await;
        let hits = response.hits.unwrap();
        assert_eq!(hits.total.unwrap().value(), 1);
        assert_eq!(hits.hits.unwrap()[0].id, "11");
    }

    #[tokio::test]
    async fn search_maps_rejected_query() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/posts/_search")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "error": { "type": "parsing_exception", "reason": "bad query" },
                    "status": 400
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server).await;
        let err = client.search(&json!({})).await.unwrap_err();

        match err {
            SearchClientError::QueryError { status, reason } => {
                assert_eq!(status, 400);
                assert_eq!(reason, "parsing_exception: bad query");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn search_reports_unparseable_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/posts/_search")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = client_for(&server).await;
        let err = client.search(&json!({})).await.unwrap_err();
        assert!(matches!(err, SearchClientError::ParsingError(_)));
    }

    #[test]
    fn search_url_points_at_index() {
        let client = SearchClient::new(
            SearchURL::new("http://localhost:9200/"),
            "posts",
            DEFAULT_TIMEOUT,
        )
        .unwrap();
        assert_eq!(
            client.search_url().as_ref(),
            "http://localhost:9200/posts/_search"
        );
    }
}
