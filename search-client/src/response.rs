use serde::Deserialize;
use serde_json::{Map, Value};

/// Body of a successful `_search` call. Every section is optional so that a
/// partial response can still be inspected by the caller.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub took: Option<u64>,
    #[serde(default)]
    pub timed_out: bool,
    #[serde(default)]
    pub hits: Option<HitsEnvelope>,
    #[serde(default)]
    pub aggregations: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
pub struct HitsEnvelope {
    #[serde(default)]
    pub total: Option<TotalHits>,
    #[serde(default)]
    pub hits: Option<Vec<Hit>>,
}

/// Older servers report the total as a bare number, newer ones as an object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TotalHits {
    Count(u64),
    Detailed {
        value: u64,
        #[serde(default)]
        relation: Option<String>,
    },
}

impl TotalHits {
    pub fn value(&self) -> u64 {
        match self {
            TotalHits::Count(count) => *count,
            TotalHits::Detailed { value, .. } => *value,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Hit {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_index", default)]
    pub index: Option<String>,
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,
    #[serde(rename = "_source", default)]
    pub source: Option<Map<String, Value>>,
    /// Field name to highlighted fragments, in the order the server sent them.
    #[serde(default)]
    pub highlight: Option<Map<String, Value>>,
}

impl Hit {
    /// Looks up a top level `_source` value.
    pub fn source_value(&self, field: &str) -> Option<&Value> {
        self.source.as_ref().and_then(|source| source.get(field))
    }
}

#[derive(Debug, Deserialize)]
pub struct TermsAggregation {
    #[serde(default)]
    pub buckets: Vec<AggregationBucket>,
}

#[derive(Debug, Deserialize)]
pub struct AggregationBucket {
    pub key: Value,
    #[serde(default)]
    pub key_as_string: Option<String>,
    pub doc_count: u64,
}

impl AggregationBucket {
    /// Bucket key rendered as a label, preferring the server's string form.
    pub fn label(&self) -> String {
        if let Some(key) = &self.key_as_string {
            return key.clone();
        }

        match &self.key {
            Value::String(key) => key.clone(),
            other => other.to_string(),
        }
    }
}

impl SearchResponse {
    /// Parses the named aggregation as a terms aggregation.
    ///
    /// Returns `None` when the aggregation is absent or is not bucketed.
    pub fn terms_aggregation(&self, name: &str) -> Option<TermsAggregation> {
        let raw = self.aggregations.as_ref()?.get(name)?;
        serde_json::from_value(raw.clone()).ok()
    }
}

/// Error body returned by the server for rejected requests.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    #[serde(default)]
    pub status: Option<u16>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ErrorBody {
    Detailed {
        #[serde(rename = "type")]
        kind: String,
        reason: Option<String>,
    },
    Message(String),
}

impl ErrorBody {
    pub fn reason(&self) -> String {
        match self {
            ErrorBody::Detailed {
                kind,
                reason: Some(reason),
            } => format!("{}: {}", kind, reason),
            ErrorBody::Detailed { kind, reason: None } => kind.clone(),
            ErrorBody::Message(message) => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn total_hits_accepts_both_shapes() {
        let legacy: TotalHits = serde_json::from_value(json!(12)).unwrap();
        assert_eq!(legacy.value(), 12);

        let current: TotalHits =
            serde_json::from_value(json!({ "value": 7, "relation": "eq" })).unwrap();
        assert_eq!(current.value(), 7);
    }

    #[test]
    fn highlight_keeps_server_field_order() {
        let hit: Hit = serde_json::from_value(json!({
            "_id": "42",
            "_source": { "blog_id": 3 },
            "highlight": {
                "post_title": ["<em>blue</em> shoes"],
                "post_content": ["first", "second"]
            }
        }))
        .unwrap();

        let fields: Vec<&String> = hit.highlight.as_ref().unwrap().keys().collect();
        assert_eq!(fields, vec!["post_title", "post_content"]);
        assert_eq!(hit.source_value("blog_id"), Some(&json!(3)));
    }

    #[test]
    fn terms_aggregation_labels() {
        let response: SearchResponse = serde_json::from_value(json!({
            "hits": { "total": 0, "hits": [] },
            "aggregations": {
                "category": { "buckets": [{ "key": "news", "doc_count": 4 }] },
                "year": { "buckets": [{ "key": 2024, "doc_count": 2 }] },
                "stats": { "value": 3.5 }
            }
        }))
        .unwrap();

        let category = response.terms_aggregation("category").unwrap();
        assert_eq!(category.buckets[0].label(), "news");
        assert_eq!(category.buckets[0].doc_count, 4);

        let year = response.terms_aggregation("year").unwrap();
        assert_eq!(year.buckets[0].label(), "2024");

        assert!(response.terms_aggregation("stats").unwrap().buckets.is_empty());
        assert!(response.terms_aggregation("missing").is_none());
    }

    #[test]
    fn error_reason_formats_type_and_reason() {
        let error: ErrorResponse = serde_json::from_value(json!({
            "error": { "type": "parsing_exception", "reason": "unknown query [foo]" },
            "status": 400
        }))
        .unwrap();
        assert_eq!(error.error.reason(), "parsing_exception: unknown query [foo]");
        assert_eq!(error.status, Some(400));
    }
}
