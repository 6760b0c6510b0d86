use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::{Map, Value};

use reach_config::EmbeddingProviderConfig;

#[test]
fn builds_bearer_auth_header() {
	let headers =
		reach_providers::auth_headers("secret", &Map::new()).expect("Failed to build headers.");
	let value = headers.get(AUTHORIZATION).expect("Missing authorization header.");

	assert_eq!(value, "Bearer secret");
	assert_eq!(headers.get(CONTENT_TYPE).expect("Missing content type."), "application/json");
}

#[test]
fn default_headers_are_forwarded() {
	let mut extra = Map::new();

	extra.insert("x-client-info".to_string(), Value::String("reach".to_string()));

	let headers = reach_providers::auth_headers("secret", &extra).expect("Failed to build headers.");

	assert_eq!(headers.get("x-client-info").expect("Missing extra header."), "reach");
}

#[test]
fn non_string_default_header_is_rejected() {
	let mut extra = Map::new();

	extra.insert("x-retries".to_string(), Value::from(3));

	let err = reach_providers::auth_headers("secret", &extra).expect_err("Expected header error.");

	assert!(err.to_string().contains("Default header x-retries must be a string."));
}

#[tokio::test]
async fn embedding_empty_input_skips_request() {
	let cfg = EmbeddingProviderConfig {
		provider_id: "test".to_string(),
		api_base: "http://127.0.0.1:1".to_string(),
		api_key: "key".to_string(),
		path: "/v1/embeddings".to_string(),
		model: "m".to_string(),
		dimensions: 3,
		timeout_ms: 1_000,
		default_headers: Map::new(),
	};
	let vectors = reach_providers::embedding::embed(&cfg, &[]).await.expect("embed failed");

	assert!(vectors.is_empty());
}
