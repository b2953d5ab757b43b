use std::sync::{Arc, Mutex};

use axum::{Json, Router, extract::State, routing::post};
use serde_json::{Map, Value};
use tokio::net::TcpListener;

use membench_config::{EmbeddingCache, EmbeddingProviderConfig, RetryPolicy};
use membench_service::{EmbeddingSimilarity, SimilarityOracle};

type Requests = Arc<Mutex<Vec<Vec<String>>>>;

/// Records the inputs of every embeddings request. Each text embeds as `[1, len]`.
async fn spawn_embed_server() -> (String, Requests) {
	let requests = Requests::default();
	let app = Router::new().route("/embeddings", post(embed_handler)).with_state(requests.clone());
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind embed server.");
	let addr = listener.local_addr().expect("Failed to read embed server address.");

	tokio::spawn(async move {
		let _ = axum::serve(listener, app).await;
	});

	(format!("http://{addr}"), requests)
}

async fn embed_handler(
	State(requests): State<Requests>,
	Json(payload): Json<Value>,
) -> Json<Value> {
	let inputs: Vec<String> = payload
		.get("input")
		.and_then(Value::as_array)
		.map(|values| values.iter().filter_map(Value::as_str).map(str::to_string).collect())
		.unwrap_or_default();
	let data: Vec<Value> = inputs
		.iter()
		.enumerate()
		.map(|(index, text)| {
			serde_json::json!({ "index": index, "embedding": [1.0, text.len() as f32] })
		})
		.collect();

	requests.lock().expect("Request log is poisoned.").push(inputs);

	Json(serde_json::json!({ "data": data }))
}

async fn similarity(enabled: bool) -> (EmbeddingSimilarity, Requests) {
	let (api_base, requests) = spawn_embed_server().await;
	let cfg = EmbeddingProviderConfig {
		provider_id: "stub".to_string(),
		api_base,
		api_key: "key".to_string(),
		path: "/embeddings".to_string(),
		model: "stub-embed".to_string(),
		dimensions: None,
		timeout_ms: 5_000,
		default_headers: Map::new(),
	};
	let retry = RetryPolicy {
		max_attempts: 1,
		initial_backoff_ms: 0,
		backoff_multiplier: 2.0,
		max_backoff_ms: 0,
	};
	let cache = EmbeddingCache { enabled, max_entries: 16 };

	(EmbeddingSimilarity::new(cfg, retry, cache), requests)
}

fn logged(requests: &Requests) -> Vec<Vec<String>> {
	requests.lock().expect("Request log is poisoned.").clone()
}

fn texts(values: &[&str]) -> Vec<String> {
	values.iter().map(|value| value.to_string()).collect()
}

#[tokio::test]
async fn identical_texts_are_embedded_once() {
	let (oracle, requests) = similarity(true).await;
	let value = oracle.similarity("hiking", "hiking").await.expect("Similarity must succeed.");

	assert!((value - 1.0).abs() < 1e-6);
	assert_eq!(logged(&requests), vec![texts(&["hiking"])]);
}

#[tokio::test]
async fn cached_vectors_are_not_requested_again() {
	let (oracle, requests) = similarity(true).await;
	let first = oracle.similarity("hiking", "park").await.expect("Similarity must succeed.");

	oracle.similarity("hiking", "yellowstone").await.expect("Similarity must succeed.");

	let reversed = oracle.similarity("park", "hiking").await.expect("Similarity must succeed.");

	assert!((first - reversed).abs() < 1e-9);
	assert_eq!(logged(&requests), vec![texts(&["hiking", "park"]), texts(&["yellowstone"])]);
}

#[tokio::test]
async fn disabled_cache_requests_both_texts_every_call() {
	let (oracle, requests) = similarity(false).await;

	oracle.similarity("hiking", "park").await.expect("Similarity must succeed.");
	oracle.similarity("hiking", "park").await.expect("Similarity must succeed.");

	assert_eq!(logged(&requests), vec![texts(&["hiking", "park"]); 2]);
}
