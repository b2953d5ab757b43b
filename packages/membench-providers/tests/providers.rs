use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};

use axum::{Router, extract::State, http::StatusCode, routing::post};
use reqwest::header::{AUTHORIZATION, HeaderName};
use serde_json::{Map, Value};
use tokio::net::TcpListener;

use membench_config::{EmbeddingProviderConfig, RetryPolicy};
use membench_providers::{Error, embedding, judge::JudgeMode};

type StatusState = (StatusCode, Arc<AtomicUsize>);

/// Serves `status` for every embeddings request and counts the requests.
async fn spawn_status_server(status: StatusCode) -> (String, Arc<AtomicUsize>) {
	let hits = Arc::new(AtomicUsize::new(0));
	let app = Router::new()
		.route("/embeddings", post(status_handler))
		.with_state((status, hits.clone()));
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind stub server.");
	let addr = listener.local_addr().expect("Failed to read stub server address.");

	tokio::spawn(async move {
		let _ = axum::serve(listener, app).await;
	});

	(format!("http://{addr}"), hits)
}

async fn status_handler(State((status, hits)): State<StatusState>) -> StatusCode {
	hits.fetch_add(1, Ordering::SeqCst);

	status
}

fn embedding_config(api_base: String) -> EmbeddingProviderConfig {
	EmbeddingProviderConfig {
		provider_id: "stub".to_string(),
		api_base,
		api_key: "key".to_string(),
		path: "/embeddings".to_string(),
		model: "stub-embed".to_string(),
		dimensions: None,
		timeout_ms: 5_000,
		default_headers: Map::new(),
	}
}

fn fast_retry(max_attempts: u32) -> RetryPolicy {
	RetryPolicy { max_attempts, initial_backoff_ms: 0, backoff_multiplier: 2.0, max_backoff_ms: 0 }
}

async fn embed_attempts(status: StatusCode) -> (Error, usize) {
	let (api_base, hits) = spawn_status_server(status).await;
	let err = embedding::embed(&embedding_config(api_base), &fast_retry(3), &["text".to_string()])
		.await
		.expect_err("A non-success status must fail.");

	(err, hits.load(Ordering::SeqCst))
}

#[test]
fn builds_bearer_auth_header_with_defaults() {
	let mut defaults = Map::new();

	defaults.insert("x-team".to_string(), Value::String("evals".to_string()));

	let headers =
		membench_providers::auth_headers("secret", &defaults).expect("Failed to build headers.");
	let value = headers.get(AUTHORIZATION).expect("Missing authorization header.");

	assert_eq!(value, "Bearer secret");
	assert_eq!(
		headers.get(HeaderName::from_static("x-team")).expect("Missing default header."),
		"evals"
	);
}

#[test]
fn rejects_non_string_default_headers() {
	let mut defaults = Map::new();

	defaults.insert("x-retries".to_string(), Value::from(3));

	let err = membench_providers::auth_headers("secret", &defaults)
		.expect_err("Numeric header values must be rejected.");

	assert!(matches!(err, Error::InvalidConfig { .. }));
	assert!(!err.is_retryable());
}

#[test]
fn judge_modes_parse_from_config_names() {
	for name in membench_config::JUDGE_MODES {
		assert!(JudgeMode::parse(name).is_ok(), "{name} must parse.");
	}
}

#[tokio::test]
async fn client_errors_fail_without_retry() {
	let statuses =
		[StatusCode::BAD_REQUEST, StatusCode::UNAUTHORIZED, StatusCode::UNPROCESSABLE_ENTITY];

	for status in statuses {
		let (err, attempts) = embed_attempts(status).await;

		assert_eq!(attempts, 1, "{status} must not be retried.");
		assert!(!err.is_retryable());
	}
}

#[tokio::test]
async fn server_errors_and_throttling_are_retried() {
	for status in [StatusCode::SERVICE_UNAVAILABLE, StatusCode::TOO_MANY_REQUESTS] {
		let (err, attempts) = embed_attempts(status).await;

		assert_eq!(attempts, 3, "{status} must use every attempt.");
		assert!(err.is_retryable());
	}
}
