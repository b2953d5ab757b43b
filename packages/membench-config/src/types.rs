use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub providers: Providers,
	#[serde(default)]
	pub relevance: Relevance,
	#[serde(default)]
	pub answer: Answer,
	#[serde(default)]
	pub embedding_cache: EmbeddingCache,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	/// Optional. When absent, no LLM judge runs and the report has no `llm_judge` section.
	pub judge: Option<JudgeProviderConfig>,
	#[serde(default)]
	pub retry: RetryPolicy,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	/// Optional. Forwarded as `dimensions` only when set.
	pub dimensions: Option<u32>,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct JudgeProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	#[serde(default)]
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
	/// One of `binary` or `graded`.
	#[serde(default = "default_judge_mode")]
	pub mode: String,
	/// Categories that are never sent to the judge. Adversarial questions (category 5) carry no
	/// usable gold answer.
	#[serde(default = "default_judge_skip_categories")]
	pub skip_categories: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
	pub max_attempts: u32,
	pub initial_backoff_ms: u64,
	pub backoff_multiplier: f64,
	pub max_backoff_ms: u64,
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			initial_backoff_ms: 500,
			backoff_multiplier: 2.0,
			max_backoff_ms: 8_000,
		}
	}
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct Relevance {
	pub keyword_weight: f64,
	pub semantic_weight: f64,
	pub threshold: f64,
}
impl Default for Relevance {
	fn default() -> Self {
		Self { keyword_weight: 0.6, semantic_weight: 0.4, threshold: 0.3 }
	}
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct Answer {
	/// Minimum similarity between the generated answer and the joined retrieved memories for the
	/// answer to count as memory based. The comparison is strict.
	pub grounding_threshold: f64,
}
impl Default for Answer {
	fn default() -> Self {
		Self { grounding_threshold: 0.3 }
	}
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct EmbeddingCache {
	pub enabled: bool,
	pub max_entries: usize,
}
impl Default for EmbeddingCache {
	fn default() -> Self {
		Self { enabled: true, max_entries: 50_000 }
	}
}

fn default_judge_mode() -> String {
	"binary".to_string()
}

fn default_judge_skip_categories() -> Vec<String> {
	vec!["5".to_string()]
}
