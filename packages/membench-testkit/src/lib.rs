mod error;

pub use error::{Error, Result};

use std::{
	collections::HashMap,
	env, fs,
	path::{Path, PathBuf},
	sync::{
		Arc, Mutex,
		atomic::{AtomicU64, AtomicUsize, Ordering},
	},
	time::{SystemTime, UNIX_EPOCH},
};

use serde_json::{Map, Value};

use membench_config::{
	Answer, Config, EmbeddingCache, EmbeddingProviderConfig, JudgeProviderConfig, Providers,
	Relevance, RetryPolicy, Service,
};
use membench_service::{AnswerJudge, BoxFuture, SimilarityOracle, Verdict};

/// Config pointing at an unreachable provider; tests inject their own oracles.
pub fn test_config() -> Config {
	Config {
		service: Service { log_level: "warn".to_string() },
		providers: Providers {
			embedding: EmbeddingProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:9".to_string(),
				api_key: "test-key".to_string(),
				path: "/embeddings".to_string(),
				model: "test-embedding".to_string(),
				dimensions: None,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			judge: None,
			retry: RetryPolicy {
				max_attempts: 1,
				initial_backoff_ms: 0,
				backoff_multiplier: 1.0,
				max_backoff_ms: 0,
			},
		},
		relevance: Relevance::default(),
		answer: Answer::default(),
		embedding_cache: EmbeddingCache { enabled: false, max_entries: 1 },
	}
}

/// [`test_config`] with a `[providers.judge]` section in `mode`.
pub fn test_config_with_judge(mode: &str) -> Config {
	let mut cfg = test_config();

	cfg.providers.judge = Some(JudgeProviderConfig {
		provider_id: "test".to_string(),
		api_base: "http://127.0.0.1:9".to_string(),
		api_key: "test-key".to_string(),
		path: "/chat/completions".to_string(),
		model: "test-judge".to_string(),
		temperature: 0.0,
		timeout_ms: 1_000,
		default_headers: Map::new(),
		mode: mode.to_string(),
		skip_categories: vec!["5".to_string()],
	});

	cfg
}

/// Returns `default` for every pair except those registered with [`TableSimilarity::with`].
/// Pairs are unordered.
pub struct TableSimilarity {
	default: f64,
	table: HashMap<(String, String), f64>,
	calls: Arc<AtomicUsize>,
}
impl TableSimilarity {
	pub fn new(default: f64) -> Self {
		Self { default, table: HashMap::new(), calls: Arc::new(AtomicUsize::new(0)) }
	}

	pub fn with(mut self, lhs: &str, rhs: &str, value: f64) -> Self {
		self.table.insert(pair_key(lhs, rhs), value);

		self
	}

	pub fn count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl SimilarityOracle for TableSimilarity {
	fn similarity<'a>(
		&'a self,
		lhs: &'a str,
		rhs: &'a str,
	) -> BoxFuture<'a, membench_service::Result<f64>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let value = self.table.get(&pair_key(lhs, rhs)).copied().unwrap_or(self.default);

		Box::pin(async move { Ok(value) })
	}
}

/// Fails every call, like an embedding provider that is down.
#[derive(Default)]
pub struct FailingSimilarity {
	calls: AtomicUsize,
}
impl FailingSimilarity {
	pub fn count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl SimilarityOracle for FailingSimilarity {
	fn similarity<'a>(
		&'a self,
		_lhs: &'a str,
		_rhs: &'a str,
	) -> BoxFuture<'a, membench_service::Result<f64>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		Box::pin(async move {
			Err(membench_service::Error::Provider {
				message: "Embedding provider is unavailable.".to_string(),
			})
		})
	}
}

/// Judges an answer correct when it contains the gold answer, ignoring case. Records every
/// question it is asked.
#[derive(Default)]
pub struct ContainsJudge {
	score: Option<u8>,
	questions: Mutex<Vec<String>>,
}
impl ContainsJudge {
	/// Attaches a graded score: the given score when correct, `0` otherwise.
	pub fn graded(score: u8) -> Self {
		Self { score: Some(score), questions: Mutex::new(Vec::new()) }
	}

	pub fn questions(&self) -> Vec<String> {
		self.questions.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl AnswerJudge for ContainsJudge {
	fn judge<'a>(
		&'a self,
		question: &'a str,
		gold_answer: &'a str,
		generated_answer: &'a str,
	) -> BoxFuture<'a, membench_service::Result<Verdict>> {
		self.questions.lock().unwrap_or_else(|err| err.into_inner()).push(question.to_string());

		let correct = !gold_answer.trim().is_empty()
			&& generated_answer.to_lowercase().contains(&gold_answer.trim().to_lowercase());
		let verdict = Verdict {
			correct,
			score: self.score.map(|score| if correct { score } else { 0 }),
			confidence: self.score.map(|_| 0.9),
			explanation: None,
		};

		Box::pin(async move { Ok(verdict) })
	}
}

#[derive(Default)]
pub struct FailingJudge;
impl AnswerJudge for FailingJudge {
	fn judge<'a>(
		&'a self,
		_question: &'a str,
		_gold_answer: &'a str,
		_generated_answer: &'a str,
	) -> BoxFuture<'a, membench_service::Result<Verdict>> {
		Box::pin(async move {
			Err(membench_service::Error::Provider { message: "Judge timed out.".to_string() })
		})
	}
}

/// A results-file entry. `memories` become `speaker_1_memories` using the `memory` key.
pub fn result_record(
	question: &str,
	answer: &str,
	category: u32,
	response: &str,
	memories: &[&str],
) -> Value {
	let memories: Vec<Value> =
		memories.iter().map(|memory| serde_json::json!({ "memory": memory })).collect();

	serde_json::json!({
		"question": question,
		"answer": answer,
		"category": category,
		"response": response,
		"speaker_1_memories": memories,
		"speaker_2_memories": [],
	})
}

/// A gold conversation whose QA list holds `(question, answer, category)` triples.
pub fn gold_conversation(qa: &[(&str, &str, u32)]) -> Value {
	let qa: Vec<Value> = qa
		.iter()
		.map(|(question, answer, category)| {
			serde_json::json!({
				"question": question,
				"answer": answer,
				"category": category,
				"evidence": [],
			})
		})
		.collect();

	serde_json::json!({
		"conversation": { "speaker_a": "Alice", "speaker_b": "Bob" },
		"qa": qa,
	})
}

/// Scratch directory removed on drop.
pub struct TempDir {
	path: PathBuf,
}
impl TempDir {
	pub fn new(prefix: &str) -> Result<Self> {
		static COUNTER: AtomicU64 = AtomicU64::new(0);

		let nanos = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map_err(|err| Error::Message(format!("System time is before the epoch: {err}.")))?
			.as_nanos();
		let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
		let path = env::temp_dir()
			.join(format!("{prefix}_{nanos}_{}_{ordinal}", std::process::id()));

		fs::create_dir_all(&path)?;

		Ok(Self { path })
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn write_json(&self, name: &str, value: &Value) -> Result<PathBuf> {
		let path = self.path.join(name);

		fs::write(&path, serde_json::to_vec_pretty(value)?)?;

		Ok(path)
	}

	pub fn write_text(&self, name: &str, contents: &str) -> Result<PathBuf> {
		let path = self.path.join(name);

		fs::write(&path, contents)?;

		Ok(path)
	}
}
impl Drop for TempDir {
	fn drop(&mut self) {
		if let Err(err) = fs::remove_dir_all(&self.path) {
			eprintln!("Failed to remove test directory {}: {err}.", self.path.display());
		}
	}
}

fn pair_key(lhs: &str, rhs: &str) -> (String, String) {
	if lhs <= rhs {
		(lhs.to_string(), rhs.to_string())
	} else {
		(rhs.to_string(), lhs.to_string())
	}
}
