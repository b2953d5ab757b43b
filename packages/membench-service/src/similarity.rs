use std::{
	collections::HashMap,
	sync::{Arc, Mutex, MutexGuard},
};

use membench_config::{EmbeddingCache, EmbeddingProviderConfig, RetryPolicy};
use membench_providers::embedding;

use crate::{BoxFuture, Result, SimilarityOracle};

/// Clamped oracle similarity. Failures and non-finite values become `0.0`.
pub async fn similarity_or_zero(oracle: &dyn SimilarityOracle, lhs: &str, rhs: &str) -> f64 {
	match oracle.similarity(lhs, rhs).await {
		Ok(value) if value.is_finite() => value.clamp(0.0, 1.0),
		Ok(value) => {
			tracing::debug!(value, "Similarity is not finite. Using 0.0.");

			0.0
		},
		Err(err) => {
			tracing::warn!(error = %err, "Similarity oracle failed. Using 0.0.");

			0.0
		},
	}
}

/// Cosine similarity over embeddings from the configured provider.
pub struct EmbeddingSimilarity {
	cfg: EmbeddingProviderConfig,
	retry: RetryPolicy,
	cache: Option<VectorCache>,
}
impl EmbeddingSimilarity {
	pub fn new(cfg: EmbeddingProviderConfig, retry: RetryPolicy, cache: EmbeddingCache) -> Self {
		let cache = cache.enabled.then(|| VectorCache::new(cache.max_entries));

		Self { cfg, retry, cache }
	}

	async fn vectors(&self, texts: [&str; 2]) -> Result<[Arc<Vec<f32>>; 2]> {
		let keys = texts.map(|text| cache_key(&self.cfg, text));
		let mut found = keys.map(|key| self.cache.as_ref().and_then(|cache| cache.get(&key)));
		let mut missing: Vec<usize> = (0..2).filter(|idx| found[*idx].is_none()).collect();

		if texts[0] == texts[1] && missing.len() == 2 {
			missing.truncate(1);
		}

		if !missing.is_empty() {
			let inputs: Vec<String> = missing.iter().map(|idx| texts[*idx].to_string()).collect();
			let vectors = embedding::embed(&self.cfg, &self.retry, &inputs).await?;

			for (idx, vector) in missing.into_iter().zip(vectors) {
				let vector = Arc::new(vector);

				if let Some(cache) = &self.cache {
					cache.insert(keys[idx], vector.clone());
				}

				found[idx] = Some(vector);
			}
		}

		match found {
			[Some(lhs), Some(rhs)] => Ok([lhs, rhs]),
			[Some(lhs), None] => Ok([lhs.clone(), lhs]),
			_ => Err(crate::Error::Provider {
				message: "Embedding provider returned no vector.".to_string(),
			}),
		}
	}
}
impl SimilarityOracle for EmbeddingSimilarity {
	fn similarity<'a>(&'a self, lhs: &'a str, rhs: &'a str) -> BoxFuture<'a, Result<f64>> {
		Box::pin(async move {
			let [lhs, rhs] = self.vectors([lhs, rhs]).await?;

			Ok(embedding::cosine_similarity(&lhs, &rhs).map(f64::from).unwrap_or(0.0))
		})
	}
}

/// Embeddings keyed by model and text. Cleared wholesale once `max_entries` is reached.
struct VectorCache {
	max_entries: usize,
	entries: Mutex<HashMap<blake3::Hash, Arc<Vec<f32>>>>,
}
impl VectorCache {
	fn new(max_entries: usize) -> Self {
		Self { max_entries, entries: Mutex::new(HashMap::new()) }
	}

	fn get(&self, key: &blake3::Hash) -> Option<Arc<Vec<f32>>> {
		self.lock().get(key).cloned()
	}

	fn insert(&self, key: blake3::Hash, vector: Arc<Vec<f32>>) {
		let mut entries = self.lock();

		if entries.len() >= self.max_entries {
			tracing::debug!(entries = entries.len(), "Embedding cache is full. Clearing.");
			entries.clear();
		}

		entries.insert(key, vector);
	}

	fn lock(&self) -> MutexGuard<'_, HashMap<blake3::Hash, Arc<Vec<f32>>>> {
		self.entries.lock().unwrap_or_else(|err| err.into_inner())
	}
}

fn cache_key(cfg: &EmbeddingProviderConfig, text: &str) -> blake3::Hash {
	let mut hasher = blake3::Hasher::new();

	hasher.update(cfg.provider_id.as_bytes());
	hasher.update(&[0]);
	hasher.update(cfg.model.as_bytes());
	hasher.update(&[0]);
	hasher.update(text.as_bytes());

	hasher.finalize()
}
