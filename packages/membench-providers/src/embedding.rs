use serde_json::Value;

use membench_config::{EmbeddingProviderConfig, RetryPolicy};

use crate::{Error, Result, retry};

/// Embeds `texts` with an OpenAI-compatible embeddings endpoint, retrying per `policy`.
pub async fn embed(
	cfg: &EmbeddingProviderConfig,
	policy: &RetryPolicy,
	texts: &[String],
) -> Result<Vec<Vec<f32>>> {
	if texts.is_empty() {
		return Ok(Vec::new());
	}

	let client = crate::http_client(cfg.timeout_ms)?;
	let url = crate::endpoint(&cfg.api_base, &cfg.path);
	let headers = crate::auth_headers(&cfg.api_key, &cfg.default_headers)?;
	let mut body = serde_json::json!({
		"model": cfg.model,
		"input": texts,
	});

	if let Some(dimensions) = cfg.dimensions {
		body["dimensions"] = Value::from(dimensions);
	}

	retry::with_retry(policy, "embedding", || async {
		let res = client.post(&url).headers(headers.clone()).json(&body).send().await?;
		let json: Value = res.error_for_status()?.json().await?;
		let vectors = parse_embedding_response(json)?;

		if vectors.len() != texts.len() {
			return Err(Error::invalid_response(format!(
				"Embedding response has {} vectors for {} inputs.",
				vectors.len(),
				texts.len()
			)));
		}

		Ok(vectors)
	})
	.await
}

/// Cosine similarity clamped to `[-1, 1]`. `None` for empty, mismatched, or zero vectors.
pub fn cosine_similarity(lhs: &[f32], rhs: &[f32]) -> Option<f32> {
	if lhs.is_empty() || lhs.len() != rhs.len() {
		return None;
	}

	let mut dot = 0.0_f32;
	let mut lhs_norm = 0.0_f32;
	let mut rhs_norm = 0.0_f32;

	for (l, r) in lhs.iter().zip(rhs.iter()) {
		dot += l * r;
		lhs_norm += l * l;
		rhs_norm += r * r;
	}

	if lhs_norm <= f32::EPSILON || rhs_norm <= f32::EPSILON {
		return None;
	}

	Some((dot / (lhs_norm.sqrt() * rhs_norm.sqrt())).clamp(-1.0, 1.0))
}

fn parse_embedding_response(json: Value) -> Result<Vec<Vec<f32>>> {
	let data = json
		.get("data")
		.and_then(|v| v.as_array())
		.ok_or_else(|| Error::invalid_response("Embedding response is missing data array."))?;

	let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());

	for (fallback_index, item) in data.iter().enumerate() {
		let index = item
			.get("index")
			.and_then(|v| v.as_u64())
			.map(|v| v as usize)
			.unwrap_or(fallback_index);
		let embedding = item
			.get("embedding")
			.and_then(|v| v.as_array())
			.ok_or_else(|| Error::invalid_response("Embedding item missing embedding array."))?;
		let mut vec = Vec::with_capacity(embedding.len());

		for value in embedding {
			let number = value
				.as_f64()
				.ok_or_else(|| Error::invalid_response("Embedding value must be numeric."))?;

			vec.push(number as f32);
		}

		indexed.push((index, vec));
	}

	indexed.sort_by_key(|(index, _)| *index);

	Ok(indexed.into_iter().map(|(_, vec)| vec).collect())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_embeddings_in_index_order() {
		let json = serde_json::json!({
			"data": [
				{ "index": 1, "embedding": [2.0, 3.0] },
				{ "index": 0, "embedding": [0.5, 1.5] }
			]
		});
		let parsed = parse_embedding_response(json).expect("parse failed");

		assert_eq!(parsed.len(), 2);
		assert_eq!(parsed[0], vec![0.5, 1.5]);
		assert_eq!(parsed[1], vec![2.0, 3.0]);
	}

	#[test]
	fn rejects_non_numeric_values() {
		let json = serde_json::json!({ "data": [{ "embedding": ["x"] }] });

		assert!(matches!(parse_embedding_response(json), Err(Error::InvalidResponse { .. })));
	}

	#[test]
	fn cosine_similarity_of_parallel_vectors_is_one() {
		let similarity = cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]).expect("Similarity exists.");

		assert!((similarity - 1.0).abs() < 1e-6);
	}

	#[test]
	fn cosine_similarity_rejects_degenerate_input() {
		assert_eq!(cosine_similarity(&[], &[]), None);
		assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), None);
		assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), None);
	}
}
