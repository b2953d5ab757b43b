mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Answer, Config, EmbeddingCache, EmbeddingProviderConfig, JudgeProviderConfig, Providers,
	Relevance, RetryPolicy, Service,
};

use std::{fs, path::Path};

pub const JUDGE_MODES: [&str; 2] = ["binary", "graded"];

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::validation("service.log_level", "must be non-empty."));
	}

	let embedding = &cfg.providers.embedding;

	if embedding.api_key.trim().is_empty() {
		return Err(Error::validation("providers.embedding.api_key", "must be non-empty."));
	}
	if embedding.api_base.trim().is_empty() {
		return Err(Error::validation("providers.embedding.api_base", "must be non-empty."));
	}
	if embedding.timeout_ms == 0 {
		return Err(Error::validation(
			"providers.embedding.timeout_ms",
			"must be greater than zero.",
		));
	}
	if let Some(dimensions) = embedding.dimensions
		&& dimensions == 0
	{
		return Err(Error::validation(
			"providers.embedding.dimensions",
			"must be greater than zero.",
		));
	}

	if let Some(judge) = cfg.providers.judge.as_ref() {
		if judge.api_key.trim().is_empty() {
			return Err(Error::validation("providers.judge.api_key", "must be non-empty."));
		}
		if judge.timeout_ms == 0 {
			return Err(Error::validation(
				"providers.judge.timeout_ms",
				"must be greater than zero.",
			));
		}
		if !JUDGE_MODES.contains(&judge.mode.as_str()) {
			return Err(Error::validation(
				"providers.judge.mode",
				"must be one of binary or graded.",
			));
		}
		if !judge.temperature.is_finite() || judge.temperature < 0.0 {
			return Err(Error::validation(
				"providers.judge.temperature",
				"must be a finite number, zero or greater.",
			));
		}
	}

	let retry = &cfg.providers.retry;

	if retry.max_attempts == 0 {
		return Err(Error::validation("providers.retry.max_attempts", "must be greater than zero."));
	}
	if !retry.backoff_multiplier.is_finite() || retry.backoff_multiplier < 1.0 {
		return Err(Error::validation(
			"providers.retry.backoff_multiplier",
			"must be a finite number, 1.0 or greater.",
		));
	}
	if retry.max_backoff_ms < retry.initial_backoff_ms {
		return Err(Error::validation(
			"providers.retry.max_backoff_ms",
			"must be greater than or equal to providers.retry.initial_backoff_ms.",
		));
	}

	for (key, value) in [
		("relevance.keyword_weight", cfg.relevance.keyword_weight),
		("relevance.semantic_weight", cfg.relevance.semantic_weight),
		("relevance.threshold", cfg.relevance.threshold),
		("answer.grounding_threshold", cfg.answer.grounding_threshold),
	] {
		if !value.is_finite() {
			return Err(Error::validation(key, "must be a finite number."));
		}
		if !(0.0..=1.0).contains(&value) {
			return Err(Error::validation(key, "must be in the range 0.0-1.0."));
		}
	}

	if cfg.relevance.keyword_weight + cfg.relevance.semantic_weight <= 0.0 {
		return Err(Error::validation(
			"relevance",
			"keyword_weight and semantic_weight must not both be zero.",
		));
	}
	if cfg.embedding_cache.enabled && cfg.embedding_cache.max_entries == 0 {
		return Err(Error::validation(
			"embedding_cache.max_entries",
			"must be greater than zero when the cache is enabled.",
		));
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.service.log_level = cfg.service.log_level.trim().to_string();
	cfg.providers.embedding.api_base =
		cfg.providers.embedding.api_base.trim_end_matches('/').to_string();

	if let Some(judge) = cfg.providers.judge.as_mut() {
		judge.api_base = judge.api_base.trim_end_matches('/').to_string();
		judge.mode = judge.mode.trim().to_ascii_lowercase();
		judge.skip_categories = judge
			.skip_categories
			.iter()
			.map(|category| category.trim().to_string())
			.filter(|category| !category.is_empty())
			.collect();
	}
}
