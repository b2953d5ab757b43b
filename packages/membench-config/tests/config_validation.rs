use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use membench_config::{Config, Error};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_value() -> Value {
	toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.")
}

fn set_key(value: &mut Value, table_path: &[&str], key: &str, new_value: Value) {
	let mut table = value.as_table_mut().expect("Template config must be a table.");

	for segment in table_path {
		table = table
			.get_mut(*segment)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Template config must include [{segment}]."));
	}

	table.insert(key.to_string(), new_value);
}

fn remove_key(value: &mut Value, table_path: &[&str], key: &str) {
	let mut table = value.as_table_mut().expect("Template config must be a table.");

	for segment in table_path {
		table = table
			.get_mut(*segment)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Template config must include [{segment}]."));
	}

	table.remove(key);
}

fn render(value: &Value) -> String {
	toml::to_string(value).expect("Failed to render template config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("membench_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_value(value: &Value) -> membench_config::Result<Config> {
	let path = write_temp_config(render(value));
	let result = membench_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn expect_validation_error(value: &Value, expected: &str) {
	let err = load_value(value).expect_err("Expected validation error.");

	assert!(matches!(err, Error::Validation { .. }), "Unexpected error kind: {err:?}");

	let message = err.to_string();

	assert!(message.contains(expected), "Unexpected error message: {message}");
}

#[test]
fn sample_config_loads_and_normalizes() {
	let cfg = load_value(&sample_value()).expect("Sample config must load.");

	assert_eq!(cfg.providers.embedding.api_base, "http://127.0.0.1:8089/v1");
	assert_eq!(cfg.providers.embedding.dimensions, Some(384));

	let judge = cfg.providers.judge.as_ref().expect("Sample config declares a judge.");

	assert_eq!(judge.mode, "binary");
	assert_eq!(judge.skip_categories, vec!["5".to_string()]);
	assert_eq!(cfg.embedding_cache.max_entries, 1_000);
}

#[test]
fn omitted_sections_fall_back_to_reference_constants() {
	let mut value = sample_value();
	let root = value.as_table_mut().expect("Template config must be a table.");

	root.remove("relevance");
	root.remove("answer");
	root.remove("embedding_cache");
	remove_key(&mut value, &["providers"], "retry");
	remove_key(&mut value, &["providers"], "judge");

	let cfg = load_value(&value).expect("Config without optional sections must load.");

	assert_eq!(cfg.relevance.keyword_weight, 0.6);
	assert_eq!(cfg.relevance.semantic_weight, 0.4);
	assert_eq!(cfg.relevance.threshold, 0.3);
	assert_eq!(cfg.answer.grounding_threshold, 0.3);
	assert_eq!(cfg.providers.retry.max_attempts, 3);
	assert!(cfg.providers.judge.is_none());
	assert!(cfg.embedding_cache.enabled);
}

#[test]
fn judge_mode_must_be_known() {
	let mut value = sample_value();

	set_key(&mut value, &["providers", "judge"], "mode", Value::String("likert".to_string()));

	expect_validation_error(&value, "providers.judge.mode must be one of binary or graded.");
}

#[test]
fn embedding_api_key_must_be_non_empty() {
	let mut value = sample_value();

	set_key(&mut value, &["providers", "embedding"], "api_key", Value::String("  ".to_string()));

	expect_validation_error(&value, "providers.embedding.api_key must be non-empty.");
}

#[test]
fn retry_attempts_must_be_positive() {
	let mut value = sample_value();

	set_key(&mut value, &["providers", "retry"], "max_attempts", Value::Integer(0));

	expect_validation_error(&value, "providers.retry.max_attempts must be greater than zero.");
}

#[test]
fn retry_backoff_ceiling_must_cover_initial_backoff() {
	let mut value = sample_value();

	set_key(&mut value, &["providers", "retry"], "max_backoff_ms", Value::Integer(100));

	expect_validation_error(&value, "providers.retry.max_backoff_ms must be greater than or equal");
}

#[test]
fn relevance_threshold_must_be_in_unit_range() {
	let mut value = sample_value();

	set_key(&mut value, &["relevance"], "threshold", Value::Float(1.5));

	expect_validation_error(&value, "relevance.threshold must be in the range 0.0-1.0.");
}

#[test]
fn relevance_weights_must_not_both_be_zero() {
	let mut value = sample_value();

	set_key(&mut value, &["relevance"], "keyword_weight", Value::Float(0.0));
	set_key(&mut value, &["relevance"], "semantic_weight", Value::Float(0.0));

	expect_validation_error(&value, "keyword_weight and semantic_weight must not both be zero.");
}

#[test]
fn grounding_threshold_must_be_finite() {
	let mut value = sample_value();

	set_key(&mut value, &["answer"], "grounding_threshold", Value::Float(f64::NAN));

	expect_validation_error(&value, "answer.grounding_threshold must be a finite number.");
}

#[test]
fn missing_file_reports_read_error() {
	let path = env::temp_dir().join("membench_config_test_missing_file.toml");
	let err = membench_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }), "Unexpected error kind: {err:?}");
}

#[test]
fn malformed_file_reports_parse_error() {
	let path = write_temp_config("[service\nlog_level = ".to_string());
	let result = membench_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let err = result.expect_err("Expected parse error.");

	assert!(matches!(err, Error::ParseConfig { .. }), "Unexpected error kind: {err:?}");
}
