use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use membench_config::{JudgeProviderConfig, RetryPolicy};

use crate::{Error, Result, retry};

const BINARY_PROMPT: &str = "\
Label a generated answer to a question as CORRECT or WRONG.

The question asks about something one speaker should remember about the other from their past \
conversations. The gold answer is short. The generated answer may be longer; be generous: if it \
refers to the same topic, entity, or point in time as the gold answer it is CORRECT, even when \
the wording or date format differs.

Question: {question}
Gold answer: {gold_answer}
Generated answer: {generated_answer}

Respond with a JSON object whose only key is \"label\" and whose value is \"CORRECT\" or \
\"WRONG\".";

const GRADED_PROMPT: &str = "\
Grade a generated answer against a gold answer on an integer scale from 0 to 5.

5: all key information, no errors. 4: all key information, minor phrasing differences. \
3: main point correct, some details missing. 2: right topic, key details missing or partly \
wrong. 1: related but mostly incorrect. 0: wrong, unrelated, or a non-answer such as \"I don't \
know\".

Dates must refer to the same day or period; format differences are fine. Quantities must match \
when the gold answer is exact. List answers need every item for a 5.

Question: {question}
Gold answer: {gold_answer}
Generated answer: {generated_answer}

Respond with a JSON object: {\"score\": <0-5>, \"explanation\": \"<one sentence>\", \
\"confidence\": \"high\" | \"medium\" | \"low\"}.";

const GRADED_SYSTEM: &str = "You are an expert evaluator. Always respond with valid JSON.";

pub const MAX_GRADE: u8 = 5;
pub const PASSING_GRADE: u8 = 3;
pub const MIN_PASSING_CONFIDENCE: f64 = 0.5;

static JSON_OBJECT: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\{[^{}]*\}").expect("JSON object pattern must compile."));

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgeMode {
	Binary,
	Graded,
}
impl JudgeMode {
	pub fn parse(raw: &str) -> Result<Self> {
		match raw {
			"binary" => Ok(Self::Binary),
			"graded" => Ok(Self::Graded),
			other => Err(Error::InvalidConfig { message: format!("Unknown judge mode {other}.") }),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Verdict {
	pub correct: bool,
	/// Graded mode only, `0..=5`.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub score: Option<u8>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub confidence: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub explanation: Option<String>,
}

pub async fn judge(
	cfg: &JudgeProviderConfig,
	policy: &RetryPolicy,
	question: &str,
	gold_answer: &str,
	generated_answer: &str,
) -> Result<Verdict> {
	let mode = JudgeMode::parse(&cfg.mode)?;
	let messages = build_messages(mode, question, gold_answer, generated_answer);
	let client = crate::http_client(cfg.timeout_ms)?;
	let url = crate::endpoint(&cfg.api_base, &cfg.path);
	let headers = crate::auth_headers(&cfg.api_key, &cfg.default_headers)?;
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": messages,
		"response_format": { "type": "json_object" },
	});

	retry::with_retry(policy, "judge", || async {
		let res = client.post(&url).headers(headers.clone()).json(&body).send().await?;
		let json: Value = res.error_for_status()?.json().await?;
		let content = response_content(&json)?;
		let parsed = extract_json(content)?;

		match mode {
			JudgeMode::Binary => parse_binary(&parsed),
			JudgeMode::Graded => parse_graded(&parsed),
		}
	})
	.await
}

pub fn build_messages(
	mode: JudgeMode,
	question: &str,
	gold_answer: &str,
	generated_answer: &str,
) -> Vec<Value> {
	let template = match mode {
		JudgeMode::Binary => BINARY_PROMPT,
		JudgeMode::Graded => GRADED_PROMPT,
	};
	let prompt = template
		.replace("{question}", question)
		.replace("{gold_answer}", gold_answer)
		.replace("{generated_answer}", generated_answer);
	let mut messages = Vec::with_capacity(2);

	if mode == JudgeMode::Graded {
		messages.push(serde_json::json!({ "role": "system", "content": GRADED_SYSTEM }));
	}

	messages.push(serde_json::json!({ "role": "user", "content": prompt }));

	messages
}

fn response_content(json: &Value) -> Result<&str> {
	json.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.ok_or_else(|| Error::invalid_response("Judge response is missing message content."))
}

/// Parses the whole content as JSON, falling back to the first flat `{...}` object in it.
fn extract_json(content: &str) -> Result<Value> {
	if let Ok(parsed @ Value::Object(_)) = serde_json::from_str::<Value>(content) {
		return Ok(parsed);
	}

	let Some(found) = JSON_OBJECT.find(content) else {
		return Err(Error::invalid_response("Judge content has no JSON object."));
	};

	Ok(serde_json::from_str(found.as_str())?)
}

fn parse_binary(parsed: &Value) -> Result<Verdict> {
	let label = parsed
		.get("label")
		.and_then(|v| v.as_str())
		.ok_or_else(|| Error::invalid_response("Judge JSON is missing label."))?;

	Ok(Verdict {
		correct: label.trim().eq_ignore_ascii_case("correct"),
		score: None,
		confidence: None,
		explanation: None,
	})
}

fn parse_graded(parsed: &Value) -> Result<Verdict> {
	let raw_score = match parsed.get("score") {
		Some(Value::Number(number)) => number.as_f64(),
		Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
		_ => None,
	}
	.ok_or_else(|| Error::invalid_response("Judge JSON is missing a numeric score."))?;
	let score = raw_score.trunc().clamp(0.0, MAX_GRADE as f64) as u8;
	let confidence = match parsed.get("confidence").and_then(|v| v.as_str()) {
		Some("high") => 0.9,
		Some("low") => 0.5,
		_ => 0.7,
	};
	let explanation = parsed.get("explanation").and_then(|v| v.as_str()).map(str::to_string);

	Ok(Verdict {
		correct: score >= PASSING_GRADE && confidence >= MIN_PASSING_CONFIDENCE,
		score: Some(score),
		confidence: Some(confidence),
		explanation,
	})
}
