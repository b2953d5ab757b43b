//! Gold dataset and results file formats, and the join that turns a result record into an
//! [`EvaluationRequest`].

use std::{cmp::Ordering, fmt, fs, path::Path};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

use crate::{Error, Result};

/// Category id as written in the dataset. Numeric ids sort numerically and before any other id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CategoryId(String);
impl CategoryId {
	pub fn new(raw: impl Into<String>) -> Self {
		let raw = raw.into();
		let trimmed = raw.trim();

		if trimmed.is_empty() { Self::default() } else { Self(trimmed.to_string()) }
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Top-level report key, `category_<id>`.
	pub fn report_key(&self) -> String {
		format!("category_{}", self.0)
	}

	fn numeric(&self) -> Option<u64> {
		self.0.parse().ok()
	}
}
impl Default for CategoryId {
	fn default() -> Self {
		Self("0".to_string())
	}
}
impl Ord for CategoryId {
	fn cmp(&self, other: &Self) -> Ordering {
		match (self.numeric(), other.numeric()) {
			(Some(lhs), Some(rhs)) => lhs.cmp(&rhs).then_with(|| self.0.cmp(&other.0)),
			(Some(_), None) => Ordering::Less,
			(None, Some(_)) => Ordering::Greater,
			(None, None) => self.0.cmp(&other.0),
		}
	}
}
impl PartialOrd for CategoryId {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}
impl fmt::Display for CategoryId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}
impl<'de> Deserialize<'de> for CategoryId {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = match Scalar::deserialize(deserializer)? {
			Scalar::Number(number) => integral_number_text(&number),
			scalar => String::from(scalar),
		};

		Ok(Self::new(raw))
	}
}

/// One retrieved memory. Position in the retrieved list is its rank.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawMemoryItem")]
pub struct MemoryItem {
	pub content: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub timestamp: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub score: Option<f64>,
}
impl MemoryItem {
	pub fn new(content: impl Into<String>) -> Self {
		Self { content: content.into(), timestamp: None, score: None }
	}
}

/// One entry of a results file.
#[derive(Clone, Debug, Deserialize)]
pub struct ResultRecord {
	pub question: String,
	#[serde(default, deserialize_with = "optional_text")]
	pub answer: Option<String>,
	#[serde(default)]
	pub category: Option<CategoryId>,
	#[serde(default, deserialize_with = "optional_text")]
	pub response: Option<String>,
	#[serde(default, deserialize_with = "memory_list")]
	pub speaker_1_memories: Vec<MemoryItem>,
	#[serde(default, deserialize_with = "memory_list")]
	pub speaker_2_memories: Vec<MemoryItem>,
}

/// A results file: conversation index (as a string) to the records answered for it.
#[derive(Clone, Debug, Default)]
pub struct ResultsFile {
	conversations: Map<String, Value>,
}
impl ResultsFile {
	pub fn from_value(value: Value) -> Result<Self> {
		match value {
			Value::Object(conversations) => Ok(Self { conversations }),
			other => Err(Error::InvalidInput {
				kind: "results",
				message: format!(
					"expected an object keyed by conversation index, got {}.",
					json_kind(&other)
				),
			}),
		}
	}

	/// Entries in conversation-index order. Keys that are not indices come last, in key order.
	pub fn conversations(&self) -> Vec<(&str, &Value)> {
		let mut entries: Vec<(&str, &Value)> =
			self.conversations.iter().map(|(key, value)| (key.as_str(), value)).collect();

		entries.sort_by_key(|(key, _)| (key.trim().parse::<usize>().map_err(|_| *key), *key));

		entries
	}

	pub fn len(&self) -> usize {
		self.conversations.len()
	}

	pub fn is_empty(&self) -> bool {
		self.conversations.is_empty()
	}
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct GoldDataset {
	pub conversations: Vec<GoldConversation>,
}
impl GoldDataset {
	pub fn get(&self, index: usize) -> Option<&GoldConversation> {
		self.conversations.get(index)
	}

	pub fn len(&self) -> usize {
		self.conversations.len()
	}

	pub fn is_empty(&self) -> bool {
		self.conversations.is_empty()
	}
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct GoldConversation {
	#[serde(default)]
	pub conversation: Value,
	#[serde(default)]
	pub qa: Vec<GoldQa>,
}
impl GoldConversation {
	pub fn find_qa(&self, question: &str) -> Option<&GoldQa> {
		let question = question.trim();

		self.qa.iter().find(|qa| qa.question.trim() == question)
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct GoldQa {
	pub question: String,
	#[serde(default, deserialize_with = "optional_text")]
	pub answer: Option<String>,
	#[serde(default)]
	pub category: Option<CategoryId>,
	#[serde(default)]
	pub evidence: Vec<String>,
	#[serde(default, deserialize_with = "optional_text")]
	pub adversarial_answer: Option<String>,
}

/// Everything needed to score one question.
#[derive(Clone, Debug)]
pub struct EvaluationRequest {
	pub conversation: usize,
	pub question: String,
	pub gold_answer: String,
	pub generated_answer: String,
	pub retrieved_memories: Vec<MemoryItem>,
	pub category: CategoryId,
}
impl EvaluationRequest {
	/// Joins a result record with its gold conversation. A missing answer or category is taken
	/// from the gold QA entry with the same question text.
	pub fn from_record(conversation: usize, record: ResultRecord, gold: &GoldConversation) -> Self {
		let gold_qa = gold.find_qa(&record.question);
		let gold_answer = record
			.answer
			.or_else(|| gold_qa.and_then(|qa| qa.answer.clone()))
			.unwrap_or_default();
		let category = record
			.category
			.or_else(|| gold_qa.and_then(|qa| qa.category.clone()))
			.unwrap_or_default();
		let mut retrieved_memories = record.speaker_1_memories;

		retrieved_memories.extend(record.speaker_2_memories);

		Self {
			conversation,
			question: record.question,
			gold_answer,
			generated_answer: record.response.unwrap_or_default(),
			retrieved_memories,
			category,
		}
	}
}

pub fn load_dataset(path: &Path) -> Result<GoldDataset> {
	let raw = fs::read_to_string(path).map_err(|err| Error::ReadInput {
		kind: "dataset",
		path: path.to_path_buf(),
		source: err,
	})?;

	serde_json::from_str(&raw).map_err(|err| Error::ParseInput {
		kind: "dataset",
		path: path.to_path_buf(),
		source: err,
	})
}

pub fn load_results(path: &Path) -> Result<ResultsFile> {
	let raw = fs::read_to_string(path).map_err(|err| Error::ReadInput {
		kind: "results",
		path: path.to_path_buf(),
		source: err,
	})?;
	let value: Value = serde_json::from_str(&raw).map_err(|err| Error::ParseInput {
		kind: "results",
		path: path.to_path_buf(),
		source: err,
	})?;

	ResultsFile::from_value(value)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
	Text(String),
	Number(Number),
}
impl From<Scalar> for String {
	fn from(scalar: Scalar) -> Self {
		match scalar {
			Scalar::Text(text) => text,
			Scalar::Number(number) => number.to_string(),
		}
	}
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMemoryItem {
	Text(String),
	Record {
		#[serde(default, deserialize_with = "optional_text")]
		memory: Option<String>,
		#[serde(default, deserialize_with = "optional_text")]
		content: Option<String>,
		#[serde(default, deserialize_with = "optional_text")]
		timestamp: Option<String>,
		#[serde(default)]
		score: Option<f64>,
	},
}
impl From<RawMemoryItem> for MemoryItem {
	fn from(raw: RawMemoryItem) -> Self {
		match raw {
			RawMemoryItem::Text(content) => Self::new(content),
			RawMemoryItem::Record { memory, content, timestamp, score } => {
				// `memory` wins when both keys are present and it is non-empty.
				let content =
					memory.filter(|text| !text.is_empty()).or(content).unwrap_or_default();

				Self { content, timestamp, score }
			},
		}
	}
}

/// `1.0` and `1` name the same category.
fn integral_number_text(number: &Number) -> String {
	match number.as_f64() {
		Some(value) if number.is_f64() && value.fract() == 0.0 && value.abs() < 1e15 =>
			(value as i64).to_string(),
		_ => number.to_string(),
	}
}

fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
	D: Deserializer<'de>,
{
	Option::<Scalar>::deserialize(deserializer).map(|scalar| scalar.map(String::from))
}

fn memory_list<'de, D>(deserializer: D) -> Result<Vec<MemoryItem>, D::Error>
where
	D: Deserializer<'de>,
{
	Option::<Vec<MemoryItem>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn json_kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "an array",
		Value::Object(_) => "an object",
	}
}
