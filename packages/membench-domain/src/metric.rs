use std::fmt;

use serde::Serialize;

/// The closed set of per-question scores. Declaration order is report order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Metric {
	#[serde(rename = "recall_at_1")]
	RecallAt1,
	#[serde(rename = "recall_at_3")]
	RecallAt3,
	#[serde(rename = "recall_at_5")]
	RecallAt5,
	#[serde(rename = "recall_at_10")]
	RecallAt10,
	#[serde(rename = "precision_at_1")]
	PrecisionAt1,
	#[serde(rename = "precision_at_3")]
	PrecisionAt3,
	#[serde(rename = "precision_at_5")]
	PrecisionAt5,
	#[serde(rename = "mrr")]
	Mrr,
	#[serde(rename = "ndcg_at_5")]
	NdcgAt5,
	#[serde(rename = "ndcg_at_10")]
	NdcgAt10,
	#[serde(rename = "answer_semantic_similarity")]
	AnswerSemanticSimilarity,
	#[serde(rename = "answer_exact_match")]
	AnswerExactMatch,
	#[serde(rename = "answer_keyword_f1")]
	AnswerKeywordF1,
}
impl Metric {
	pub const COUNT: usize = 13;
	pub const ALL: [Metric; Self::COUNT] = [
		Self::RecallAt1,
		Self::RecallAt3,
		Self::RecallAt5,
		Self::RecallAt10,
		Self::PrecisionAt1,
		Self::PrecisionAt3,
		Self::PrecisionAt5,
		Self::Mrr,
		Self::NdcgAt5,
		Self::NdcgAt10,
		Self::AnswerSemanticSimilarity,
		Self::AnswerExactMatch,
		Self::AnswerKeywordF1,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::RecallAt1 => "recall_at_1",
			Self::RecallAt3 => "recall_at_3",
			Self::RecallAt5 => "recall_at_5",
			Self::RecallAt10 => "recall_at_10",
			Self::PrecisionAt1 => "precision_at_1",
			Self::PrecisionAt3 => "precision_at_3",
			Self::PrecisionAt5 => "precision_at_5",
			Self::Mrr => "mrr",
			Self::NdcgAt5 => "ndcg_at_5",
			Self::NdcgAt10 => "ndcg_at_10",
			Self::AnswerSemanticSimilarity => "answer_semantic_similarity",
			Self::AnswerExactMatch => "answer_exact_match",
			Self::AnswerKeywordF1 => "answer_keyword_f1",
		}
	}

	/// Ranking metrics are zero-filled when nothing was retrieved.
	pub fn is_ranking(self) -> bool {
		!matches!(
			self,
			Self::AnswerSemanticSimilarity | Self::AnswerExactMatch | Self::AnswerKeywordF1
		)
	}

	fn index(self) -> usize {
		self as usize
	}
}
impl fmt::Display for Metric {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One value per [`Metric`]. Every vector carries the full key set; unset entries are `0.0`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetricVector {
	values: [f64; Metric::COUNT],
}
impl MetricVector {
	pub fn get(&self, metric: Metric) -> f64 {
		self.values[metric.index()]
	}

	pub fn set(&mut self, metric: Metric, value: f64) {
		self.values[metric.index()] = value;
	}

	pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
		Metric::ALL.into_iter().map(|metric| (metric, self.get(metric)))
	}
}
impl Serialize for MetricVector {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		use serde::ser::SerializeMap;

		let mut map = serializer.serialize_map(Some(Metric::COUNT))?;

		for (metric, value) in self.iter() {
			map.serialize_entry(metric.as_str(), &value)?;
		}

		map.end()
	}
}
