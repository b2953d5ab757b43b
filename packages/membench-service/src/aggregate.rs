use std::collections::BTreeMap;

use serde::{Serialize, Serializer, ser::SerializeMap};

use membench_domain::{
	metric::{Metric, MetricVector},
	stats::{self, StatSummary},
};
use membench_providers::judge::{JudgeMode, Verdict};

use crate::{
	dataset::CategoryId,
	judge::{JudgeReport, JudgeTally},
};

pub type MetricSummaries = BTreeMap<Metric, StatSummary>;

/// Metric vectors in processing order, overall and per category.
#[derive(Clone, Debug, Default)]
pub struct Accumulator {
	overall: Vec<MetricVector>,
	categories: BTreeMap<CategoryId, Vec<MetricVector>>,
	judge: JudgeTally,
}
impl Accumulator {
	pub fn push(&mut self, category: &CategoryId, vector: MetricVector) {
		self.categories.entry(category.clone()).or_default().push(vector.clone());
		self.overall.push(vector);
	}

	pub fn push_verdict(&mut self, category: &CategoryId, verdict: &Verdict) {
		self.judge.record(category, verdict);
	}

	/// Appends `other` after the samples already held.
	pub fn merge(&mut self, other: Accumulator) {
		self.overall.extend(other.overall);

		for (category, vectors) in other.categories {
			self.categories.entry(category).or_default().extend(vectors);
		}

		self.judge.merge(other.judge);
	}

	pub fn len(&self) -> usize {
		self.overall.len()
	}

	pub fn is_empty(&self) -> bool {
		self.overall.is_empty()
	}

	/// The overall bucket carries confidence intervals; category buckets do not. `judge_mode`
	/// adds the `llm_judge` section.
	pub fn summarize(&self, judge_mode: Option<JudgeMode>) -> Report {
		Report {
			overall: summarize_bucket(&self.overall, true),
			categories: self
				.categories
				.iter()
				.filter(|(_, vectors)| !vectors.is_empty())
				.map(|(category, vectors)| (category.clone(), summarize_bucket(vectors, false)))
				.collect(),
			llm_judge: judge_mode.map(|mode| self.judge.summarize(mode)),
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Report {
	pub overall: MetricSummaries,
	pub categories: BTreeMap<CategoryId, MetricSummaries>,
	pub llm_judge: Option<JudgeReport>,
}
impl Report {
	pub fn category(&self, id: &str) -> Option<&MetricSummaries> {
		self.categories.get(&CategoryId::new(id))
	}
}
impl Serialize for Report {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut map = serializer.serialize_map(None)?;

		map.serialize_entry("overall", &self.overall)?;

		for (category, summaries) in &self.categories {
			map.serialize_entry(&category.report_key(), summaries)?;
		}

		if let Some(judge) = &self.llm_judge {
			map.serialize_entry("llm_judge", judge)?;
		}

		map.end()
	}
}

fn summarize_bucket(vectors: &[MetricVector], with_confidence_interval: bool) -> MetricSummaries {
	let mut summaries = MetricSummaries::new();

	for metric in Metric::ALL {
		let values: Vec<f64> = vectors.iter().map(|vector| vector.get(metric)).collect();

		if let Some(summary) = stats::summarize(&values, with_confidence_interval) {
			summaries.insert(metric, summary);
		}
	}

	summaries
}
