use std::collections::BTreeMap;

use serde::{Serialize, Serializer, ser::SerializeMap};

use membench_config::{JudgeProviderConfig, RetryPolicy};
use membench_providers::judge::{self, JudgeMode, Verdict};

use crate::{AnswerJudge, BoxFuture, Result, dataset::CategoryId};

/// Judges answers with the configured chat-completions model.
pub struct LlmJudge {
	cfg: JudgeProviderConfig,
	retry: RetryPolicy,
}
impl LlmJudge {
	pub fn new(cfg: JudgeProviderConfig, retry: RetryPolicy) -> Self {
		Self { cfg, retry }
	}
}
impl AnswerJudge for LlmJudge {
	fn judge<'a>(
		&'a self,
		question: &'a str,
		gold_answer: &'a str,
		generated_answer: &'a str,
	) -> BoxFuture<'a, Result<Verdict>> {
		Box::pin(async move {
			Ok(judge::judge(&self.cfg, &self.retry, question, gold_answer, generated_answer)
				.await?)
		})
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct JudgeSummary {
	pub accuracy: f64,
	pub correct: usize,
	pub count: usize,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub mean_score: Option<f64>,
}

/// The `llm_judge` report section.
#[derive(Clone, Debug, PartialEq)]
pub struct JudgeReport {
	pub mode: JudgeMode,
	pub overall: JudgeSummary,
	pub categories: BTreeMap<CategoryId, JudgeSummary>,
}
impl Serialize for JudgeReport {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut map = serializer.serialize_map(Some(self.categories.len() + 2))?;

		map.serialize_entry("mode", &self.mode)?;
		map.serialize_entry("overall", &self.overall)?;

		for (category, summary) in &self.categories {
			map.serialize_entry(&category.report_key(), summary)?;
		}

		map.end()
	}
}

/// Verdict counts for the overall run and per category.
#[derive(Clone, Debug, Default)]
pub struct JudgeTally {
	overall: VerdictCounts,
	categories: BTreeMap<CategoryId, VerdictCounts>,
}
impl JudgeTally {
	pub fn record(&mut self, category: &CategoryId, verdict: &Verdict) {
		self.overall.record(verdict);
		self.categories.entry(category.clone()).or_default().record(verdict);
	}

	pub fn merge(&mut self, other: JudgeTally) {
		self.overall.merge(&other.overall);

		for (category, counts) in other.categories {
			self.categories.entry(category).or_default().merge(&counts);
		}
	}

	pub fn summarize(&self, mode: JudgeMode) -> JudgeReport {
		JudgeReport {
			mode,
			overall: self.overall.summary(),
			categories: self
				.categories
				.iter()
				.map(|(category, counts)| (category.clone(), counts.summary()))
				.collect(),
		}
	}
}

#[derive(Clone, Copy, Debug, Default)]
struct VerdictCounts {
	correct: usize,
	count: usize,
	scored: usize,
	score_total: u64,
}
impl VerdictCounts {
	fn record(&mut self, verdict: &Verdict) {
		self.count += 1;

		if verdict.correct {
			self.correct += 1;
		}
		if let Some(score) = verdict.score {
			self.scored += 1;
			self.score_total += u64::from(score);
		}
	}

	fn merge(&mut self, other: &VerdictCounts) {
		self.correct += other.correct;
		self.count += other.count;
		self.scored += other.scored;
		self.score_total += other.score_total;
	}

	fn summary(&self) -> JudgeSummary {
		let accuracy = if self.count == 0 { 0.0 } else { self.correct as f64 / self.count as f64 };
		let mean_score = (self.scored > 0).then(|| self.score_total as f64 / self.scored as f64);

		JudgeSummary { accuracy, correct: self.correct, count: self.count, mean_score }
	}
}
