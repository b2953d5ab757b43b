use serde::{Deserialize, Serialize};
use serde_json::Value;

use membench_domain::{metric::MetricVector, ranking};
use membench_providers::judge::Verdict;

use crate::{
	Evaluator,
	aggregate::{Accumulator, Report},
	answer,
	dataset::{CategoryId, EvaluationRequest, GoldDataset, ResultRecord, ResultsFile},
	relevance,
};

/// Scores for one evaluated question, as written to the details file.
#[derive(Clone, Debug, Serialize)]
pub struct QuestionOutcome {
	pub conversation: usize,
	pub question: String,
	pub category: CategoryId,
	pub retrieved: usize,
	pub metrics: MetricVector,
	pub memory_based: f64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub verdict: Option<Verdict>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
	/// Conversations in the results file that matched the dataset.
	pub conversations: usize,
	pub evaluated: usize,
	pub skipped: usize,
}

#[derive(Debug)]
pub struct Evaluation {
	pub report: Report,
	pub stats: RunStats,
	pub questions: Vec<QuestionOutcome>,
}

impl Evaluator {
	pub async fn evaluate_question(&self, request: &EvaluationRequest) -> QuestionOutcome {
		let oracle = self.providers.similarity.as_ref();
		let mask = relevance::relevance_mask(
			oracle,
			&self.cfg.relevance,
			&request.retrieved_memories,
			&request.gold_answer,
			&request.question,
		)
		.await;
		let scores = answer::score_answer(
			oracle,
			&self.cfg.answer,
			&request.generated_answer,
			&request.gold_answer,
			&request.retrieved_memories,
		)
		.await;
		let mut metrics = MetricVector::default();

		ranking::fill_ranking_metrics(&mut metrics, &mask);
		scores.fill(&mut metrics);

		let verdict = self.judge_request(request).await;

		tracing::debug!(
			conversation = request.conversation,
			category = %request.category,
			retrieved = mask.len(),
			relevant = mask.iter().filter(|hit| **hit).count(),
			"Evaluated question."
		);

		QuestionOutcome {
			conversation: request.conversation,
			question: request.question.clone(),
			category: request.category.clone(),
			retrieved: request.retrieved_memories.len(),
			metrics,
			memory_based: scores.memory_based,
			verdict,
		}
	}

	/// Evaluates every result whose conversation exists in `gold`. Bad entries are skipped.
	pub async fn evaluate_dataset(&self, results: &ResultsFile, gold: &GoldDataset) -> Evaluation {
		let mut accumulator = Accumulator::default();
		let mut stats = RunStats::default();
		let mut questions = Vec::new();

		for (key, entries) in results.conversations() {
			let Some((index, conversation)) =
				key.trim().parse::<usize>().ok().and_then(|idx| Some((idx, gold.get(idx)?)))
			else {
				let skipped = entries.as_array().map(Vec::len).unwrap_or(1);

				tracing::warn!(
					conversation = key,
					dataset_len = gold.len(),
					skipped,
					"Conversation index is not in the dataset. Skipping its results."
				);

				stats.skipped += skipped;

				continue;
			};
			let Some(entries) = entries.as_array() else {
				tracing::warn!(conversation = index, "Conversation results are not an array.");

				stats.skipped += 1;

				continue;
			};
			let mut local = Accumulator::default();

			stats.conversations += 1;

			for (position, entry) in entries.iter().enumerate() {
				let Some(record) = parse_record(index, position, entry) else {
					stats.skipped += 1;

					continue;
				};
				let request = EvaluationRequest::from_record(index, record, conversation);
				let outcome = self.evaluate_question(&request).await;

				local.push(&outcome.category, outcome.metrics.clone());

				if let Some(verdict) = &outcome.verdict {
					local.push_verdict(&outcome.category, verdict);
				}

				questions.push(outcome);
			}

			stats.evaluated += local.len();

			accumulator.merge(local);
		}

		tracing::info!(
			conversations = stats.conversations,
			evaluated = stats.evaluated,
			skipped = stats.skipped,
			"Evaluation finished."
		);

		Evaluation { report: accumulator.summarize(self.judge_mode()), stats, questions }
	}

	async fn judge_request(&self, request: &EvaluationRequest) -> Option<Verdict> {
		let judge = self.providers.judge.as_ref()?;

		if !self.judges_category(&request.category) {
			return None;
		}

		match judge
			.judge(&request.question, &request.gold_answer, &request.generated_answer)
			.await
		{
			Ok(verdict) => Some(verdict),
			Err(err) => {
				tracing::warn!(
					error = %err,
					conversation = request.conversation,
					"Judge failed. Excluding question from judge totals."
				);

				None
			},
		}
	}
}

fn parse_record(conversation: usize, position: usize, entry: &Value) -> Option<ResultRecord> {
	match ResultRecord::deserialize(entry) {
		Ok(record) => Some(record),
		Err(err) => {
			tracing::warn!(
				error = %err,
				conversation,
				position,
				"Malformed result entry. Skipping."
			);

			None
		},
	}
}
