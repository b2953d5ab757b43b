use membench_config::Answer;
use membench_domain::answer::{self, AnswerScores};

use crate::{SimilarityOracle, dataset::MemoryItem, similarity};

pub async fn score_answer(
	oracle: &dyn SimilarityOracle,
	cfg: &Answer,
	generated: &str,
	gold: &str,
	retrieved: &[MemoryItem],
) -> AnswerScores {
	let semantic_similarity = similarity::similarity_or_zero(oracle, generated, gold).await;
	let memory_based = if retrieved.is_empty() {
		0.0
	} else {
		let memory_text = answer::join_memory_text(retrieved.iter().map(|m| m.content.as_str()));
		let grounding = similarity::similarity_or_zero(oracle, generated, &memory_text).await;

		if grounding > cfg.grounding_threshold { 1.0 } else { 0.0 }
	};

	AnswerScores {
		semantic_similarity,
		exact_match: answer::exact_match(generated, gold),
		keyword_f1: answer::keyword_f1(generated, gold),
		memory_based,
	}
}
