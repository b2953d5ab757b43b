use membench_config::Relevance;
use membench_domain::relevance::{QueryKeywords, RelevanceScore};

use crate::{SimilarityOracle, dataset::MemoryItem, similarity};

/// Scores one memory against the gold answer and question.
pub async fn score_memory(
	oracle: &dyn SimilarityOracle,
	cfg: &Relevance,
	query: &QueryKeywords,
	memory: &MemoryItem,
	gold_answer: &str,
) -> RelevanceScore {
	let keyword = query.keyword_score(&memory.content);
	let semantic = similarity::similarity_or_zero(oracle, &memory.content, gold_answer).await;

	RelevanceScore::new(keyword, semantic, cfg)
}

pub async fn is_relevant(
	oracle: &dyn SimilarityOracle,
	cfg: &Relevance,
	memory: &MemoryItem,
	gold_answer: &str,
	question: &str,
) -> bool {
	let query = QueryKeywords::new(gold_answer, question);

	score_memory(oracle, cfg, &query, memory, gold_answer).await.is_relevant(cfg)
}

/// Judges every retrieved memory once, in rank order.
pub async fn relevance_mask(
	oracle: &dyn SimilarityOracle,
	cfg: &Relevance,
	memories: &[MemoryItem],
	gold_answer: &str,
	question: &str,
) -> Vec<bool> {
	let query = QueryKeywords::new(gold_answer, question);
	let mut mask = Vec::with_capacity(memories.len());

	for memory in memories {
		let score = score_memory(oracle, cfg, &query, memory, gold_answer).await;

		tracing::trace!(
			keyword = score.keyword,
			semantic = score.semantic,
			combined = score.combined,
			"Scored retrieved memory."
		);
		mask.push(score.is_relevant(cfg));
	}

	mask
}
