use serde::Serialize;

use membench_config::Relevance;

use crate::keywords::{self, KeywordSet};

/// Keyword sets shared by every memory judged for one question.
#[derive(Clone, Debug)]
pub struct QueryKeywords {
	pub answer: KeywordSet,
	pub question: KeywordSet,
	union_len: usize,
}
impl QueryKeywords {
	pub fn new(gold_answer: &str, question: &str) -> Self {
		let answer = keywords::extract_keywords(gold_answer);
		let question = keywords::extract_keywords(question);
		let union_len = answer.union(&question).count();

		Self { answer, question, union_len }
	}

	/// Answer overlap plus question overlap with the memory keywords, over the size of the
	/// answer/question union. A keyword present in both the answer and the question counts
	/// twice, so the score can exceed 1.0.
	pub fn keyword_score(&self, memory_content: &str) -> f64 {
		let memory = keywords::extract_keywords(memory_content);
		let answer_overlap = self.answer.intersection(&memory).count();
		let question_overlap = self.question.intersection(&memory).count();

		(answer_overlap + question_overlap) as f64 / self.union_len.max(1) as f64
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RelevanceScore {
	pub keyword: f64,
	pub semantic: f64,
	pub combined: f64,
}
impl RelevanceScore {
	pub fn new(keyword: f64, semantic: f64, cfg: &Relevance) -> Self {
		let combined = cfg.keyword_weight * keyword + cfg.semantic_weight * semantic;

		Self { keyword, semantic, combined }
	}

	pub fn is_relevant(&self, cfg: &Relevance) -> bool {
		self.combined >= cfg.threshold
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn keyword_score_counts_both_overlaps() {
		// answer {yellowstone, national, park}, question {bob, hiking}, memory hits 1 + 2.
		let query = QueryKeywords::new("Yellowstone National Park", "Where did Bob go hiking?");
		let score = query.keyword_score("Bob went hiking in Yellowstone");

		assert!((score - 0.6).abs() < 1e-12, "Unexpected keyword score: {score}");
	}

	#[test]
	fn shared_keywords_are_not_deduplicated_across_overlaps() {
		let query = QueryKeywords::new("Yellowstone", "Yellowstone trip?");
		let score = query.keyword_score("Yellowstone");

		// union {yellowstone, trip} = 2; overlaps 1 + 1.
		assert!((score - 1.0).abs() < 1e-12, "Unexpected keyword score: {score}");
	}

	#[test]
	fn empty_query_keywords_never_divide_by_zero() {
		let query = QueryKeywords::new("", "what is it?");

		assert_eq!(query.keyword_score("anything at all"), 0.0);
	}

	#[test]
	fn threshold_is_inclusive() {
		let cfg = Relevance { keyword_weight: 0.6, semantic_weight: 0.4, threshold: 0.3 };
		let score = RelevanceScore::new(0.5, 0.0, &cfg);

		assert!((score.combined - 0.3).abs() < 1e-12);
		assert!(score.is_relevant(&cfg));
		assert!(!RelevanceScore::new(0.0, 0.7, &cfg).is_relevant(&cfg));
	}
}
