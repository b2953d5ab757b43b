use serde::Serialize;

use crate::{
	keywords::{self, KeywordSet},
	metric::{Metric, MetricVector},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct AnswerScores {
	pub semantic_similarity: f64,
	pub exact_match: f64,
	pub keyword_f1: f64,
	pub memory_based: f64,
}
impl AnswerScores {
	/// Copies the scores that belong to the metric vector. `memory_based` is diagnostic only.
	pub fn fill(&self, vector: &mut MetricVector) {
		vector.set(Metric::AnswerSemanticSimilarity, self.semantic_similarity);
		vector.set(Metric::AnswerExactMatch, self.exact_match);
		vector.set(Metric::AnswerKeywordF1, self.keyword_f1);
	}
}

pub fn exact_match(generated: &str, gold: &str) -> f64 {
	if generated.trim().to_lowercase() == gold.trim().to_lowercase() { 1.0 } else { 0.0 }
}

pub fn keyword_f1(generated: &str, gold: &str) -> f64 {
	keyword_set_f1(&keywords::extract_keywords(generated), &keywords::extract_keywords(gold))
}

pub fn keyword_set_f1(generated: &KeywordSet, gold: &KeywordSet) -> f64 {
	if generated.is_empty() || gold.is_empty() {
		return 0.0;
	}

	let common = generated.intersection(gold).count() as f64;
	let precision = common / generated.len() as f64;
	let recall = common / gold.len() as f64;

	if precision + recall > 0.0 { 2.0 * precision * recall / (precision + recall) } else { 0.0 }
}

/// Joins retrieved memory contents the way the grounding check compares them.
pub fn join_memory_text<'a, I>(contents: I) -> String
where
	I: IntoIterator<Item = &'a str>,
{
	contents.into_iter().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn exact_match_ignores_case_and_outer_whitespace() {
		assert_eq!(exact_match("Paris", "  paris "), 1.0);
		assert_eq!(exact_match("Paris, France", "paris"), 0.0);
	}

	#[test]
	fn keyword_f1_handles_partial_overlap() {
		// generated {yellowstone, park}, gold {yellowstone, national, park}.
		let f1 = keyword_f1("Yellowstone park", "Yellowstone National Park");
		let expected = 2.0 * 1.0 * (2.0 / 3.0) / (1.0 + 2.0 / 3.0);

		assert!((f1 - expected).abs() < 1e-12, "Unexpected F1: {f1}");
	}

	#[test]
	fn keyword_f1_is_zero_when_either_side_has_no_keywords() {
		assert_eq!(keyword_f1("", "Yellowstone"), 0.0);
		assert_eq!(keyword_f1("Yellowstone", "it is"), 0.0);
		assert_eq!(keyword_f1("hiking", "Yellowstone"), 0.0);
	}

	#[test]
	fn fill_skips_memory_based() {
		let scores = AnswerScores {
			semantic_similarity: 0.5,
			exact_match: 1.0,
			keyword_f1: 0.25,
			memory_based: 1.0,
		};
		let mut vector = MetricVector::default();

		scores.fill(&mut vector);

		assert_eq!(vector.get(Metric::AnswerSemanticSimilarity), 0.5);
		assert_eq!(vector.get(Metric::AnswerExactMatch), 1.0);
		assert_eq!(vector.get(Metric::AnswerKeywordF1), 0.25);
		assert_eq!(vector.iter().filter(|(_, value)| *value != 0.0).count(), 3);
	}

	#[test]
	fn joins_memory_text_with_single_spaces() {
		assert_eq!(join_memory_text(["a b", "c"]), "a b c");
		assert_eq!(join_memory_text(std::iter::empty()), "");
	}
}
