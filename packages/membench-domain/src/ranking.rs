//! Ranking metrics over a relevance mask.
//!
//! `relevant[i]` is the judgment for the item at rank `i + 1`. Every function returns `0.0` for an
//! empty mask.

use crate::metric::{Metric, MetricVector};

pub const RECALL_DEPTHS: [(Metric, usize); 4] = [
	(Metric::RecallAt1, 1),
	(Metric::RecallAt3, 3),
	(Metric::RecallAt5, 5),
	(Metric::RecallAt10, 10),
];
pub const PRECISION_DEPTHS: [(Metric, usize); 3] =
	[(Metric::PrecisionAt1, 1), (Metric::PrecisionAt3, 3), (Metric::PrecisionAt5, 5)];
pub const NDCG_DEPTHS: [(Metric, usize); 2] = [(Metric::NdcgAt5, 5), (Metric::NdcgAt10, 10)];

/// 1.0 when any of the first `k` items is relevant.
pub fn recall_at_k(relevant: &[bool], k: usize) -> f64 {
	if relevant.iter().take(k).any(|hit| *hit) { 1.0 } else { 0.0 }
}

/// Relevant items in the first `k`, divided by the window actually available.
pub fn precision_at_k(relevant: &[bool], k: usize) -> f64 {
	let window = k.min(relevant.len());

	if window == 0 {
		return 0.0;
	}

	let hits = relevant.iter().take(window).filter(|hit| **hit).count();

	hits as f64 / window as f64
}

/// Reciprocal of the 1-indexed rank of the first relevant item over the whole list.
pub fn reciprocal_rank(relevant: &[bool]) -> f64 {
	relevant.iter().position(|hit| *hit).map(|idx| 1.0 / (idx + 1) as f64).unwrap_or(0.0)
}

/// Binary-gain NDCG. The ideal ordering assumes every position in the window is relevant.
pub fn ndcg_at_k(relevant: &[bool], k: usize) -> f64 {
	let window = k.min(relevant.len());
	let mut dcg = 0.0_f64;
	let mut idcg = 0.0_f64;

	for (idx, hit) in relevant.iter().take(window).enumerate() {
		let discount = 1.0 / rank_discount(idx + 1);

		idcg += discount;

		if *hit {
			dcg += discount;
		}
	}

	if idcg > 0.0 { (dcg / idcg).clamp(0.0, 1.0) } else { 0.0 }
}

/// Fills every ranking entry of `vector` from `relevant`. Answer entries are left untouched.
pub fn fill_ranking_metrics(vector: &mut MetricVector, relevant: &[bool]) {
	for (metric, k) in RECALL_DEPTHS {
		vector.set(metric, recall_at_k(relevant, k));
	}
	for (metric, k) in PRECISION_DEPTHS {
		vector.set(metric, precision_at_k(relevant, k));
	}

	vector.set(Metric::Mrr, reciprocal_rank(relevant));

	for (metric, k) in NDCG_DEPTHS {
		vector.set(metric, ndcg_at_k(relevant, k));
	}
}

fn rank_discount(rank: usize) -> f64 {
	(rank as f64 + 1.0).log2()
}
