use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

pub const CONFIDENCE_LEVEL: f64 = 0.95;

/// Batch statistics over one metric's full sample.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatSummary {
	pub mean: f64,
	/// Population standard deviation; `0.0` for a single sample.
	pub std: f64,
	pub median: f64,
	pub min: f64,
	pub max: f64,
	pub count: usize,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub confidence_interval_95: Option<(f64, f64)>,
}

/// Returns `None` for an empty sample so callers can omit the metric entirely.
pub fn summarize(values: &[f64], with_confidence_interval: bool) -> Option<StatSummary> {
	if values.is_empty() {
		return None;
	}

	let mut sorted = values.to_vec();

	sorted.sort_by(|a, b| a.total_cmp(b));

	let mean = mean(values);
	let confidence_interval_95 =
		with_confidence_interval.then(|| confidence_interval(values, CONFIDENCE_LEVEL));

	Some(StatSummary {
		mean,
		std: population_std(values, mean),
		median: median_of_sorted(&sorted),
		min: sorted[0],
		max: sorted[sorted.len() - 1],
		count: values.len(),
		confidence_interval_95,
	})
}

pub fn mean(values: &[f64]) -> f64 {
	if values.is_empty() {
		return 0.0;
	}

	values.iter().sum::<f64>() / values.len() as f64
}

/// Two-sided Student-t interval around the mean with `n - 1` degrees of freedom.
///
/// Fewer than two samples give the degenerate `(0.0, 0.0)`.
pub fn confidence_interval(values: &[f64], level: f64) -> (f64, f64) {
	let n = values.len();

	if n < 2 {
		return (0.0, 0.0);
	}
	if values.iter().all(|value| *value == values[0]) {
		return (values[0], values[0]);
	}

	let mean = mean(values);
	let std_error = sample_std(values, mean) / (n as f64).sqrt();

	if std_error == 0.0 {
		return (mean, mean);
	}

	let Some(t_value) = t_critical_value(level, (n - 1) as f64) else {
		return (mean, mean);
	};
	let margin = t_value * std_error;

	(mean - margin, mean + margin)
}

fn t_critical_value(level: f64, degrees_of_freedom: f64) -> Option<f64> {
	let dist = StudentsT::new(0.0, 1.0, degrees_of_freedom).ok()?;
	let value = dist.inverse_cdf((1.0 + level) / 2.0);

	value.is_finite().then_some(value)
}

fn population_std(values: &[f64], mean: f64) -> f64 {
	if values.len() < 2 {
		return 0.0;
	}

	let sum_sq = values.iter().map(|value| (value - mean).powi(2)).sum::<f64>();

	(sum_sq / values.len() as f64).sqrt()
}

fn sample_std(values: &[f64], mean: f64) -> f64 {
	let sum_sq = values.iter().map(|value| (value - mean).powi(2)).sum::<f64>();

	(sum_sq / (values.len() - 1) as f64).sqrt()
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
	let mid = sorted.len() / 2;

	if sorted.len() % 2 == 0 { (sorted[mid - 1] + sorted[mid]) / 2.0 } else { sorted[mid] }
}

#[cfg(test)]
mod tests {
	use super::*;

	fn close(lhs: f64, rhs: f64, tolerance: f64) -> bool {
		(lhs - rhs).abs() < tolerance
	}

	#[test]
	fn empty_sample_has_no_summary() {
		assert!(summarize(&[], true).is_none());
	}

	#[test]
	fn single_sample_is_degenerate() {
		let summary = summarize(&[0.7], true).expect("Summary must exist.");

		assert_eq!(summary.mean, 0.7);
		assert_eq!(summary.std, 0.0);
		assert_eq!(summary.median, 0.7);
		assert_eq!(summary.count, 1);
		assert_eq!(summary.confidence_interval_95, Some((0.0, 0.0)));
	}

	#[test]
	fn identical_samples_collapse_interval() {
		let summary = summarize(&[0.25; 4], true).expect("Summary must exist.");

		assert_eq!(summary.confidence_interval_95, Some((0.25, 0.25)));
		assert_eq!(summary.std, 0.0);
		// 0.1 has no exact binary mean over three samples.
		assert_eq!(confidence_interval(&[0.1; 3], 0.95), (0.1, 0.1));
	}

	#[test]
	fn median_averages_middle_pair() {
		let summary = summarize(&[4.0, 1.0, 3.0, 2.0], false).expect("Summary must exist.");

		assert_eq!(summary.median, 2.5);
		assert_eq!(summary.min, 1.0);
		assert_eq!(summary.max, 4.0);
		assert!(summary.confidence_interval_95.is_none());
	}

	#[test]
	fn std_is_population_std() {
		// Population variance of [0, 1] is 0.25.
		let summary = summarize(&[0.0, 1.0], false).expect("Summary must exist.");

		assert!(close(summary.std, 0.5, 1e-12));
	}

	#[test]
	fn interval_uses_student_t_on_sample_std() {
		// n = 2, mean 0.5, sample std sqrt(0.5), se 0.5, t(0.975, 1) = 12.7062.
		let (low, high) = confidence_interval(&[0.0, 1.0], 0.95);
		let margin = 12.706_204_736 * 0.5;

		assert!(close(low, 0.5 - margin, 1e-4), "Unexpected low bound: {low}");
		assert!(close(high, 0.5 + margin, 1e-4), "Unexpected high bound: {high}");
	}

	#[test]
	fn interval_narrows_with_larger_samples() {
		let values: Vec<f64> = (0..30).map(|i| if i % 2 == 0 { 1.0 } else { 0.0 }).collect();
		let (low, high) = confidence_interval(&values, 0.95);

		assert!(low > 0.0 && high < 1.0, "Unexpected interval: ({low}, {high})");
		assert!(close((low + high) / 2.0, 0.5, 1e-12));
	}
}
