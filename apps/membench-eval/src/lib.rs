use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::eyre;
use serde::Serialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use membench_domain::{metric::Metric, stats::StatSummary};
use membench_service::{
	Evaluation, Evaluator, JudgeSummary, QuestionOutcome, Report, RunStats, dataset,
};

#[derive(Debug, Parser)]
#[command(
	version = membench_cli::VERSION,
	rename_all = "kebab",
	styles = membench_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Gold dataset: an array of conversations with their QA annotations.
	#[arg(long, short = 'd', value_name = "FILE")]
	pub dataset: PathBuf,
	/// Memory system output keyed by conversation index.
	#[arg(long, short = 'r', value_name = "FILE")]
	pub results: PathBuf,
	/// Report destination. Printed to stdout when omitted.
	#[arg(long, short = 'o', value_name = "FILE")]
	pub output: Option<PathBuf>,
	/// Per-question scores destination.
	#[arg(long, value_name = "FILE")]
	pub details: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct RunDetails<'a> {
	generated_at: String,
	dataset: String,
	results: String,
	stats: RunStats,
	questions: &'a [QuestionOutcome],
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let cfg = membench_config::load(&args.config)?;

	membench_cli::init_tracing(&cfg.service.log_level);

	let evaluator = Evaluator::new(cfg);
	let evaluation = evaluate_files(&evaluator, &args.dataset, &args.results).await?;

	write_outputs(&args, &evaluation)?;
	log_summary(&evaluation.report);

	Ok(())
}

pub async fn evaluate_files(
	evaluator: &Evaluator,
	dataset_path: &Path,
	results_path: &Path,
) -> color_eyre::Result<Evaluation> {
	let gold = dataset::load_dataset(dataset_path)?;
	let results = dataset::load_results(results_path)?;

	tracing::info!(
		conversations = gold.len(),
		result_conversations = results.len(),
		"Loaded evaluation inputs."
	);

	Ok(evaluator.evaluate_dataset(&results, &gold).await)
}

/// Writes the report, and the details file when requested.
pub fn write_outputs(args: &Args, evaluation: &Evaluation) -> color_eyre::Result<()> {
	membench_cli::emit_json(&evaluation.report, args.output.as_deref())?;

	if let Some(path) = &args.details {
		let generated_at = OffsetDateTime::now_utc()
			.format(&Rfc3339)
			.map_err(|err| eyre::eyre!("Failed to format generated_at: {err}"))?;
		let details = RunDetails {
			generated_at,
			dataset: args.dataset.display().to_string(),
			results: args.results.display().to_string(),
			stats: evaluation.stats,
			questions: &evaluation.questions,
		};

		membench_cli::emit_json(&details, Some(path))?;

		tracing::info!(path = %path.display(), "Wrote run details.");
	}

	Ok(())
}

pub fn format_metric_line(metric: Metric, summary: &StatSummary) -> String {
	let (low, high) = summary.confidence_interval_95.unwrap_or((0.0, 0.0));

	format!(
		"{metric}: {:.4} ± {:.4} (95% CI: {low:.4} - {high:.4})",
		summary.mean, summary.std
	)
}

pub fn format_judge_line(summary: &JudgeSummary) -> String {
	let mut line = format!(
		"llm_judge: accuracy {:.4} ({}/{})",
		summary.accuracy, summary.correct, summary.count
	);

	if let Some(mean_score) = summary.mean_score {
		line.push_str(&format!(", mean score {mean_score:.2}"));
	}

	line
}

fn log_summary(report: &Report) {
	if report.overall.is_empty() {
		tracing::warn!("No questions were evaluated.");

		return;
	}

	for (metric, summary) in &report.overall {
		tracing::info!("{}", format_metric_line(*metric, summary));
	}

	if let Some(judge) = &report.llm_judge {
		tracing::info!("{}", format_judge_line(&judge.overall));
	}
}
