pub mod aggregate;
pub mod answer;
pub mod dataset;
pub mod evaluate;
pub mod judge;
pub mod relevance;
pub mod similarity;

mod error;

pub use aggregate::{Accumulator, MetricSummaries, Report};
pub use dataset::{
	CategoryId, EvaluationRequest, GoldConversation, GoldDataset, GoldQa, MemoryItem,
	ResultRecord, ResultsFile,
};
pub use error::{Error, Result};
pub use evaluate::{Evaluation, QuestionOutcome, RunStats};
pub use judge::{JudgeReport, JudgeSummary, LlmJudge};
pub use membench_providers::judge::{JudgeMode, Verdict};
pub use similarity::EmbeddingSimilarity;

use std::{future::Future, pin::Pin, sync::Arc};

use membench_config::Config;

/// Adversarial questions have no usable gold answer and are not judged unless configured.
const ADVERSARIAL_CATEGORY: &str = "5";

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Semantic similarity of two texts. Implementations may return any finite value; callers clamp
/// into `[0, 1]`.
pub trait SimilarityOracle
where
	Self: Send + Sync,
{
	fn similarity<'a>(&'a self, lhs: &'a str, rhs: &'a str) -> BoxFuture<'a, Result<f64>>;
}

pub trait AnswerJudge
where
	Self: Send + Sync,
{
	fn judge<'a>(
		&'a self,
		question: &'a str,
		gold_answer: &'a str,
		generated_answer: &'a str,
	) -> BoxFuture<'a, Result<Verdict>>;
}

#[derive(Clone)]
pub struct Providers {
	pub similarity: Arc<dyn SimilarityOracle>,
	pub judge: Option<Arc<dyn AnswerJudge>>,
}
impl Providers {
	pub fn new(similarity: Arc<dyn SimilarityOracle>) -> Self {
		Self { similarity, judge: None }
	}

	pub fn with_judge(mut self, judge: Arc<dyn AnswerJudge>) -> Self {
		self.judge = Some(judge);

		self
	}

	/// HTTP-backed providers. The judge is present only when `[providers.judge]` is configured.
	pub fn from_config(cfg: &Config) -> Self {
		let similarity = Arc::new(EmbeddingSimilarity::new(
			cfg.providers.embedding.clone(),
			cfg.providers.retry.clone(),
			cfg.embedding_cache,
		));
		let providers = Self::new(similarity);

		match &cfg.providers.judge {
			Some(judge) => providers
				.with_judge(Arc::new(LlmJudge::new(judge.clone(), cfg.providers.retry.clone()))),
			None => providers,
		}
	}
}

pub struct Evaluator {
	pub cfg: Config,
	pub providers: Providers,
}
impl Evaluator {
	pub fn new(cfg: Config) -> Self {
		let providers = Providers::from_config(&cfg);

		Self { cfg, providers }
	}

	pub fn with_providers(cfg: Config, providers: Providers) -> Self {
		Self { cfg, providers }
	}

	/// Mode reported in the `llm_judge` section. `None` when no judge runs.
	pub fn judge_mode(&self) -> Option<JudgeMode> {
		self.providers.judge.as_ref()?;

		let mode = match &self.cfg.providers.judge {
			Some(judge) => JudgeMode::parse(&judge.mode).unwrap_or(JudgeMode::Binary),
			None => JudgeMode::Binary,
		};

		Some(mode)
	}

	pub(crate) fn judges_category(&self, category: &CategoryId) -> bool {
		match &self.cfg.providers.judge {
			Some(judge) =>
				!judge.skip_categories.iter().any(|skip| skip.trim() == category.as_str()),
			None => category.as_str() != ADVERSARIAL_CATEGORY,
		}
	}
}
