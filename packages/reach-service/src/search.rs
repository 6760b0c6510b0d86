//! Query orchestration: exact-entity resolution first, hybrid ranking as the fallback, and a
//! fixed apology when anything below fails.

use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};

use reach_domain::{CorpusKind, Record, entity};

use crate::{
	Corpus, Error, ReachService, Result,
	ranking::{self, ConfidencePolicy, HybridWeights, KeywordPolicy},
};

pub const FALLBACK_MESSAGE: &str =
	"I encountered an issue processing your query. Please try rephrasing your question.";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryRequest {
	pub query: String,
	#[serde(default)]
	pub result_limit: Option<u32>,
	#[serde(default)]
	pub vector_weight: Option<f32>,
	#[serde(default)]
	pub keyword_weight: Option<f32>,
}
impl QueryRequest {
	pub fn new(query: impl Into<String>) -> Self {
		Self { query: query.into(), ..Default::default() }
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredRecord {
	pub record: Arc<Record>,
	/// 0 when only the vector signal found the record.
	pub keyword_score: f32,
	#[serde(default)]
	pub vector_score: Option<f32>,
	pub combined_score: f32,
	/// 1-based. Vector-only intermediates carry 0 until the combiner ranks the list.
	pub rank: u32,
	/// Index of the record in its corpus as the store returned it.
	#[serde(skip)]
	pub store_position: usize,
}
impl ScoredRecord {
	pub fn from_keyword(record: Arc<Record>, keyword_score: f32, store_position: usize) -> Self {
		Self {
			record,
			keyword_score,
			vector_score: None,
			combined_score: keyword_score,
			rank: 0,
			store_position,
		}
	}

	pub fn from_vector(record: Arc<Record>, vector_score: f32, store_position: usize) -> Self {
		Self {
			record,
			keyword_score: 0.0,
			vector_score: Some(vector_score),
			combined_score: vector_score,
			rank: 0,
			store_position,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
	pub query: String,
	pub matched_records: Vec<ScoredRecord>,
	pub is_exact_match: bool,
	pub confidence: f32,
	pub fallback_used: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
	pub response: String,
	#[serde(flatten)]
	pub result: QueryResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStage {
	Preprocessing,
	EntityMatching,
	ExactMatchFound,
	ScoringFallback,
	Combining,
	Formatting,
	Done,
	Error,
}
impl QueryStage {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Preprocessing => "preprocessing",
			Self::EntityMatching => "entity_matching",
			Self::ExactMatchFound => "exact_match_found",
			Self::ScoringFallback => "scoring_fallback",
			Self::Combining => "combining",
			Self::Formatting => "formatting",
			Self::Done => "done",
			Self::Error => "error",
		}
	}
}

struct QueryPlan {
	limit: usize,
	weights: HybridWeights,
}

struct StageFailure {
	stage: QueryStage,
	error: Error,
}
impl StageFailure {
	fn at(stage: QueryStage) -> impl FnOnce(Error) -> Self {
		move |error| Self { stage, error }
	}
}

impl ReachService {
	/// Answers one query.
	///
	/// Only an empty query or invalid overrides are returned as errors. Store, provider and
	/// formatter failures, as well as timeouts, come back as the fallback response with
	/// `fallback_used` set.
	pub async fn process_query(&self, req: QueryRequest) -> Result<QueryResponse> {
		if req.query.trim().is_empty() {
			return Err(Error::EmptyQuery);
		}

		let plan = self.resolve_plan(&req)?;
		let timeout_ms = self.cfg.search.timeout_ms;
		let deadline = Duration::from_millis(timeout_ms);
		let Ok(outcome) = tokio::time::timeout(deadline, self.run_query(&req.query, &plan)).await
		else {
			tracing::warn!(
				stage = QueryStage::Error.as_str(),
				error = %Error::Timeout { timeout_ms },
				"Query exceeded its deadline. Returning fallback response."
			);

			return Ok(fallback_response(&req.query));
		};

		match outcome {
			Ok(response) => Ok(response),
			Err(StageFailure { stage, error }) => {
				tracing::warn!(
					stage = QueryStage::Error.as_str(),
					failed_stage = stage.as_str(),
					error = %error,
					"Query failed. Returning fallback response."
				);

				Ok(fallback_response(&req.query))
			},
		}
	}

	fn resolve_plan(&self, req: &QueryRequest) -> Result<QueryPlan> {
		let limit = req.result_limit.unwrap_or(self.cfg.search.result_limit);

		if limit == 0 {
			return Err(Error::InvalidRequest {
				message: "result_limit must be greater than zero.".to_string(),
			});
		}

		let defaults = if self.components.vector.is_available() {
			self.cfg.search.weights
		} else {
			self.cfg.search.stub_weights
		};
		let weights = HybridWeights::new(
			req.vector_weight.unwrap_or(defaults.vector_weight),
			req.keyword_weight.unwrap_or(defaults.keyword_weight),
		)?;

		Ok(QueryPlan { limit: limit as usize, weights })
	}

	async fn run_query(
		&self,
		raw_query: &str,
		plan: &QueryPlan,
	) -> std::result::Result<QueryResponse, StageFailure> {
		let query = raw_query.trim().to_lowercase();

		tracing::debug!(stage = QueryStage::Preprocessing.as_str(), query = %query, "Query stage.");

		let source = &self.components.source;
		let [first, second] = CorpusKind::SEARCHABLE;
		let (first_records, second_records) =
			tokio::try_join!(source.fetch_all(first), source.fetch_all(second))
				.map_err(StageFailure::at(QueryStage::EntityMatching))?;
		let corpora = [first_records, second_records];

		tracing::debug!(
			stage = QueryStage::EntityMatching.as_str(),
			records = corpora.iter().map(Vec::len).sum::<usize>(),
			"Query stage."
		);

		let confidence_policy = ConfidencePolicy::from_config(&self.cfg.ranking);
		let exact = self.exact_match(raw_query, &query, &corpora, &confidence_policy);
		let result = match exact {
			Some(result) => result,
			None => {
				let (keyword, vector) = self
					.score_corpora(&query, &corpora)
					.await
					.map_err(StageFailure::at(QueryStage::ScoringFallback))?;

				tracing::debug!(
					stage = QueryStage::Combining.as_str(),
					keyword = keyword.len(),
					vector = vector.len(),
					"Query stage."
				);

				let mut matched = ranking::combine(keyword, vector, plan.weights);

				matched.truncate(plan.limit);

				QueryResult {
					query: raw_query.to_string(),
					confidence: ranking::confidence(&matched, &confidence_policy),
					matched_records: matched,
					is_exact_match: false,
					fallback_used: false,
				}
			},
		};

		tracing::debug!(stage = QueryStage::Formatting.as_str(), "Query stage.");

		let response = self
			.components
			.formatter
			.format(&result)
			.await
			.map_err(StageFailure::at(QueryStage::Formatting))?;

		tracing::info!(
			stage = QueryStage::Done.as_str(),
			exact = result.is_exact_match,
			matched = result.matched_records.len(),
			confidence = result.confidence,
			"Query answered."
		);

		Ok(QueryResponse { response, result })
	}

	fn exact_match(
		&self,
		raw_query: &str,
		query: &str,
		corpora: &[Corpus],
		policy: &ConfidencePolicy,
	) -> Option<QueryResult> {
		let (record, reason) = entity::find_exact_match(query, corpora.iter().flatten())?;
		let store_position = corpora
			.iter()
			.find_map(|corpus| corpus.iter().position(|item| Arc::ptr_eq(item, record)))
			.unwrap_or(0);

		tracing::debug!(
			stage = QueryStage::ExactMatchFound.as_str(),
			record_id = %record.id,
			corpus = record.corpus.as_str(),
			reason = reason.as_str(),
			"Exact entity match."
		);

		let scored = ScoredRecord {
			record: record.clone(),
			keyword_score: policy.exact_match_score,
			vector_score: None,
			combined_score: policy.exact_match_score,
			rank: 1,
			store_position,
		};

		Some(QueryResult {
			query: raw_query.to_string(),
			matched_records: vec![scored],
			is_exact_match: true,
			confidence: policy.exact_match_score,
			fallback_used: false,
		})
	}

	/// Keyword and vector scoring of both searchable corpora, run concurrently.
	async fn score_corpora(
		&self,
		query: &str,
		corpora: &[Corpus; 2],
	) -> Result<(Vec<ScoredRecord>, Vec<ScoredRecord>)> {
		let [first, second] = corpora;
		let (first_scores, second_scores) =
			tokio::join!(self.score_corpus(query, first), self.score_corpus(query, second));
		let (mut keyword, mut vector) = first_scores?;
		let (second_keyword, second_vector) = second_scores?;

		keyword.extend(second_keyword);
		vector.extend(second_vector);

		Ok((keyword, vector))
	}

	async fn score_corpus(
		&self,
		query: &str,
		corpus: &[Arc<Record>],
	) -> Result<(Vec<ScoredRecord>, Vec<ScoredRecord>)> {
		let policy = KeywordPolicy::from_config(&self.cfg.ranking);
		let keyword = async { ranking::score_keywords(query, corpus, &policy) };
		let (keyword, hits) =
			tokio::join!(keyword, self.components.vector.embed_and_score(query, corpus));
		let vector = ranking::resolve_vector_hits(hits?, corpus);

		Ok((keyword, vector))
	}
}

pub fn fallback_response(query: &str) -> QueryResponse {
	QueryResponse {
		response: FALLBACK_MESSAGE.to_string(),
		result: QueryResult {
			query: query.to_string(),
			matched_records: Vec::new(),
			is_exact_match: false,
			confidence: 0.0,
			fallback_used: true,
		},
	}
}
