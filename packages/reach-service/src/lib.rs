pub mod format;
pub mod ranking;
pub mod search;
pub mod source;
pub mod stats;
pub mod vector;

mod error;

pub use error::{Error, Result};
pub use format::{LlmFormatter, ResponseFormatter, TemplateFormatter};
pub use search::{QueryRequest, QueryResponse, QueryResult, QueryStage, ScoredRecord};
pub use source::{CachedSource, Corpus, DataSource, FixtureSource, PostgresSource};
pub use stats::{CorpusStats, HealthReport, HealthStatus, ServiceHealth};
pub use vector::{EmbeddingVectorScorer, NullVectorScorer, VectorHit, VectorScorer};

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use serde_json::Value;

use reach_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use reach_providers::{embedding, generation};
use reach_storage::db::Db;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

pub trait GenerationProvider
where
	Self: Send + Sync,
{
	fn generate<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, Result<String>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub generation: Arc<dyn GenerationProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		generation: Arc<dyn GenerationProvider>,
	) -> Self {
		Self { embedding, generation }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), generation: provider }
	}
}

/// The pluggable collaborators of a query: where records come from, how the vector signal is
/// produced and how results become text.
#[derive(Clone)]
pub struct Components {
	pub source: Arc<dyn DataSource>,
	pub vector: Arc<dyn VectorScorer>,
	pub formatter: Arc<dyn ResponseFormatter>,
}
impl Components {
	/// Keyword-only setup: the stub vector scorer and the template formatter.
	pub fn new(source: Arc<dyn DataSource>) -> Self {
		Self {
			source,
			vector: Arc::new(NullVectorScorer),
			formatter: Arc::new(TemplateFormatter),
		}
	}

	pub fn with_vector(mut self, vector: Arc<dyn VectorScorer>) -> Self {
		self.vector = vector;

		self
	}

	pub fn with_formatter(mut self, formatter: Arc<dyn ResponseFormatter>) -> Self {
		self.formatter = formatter;

		self
	}
}

pub struct ReachService {
	pub cfg: Config,
	pub components: Components,
}
impl ReachService {
	pub fn new(cfg: Config, source: Arc<dyn DataSource>) -> Self {
		Self { cfg, components: Components::new(source) }
	}

	pub fn with_components(cfg: Config, components: Components) -> Self {
		Self { cfg, components }
	}

	/// Wires the source, vector scorer and formatter named by `cfg`, calling the real HTTP
	/// providers.
	pub async fn from_config(cfg: Config) -> Result<Self> {
		Self::from_config_with_providers(cfg, Providers::default()).await
	}

	pub async fn from_config_with_providers(cfg: Config, providers: Providers) -> Result<Self> {
		let source = build_source(&cfg).await?;
		let mut components = Components::new(source);

		if let Some(embedding_cfg) = cfg.providers.embedding.as_ref() {
			components = components.with_vector(Arc::new(EmbeddingVectorScorer::new(
				embedding_cfg.clone(),
				providers.embedding.clone(),
				cfg.search.vector_min_similarity,
			)
			.with_cache_capacity(cfg.search.embedding_cache_capacity)));
		}
		if let Some(llm_cfg) = cfg.providers.llm.as_ref() {
			components = components.with_formatter(Arc::new(LlmFormatter::new(
				llm_cfg.clone(),
				providers.generation.clone(),
			)));
		}

		tracing::info!(
			source = components.source.name(),
			vector_available = components.vector.is_available(),
			generative = components.formatter.is_generative(),
			"Query service wired."
		);

		Ok(Self { cfg, components })
	}
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(embedding::embed(cfg, texts).await?) })
	}
}

impl GenerationProvider for DefaultProviders {
	fn generate<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, Result<String>> {
		Box::pin(async move { Ok(generation::generate(cfg, messages).await?.text) })
	}
}

async fn build_source(cfg: &Config) -> Result<Arc<dyn DataSource>> {
	let source: Arc<dyn DataSource> = match cfg.storage.source.as_str() {
		reach_config::SOURCE_POSTGRES => {
			let Some(pg) = cfg.storage.postgres.as_ref() else {
				return Err(Error::InvalidConfig {
					message: "storage.postgres is required when storage.source is postgres."
						.to_string(),
				});
			};

			Arc::new(PostgresSource::new(Db::connect(pg).await?))
		},
		reach_config::SOURCE_FIXTURE => {
			let Some(fixture) = cfg.storage.fixture.as_ref() else {
				return Err(Error::InvalidConfig {
					message: "storage.fixture is required when storage.source is fixture."
						.to_string(),
				});
			};

			Arc::new(FixtureSource::load(&fixture.path)?)
		},
		other => {
			return Err(Error::InvalidConfig {
				message: format!("Unknown storage source {other}."),
			});
		},
	};

	if cfg.storage.cache.enabled {
		return Ok(Arc::new(CachedSource::new(
			source,
			Duration::from_secs(cfg.storage.cache.ttl_secs),
		)));
	}

	Ok(source)
}
