use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub providers: Providers,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub ranking: Ranking,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	/// One of "postgres" or "fixture".
	pub source: String,
	pub postgres: Option<Postgres>,
	pub fixture: Option<Fixture>,
	#[serde(default)]
	pub cache: StorageCache,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Fixture {
	/// JSON file holding `campaigns` and `academy` arrays.
	pub path: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageCache {
	pub enabled: bool,
	pub ttl_secs: u64,
}
impl Default for StorageCache {
	fn default() -> Self {
		Self { enabled: false, ttl_secs: 30 }
	}
}

#[derive(Debug, Default, Deserialize)]
pub struct Providers {
	pub embedding: Option<EmbeddingProviderConfig>,
	pub llm: Option<LlmProviderConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub max_tokens: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	pub result_limit: u32,
	pub timeout_ms: u64,
	pub vector_min_similarity: f32,
	/// Most record embeddings kept in memory. Least recently used entries go first.
	pub embedding_cache_capacity: usize,
	/// Used when a real vector scorer is wired in.
	pub weights: SearchWeights,
	/// Used when the vector signal is known to be a stub.
	pub stub_weights: SearchWeights,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			result_limit: 5,
			timeout_ms: 10_000,
			vector_min_similarity: 0.7,
			embedding_cache_capacity: 1_024,
			weights: SearchWeights { vector_weight: 0.7, keyword_weight: 0.3 },
			stub_weights: SearchWeights { vector_weight: 0.3, keyword_weight: 0.7 },
		}
	}
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SearchWeights {
	pub vector_weight: f32,
	pub keyword_weight: f32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Ranking {
	pub campaign_base_score: f32,
	pub academy_base_score: f32,
	pub general_base_score: f32,
	pub position_decay: f32,
	pub exact_match_score: f32,
	pub no_match_confidence: f32,
	pub confidence_floor: f32,
	pub confidence_ceiling: f32,
}
impl Default for Ranking {
	fn default() -> Self {
		Self {
			campaign_base_score: 0.8,
			academy_base_score: 0.75,
			general_base_score: 0.7,
			position_decay: 0.05,
			exact_match_score: 0.95,
			no_match_confidence: 0.2,
			confidence_floor: 0.3,
			confidence_ceiling: 0.95,
		}
	}
}
