mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, Fixture, LlmProviderConfig, Postgres, Providers, Ranking,
	Search, SearchWeights, Service, Storage, StorageCache,
};

use std::{fs, path::Path};

pub const SOURCE_POSTGRES: &str = "postgres";
pub const SOURCE_FIXTURE: &str = "fixture";

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}

	match cfg.storage.source.as_str() {
		SOURCE_POSTGRES => {
			let Some(postgres) = cfg.storage.postgres.as_ref() else {
				return Err(Error::Validation {
					message: "storage.postgres is required when storage.source is postgres."
						.to_string(),
				});
			};

			if postgres.dsn.trim().is_empty() {
				return Err(Error::Validation {
					message: "storage.postgres.dsn must be non-empty.".to_string(),
				});
			}
			if postgres.pool_max_conns == 0 {
				return Err(Error::Validation {
					message: "storage.postgres.pool_max_conns must be greater than zero."
						.to_string(),
				});
			}
		},
		SOURCE_FIXTURE =>
			if cfg.storage.fixture.is_none() {
				return Err(Error::Validation {
					message: "storage.fixture is required when storage.source is fixture."
						.to_string(),
				});
			},
		_ => {
			return Err(Error::Validation {
				message: "storage.source must be one of postgres or fixture.".to_string(),
			});
		},
	}

	if cfg.storage.cache.enabled && cfg.storage.cache.ttl_secs == 0 {
		return Err(Error::Validation {
			message: "storage.cache.ttl_secs must be greater than zero when enabled.".to_string(),
		});
	}

	validate_search(&cfg.search)?;
	validate_ranking(&cfg.ranking)?;

	if let Some(embedding) = cfg.providers.embedding.as_ref() {
		if embedding.dimensions == 0 {
			return Err(Error::Validation {
				message: "providers.embedding.dimensions must be greater than zero.".to_string(),
			});
		}
		if embedding.timeout_ms == 0 {
			return Err(Error::Validation {
				message: "providers.embedding.timeout_ms must be greater than zero.".to_string(),
			});
		}
		if embedding.api_key.trim().is_empty() {
			return Err(Error::Validation {
				message: "Provider embedding api_key must be non-empty.".to_string(),
			});
		}
	}
	if let Some(llm) = cfg.providers.llm.as_ref() {
		if !llm.temperature.is_finite() || !(0.0..=2.0).contains(&llm.temperature) {
			return Err(Error::Validation {
				message: "providers.llm.temperature must be in the range 0.0-2.0.".to_string(),
			});
		}
		if llm.max_tokens == 0 {
			return Err(Error::Validation {
				message: "providers.llm.max_tokens must be greater than zero.".to_string(),
			});
		}
		if llm.timeout_ms == 0 {
			return Err(Error::Validation {
				message: "providers.llm.timeout_ms must be greater than zero.".to_string(),
			});
		}
		if llm.api_key.trim().is_empty() {
			return Err(Error::Validation {
				message: "Provider llm api_key must be non-empty.".to_string(),
			});
		}
	}

	Ok(())
}

fn validate_search(search: &Search) -> Result<()> {
	if search.result_limit == 0 {
		return Err(Error::Validation {
			message: "search.result_limit must be greater than zero.".to_string(),
		});
	}
	if search.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "search.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if !search.vector_min_similarity.is_finite()
		|| !(0.0..=1.0).contains(&search.vector_min_similarity)
	{
		return Err(Error::Validation {
			message: "search.vector_min_similarity must be in the range 0.0-1.0.".to_string(),
		});
	}
	if search.embedding_cache_capacity == 0 {
		return Err(Error::Validation {
			message: "search.embedding_cache_capacity must be greater than zero.".to_string(),
		});
	}

	for (label, weights) in
		[("search.weights", &search.weights), ("search.stub_weights", &search.stub_weights)]
	{
		for (field, value) in
			[("vector_weight", weights.vector_weight), ("keyword_weight", weights.keyword_weight)]
		{
			if !value.is_finite() {
				return Err(Error::Validation {
					message: format!("{label}.{field} must be a finite number."),
				});
			}
			if value < 0.0 {
				return Err(Error::Validation {
					message: format!("{label}.{field} must be zero or greater."),
				});
			}
		}
	}

	Ok(())
}

fn validate_ranking(ranking: &Ranking) -> Result<()> {
	for (label, value) in [
		("ranking.campaign_base_score", ranking.campaign_base_score),
		("ranking.academy_base_score", ranking.academy_base_score),
		("ranking.general_base_score", ranking.general_base_score),
		("ranking.exact_match_score", ranking.exact_match_score),
		("ranking.no_match_confidence", ranking.no_match_confidence),
		("ranking.confidence_floor", ranking.confidence_floor),
		("ranking.confidence_ceiling", ranking.confidence_ceiling),
	] {
		if !value.is_finite() || !(0.0..=1.0).contains(&value) {
			return Err(Error::Validation {
				message: format!("{label} must be in the range 0.0-1.0."),
			});
		}
	}

	if !ranking.position_decay.is_finite() {
		return Err(Error::Validation {
			message: "ranking.position_decay must be a finite number.".to_string(),
		});
	}
	if ranking.position_decay < 0.0 {
		return Err(Error::Validation {
			message: "ranking.position_decay must be zero or greater.".to_string(),
		});
	}
	if ranking.confidence_floor > ranking.confidence_ceiling {
		return Err(Error::Validation {
			message: "ranking.confidence_floor must not exceed ranking.confidence_ceiling."
				.to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.storage.fixture.as_ref().map(|fixture| fixture.path.trim().is_empty()).unwrap_or(false)
	{
		cfg.storage.fixture = None;
	}
	if cfg
		.storage
		.postgres
		.as_ref()
		.map(|postgres| postgres.dsn.trim().is_empty())
		.unwrap_or(false)
		&& cfg.storage.source != SOURCE_POSTGRES
	{
		cfg.storage.postgres = None;
	}

	cfg.storage.source = cfg.storage.source.trim().to_ascii_lowercase();
}
