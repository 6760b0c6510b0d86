use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use reach_domain::CorpusKind;

use crate::ReachService;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusStats {
	pub total_records: u64,
	pub records_by_corpus: BTreeMap<CorpusKind, u64>,
	#[serde(with = "time::serde::rfc3339")]
	pub generated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
	Healthy,
	Degraded,
	Unhealthy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceHealth {
	pub store: bool,
	pub vector: bool,
	pub generation: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
	pub status: HealthStatus,
	pub services: ServiceHealth,
	pub source: String,
	#[serde(with = "time::serde::rfc3339")]
	pub checked_at: OffsetDateTime,
}

impl ReachService {
	/// Record counts per searchable corpus. A corpus whose count fails is reported as 0.
	pub async fn corpus_stats(&self) -> CorpusStats {
		let source = &self.components.source;
		let [first, second] = CorpusKind::SEARCHABLE;
		let (first_count, second_count) = tokio::join!(source.count(first), source.count(second));
		let mut records_by_corpus = BTreeMap::new();

		for (corpus, count) in [(first, first_count), (second, second_count)] {
			let count = count.unwrap_or_else(|err| {
				tracing::warn!(corpus = corpus.as_str(), error = %err, "Failed to count corpus.");

				0
			});

			records_by_corpus.insert(corpus, count);
		}

		CorpusStats {
			total_records: records_by_corpus.values().sum(),
			records_by_corpus,
			generated_at: OffsetDateTime::now_utc(),
		}
	}

	/// Probes the store. Missing optional providers degrade the report; an unreachable store makes
	/// it unhealthy.
	pub async fn health(&self) -> HealthReport {
		let store = match self.components.source.fetch_all(CorpusKind::Campaign).await {
			Ok(_) => true,
			Err(err) => {
				tracing::warn!(error = %err, "Store health probe failed.");

				false
			},
		};
		let services = ServiceHealth {
			store,
			vector: self.components.vector.is_available(),
			generation: self.components.formatter.is_generative(),
		};
		let status = if !services.store {
			HealthStatus::Unhealthy
		} else if services.vector && services.generation {
			HealthStatus::Healthy
		} else {
			HealthStatus::Degraded
		};

		HealthReport {
			status,
			services,
			source: self.components.source.name().to_string(),
			checked_at: OffsetDateTime::now_utc(),
		}
	}
}
