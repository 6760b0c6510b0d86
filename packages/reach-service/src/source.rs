//! Record sources: the hosted Postgres tables, a JSON fixture file, and a TTL cache that wraps
//! either one.

use std::{
	collections::HashMap,
	path::Path,
	sync::{Arc, Mutex},
	time::{Duration, Instant},
};

use serde::Deserialize;
use serde_json::{Map, Value};

use reach_domain::{CorpusKind, Record};
use reach_storage::{
	db::Db,
	models::{AcademyRow, CampaignRow, CorpusTable},
	queries,
};

use crate::{BoxFuture, Error, Result};

/// Records of one corpus, in the order the store returned them.
pub type Corpus = Vec<Arc<Record>>;

pub trait DataSource
where
	Self: Send + Sync,
{
	/// Every record of `corpus`. Order must be stable across calls on unchanged data.
	fn fetch_all<'a>(&'a self, corpus: CorpusKind) -> BoxFuture<'a, Result<Corpus>>;

	fn count<'a>(&'a self, corpus: CorpusKind) -> BoxFuture<'a, Result<u64>> {
		Box::pin(async move { Ok(self.fetch_all(corpus).await?.len() as u64) })
	}

	fn name(&self) -> &'static str;
}

pub struct PostgresSource {
	db: Db,
}
impl PostgresSource {
	pub fn new(db: Db) -> Self {
		Self { db }
	}
}

impl DataSource for PostgresSource {
	fn fetch_all<'a>(&'a self, corpus: CorpusKind) -> BoxFuture<'a, Result<Corpus>> {
		Box::pin(async move {
			let records = match corpus {
				CorpusKind::Campaign => queries::fetch_campaigns(&self.db)
					.await?
					.into_iter()
					.map(|row| Arc::new(campaign_record(row)))
					.collect(),
				CorpusKind::AcademyArticle => queries::fetch_academy(&self.db)
					.await?
					.into_iter()
					.map(|row| Arc::new(academy_record(row)))
					.collect(),
				CorpusKind::General => Vec::new(),
			};

			Ok(records)
		})
	}

	fn count<'a>(&'a self, corpus: CorpusKind) -> BoxFuture<'a, Result<u64>> {
		Box::pin(async move {
			let table = match corpus {
				CorpusKind::Campaign => CorpusTable::Campaigns,
				CorpusKind::AcademyArticle => CorpusTable::Academy,
				CorpusKind::General => return Ok(0),
			};
			let count = queries::count_rows(&self.db, table).await?;

			Ok(u64::try_from(count).unwrap_or(0))
		})
	}

	fn name(&self) -> &'static str {
		"postgres"
	}
}

#[derive(Debug, Default, Deserialize)]
struct FixtureFile {
	#[serde(default)]
	campaigns: Vec<CampaignRow>,
	#[serde(default)]
	academy: Vec<AcademyRow>,
	#[serde(default)]
	general: Vec<Record>,
}

/// In-memory records, loaded from a fixture file or handed over directly.
#[derive(Debug, Default)]
pub struct FixtureSource {
	corpora: HashMap<CorpusKind, Corpus>,
}
impl FixtureSource {
	/// Groups `records` by corpus, keeping their relative order.
	pub fn from_records<I>(records: I) -> Self
	where
		I: IntoIterator<Item = Record>,
	{
		let mut corpora: HashMap<CorpusKind, Corpus> = HashMap::new();

		for record in records {
			corpora.entry(record.corpus).or_default().push(Arc::new(record));
		}

		Self { corpora }
	}

	/// Parses the `{ "campaigns": [...], "academy": [...] }` layout used by the hosted tables.
	pub fn from_json_str(raw: &str) -> Result<Self> {
		let file: FixtureFile = serde_json::from_str(raw).map_err(|err| Error::InvalidConfig {
			message: format!("Failed to parse fixture corpus: {err}"),
		})?;
		let records = file
			.campaigns
			.into_iter()
			.map(campaign_record)
			.chain(file.academy.into_iter().map(academy_record))
			.chain(file.general);

		Ok(Self::from_records(records))
	}

	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let raw = std::fs::read_to_string(path).map_err(|err| Error::InvalidConfig {
			message: format!("Failed to read fixture corpus at {path:?}: {err}"),
		})?;
		let source = Self::from_json_str(&raw)?;

		tracing::info!(
			path = %path.display(),
			campaigns = source.len(CorpusKind::Campaign),
			academy = source.len(CorpusKind::AcademyArticle),
			"Fixture corpus loaded."
		);

		Ok(source)
	}

	pub fn len(&self, corpus: CorpusKind) -> usize {
		self.corpora.get(&corpus).map(Vec::len).unwrap_or(0)
	}

	pub fn is_empty(&self) -> bool {
		self.corpora.values().all(Vec::is_empty)
	}
}

impl DataSource for FixtureSource {
	fn fetch_all<'a>(&'a self, corpus: CorpusKind) -> BoxFuture<'a, Result<Corpus>> {
		let records = self.corpora.get(&corpus).cloned().unwrap_or_default();

		Box::pin(async move { Ok(records) })
	}

	fn name(&self) -> &'static str {
		"fixture"
	}
}

/// Serves repeated fetches from memory until `ttl` elapses. Failed fetches are never cached.
pub struct CachedSource {
	inner: Arc<dyn DataSource>,
	ttl: Duration,
	entries: Mutex<HashMap<CorpusKind, (Instant, Corpus)>>,
}
impl CachedSource {
	pub fn new(inner: Arc<dyn DataSource>, ttl: Duration) -> Self {
		Self { inner, ttl, entries: Mutex::new(HashMap::new()) }
	}

	pub fn invalidate(&self) {
		self.entries.lock().unwrap_or_else(|err| err.into_inner()).clear();
	}

	fn cached(&self, corpus: CorpusKind) -> Option<Corpus> {
		let entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());
		let (fetched_at, records) = entries.get(&corpus)?;

		(fetched_at.elapsed() < self.ttl).then(|| records.clone())
	}
}

impl DataSource for CachedSource {
	fn fetch_all<'a>(&'a self, corpus: CorpusKind) -> BoxFuture<'a, Result<Corpus>> {
		Box::pin(async move {
			if let Some(records) = self.cached(corpus) {
				tracing::debug!(corpus = corpus.as_str(), "Corpus cache hit.");

				return Ok(records);
			}

			let records = self.inner.fetch_all(corpus).await?;

			self.entries
				.lock()
				.unwrap_or_else(|err| err.into_inner())
				.insert(corpus, (Instant::now(), records.clone()));

			Ok(records)
		})
	}

	fn count<'a>(&'a self, corpus: CorpusKind) -> BoxFuture<'a, Result<u64>> {
		self.inner.count(corpus)
	}

	fn name(&self) -> &'static str {
		self.inner.name()
	}
}

pub fn campaign_record(row: CampaignRow) -> Record {
	let mut attributes = Map::new();

	if let Some(rate) = row.commission_rate {
		attributes.insert("commission_rate".to_string(), Value::from(rate));
	}
	if let Some(metrics) = row.performance_metrics {
		attributes.insert("performance_metrics".to_string(), metrics);
	}
	if let Some(status) = row.status {
		attributes.insert("status".to_string(), Value::String(status));
	}

	Record {
		id: row.id.to_string(),
		corpus: CorpusKind::Campaign,
		title: row.name,
		body: row.description.unwrap_or_default(),
		attributes,
		created_at: row.created_at,
		updated_at: row.updated_at,
	}
}

pub fn academy_record(row: AcademyRow) -> Record {
	let mut attributes = Map::new();

	if let Some(category) = row.category {
		attributes.insert("category".to_string(), Value::String(category));
	}
	if let Some(url) = row.url {
		attributes.insert("url".to_string(), Value::String(url));
	}

	Record {
		id: row.id.to_string(),
		corpus: CorpusKind::AcademyArticle,
		title: row.title,
		body: row.content.unwrap_or_default(),
		attributes,
		created_at: row.created_at,
		updated_at: row.updated_at,
	}
}
