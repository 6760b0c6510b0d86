//! The semantic signal. Without an embedding provider the scorer is a stub that never produces
//! hits, and the orchestrator leans on keyword weights instead.

use std::{
	collections::HashMap,
	sync::{
		Arc, Mutex,
		atomic::{AtomicU64, Ordering},
	},
};

use reach_config::EmbeddingProviderConfig;
use reach_domain::Record;

use crate::{BoxFuture, EmbeddingProvider, Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct VectorHit {
	pub record_id: String,
	/// Similarity mapped into `[0, 1]`.
	pub vector_score: f32,
}

pub trait VectorScorer
where
	Self: Send + Sync,
{
	/// Hits for the records of one corpus that clear the similarity threshold, in corpus order.
	fn embed_and_score<'a>(
		&'a self,
		query: &'a str,
		corpus: &'a [Arc<Record>],
	) -> BoxFuture<'a, Result<Vec<VectorHit>>>;

	/// Whether hits can ever be non-empty. Drives the default hybrid weights.
	fn is_available(&self) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullVectorScorer;

impl VectorScorer for NullVectorScorer {
	fn embed_and_score<'a>(
		&'a self,
		_query: &'a str,
		_corpus: &'a [Arc<Record>],
	) -> BoxFuture<'a, Result<Vec<VectorHit>>> {
		Box::pin(async { Ok(Vec::new()) })
	}

	fn is_available(&self) -> bool {
		false
	}
}

pub const DEFAULT_CACHE_CAPACITY: usize = 1_024;

/// Embeds the query and each record's `title` + `body`, keeping records whose cosine similarity
/// reaches `min_similarity`. Record embeddings are memoized by content hash, up to
/// `cache_capacity` entries; the query is embedded on every call.
pub struct EmbeddingVectorScorer {
	cfg: EmbeddingProviderConfig,
	provider: Arc<dyn EmbeddingProvider>,
	min_similarity: f32,
	cache_capacity: usize,
	cache: Mutex<HashMap<String, CachedEmbedding>>,
	/// Bumped once per scoring call; orders cache entries by recency.
	clock: AtomicU64,
}
impl EmbeddingVectorScorer {
	pub fn new(
		cfg: EmbeddingProviderConfig,
		provider: Arc<dyn EmbeddingProvider>,
		min_similarity: f32,
	) -> Self {
		Self {
			cfg,
			provider,
			min_similarity,
			cache_capacity: DEFAULT_CACHE_CAPACITY,
			cache: Mutex::new(HashMap::new()),
			clock: AtomicU64::new(0),
		}
	}

	pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
		self.cache_capacity = capacity.max(1);

		self
	}

	pub fn cached_embeddings(&self) -> usize {
		self.cache.lock().unwrap_or_else(|err| err.into_inner()).len()
	}

	fn cache_key(&self, text: &str) -> String {
		let mut hasher = blake3::Hasher::new();

		hasher.update(self.cfg.provider_id.as_bytes());
		hasher.update(b"\0");
		hasher.update(self.cfg.model.as_bytes());
		hasher.update(b"\0");
		hasher.update(text.as_bytes());

		hasher.finalize().to_hex().to_string()
	}

	/// One provider call: the query first, then every record text the memo does not hold.
	async fn embed_query_and_records(
		&self,
		query: &str,
		texts: &[String],
	) -> Result<(Vec<f32>, Vec<Arc<Vec<f32>>>)> {
		let keys = texts.iter().map(|text| self.cache_key(text)).collect::<Vec<_>>();
		let now = self.clock.fetch_add(1, Ordering::Relaxed);
		let mut resolved = {
			let mut cache = self.cache.lock().unwrap_or_else(|err| err.into_inner());

			keys.iter()
				.map(|key| {
					cache.get_mut(key).map(|entry| {
						entry.last_used = now;

						entry.vector.clone()
					})
				})
				.collect::<Vec<_>>()
		};
		let missing = resolved
			.iter()
			.enumerate()
			.filter(|(_, vec)| vec.is_none())
			.map(|(idx, _)| idx)
			.collect::<Vec<_>>();
		let mut batch = Vec::with_capacity(missing.len() + 1);

		batch.push(query.to_string());
		batch.extend(missing.iter().map(|idx| texts[*idx].clone()));

		let vectors = self.provider.embed(&self.cfg, &batch).await?;

		if vectors.len() != batch.len() {
			return Err(Error::Provider {
				message: format!(
					"Embedding provider returned {} vectors for {} inputs.",
					vectors.len(),
					batch.len()
				),
			});
		}
		if vectors.iter().any(|vec| vec.len() != self.cfg.dimensions as usize) {
			return Err(Error::Provider {
				message: "Embedding vector dimension mismatch.".to_string(),
			});
		}

		let mut vectors = vectors.into_iter();
		let query_vec = vectors.next().unwrap_or_default();

		if !missing.is_empty() {
			let mut cache = self.cache.lock().unwrap_or_else(|err| err.into_inner());

			for (idx, vec) in missing.into_iter().zip(vectors) {
				let vector = Arc::new(vec);

				cache.insert(
					keys[idx].clone(),
					CachedEmbedding { vector: vector.clone(), last_used: now },
				);

				resolved[idx] = Some(vector);
			}

			evict_least_recent(&mut cache, self.cache_capacity);
		}

		Ok((query_vec, resolved.into_iter().flatten().collect()))
	}
}

struct CachedEmbedding {
	vector: Arc<Vec<f32>>,
	last_used: u64,
}

fn evict_least_recent(cache: &mut HashMap<String, CachedEmbedding>, capacity: usize) {
	let overflow = cache.len().saturating_sub(capacity);

	if overflow == 0 {
		return;
	}

	let mut by_age =
		cache.iter().map(|(key, entry)| (entry.last_used, key.clone())).collect::<Vec<_>>();

	by_age.sort_unstable_by(|a, b| a.0.cmp(&b.0));

	for (_, key) in by_age.into_iter().take(overflow) {
		cache.remove(&key);
	}

	tracing::debug!(evicted = overflow, capacity, "Embedding cache trimmed.");
}

impl VectorScorer for EmbeddingVectorScorer {
	fn embed_and_score<'a>(
		&'a self,
		query: &'a str,
		corpus: &'a [Arc<Record>],
	) -> BoxFuture<'a, Result<Vec<VectorHit>>> {
		Box::pin(async move {
			if corpus.is_empty() {
				return Ok(Vec::new());
			}

			let texts = corpus.iter().map(|record| embedding_text(record)).collect::<Vec<_>>();
			let (query_vec, record_vecs) = self.embed_query_and_records(query, &texts).await?;
			let hits = corpus
				.iter()
				.zip(&record_vecs)
				.filter_map(|(record, vec)| {
					let similarity = cosine_similarity(&query_vec, vec);

					(similarity >= self.min_similarity).then(|| VectorHit {
						record_id: record.id.clone(),
						vector_score: similarity.clamp(0.0, 1.0),
					})
				})
				.collect::<Vec<_>>();

			tracing::debug!(
				candidates = corpus.len(),
				hits = hits.len(),
				min_similarity = self.min_similarity,
				"Vector scoring finished."
			);

			Ok(hits)
		})
	}

	fn is_available(&self) -> bool {
		true
	}
}

pub fn embedding_text(record: &Record) -> String {
	if record.body.is_empty() {
		return record.title.clone();
	}

	format!("{}\n{}", record.title, record.body)
}

/// Zero-length or zero-norm vectors have similarity 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
	if a.len() != b.len() || a.is_empty() {
		return 0.0;
	}

	let mut dot = 0.0_f32;
	let mut norm_a = 0.0_f32;
	let mut norm_b = 0.0_f32;

	for (x, y) in a.iter().zip(b) {
		dot += x * y;
		norm_a += x * x;
		norm_b += y * y;
	}

	if norm_a == 0.0 || norm_b == 0.0 {
		return 0.0;
	}

	dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::AtomicUsize;

	use serde_json::Map;

	use super::*;

	/// Two-dimensional vectors; texts containing "broken" come back one-dimensional.
	struct StubEmbedding {
		inputs: AtomicUsize,
	}
	impl EmbeddingProvider for StubEmbedding {
		fn embed<'a>(
			&'a self,
			_cfg: &'a EmbeddingProviderConfig,
			texts: &'a [String],
		) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
			self.inputs.fetch_add(texts.len(), Ordering::SeqCst);

			let vectors = texts
				.iter()
				.map(|text| if text.contains("broken") { vec![1.0] } else { vec![1.0, 0.0] })
				.collect::<Vec<_>>();

			Box::pin(async move { Ok(vectors) })
		}
	}

	fn scorer(provider: Arc<StubEmbedding>) -> EmbeddingVectorScorer {
		let cfg = EmbeddingProviderConfig {
			provider_id: "stub".to_string(),
			api_base: "http://127.0.0.1:1".to_string(),
			api_key: "stub-key".to_string(),
			path: "/embeddings".to_string(),
			model: "stub-embedding".to_string(),
			dimensions: 2,
			timeout_ms: 1_000,
			default_headers: Map::new(),
		};

		EmbeddingVectorScorer::new(cfg, provider, 0.7)
	}

	fn campaigns(titles: &[&str]) -> Vec<Arc<Record>> {
		titles
			.iter()
			.enumerate()
			.map(|(idx, title)| {
				Arc::new(Record::new(
					reach_domain::CorpusKind::Campaign,
					idx.to_string(),
					*title,
					"",
				))
			})
			.collect()
	}

	#[tokio::test]
	async fn distinct_queries_do_not_grow_the_cache() {
		let provider = Arc::new(StubEmbedding { inputs: AtomicUsize::new(0) });
		let scorer = scorer(provider.clone());
		let corpus = campaigns(&["Summer Fashion Sale"]);

		for idx in 0..1_000 {
			scorer
				.embed_and_score(&format!("query {idx}"), &corpus)
				.await
				.expect("scoring failed");
		}

		assert_eq!(scorer.cached_embeddings(), 1);
		// One record embedding plus one query embedding per call.
		assert_eq!(provider.inputs.load(Ordering::SeqCst), 1_001);
	}

	#[tokio::test]
	async fn cache_evicts_least_recently_used_records() {
		let provider = Arc::new(StubEmbedding { inputs: AtomicUsize::new(0) });
		let scorer = scorer(provider.clone()).with_cache_capacity(2);
		let first = campaigns(&["Summer Fashion Sale"]);
		let rest = campaigns(&["Tech Gadgets Promo", "Home & Garden"]);

		scorer.embed_and_score("fashion", &first).await.expect("scoring failed");
		scorer.embed_and_score("gadgets", &rest).await.expect("scoring failed");

		assert_eq!(scorer.cached_embeddings(), 2);

		let before = provider.inputs.load(Ordering::SeqCst);

		scorer.embed_and_score("gadgets", &rest).await.expect("scoring failed");

		// Only the query is embedded again; both newer records are still memoized.
		assert_eq!(provider.inputs.load(Ordering::SeqCst), before + 1);
	}

	#[tokio::test]
	async fn dimension_mismatch_caches_nothing() {
		let provider = Arc::new(StubEmbedding { inputs: AtomicUsize::new(0) });
		let scorer = scorer(provider);
		let corpus = campaigns(&["Summer Fashion Sale", "broken listing"]);
		let err = scorer
			.embed_and_score("fashion", &corpus)
			.await
			.expect_err("Expected dimension mismatch.");

		assert!(err.to_string().contains("dimension mismatch"), "Unexpected error: {err}");
		assert_eq!(scorer.cached_embeddings(), 0);
	}

	#[test]
	fn cosine_handles_degenerate_vectors() {
		assert_eq!(cosine_similarity(&[], &[]), 0.0);
		assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
		assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
		assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
	}

	#[test]
	fn embedding_text_skips_empty_body() {
		let bare = Record::new(reach_domain::CorpusKind::Campaign, "1", "Title", "");
		let full = Record::new(reach_domain::CorpusKind::Campaign, "1", "Title", "Body");

		assert_eq!(embedding_text(&bare), "Title");
		assert_eq!(embedding_text(&full), "Title\nBody");
	}
}
