use std::{collections::HashMap, sync::Arc};

use reach_domain::{Record, RecordKey};

use crate::{Error, Result, ranking::cmp_f32_desc, search::ScoredRecord, vector::VectorHit};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HybridWeights {
	pub vector_weight: f32,
	pub keyword_weight: f32,
}
impl HybridWeights {
	/// Weights must be finite and non-negative. They need not sum to 1.
	pub fn new(vector_weight: f32, keyword_weight: f32) -> Result<Self> {
		for (label, value) in [("vector_weight", vector_weight), ("keyword_weight", keyword_weight)]
		{
			if !value.is_finite() || value < 0.0 {
				return Err(Error::InvalidRequest {
					message: format!("{label} must be a finite number of zero or greater."),
				});
			}
		}

		Ok(Self { vector_weight, keyword_weight })
	}
}

/// Maps raw hits back onto the corpus they were scored against. Hits naming an id the corpus does
/// not contain are dropped.
pub fn resolve_vector_hits(hits: Vec<VectorHit>, corpus: &[Arc<Record>]) -> Vec<ScoredRecord> {
	let positions = corpus
		.iter()
		.enumerate()
		.map(|(position, record)| (record.id.as_str(), position))
		.collect::<HashMap<_, _>>();
	let mut out = Vec::with_capacity(hits.len());

	for hit in hits {
		let Some(position) = positions.get(hit.record_id.as_str()).copied() else {
			tracing::warn!(record_id = %hit.record_id, "Vector hit does not match any record.");

			continue;
		};

		out.push(ScoredRecord::from_vector(corpus[position].clone(), hit.vector_score, position));
	}

	out
}

/// Merges keyword and vector results into one ranked list.
///
/// A record's combined score is `vector_score * vector_weight + keyword_score * keyword_weight`,
/// with a missing signal counting as 0. Ties keep corpus order, then store order. Ranks run
/// `1..=n` over the output.
pub fn combine(
	keyword_results: Vec<ScoredRecord>,
	vector_results: Vec<ScoredRecord>,
	weights: HybridWeights,
) -> Vec<ScoredRecord> {
	let mut merged: Vec<ScoredRecord> =
		Vec::with_capacity(keyword_results.len() + vector_results.len());
	let mut index: HashMap<RecordKey, usize> = HashMap::new();

	for item in vector_results {
		let key = item.record.key();

		if index.contains_key(&key) {
			continue;
		}

		let vector_score = item.vector_score.unwrap_or(0.0);

		index.insert(key, merged.len());
		merged.push(ScoredRecord {
			keyword_score: 0.0,
			vector_score: Some(vector_score),
			combined_score: vector_score * weights.vector_weight,
			rank: 0,
			..item
		});
	}

	for item in keyword_results {
		let key = item.record.key();
		let contribution = item.keyword_score * weights.keyword_weight;

		match index.get(&key).copied() {
			Some(existing) => {
				let existing = &mut merged[existing];

				existing.keyword_score = item.keyword_score;
				existing.combined_score += contribution;
			},
			None => {
				index.insert(key, merged.len());
				merged.push(ScoredRecord {
					vector_score: None,
					combined_score: contribution,
					rank: 0,
					..item
				});
			},
		}
	}

	merged.sort_by(|a, b| {
		cmp_f32_desc(a.combined_score, b.combined_score)
			.then_with(|| a.record.corpus.order().cmp(&b.record.corpus.order()))
			.then_with(|| a.store_position.cmp(&b.store_position))
	});

	for (idx, item) in merged.iter_mut().enumerate() {
		item.rank = idx as u32 + 1;
	}

	merged
}

#[cfg(test)]
mod tests {
	use reach_domain::CorpusKind;

	use super::*;

	fn record(kind: CorpusKind, id: &str) -> Arc<Record> {
		Arc::new(Record::new(kind, id, format!("Record {id}"), ""))
	}

	#[test]
	fn weighted_sum_orders_results() {
		let a = record(CorpusKind::Campaign, "A");
		let b = record(CorpusKind::Campaign, "B");
		let combined = combine(
			vec![ScoredRecord::from_keyword(a.clone(), 0.8, 0)],
			vec![ScoredRecord::from_vector(a, 0.6, 0), ScoredRecord::from_vector(b, 0.5, 1)],
			HybridWeights::new(0.7, 0.3).expect("valid weights"),
		);

		assert_eq!(combined.len(), 2);
		assert_eq!(combined[0].record.id, "A");
		assert!((combined[0].combined_score - 0.66).abs() < 1e-6);
		assert_eq!(combined[0].keyword_score, 0.8);
		assert_eq!(combined[0].vector_score, Some(0.6));
		assert_eq!(combined[1].record.id, "B");
		assert!((combined[1].combined_score - 0.35).abs() < 1e-6);
		assert_eq!(combined[1].keyword_score, 0.0);
		assert_eq!(combined.iter().map(|item| item.rank).collect::<Vec<_>>(), vec![1, 2]);
	}

	#[test]
	fn same_id_in_different_corpora_is_two_records() {
		let campaign = record(CorpusKind::Campaign, "1");
		let article = record(CorpusKind::AcademyArticle, "1");
		let combined = combine(
			vec![
				ScoredRecord::from_keyword(article, 0.75, 0),
				ScoredRecord::from_keyword(campaign, 0.75, 0),
			],
			Vec::new(),
			HybridWeights::new(0.3, 0.7).expect("valid weights"),
		);

		assert_eq!(combined.len(), 2);
		// Equal scores fall back to corpus order.
		assert_eq!(combined[0].record.corpus, CorpusKind::Campaign);
		assert_eq!(combined[1].record.corpus, CorpusKind::AcademyArticle);
	}

	#[test]
	fn ties_within_a_corpus_keep_store_order() {
		let first = record(CorpusKind::Campaign, "x");
		let second = record(CorpusKind::Campaign, "y");
		let combined = combine(
			vec![
				ScoredRecord::from_keyword(second, 0.5, 4),
				ScoredRecord::from_keyword(first, 0.5, 1),
			],
			Vec::new(),
			HybridWeights::new(0.0, 1.0).expect("valid weights"),
		);

		assert_eq!(combined[0].record.id, "x");
		assert_eq!(combined[1].record.id, "y");
	}

	#[test]
	fn unknown_vector_ids_are_dropped() {
		let corpus = vec![record(CorpusKind::Campaign, "known")];
		let resolved = resolve_vector_hits(
			vec![
				VectorHit { record_id: "ghost".to_string(), vector_score: 0.9 },
				VectorHit { record_id: "known".to_string(), vector_score: 0.8 },
			],
			&corpus,
		);

		assert_eq!(resolved.len(), 1);
		assert_eq!(resolved[0].record.id, "known");
		assert_eq!(resolved[0].vector_score, Some(0.8));
	}

	#[test]
	fn invalid_weights_are_rejected() {
		assert!(HybridWeights::new(-0.1, 0.5).is_err());
		assert!(HybridWeights::new(0.5, f32::NAN).is_err());
		assert!(HybridWeights::new(0.0, 0.0).is_ok());
	}
}
