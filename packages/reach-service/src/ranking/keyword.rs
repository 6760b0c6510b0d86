use std::sync::Arc;

use reach_config::Ranking;
use reach_domain::{CorpusKind, Record};

use crate::search::ScoredRecord;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeywordPolicy {
	pub campaign_base_score: f32,
	pub academy_base_score: f32,
	pub general_base_score: f32,
	pub position_decay: f32,
}
impl KeywordPolicy {
	pub fn from_config(ranking: &Ranking) -> Self {
		Self {
			campaign_base_score: ranking.campaign_base_score,
			academy_base_score: ranking.academy_base_score,
			general_base_score: ranking.general_base_score,
			position_decay: ranking.position_decay,
		}
	}

	pub fn base_score(&self, corpus: CorpusKind) -> f32 {
		match corpus {
			CorpusKind::Campaign => self.campaign_base_score,
			CorpusKind::AcademyArticle => self.academy_base_score,
			CorpusKind::General => self.general_base_score,
		}
	}
}

impl Default for KeywordPolicy {
	fn default() -> Self {
		Self::from_config(&Ranking::default())
	}
}

/// Case-insensitive substring matching of the whole query against title and body.
///
/// The i-th match (0-based, in corpus order) scores `base - i * decay`, clamped to `[0, 1]`, and
/// is ranked `i + 1` within this corpus. The hybrid combiner re-ranks across corpora.
pub fn score_keywords(
	query: &str,
	corpus: &[Arc<Record>],
	policy: &KeywordPolicy,
) -> Vec<ScoredRecord> {
	let needle = query.to_lowercase();
	let mut out = Vec::new();

	for (position, record) in corpus.iter().enumerate() {
		let title_match = record.title.to_lowercase().contains(&needle);
		let body_match = !title_match && record.body.to_lowercase().contains(&needle);

		if !title_match && !body_match {
			continue;
		}

		let decay = out.len() as f32 * policy.position_decay;
		let score = (policy.base_score(record.corpus) - decay).clamp(0.0, 1.0);
		let mut item = ScoredRecord::from_keyword(record.clone(), score, position);

		item.rank = out.len() as u32 + 1;

		out.push(item);
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	fn corpus(kind: CorpusKind, rows: &[(&str, &str, &str)]) -> Vec<Arc<Record>> {
		rows.iter()
			.map(|(id, title, body)| Arc::new(Record::new(kind, *id, *title, *body)))
			.collect()
	}

	#[test]
	fn scores_decay_with_match_position() {
		let records = corpus(
			CorpusKind::Campaign,
			&[
				("1", "Summer Fashion Sale", "High-converting fashion campaign"),
				("2", "Tech Gadgets Promo", "Electronics"),
				("3", "Winter Fashion", "Coats"),
			],
		);
		let scored = score_keywords("FASHION", &records, &KeywordPolicy::default());
		let ids = scored.iter().map(|item| item.record.id.as_str()).collect::<Vec<_>>();

		assert_eq!(ids, vec!["1", "3"]);
		assert!((scored[0].keyword_score - 0.8).abs() < 1e-6);
		// Decay follows the match index, not the corpus index.
		assert!((scored[1].keyword_score - 0.75).abs() < 1e-6);
		assert_eq!(scored[1].store_position, 2);
		assert!(scored.iter().all(|item| item.vector_score.is_none()));
		assert_eq!(scored.iter().map(|item| item.rank).collect::<Vec<_>>(), vec![1, 2]);
	}

	#[test]
	fn body_only_matches_count() {
		let records = corpus(
			CorpusKind::AcademyArticle,
			&[("a", "Optimizing Conversion Rates", "Tactics for fashion campaigns")],
		);
		let scored = score_keywords("fashion", &records, &KeywordPolicy::default());

		assert_eq!(scored.len(), 1);
		assert!((scored[0].keyword_score - 0.75).abs() < 1e-6);
	}

	#[test]
	fn scores_never_go_negative() {
		let rows = (0..30).map(|idx| (idx.to_string(), format!("Deal {idx}"))).collect::<Vec<_>>();
		let records = rows
			.iter()
			.map(|(id, title)| {
				Arc::new(Record::new(CorpusKind::General, id.as_str(), title.as_str(), ""))
			})
			.collect::<Vec<_>>();
		let scored = score_keywords("deal", &records, &KeywordPolicy::default());

		assert_eq!(scored.len(), 30);
		assert!(scored.iter().all(|item| (0.0..=1.0).contains(&item.keyword_score)));
		assert_eq!(scored[29].keyword_score, 0.0);
		assert_eq!(scored[29].rank, 30);
	}

	#[test]
	fn no_match_yields_empty() {
		let records = corpus(CorpusKind::Campaign, &[("1", "Summer Fashion Sale", "")]);

		assert!(score_keywords("crypto", &records, &KeywordPolicy::default()).is_empty());
	}
}
