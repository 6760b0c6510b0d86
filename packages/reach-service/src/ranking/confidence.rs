use reach_config::Ranking;

use crate::search::ScoredRecord;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidencePolicy {
	pub exact_match_score: f32,
	pub no_match_confidence: f32,
	pub floor: f32,
	pub ceiling: f32,
}
impl ConfidencePolicy {
	pub fn from_config(ranking: &Ranking) -> Self {
		Self {
			exact_match_score: ranking.exact_match_score,
			no_match_confidence: ranking.no_match_confidence,
			floor: ranking.confidence_floor,
			ceiling: ranking.confidence_ceiling,
		}
	}
}

impl Default for ConfidencePolicy {
	fn default() -> Self {
		Self::from_config(&Ranking::default())
	}
}

/// Mean combined score of the returned records, clamped to `[floor, ceiling]`.
pub fn confidence(matched: &[ScoredRecord], policy: &ConfidencePolicy) -> f32 {
	if matched.is_empty() {
		return policy.no_match_confidence;
	}

	let total = matched.iter().map(|item| item.combined_score).sum::<f32>();

	(total / matched.len() as f32).clamp(policy.floor, policy.ceiling)
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use reach_domain::{CorpusKind, Record};

	use super::*;

	fn scored(score: f32) -> ScoredRecord {
		let record = Arc::new(Record::new(CorpusKind::Campaign, "1", "Title", ""));
		let mut item = ScoredRecord::from_keyword(record, score, 0);

		item.combined_score = score;

		item
	}

	#[test]
	fn empty_results_use_no_match_confidence() {
		assert_eq!(confidence(&[], &ConfidencePolicy::default()), 0.2);
	}

	#[test]
	fn mean_is_clamped() {
		let policy = ConfidencePolicy::default();

		assert_eq!(confidence(&[scored(0.05), scored(0.1)], &policy), 0.3);
		assert_eq!(confidence(&[scored(1.0)], &policy), 0.95);
		assert!((confidence(&[scored(0.4), scored(0.6)], &policy) - 0.5).abs() < 1e-6);
	}
}
