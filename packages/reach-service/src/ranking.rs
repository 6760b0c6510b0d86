mod confidence;
mod hybrid;
mod keyword;

pub use confidence::{ConfidencePolicy, confidence};
pub use hybrid::{HybridWeights, combine, resolve_vector_hits};
pub use keyword::{KeywordPolicy, score_keywords};

use std::cmp::Ordering;

/// Descending order with NaN sorted last.
pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}
