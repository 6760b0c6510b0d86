//! Exact-entity resolution: decides whether a query names one specific record.
//!
//! The cheap containment checks run first. The word-level check only counts when the query
//! also carries an explicit intent phrase, so a broad question that happens to mention every
//! significant word of a title is not collapsed into a single-record answer.

use crate::record::Record;

/// Phrases that mark a query as asking about one specific item.
pub const INTENT_PHRASES: [&str; 6] =
	["show me", "details", "campaign", "tell me about", "what is", "information"];
/// Title words of this many characters or fewer are ignored by the word-level check.
pub const MAX_INSIGNIFICANT_WORD_LEN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchReason {
	NormalizedSubstring,
	RawSubstring,
	SignificantWords,
}
impl MatchReason {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::NormalizedSubstring => "normalized_substring",
			Self::RawSubstring => "raw_substring",
			Self::SignificantWords => "significant_words",
		}
	}
}

/// Lowercases, replaces every non-alphanumeric character with a space, collapses runs of
/// whitespace and trims.
pub fn normalize(text: &str) -> String {
	let mut spaced = String::with_capacity(text.len());

	for ch in text.chars() {
		if ch.is_alphanumeric() {
			spaced.extend(ch.to_lowercase());
		} else {
			spaced.push(' ');
		}
	}

	spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn matches(query: &str, title: &str) -> bool {
	match_reason(query, title).is_some()
}

pub fn match_reason(query: &str, title: &str) -> Option<MatchReason> {
	let normalized_title = normalize(title);

	if normalized_title.is_empty() {
		return None;
	}

	let normalized_query = normalize(query);

	if normalized_query.contains(&normalized_title) {
		return Some(MatchReason::NormalizedSubstring);
	}

	let raw_title = title.trim().to_lowercase();

	if !raw_title.is_empty() && query.to_lowercase().contains(&raw_title) {
		return Some(MatchReason::RawSubstring);
	}
	if significant_words_match(&normalized_query, &normalized_title)
		&& has_intent_phrase(&normalized_query)
	{
		return Some(MatchReason::SignificantWords);
	}

	None
}

/// Returns the first record, in iteration order, whose title the query names.
pub fn find_exact_match<'a, R, I>(query: &str, records: I) -> Option<(&'a R, MatchReason)>
where
	R: AsRef<Record> + 'a,
	I: IntoIterator<Item = &'a R>,
{
	records.into_iter().find_map(|record| {
		match_reason(query, &record.as_ref().title).map(|reason| (record, reason))
	})
}

fn significant_words_match(normalized_query: &str, normalized_title: &str) -> bool {
	let query_words = normalized_query.split_whitespace().collect::<Vec<_>>();
	let mut significant = normalized_title
		.split_whitespace()
		.filter(|word| word.chars().count() > MAX_INSIGNIFICANT_WORD_LEN)
		.peekable();

	if significant.peek().is_none() {
		return false;
	}

	significant.all(|title_word| query_words.iter().any(|word| word.contains(title_word)))
}

fn has_intent_phrase(normalized_query: &str) -> bool {
	INTENT_PHRASES.iter().any(|phrase| normalized_query.contains(phrase))
}
