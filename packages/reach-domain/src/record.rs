use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

/// One category of searchable records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorpusKind {
	Campaign,
	AcademyArticle,
	General,
}
impl CorpusKind {
	/// Corpora the orchestrator fetches, in tie-break order.
	pub const SEARCHABLE: [CorpusKind; 2] = [CorpusKind::Campaign, CorpusKind::AcademyArticle];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Campaign => "campaign",
			Self::AcademyArticle => "academy_article",
			Self::General => "general",
		}
	}

	/// Position of the corpus when ordering ties across corpora.
	pub fn order(self) -> u8 {
		match self {
			Self::Campaign => 0,
			Self::AcademyArticle => 1,
			Self::General => 2,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
	pub id: String,
	pub corpus: CorpusKind,
	pub title: String,
	#[serde(default)]
	pub body: String,
	/// Corpus-specific fields passed through to formatting untouched.
	#[serde(default)]
	pub attributes: Map<String, Value>,
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub created_at: Option<OffsetDateTime>,
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub updated_at: Option<OffsetDateTime>,
}
impl Record {
	pub fn new(
		corpus: CorpusKind,
		id: impl Into<String>,
		title: impl Into<String>,
		body: impl Into<String>,
	) -> Self {
		Self {
			id: id.into(),
			corpus,
			title: title.into(),
			body: body.into(),
			attributes: Map::new(),
			created_at: None,
			updated_at: None,
		}
	}

	pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
		self.attributes.insert(key.into(), value);

		self
	}

	pub fn key(&self) -> RecordKey {
		RecordKey { corpus: self.corpus, id: self.id.clone() }
	}

	pub fn attribute_str(&self, key: &str) -> Option<&str> {
		self.attributes.get(key).and_then(Value::as_str)
	}

	pub fn attribute_f64(&self, key: &str) -> Option<f64> {
		self.attributes.get(key).and_then(Value::as_f64)
	}
}

impl AsRef<Record> for Record {
	fn as_ref(&self) -> &Record {
		self
	}
}

/// Record identity used for deduplication. Ids are only unique within a corpus.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
	pub corpus: CorpusKind,
	pub id: String,
}
