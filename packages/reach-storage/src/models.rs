use serde::Deserialize;
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, sqlx::FromRow)]
pub struct CampaignRow {
	pub id: Uuid,
	pub name: String,
	pub description: Option<String>,
	pub commission_rate: Option<f64>,
	pub performance_metrics: Option<Value>,
	#[serde(default)]
	pub status: Option<String>,
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub created_at: Option<OffsetDateTime>,
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub updated_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Deserialize, sqlx::FromRow)]
pub struct AcademyRow {
	pub id: Uuid,
	pub title: String,
	pub content: Option<String>,
	pub category: Option<String>,
	pub url: Option<String>,
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub created_at: Option<OffsetDateTime>,
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub updated_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorpusTable {
	Campaigns,
	Academy,
}
impl CorpusTable {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Campaigns => "campaigns",
			Self::Academy => "academy",
		}
	}
}
