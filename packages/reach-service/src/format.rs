//! Turns a query result into the assistant's reply text.

use std::sync::Arc;

use serde_json::{Value, json};

use reach_config::LlmProviderConfig;
use reach_domain::{CorpusKind, Record};

use crate::{BoxFuture, GenerationProvider, Result, search::QueryResult};

pub const NO_MATCH_MESSAGE: &str = "I couldn't find any campaigns or academy resources matching your question. Try asking about a specific campaign or a marketing topic.";
pub const EXCERPT_CHARS: usize = 100;
pub const GENERAL_SYSTEM_PROMPT: &str = "You are an assistant for an affiliate marketing community. Answer using only the provided sources. Mention campaign names, commission rates and performance figures when they are relevant. If the sources do not answer the question, say so plainly.";
pub const CAMPAIGN_SYSTEM_PROMPT: &str = "You are an assistant for affiliate marketing campaigns. Give specific, factual answers about the campaigns in the sources: commission rates, performance metrics, status, and how to promote them well. If the sources do not answer the question, say so plainly.";
pub const ACADEMY_SYSTEM_PROMPT: &str = "You are a tutor for an affiliate marketing academy. Explain the concepts and strategies in the sources step by step, with practical examples drawn from them. If the sources do not answer the question, say so plainly.";

pub trait ResponseFormatter
where
	Self: Send + Sync,
{
	fn format<'a>(&'a self, result: &'a QueryResult) -> BoxFuture<'a, Result<String>>;

	/// Whether replies come from a language model rather than a template.
	fn is_generative(&self) -> bool {
		false
	}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateFormatter;
impl TemplateFormatter {
	pub fn render(result: &QueryResult) -> String {
		if result.matched_records.is_empty() {
			return NO_MATCH_MESSAGE.to_string();
		}
		if result.is_exact_match
			&& let Some(first) = result.matched_records.first()
		{
			return render_detail(&first.record);
		}

		let mut sections = vec!["Here's what I found:".to_string()];

		for (corpus, heading) in [
			(CorpusKind::Campaign, "**Campaigns:**"),
			(CorpusKind::AcademyArticle, "**Academy Resources:**"),
			(CorpusKind::General, "**Other Resources:**"),
		] {
			let lines = result
				.matched_records
				.iter()
				.filter(|item| item.record.corpus == corpus)
				.map(|item| render_bullet(&item.record))
				.collect::<Vec<_>>();

			if lines.is_empty() {
				continue;
			}

			sections.push(format!("{heading}\n{}", lines.join("\n")));
		}

		sections.join("\n\n")
	}
}

impl ResponseFormatter for TemplateFormatter {
	fn format<'a>(&'a self, result: &'a QueryResult) -> BoxFuture<'a, Result<String>> {
		Box::pin(async move { Ok(Self::render(result)) })
	}
}

/// Builds a grounded chat prompt from the matched records and returns the model's answer.
///
/// The system prompt follows the corpus of the top-ranked record.
pub struct LlmFormatter {
	cfg: LlmProviderConfig,
	provider: Arc<dyn GenerationProvider>,
}
impl LlmFormatter {
	pub fn new(cfg: LlmProviderConfig, provider: Arc<dyn GenerationProvider>) -> Self {
		Self { cfg, provider }
	}

	pub fn system_prompt(result: &QueryResult) -> &'static str {
		match result.matched_records.first().map(|item| item.record.corpus) {
			Some(CorpusKind::Campaign) => CAMPAIGN_SYSTEM_PROMPT,
			Some(CorpusKind::AcademyArticle) => ACADEMY_SYSTEM_PROMPT,
			Some(CorpusKind::General) | None => GENERAL_SYSTEM_PROMPT,
		}
	}

	pub fn build_messages(&self, result: &QueryResult) -> Vec<Value> {
		let context = build_context(result);
		let user = if context.is_empty() {
			format!(
				"Question: {}\n\nNo matching sources were found. Say that nothing relevant is available and suggest a narrower question.",
				result.query
			)
		} else {
			format!(
				"Sources:\n{context}\n\nQuestion: {}\n\nAnswer the question using the sources above and cite them as [Source N].",
				result.query
			)
		};

		vec![
			json!({ "role": "system", "content": Self::system_prompt(result) }),
			json!({ "role": "user", "content": user }),
		]
	}
}

impl ResponseFormatter for LlmFormatter {
	fn format<'a>(&'a self, result: &'a QueryResult) -> BoxFuture<'a, Result<String>> {
		Box::pin(async move {
			let messages = self.build_messages(result);
			let text = self.provider.generate(&self.cfg, &messages).await?;

			Ok(text.trim().to_string())
		})
	}

	fn is_generative(&self) -> bool {
		true
	}
}

/// Numbered `[Source N] title` blocks, in rank order.
pub fn build_context(result: &QueryResult) -> String {
	result
		.matched_records
		.iter()
		.enumerate()
		.map(|(idx, item)| format!("[Source {}] {}\n{}", idx + 1, item.record.title, item.record.body))
		.collect::<Vec<_>>()
		.join("\n\n")
}

/// First `max_chars` characters of `text`, with `...` appended when it was cut.
pub fn excerpt(text: &str, max_chars: usize) -> String {
	let mut chars = text.chars();
	let head = chars.by_ref().take(max_chars).collect::<String>();

	if chars.next().is_some() { format!("{head}...") } else { head }
}

fn render_detail(record: &Record) -> String {
	let mut lines = vec![format!("**{}**", record.title)];

	match record.corpus {
		CorpusKind::Campaign => {
			if !record.body.is_empty() {
				lines.push(record.body.clone());
			}
			if let Some(rate) = record.attribute_f64("commission_rate") {
				lines.push(format!("- Commission: {rate}%"));
			}
			if let Some(metrics) = record.attributes.get("performance_metrics") {
				lines.push(format!("- Performance: {}", render_metrics(metrics)));
			}
			if let Some(status) = record.attribute_str("status") {
				lines.push(format!("- Status: {status}"));
			}
		},
		CorpusKind::AcademyArticle | CorpusKind::General => {
			if let Some(category) = record.attribute_str("category") {
				lines.push(format!("- Category: {category}"));
			}
			if !record.body.is_empty() {
				lines.push(record.body.clone());
			}
			if let Some(url) = record.attribute_str("url") {
				lines.push(format!("Read more: {url}"));
			}
		},
	}

	lines.join("\n")
}

fn render_bullet(record: &Record) -> String {
	match record.corpus {
		CorpusKind::Campaign => match record.attribute_f64("commission_rate") {
			Some(rate) => format!("• {} ({rate}% commission)", record.title),
			None => format!("• {}", record.title),
		},
		CorpusKind::AcademyArticle | CorpusKind::General =>
			if record.body.is_empty() {
				format!("• {}", record.title)
			} else {
				format!("• {}: {}", record.title, excerpt(&record.body, EXCERPT_CHARS))
			},
	}
}

fn render_metrics(metrics: &Value) -> String {
	match metrics {
		Value::Object(map) => map
			.iter()
			.map(|(key, value)| match value {
				Value::String(raw) => format!("{key} {raw}"),
				other => format!("{key} {other}"),
			})
			.collect::<Vec<_>>()
			.join(", "),
		Value::String(raw) => raw.clone(),
		other => other.to_string(),
	}
}
