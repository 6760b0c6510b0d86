use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
	pub input: u64,
	pub output: u64,
	pub total: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
	pub text: String,
	pub usage: TokenUsage,
}

/// Sends an OpenAI-compatible chat completion request and returns the first choice.
pub async fn generate(
	cfg: &reach_config::LlmProviderConfig,
	messages: &[Value],
) -> Result<Generation> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"max_tokens": cfg.max_tokens,
		"messages": messages,
	});
	let res = client
		.post(crate::endpoint(&cfg.api_base, &cfg.path))
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;
	let generation = parse_generation_response(&json)?;

	tracing::debug!(
		provider = %cfg.provider_id,
		input_tokens = generation.usage.input,
		output_tokens = generation.usage.output,
		"Generation completed."
	);

	Ok(generation)
}

fn parse_generation_response(json: &Value) -> Result<Generation> {
	let text = json
		.get("choices")
		.and_then(Value::as_array)
		.and_then(|choices| choices.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|message| message.get("content"))
		.and_then(Value::as_str)
		.ok_or_else(|| Error::InvalidResponse {
			message: "Generation response is missing choices[0].message.content.".to_string(),
		})?;
	let usage = json.get("usage");
	let count = |field: &str| {
		usage.and_then(|usage| usage.get(field)).and_then(Value::as_u64).unwrap_or(0)
	};

	Ok(Generation {
		text: text.to_string(),
		usage: TokenUsage {
			input: count("prompt_tokens"),
			output: count("completion_tokens"),
			total: count("total_tokens"),
		},
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_choice_content_and_usage() {
		let json = serde_json::json!({
			"choices": [{ "message": { "role": "assistant", "content": "Hello." } }],
			"usage": { "prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15 }
		});
		let parsed = parse_generation_response(&json).expect("parse failed");

		assert_eq!(parsed.text, "Hello.");
		assert_eq!(parsed.usage, TokenUsage { input: 12, output: 3, total: 15 });
	}

	#[test]
	fn missing_usage_counts_as_zero() {
		let json = serde_json::json!({ "choices": [{ "message": { "content": "Hi" } }] });
		let parsed = parse_generation_response(&json).expect("parse failed");

		assert_eq!(parsed.usage, TokenUsage::default());
	}

	#[test]
	fn rejects_response_without_choices() {
		let json = serde_json::json!({ "error": "rate limited" });

		assert!(parse_generation_response(&json).is_err());
	}
}
