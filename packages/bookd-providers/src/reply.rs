use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

/// One chat turn for the free-text reply collaborator. `role` is either
/// "user" or "assistant".
#[derive(Clone, Debug)]
pub struct ChatTurn {
	pub role: String,
	pub content: String,
}

/// Generates a conversational reply from the system prompt plus the recent
/// message history.
pub async fn generate_reply(
	cfg: &bookd_config::ReplyProviderConfig,
	system_prompt: &str,
	turns: &[ChatTurn],
) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let mut messages = vec![serde_json::json!({ "role": "system", "content": system_prompt })];

	messages.extend(
		turns.iter().map(|turn| serde_json::json!({ "role": turn.role, "content": turn.content })),
	);

	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": messages,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_reply_response(json)
}

fn parse_reply_response(json: Value) -> Result<String> {
	let content = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|choices| choices.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|message| message.get("content"))
		.and_then(|v| v.as_str())
		.ok_or_else(|| eyre::eyre!("Reply response is missing message content."))?;

	Ok(content.trim().to_string())
}
