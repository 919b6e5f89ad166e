use std::time::Duration;

use color_eyre::Result;
use reqwest::Client;
use serde_json::Value;

/// Delivers one outbound chat message. Returns the provider's message sid
/// when the response carries one.
pub async fn send_message(
	cfg: &bookd_config::OutboundProviderConfig,
	to: &str,
	body: &str,
) -> Result<Option<String>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let payload = serde_json::json!({
		"to": to,
		"from": cfg.from_address,
		"body": body,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&payload)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	Ok(json.get("sid").and_then(|v| v.as_str()).map(str::to_string))
}
