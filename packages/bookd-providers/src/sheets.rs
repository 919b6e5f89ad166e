use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

/// Appends one row to the configured spreadsheet tab. Tenants may override
/// the spreadsheet and tab; blanks fall back to the service-wide config.
pub async fn append_row(
	cfg: &bookd_config::SheetProviderConfig,
	spreadsheet_id: Option<&str>,
	tab: Option<&str>,
	row: &[String],
) -> Result<()> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let spreadsheet_id = spreadsheet_id.unwrap_or(&cfg.spreadsheet_id);

	if spreadsheet_id.is_empty() {
		return Err(eyre::eyre!("No spreadsheet configured."));
	}

	let tab = tab.unwrap_or(&cfg.tab);
	let url = format!(
		"{}/spreadsheets/{spreadsheet_id}/values/{tab}:append?valueInputOption=USER_ENTERED",
		cfg.api_base
	);
	let payload = serde_json::json!({ "values": [row] });
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&payload)
		.send()
		.await?;

	res.error_for_status()?;

	Ok(())
}

/// Best-effort check whether the sheet already holds a live row for the
/// slot. The database unique index remains the authority; this only catches
/// rows entered by hand on the sheet side.
pub async fn scan_slot(
	cfg: &bookd_config::SheetProviderConfig,
	spreadsheet_id: Option<&str>,
	tab: Option<&str>,
	date: &str,
	time: &str,
) -> Result<bool> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let spreadsheet_id = spreadsheet_id.unwrap_or(&cfg.spreadsheet_id);

	if spreadsheet_id.is_empty() {
		return Ok(false);
	}

	let tab = tab.unwrap_or(&cfg.tab);
	let url = format!("{}/spreadsheets/{spreadsheet_id}/values/{tab}", cfg.api_base);
	let res = client
		.get(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	Ok(row_matches_slot(&json, date, time))
}

fn row_matches_slot(json: &Value, date: &str, time: &str) -> bool {
	let Some(rows) = json.get("values").and_then(|v| v.as_array()) else {
		return false;
	};

	rows.iter().any(|row| {
		let Some(cells) = row.as_array() else {
			return false;
		};
		let has = |needle: &str| cells.iter().any(|cell| cell.as_str() == Some(needle));

		has(date) && has(time) && !has("Cancelled")
	})
}
