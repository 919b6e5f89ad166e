use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub booking: Booking,
	pub worker: Worker,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub admin_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub outbound: OutboundProviderConfig,
	pub sheets: SheetProviderConfig,
	pub reply: ReplyProviderConfig,
}

/// Delivery endpoint for outbound chat messages (admin notifications and
/// patient reminders). The synchronous webhook reply does not go through
/// this provider; it rides back on the transport response.
#[derive(Debug, Deserialize)]
pub struct OutboundProviderConfig {
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub from_address: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct SheetProviderConfig {
	pub api_base: String,
	pub api_key: String,
	/// Fallback spreadsheet when a tenant has no sheet override in its
	/// settings.
	pub spreadsheet_id: String,
	pub tab: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct ReplyProviderConfig {
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Booking {
	#[serde(default = "default_reminder_minutes_before")]
	pub reminder_minutes_before: i64,
	#[serde(default = "default_ref_code_max_attempts")]
	pub ref_code_max_attempts: u32,
	/// Admin address honored for every tenant, in addition to the admins in
	/// each tenant's settings.
	pub fallback_admin: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Worker {
	pub name: String,
	#[serde(default = "default_batch_size")]
	pub batch_size: u32,
	#[serde(default = "default_poll_interval_ms")]
	pub poll_interval_ms: u64,
	#[serde(default = "default_sweep_interval_secs")]
	pub sweep_interval_secs: u64,
	#[serde(default = "default_sweep_batch")]
	pub sweep_batch: u32,
}

fn default_reminder_minutes_before() -> i64 {
	120
}

fn default_ref_code_max_attempts() -> u32 {
	5
}

fn default_batch_size() -> u32 {
	5
}

fn default_poll_interval_ms() -> u64 {
	2_000
}

fn default_sweep_interval_secs() -> u64 {
	300
}

fn default_sweep_batch() -> u32 {
	20
}
