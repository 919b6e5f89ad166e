use serde::Deserialize;
use serde_json::Value;

use crate::hours::{self, HoursSettings};

/// Per-tenant settings stored as jsonb. Missing or malformed settings fall
/// back to defaults rather than failing the request.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct TenantSettings {
	pub name: Option<String>,
	pub admins: Vec<String>,
	pub hours: HoursSettings,
	pub sheet: Option<SheetOverride>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SheetOverride {
	pub spreadsheet_id: String,
	pub tab: Option<String>,
}

impl TenantSettings {
	pub fn from_value(value: Value) -> Self {
		let mut settings: Self = serde_json::from_value(value).unwrap_or_default();

		if settings.hours.slot_minutes == 0 {
			settings.hours.slot_minutes = hours::DEFAULT_SLOT_MINUTES;
		}

		settings
	}
}
