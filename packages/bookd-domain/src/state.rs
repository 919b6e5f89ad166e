use serde::{Deserialize, Serialize};
use time::{Date, Time};

/// Conversation position in the booking flow. Each case carries exactly the
/// draft fields that are legal at that point, so a draft can never hold a
/// time without a date or a date without a name.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConversationState {
	Idle,
	CollectName,
	CollectDate {
		name: String,
	},
	CollectTime {
		name: String,
		#[serde(with = "crate::time_serde::date")]
		date: Date,
	},
	Confirm {
		name: String,
		#[serde(with = "crate::time_serde::date")]
		date: Date,
		#[serde(with = "crate::time_serde::time_of_day")]
		time: Time,
	},
}
impl ConversationState {
	/// Short operator-facing tag, stored alongside the draft for querying.
	pub fn label(&self) -> &'static str {
		match self {
			Self::Idle => "idle",
			Self::CollectName => "collect_name",
			Self::CollectDate { .. } => "collect_date",
			Self::CollectTime { .. } => "collect_time",
			Self::Confirm { .. } => "confirm",
		}
	}

	pub fn is_idle(&self) -> bool {
		matches!(self, Self::Idle)
	}
}
impl Default for ConversationState {
	fn default() -> Self {
		Self::Idle
	}
}
