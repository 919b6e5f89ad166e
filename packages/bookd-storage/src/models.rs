use serde_json::Value;
use time::{Date, OffsetDateTime, Time};
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
pub struct Channel {
	pub channel_id: Uuid,
	pub tenant_id: Uuid,
	pub provider: String,
	pub to_address: String,
	pub is_active: bool,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct Message {
	pub message_id: i64,
	pub tenant_id: Uuid,
	pub user_address: String,
	pub direction: String,
	pub body: String,
	pub provider_sid: Option<String>,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct Conversation {
	pub tenant_id: Uuid,
	pub user_address: String,
	pub state: String,
	pub draft: Value,
	pub updated_at: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Appointment {
	pub appointment_id: i64,
	pub tenant_id: Uuid,
	pub user_address: String,
	pub name: String,
	pub date: Date,
	pub time: Time,
	pub status: String,
	pub ref_code: String,
	pub sync_status: String,
	pub sync_error: Option<String>,
	pub synced_at: Option<OffsetDateTime>,
	pub cancelled_at: Option<OffsetDateTime>,
	pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Job {
	pub job_id: i64,
	pub job_type: String,
	pub payload: Value,
	pub status: String,
	pub run_at: OffsetDateTime,
	pub attempts: i32,
	pub max_attempts: i32,
	pub last_error: Option<String>,
	pub locked_by: Option<String>,
	pub locked_at: Option<OffsetDateTime>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, Default, sqlx::FromRow)]
pub struct JobCounts {
	pub queued: i64,
	pub running: i64,
	pub done: i64,
	pub failed: i64,
	pub cancelled: i64,
}
