use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};
use uuid::Uuid;

use bookd_domain::settings::TenantSettings;
use bookd_storage::{db::Db, jobs, models::Appointment};

use crate::ServiceResult;

pub const JOB_SYNC_SHEET: &str = "sync_sheet";
pub const JOB_NOTIFY_ADMIN: &str = "notify_admin";
pub const JOB_PATIENT_REMINDER: &str = "patient_reminder";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncSheetPayload {
	pub tenant_id: Uuid,
	pub appointment_id: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotifyAdminPayload {
	pub tenant_id: Uuid,
	pub appointment_id: i64,
	pub event: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PatientReminderPayload {
	pub tenant_id: Uuid,
	pub appointment_id: i64,
}

/// Everything a fresh booking needs done off the request path: the sheet
/// sync, the admin heads-up, and the patient reminder.
pub async fn enqueue_post_booking(
	db: &Db,
	reminder_minutes_before: i64,
	settings: &TenantSettings,
	appointment: &Appointment,
) -> ServiceResult<()> {
	let sync = SyncSheetPayload {
		tenant_id: appointment.tenant_id,
		appointment_id: appointment.appointment_id,
	};
	let sync = serde_json::to_value(&sync)
		.map_err(|err| crate::ServiceError::InvalidRequest { message: err.to_string() })?;

	jobs::enqueue(db, JOB_SYNC_SHEET, &sync, None).await?;

	let notify = NotifyAdminPayload {
		tenant_id: appointment.tenant_id,
		appointment_id: appointment.appointment_id,
		event: "booked".to_string(),
	};
	let notify = serde_json::to_value(&notify)
		.map_err(|err| crate::ServiceError::InvalidRequest { message: err.to_string() })?;

	jobs::enqueue(db, JOB_NOTIFY_ADMIN, &notify, None).await?;

	if let Some(run_at) = reminder_run_at(
		appointment,
		settings.hours.utc_offset_minutes,
		reminder_minutes_before,
	) {
		let reminder = PatientReminderPayload {
			tenant_id: appointment.tenant_id,
			appointment_id: appointment.appointment_id,
		};
		let reminder = serde_json::to_value(&reminder)
			.map_err(|err| crate::ServiceError::InvalidRequest { message: err.to_string() })?;

		jobs::enqueue(db, JOB_PATIENT_REMINDER, &reminder, Some(run_at)).await?;
	}

	Ok(())
}

pub async fn enqueue_cancel_notification(
	db: &Db,
	appointment: &Appointment,
) -> ServiceResult<()> {
	let notify = NotifyAdminPayload {
		tenant_id: appointment.tenant_id,
		appointment_id: appointment.appointment_id,
		event: "cancelled".to_string(),
	};
	let notify = serde_json::to_value(&notify)
		.map_err(|err| crate::ServiceError::InvalidRequest { message: err.to_string() })?;

	jobs::enqueue(db, JOB_NOTIFY_ADMIN, &notify, None).await?;
	jobs::cancel_pending(db, JOB_PATIENT_REMINDER, appointment.appointment_id).await?;

	Ok(())
}

/// When the patient reminder should fire, in UTC. `None` when the lead time
/// has already passed, e.g. a same-hour booking.
pub fn reminder_run_at(
	appointment: &Appointment,
	utc_offset_minutes: i32,
	reminder_minutes_before: i64,
) -> Option<OffsetDateTime> {
	let offset = UtcOffset::from_whole_seconds(utc_offset_minutes * 60).ok()?;
	let local = PrimitiveDateTime::new(appointment.date, appointment.time);
	let starts_at = local.assume_offset(offset);
	let run_at = starts_at - Duration::minutes(reminder_minutes_before);

	(run_at > OffsetDateTime::now_utc()).then_some(run_at)
}
