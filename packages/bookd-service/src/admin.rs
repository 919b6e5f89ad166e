use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime, UtcOffset};
use uuid::Uuid;

use bookd_domain::{hours, settings::TenantSettings};
use bookd_storage::{appointments, jobs as job_store};

use crate::{BookingService, ServiceResult, jobs};

/// Lock age after which a running job counts as stale in the overview.
const STALE_LOCK_SECS: i64 = 600;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobsReport {
	pub queued: i64,
	pub running: i64,
	pub done: i64,
	pub failed: i64,
	pub cancelled: i64,
	pub stale_running: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SheetRetryReport {
	pub failed: u64,
	pub enqueued: u64,
}

impl BookingService {
	pub async fn job_overview(&self, job_type: Option<&str>) -> ServiceResult<JobsReport> {
		let counts = job_store::counts(&self.db, job_type).await?;
		let cutoff = OffsetDateTime::now_utc() - Duration::seconds(STALE_LOCK_SECS);
		let stale_running = job_store::count_stale_running(&self.db, cutoff, job_type).await?;

		Ok(JobsReport {
			queued: counts.queued,
			running: counts.running,
			done: counts.done,
			failed: counts.failed,
			cancelled: counts.cancelled,
			stale_running,
		})
	}

	pub async fn failed_jobs(
		&self,
		job_type: Option<&str>,
		limit: i64,
	) -> ServiceResult<Vec<bookd_storage::models::Job>> {
		Ok(job_store::list_failed(&self.db, job_type, limit).await?)
	}

	/// Re-enqueues sheet syncs for appointments whose sync errored. Skips any
	/// appointment that already has a live sync job.
	pub async fn retry_sheet_syncs(&self, tenant_id: Uuid) -> ServiceResult<SheetRetryReport> {
		let failed = appointments::failed_sync(&self.db, tenant_id).await?;
		let mut enqueued = 0;

		for appointment in &failed {
			if job_store::has_pending(&self.db, jobs::JOB_SYNC_SHEET, appointment.appointment_id)
				.await?
			{
				continue;
			}

			let payload = serde_json::to_value(jobs::SyncSheetPayload {
				tenant_id: appointment.tenant_id,
				appointment_id: appointment.appointment_id,
			})
			.map_err(|err| crate::ServiceError::InvalidRequest { message: err.to_string() })?;

			job_store::enqueue(&self.db, jobs::JOB_SYNC_SHEET, &payload, None).await?;

			enqueued += 1;
		}

		Ok(SheetRetryReport { failed: failed.len() as u64, enqueued })
	}

	/// Today's booked appointments, on the tenant's wall clock.
	pub(crate) async fn admin_today_reply(
		&self,
		tenant_id: Uuid,
		settings: &TenantSettings,
	) -> ServiceResult<String> {
		let offset = UtcOffset::from_whole_seconds(settings.hours.utc_offset_minutes * 60)
			.unwrap_or(UtcOffset::UTC);
		let today = OffsetDateTime::now_utc().to_offset(offset).date();
		let booked = appointments::booked_on(&self.db, tenant_id, today).await?;

		if booked.is_empty() {
			return Ok("No appointments today.".to_string());
		}

		let lines = booked
			.iter()
			.map(|appointment| {
				format!(
					"{} {} ({})",
					hours::format_time(appointment.time),
					appointment.name,
					appointment.ref_code
				)
			})
			.collect::<Vec<_>>()
			.join("\n");

		Ok(format!("Today's appointments:\n{lines}"))
	}

	pub(crate) async fn admin_retry_sheets_reply(&self, tenant_id: Uuid) -> ServiceResult<String> {
		let report = self.retry_sheet_syncs(tenant_id).await?;

		Ok(format!(
			"Re-enqueued {} sheet sync(s) out of {} failed.",
			report.enqueued, report.failed
		))
	}

	pub(crate) async fn admin_jobs_reply(&self) -> ServiceResult<String> {
		let report = self.job_overview(None).await?;

		Ok(format!(
			"Jobs: queued={} running={} done={} failed={} cancelled={} stale={}",
			report.queued,
			report.running,
			report.done,
			report.failed,
			report.cancelled,
			report.stale_running
		))
	}

	pub(crate) async fn admin_failed_jobs_reply(&self) -> ServiceResult<String> {
		let failed = self.failed_jobs(None, 10).await?;

		if failed.is_empty() {
			return Ok("No failed jobs.".to_string());
		}

		let lines = failed
			.iter()
			.map(|job| {
				let age = OffsetDateTime::now_utc() - job.updated_at;

				format!(
					"#{} {} attempts={} ({} ago): {}",
					job.job_id,
					job.job_type,
					job.attempts,
					humanize(age),
					job.last_error.as_deref().unwrap_or("no error recorded")
				)
			})
			.collect::<Vec<_>>()
			.join("\n");

		Ok(format!("Failed jobs:\n{lines}"))
	}
}

fn humanize(age: Duration) -> String {
	let minutes = age.whole_minutes();

	if minutes < 1 {
		"moments".to_string()
	} else if minutes < 60 {
		format!("{minutes}m")
	} else if minutes < 60 * 24 {
		format!("{}h", minutes / 60)
	} else {
		format!("{}d", minutes / (60 * 24))
	}
}
