use std::time::Duration as StdDuration;

use color_eyre::{Result, eyre};
use time::{Duration, OffsetDateTime};
use tokio::time as tokio_time;

use bookd_domain::hours;
use bookd_service::{
	Providers,
	jobs::{
		JOB_NOTIFY_ADMIN, JOB_PATIENT_REMINDER, JOB_SYNC_SHEET, NotifyAdminPayload,
		PatientReminderPayload, SyncSheetPayload,
	},
};
use bookd_storage::{
	appointments,
	db::Db,
	jobs,
	models::{Appointment, Job},
	tenants,
};

/// A lock older than this belongs to a worker that died mid-job.
const STALE_LOCK_SECS: i64 = 600;

pub struct WorkerState {
	pub cfg: bookd_config::Config,
	pub db: Db,
	pub providers: Providers,
}

pub async fn run_worker(state: WorkerState) -> Result<()> {
	let mut last_sweep = OffsetDateTime::now_utc();

	tracing::info!(worker = %state.cfg.worker.name, "Worker started.");

	loop {
		if let Err(err) = process_batch_once(&state).await {
			tracing::error!(error = %err, "Job batch processing failed.");
		}

		let now = OffsetDateTime::now_utc();

		if now - last_sweep >= Duration::seconds(state.cfg.worker.sweep_interval_secs as i64) {
			if let Err(err) = sweep_once(&state).await {
				tracing::error!(error = %err, "Sweep failed.");
			} else {
				last_sweep = now;
			}
		}

		tokio_time::sleep(StdDuration::from_millis(state.cfg.worker.poll_interval_ms)).await;
	}
}

/// Claims and executes one batch of due jobs. Returns the batch size.
pub async fn process_batch_once(state: &WorkerState) -> Result<usize> {
	let batch = jobs::claim(
		&state.db,
		&state.cfg.worker.name,
		state.cfg.worker.batch_size as i64,
	)
	.await?;

	for job in &batch {
		match execute_job(state, job).await {
			Ok(()) => {
				jobs::ack_done(&state.db, job.job_id).await?;
			},
			Err(err) => {
				tracing::warn!(
					job_id = job.job_id,
					job_type = %job.job_type,
					attempt = job.attempts + 1,
					"Job failed: {err}.",
				);
				jobs::ack_retry(&state.db, job, &err.to_string()).await?;
			},
		}
	}

	Ok(batch.len())
}

/// Requeues stale running jobs and re-enqueues sheet syncs for appointments
/// a lost job left behind. Returns (reclaimed, re-enqueued).
pub async fn sweep_once(state: &WorkerState) -> Result<(u64, u64)> {
	let cutoff = OffsetDateTime::now_utc() - Duration::seconds(STALE_LOCK_SECS);
	let reclaimed =
		jobs::reclaim_stale(&state.db, cutoff, state.cfg.worker.sweep_batch as i64).await?;

	if reclaimed > 0 {
		tracing::info!(count = reclaimed, "Reclaimed stale running jobs.");
	}

	let stranded =
		appointments::unsynced(&state.db, state.cfg.worker.sweep_batch as i64).await?;
	let mut enqueued = 0;

	for appointment in &stranded {
		if jobs::has_pending(&state.db, JOB_SYNC_SHEET, appointment.appointment_id).await? {
			continue;
		}

		let payload = serde_json::to_value(SyncSheetPayload {
			tenant_id: appointment.tenant_id,
			appointment_id: appointment.appointment_id,
		})?;

		jobs::enqueue(&state.db, JOB_SYNC_SHEET, &payload, None).await?;

		enqueued += 1;
	}

	if enqueued > 0 {
		tracing::info!(count = enqueued, "Re-enqueued sheet syncs for stranded appointments.");
	}

	Ok((reclaimed, enqueued))
}

async fn execute_job(state: &WorkerState, job: &Job) -> Result<()> {
	match job.job_type.as_str() {
		JOB_SYNC_SHEET => handle_sync_sheet(state, job).await,
		JOB_NOTIFY_ADMIN => handle_notify_admin(state, job).await,
		JOB_PATIENT_REMINDER => handle_patient_reminder(state, job).await,
		other => {
			// Unknown types are acked rather than retried; retrying can never
			// make them succeed.
			tracing::warn!(job_id = job.job_id, "Unknown job type {other:?}. Marking done.");

			Ok(())
		},
	}
}

async fn handle_sync_sheet(state: &WorkerState, job: &Job) -> Result<()> {
	let payload: SyncSheetPayload = serde_json::from_value(job.payload.clone())?;
	let Some(appointment) =
		appointments::find(&state.db, payload.appointment_id).await?
	else {
		tracing::info!(
			appointment_id = payload.appointment_id,
			"Appointment missing for sheet sync. Marking done.",
		);

		return Ok(());
	};
	let settings = tenants::load_settings(&state.db, payload.tenant_id).await?;
	let (spreadsheet_id, tab) = match &settings.sheet {
		Some(sheet) => (Some(sheet.spreadsheet_id.as_str()), sheet.tab.as_deref()),
		None => (None, None),
	};
	let row = sheet_row(&appointment);
	let result = state
		.providers
		.sheets
		.append_row(&state.cfg.providers.sheets, spreadsheet_id, tab, &row)
		.await;

	match result {
		Ok(()) => {
			appointments::mark_synced(&state.db, appointment.appointment_id).await?;

			Ok(())
		},
		Err(err) => {
			appointments::mark_sync_error(&state.db, appointment.appointment_id, &err.to_string())
				.await?;

			Err(err)
		},
	}
}

async fn handle_notify_admin(state: &WorkerState, job: &Job) -> Result<()> {
	let payload: NotifyAdminPayload = serde_json::from_value(job.payload.clone())?;
	let Some(appointment) =
		appointments::find(&state.db, payload.appointment_id).await?
	else {
		tracing::info!(
			appointment_id = payload.appointment_id,
			"Appointment missing for admin notification. Marking done.",
		);

		return Ok(());
	};
	let settings = tenants::load_settings(&state.db, payload.tenant_id).await?;
	let mut admins = settings.admins.clone();

	if admins.is_empty() {
		if let Some(fallback) = state.cfg.booking.fallback_admin.clone() {
			admins.push(fallback);
		}
	}
	if admins.is_empty() {
		tracing::info!(tenant_id = %payload.tenant_id, "No admins configured. Marking done.");

		return Ok(());
	}

	let verb = match payload.event.as_str() {
		"booked" => "New booking",
		"cancelled" => "Cancellation",
		other => return Err(eyre::eyre!("Unknown admin notification event: {other:?}.")),
	};
	let body = format!(
		"{verb}: {} on {} at {} ({}).",
		appointment.name,
		hours::format_date(appointment.date),
		hours::format_time(appointment.time),
		appointment.ref_code
	);

	for admin in &admins {
		state
			.providers
			.outbound
			.send_message(&state.cfg.providers.outbound, admin, &body)
			.await?;
	}

	Ok(())
}

async fn handle_patient_reminder(state: &WorkerState, job: &Job) -> Result<()> {
	let payload: PatientReminderPayload = serde_json::from_value(job.payload.clone())?;
	let Some(appointment) =
		appointments::find(&state.db, payload.appointment_id).await?
	else {
		tracing::info!(
			appointment_id = payload.appointment_id,
			"Appointment missing for reminder. Marking done.",
		);

		return Ok(());
	};

	// A cancellation after scheduling leaves the reminder behind; it must
	// stay silent.
	if appointment.status != "Booked" {
		tracing::info!(
			appointment_id = appointment.appointment_id,
			status = %appointment.status,
			"Appointment no longer booked. Skipping reminder.",
		);

		return Ok(());
	}

	let body = format!(
		"Reminder: {}, you have an appointment on {} at {} ({}). Reply 'cancel {}' if you can't make it.",
		appointment.name,
		hours::format_date(appointment.date),
		hours::format_time(appointment.time),
		appointment.ref_code,
		appointment.ref_code
	);

	state
		.providers
		.outbound
		.send_message(&state.cfg.providers.outbound, &appointment.user_address, &body)
		.await?;

	Ok(())
}

fn sheet_row(appointment: &Appointment) -> Vec<String> {
	vec![
		appointment.ref_code.clone(),
		appointment.name.clone(),
		appointment.user_address.clone(),
		hours::format_date(appointment.date),
		hours::format_time(appointment.time),
		appointment.status.clone(),
		appointment.created_at.to_string(),
	]
}
