use std::sync::{Arc, atomic::Ordering};

use time::macros::{date, time};

use bookd_storage::appointments;
use bookd_worker::worker;

use super::*;

#[tokio::test]
#[ignore = "Requires external Postgres. Set BOOKD_PG_DSN to run."]
async fn sweeper_re_enqueues_stranded_sheet_syncs_exactly_once() {
	let Some(test_db) = test_db().await else {
		eprintln!("BOOKD_PG_DSN not set. Skipping.");

		return;
	};
	let sheets = StubSheets::ok();
	let appends = sheets.appends.clone();
	let providers = Providers::new(Arc::new(StubOutbound), Arc::new(sheets), Arc::new(StubReply));
	let state =
		worker_state(test_db.dsn(), providers).await.expect("Failed to build worker state.");
	let tenant_id =
		register_tenant(&state.db, "+15550001").await.expect("Failed to register tenant.");

	// An appointment whose sync job was lost: booked, pending, no job rows.
	let appointment = appointments::insert_booked(
		&state.db,
		tenant_id,
		"+15550101",
		"Alice",
		date!(2027 - 01 - 04),
		time!(10:00),
		"AP-SWEEP1",
	)
	.await
	.expect("Failed to seed appointment.");

	let (_, enqueued) = worker::sweep_once(&state).await.expect("Sweep failed.");
	assert_eq!(enqueued, 1);

	// A pending job already covers it; the sweeper must not stack another.
	let (_, enqueued) = worker::sweep_once(&state).await.expect("Sweep failed.");
	assert_eq!(enqueued, 0);

	let processed =
		worker::process_batch_once(&state).await.expect("Batch processing failed.");

	assert_eq!(processed, 1);
	assert_eq!(appends.load(Ordering::SeqCst), 1);

	let refreshed = appointments::find(&state.db, appointment.appointment_id)
		.await
		.expect("Failed to reload appointment.")
		.expect("Appointment vanished.");

	assert_eq!(refreshed.sync_status, "synced");

	let (_, enqueued) = worker::sweep_once(&state).await.expect("Sweep failed.");
	assert_eq!(enqueued, 0);

	test_db.cleanup().await.expect("Failed to clean up test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set BOOKD_PG_DSN to run."]
async fn failed_sheet_appends_requeue_and_surface_on_the_appointment() {
	let Some(test_db) = test_db().await else {
		eprintln!("BOOKD_PG_DSN not set. Skipping.");

		return;
	};
	let providers = Providers::new(
		Arc::new(StubOutbound),
		Arc::new(StubSheets::failing()),
		Arc::new(StubReply),
	);
	let state = worker_state(test_db.dsn(), providers.clone())
		.await
		.expect("Failed to build worker state.");
	let service = build_service(test_config(test_db.dsn().to_string()), providers)
		.await
		.expect("Failed to build service.");
	let tenant_id =
		register_tenant(&state.db, "+15550001").await.expect("Failed to register tenant.");
	let appointment = appointments::insert_booked(
		&state.db,
		tenant_id,
		"+15550101",
		"Alice",
		date!(2027 - 01 - 04),
		time!(10:00),
		"AP-FAIL01",
	)
	.await
	.expect("Failed to seed appointment.");

	let (_, enqueued) = worker::sweep_once(&state).await.expect("Sweep failed.");
	assert_eq!(enqueued, 1);

	let processed =
		worker::process_batch_once(&state).await.expect("Batch processing failed.");

	assert_eq!(processed, 1);

	let refreshed = appointments::find(&state.db, appointment.appointment_id)
		.await
		.expect("Failed to reload appointment.")
		.expect("Appointment vanished.");

	assert_eq!(refreshed.sync_status, "error");
	assert!(refreshed.sync_error.as_deref().unwrap_or_default().contains("unavailable"));

	// The job went back to queued with a backoff, so the admin retry surface
	// reports the failure without stacking a duplicate.
	let report = service
		.retry_sheet_syncs(tenant_id)
		.await
		.expect("Failed to run sheet retry.");

	assert_eq!(report.failed, 1);
	assert_eq!(report.enqueued, 0);

	let overview = service
		.job_overview(Some("sync_sheet"))
		.await
		.expect("Failed to load job overview.");

	assert_eq!(overview.queued, 1);
	assert_eq!(overview.failed, 0);

	test_db.cleanup().await.expect("Failed to clean up test database.");
}
