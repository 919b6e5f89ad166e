use std::sync::{Arc, Mutex};

use bookd_service::jobs::JOB_PATIENT_REMINDER;
use bookd_storage::jobs;
use bookd_worker::worker;

use super::*;

#[tokio::test]
#[ignore = "Requires external Postgres. Set BOOKD_PG_DSN to run."]
async fn cancelling_retires_the_reminder_and_notifies_the_admin() {
	let Some(test_db) = test_db().await else {
		eprintln!("BOOKD_PG_DSN not set. Skipping.");

		return;
	};
	let sent = Arc::new(Mutex::new(Vec::new()));
	let providers = Providers::new(
		Arc::new(SpyOutbound { sent: sent.clone() }),
		Arc::new(StubSheets::ok()),
		Arc::new(StubReply),
	);
	let cfg = test_config(test_db.dsn().to_string());
	let service =
		build_service(cfg, providers.clone()).await.expect("Failed to build service.");
	let to = "+15550001";
	let user = "+15550101";
	let tenant_id =
		register_tenant(&service.db, to).await.expect("Failed to register tenant.");

	say(&service, to, user, "book", "SM1").await;
	say(&service, to, user, "Alice", "SM2").await;
	say(&service, to, user, "2027-01-04", "SM3").await;
	say(&service, to, user, "10:00", "SM4").await;

	let reply = say(&service, to, user, "yes", "SM5").await;
	assert!(reply.contains("You're booked!"), "{reply}");

	let appointment = bookd_storage::appointments::latest_booked(&service.db, tenant_id, user)
		.await
		.expect("Failed to load appointment.")
		.expect("No appointment was committed.");

	assert!(
		jobs::has_pending(&service.db, JOB_PATIENT_REMINDER, appointment.appointment_id)
			.await
			.expect("Failed to check pending jobs.")
	);

	let reply = say(&service, to, user, "cancel", "SM6").await;
	assert!(reply.contains("has been cancelled"), "{reply}");

	// The reminder must not survive the cancellation.
	assert!(
		!jobs::has_pending(&service.db, JOB_PATIENT_REMINDER, appointment.appointment_id)
			.await
			.expect("Failed to check pending jobs.")
	);

	// Drain the queue; the reminder never fires and the sweeper has nothing
	// left to resurrect for a cancelled appointment.
	let state =
		worker_state(test_db.dsn(), providers).await.expect("Failed to build worker state.");

	while worker::process_batch_once(&state).await.expect("Batch processing failed.") > 0 {}

	let (reclaimed, enqueued) =
		worker::sweep_once(&state).await.expect("Sweep failed.");

	assert_eq!((reclaimed, enqueued), (0, 0));

	let sent = sent.lock().expect("sent log poisoned");

	assert!(sent.iter().all(|(_, body)| !body.starts_with("Reminder:")));

	// Booking and cancellation each pinged the fallback admin.
	let admin_pings = sent.iter().filter(|(to, _)| to == "+15550999").count();

	assert_eq!(admin_pings, 2);

	test_db.cleanup().await.expect("Failed to clean up test database.");
}
