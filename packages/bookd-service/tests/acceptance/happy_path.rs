use time::macros::{date, time};

use bookd_service::jobs::{JOB_NOTIFY_ADMIN, JOB_PATIENT_REMINDER, JOB_SYNC_SHEET};
use bookd_storage::{appointments, conversations, jobs};

use super::*;

#[tokio::test]
#[ignore = "Requires external Postgres. Set BOOKD_PG_DSN to run."]
async fn booking_conversation_commits_and_enqueues_side_effects() {
	let Some(test_db) = test_db().await else {
		eprintln!("BOOKD_PG_DSN not set. Skipping.");

		return;
	};
	let cfg = test_config(test_db.dsn().to_string());
	let service = build_service(cfg, stub_providers()).await.expect("Failed to build service.");
	let to = "+15550001";
	let user = "+15550101";
	let tenant_id =
		register_tenant(&service.db, to).await.expect("Failed to register tenant.");

	let reply = say(&service, to, user, "book", "SM1").await;
	assert!(reply.contains("What's your name?"), "{reply}");

	let reply = say(&service, to, user, "Alice Chen", "SM2").await;
	assert!(reply.contains("YYYY-MM-DD"), "{reply}");

	// 2027-01-04 is a Monday, well inside default hours.
	let reply = say(&service, to, user, "2027-01-04", "SM3").await;
	assert!(reply.contains("What time"), "{reply}");

	let reply = say(&service, to, user, "10:00", "SM4").await;
	assert!(reply.contains("Reply YES"), "{reply}");

	let reply = say(&service, to, user, "yes", "SM5").await;
	assert!(reply.contains("You're booked!"), "{reply}");

	let appointment = appointments::latest_booked(&service.db, tenant_id, user)
		.await
		.expect("Failed to load appointment.")
		.expect("No appointment was committed.");

	assert_eq!(appointment.name, "Alice Chen");
	assert_eq!(appointment.date, date!(2027 - 01 - 04));
	assert_eq!(appointment.time, time!(10:00));
	assert_eq!(appointment.status, "Booked");
	assert_eq!(appointment.sync_status, "pending");
	assert!(reply.contains(&appointment.ref_code), "{reply}");

	for job_type in [JOB_SYNC_SHEET, JOB_NOTIFY_ADMIN, JOB_PATIENT_REMINDER] {
		let pending = jobs::has_pending(&service.db, job_type, appointment.appointment_id)
			.await
			.expect("Failed to check pending jobs.");

		assert!(pending, "Missing {job_type} job.");
	}

	let state = conversations::load_state(&service.db, tenant_id, user)
		.await
		.expect("Failed to load conversation state.");

	assert!(state.is_idle(), "Conversation was not reset after commit.");

	test_db.cleanup().await.expect("Failed to clean up test database.");
}
