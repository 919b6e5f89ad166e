use serde_json::json;
use time::macros::{date, time};
use uuid::Uuid;

use bookd_config::Postgres;
use bookd_storage::{Error, appointments, conversations, db::Db, messages, tenants};
use bookd_testkit::TestDatabase;

use bookd_domain::state::ConversationState;

async fn bootstrap(base_dsn: &str) -> (TestDatabase, Db) {
	let test_db = TestDatabase::new(base_dsn).await.expect("Failed to create test database.");
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 4 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	(test_db, db)
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set BOOKD_PG_DSN to run."]
async fn booked_slot_rejects_a_second_booking() {
	let Some(base_dsn) = bookd_testkit::env_dsn() else {
		eprintln!("Skipping booked_slot_rejects_a_second_booking; set BOOKD_PG_DSN to run.");

		return;
	};
	let (test_db, db) = bootstrap(&base_dsn).await;
	let tenant_id = Uuid::new_v4();
	let slot_date = date!(2026 - 09 - 03);
	let slot_time = time!(14:00);

	let first = appointments::insert_booked(
		&db,
		tenant_id,
		"+15550100001",
		"Alice",
		slot_date,
		slot_time,
		"AP-AAA111",
	)
	.await
	.expect("Failed to book first appointment.");

	assert_eq!(first.status, "Booked");
	assert_eq!(first.sync_status, "pending");
	assert!(appointments::slot_taken(&db, tenant_id, slot_date, slot_time)
		.await
		.expect("Failed to check slot."));

	let second = appointments::insert_booked(
		&db,
		tenant_id,
		"+15550100002",
		"Bob",
		slot_date,
		slot_time,
		"AP-BBB222",
	)
	.await;

	assert!(matches!(second, Err(Error::SlotTaken)), "Expected SlotTaken: {second:?}");

	// Another tenant may book the same wall-clock slot.
	appointments::insert_booked(
		&db,
		Uuid::new_v4(),
		"+15550100003",
		"Carol",
		slot_date,
		slot_time,
		"AP-CCC333",
	)
	.await
	.expect("Failed to book in the other tenant.");

	// Cancelling frees the slot for a new booking.
	let cancelled = appointments::cancel_latest(&db, tenant_id, "+15550100001")
		.await
		.expect("Failed to cancel.")
		.expect("Expected a booked appointment to cancel.");

	assert_eq!(cancelled.status, "Cancelled");
	assert!(cancelled.cancelled_at.is_some());

	appointments::insert_booked(
		&db,
		tenant_id,
		"+15550100002",
		"Bob",
		slot_date,
		slot_time,
		"AP-BBB222",
	)
	.await
	.expect("Failed to rebook the freed slot.");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set BOOKD_PG_DSN to run."]
async fn ref_code_collision_is_reported_distinctly() {
	let Some(base_dsn) = bookd_testkit::env_dsn() else {
		eprintln!("Skipping ref_code_collision_is_reported_distinctly; set BOOKD_PG_DSN to run.");

		return;
	};
	let (test_db, db) = bootstrap(&base_dsn).await;
	let tenant_id = Uuid::new_v4();

	appointments::insert_booked(
		&db,
		tenant_id,
		"+15550100001",
		"Alice",
		date!(2026 - 09 - 03),
		time!(10:00),
		"AP-SAME00",
	)
	.await
	.expect("Failed to book.");

	let clash = appointments::insert_booked(
		&db,
		tenant_id,
		"+15550100002",
		"Bob",
		date!(2026 - 09 - 04),
		time!(10:00),
		"AP-SAME00",
	)
	.await;

	assert!(matches!(clash, Err(Error::RefCodeCollision)), "Expected collision: {clash:?}");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set BOOKD_PG_DSN to run."]
async fn cancel_by_ref_enforces_ownership() {
	let Some(base_dsn) = bookd_testkit::env_dsn() else {
		eprintln!("Skipping cancel_by_ref_enforces_ownership; set BOOKD_PG_DSN to run.");

		return;
	};
	let (test_db, db) = bootstrap(&base_dsn).await;
	let tenant_id = Uuid::new_v4();

	appointments::insert_booked(
		&db,
		tenant_id,
		"+15550100001",
		"Alice",
		date!(2026 - 09 - 03),
		time!(10:00),
		"AP-OWNED1",
	)
	.await
	.expect("Failed to book.");

	let stranger = appointments::cancel_by_ref(&db, tenant_id, "+15550100002", "AP-OWNED1").await;

	assert!(matches!(stranger, Err(Error::NotOwner)), "Expected NotOwner: {stranger:?}");

	let missing = appointments::cancel_by_ref(&db, tenant_id, "+15550100001", "AP-NOPE99").await;

	assert!(matches!(missing, Err(Error::NotFound(_))), "Expected NotFound: {missing:?}");

	let cancelled = appointments::cancel_by_ref(&db, tenant_id, "+15550100001", "AP-OWNED1")
		.await
		.expect("Failed to cancel by ref.");

	assert_eq!(cancelled.status, "Cancelled");

	// A cancelled appointment cannot be cancelled twice.
	let again = appointments::cancel_by_ref(&db, tenant_id, "+15550100001", "AP-OWNED1").await;

	assert!(matches!(again, Err(Error::NotFound(_))), "Expected NotFound: {again:?}");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set BOOKD_PG_DSN to run."]
async fn inbound_messages_deduplicate_on_provider_sid() {
	let Some(base_dsn) = bookd_testkit::env_dsn() else {
		eprintln!("Skipping inbound_messages_deduplicate_on_provider_sid; set BOOKD_PG_DSN to run.");

		return;
	};
	let (test_db, db) = bootstrap(&base_dsn).await;
	let tenant_id = Uuid::new_v4();

	let fresh = messages::record_inbound(&db, tenant_id, "+15550100001", "hi", Some("SM123"))
		.await
		.expect("Failed to record inbound.");

	assert!(fresh);

	let replay = messages::record_inbound(&db, tenant_id, "+15550100001", "hi", Some("SM123"))
		.await
		.expect("Failed to record replay.");

	assert!(!replay);

	// Messages without a provider sid are never deduplicated.
	for _ in 0..2 {
		let stored = messages::record_inbound(&db, tenant_id, "+15550100001", "hello", None)
			.await
			.expect("Failed to record inbound.");

		assert!(stored);
	}

	messages::record_outbound(&db, tenant_id, "+15550100001", "welcome")
		.await
		.expect("Failed to record outbound.");

	let recent = messages::recent(&db, tenant_id, "+15550100001", 10)
		.await
		.expect("Failed to list messages.");

	assert_eq!(recent.len(), 4);
	assert_eq!(recent[0].body, "hi");
	assert_eq!(recent[3].direction, "out");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set BOOKD_PG_DSN to run."]
async fn conversation_state_persists_and_resets() {
	let Some(base_dsn) = bookd_testkit::env_dsn() else {
		eprintln!("Skipping conversation_state_persists_and_resets; set BOOKD_PG_DSN to run.");

		return;
	};
	let (test_db, db) = bootstrap(&base_dsn).await;
	let tenant_id = Uuid::new_v4();

	let state = conversations::load_state(&db, tenant_id, "+15550100001")
		.await
		.expect("Failed to load state.");

	assert!(state.is_idle());

	let confirm = ConversationState::Confirm {
		name: "Alice".to_string(),
		date: date!(2026 - 09 - 03),
		time: time!(14:00),
	};

	conversations::save_state(&db, tenant_id, "+15550100001", &confirm)
		.await
		.expect("Failed to save state.");

	let loaded = conversations::load_state(&db, tenant_id, "+15550100001")
		.await
		.expect("Failed to load state.");

	assert_eq!(loaded, confirm);

	// A draft corrupted out of band decodes as idle instead of erroring.
	sqlx::query(
		"UPDATE conversations SET draft = '{\"state\":\"bogus\"}'::jsonb WHERE tenant_id = $1",
	)
	.bind(tenant_id)
	.execute(&db.pool)
	.await
	.expect("Failed to corrupt draft.");

	let recovered = conversations::load_state(&db, tenant_id, "+15550100001")
		.await
		.expect("Failed to load state.");

	assert!(recovered.is_idle());

	conversations::reset(&db, tenant_id, "+15550100001").await.expect("Failed to reset.");

	let state = conversations::load_state(&db, tenant_id, "+15550100001")
		.await
		.expect("Failed to load state.");

	assert!(state.is_idle());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set BOOKD_PG_DSN to run."]
async fn channel_resolution_and_tenant_settings_round_trip() {
	let Some(base_dsn) = bookd_testkit::env_dsn() else {
		eprintln!(
			"Skipping channel_resolution_and_tenant_settings_round_trip; set BOOKD_PG_DSN to run."
		);

		return;
	};
	let (test_db, db) = bootstrap(&base_dsn).await;
	let tenant_id = Uuid::new_v4();

	tenants::create_channel(&db, tenant_id, "whatsapp", "+15550109999")
		.await
		.expect("Failed to create channel.");

	let channel = tenants::resolve_channel(&db, "whatsapp", "+15550109999")
		.await
		.expect("Failed to resolve channel.")
		.expect("Expected an active channel.");

	assert_eq!(channel.tenant_id, tenant_id);
	assert!(tenants::resolve_channel(&db, "whatsapp", "+15550100000")
		.await
		.expect("Failed to resolve channel.")
		.is_none());

	// Defaults apply before any settings row exists.
	let settings = tenants::load_settings(&db, tenant_id).await.expect("Failed to load settings.");

	assert_eq!(settings.hours.slot_minutes, 30);

	tenants::save_settings(&db, tenant_id, &json!({ "hours": { "slot_minutes": 15 } }))
		.await
		.expect("Failed to save settings.");

	let settings = tenants::load_settings(&db, tenant_id).await.expect("Failed to load settings.");

	assert_eq!(settings.hours.slot_minutes, 15);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
