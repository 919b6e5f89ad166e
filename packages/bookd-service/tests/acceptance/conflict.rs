use time::macros::{date, time};

use bookd_domain::state::ConversationState;
use bookd_storage::{appointments, conversations};

use super::*;

#[tokio::test]
#[ignore = "Requires external Postgres. Set BOOKD_PG_DSN to run."]
async fn losing_a_slot_race_returns_to_time_selection() {
	let Some(test_db) = test_db().await else {
		eprintln!("BOOKD_PG_DSN not set. Skipping.");

		return;
	};
	let cfg = test_config(test_db.dsn().to_string());
	let service = build_service(cfg, stub_providers()).await.expect("Failed to build service.");
	let to = "+15550001";
	let tenant_id =
		register_tenant(&service.db, to).await.expect("Failed to register tenant.");
	let slot_date = date!(2027 - 01 - 04);
	let slot_time = time!(10:00);

	appointments::insert_booked(
		&service.db,
		tenant_id,
		"+15550101",
		"Alice",
		slot_date,
		slot_time,
		"AP-ALICE1",
	)
	.await
	.expect("Failed to seed the winning booking.");

	// Bob reached the confirm step before Alice committed, so his proactive
	// check never saw her. The unique index is the only thing standing.
	let bob = "+15550102";

	conversations::save_state(
		&service.db,
		tenant_id,
		bob,
		&ConversationState::Confirm { name: "Bob".to_string(), date: slot_date, time: slot_time },
	)
	.await
	.expect("Failed to seed Bob's conversation.");

	let reply = say(&service, to, bob, "yes", "SM1").await;

	assert_eq!(reply, "Sorry, that slot was just taken. Please pick another time.");

	let state = conversations::load_state(&service.db, tenant_id, bob)
		.await
		.expect("Failed to load Bob's state.");

	assert_eq!(state, ConversationState::CollectTime { name: "Bob".to_string(), date: slot_date });

	// The proactive check now sees the committed booking; same outcome.
	let reply = say(&service, to, bob, "10:00", "SM2").await;
	assert!(reply.contains("already taken"), "{reply}");

	// The next slot over is still free.
	let reply = say(&service, to, bob, "10:30", "SM3").await;
	assert!(reply.contains("Reply YES"), "{reply}");

	let reply = say(&service, to, bob, "yes", "SM4").await;
	assert!(reply.contains("You're booked!"), "{reply}");

	test_db.cleanup().await.expect("Failed to clean up test database.");
}
