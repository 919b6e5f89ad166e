use bookd_domain::state::ConversationState;
use bookd_storage::{conversations, messages};

use super::*;

#[tokio::test]
#[ignore = "Requires external Postgres. Set BOOKD_PG_DSN to run."]
async fn replayed_messages_do_not_advance_the_conversation() {
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

	let first = service
		.handle_inbound(inbound(to, user, "book", "SM-dup"))
		.await
		.expect("handle_inbound failed");

	assert!(first.is_some());

	// Same provider sid again: the webhook was retried, not the user.
	let replay = service
		.handle_inbound(inbound(to, user, "book", "SM-dup"))
		.await
		.expect("handle_inbound failed");

	assert_eq!(replay, None);

	let state = conversations::load_state(&service.db, tenant_id, user)
		.await
		.expect("Failed to load conversation state.");

	assert_eq!(state, ConversationState::CollectName);

	let reply = say(&service, to, user, "Alice", "SM-name").await;
	assert!(reply.contains("YYYY-MM-DD"), "{reply}");

	let replay = service
		.handle_inbound(inbound(to, user, "Alice", "SM-name"))
		.await
		.expect("handle_inbound failed");

	assert_eq!(replay, None);

	let state = conversations::load_state(&service.db, tenant_id, user)
		.await
		.expect("Failed to load conversation state.");

	assert_eq!(state, ConversationState::CollectDate { name: "Alice".to_string() });

	// Each sid was recorded exactly once.
	let recent = messages::recent(&service.db, tenant_id, user, 50)
		.await
		.expect("Failed to load recent messages.");
	let inbound_count = recent.iter().filter(|message| message.direction == "in").count();

	assert_eq!(inbound_count, 2);

	test_db.cleanup().await.expect("Failed to clean up test database.");
}
