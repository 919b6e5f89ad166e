use serde_json::Value;
use uuid::Uuid;

use bookd_domain::state::ConversationState;

use crate::{Result, db::Db};

/// Loads the conversation state for one user. A missing row or a draft that
/// no longer decodes both land on `Idle`.
pub async fn load_state(
	db: &Db,
	tenant_id: Uuid,
	user_address: &str,
) -> Result<ConversationState> {
	let draft: Option<Value> = sqlx::query_scalar(
		"SELECT draft FROM conversations WHERE tenant_id = $1 AND user_address = $2",
	)
	.bind(tenant_id)
	.bind(user_address)
	.fetch_optional(&db.pool)
	.await?;

	Ok(draft.map(|value| serde_json::from_value(value).unwrap_or_default()).unwrap_or_default())
}

pub async fn save_state(
	db: &Db,
	tenant_id: Uuid,
	user_address: &str,
	state: &ConversationState,
) -> Result<()> {
	let draft = serde_json::to_value(state)
		.map_err(|err| crate::Error::InvalidArgument(err.to_string()))?;

	sqlx::query(
		"\
INSERT INTO conversations (tenant_id, user_address, state, draft, updated_at)
VALUES ($1, $2, $3, $4, now())
ON CONFLICT (tenant_id, user_address)
DO UPDATE SET state = EXCLUDED.state, draft = EXCLUDED.draft, updated_at = now()",
	)
	.bind(tenant_id)
	.bind(user_address)
	.bind(state.label())
	.bind(draft)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn reset(db: &Db, tenant_id: Uuid, user_address: &str) -> Result<()> {
	save_state(db, tenant_id, user_address, &ConversationState::Idle).await
}
