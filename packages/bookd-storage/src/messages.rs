use uuid::Uuid;

use crate::{Result, db::Db, models::Message};

/// Records an inbound message. Returns `false` when the provider sid was seen
/// before, in which case the caller must not process the message again.
pub async fn record_inbound(
	db: &Db,
	tenant_id: Uuid,
	user_address: &str,
	body: &str,
	provider_sid: Option<&str>,
) -> Result<bool> {
	let result = sqlx::query(
		"\
INSERT INTO messages (tenant_id, user_address, direction, body, provider_sid)
VALUES ($1, $2, 'in', $3, $4)
ON CONFLICT (provider_sid) WHERE provider_sid IS NOT NULL DO NOTHING",
	)
	.bind(tenant_id)
	.bind(user_address)
	.bind(body)
	.bind(provider_sid)
	.execute(&db.pool)
	.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn record_outbound(
	db: &Db,
	tenant_id: Uuid,
	user_address: &str,
	body: &str,
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO messages (tenant_id, user_address, direction, body)
VALUES ($1, $2, 'out', $3)",
	)
	.bind(tenant_id)
	.bind(user_address)
	.bind(body)
	.execute(&db.pool)
	.await?;

	Ok(())
}

/// Most recent messages for one user, oldest first.
pub async fn recent(
	db: &Db,
	tenant_id: Uuid,
	user_address: &str,
	limit: i64,
) -> Result<Vec<Message>> {
	let mut rows = sqlx::query_as::<_, Message>(
		"\
SELECT *
FROM messages
WHERE tenant_id = $1 AND user_address = $2
ORDER BY message_id DESC
LIMIT $3",
	)
	.bind(tenant_id)
	.bind(user_address)
	.bind(limit)
	.fetch_all(&db.pool)
	.await?;

	rows.reverse();

	Ok(rows)
}
