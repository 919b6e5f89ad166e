use serde_json::Value;
use uuid::Uuid;

use bookd_domain::settings::TenantSettings;

use crate::{Result, db::Db, models::Channel};

/// Maps an inbound destination address to its tenant via the active channel
/// registration.
pub async fn resolve_channel(
	db: &Db,
	provider: &str,
	to_address: &str,
) -> Result<Option<Channel>> {
	let channel = sqlx::query_as::<_, Channel>(
		"\
SELECT *
FROM channels
WHERE provider = $1 AND to_address = $2 AND is_active",
	)
	.bind(provider)
	.bind(to_address)
	.fetch_optional(&db.pool)
	.await?;

	Ok(channel)
}

pub async fn create_channel(
	db: &Db,
	tenant_id: Uuid,
	provider: &str,
	to_address: &str,
) -> Result<Channel> {
	let channel = sqlx::query_as::<_, Channel>(
		"\
INSERT INTO channels (tenant_id, provider, to_address)
VALUES ($1, $2, $3)
RETURNING *",
	)
	.bind(tenant_id)
	.bind(provider)
	.bind(to_address)
	.fetch_one(&db.pool)
	.await?;

	Ok(channel)
}

/// Tenant settings, defaulted when the tenant has no row or the stored json
/// no longer decodes.
pub async fn load_settings(db: &Db, tenant_id: Uuid) -> Result<TenantSettings> {
	let settings: Option<Value> =
		sqlx::query_scalar("SELECT settings FROM tenant_settings WHERE tenant_id = $1")
			.bind(tenant_id)
			.fetch_optional(&db.pool)
			.await?;

	Ok(settings.map(TenantSettings::from_value).unwrap_or_default())
}

pub async fn save_settings(db: &Db, tenant_id: Uuid, settings: &Value) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO tenant_settings (tenant_id, settings, updated_at)
VALUES ($1, $2, now())
ON CONFLICT (tenant_id)
DO UPDATE SET settings = EXCLUDED.settings, updated_at = now()",
	)
	.bind(tenant_id)
	.bind(settings)
	.execute(&db.pool)
	.await?;

	Ok(())
}
