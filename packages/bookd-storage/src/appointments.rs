use time::{Date, Time};
use uuid::Uuid;

use crate::{Error, Result, db::Db, models::Appointment};

/// Inserts a booked appointment. The partial unique index on
/// `(tenant_id, date, time)` is the authoritative double-booking guard; a
/// violation surfaces as [`Error::SlotTaken`] and a ref-code clash as
/// [`Error::RefCodeCollision`] so the caller can regenerate and retry.
pub async fn insert_booked(
	db: &Db,
	tenant_id: Uuid,
	user_address: &str,
	name: &str,
	date: Date,
	time: Time,
	ref_code: &str,
) -> Result<Appointment> {
	sqlx::query_as::<_, Appointment>(
		"\
INSERT INTO appointments (tenant_id, user_address, name, date, time, ref_code)
VALUES ($1, $2, $3, $4, $5, $6)
RETURNING *",
	)
	.bind(tenant_id)
	.bind(user_address)
	.bind(name)
	.bind(date)
	.bind(time)
	.bind(ref_code)
	.fetch_one(&db.pool)
	.await
	.map_err(map_unique_violation)
}

/// Advisory pre-check only; concurrent confirmations race past it and are
/// caught by the unique index instead.
pub async fn slot_taken(db: &Db, tenant_id: Uuid, date: Date, time: Time) -> Result<bool> {
	let count: i64 = sqlx::query_scalar(
		"\
SELECT count(*)
FROM appointments
WHERE tenant_id = $1 AND date = $2 AND time = $3 AND status = 'Booked'",
	)
	.bind(tenant_id)
	.bind(date)
	.bind(time)
	.fetch_one(&db.pool)
	.await?;

	Ok(count > 0)
}

pub async fn latest_booked(
	db: &Db,
	tenant_id: Uuid,
	user_address: &str,
) -> Result<Option<Appointment>> {
	let appointment = sqlx::query_as::<_, Appointment>(
		"\
SELECT *
FROM appointments
WHERE tenant_id = $1 AND user_address = $2 AND status = 'Booked'
ORDER BY created_at DESC, appointment_id DESC
LIMIT 1",
	)
	.bind(tenant_id)
	.bind(user_address)
	.fetch_optional(&db.pool)
	.await?;

	Ok(appointment)
}

pub async fn find_by_ref(
	db: &Db,
	tenant_id: Uuid,
	ref_code: &str,
) -> Result<Option<Appointment>> {
	let appointment = sqlx::query_as::<_, Appointment>(
		"SELECT * FROM appointments WHERE tenant_id = $1 AND ref_code = $2",
	)
	.bind(tenant_id)
	.bind(ref_code)
	.fetch_optional(&db.pool)
	.await?;

	Ok(appointment)
}

/// Cancels the user's most recent booked appointment, if any.
pub async fn cancel_latest(
	db: &Db,
	tenant_id: Uuid,
	user_address: &str,
) -> Result<Option<Appointment>> {
	let appointment = sqlx::query_as::<_, Appointment>(
		"\
UPDATE appointments
SET status = 'Cancelled', cancelled_at = now()
WHERE appointment_id = (
	SELECT appointment_id
	FROM appointments
	WHERE tenant_id = $1 AND user_address = $2 AND status = 'Booked'
	ORDER BY created_at DESC, appointment_id DESC
	LIMIT 1
)
RETURNING *",
	)
	.bind(tenant_id)
	.bind(user_address)
	.fetch_optional(&db.pool)
	.await?;

	Ok(appointment)
}

/// Cancels by reference code. Only the booking owner may cancel.
pub async fn cancel_by_ref(
	db: &Db,
	tenant_id: Uuid,
	user_address: &str,
	ref_code: &str,
) -> Result<Appointment> {
	let Some(appointment) = find_by_ref(db, tenant_id, ref_code).await? else {
		return Err(Error::NotFound(format!("appointment {ref_code}")));
	};

	if appointment.user_address != user_address {
		return Err(Error::NotOwner);
	}
	if appointment.status != "Booked" {
		return Err(Error::NotFound(format!("appointment {ref_code}")));
	}

	let cancelled = sqlx::query_as::<_, Appointment>(
		"\
UPDATE appointments
SET status = 'Cancelled', cancelled_at = now()
WHERE appointment_id = $1 AND status = 'Booked'
RETURNING *",
	)
	.bind(appointment.appointment_id)
	.fetch_optional(&db.pool)
	.await?;

	cancelled.ok_or_else(|| Error::NotFound(format!("appointment {ref_code}")))
}

pub async fn booked_on(db: &Db, tenant_id: Uuid, date: Date) -> Result<Vec<Appointment>> {
	let appointments = sqlx::query_as::<_, Appointment>(
		"\
SELECT *
FROM appointments
WHERE tenant_id = $1 AND date = $2 AND status = 'Booked'
ORDER BY time",
	)
	.bind(tenant_id)
	.bind(date)
	.fetch_all(&db.pool)
	.await?;

	Ok(appointments)
}

/// Booked appointments whose sheet sync previously errored.
pub async fn failed_sync(db: &Db, tenant_id: Uuid) -> Result<Vec<Appointment>> {
	let appointments = sqlx::query_as::<_, Appointment>(
		"\
SELECT *
FROM appointments
WHERE tenant_id = $1 AND status = 'Booked' AND sync_status = 'error'
ORDER BY appointment_id",
	)
	.bind(tenant_id)
	.fetch_all(&db.pool)
	.await?;

	Ok(appointments)
}

/// Booked appointments across all tenants that still need a sheet sync.
/// Feeds the sweeper so a lost job never strands an appointment.
pub async fn unsynced(db: &Db, limit: i64) -> Result<Vec<Appointment>> {
	let appointments = sqlx::query_as::<_, Appointment>(
		"\
SELECT *
FROM appointments
WHERE status = 'Booked' AND sync_status IN ('pending', 'error')
ORDER BY appointment_id
LIMIT $1",
	)
	.bind(limit)
	.fetch_all(&db.pool)
	.await?;

	Ok(appointments)
}

pub async fn mark_synced(db: &Db, appointment_id: i64) -> Result<()> {
	sqlx::query(
		"\
UPDATE appointments
SET sync_status = 'synced', sync_error = NULL, synced_at = now()
WHERE appointment_id = $1",
	)
	.bind(appointment_id)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn mark_sync_error(db: &Db, appointment_id: i64, error: &str) -> Result<()> {
	sqlx::query(
		"\
UPDATE appointments
SET sync_status = 'error', sync_error = $2
WHERE appointment_id = $1",
	)
	.bind(appointment_id)
	.bind(error)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn find(db: &Db, appointment_id: i64) -> Result<Option<Appointment>> {
	let appointment = sqlx::query_as::<_, Appointment>(
		"SELECT * FROM appointments WHERE appointment_id = $1",
	)
	.bind(appointment_id)
	.fetch_optional(&db.pool)
	.await?;

	Ok(appointment)
}

fn map_unique_violation(err: sqlx::Error) -> Error {
	if let sqlx::Error::Database(ref db_err) = err {
		if db_err.is_unique_violation() {
			return match db_err.constraint() {
				Some("uq_appointments_slot") => Error::SlotTaken,
				Some("uq_appointments_ref_code") => Error::RefCodeCollision,
				_ => Error::Sqlx(err),
			};
		}
	}

	Error::Sqlx(err)
}
