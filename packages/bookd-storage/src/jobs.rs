use serde_json::Value;
use time::{Duration, OffsetDateTime};

use crate::{Result, db::Db, models::{Job, JobCounts}};

const BACKOFF_BASE_SECS: i64 = 30;

/// Retry delay after the given number of completed attempts. Doubles each
/// attempt with no cap: 30s, 60s, 120s, ...
pub fn backoff_delay(attempts: i32) -> Duration {
	let exponent = attempts.saturating_sub(1).max(0).min(62) as u32;

	Duration::seconds(BACKOFF_BASE_SECS.saturating_mul(1_i64 << exponent))
}

pub async fn enqueue(
	db: &Db,
	job_type: &str,
	payload: &Value,
	run_at: Option<OffsetDateTime>,
) -> Result<i64> {
	let job_id: i64 = sqlx::query_scalar(
		"\
INSERT INTO jobs (job_type, payload, run_at)
VALUES ($1, $2, coalesce($3, now()))
RETURNING job_id",
	)
	.bind(job_type)
	.bind(payload)
	.bind(run_at)
	.fetch_one(&db.pool)
	.await?;

	Ok(job_id)
}

/// Claims up to `batch` due jobs for this worker. One statement so two
/// workers can never claim the same job; `SKIP LOCKED` keeps concurrent
/// claimers from blocking on each other.
pub async fn claim(db: &Db, worker: &str, batch: i64) -> Result<Vec<Job>> {
	let jobs = sqlx::query_as::<_, Job>(
		"\
WITH picked AS (
	SELECT job_id
	FROM jobs
	WHERE status = 'queued' AND run_at <= now()
	ORDER BY run_at, job_id
	FOR UPDATE SKIP LOCKED
	LIMIT $1
)
UPDATE jobs j
SET status = 'running', locked_by = $2, locked_at = now(), updated_at = now()
FROM picked
WHERE j.job_id = picked.job_id
RETURNING j.*",
	)
	.bind(batch)
	.bind(worker)
	.fetch_all(&db.pool)
	.await?;

	Ok(jobs)
}

pub async fn ack_done(db: &Db, job_id: i64) -> Result<()> {
	sqlx::query(
		"\
UPDATE jobs
SET status = 'done', locked_by = NULL, locked_at = NULL, updated_at = now()
WHERE job_id = $1",
	)
	.bind(job_id)
	.execute(&db.pool)
	.await?;

	Ok(())
}

/// Records a failed attempt. The job goes back to `queued` with an
/// exponential delay, or to terminal `failed` once `max_attempts` is spent.
pub async fn ack_retry(db: &Db, job: &Job, error: &str) -> Result<()> {
	let next_run = OffsetDateTime::now_utc() + backoff_delay(job.attempts + 1);

	sqlx::query(
		"\
UPDATE jobs
SET attempts = attempts + 1,
	last_error = $2,
	status = CASE WHEN attempts + 1 >= max_attempts THEN 'failed' ELSE 'queued' END,
	run_at = CASE WHEN attempts + 1 >= max_attempts THEN run_at ELSE $3 END,
	locked_by = NULL,
	locked_at = NULL,
	updated_at = now()
WHERE job_id = $1",
	)
	.bind(job.job_id)
	.bind(error)
	.bind(next_run)
	.execute(&db.pool)
	.await?;

	Ok(())
}

/// Whether a live job of this type already exists for the appointment.
/// Keeps the sweeper and admin retries from enqueueing duplicates.
pub async fn has_pending(db: &Db, job_type: &str, appointment_id: i64) -> Result<bool> {
	let count: i64 = sqlx::query_scalar(
		"\
SELECT count(*)
FROM jobs
WHERE job_type = $1
	AND payload ->> 'appointment_id' = $2
	AND status IN ('queued', 'running')",
	)
	.bind(job_type)
	.bind(appointment_id.to_string())
	.fetch_one(&db.pool)
	.await?;

	Ok(count > 0)
}

/// Drops queued jobs tied to an appointment, e.g. reminders after a cancel.
pub async fn cancel_pending(db: &Db, job_type: &str, appointment_id: i64) -> Result<u64> {
	let result = sqlx::query(
		"\
UPDATE jobs
SET status = 'cancelled', updated_at = now()
WHERE job_type = $1
	AND payload ->> 'appointment_id' = $2
	AND status = 'queued'",
	)
	.bind(job_type)
	.bind(appointment_id.to_string())
	.execute(&db.pool)
	.await?;

	Ok(result.rows_affected())
}

/// Puts jobs stuck in `running` past the cutoff back into the queue. Covers
/// workers that died between claim and ack.
pub async fn reclaim_stale(db: &Db, cutoff: OffsetDateTime, limit: i64) -> Result<u64> {
	let result = sqlx::query(
		"\
WITH stale AS (
	SELECT job_id
	FROM jobs
	WHERE status = 'running' AND locked_at < $1
	ORDER BY locked_at
	FOR UPDATE SKIP LOCKED
	LIMIT $2
)
UPDATE jobs j
SET status = 'queued', locked_by = NULL, locked_at = NULL, updated_at = now()
FROM stale
WHERE j.job_id = stale.job_id",
	)
	.bind(cutoff)
	.bind(limit)
	.execute(&db.pool)
	.await?;

	Ok(result.rows_affected())
}

pub async fn counts(db: &Db, job_type: Option<&str>) -> Result<JobCounts> {
	let counts = sqlx::query_as::<_, JobCounts>(
		"\
SELECT
	count(*) FILTER (WHERE status = 'queued') AS queued,
	count(*) FILTER (WHERE status = 'running') AS running,
	count(*) FILTER (WHERE status = 'done') AS done,
	count(*) FILTER (WHERE status = 'failed') AS failed,
	count(*) FILTER (WHERE status = 'cancelled') AS cancelled
FROM jobs
WHERE $1::text IS NULL OR job_type = $1",
	)
	.bind(job_type)
	.fetch_one(&db.pool)
	.await?;

	Ok(counts)
}

pub async fn count_stale_running(
	db: &Db,
	cutoff: OffsetDateTime,
	job_type: Option<&str>,
) -> Result<i64> {
	let count: i64 = sqlx::query_scalar(
		"\
SELECT count(*)
FROM jobs
WHERE status = 'running'
	AND locked_at < $1
	AND ($2::text IS NULL OR job_type = $2)",
	)
	.bind(cutoff)
	.bind(job_type)
	.fetch_one(&db.pool)
	.await?;

	Ok(count)
}

pub async fn list_failed(db: &Db, job_type: Option<&str>, limit: i64) -> Result<Vec<Job>> {
	let jobs = sqlx::query_as::<_, Job>(
		"\
SELECT *
FROM jobs
WHERE status = 'failed' AND ($1::text IS NULL OR job_type = $1)
ORDER BY updated_at DESC
LIMIT $2",
	)
	.bind(job_type)
	.bind(limit)
	.fetch_all(&db.pool)
	.await?;

	Ok(jobs)
}

pub async fn find(db: &Db, job_id: i64) -> Result<Option<Job>> {
	let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE job_id = $1")
		.bind(job_id)
		.fetch_optional(&db.pool)
		.await?;

	Ok(job)
}
