use bookd_storage::jobs;
use bookd_worker::worker;

use super::*;

#[tokio::test]
#[ignore = "Requires external Postgres. Set BOOKD_PG_DSN to run."]
async fn unknown_job_types_are_marked_done_not_retried() {
	let Some(test_db) = test_db().await else {
		eprintln!("BOOKD_PG_DSN not set. Skipping.");

		return;
	};
	let state = worker_state(test_db.dsn(), stub_providers())
		.await
		.expect("Failed to build worker state.");
	let job_id = jobs::enqueue(&state.db, "shred_faxes", &serde_json::json!({}), None)
		.await
		.expect("Failed to enqueue job.");

	let processed =
		worker::process_batch_once(&state).await.expect("Batch processing failed.");

	assert_eq!(processed, 1);

	let job = jobs::find(&state.db, job_id)
		.await
		.expect("Failed to reload job.")
		.expect("Job vanished.");

	assert_eq!(job.status, "done");
	assert_eq!(job.attempts, 0);
	assert_eq!(job.last_error, None);

	test_db.cleanup().await.expect("Failed to clean up test database.");
}
