use axum::{
	Form, Json, Router,
	extract::{Query, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use bookd_service::{InboundMessage, JobsReport, ServiceError, SheetRetryReport};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/webhook", post(webhook))
		.with_state(state)
}

pub fn admin_router(state: AppState) -> Router {
	Router::new()
		.route("/v1/admin/jobs", get(jobs))
		.route("/v1/admin/jobs/failed", get(failed_jobs))
		.route("/v1/admin/sheets/retry", post(retry_sheets))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

#[derive(Debug, Deserialize)]
struct WebhookForm {
	#[serde(alias = "Body")]
	body: String,
	#[serde(alias = "From")]
	from: String,
	#[serde(alias = "To")]
	to: String,
	#[serde(alias = "MessageSid")]
	message_sid: Option<String>,
}

async fn webhook(
	State(state): State<AppState>,
	Form(form): Form<WebhookForm>,
) -> Result<String, ApiError> {
	let inbound = InboundMessage {
		provider: provider_of(&form.from).to_string(),
		to_address: form.to,
		from_address: form.from,
		body: form.body,
		provider_sid: form.message_sid,
	};
	let reply = state.service.handle_inbound(inbound).await?;

	Ok(reply.unwrap_or_default())
}

// Transport addresses carry the channel as a prefix, e.g. "whatsapp:+15551234".
fn provider_of(address: &str) -> &'static str {
	if address.starts_with("whatsapp:") { "whatsapp" } else { "sms" }
}

#[derive(Debug, Deserialize)]
struct JobsQuery {
	job_type: Option<String>,
}

async fn jobs(
	State(state): State<AppState>,
	Query(query): Query<JobsQuery>,
) -> Result<Json<JobsReport>, ApiError> {
	let report = state.service.job_overview(query.job_type.as_deref()).await?;

	Ok(Json(report))
}

#[derive(Debug, Deserialize)]
struct FailedJobsQuery {
	job_type: Option<String>,
	limit: Option<i64>,
}

#[derive(Debug, Serialize)]
struct FailedJob {
	job_id: i64,
	job_type: String,
	attempts: i32,
	max_attempts: i32,
	last_error: Option<String>,
	updated_at: String,
}

async fn failed_jobs(
	State(state): State<AppState>,
	Query(query): Query<FailedJobsQuery>,
) -> Result<Json<Vec<FailedJob>>, ApiError> {
	let limit = query.limit.unwrap_or(20).clamp(1, 200);
	let jobs = state.service.failed_jobs(query.job_type.as_deref(), limit).await?;
	let jobs = jobs
		.into_iter()
		.map(|job| FailedJob {
			job_id: job.job_id,
			job_type: job.job_type,
			attempts: job.attempts,
			max_attempts: job.max_attempts,
			last_error: job.last_error,
			updated_at: job
				.updated_at
				.format(&Rfc3339)
				.unwrap_or_else(|_| job.updated_at.to_string()),
		})
		.collect();

	Ok(Json(jobs))
}

#[derive(Debug, Deserialize)]
struct SheetRetryRequest {
	tenant_id: Uuid,
}

async fn retry_sheets(
	State(state): State<AppState>,
	Json(payload): Json<SheetRetryRequest>,
) -> Result<Json<SheetRetryReport>, ApiError> {
	let report = state.service.retry_sheet_syncs(payload.tenant_id).await?;

	Ok(Json(report))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		let (status, error_code) = match &err {
			ServiceError::InvalidRequest { .. } =>
				(StatusCode::BAD_REQUEST, "invalid_request"),
			ServiceError::Provider { .. } => (StatusCode::BAD_GATEWAY, "provider_error"),
			ServiceError::Storage { .. } =>
				(StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
		};

		Self { status, error_code: error_code.to_string(), message: err.to_string() }
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
