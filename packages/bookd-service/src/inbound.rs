use uuid::Uuid;

use bookd_domain::{
	admin as admin_rules,
	command::{self, Command},
	settings::TenantSettings,
	state::ConversationState,
};
use bookd_storage::{conversations, messages, tenants};

use crate::{BookingService, ChatTurn, ServiceResult};

/// One webhook delivery from the chat provider.
#[derive(Clone, Debug)]
pub struct InboundMessage {
	pub provider: String,
	pub to_address: String,
	pub from_address: String,
	pub body: String,
	pub provider_sid: Option<String>,
}

impl BookingService {
	/// Full inbound pipeline: tenant resolution, replay dedup, command
	/// dispatch, reply persistence and delivery. Returns the reply text, or
	/// `None` when the message was dropped (unknown destination or a replay).
	pub async fn handle_inbound(&self, inbound: InboundMessage) -> ServiceResult<Option<String>> {
		let Some(channel) =
			tenants::resolve_channel(&self.db, &inbound.provider, &inbound.to_address).await?
		else {
			tracing::warn!(
				provider = %inbound.provider,
				to = %inbound.to_address,
				"Message for unregistered destination.",
			);

			return Ok(Some(
				"This number is not linked to a clinic yet. Please contact your provider."
					.to_string(),
			));
		};
		let tenant_id = channel.tenant_id;
		let user = inbound.from_address.as_str();
		let fresh = messages::record_inbound(
			&self.db,
			tenant_id,
			user,
			&inbound.body,
			inbound.provider_sid.as_deref(),
		)
		.await?;

		if !fresh {
			tracing::debug!(sid = ?inbound.provider_sid, "Ignoring replayed message.");

			return Ok(None);
		}

		let settings = tenants::load_settings(&self.db, tenant_id).await?;
		let reply = self.dispatch(tenant_id, user, &inbound.body, &settings).await?;

		messages::record_outbound(&self.db, tenant_id, user, &reply).await?;

		// The reply is already durable; a delivery failure must not fail the
		// webhook and trigger a provider-side retry of the inbound message.
		if let Err(err) =
			self.providers.outbound.send_message(&self.cfg.providers.outbound, user, &reply).await
		{
			tracing::error!(user = %user, "Failed to deliver reply: {err}.");
		}

		Ok(Some(reply))
	}

	async fn dispatch(
		&self,
		tenant_id: Uuid,
		user: &str,
		body: &str,
		settings: &TenantSettings,
	) -> ServiceResult<String> {
		match command::classify(body) {
			Command::Reset => {
				conversations::reset(&self.db, tenant_id, user).await?;

				Ok("Okay, starting over. Say 'book' whenever you're ready.".to_string())
			},
			Command::CancelLatest => self.cancel_latest_reply(tenant_id, user).await,
			Command::CancelByRef(ref_code) =>
				self.cancel_by_ref_reply(tenant_id, user, &ref_code).await,
			Command::Reschedule => self.reschedule_reply(tenant_id, user).await,
			Command::MyAppointment => self.my_appointment_reply(tenant_id, user).await,
			Command::AdminToday
			| Command::AdminRetrySheets
			| Command::AdminJobs
			| Command::AdminFailedJobs
				if !is_admin(user, settings, &self.cfg) =>
				Ok("Not authorized.".to_string()),
			Command::AdminToday => self.admin_today_reply(tenant_id, settings).await,
			Command::AdminRetrySheets => self.admin_retry_sheets_reply(tenant_id).await,
			Command::AdminJobs => self.admin_jobs_reply().await,
			Command::AdminFailedJobs => self.admin_failed_jobs_reply().await,
			Command::Conversational =>
				self.conversational_reply(tenant_id, user, body, settings).await,
		}
	}

	async fn conversational_reply(
		&self,
		tenant_id: Uuid,
		user: &str,
		body: &str,
		settings: &TenantSettings,
	) -> ServiceResult<String> {
		let state = conversations::load_state(&self.db, tenant_id, user).await?;

		if state.is_idle() {
			if command::is_booking_intent(body) {
				conversations::save_state(
					&self.db,
					tenant_id,
					user,
					&ConversationState::CollectName,
				)
				.await?;

				return Ok("Great! Let's book your appointment. What's your name?".to_string());
			}

			return self.free_text_reply(tenant_id, user, settings).await;
		}

		self.advance_flow(tenant_id, user, state, body, settings).await
	}

	/// Hands idle chatter to the reply collaborator, grounded in the recent
	/// exchange. Falls back to a canned nudge when the provider is down so
	/// the user never gets silence.
	async fn free_text_reply(
		&self,
		tenant_id: Uuid,
		user: &str,
		settings: &TenantSettings,
	) -> ServiceResult<String> {
		let recent = messages::recent(&self.db, tenant_id, user, 10).await?;
		let turns = recent
			.iter()
			.map(|message| ChatTurn {
				role: if message.direction == "in" { "user" } else { "assistant" }.to_string(),
				content: message.body.clone(),
			})
			.collect::<Vec<_>>();
		let prompt = system_prompt(settings);

		match self
			.providers
			.reply
			.generate_reply(&self.cfg.providers.reply, &prompt, &turns)
			.await
		{
			Ok(reply) => Ok(reply),
			Err(err) => {
				tracing::warn!("Reply provider failed: {err}.");

				Ok("I can help you book, cancel, or check an appointment. Say 'book' to get started."
					.to_string())
			},
		}
	}
}

fn is_admin(user: &str, settings: &TenantSettings, cfg: &bookd_config::Config) -> bool {
	admin_rules::is_admin(user, &settings.admins, cfg.booking.fallback_admin.as_deref())
}

fn system_prompt(settings: &TenantSettings) -> String {
	let clinic = settings.name.as_deref().unwrap_or("the clinic");

	format!(
		"You are the friendly front desk assistant for {clinic}. Keep replies to one or two \
		 sentences. If the user wants an appointment, tell them to say 'book'. Appointments run \
		 every {} minutes during opening hours.",
		settings.hours.slot_minutes
	)
}
