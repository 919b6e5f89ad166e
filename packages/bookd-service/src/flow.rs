use uuid::Uuid;

use bookd_domain::{
	hours::{self, DateRejection, TimeRejection},
	refcode,
	settings::TenantSettings,
	state::ConversationState,
};
use bookd_storage::{Error as StorageError, appointments, conversations};

use crate::{BookingService, ServiceError, ServiceResult, jobs};

/// One step of the booking conversation. Persists the next state and returns
/// the reply to send.
impl BookingService {
	pub(crate) async fn advance_flow(
		&self,
		tenant_id: Uuid,
		user_address: &str,
		state: ConversationState,
		text: &str,
		settings: &TenantSettings,
	) -> ServiceResult<String> {
		let (next, reply) = match state {
			ConversationState::Idle | ConversationState::CollectName => {
				let name = text.trim();

				if name.is_empty() {
					(ConversationState::CollectName, "What's your name?".to_string())
				} else {
					(
						ConversationState::CollectDate { name: name.to_string() },
						format!(
							"Thanks {name}! What date works for you? Please use YYYY-MM-DD."
						),
					)
				}
			},
			ConversationState::CollectDate { name } => match settings.hours.validate_date(text) {
				Ok(date) => {
					let label = settings.hours.day_hours_label(date);

					(
						ConversationState::CollectTime { name, date },
						format!(
							"What time would you like? We're open {label} on {}.",
							hours::format_date(date)
						),
					)
				},
				Err(DateRejection::Unparseable) => (
					ConversationState::CollectDate { name },
					"Sorry, I couldn't read that date. Please use YYYY-MM-DD.".to_string(),
				),
				Err(DateRejection::ClosedDay) => (
					ConversationState::CollectDate { name },
					"We're closed that day. Please pick another date.".to_string(),
				),
			},
			ConversationState::CollectTime { name, date } =>
				match settings.hours.validate_time(date, text) {
					Ok(time) =>
						if self.slot_unavailable(tenant_id, settings, date, time).await? {
							(
								ConversationState::CollectTime { name, date },
								"Sorry, that time is already taken. Please pick another time."
									.to_string(),
							)
						} else {
							let reply = format!(
								"Please confirm: {name}, {} at {}. Reply YES to confirm or NO to start over.",
								hours::format_date(date),
								hours::format_time(time)
							);

							(ConversationState::Confirm { name, date, time }, reply)
						},
					Err(TimeRejection::Unparseable) => (
						ConversationState::CollectTime { name, date },
						"Sorry, I couldn't read that time. Try something like 14:00 or 2:30 PM."
							.to_string(),
					),
					Err(TimeRejection::OutsideHours) => {
						let label = settings.hours.day_hours_label(date);

						(
							ConversationState::CollectTime { name, date },
							format!("We're open {label} that day. Please pick a time within hours."),
						)
					},
					Err(TimeRejection::Misaligned) => (
						ConversationState::CollectTime { name, date },
						format!(
							"Appointments start every {} minutes. Please pick an aligned time.",
							settings.hours.slot_minutes
						),
					),
				},
			ConversationState::Confirm { name, date, time } => {
				match text.trim().to_lowercase().as_str() {
					"yes" | "y" | "confirm" => {
						return self
							.confirm_booking(tenant_id, user_address, &name, date, time, settings)
							.await;
					},
					"no" | "n" => (
						ConversationState::Idle,
						"Okay, starting over. Say 'book' whenever you're ready.".to_string(),
					),
					_ => {
						let reply = format!(
							"Please reply YES to confirm {name}, {} at {}, or NO to start over.",
							hours::format_date(date),
							hours::format_time(time)
						);

						(ConversationState::Confirm { name, date, time }, reply)
					},
				}
			},
		};

		conversations::save_state(&self.db, tenant_id, user_address, &next).await?;

		Ok(reply)
	}

	/// Advisory availability check: committed bookings first, then a
	/// best-effort scan of the external sheet for rows entered by hand. The
	/// unique index stays authoritative either way.
	async fn slot_unavailable(
		&self,
		tenant_id: Uuid,
		settings: &TenantSettings,
		date: time::Date,
		time: time::Time,
	) -> ServiceResult<bool> {
		if appointments::slot_taken(&self.db, tenant_id, date, time).await? {
			return Ok(true);
		}

		let (spreadsheet_id, tab) = match &settings.sheet {
			Some(sheet) => (Some(sheet.spreadsheet_id.as_str()), sheet.tab.as_deref()),
			None => (None, None),
		};
		let scanned = self
			.providers
			.sheets
			.scan_slot(
				&self.cfg.providers.sheets,
				spreadsheet_id,
				tab,
				&hours::format_date(date),
				&hours::format_time(time),
			)
			.await;

		match scanned {
			Ok(taken) => Ok(taken),
			Err(err) => {
				tracing::debug!("Sheet slot scan failed: {err}.");

				Ok(false)
			},
		}
	}

	async fn confirm_booking(
		&self,
		tenant_id: Uuid,
		user_address: &str,
		name: &str,
		date: time::Date,
		time: time::Time,
		settings: &TenantSettings,
	) -> ServiceResult<String> {
		for _ in 0..self.cfg.booking.ref_code_max_attempts {
			let ref_code = refcode::generate_ref_code();

			match appointments::insert_booked(
				&self.db,
				tenant_id,
				user_address,
				name,
				date,
				time,
				&ref_code,
			)
			.await
			{
				Ok(appointment) => {
					jobs::enqueue_post_booking(
						&self.db,
						self.cfg.booking.reminder_minutes_before,
						settings,
						&appointment,
					)
					.await?;
					conversations::reset(&self.db, tenant_id, user_address).await?;

					return Ok(format!(
						"You're booked! {} at {}. Your reference code is {}.",
						hours::format_date(date),
						hours::format_time(time),
						appointment.ref_code
					));
				},
				Err(StorageError::SlotTaken) => {
					let back = ConversationState::CollectTime { name: name.to_string(), date };

					conversations::save_state(&self.db, tenant_id, user_address, &back).await?;

					return Ok(
						"Sorry, that slot was just taken. Please pick another time.".to_string()
					);
				},
				Err(StorageError::RefCodeCollision) => continue,
				Err(err) => return Err(err.into()),
			}
		}

		Err(ServiceError::Storage {
			message: "Could not allocate a unique reference code.".to_string(),
		})
	}
}
