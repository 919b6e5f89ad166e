use uuid::Uuid;

use bookd_domain::{hours, state::ConversationState};
use bookd_storage::{Error as StorageError, appointments, conversations, models::Appointment};

use crate::{BookingService, ServiceResult, jobs};

impl BookingService {
	pub(crate) async fn cancel_latest_reply(
		&self,
		tenant_id: Uuid,
		user_address: &str,
	) -> ServiceResult<String> {
		match appointments::cancel_latest(&self.db, tenant_id, user_address).await? {
			Some(appointment) => {
				jobs::enqueue_cancel_notification(&self.db, &appointment).await?;
				conversations::reset(&self.db, tenant_id, user_address).await?;

				Ok(format!("Your appointment {} has been cancelled.", describe(&appointment)))
			},
			None => Ok("You have no booked appointment to cancel.".to_string()),
		}
	}

	pub(crate) async fn cancel_by_ref_reply(
		&self,
		tenant_id: Uuid,
		user_address: &str,
		ref_code: &str,
	) -> ServiceResult<String> {
		match appointments::cancel_by_ref(&self.db, tenant_id, user_address, ref_code).await {
			Ok(appointment) => {
				jobs::enqueue_cancel_notification(&self.db, &appointment).await?;
				conversations::reset(&self.db, tenant_id, user_address).await?;

				Ok(format!("Your appointment {} has been cancelled.", describe(&appointment)))
			},
			Err(StorageError::NotFound(_)) =>
				Ok(format!("I couldn't find a booked appointment with reference {ref_code}.")),
			Err(StorageError::NotOwner) =>
				Ok("That reference code belongs to someone else.".to_string()),
			Err(err) => Err(err.into()),
		}
	}

	pub(crate) async fn my_appointment_reply(
		&self,
		tenant_id: Uuid,
		user_address: &str,
	) -> ServiceResult<String> {
		match appointments::latest_booked(&self.db, tenant_id, user_address).await? {
			Some(appointment) => Ok(format!(
				"Your next appointment: {}. Reply 'cancel' to cancel or 'reschedule' to pick a new slot.",
				describe(&appointment)
			)),
			None =>
				Ok("You have no booked appointment. Say 'book' to make one.".to_string()),
		}
	}

	/// Cancels the latest booking, if any, and drops straight into a new
	/// booking conversation.
	pub(crate) async fn reschedule_reply(
		&self,
		tenant_id: Uuid,
		user_address: &str,
	) -> ServiceResult<String> {
		let prefix =
			match appointments::cancel_latest(&self.db, tenant_id, user_address).await? {
				Some(appointment) => {
					jobs::enqueue_cancel_notification(&self.db, &appointment).await?;

					format!("Your appointment {} has been cancelled. ", describe(&appointment))
				},
				None => String::new(),
			};

		conversations::save_state(
			&self.db,
			tenant_id,
			user_address,
			&ConversationState::CollectName,
		)
		.await?;

		Ok(format!("{prefix}Let's book a new appointment. What's your name?"))
	}
}

fn describe(appointment: &Appointment) -> String {
	format!(
		"on {} at {} ({})",
		hours::format_date(appointment.date),
		hours::format_time(appointment.time),
		appointment.ref_code
	)
}
