#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("Not found: {0}")]
	NotFound(String),
	#[error("Slot is already booked.")]
	SlotTaken,
	#[error("Reference code collision.")]
	RefCodeCollision,
	#[error("Appointment belongs to another user.")]
	NotOwner,
}
