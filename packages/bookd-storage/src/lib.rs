pub mod appointments;
pub mod conversations;
pub mod db;
pub mod jobs;
pub mod messages;
pub mod models;
pub mod schema;
pub mod tenants;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
