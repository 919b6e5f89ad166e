pub mod admin;
pub mod command;
pub mod hours;
pub mod refcode;
pub mod settings;
pub mod state;
pub mod time_serde;
