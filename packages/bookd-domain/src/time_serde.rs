//! Serde helpers for the calendar-date and wall-clock representations stored
//! in conversation drafts and tenant settings ("2026-01-15", "14:00").

pub mod date {
	use serde::{Deserialize, Deserializer, Serializer, de};
	use time::Date;

	use crate::hours;

	pub fn serialize<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&hours::format_date(*date))
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
	where
		D: Deserializer<'de>,
	{
		let text = String::deserialize(deserializer)?;

		hours::parse_date(&text)
			.ok_or_else(|| de::Error::custom(format!("Invalid calendar date: {text:?}.")))
	}
}

pub mod time_of_day {
	use serde::{Deserialize, Deserializer, Serializer, de};
	use time::Time;

	use crate::hours;

	pub fn serialize<S>(time: &Time, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&hours::format_time(*time))
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Time, D::Error>
	where
		D: Deserializer<'de>,
	{
		let text = String::deserialize(deserializer)?;

		hours::parse_time_24h(&text)
			.ok_or_else(|| de::Error::custom(format!("Invalid wall-clock time: {text:?}.")))
	}
}
