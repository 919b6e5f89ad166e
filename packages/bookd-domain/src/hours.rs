use serde::Deserialize;
use time::{Date, Time, Weekday, format_description::BorrowedFormatItem, macros::format_description};

const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

pub const DEFAULT_SLOT_MINUTES: u16 = 30;

/// Why a candidate date cannot advance the booking flow.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DateRejection {
	Unparseable,
	ClosedDay,
}

/// Why a candidate time cannot advance the booking flow. `SlotTaken` is
/// checked separately against committed appointments; these three are the
/// purely local rules.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TimeRejection {
	Unparseable,
	OutsideHours,
	Misaligned,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Interval {
	#[serde(with = "crate::time_serde::time_of_day")]
	pub start: Time,
	#[serde(with = "crate::time_serde::time_of_day")]
	pub end: Time,
}
impl Interval {
	pub fn contains(&self, time: Time) -> bool {
		self.start <= time && time < self.end
	}
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct WeeklySchedule {
	pub mon: Vec<Interval>,
	pub tue: Vec<Interval>,
	pub wed: Vec<Interval>,
	pub thu: Vec<Interval>,
	pub fri: Vec<Interval>,
	pub sat: Vec<Interval>,
	pub sun: Vec<Interval>,
}
impl WeeklySchedule {
	pub fn intervals_for(&self, weekday: Weekday) -> &[Interval] {
		match weekday {
			Weekday::Monday => &self.mon,
			Weekday::Tuesday => &self.tue,
			Weekday::Wednesday => &self.wed,
			Weekday::Thursday => &self.thu,
			Weekday::Friday => &self.fri,
			Weekday::Saturday => &self.sat,
			Weekday::Sunday => &self.sun,
		}
	}
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct HoursSettings {
	pub slot_minutes: u16,
	/// Offset of the tenant's local wall clock from UTC, used when deciding
	/// when a reminder should fire. Appointments themselves are stored as
	/// local date and time.
	pub utc_offset_minutes: i32,
	pub weekly: WeeklySchedule,
}
impl Default for HoursSettings {
	fn default() -> Self {
		Self {
			slot_minutes: DEFAULT_SLOT_MINUTES,
			utc_offset_minutes: 0,
			weekly: default_weekly(),
		}
	}
}
impl HoursSettings {
	pub fn is_open_on(&self, date: Date) -> bool {
		!self.weekly.intervals_for(date.weekday()).is_empty()
	}

	pub fn within_hours(&self, date: Date, time: Time) -> bool {
		self.weekly.intervals_for(date.weekday()).iter().any(|interval| interval.contains(time))
	}

	pub fn slot_aligned(&self, time: Time) -> bool {
		if self.slot_minutes == 0 {
			return false;
		}

		minutes_of(time) % self.slot_minutes as u32 == 0
	}

	pub fn validate_date(&self, input: &str) -> Result<Date, DateRejection> {
		let date = parse_date(input).ok_or(DateRejection::Unparseable)?;

		if !self.is_open_on(date) {
			return Err(DateRejection::ClosedDay);
		}

		Ok(date)
	}

	pub fn validate_time(&self, date: Date, input: &str) -> Result<Time, TimeRejection> {
		let time = parse_time(input).ok_or(TimeRejection::Unparseable)?;

		if !self.within_hours(date, time) {
			return Err(TimeRejection::OutsideHours);
		}
		if !self.slot_aligned(time) {
			return Err(TimeRejection::Misaligned);
		}

		Ok(time)
	}

	/// "09:00-17:00" style label of the opening intervals for a date, used in
	/// the outside-hours re-prompt. "Closed" when the day has none.
	pub fn day_hours_label(&self, date: Date) -> String {
		let intervals = self.weekly.intervals_for(date.weekday());

		if intervals.is_empty() {
			return "Closed".to_string();
		}

		intervals
			.iter()
			.map(|interval| format!("{}-{}", format_time(interval.start), format_time(interval.end)))
			.collect::<Vec<_>>()
			.join(", ")
	}
}

fn default_weekly() -> WeeklySchedule {
	let workday = || vec![Interval { start: on_the_hour(9), end: on_the_hour(17) }];

	WeeklySchedule {
		mon: workday(),
		tue: workday(),
		wed: workday(),
		thu: workday(),
		fri: workday(),
		sat: vec![Interval { start: on_the_hour(9), end: on_the_hour(13) }],
		sun: Vec::new(),
	}
}

fn on_the_hour(hour: u8) -> Time {
	Time::from_hms(hour, 0, 0).unwrap_or(Time::MIDNIGHT)
}

pub fn minutes_of(time: Time) -> u32 {
	time.hour() as u32 * 60 + time.minute() as u32
}

pub fn parse_date(input: &str) -> Option<Date> {
	Date::parse(input.trim(), DATE_FORMAT).ok()
}

pub fn format_date(date: Date) -> String {
	date.format(DATE_FORMAT).unwrap_or_else(|_| date.to_string())
}

/// Accepts 24-hour "14:00"/"9:30" and 12-hour "2:30 PM"/"9:30am" forms.
pub fn parse_time(input: &str) -> Option<Time> {
	let upper = input.trim().to_ascii_uppercase();
	let (clock, period) = if let Some(rest) = upper.strip_suffix("AM") {
		(rest.trim_end(), Some(Period::Am))
	} else if let Some(rest) = upper.strip_suffix("PM") {
		(rest.trim_end(), Some(Period::Pm))
	} else {
		(upper.as_str(), None)
	};
	let (hour_text, minute_text) = clock.split_once(':')?;
	let hour: u8 = hour_text.trim().parse().ok()?;
	let minute: u8 = minute_text.trim().parse().ok()?;

	if minute > 59 {
		return None;
	}

	let hour = match period {
		None =>
			if hour > 23 {
				return None;
			} else {
				hour
			},
		Some(period) => {
			if hour == 0 || hour > 12 {
				return None;
			}

			match (period, hour) {
				(Period::Am, 12) => 0,
				(Period::Am, hour) => hour,
				(Period::Pm, 12) => 12,
				(Period::Pm, hour) => hour + 12,
			}
		},
	};

	Time::from_hms(hour, minute, 0).ok()
}

/// Strict "HH:MM" form, as persisted in drafts and settings.
pub fn parse_time_24h(input: &str) -> Option<Time> {
	let (hour_text, minute_text) = input.trim().split_once(':')?;
	let hour: u8 = hour_text.parse().ok()?;
	let minute: u8 = minute_text.parse().ok()?;

	Time::from_hms(hour, minute, 0).ok()
}

pub fn format_time(time: Time) -> String {
	format!("{:02}:{:02}", time.hour(), time.minute())
}

#[derive(Clone, Copy)]
enum Period {
	Am,
	Pm,
}
