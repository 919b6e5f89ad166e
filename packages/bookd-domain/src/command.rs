/// Phrases that clearly start a new booking. Cancel and reschedule are exact
/// commands, not keyword matches, so a message like "how do I cancel?" still
/// reaches the free-text reply path.
const BOOKING_KEYWORDS: &[&str] = &[
	"book",
	"booking",
	"appointment",
	"schedule",
	"make appointment",
	"see dentist",
	"visit clinic",
];

const REF_CODE_PREFIX: &str = "AP-";
const REF_CODE_SUFFIX_LEN: usize = 6;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
	Reset,
	CancelLatest,
	CancelByRef(String),
	Reschedule,
	MyAppointment,
	AdminToday,
	AdminRetrySheets,
	AdminJobs,
	AdminFailedJobs,
	/// Not a command; fed to the booking state machine or the free-text
	/// reply collaborator.
	Conversational,
}

pub fn classify(text: &str) -> Command {
	let trimmed = text.trim();

	match trimmed.to_lowercase().as_str() {
		"reset" => Command::Reset,
		"cancel" => Command::CancelLatest,
		"reschedule" => Command::Reschedule,
		"my appointment" => Command::MyAppointment,
		"today" => Command::AdminToday,
		"retry sheets" => Command::AdminRetrySheets,
		"jobs" => Command::AdminJobs,
		"failed jobs" | "jobs failed" => Command::AdminFailedJobs,
		_ => parse_cancel_by_ref(trimmed).map(Command::CancelByRef).unwrap_or(Command::Conversational),
	}
}

pub fn is_booking_intent(text: &str) -> bool {
	let lowered = text.trim().to_lowercase();

	!lowered.is_empty() && BOOKING_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
}

pub fn is_ref_code(code: &str) -> bool {
	let Some(suffix) = code.strip_prefix(REF_CODE_PREFIX) else {
		return false;
	};

	suffix.len() == REF_CODE_SUFFIX_LEN
		&& suffix.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

fn parse_cancel_by_ref(text: &str) -> Option<String> {
	let upper = text.to_ascii_uppercase();
	let rest = upper.strip_prefix("CANCEL")?;

	if !rest.starts_with(char::is_whitespace) {
		return None;
	}

	let code = rest.trim();

	is_ref_code(code).then(|| code.to_string())
}
