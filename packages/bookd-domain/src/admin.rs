/// Strips transport prefixes and separators so "whatsapp:+1 (555) 010-0100"
/// and "+15550100100" compare equal.
pub fn normalize_address(address: &str) -> String {
	let raw = address.trim().trim_start_matches("whatsapp:").trim();

	raw.chars().filter(|c| c.is_ascii_digit() || *c == '+').collect()
}

pub fn is_admin(user: &str, admins: &[String], fallback: Option<&str>) -> bool {
	let user_norm = normalize_address(user);

	if admins.iter().any(|admin| normalize_address(admin) == user_norm) {
		return true;
	}

	fallback.map(|admin| normalize_address(admin) == user_norm).unwrap_or(false)
}
