pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"00_extensions.sql" => out.push_str(include_str!("../../../sql/00_extensions.sql")),
				"tables/001_channels.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_channels.sql")),
				"tables/002_tenant_settings.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_tenant_settings.sql")),
				"tables/003_messages.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_messages.sql")),
				"tables/004_conversations.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_conversations.sql")),
				"tables/005_appointments.sql" =>
					out.push_str(include_str!("../../../sql/tables/005_appointments.sql")),
				"tables/006_jobs.sql" =>
					out.push_str(include_str!("../../../sql/tables/006_jobs.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}
