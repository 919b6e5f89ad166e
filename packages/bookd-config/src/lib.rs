mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Booking, Config, OutboundProviderConfig, Postgres, Providers, ReplyProviderConfig, Service,
	SheetProviderConfig, Storage, Worker,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.service.admin_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.admin_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.booking.reminder_minutes_before < 0 {
		return Err(Error::Validation {
			message: "booking.reminder_minutes_before must be zero or greater.".to_string(),
		});
	}
	if cfg.booking.ref_code_max_attempts == 0 {
		return Err(Error::Validation {
			message: "booking.ref_code_max_attempts must be greater than zero.".to_string(),
		});
	}
	if cfg.worker.name.trim().is_empty() {
		return Err(Error::Validation { message: "worker.name must be non-empty.".to_string() });
	}
	if cfg.worker.batch_size == 0 {
		return Err(Error::Validation {
			message: "worker.batch_size must be greater than zero.".to_string(),
		});
	}
	if cfg.worker.poll_interval_ms == 0 {
		return Err(Error::Validation {
			message: "worker.poll_interval_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.worker.sweep_interval_secs == 0 {
		return Err(Error::Validation {
			message: "worker.sweep_interval_secs must be greater than zero.".to_string(),
		});
	}
	if cfg.worker.sweep_batch == 0 {
		return Err(Error::Validation {
			message: "worker.sweep_batch must be greater than zero.".to_string(),
		});
	}
	if !cfg.providers.reply.temperature.is_finite() {
		return Err(Error::Validation {
			message: "providers.reply.temperature must be a finite number.".to_string(),
		});
	}

	for (label, base) in [
		("outbound", &cfg.providers.outbound.api_base),
		("sheets", &cfg.providers.sheets.api_base),
		("reply", &cfg.providers.reply.api_base),
	] {
		if base.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_base must be non-empty."),
			});
		}
	}

	for (label, key) in [
		("outbound", &cfg.providers.outbound.api_key),
		("sheets", &cfg.providers.sheets.api_key),
		("reply", &cfg.providers.reply.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg
		.booking
		.fallback_admin
		.as_deref()
		.map(|admin| admin.trim().is_empty())
		.unwrap_or(false)
	{
		cfg.booking.fallback_admin = None;
	}
	if cfg.providers.sheets.tab.trim().is_empty() {
		cfg.providers.sheets.tab = "Sheet1".to_string();
	}
}
