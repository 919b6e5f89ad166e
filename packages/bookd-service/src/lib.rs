pub mod admin;
pub mod cancel;
pub mod flow;
pub mod inbound;
pub mod jobs;

use std::{future::Future, pin::Pin, sync::Arc};

pub use admin::{JobsReport, SheetRetryReport};
pub use inbound::InboundMessage;

use bookd_config::{Config, OutboundProviderConfig, ReplyProviderConfig, SheetProviderConfig};
use bookd_providers::{outbound, reply, sheets};
pub use bookd_providers::reply::ChatTurn;
use bookd_storage::db::Db;

pub type ServiceResult<T> = Result<T, ServiceError>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait OutboundProvider
where
	Self: Send + Sync,
{
	fn send_message<'a>(
		&'a self,
		cfg: &'a OutboundProviderConfig,
		to: &'a str,
		body: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Option<String>>>;
}

pub trait SheetProvider
where
	Self: Send + Sync,
{
	fn append_row<'a>(
		&'a self,
		cfg: &'a SheetProviderConfig,
		spreadsheet_id: Option<&'a str>,
		tab: Option<&'a str>,
		row: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<()>>;

	fn scan_slot<'a>(
		&'a self,
		cfg: &'a SheetProviderConfig,
		spreadsheet_id: Option<&'a str>,
		tab: Option<&'a str>,
		date: &'a str,
		time: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<bool>>;
}

pub trait ReplyProvider
where
	Self: Send + Sync,
{
	fn generate_reply<'a>(
		&'a self,
		cfg: &'a ReplyProviderConfig,
		system_prompt: &'a str,
		turns: &'a [ChatTurn],
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

#[derive(Debug)]
pub enum ServiceError {
	InvalidRequest { message: String },
	Provider { message: String },
	Storage { message: String },
}

#[derive(Clone)]
pub struct Providers {
	pub outbound: Arc<dyn OutboundProvider>,
	pub sheets: Arc<dyn SheetProvider>,
	pub reply: Arc<dyn ReplyProvider>,
}

pub struct BookingService {
	pub cfg: Config,
	pub db: Db,
	pub providers: Providers,
}

struct DefaultProviders;

impl std::fmt::Display for ServiceError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InvalidRequest { message } => write!(f, "Invalid request: {message}"),
			Self::Provider { message } => write!(f, "Provider error: {message}"),
			Self::Storage { message } => write!(f, "Storage error: {message}"),
		}
	}
}

impl std::error::Error for ServiceError {}

impl From<sqlx::Error> for ServiceError {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<bookd_storage::Error> for ServiceError {
	fn from(err: bookd_storage::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<color_eyre::Report> for ServiceError {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl OutboundProvider for DefaultProviders {
	fn send_message<'a>(
		&'a self,
		cfg: &'a OutboundProviderConfig,
		to: &'a str,
		body: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Option<String>>> {
		Box::pin(outbound::send_message(cfg, to, body))
	}
}

impl SheetProvider for DefaultProviders {
	fn append_row<'a>(
		&'a self,
		cfg: &'a SheetProviderConfig,
		spreadsheet_id: Option<&'a str>,
		tab: Option<&'a str>,
		row: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<()>> {
		Box::pin(sheets::append_row(cfg, spreadsheet_id, tab, row))
	}

	fn scan_slot<'a>(
		&'a self,
		cfg: &'a SheetProviderConfig,
		spreadsheet_id: Option<&'a str>,
		tab: Option<&'a str>,
		date: &'a str,
		time: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<bool>> {
		Box::pin(sheets::scan_slot(cfg, spreadsheet_id, tab, date, time))
	}
}

impl ReplyProvider for DefaultProviders {
	fn generate_reply<'a>(
		&'a self,
		cfg: &'a ReplyProviderConfig,
		system_prompt: &'a str,
		turns: &'a [ChatTurn],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(reply::generate_reply(cfg, system_prompt, turns))
	}
}

impl Providers {
	pub fn new(
		outbound: Arc<dyn OutboundProvider>,
		sheets: Arc<dyn SheetProvider>,
		reply: Arc<dyn ReplyProvider>,
	) -> Self {
		Self { outbound, sheets, reply }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);
		Self { outbound: provider.clone(), sheets: provider.clone(), reply: provider }
	}
}

impl BookingService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self { cfg, db, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, db: Db, providers: Providers) -> Self {
		Self { cfg, db, providers }
	}
}
