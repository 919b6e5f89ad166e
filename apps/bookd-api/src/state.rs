use std::sync::Arc;

use bookd_service::BookingService;
use bookd_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<BookingService>,
}
impl AppState {
	pub async fn new(config: bookd_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let service = BookingService::new(config, db);

		Ok(Self { service: Arc::new(service) })
	}
}
