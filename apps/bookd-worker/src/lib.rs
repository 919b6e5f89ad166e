use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod worker;

#[derive(Debug, Parser)]
#[command(
	version = bookd_cli::VERSION,
	rename_all = "kebab",
	styles = bookd_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: std::path::PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = bookd_config::load(&args.config)?;
	let filter = EnvFilter::new(config.service.log_level.clone());
	tracing_subscriber::fmt().with_env_filter(filter).init();

	let db = bookd_storage::db::Db::connect(&config.storage.postgres).await?;
	db.ensure_schema().await?;

	let state = worker::WorkerState {
		cfg: config,
		db,
		providers: bookd_service::Providers::default(),
	};

	worker::run_worker(state).await
}
