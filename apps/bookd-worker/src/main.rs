use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	bookd_worker::run(bookd_worker::Args::parse()).await
}
