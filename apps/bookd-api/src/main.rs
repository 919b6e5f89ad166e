use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = bookd_api::Args::parse();

	bookd_api::run(args).await
}
