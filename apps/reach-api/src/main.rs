use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = reach_api::Args::parse();

	reach_api::run(args).await
}
