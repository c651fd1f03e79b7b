use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = marquee_api::Args::parse();
	marquee_api::run(args).await
}
