use clap::Parser;

#[tokio::main(flavor = "current_thread")]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = finq_ingest::Args::parse();

	finq_ingest::run(args).await
}
