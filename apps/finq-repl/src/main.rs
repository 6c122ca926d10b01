use clap::Parser;

#[tokio::main(flavor = "current_thread")]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = finq_repl::Args::parse();

	finq_repl::run(args).await
}
