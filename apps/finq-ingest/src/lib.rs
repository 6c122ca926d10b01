pub mod chunks;
pub mod index;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use finq_service::Providers;
use finq_storage::chunk_store::ChunkStore;

#[derive(Debug, Parser)]
#[command(
	version = finq_cli::VERSION,
	rename_all = "kebab",
	styles = finq_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE", default_value = "finq.toml")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Chunk one filing's extracted text and append it to the chunk store.
	Chunks(chunks::ChunksArgs),
	/// Rebuild the vector index from the whole chunk store.
	Index {
		#[arg(long, default_value_t = 64)]
		batch_size: usize,
	},
	/// Report whether the vector index matches the chunk store.
	Status,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let cfg = finq_config::load(&args.config)?;

	init_tracing(&cfg);

	match args.command {
		Command::Chunks(chunk_args) => {
			let written = chunks::ingest(&cfg, &chunk_args)?;

			println!("Appended {written} new chunks to {}.", cfg.storage.chunks_path.display());
		},
		Command::Index { batch_size } => {
			let store = ChunkStore::load(&cfg.storage.chunks_path)?;
			let providers = Providers::default();
			let index = index::build_index(
				&store,
				providers.embedding.as_ref(),
				&cfg.providers.embedding,
				batch_size,
			)
			.await?;

			index.save(&cfg.storage.index_path)?;

			println!(
				"Indexed {} chunks ({} dimensions) into {}.",
				index.len(),
				index.dim(),
				cfg.storage.index_path.display()
			);
		},
		Command::Status => {
			println!("{}", index::status(&cfg)?);
		},
	}

	Ok(())
}

fn init_tracing(cfg: &finq_config::Config) {
	let filter =
		EnvFilter::try_new(&cfg.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
