use std::{fs, path::PathBuf};

use clap::Args;
use color_eyre::{Result, eyre};

use finq_chunking::{ChunkingConfig, FilingMeta};
use finq_storage::chunk_store;

#[derive(Debug, Default, Args)]
pub struct ChunksArgs {
	/// Extracted filing text. Form feeds separate pages.
	#[arg(long, value_name = "FILE")]
	pub text: PathBuf,
	/// Filing metadata JSON with `ticker`, `form`, `filingDate`, and `accession`.
	#[arg(long, value_name = "FILE")]
	pub meta: Option<PathBuf>,
	#[arg(long)]
	pub ticker: Option<String>,
	#[arg(long)]
	pub form: Option<String>,
	#[arg(long, value_name = "YYYY-MM-DD")]
	pub filing_date: Option<String>,
	#[arg(long)]
	pub accession: Option<String>,
	/// Overrides the derived document name.
	#[arg(long)]
	pub doc: Option<String>,
}

/// Chunks the filing named by `args` and appends the chunks not already stored. Returns how many
/// were written.
pub fn ingest(cfg: &finq_config::Config, args: &ChunksArgs) -> Result<usize> {
	let meta = resolve_meta(args)?;
	let text = fs::read_to_string(&args.text)?;
	let mut chunks = finq_chunking::build_chunks(&text, &meta, &ChunkingConfig::from(&cfg.chunking));

	if let Some(doc) = &args.doc {
		for chunk in &mut chunks {
			chunk.doc = doc.clone();
		}
	}

	let written = chunk_store::append_dedup(&cfg.storage.chunks_path, &chunks)?;

	tracing::info!(
		issuer = meta.issuer.as_str(),
		accession = meta.accession.as_str(),
		chunks = chunks.len(),
		written,
		"Filing ingested."
	);

	Ok(written)
}

/// Metadata from `--meta` with any explicit flag taking precedence.
pub fn resolve_meta(args: &ChunksArgs) -> Result<FilingMeta> {
	let base = match &args.meta {
		Some(path) => Some(serde_json::from_str::<FilingMeta>(&fs::read_to_string(path)?)?),
		None => None,
	};
	let issuer = args
		.ticker
		.clone()
		.or_else(|| base.as_ref().map(|meta| meta.issuer.clone()))
		.ok_or_else(|| eyre::eyre!("Provide --meta or --ticker."))?;
	let accession = args
		.accession
		.clone()
		.or_else(|| base.as_ref().map(|meta| meta.accession.clone()))
		.ok_or_else(|| eyre::eyre!("Provide --meta or --accession."))?;
	let form = args
		.form
		.clone()
		.or_else(|| base.as_ref().map(|meta| meta.form.clone()))
		.unwrap_or_else(|| "UNK".to_string());
	let filing_date =
		args.filing_date.clone().or_else(|| base.and_then(|meta| meta.filing_date));

	Ok(FilingMeta { issuer: issuer.to_uppercase(), form, filing_date, accession })
}
