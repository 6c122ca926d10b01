use color_eyre::{Result, eyre};

use finq_config::{Config, EmbeddingProviderConfig};
use finq_service::EmbeddingProvider;
use finq_storage::{
	chunk_store::ChunkStore,
	vector_index::{self, Alignment, FlatIndex},
};

/// Embeds every stored chunk in store order, `batch_size` texts per request, and builds an index
/// stamped with the store fingerprint.
pub async fn build_index(
	store: &ChunkStore,
	embedding: &dyn EmbeddingProvider,
	cfg: &EmbeddingProviderConfig,
	batch_size: usize,
) -> Result<FlatIndex> {
	let mut rows = Vec::with_capacity(store.len());

	for batch in store.chunks().chunks(batch_size.max(1)) {
		let texts: Vec<String> = batch.iter().map(|chunk| chunk.text.clone()).collect();
		let vectors = embedding.embed(cfg, &texts).await?;

		if vectors.len() != texts.len() {
			return Err(eyre::eyre!(
				"Embedding provider returned {} vectors for {} chunks.",
				vectors.len(),
				texts.len()
			));
		}

		for mut vector in vectors {
			vector_index::normalize(&mut vector);
			rows.push(vector);
		}

		tracing::info!(embedded = rows.len(), total = store.len(), "Embedded batch.");
	}

	let dim = rows
		.first()
		.map(Vec::len)
		.or(cfg.dimensions.map(|dimensions| dimensions as usize))
		.unwrap_or_default();

	Ok(FlatIndex::build(dim, rows, store.fingerprint())?)
}

/// One-line summary of the store, the index, and whether they line up.
pub fn status(cfg: &Config) -> Result<String> {
	let storage = &cfg.storage;

	if !storage.chunks_path.exists() {
		return Ok(format!("No chunk store at {}.", storage.chunks_path.display()));
	}

	let store = ChunkStore::load(&storage.chunks_path)?;

	if !storage.index_path.exists() {
		return Ok(format!(
			"{} chunks, no index at {}. Run `finq-ingest index`.",
			store.len(),
			storage.index_path.display()
		));
	}

	let index = FlatIndex::load(&storage.index_path)?;
	let verdict =
		match index.check_alignment(store.chunks().iter().map(|chunk| chunk.id.as_str())) {
			Alignment::Aligned => "aligned".to_string(),
			Alignment::CountMismatch { .. } => "count mismatch, rebuild the index".to_string(),
			Alignment::FingerprintMismatch => "chunk ids changed, rebuild the index".to_string(),
		};

	Ok(format!(
		"{} chunks, {} vectors of {} dimensions: {verdict}.",
		store.len(),
		index.len(),
		index.dim()
	))
}
