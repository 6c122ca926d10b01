mod error;

pub use error::{Error, Result};

use std::{fs, path::Path};

use tempfile::TempDir;

use finq_config::Config;
use finq_domain::chunk::Chunk;
use finq_storage::{
	chunk_store::{self, ChunkStore},
	vector_index::{self, FlatIndex},
};

/// Dimension of [`hash_embedding`] vectors used across fixtures.
pub const TEST_DIM: usize = 64;

const CONFIG_TEMPLATE: &str = r#"
[service]
log_level = "debug"

[storage]
chunks_path = "chunks.jsonl"
index_path  = "vectors.fqvi"
macro_dir   = "macro"

[providers.embedding]
api_base = "http://127.0.0.1:9"
model    = "hash-embedding"

[providers.generation]
api_base = "http://127.0.0.1:9"
model    = "stub-generator"
"#;

/// Bag-of-words embedding that needs no model. Texts sharing words land close together, texts
/// with no words at all map to the zero vector.
pub fn hash_embedding(text: &str, dim: usize) -> Vec<f32> {
	let mut vector = vec![0.0_f32; dim];

	if dim == 0 {
		return vector;
	}

	for word in finq_domain::text::words(text) {
		let digest = blake3::hash(word.as_bytes());
		let bytes = digest.as_bytes();
		let mut bucket = [0_u8; 8];

		bucket.copy_from_slice(&bytes[..8]);

		let slot = (u64::from_le_bytes(bucket) % dim as u64) as usize;
		let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };

		vector[slot] += sign;
	}

	vector_index::normalize(&mut vector);

	vector
}

/// Builder for filing chunks with sensible defaults.
#[derive(Clone, Debug)]
pub struct ChunkFixture {
	chunk: Chunk,
}
impl ChunkFixture {
	pub fn new(id: &str, text: &str) -> Self {
		Self {
			chunk: Chunk {
				id: id.to_string(),
				doc: format!("{id}.html"),
				issuer: None,
				form: Some("10-K".to_string()),
				year: None,
				page_start: 1,
				page_end: 1,
				text: text.to_string(),
				accession: None,
			},
		}
	}

	/// Sets the issuer and year and derives the document name from them.
	pub fn filing(mut self, issuer: &str, year: i32) -> Self {
		self.chunk.issuer = Some(issuer.to_string());
		self.chunk.year = Some(year);
		self.chunk.doc = format!("{issuer}_10-K_{year}.html");

		self
	}

	pub fn doc(mut self, doc: &str) -> Self {
		self.chunk.doc = doc.to_string();

		self
	}

	pub fn pages(mut self, start: u32, end: u32) -> Self {
		self.chunk.page_start = start;
		self.chunk.page_end = end;

		self
	}

	pub fn build(self) -> Chunk {
		self.chunk
	}
}

/// Store plus a [`hash_embedding`] index aligned with it.
pub fn indexed_store(chunks: Vec<Chunk>) -> Result<(ChunkStore, FlatIndex)> {
	let store = ChunkStore::new(chunks);
	let rows = store.chunks().iter().map(|chunk| hash_embedding(&chunk.text, TEST_DIM)).collect();
	let index = FlatIndex::build(TEST_DIM, rows, store.fingerprint())?;

	Ok((store, index))
}

/// Throwaway data directory with a config pointing into it.
pub struct TestWorkspace {
	dir: TempDir,
	cfg: Config,
}
impl TestWorkspace {
	pub fn new() -> Result<Self> {
		let dir = tempfile::tempdir()?;
		let mut cfg = finq_config::parse(CONFIG_TEMPLATE)?;

		cfg.storage.chunks_path = dir.path().join("processed").join("chunks.jsonl");
		cfg.storage.index_path = dir.path().join("processed").join("vectors.fqvi");
		cfg.storage.macro_dir = dir.path().join("macro");

		fs::create_dir_all(&cfg.storage.macro_dir)?;

		Ok(Self { dir, cfg })
	}

	pub fn path(&self) -> &Path {
		self.dir.path()
	}

	pub fn config(&self) -> Config {
		self.cfg.clone()
	}

	/// Appends chunks to the store and rebuilds the index over the whole store.
	pub fn write_corpus(&self, chunks: &[Chunk]) -> Result<ChunkStore> {
		chunk_store::append_dedup(&self.cfg.storage.chunks_path, chunks)?;

		let store = ChunkStore::load(&self.cfg.storage.chunks_path)?;
		let (_, index) = indexed_store(store.chunks().to_vec())?;

		index.save(&self.cfg.storage.index_path)?;

		Ok(store)
	}

	/// Writes a `date,value` series file. Empty values are written as FRED writes gaps.
	pub fn write_macro_series(&self, stem: &str, rows: &[(&str, &str)]) -> Result<()> {
		let mut csv = String::from("date,value\n");

		for (date, value) in rows {
			csv.push_str(date);
			csv.push(',');
			csv.push_str(value);
			csv.push('\n');
		}

		fs::write(self.cfg.storage.macro_dir.join(format!("{stem}.csv")), csv)?;

		Ok(())
	}

	pub fn write_file(&self, relative: &str, contents: &str) -> Result<()> {
		let path = self.dir.path().join(relative);

		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)?;
		}

		fs::write(&path, contents)?;

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn hash_embedding_is_deterministic_and_unit_length() {
		let first = hash_embedding("Supply chain risk factors", TEST_DIM);
		let second = hash_embedding("supply CHAIN risk factors", TEST_DIM);

		assert_eq!(first, second);
		assert!((vector_index::dot(&first, &first) - 1.0).abs() < 1e-5);
	}

	#[test]
	fn wordless_text_embeds_to_zero() {
		assert!(hash_embedding("12 34 ??", TEST_DIM).iter().all(|value| *value == 0.0));
	}

	#[test]
	fn workspace_round_trips_corpus() {
		let workspace = TestWorkspace::new().expect("workspace failed");
		let chunk = ChunkFixture::new("a", "Liquidity remains strong.").filing("AAPL", 2023).build();
		let store = workspace.write_corpus(&[chunk]).expect("write failed");
		let index = FlatIndex::load(&workspace.config().storage.index_path).expect("load failed");

		assert_eq!(store.chunks()[0].doc, "AAPL_10-K_2023.html");
		assert_eq!(
			index.check_alignment(store.chunks().iter().map(|chunk| chunk.id.as_str())),
			vector_index::Alignment::Aligned
		);
	}
}
