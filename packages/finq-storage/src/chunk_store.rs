use std::{
	collections::HashSet,
	fs::{self, File, OpenOptions},
	io::{BufRead, BufReader, BufWriter, Write},
	path::Path,
};

use finq_domain::chunk::Chunk;

use crate::{Error, Result};

/// Chunks in store order. A chunk's position here is its position in the vector index.
#[derive(Clone, Debug, Default)]
pub struct ChunkStore {
	chunks: Vec<Chunk>,
}
impl ChunkStore {
	pub fn new(chunks: Vec<Chunk>) -> Self {
		Self { chunks }
	}

	/// Reads every record, skipping blank lines. A malformed line fails the whole load.
	pub fn load(path: &Path) -> Result<Self> {
		let file = File::open(path).map_err(Error::io(path))?;
		let mut chunks = Vec::new();

		for (idx, line) in BufReader::new(file).lines().enumerate() {
			let line = line.map_err(Error::io(path))?;

			if line.trim().is_empty() {
				continue;
			}

			let mut chunk: Chunk = serde_json::from_str(&line).map_err(|source| {
				Error::MalformedRecord { path: path.to_path_buf(), line: idx + 1, source }
			})?;

			chunk.ensure_id();
			chunks.push(chunk);
		}

		tracing::debug!(path = %path.display(), chunks = chunks.len(), "Loaded chunk store.");

		Ok(Self { chunks })
	}

	pub fn get(&self, position: usize) -> Option<&Chunk> {
		self.chunks.get(position)
	}

	pub fn chunks(&self) -> &[Chunk] {
		&self.chunks
	}

	pub fn len(&self) -> usize {
		self.chunks.len()
	}

	pub fn is_empty(&self) -> bool {
		self.chunks.is_empty()
	}

	/// Hash over the ordered chunk ids, stored alongside vectors to prove alignment.
	pub fn fingerprint(&self) -> [u8; 32] {
		fingerprint_ids(self.chunks.iter().map(|chunk| chunk.id.as_str()))
	}
}

pub fn fingerprint_ids<'a, I>(ids: I) -> [u8; 32]
where
	I: IntoIterator<Item = &'a str>,
{
	let mut hasher = blake3::Hasher::new();

	for id in ids {
		hasher.update(id.as_bytes());
		hasher.update(b"\n");
	}

	*hasher.finalize().as_bytes()
}

/// Ids already present in the store. Unreadable lines are skipped so a damaged record never
/// blocks ingestion.
pub fn existing_ids(path: &Path) -> Result<HashSet<String>> {
	let mut ids = HashSet::new();

	if !path.exists() {
		return Ok(ids);
	}

	let file = File::open(path).map_err(Error::io(path))?;

	for (idx, line) in BufReader::new(file).lines().enumerate() {
		let line = line.map_err(Error::io(path))?;

		if line.trim().is_empty() {
			continue;
		}

		match serde_json::from_str::<Chunk>(&line) {
			Ok(mut chunk) => {
				chunk.ensure_id();
				ids.insert(chunk.id);
			},
			Err(err) => {
				tracing::warn!(
					path = %path.display(),
					line = idx + 1,
					error = %err,
					"Skipping unreadable chunk record."
				);
			},
		}
	}

	Ok(ids)
}

/// Appends chunks whose id is not stored yet and returns how many were written. Duplicates
/// inside `chunks` are collapsed too, so repeating an ingestion run writes nothing.
pub fn append_dedup(path: &Path, chunks: &[Chunk]) -> Result<usize> {
	let mut seen = existing_ids(path)?;
	let fresh: Vec<&Chunk> = chunks.iter().filter(|chunk| seen.insert(chunk.id.clone())).collect();

	if fresh.is_empty() {
		return Ok(0);
	}
	if let Some(parent) = non_empty_parent(path) {
		fs::create_dir_all(parent).map_err(Error::io(parent))?;
	}

	let file = OpenOptions::new().create(true).append(true).open(path).map_err(Error::io(path))?;
	let mut writer = BufWriter::new(file);

	for chunk in &fresh {
		serde_json::to_writer(&mut writer, chunk)?;
		writer.write_all(b"\n").map_err(Error::io(path))?;
	}

	writer.flush().map_err(Error::io(path))?;

	Ok(fresh.len())
}

pub(crate) fn non_empty_parent(path: &Path) -> Option<&Path> {
	path.parent().filter(|parent| !parent.as_os_str().is_empty())
}
