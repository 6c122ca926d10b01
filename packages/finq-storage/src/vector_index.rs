use std::{
	cmp::Ordering,
	fs::{self, File},
	io::{BufWriter, Write},
	path::Path,
};

use crate::{Error, Result, chunk_store};

const MAGIC: &[u8; 4] = b"FQVI";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 4 + 8 + 32;

/// One nearest-neighbor hit. `position` is `None` for padding when the index holds fewer than
/// the requested number of vectors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
	pub position: Option<usize>,
	pub score: f32,
}
impl Candidate {
	pub fn padding() -> Self {
		Self { position: None, score: f32::NEG_INFINITY }
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Alignment {
	Aligned,
	CountMismatch { index: usize, store: usize },
	FingerprintMismatch,
}

/// Exact inner-product index over unit vectors, persisted together with the fingerprint of the
/// chunk ids it was built from.
#[derive(Clone, Debug)]
pub struct FlatIndex {
	dim: usize,
	vectors: Vec<f32>,
	fingerprint: [u8; 32],
}
impl FlatIndex {
	pub fn build(dim: usize, rows: Vec<Vec<f32>>, fingerprint: [u8; 32]) -> Result<Self> {
		let mut vectors = Vec::with_capacity(rows.len() * dim);

		for row in rows {
			if row.len() != dim {
				return Err(Error::DimensionMismatch { expected: dim, actual: row.len() });
			}

			vectors.extend(row);
		}

		Ok(Self { dim, vectors, fingerprint })
	}

	pub fn dim(&self) -> usize {
		self.dim
	}

	pub fn len(&self) -> usize {
		if self.dim == 0 { 0 } else { self.vectors.len() / self.dim }
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn check_alignment<'a, I>(&self, ids: I) -> Alignment
	where
		I: IntoIterator<Item = &'a str>,
		I::IntoIter: ExactSizeIterator,
	{
		let ids = ids.into_iter();

		if ids.len() != self.len() {
			return Alignment::CountMismatch { index: self.len(), store: ids.len() };
		}
		if chunk_store::fingerprint_ids(ids) != self.fingerprint {
			return Alignment::FingerprintMismatch;
		}

		Alignment::Aligned
	}

	/// Exactly `k` hits, best first. Equal scores keep index order and NaN scores sort last. An
	/// empty index answers with padding for any query.
	pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Candidate>> {
		if self.is_empty() {
			return Ok(vec![Candidate::padding(); k]);
		}
		if query.len() != self.dim {
			return Err(Error::DimensionMismatch { expected: self.dim, actual: query.len() });
		}

		let mut hits: Vec<Candidate> = self
			.vectors
			.chunks_exact(self.dim.max(1))
			.enumerate()
			.map(|(position, row)| Candidate { position: Some(position), score: dot(query, row) })
			.collect();

		hits.sort_by(|a, b| cmp_score_desc(a.score, b.score));
		hits.truncate(k);
		hits.resize(k, Candidate::padding());

		Ok(hits)
	}

	pub fn save(&self, path: &Path) -> Result<()> {
		if let Some(parent) = chunk_store::non_empty_parent(path) {
			fs::create_dir_all(parent).map_err(Error::io(parent))?;
		}

		let tmp = path.with_extension("tmp");
		let file = File::create(&tmp).map_err(Error::io(&tmp))?;
		let mut writer = BufWriter::new(file);
		let mut header = Vec::with_capacity(HEADER_LEN);

		header.extend_from_slice(MAGIC);
		header.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
		header.extend_from_slice(&(self.dim as u32).to_le_bytes());
		header.extend_from_slice(&(self.len() as u64).to_le_bytes());
		header.extend_from_slice(&self.fingerprint);
		writer.write_all(&header).map_err(Error::io(&tmp))?;

		for value in &self.vectors {
			writer.write_all(&value.to_le_bytes()).map_err(Error::io(&tmp))?;
		}

		writer.flush().map_err(Error::io(&tmp))?;
		drop(writer);
		fs::rename(&tmp, path).map_err(Error::io(path))?;

		tracing::info!(
			path = %path.display(),
			vectors = self.len(),
			dim = self.dim,
			"Saved vector index."
		);

		Ok(())
	}

	pub fn load(path: &Path) -> Result<Self> {
		let bytes = fs::read(path).map_err(Error::io(path))?;
		let invalid = |message: &str| Error::InvalidIndex {
			path: path.to_path_buf(),
			message: message.to_string(),
		};

		if bytes.len() < HEADER_LEN || &bytes[..4] != MAGIC {
			return Err(invalid("missing header."));
		}

		let version = read_u32(&bytes[4..8]);

		if version != FORMAT_VERSION {
			return Err(invalid(&format!("unsupported format version {version}.")));
		}

		let dim = read_u32(&bytes[8..12]) as usize;
		let count = read_u64(&bytes[12..20]) as usize;
		let mut fingerprint = [0_u8; 32];

		fingerprint.copy_from_slice(&bytes[20..HEADER_LEN]);

		let body = &bytes[HEADER_LEN..];
		let expected = count
			.checked_mul(dim)
			.and_then(|values| values.checked_mul(4))
			.ok_or_else(|| invalid("vector count overflows."))?;

		if body.len() != expected {
			return Err(invalid(&format!(
				"expected {expected} bytes of vectors, found {}.",
				body.len()
			)));
		}

		let vectors = body.chunks_exact(4).map(|raw| f32::from_le_bytes(to_array(raw))).collect();

		Ok(Self { dim, vectors, fingerprint })
	}
}

pub fn dot(lhs: &[f32], rhs: &[f32]) -> f32 {
	lhs.iter().zip(rhs).map(|(l, r)| l * r).sum()
}

/// Scales to unit length. Zero vectors are returned unchanged.
pub fn normalize(vector: &mut [f32]) {
	let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();

	if norm <= f32::EPSILON {
		return;
	}

	for value in vector.iter_mut() {
		*value /= norm;
	}
}

fn cmp_score_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(false, false) => b.total_cmp(&a),
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
	}
}

fn to_array(raw: &[u8]) -> [u8; 4] {
	let mut out = [0_u8; 4];

	out.copy_from_slice(raw);

	out
}

fn read_u32(raw: &[u8]) -> u32 {
	u32::from_le_bytes(to_array(raw))
}

fn read_u64(raw: &[u8]) -> u64 {
	let mut out = [0_u8; 8];

	out.copy_from_slice(raw);

	u64::from_le_bytes(out)
}
