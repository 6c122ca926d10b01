use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to access {path:?}.")]
	Io { path: PathBuf, source: std::io::Error },
	#[error("Malformed chunk record at {path:?} line {line}.")]
	MalformedRecord { path: PathBuf, line: usize, source: serde_json::Error },
	#[error(transparent)]
	Encode(#[from] serde_json::Error),
	#[error("Invalid vector index at {path:?}: {message}")]
	InvalidIndex { path: PathBuf, message: String },
	#[error("Vector dimension mismatch: expected {expected}, got {actual}.")]
	DimensionMismatch { expected: usize, actual: usize },
	#[error("Failed to read series at {path:?}.")]
	Csv { path: PathBuf, source: csv::Error },
}
impl Error {
	pub(crate) fn io(path: &std::path::Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
		move |source| Self::Io { path: path.to_path_buf(), source }
	}
}
