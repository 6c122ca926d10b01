use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Missing data file at {}. Ingest filings and build the index first.", path.display())]
	MissingData { path: PathBuf },
	#[error("Vector index does not match the chunk store: {message}")]
	Misaligned { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error(transparent)]
	Storage(#[from] finq_storage::Error),
}
impl From<color_eyre::Report> for Error {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
