pub mod answer;
pub mod compose;
pub mod macro_answer;
pub mod search;

mod ask;
mod error;

pub use answer::{Answer, Citation, GenerationOutcome, InsufficientReason, Source};
pub use ask::AskResponse;
pub use error::{Error, Result};

use std::{future::Future, pin::Pin, sync::Arc};

use finq_config::{Config, EmbeddingProviderConfig, GenerationProviderConfig};
use finq_domain::{
	intent::MacroSeries,
	normalize::{CorrectionPolicy, QueryNormalizer},
	vocabulary::Vocabulary,
};
use finq_providers::{embedding, generation};
use finq_storage::{
	chunk_store::ChunkStore,
	macro_series::{MacroStore, Observation},
	vector_index::{Alignment, Candidate, FlatIndex},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

pub trait GenerationProvider
where
	Self: Send + Sync,
{
	fn generate<'a>(
		&'a self,
		cfg: &'a GenerationProviderConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

/// Latest observations of the local macro series.
pub trait MacroSource
where
	Self: Send + Sync,
{
	fn latest_value(&self, series: MacroSeries) -> finq_storage::Result<Option<Observation>>;

	fn latest_yoy(&self, series: MacroSeries) -> finq_storage::Result<Option<Observation>>;
}

/// Nearest-neighbor lookup over vectors whose positions match the chunk store.
pub trait VectorSearch
where
	Self: Send + Sync,
{
	fn len(&self) -> usize;

	/// Exactly `k` candidates, best first, padded with position-less entries.
	fn search(&self, query: &[f32], k: usize) -> finq_storage::Result<Vec<Candidate>>;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub generation: Arc<dyn GenerationProvider>,
}

struct DefaultProviders;

/// Everything one question needs, loaded once and shared read-only across questions.
pub struct Session {
	pub cfg: Config,
	store: ChunkStore,
	index: Box<dyn VectorSearch>,
	normalizer: QueryNormalizer,
	providers: Providers,
	macros: Arc<dyn MacroSource>,
}

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl GenerationProvider for DefaultProviders {
	fn generate<'a>(
		&'a self,
		cfg: &'a GenerationProviderConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(generation::generate(cfg, prompt))
	}
}

impl MacroSource for MacroStore {
	fn latest_value(&self, series: MacroSeries) -> finq_storage::Result<Option<Observation>> {
		MacroStore::latest_value(self, series.file_stem())
	}

	fn latest_yoy(&self, series: MacroSeries) -> finq_storage::Result<Option<Observation>> {
		MacroStore::latest_yoy(self, series.file_stem())
	}
}

impl VectorSearch for FlatIndex {
	fn len(&self) -> usize {
		FlatIndex::len(self)
	}

	fn search(&self, query: &[f32], k: usize) -> finq_storage::Result<Vec<Candidate>> {
		FlatIndex::search(self, query, k)
	}
}

impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		generation: Arc<dyn GenerationProvider>,
	) -> Self {
		Self { embedding, generation }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), generation: provider }
	}
}

impl Session {
	/// Loads the chunk store and index named by `cfg` with the HTTP providers.
	pub fn open(cfg: Config) -> Result<Self> {
		Self::open_with_providers(cfg, Providers::default())
	}

	pub fn open_with_providers(cfg: Config, providers: Providers) -> Result<Self> {
		for path in [&cfg.storage.chunks_path, &cfg.storage.index_path] {
			if !path.exists() {
				return Err(Error::MissingData { path: path.clone() });
			}
		}

		let store = ChunkStore::load(&cfg.storage.chunks_path)?;
		let index = FlatIndex::load(&cfg.storage.index_path)?;

		match index.check_alignment(store.chunks().iter().map(|chunk| chunk.id.as_str())) {
			Alignment::Aligned => {},
			Alignment::CountMismatch { index, store } => {
				return Err(Error::Misaligned {
					message: format!(
						"index holds {index} vectors but the store holds {store} chunks. Rebuild \
						 the index."
					),
				});
			},
			Alignment::FingerprintMismatch => {
				return Err(Error::Misaligned {
					message: "chunk ids changed since the index was built. Rebuild the index."
						.to_string(),
				});
			},
		}

		if let Some(dimensions) = cfg.providers.embedding.dimensions
			&& dimensions as usize != index.dim()
		{
			tracing::warn!(
				configured = dimensions,
				index = index.dim(),
				"Configured embedding dimensions differ from the index."
			);
		}

		let macros = Arc::new(MacroStore::new(cfg.storage.macro_dir.clone()));

		Self::new(cfg, store, Box::new(index), providers, macros)
	}

	/// Assembles a session from parts. `index` must hold one vector per stored chunk, in store
	/// order.
	pub fn new(
		cfg: Config,
		store: ChunkStore,
		index: Box<dyn VectorSearch>,
		providers: Providers,
		macros: Arc<dyn MacroSource>,
	) -> Result<Self> {
		if index.len() != store.len() {
			return Err(Error::Misaligned {
				message: format!(
					"index holds {} vectors but the store holds {} chunks.",
					index.len(),
					store.len()
				),
			});
		}

		let vocabulary = Vocabulary::build(
			store.chunks().iter().map(|chunk| chunk.text.as_str()),
			cfg.correction.vocabulary_max_words as usize,
		);
		let normalizer = QueryNormalizer::new(vocabulary, CorrectionPolicy::from(&cfg.correction));

		tracing::info!(
			chunks = store.len(),
			vocabulary = normalizer.vocabulary().len(),
			"Session ready."
		);

		Ok(Self { cfg, store, index, normalizer, providers, macros })
	}

	pub fn store(&self) -> &ChunkStore {
		&self.store
	}

	pub fn normalizer(&self) -> &QueryNormalizer {
		&self.normalizer
	}
}
