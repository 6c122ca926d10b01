use std::sync::{
	Arc, Mutex,
	atomic::{AtomicUsize, Ordering},
};

use finq_config::{Config, EmbeddingProviderConfig, GenerationProviderConfig};
use finq_domain::chunk::Chunk;
use finq_service::{
	Answer, BoxFuture, EmbeddingProvider, Error, GenerationProvider, InsufficientReason, Providers,
	Session,
};
use finq_storage::{chunk_store::ChunkStore, macro_series::MacroStore, vector_index::FlatIndex};
use finq_testkit::{ChunkFixture, TEST_DIM, TestWorkspace};

const RISK_TEXT: &str = "Risk factors include supply chain disruption affecting component \
	availability. The Company relies on outsourcing partners located primarily in Asia for \
	manufacturing.";

/// Returns the same query vector every time and counts calls.
struct FixedEmbedding {
	vector: Vec<f32>,
	calls: AtomicUsize,
}
impl FixedEmbedding {
	fn new(vector: &[f32]) -> Arc<Self> {
		Arc::new(Self { vector: vector.to_vec(), calls: AtomicUsize::new(0) })
	}

	fn count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl EmbeddingProvider for FixedEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let vectors = vec![self.vector.clone(); texts.len()];

		Box::pin(async move { Ok(vectors) })
	}
}

/// Embeds with the testkit hashing embedder.
struct HashEmbedding {
	calls: AtomicUsize,
}
impl EmbeddingProvider for HashEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let vectors =
			texts.iter().map(|text| finq_testkit::hash_embedding(text, TEST_DIM)).collect();

		Box::pin(async move { Ok(vectors) })
	}
}

/// Replies with a canned result and remembers the last prompt.
struct SpyGeneration {
	reply: Result<String, String>,
	calls: AtomicUsize,
	last_prompt: Mutex<Option<String>>,
}
impl SpyGeneration {
	fn replying(reply: Result<&str, &str>) -> Arc<Self> {
		Arc::new(Self {
			reply: reply.map(str::to_string).map_err(str::to_string),
			calls: AtomicUsize::new(0),
			last_prompt: Mutex::new(None),
		})
	}

	fn count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	fn prompt(&self) -> String {
		self.last_prompt.lock().expect("prompt lock poisoned").clone().unwrap_or_default()
	}
}
impl GenerationProvider for SpyGeneration {
	fn generate<'a>(
		&'a self,
		_cfg: &'a GenerationProviderConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		*self.last_prompt.lock().expect("prompt lock poisoned") = Some(prompt.to_string());

		let reply = self.reply.clone().map_err(|message| color_eyre::eyre::eyre!(message));

		Box::pin(async move { reply })
	}
}

fn filing(id: &str, issuer: &str, year: i32, page: u32) -> Chunk {
	ChunkFixture::new(id, RISK_TEXT).filing(issuer, year).pages(page, page).build()
}

/// Session over an in-memory store whose vectors are given explicitly, one per chunk.
fn build_session(
	workspace: &TestWorkspace,
	cfg: Config,
	rows: Vec<(Chunk, Vec<f32>)>,
	embedding: Arc<dyn EmbeddingProvider>,
	generation: Arc<dyn GenerationProvider>,
) -> Session {
	let (chunks, vectors): (Vec<Chunk>, Vec<Vec<f32>>) = rows.into_iter().unzip();
	let store = ChunkStore::new(chunks);
	let index = FlatIndex::build(2, vectors, store.fingerprint()).expect("index build failed");
	let macros = Arc::new(MacroStore::new(workspace.config().storage.macro_dir));

	Session::new(cfg, store, Box::new(index), Providers::new(embedding, generation), macros)
		.expect("session failed")
}

fn unit(angle_degrees: f32) -> Vec<f32> {
	let radians = angle_degrees.to_radians();

	vec![radians.cos(), radians.sin()]
}

#[tokio::test]
async fn cpi_yoy_is_answered_without_embedding() {
	let workspace = TestWorkspace::new().expect("workspace failed");
	let mut rows: Vec<(String, String)> =
		(1..=12).map(|month| (format!("2023-{month:02}-01"), "300.0".to_string())).collect();

	rows.push(("2024-01-01".to_string(), "309.0".to_string()));

	let borrowed: Vec<(&str, &str)> =
		rows.iter().map(|(date, value)| (date.as_str(), value.as_str())).collect();

	workspace.write_macro_series("cpi", &borrowed).expect("csv write failed");

	let embedding = FixedEmbedding::new(&unit(0.0));
	let generation = SpyGeneration::replying(Ok("unused"));
	let session = build_session(
		&workspace,
		workspace.config(),
		vec![(filing("a", "AAPL", 2023, 1), unit(0.0))],
		embedding.clone(),
		generation.clone(),
	);
	let response = session.ask("cpi yoy").await.expect("ask failed");

	let text = match response.answer {
		Answer::Macro { text } => text,
		other => panic!("Expected a macro answer, got {other:?}."),
	};

	assert!(text.contains("CPI YoY"));
	assert!(text.contains("3.00%"));
	assert!(text.contains("2024-01-01"));
	assert_eq!(embedding.count(), 0);
	assert_eq!(generation.count(), 0);
}

#[tokio::test]
async fn missing_unemployment_series_apologizes() {
	let workspace = TestWorkspace::new().expect("workspace failed");
	let session = build_session(
		&workspace,
		workspace.config(),
		vec![(filing("a", "AAPL", 2023, 1), unit(0.0))],
		FixedEmbedding::new(&unit(0.0)),
		SpyGeneration::replying(Ok("unused")),
	);
	let response = session.ask("unemployment rate").await.expect("ask failed");

	assert!(matches!(response.answer, Answer::Macro { text } if text.starts_with("Sorry")));
}

#[tokio::test]
async fn low_top_score_is_insufficient_context() {
	let workspace = TestWorkspace::new().expect("workspace failed");
	let generation = SpyGeneration::replying(Ok("should not be used"));
	let session = build_session(
		&workspace,
		workspace.config(),
		vec![
			(filing("a", "AAPL", 2023, 1), unit(0.0)),
			(filing("b", "AAPL", 2023, 2), unit(10.0)),
		],
		FixedEmbedding::new(&unit(85.0)),
		generation.clone(),
	);
	let response = session.ask("supply chain disruption").await.expect("ask failed");
	let top_score = match response.answer {
		Answer::InsufficientContext { reason: InsufficientReason::LowConfidence { top_score } } =>
			top_score,
		other => panic!("Expected low confidence, got {other:?}."),
	};

	// Best hit sits 75 degrees away from the query.
	assert!(top_score.is_some_and(|score| (score - 75_f32.to_radians().cos()).abs() < 1e-4));

	let mut strict = workspace.config();

	strict.search.min_top_score = 0.95;

	let strict_session = build_session(
		&workspace,
		strict,
		vec![(filing("a", "AAPL", 2023, 1), unit(0.0))],
		FixedEmbedding::new(&unit(60.0)),
		generation.clone(),
	);
	let strict_response =
		strict_session.ask("supply chain disruption").await.expect("ask failed");

	assert!(strict_response.answer.is_insufficient());
	assert_eq!(generation.count(), 0);
}

#[tokio::test]
async fn empty_index_is_insufficient_context() {
	let workspace = TestWorkspace::new().expect("workspace failed");
	let session = build_session(
		&workspace,
		workspace.config(),
		Vec::new(),
		FixedEmbedding::new(&unit(0.0)),
		SpyGeneration::replying(Ok("unused")),
	);
	let response = session.ask("supply chain disruption").await.expect("ask failed");

	assert_eq!(
		response.answer,
		Answer::InsufficientContext {
			reason: InsufficientReason::LowConfidence { top_score: None }
		}
	);
}

#[tokio::test]
async fn requested_year_comes_first_for_the_requested_issuer() {
	let workspace = TestWorkspace::new().expect("workspace failed");
	let generation = SpyGeneration::replying(Ok("- Supply chain disruption [1]"));
	let session = build_session(
		&workspace,
		workspace.config(),
		vec![
			(filing("aapl-2022", "AAPL", 2022, 4), unit(0.0)),
			(filing("msft-2023", "MSFT", 2023, 9), unit(5.0)),
			(filing("aapl-2023-a", "AAPL", 2023, 7), unit(10.0)),
			(filing("aapl-2023-b", "AAPL", 2023, 8), unit(15.0)),
		],
		FixedEmbedding::new(&unit(0.0)),
		generation.clone(),
	);
	let response =
		session.ask("What are Apple's risk factors in 2023?").await.expect("ask failed");

	let (text, sources, confidence) = match response.answer {
		Answer::Generated { text, sources, confidence } => (text, sources, confidence),
		other => panic!("Expected a generated answer, got {other:?}."),
	};
	let spans: Vec<(&str, u32)> =
		sources.iter().map(|source| (source.doc.as_str(), source.page_start)).collect();

	assert_eq!(text, "- Supply chain disruption [1]");
	assert_eq!(
		spans,
		vec![
			("AAPL_10-K_2023.html", 7),
			("AAPL_10-K_2023.html", 8),
			("AAPL_10-K_2022.html", 4)
		]
	);
	assert!((confidence - 1.0).abs() < 1e-5);
	assert!(generation.prompt().contains("[1] (Doc: AAPL_10-K_2023.html, pages 7-7)"));
	assert!(!generation.prompt().contains("MSFT"));
}

#[tokio::test]
async fn unmatched_issuer_filter_keeps_retrieved_chunks() {
	let workspace = TestWorkspace::new().expect("workspace failed");
	let session = build_session(
		&workspace,
		workspace.config(),
		vec![
			(filing("msft-1", "MSFT", 2024, 1), unit(0.0)),
			(filing("msft-2", "MSFT", 2024, 2), unit(10.0)),
		],
		FixedEmbedding::new(&unit(0.0)),
		SpyGeneration::replying(Ok("Microsoft faces supply risk [1]")),
	);
	let response = session.ask("What are Apple's risk factors?").await.expect("ask failed");

	let sources = match response.answer {
		Answer::Generated { sources, .. } => sources,
		other => panic!("Expected a generated answer, got {other:?}."),
	};

	assert_eq!(sources.len(), 2);
	assert!(sources.iter().all(|source| source.doc.starts_with("MSFT")));
}

#[tokio::test]
async fn two_issuers_share_the_context_evenly() {
	let workspace = TestWorkspace::new().expect("workspace failed");
	let mut cfg = workspace.config();

	cfg.search.top_k = 4;

	let generation = SpyGeneration::replying(Ok("Both companies cite supply risk [1] [2]"));
	let session = build_session(
		&workspace,
		cfg,
		vec![
			(filing("msft-1", "MSFT", 2024, 1), unit(0.0)),
			(filing("msft-2", "MSFT", 2024, 2), unit(2.0)),
			(filing("msft-3", "MSFT", 2024, 3), unit(4.0)),
			(filing("msft-4", "MSFT", 2024, 4), unit(6.0)),
			(filing("aapl-1", "AAPL", 2023, 1), unit(20.0)),
			(filing("aapl-2", "AAPL", 2023, 2), unit(22.0)),
			(filing("aapl-3", "AAPL", 2023, 3), unit(24.0)),
		],
		FixedEmbedding::new(&unit(0.0)),
		generation.clone(),
	);
	let response =
		session.ask("Compare Apple and Microsoft risk factors").await.expect("ask failed");

	let sources = match response.answer {
		Answer::Generated { sources, .. } => sources,
		other => panic!("Expected a generated answer, got {other:?}."),
	};
	let apple = sources.iter().filter(|source| source.doc.starts_with("AAPL")).count();
	let microsoft = sources.iter().filter(|source| source.doc.starts_with("MSFT")).count();

	assert_eq!(sources.len(), 4);
	assert!(apple >= 2);
	assert!(microsoft >= 2);
	assert!(sources[0].doc.starts_with("AAPL"));
}

#[tokio::test]
async fn failed_generation_falls_back_to_extractive() {
	let workspace = TestWorkspace::new().expect("workspace failed");
	let generation = SpyGeneration::replying(Err("connection refused"));
	let session = build_session(
		&workspace,
		workspace.config(),
		vec![
			(filing("a", "AAPL", 2023, 3), unit(0.0)),
			(filing("b", "AAPL", 2023, 4), unit(10.0)),
		],
		FixedEmbedding::new(&unit(0.0)),
		generation.clone(),
	);
	let response = session.ask("supply chain disruption").await.expect("ask failed");

	let (text, citations) = match response.answer {
		Answer::Extractive { text, citations, .. } => (text, citations),
		other => panic!("Expected an extractive answer, got {other:?}."),
	};

	assert_eq!(generation.count(), 1);
	assert!(text.starts_with("Risk factors include supply chain disruption"));
	assert_eq!(citations.len(), 2);
	assert_eq!(citations[0].page_start, 3);
}

#[tokio::test]
async fn empty_generation_and_disabled_generation_fall_back_too() {
	let workspace = TestWorkspace::new().expect("workspace failed");
	let silent = SpyGeneration::replying(Ok("   "));
	let session_silent = build_session(
		&workspace,
		workspace.config(),
		vec![(filing("a", "AAPL", 2023, 3), unit(0.0))],
		FixedEmbedding::new(&unit(0.0)),
		silent.clone(),
	);

	assert!(matches!(
		session_silent.ask("supply chain disruption").await.expect("ask failed").answer,
		Answer::Extractive { .. }
	));

	let mut cfg = workspace.config();

	cfg.providers.generation.enabled = false;

	let disabled = SpyGeneration::replying(Ok("never used"));
	let session_disabled = build_session(
		&workspace,
		cfg,
		vec![(filing("a", "AAPL", 2023, 3), unit(0.0))],
		FixedEmbedding::new(&unit(0.0)),
		disabled.clone(),
	);

	assert!(matches!(
		session_disabled.ask("supply chain disruption").await.expect("ask failed").answer,
		Answer::Extractive { .. }
	));
	assert_eq!(disabled.count(), 0);
}

#[tokio::test]
async fn table_of_contents_chunks_are_not_quoted() {
	let workspace = TestWorkspace::new().expect("workspace failed");
	let toc = ChunkFixture::new(
		"toc",
		"Table of Contents. Item 1A Risk Factors page 12. Item 7 Management discussion page 30.",
	)
	.filing("AAPL", 2023)
	.pages(2, 2)
	.build();
	let session = build_session(
		&workspace,
		workspace.config(),
		vec![(toc, unit(0.0)), (filing("body", "AAPL", 2023, 12), unit(10.0))],
		FixedEmbedding::new(&unit(0.0)),
		SpyGeneration::replying(Err("timeout")),
	);
	let response = session.ask("supply chain disruption").await.expect("ask failed");

	let citations = match response.answer {
		Answer::Extractive { citations, .. } => citations,
		other => panic!("Expected an extractive answer, got {other:?}."),
	};

	assert_eq!(citations.len(), 1);
	assert_eq!(citations[0].page_start, 12);
}

#[tokio::test]
async fn misspelled_query_is_corrected_before_retrieval() {
	let workspace = TestWorkspace::new().expect("workspace failed");
	let corpus = [
		filing("a", "AAPL", 2023, 1),
		ChunkFixture::new("b", "Liquidity and capital resources remain sufficient for operations.")
			.filing("AAPL", 2023)
			.pages(2, 2)
			.build(),
	];

	workspace.write_corpus(&corpus).expect("corpus write failed");

	let embedding = Arc::new(HashEmbedding { calls: AtomicUsize::new(0) });
	let providers = Providers::new(embedding.clone(), SpyGeneration::replying(Ok("Answer [1]")));
	let session =
		Session::open_with_providers(workspace.config(), providers).expect("session failed");
	let response = session.ask("what are the main rish factors").await.expect("ask failed");

	assert!(response.normalized.changed);
	assert_eq!(response.normalized.text, "what are the main risk factors");
	assert_eq!(response.normalized.correction_for("rish"), Some("risk"));
	assert_eq!(embedding.calls.load(Ordering::SeqCst), 1);
	assert_eq!(session.store().len(), 2);
}

#[test]
fn session_requires_store_and_index() {
	let workspace = TestWorkspace::new().expect("workspace failed");

	assert!(matches!(Session::open(workspace.config()), Err(Error::MissingData { .. })));
}

#[test]
fn stale_index_is_rejected() {
	let workspace = TestWorkspace::new().expect("workspace failed");
	let cfg = workspace.config();
	let late = filing("b", "AAPL", 2023, 2);

	workspace.write_corpus(&[filing("a", "AAPL", 2023, 1)]).expect("corpus write failed");
	finq_storage::chunk_store::append_dedup(&cfg.storage.chunks_path, &[late])
		.expect("append failed");

	assert!(matches!(Session::open(cfg), Err(Error::Misaligned { .. })));
}
