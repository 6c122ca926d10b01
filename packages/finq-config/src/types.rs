use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub correction: Correction,
	#[serde(default)]
	pub answer: Answer,
	#[serde(default)]
	pub chunking: Chunking,
	#[serde(default = "default_issuers")]
	pub issuers: Vec<Issuer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub chunks_path: PathBuf,
	pub index_path: PathBuf,
	pub macro_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub generation: GenerationProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub api_base: String,
	pub api_key: Option<String>,
	#[serde(default = "default_embedding_path")]
	pub path: String,
	pub model: String,
	/// Forwarded to the endpoint when set. Ollama ignores it, OpenAI-compatible servers honor it.
	pub dimensions: Option<u32>,
	#[serde(default = "default_embedding_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationProviderConfig {
	#[serde(default = "default_true")]
	pub enabled: bool,
	pub api_base: String,
	pub api_key: Option<String>,
	#[serde(default = "default_generation_path")]
	pub path: String,
	pub model: String,
	#[serde(default = "default_temperature")]
	pub temperature: f32,
	#[serde(default = "default_generation_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Search {
	pub top_k: u32,
	/// Wide pool size is `top_k * candidate_multiplier`.
	pub candidate_multiplier: u32,
	/// Confidence floor for the top-1 similarity.
	pub min_top_score: f32,
}
impl Default for Search {
	fn default() -> Self {
		Self { top_k: 5, candidate_multiplier: 8, min_top_score: 0.30 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Correction {
	pub max_corrections: u32,
	pub fuzzy_cutoff: f64,
	pub vocabulary_max_words: u32,
	pub min_token_chars: u32,
}
impl Default for Correction {
	fn default() -> Self {
		Self {
			max_corrections: 2,
			fuzzy_cutoff: 0.75,
			vocabulary_max_words: 5_000,
			min_token_chars: 4,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Answer {
	pub max_context_chars: u32,
	pub stitched_max_chars: u32,
	pub max_cited_chunks: u32,
	pub preview_chars: u32,
	pub first_chunk_sentences: u32,
	pub next_chunk_sentences: u32,
}
impl Default for Answer {
	fn default() -> Self {
		Self {
			max_context_chars: 1_200,
			stitched_max_chars: 600,
			max_cited_chunks: 3,
			preview_chars: 240,
			first_chunk_sentences: 2,
			next_chunk_sentences: 1,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Chunking {
	pub max_chars: u32,
	pub overlap_chars: u32,
	/// A window is cut at the last sentence end only past this fraction of `max_chars`.
	pub break_ratio: f32,
	pub target_words: u32,
	pub overlap_words: u32,
}
impl Default for Chunking {
	fn default() -> Self {
		Self {
			max_chars: 1_200,
			overlap_chars: 150,
			break_ratio: 0.6,
			target_words: 900,
			overlap_words: 120,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Issuer {
	pub symbol: String,
	pub aliases: Vec<String>,
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_embedding_path() -> String {
	"/v1/embeddings".to_string()
}

fn default_generation_path() -> String {
	"/api/generate".to_string()
}

fn default_embedding_timeout_ms() -> u64 {
	30_000
}

fn default_generation_timeout_ms() -> u64 {
	60_000
}

fn default_temperature() -> f32 {
	0.2
}

fn default_true() -> bool {
	true
}

fn default_issuers() -> Vec<Issuer> {
	vec![
		Issuer {
			symbol: "AAPL".to_string(),
			aliases: ["aapl", "apple", "apple inc", "apple’s", "apple's"]
				.into_iter()
				.map(String::from)
				.collect(),
		},
		Issuer {
			symbol: "MSFT".to_string(),
			aliases: ["msft", "microsoft", "microsoft corp", "microsoft corporation"]
				.into_iter()
				.map(String::from)
				.collect(),
		},
	]
}
