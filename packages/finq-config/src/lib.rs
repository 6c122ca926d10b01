mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Answer, Chunking, Config, Correction, EmbeddingProviderConfig, GenerationProviderConfig,
	Issuer, Providers, Search, Service, Storage,
};

use std::{collections::HashSet, fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	parse(&raw).map_err(|err| match err {
		Error::ParseConfig { source, .. } => Error::ParseConfig { path: path.to_path_buf(), source },
		other => other,
	})
}

pub fn parse(raw: &str) -> Result<Config> {
	let mut cfg: Config = toml::from_str(raw)
		.map_err(|err| Error::ParseConfig { path: Default::default(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	for (label, path) in [
		("storage.chunks_path", &cfg.storage.chunks_path),
		("storage.index_path", &cfg.storage.index_path),
		("storage.macro_dir", &cfg.storage.macro_dir),
	] {
		if path.as_os_str().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}
	for (label, api_base, model) in [
		("embedding", &cfg.providers.embedding.api_base, &cfg.providers.embedding.model),
		("generation", &cfg.providers.generation.api_base, &cfg.providers.generation.model),
	] {
		if api_base.is_empty() {
			return Err(Error::Validation {
				message: format!("providers.{label}.api_base must be non-empty."),
			});
		}
		if model.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("providers.{label}.model must be non-empty."),
			});
		}
	}

	if let Some(dimensions) = cfg.providers.embedding.dimensions
		&& dimensions == 0
	{
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}

	if cfg.providers.embedding.timeout_ms == 0 || cfg.providers.generation.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "Provider timeout_ms must be greater than zero.".to_string(),
		});
	}
	if !cfg.providers.generation.temperature.is_finite()
		|| cfg.providers.generation.temperature < 0.0
	{
		return Err(Error::Validation {
			message: "providers.generation.temperature must be a finite number, zero or greater."
				.to_string(),
		});
	}
	if cfg.search.top_k == 0 {
		return Err(Error::Validation {
			message: "search.top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.search.candidate_multiplier == 0 {
		return Err(Error::Validation {
			message: "search.candidate_multiplier must be greater than zero.".to_string(),
		});
	}
	if !cfg.search.min_top_score.is_finite() || !(-1.0..=1.0).contains(&cfg.search.min_top_score)
	{
		return Err(Error::Validation {
			message: "search.min_top_score must be in the range -1.0-1.0.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.correction.fuzzy_cutoff) {
		return Err(Error::Validation {
			message: "correction.fuzzy_cutoff must be in the range 0.0-1.0.".to_string(),
		});
	}
	if cfg.correction.vocabulary_max_words == 0 {
		return Err(Error::Validation {
			message: "correction.vocabulary_max_words must be greater than zero.".to_string(),
		});
	}
	if cfg.correction.min_token_chars == 0 {
		return Err(Error::Validation {
			message: "correction.min_token_chars must be greater than zero.".to_string(),
		});
	}

	for (label, value) in [
		("answer.max_context_chars", cfg.answer.max_context_chars),
		("answer.stitched_max_chars", cfg.answer.stitched_max_chars),
		("answer.max_cited_chunks", cfg.answer.max_cited_chunks),
		("answer.first_chunk_sentences", cfg.answer.first_chunk_sentences),
		("answer.next_chunk_sentences", cfg.answer.next_chunk_sentences),
		("chunking.max_chars", cfg.chunking.max_chars),
		("chunking.target_words", cfg.chunking.target_words),
	] {
		if value == 0 {
			return Err(Error::Validation { message: format!("{label} must be greater than zero.") });
		}
	}

	if cfg.chunking.overlap_chars >= cfg.chunking.max_chars {
		return Err(Error::Validation {
			message: "chunking.overlap_chars must be less than chunking.max_chars.".to_string(),
		});
	}
	if cfg.chunking.overlap_words >= cfg.chunking.target_words {
		return Err(Error::Validation {
			message: "chunking.overlap_words must be less than chunking.target_words.".to_string(),
		});
	}
	if !(0.0..1.0).contains(&cfg.chunking.break_ratio) {
		return Err(Error::Validation {
			message: "chunking.break_ratio must be in the range 0.0-1.0 (exclusive).".to_string(),
		});
	}

	let mut symbols = HashSet::new();

	for issuer in &cfg.issuers {
		if issuer.symbol.is_empty() {
			return Err(Error::Validation {
				message: "issuers.symbol must be non-empty.".to_string(),
			});
		}
		if issuer.aliases.iter().all(|alias| alias.is_empty()) {
			return Err(Error::Validation {
				message: format!("Issuer {} must declare at least one alias.", issuer.symbol),
			});
		}
		if !symbols.insert(issuer.symbol.as_str()) {
			return Err(Error::DuplicateIssuer { symbol: issuer.symbol.clone() });
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for api_key in [&mut cfg.providers.embedding.api_key, &mut cfg.providers.generation.api_key] {
		if api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
			*api_key = None;
		}
	}
	for api_base in [&mut cfg.providers.embedding.api_base, &mut cfg.providers.generation.api_base]
	{
		*api_base = api_base.trim().trim_end_matches('/').to_string();
	}
	for issuer in &mut cfg.issuers {
		issuer.symbol = issuer.symbol.trim().to_uppercase();
		issuer.aliases = issuer
			.aliases
			.iter()
			.map(|alias| alias.trim().to_lowercase())
			.filter(|alias| !alias.is_empty())
			.collect();
	}
}
