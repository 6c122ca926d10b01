pub mod ranking;

use finq_storage::vector_index::{self, Candidate};

use crate::{Error, Providers, Result, VectorSearch};

/// Candidates drawn before filtering, so issuer and year preferences have room to act.
pub fn pool_size(cfg: &finq_config::Search) -> usize {
	(cfg.top_k as usize).saturating_mul(cfg.candidate_multiplier as usize).max(1)
}

/// Score of the best hit, or `None` when the index had nothing real to return.
pub fn top_score(candidates: &[Candidate]) -> Option<f32> {
	candidates.first().filter(|hit| hit.position.is_some()).map(|hit| hit.score)
}

/// The floor is a hard gate: a top score equal to it passes, anything below does not.
pub fn passes_floor(top_score: Option<f32>, floor: f32) -> bool {
	top_score.is_some_and(|score| score >= floor)
}

/// Embeds the query as a unit vector.
pub async fn embed_query(
	providers: &Providers,
	cfg: &finq_config::EmbeddingProviderConfig,
	query: &str,
) -> Result<Vec<f32>> {
	let texts = [query.to_string()];
	let mut vectors = providers.embedding.embed(cfg, &texts).await?;
	let Some(mut vector) = vectors.pop().filter(|_| vectors.is_empty()) else {
		return Err(Error::Provider {
			message: "Embedding provider must return exactly one vector for the query."
				.to_string(),
		});
	};

	vector_index::normalize(&mut vector);

	Ok(vector)
}

/// Nearest neighbors of `vector`, best first, padded to `k`.
pub fn nearest(index: &dyn VectorSearch, vector: &[f32], k: usize) -> Result<Vec<Candidate>> {
	Ok(index.search(vector, k)?)
}
