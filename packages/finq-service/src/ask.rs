use finq_domain::{
	chunk::Chunk,
	intent::{MacroIntent, QueryHints},
	normalize::NormalizedQuery,
};

use crate::{
	Answer, GenerationOutcome, InsufficientReason, Result, Session,
	compose::{
		self,
		extractive::{self, ExtractiveLimits},
		prompt,
	},
	macro_answer, search,
};

#[derive(Clone, Debug)]
pub struct AskResponse {
	/// The query as it was actually answered.
	pub normalized: NormalizedQuery,
	pub answer: Answer,
}

impl Session {
	/// Answers one question.
	///
	/// Macro questions are answered from the local series without touching the index. Everything
	/// else is embedded, gated on the confidence floor, re-ranked, and then answered by the
	/// generator with the extractive answer as fallback.
	pub async fn ask(&self, raw: &str) -> Result<AskResponse> {
		let normalized = self.normalizer.normalize(raw);

		if normalized.changed {
			tracing::debug!(
				from = raw.trim(),
				to = normalized.text.as_str(),
				corrections = normalized.corrections.len(),
				"Query corrected."
			);
		}

		let answer = self.answer(&normalized.text).await?;

		Ok(AskResponse { normalized, answer })
	}

	async fn answer(&self, query: &str) -> Result<Answer> {
		let intent = MacroIntent::classify(query);

		if let Some(text) = macro_answer::answer(intent, self.macros.as_ref()) {
			return Ok(Answer::Macro { text });
		}

		let hints = QueryHints::from_query(query, &self.cfg.issuers);
		let vector =
			search::embed_query(&self.providers, &self.cfg.providers.embedding, query).await?;
		let candidates =
			search::nearest(self.index.as_ref(), &vector, search::pool_size(&self.cfg.search))?;
		let top_score = search::top_score(&candidates);

		if !search::passes_floor(top_score, self.cfg.search.min_top_score) {
			tracing::info!(
				top_score = top_score.unwrap_or(f32::NEG_INFINITY),
				floor = self.cfg.search.min_top_score,
				"Top candidate is under the confidence floor."
			);

			return Ok(Answer::InsufficientContext {
				reason: InsufficientReason::LowConfidence { top_score },
			});
		}

		let confidence = top_score.unwrap_or_default();
		let selected = search::ranking::rerank(
			&candidates,
			&self.store,
			&hints,
			self.cfg.search.top_k as usize,
		);
		let chunks: Vec<&Chunk> =
			selected.iter().filter_map(|position| self.store.get(*position)).collect();

		tracing::debug!(
			pool = candidates.len(),
			selected = chunks.len(),
			issuers = hints.issuers.len(),
			year = hints.year,
			"Re-ranked candidates."
		);

		if !chunks.is_empty()
			&& self.cfg.providers.generation.enabled
			&& let GenerationOutcome::Text(text) = self.generate(query, &chunks).await
		{
			return Ok(Answer::Generated { text, sources: compose::sources(&chunks), confidence });
		}

		let limits = ExtractiveLimits::from(&self.cfg.answer);

		Ok(match extractive::stitch(query, &chunks, &limits) {
			Some(stitched) =>
				Answer::Extractive { text: stitched.text, citations: stitched.citations, confidence },
			None => Answer::InsufficientContext { reason: InsufficientReason::NoSentences },
		})
	}

	async fn generate(&self, query: &str, chunks: &[&Chunk]) -> GenerationOutcome {
		let cfg = &self.cfg.providers.generation;
		let prompt =
			prompt::build_prompt(query, chunks, self.cfg.answer.max_context_chars as usize);
		let outcome =
			GenerationOutcome::from_result(self.providers.generation.generate(cfg, &prompt).await);

		match &outcome {
			GenerationOutcome::Text(_) => {},
			GenerationOutcome::Empty => {
				tracing::info!("Generator returned no text. Falling back to extractive answer.");
			},
			GenerationOutcome::Unavailable { reason } => {
				tracing::warn!(
					error = %reason,
					"Generation provider failed. Falling back to extractive answer."
				);
			},
		}

		outcome
	}
}
