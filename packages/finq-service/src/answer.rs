use std::fmt::{self, Display, Formatter};

pub const INSUFFICIENT_CONTEXT_MESSAGE: &str =
	"Insufficient context in the indexed filings. Try rephrasing or add more docs.";
pub const NO_SENTENCES_MESSAGE: &str = "Insufficient context.";

/// A filing span handed to the generator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Source {
	pub doc: String,
	pub page_start: u32,
	pub page_end: u32,
}

/// A quoted sentence backing an extractive answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Citation {
	pub doc: String,
	pub page_start: u32,
	pub page_end: u32,
	pub preview: String,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InsufficientReason {
	/// Top similarity under the floor. `None` when the index returned no usable hit.
	LowConfidence { top_score: Option<f32> },
	/// Retrieval succeeded but no chunk yielded a quotable sentence.
	NoSentences,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Answer {
	Macro { text: String },
	Generated { text: String, sources: Vec<Source>, confidence: f32 },
	Extractive { text: String, citations: Vec<Citation>, confidence: f32 },
	InsufficientContext { reason: InsufficientReason },
}
impl Answer {
	pub fn is_insufficient(&self) -> bool {
		matches!(self, Self::InsufficientContext { .. })
	}
}
impl Display for Answer {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Macro { text } => write!(f, "{text}"),
			Self::Generated { text, sources, confidence } => {
				write!(f, "{text}\n\nSources:")?;

				for source in sources {
					write!(f, "\n[•] {} p.{}–{}", source.doc, source.page_start, source.page_end)?;
				}

				write!(f, "\n\n[confidence ~ {confidence:.3}]")
			},
			Self::Extractive { text, citations, confidence } => {
				write!(f, "{text}\n\nCitations:")?;

				for citation in citations {
					write!(
						f,
						"\n- p.{}–{}: “{}…”",
						citation.page_start, citation.page_end, citation.preview
					)?;
				}

				write!(f, "\n\n[confidence ~ {confidence:.3}]")
			},
			Self::InsufficientContext { reason: InsufficientReason::LowConfidence { .. } } =>
				write!(f, "{INSUFFICIENT_CONTEXT_MESSAGE}"),
			Self::InsufficientContext { reason: InsufficientReason::NoSentences } =>
				write!(f, "{NO_SENTENCES_MESSAGE}"),
		}
	}
}

/// What came back from the generator. Both `Empty` and `Unavailable` lead to the extractive
/// answer; they are kept apart so logs can tell a silent model from a dead one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenerationOutcome {
	Text(String),
	Empty,
	Unavailable { reason: String },
}
impl GenerationOutcome {
	pub fn from_result(result: color_eyre::Result<String>) -> Self {
		match result {
			Ok(text) if text.trim().is_empty() => Self::Empty,
			Ok(text) => Self::Text(text.trim().to_string()),
			Err(err) => Self::Unavailable { reason: err.to_string() },
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn generated_answer_lists_sources_and_confidence() {
		let answer = Answer::Generated {
			text: "- Supply constraints [1]".to_string(),
			sources: vec![Source {
				doc: "AAPL_10-K_2023.html".to_string(),
				page_start: 3,
				page_end: 4,
			}],
			confidence: 0.61234,
		};

		assert_eq!(
			answer.to_string(),
			concat!(
				"- Supply constraints [1]\n\nSources:\n",
				"[•] AAPL_10-K_2023.html p.3–4\n\n[confidence ~ 0.612]"
			)
		);
	}

	#[test]
	fn extractive_answer_quotes_previews() {
		let answer = Answer::Extractive {
			text: "Demand fell.".to_string(),
			citations: vec![Citation {
				doc: "MSFT_10-K_2024.html".to_string(),
				page_start: 1,
				page_end: 1,
				preview: "Demand fell.".to_string(),
			}],
			confidence: 0.5,
		};

		assert_eq!(
			answer.to_string(),
			"Demand fell.\n\nCitations:\n- p.1–1: “Demand fell.…”\n\n[confidence ~ 0.500]"
		);
	}

	#[test]
	fn insufficient_context_messages_differ_by_reason() {
		let low = Answer::InsufficientContext {
			reason: InsufficientReason::LowConfidence { top_score: Some(0.1) },
		};
		let empty = Answer::InsufficientContext { reason: InsufficientReason::NoSentences };

		assert_eq!(low.to_string(), INSUFFICIENT_CONTEXT_MESSAGE);
		assert_eq!(empty.to_string(), NO_SENTENCES_MESSAGE);
		assert!(low.is_insufficient());
	}

	#[test]
	fn blank_generation_is_empty_not_text() {
		assert_eq!(GenerationOutcome::from_result(Ok("  \n".to_string())), GenerationOutcome::Empty);
		assert_eq!(
			GenerationOutcome::from_result(Ok(" answer ".to_string())),
			GenerationOutcome::Text("answer".to_string())
		);
		assert!(matches!(
			GenerationOutcome::from_result(Err(color_eyre::eyre::eyre!("timed out"))),
			GenerationOutcome::Unavailable { reason } if reason == "timed out"
		));
	}
}
