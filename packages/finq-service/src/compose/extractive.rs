use std::collections::HashSet;

use finq_domain::{chunk::Chunk, extract, text};

use crate::answer::Citation;

#[derive(Clone, Copy, Debug)]
pub struct ExtractiveLimits {
	pub max_cited_chunks: usize,
	pub first_chunk_sentences: usize,
	pub next_chunk_sentences: usize,
	pub preview_chars: usize,
	pub stitched_max_chars: usize,
}
impl From<&finq_config::Answer> for ExtractiveLimits {
	fn from(cfg: &finq_config::Answer) -> Self {
		Self {
			max_cited_chunks: cfg.max_cited_chunks as usize,
			first_chunk_sentences: cfg.first_chunk_sentences as usize,
			next_chunk_sentences: cfg.next_chunk_sentences as usize,
			preview_chars: cfg.preview_chars as usize,
			stitched_max_chars: cfg.stitched_max_chars as usize,
		}
	}
}
impl Default for ExtractiveLimits {
	fn default() -> Self {
		Self::from(&finq_config::Answer::default())
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stitched {
	pub text: String,
	pub citations: Vec<Citation>,
}

/// Quotes the most query-relevant sentences from the selected chunks. Returns `None` when no
/// chunk contributes a sentence.
pub fn stitch(query: &str, chunks: &[&Chunk], limits: &ExtractiveLimits) -> Option<Stitched> {
	let mut seen_pages: HashSet<(&str, u32, u32)> = HashSet::new();
	let mut picked: Vec<String> = Vec::new();
	let mut citations = Vec::new();

	for chunk in chunks {
		if citations.len() >= limits.max_cited_chunks {
			break;
		}
		// A span counts as seen even when it yields nothing, so repeats are never retried.
		if !seen_pages.insert(chunk.page_signature()) {
			continue;
		}

		let quota = if citations.is_empty() {
			limits.first_chunk_sentences
		} else {
			limits.next_chunk_sentences
		};
		let sentences = extract::best_sentences(query, &chunk.text, quota);
		let Some(lead) = sentences.first() else {
			continue;
		};

		citations.push(Citation {
			doc: chunk.doc.clone(),
			page_start: chunk.page_start,
			page_end: chunk.page_end,
			preview: text::single_line(text::truncate_chars(lead, limits.preview_chars)),
		});
		picked.extend(sentences);
	}

	if picked.is_empty() {
		return None;
	}

	let joined = picked.join(" ");

	Some(Stitched {
		text: text::truncate_chars(&joined, limits.stitched_max_chars).to_string(),
		citations,
	})
}
