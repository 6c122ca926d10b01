pub mod filing;

pub use filing::{FilingMeta, build_chunks};

use std::sync::LazyLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use finq_domain::text;

pub const PAGE_BREAK: char = '\u{0C}';

static PARAGRAPH_BREAK_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\n\s*\n").expect("paragraph break regex is valid"));

#[derive(Clone, Debug)]
pub struct ChunkingConfig {
	pub max_chars: usize,
	pub overlap_chars: usize,
	pub break_ratio: f32,
	pub target_words: usize,
	pub overlap_words: usize,
}
impl From<&finq_config::Chunking> for ChunkingConfig {
	fn from(cfg: &finq_config::Chunking) -> Self {
		Self {
			max_chars: cfg.max_chars as usize,
			overlap_chars: cfg.overlap_chars as usize,
			break_ratio: cfg.break_ratio,
			target_words: cfg.target_words as usize,
			overlap_words: cfg.overlap_words as usize,
		}
	}
}

/// A packed run of paragraphs together with the pages it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PagedChunk {
	pub page_start: u32,
	pub page_end: u32,
	pub text: String,
}

/// Character windows of at most `max_chars`, consecutive windows sharing `overlap_chars`.
/// A window ends early at the last sentence boundary when that boundary lies past
/// `break_ratio * max_chars`.
pub fn split_text(text: &str, cfg: &ChunkingConfig) -> Vec<String> {
	let text = text::normalize_whitespace(text);

	if text.is_empty() {
		return Vec::new();
	}

	let mut offsets: Vec<usize> = text.char_indices().map(|(idx, _)| idx).collect();
	let total = offsets.len();

	offsets.push(text.len());

	if total <= cfg.max_chars {
		return vec![text];
	}

	let max_chars = cfg.max_chars.max(1);
	let min_break = (max_chars as f32 * cfg.break_ratio) as usize;
	let mut chunks = Vec::new();
	let mut start = 0_usize;

	loop {
		let mut end = total.min(start + max_chars);

		if end < total {
			let window = &text[offsets[start]..offsets[end]];

			if let Some(cut) = last_sentence_boundary(window, min_break) {
				end = start + cut;
			}
		}

		let chunk = text[offsets[start]..offsets[end]].trim();

		if !chunk.is_empty() {
			chunks.push(chunk.to_string());
		}
		if end >= total {
			break;
		}

		start = end.saturating_sub(cfg.overlap_chars).max(start + 1);
	}

	tracing::debug!(chunks = chunks.len(), chars = total, "Split text into windows.");

	chunks
}

/// Splits form-feed separated text into pages, then greedily packs paragraphs up to
/// `target_words`, carrying roughly `overlap_words` of trailing paragraphs into the next chunk.
pub fn pack_pages(text: &str, cfg: &ChunkingConfig) -> Vec<PagedChunk> {
	let mut paragraphs: Vec<(u32, String)> = Vec::new();

	for (idx, page) in text.split(PAGE_BREAK).enumerate() {
		let page_no = idx as u32 + 1;
		let page = text::normalize_whitespace(page);

		for paragraph in PARAGRAPH_BREAK_RE.split(&page) {
			let paragraph = paragraph.trim();

			if !paragraph.is_empty() {
				paragraphs.push((page_no, paragraph.to_string()));
			}
		}
	}

	let word_counts: Vec<usize> =
		paragraphs.iter().map(|(_, paragraph)| paragraph.unicode_words().count()).collect();
	let mut chunks = Vec::new();
	let mut start = 0_usize;

	while start < paragraphs.len() {
		let mut end = start;
		let mut words = 0_usize;

		while end < paragraphs.len() && (end == start || words + word_counts[end] <= cfg.target_words)
		{
			words += word_counts[end];
			end += 1;
		}

		let text = paragraphs[start..end]
			.iter()
			.map(|(_, paragraph)| paragraph.as_str())
			.collect::<Vec<_>>()
			.join("\n\n");

		chunks.push(PagedChunk {
			page_start: paragraphs[start].0,
			page_end: paragraphs[end - 1].0,
			text,
		});

		if end >= paragraphs.len() {
			break;
		}

		let mut carried = 0_usize;
		let mut carried_words = 0_usize;

		while carried < end - start && carried_words < cfg.overlap_words {
			carried_words += word_counts[end - 1 - carried];
			carried += 1;
		}

		start = (end - carried).max(start + 1);
	}

	chunks
}

// Char offset of the last sentence start inside `window` that lies past `min_chars`.
fn last_sentence_boundary(window: &str, min_chars: usize) -> Option<usize> {
	let (byte_idx, _) = window
		.split_sentence_bound_indices()
		.filter(|(idx, _)| *idx > 0)
		.last()?;
	let chars = window[..byte_idx].chars().count();

	(chars > min_chars).then_some(chars)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn cfg(max_chars: usize, overlap_chars: usize) -> ChunkingConfig {
		ChunkingConfig {
			max_chars,
			overlap_chars,
			break_ratio: 0.6,
			target_words: 12,
			overlap_words: 3,
		}
	}

	#[test]
	fn short_text_is_a_single_chunk() {
		assert_eq!(split_text("  One sentence.  ", &cfg(100, 10)), vec!["One sentence."]);
		assert!(split_text(" \n ", &cfg(100, 10)).is_empty());
	}

	#[test]
	fn windows_prefer_sentence_ends() {
		let text =
			"Alpha beta gamma delta epsilon zeta. Eta theta iota kappa lambda mu nu xi omicron.";
		let chunks = split_text(text, &cfg(45, 5));

		assert_eq!(chunks[0], "Alpha beta gamma delta epsilon zeta.");
		assert!(chunks.len() >= 2);
		assert!(chunks.last().is_some_and(|c| c.ends_with("omicron.")));
	}

	#[test]
	fn early_boundaries_are_ignored() {
		let text = "Hi. Abcdefghijklmnopqrstuvwxyz abcdefghijklmnopqrstuvwxyz";
		let chunks = split_text(text, &cfg(30, 5));

		assert_eq!(chunks[0].chars().count(), 30);
	}

	#[test]
	fn consecutive_windows_overlap() {
		let text = "a".repeat(50);
		let chunks = split_text(&text, &cfg(20, 5));

		assert_eq!(chunks.len(), 3);
		assert_eq!(chunks[0].len(), 20);
		assert_eq!(chunks[2].len(), 20);
	}

	#[test]
	fn pages_keep_their_span() {
		let text = "one two three four five\n\nsix seven eight\u{0C}nine ten eleven twelve thirteen \
		            fourteen\n\nfifteen sixteen";
		let chunks = pack_pages(text, &cfg(1_000, 10));

		assert_eq!(chunks[0].page_start, 1);
		assert_eq!(chunks[0].page_end, 1);
		assert!(chunks.iter().any(|chunk| chunk.page_start == 1 && chunk.page_end == 2));
		assert_eq!(chunks.last().map(|chunk| chunk.page_end), Some(2));
	}

	#[test]
	fn oversized_paragraph_still_forms_a_chunk() {
		let text = "word ".repeat(40);
		let chunks = pack_pages(&text, &cfg(1_000, 10));

		assert_eq!(chunks.len(), 1);
		assert_eq!(chunks[0].text.split_whitespace().count(), 40);
	}
}
