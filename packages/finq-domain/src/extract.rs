use std::sync::LazyLock;

use regex::Regex;

use crate::text;

pub const TOC_HINTS: [&str; 4] = ["table of contents", "exhibit", "index of", "item 1."];
pub const MIN_SENTENCE_CHARS: usize = 40;
pub const MAX_SENTENCE_CHARS: usize = 350;

const DOT_PLACEHOLDER: char = '∯';

static ABBREVIATION_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?:\b[A-Z]\.){2,}").expect("abbreviation regex is valid"));

pub fn looks_like_toc(text: &str) -> bool {
	let lowered = text.to_lowercase();

	TOC_HINTS.iter().any(|hint| lowered.contains(hint))
}

/// Sentences of prose-like length. Dotted abbreviations such as "U.S." do not end a sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
	let normalized = text::normalize_prose(text);
	let protected = ABBREVIATION_RE
		.replace_all(&normalized, |caps: &regex::Captures<'_>| {
			caps[0].replace('.', &DOT_PLACEHOLDER.to_string())
		})
		.into_owned();

	split_on_terminators(&protected)
		.into_iter()
		.map(|part| part.replace(DOT_PLACEHOLDER, ".").trim().to_string())
		.filter(|sentence| {
			let len = sentence.chars().count();

			(MIN_SENTENCE_CHARS..=MAX_SENTENCE_CHARS).contains(&len)
		})
		.collect()
}

/// Number of distinct query words the sentence shares.
pub fn keyword_score(query: &str, sentence: &str) -> usize {
	let query_words = text::word_set(query);

	text::word_set(sentence).intersection(&query_words).count()
}

/// Up to `max_sentences` sentences ranked by overlap with the query, ties kept in text order.
/// Falls back to the leading sentences when nothing overlaps. Table-of-contents chunks yield
/// nothing.
pub fn best_sentences(query: &str, chunk_text: &str, max_sentences: usize) -> Vec<String> {
	if max_sentences == 0 || looks_like_toc(chunk_text) {
		return Vec::new();
	}

	let sentences = split_sentences(chunk_text);
	let query_words = text::word_set(query);
	let mut scored: Vec<(usize, usize)> = sentences
		.iter()
		.enumerate()
		.map(|(idx, sentence)| (text::word_set(sentence).intersection(&query_words).count(), idx))
		.collect();

	scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

	match scored.first() {
		None => Vec::new(),
		Some((0, _)) => sentences.into_iter().take(max_sentences).collect(),
		Some(_) =>
			scored.into_iter().take(max_sentences).map(|(_, idx)| sentences[idx].clone()).collect(),
	}
}

fn split_on_terminators(text: &str) -> Vec<&str> {
	let mut parts = Vec::new();
	let mut start = 0;
	let mut chars = text.char_indices().peekable();

	while let Some((_, ch)) = chars.next() {
		if !matches!(ch, '.' | '!' | '?') {
			continue;
		}

		let Some(&(end, next)) = chars.peek() else { break };

		if !next.is_whitespace() {
			continue;
		}

		parts.push(&text[start..end]);

		while let Some(&(_, c)) = chars.peek()
			&& c.is_whitespace()
		{
			chars.next();
		}

		start = chars.peek().map(|(idx, _)| *idx).unwrap_or(text.len());
	}

	if start < text.len() {
		parts.push(&text[start..]);
	}

	parts
}

#[cfg(test)]
mod tests {
	use super::*;

	const PASSAGE: &str = "Net sales declined due to weaker demand in Greater China markets. \
	                       The Company depends on component suppliers located outside the U.S. \
	                       for most of its products. Short line. Foreign exchange rates could \
	                       adversely affect the Company's gross margin and revenue.";

	#[test]
	fn abbreviations_do_not_split_sentences() {
		let sentences = split_sentences(PASSAGE);

		assert_eq!(sentences.len(), 3);
		assert!(sentences[1].contains("outside the U.S. for most"));
	}

	#[test]
	fn short_fragments_are_dropped() {
		assert!(split_sentences(PASSAGE).iter().all(|s| s != "Short line."));
	}

	#[test]
	fn best_sentences_prefer_overlap_then_order() {
		let picked = best_sentences("foreign exchange margin", PASSAGE, 1);

		assert_eq!(picked.len(), 1);
		assert!(picked[0].starts_with("Foreign exchange"));
	}

	#[test]
	fn no_overlap_falls_back_to_leading_sentences() {
		let picked = best_sentences("cybersecurity incidents", PASSAGE, 2);

		assert_eq!(picked.len(), 2);
		assert!(picked[0].starts_with("Net sales"));
		assert!(picked[1].starts_with("The Company depends"));
	}

	#[test]
	fn toc_chunks_yield_nothing() {
		let toc = "TABLE OF CONTENTS Item 1. Business Item 1A. Risk Factors and other sections here.";

		assert!(looks_like_toc(toc));
		assert!(best_sentences("risk factors", toc, 2).is_empty());
	}

	#[test]
	fn keyword_score_counts_distinct_shared_words() {
		assert_eq!(keyword_score("supply chain supply", "The supply chain is global."), 2);
	}
}
