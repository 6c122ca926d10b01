use std::{collections::HashSet, sync::LazyLock};

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static WORD_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"[a-zA-Z]{3,}").expect("word regex is valid"));
static INLINE_SPACE_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"[ \t]+").expect("inline space regex is valid"));
static BLANK_LINES_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank lines regex is valid"));
static HYPHEN_BREAK_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"-\s*\n\s*").expect("hyphen break regex is valid"));

/// Lowercased ASCII words of three or more letters, in order of appearance.
pub fn words(text: &str) -> impl Iterator<Item = String> + '_ {
	WORD_RE.find_iter(text).map(|m| m.as_str().to_ascii_lowercase())
}

pub fn word_set(text: &str) -> HashSet<String> {
	words(text).collect()
}

/// NFKC-folds the text (which also turns no-break spaces into spaces), collapses runs of spaces
/// and tabs, and keeps at most one blank line between paragraphs.
pub fn normalize_whitespace(text: &str) -> String {
	let folded: String = text.nfkc().collect();
	let collapsed = INLINE_SPACE_RE.replace_all(&folded, " ");
	let paragraphs = BLANK_LINES_RE.replace_all(&collapsed, "\n\n");

	paragraphs.trim().to_string()
}

/// Same as [`normalize_whitespace`] but first rejoins words split across lines, e.g.
/// `informa-\ntion`.
pub fn normalize_prose(text: &str) -> String {
	let joined = HYPHEN_BREAK_RE.replace_all(text, "");

	normalize_whitespace(&joined)
}

pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
	match text.char_indices().nth(max_chars) {
		Some((idx, _)) => &text[..idx],
		None => text,
	}
}

pub fn single_line(text: &str) -> String {
	text.replace(['\r', '\n'], " ")
}
