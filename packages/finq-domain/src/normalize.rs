use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use unicode_normalization::UnicodeNormalization;

use crate::{similarity, vocabulary::Vocabulary};

/// Known misspellings and their fixes, applied before any fuzzy matching.
pub const DIRECT_REPLACEMENTS: [(&str, &str); 7] = [
	("rish", "risk"),
	("facors", "factors"),
	("facotr", "factor"),
	("finacial", "financial"),
	("operatons", "operations"),
	("conditon", "condition"),
	("enviroment", "environment"),
];

/// Tokens the fuzzy pass must leave alone, including every formatting keyword so a request for
/// "bullets" or "lines" is never rewritten into something else.
pub const NEVER_CORRECT: [&str; 31] = [
	"main",
	"risk",
	"risks",
	"factors",
	"factor",
	"describe",
	"apple",
	"apple's",
	"what",
	"are",
	"the",
	"latest",
	"yoy",
	"rate",
	"level",
	"index",
	"cpi",
	"unemployment",
	"bullet",
	"bullets",
	"point",
	"points",
	"list",
	"listed",
	"numbered",
	"numbers",
	"items",
	"sentences",
	"lines",
	"newline",
	"newlines",
];

static DIRECT_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
	DIRECT_REPLACEMENTS
		.iter()
		.map(|(typo, fix)| {
			let pattern = RegexBuilder::new(&format!(r"\b{typo}\b"))
				.case_insensitive(true)
				.build()
				.expect("direct replacement regex is valid");

			(pattern, *fix)
		})
		.collect()
});

#[derive(Clone, Debug)]
pub struct CorrectionPolicy {
	pub max_corrections: usize,
	pub fuzzy_cutoff: f64,
	pub min_token_chars: usize,
}
impl Default for CorrectionPolicy {
	fn default() -> Self {
		Self { max_corrections: 2, fuzzy_cutoff: 0.75, min_token_chars: 4 }
	}
}
impl From<&finq_config::Correction> for CorrectionPolicy {
	fn from(cfg: &finq_config::Correction) -> Self {
		Self {
			max_corrections: cfg.max_corrections as usize,
			fuzzy_cutoff: cfg.fuzzy_cutoff,
			min_token_chars: cfg.min_token_chars as usize,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Correction {
	pub from: String,
	pub to: String,
}

#[derive(Clone, Debug)]
pub struct NormalizedQuery {
	pub text: String,
	pub changed: bool,
	/// In the order they were applied. Display only.
	pub corrections: Vec<Correction>,
}
impl NormalizedQuery {
	pub fn correction_for(&self, from: &str) -> Option<&str> {
		self.corrections.iter().find(|c| c.from == from).map(|c| c.to.as_str())
	}
}

pub struct QueryNormalizer {
	vocabulary: Vocabulary,
	policy: CorrectionPolicy,
}
impl QueryNormalizer {
	pub fn new(vocabulary: Vocabulary, policy: CorrectionPolicy) -> Self {
		Self { vocabulary, policy }
	}

	pub fn vocabulary(&self) -> &Vocabulary {
		&self.vocabulary
	}

	pub fn normalize(&self, raw: &str) -> NormalizedQuery {
		let input: String = raw.nfkc().collect();
		let (replaced, mut corrections) = apply_direct_replacements(&input);
		let (text, fuzzy) = self.autocorrect(&replaced);

		for correction in fuzzy {
			merge_correction(&mut corrections, correction);
		}

		let changed = !corrections.is_empty() && text.trim() != input.trim();

		if !changed {
			return NormalizedQuery { text, changed: false, corrections: Vec::new() };
		}

		NormalizedQuery { text, changed, corrections }
	}

	fn autocorrect(&self, query: &str) -> (String, Vec<Correction>) {
		let mut tokens: Vec<String> = query.split_whitespace().map(str::to_string).collect();
		let mut corrections = Vec::new();

		for token in tokens.iter_mut() {
			if corrections.len() >= self.policy.max_corrections {
				break;
			}

			let (lead, core, trail) = split_punctuation(token);

			if core.is_empty() {
				continue;
			}

			let lowered = core.to_lowercase();

			if NEVER_CORRECT.contains(&lowered.as_str())
				|| lowered.chars().count() < self.policy.min_token_chars
				|| is_possessive(token)
				|| is_title_case(core)
				|| self.vocabulary.contains(&lowered)
			{
				continue;
			}

			let replacement = direct_replacement(&lowered).or_else(|| {
				similarity::close_match(
					&lowered,
					self.vocabulary.words().iter().map(String::as_str),
					self.policy.fuzzy_cutoff,
				)
			});
			let Some(replacement) = replacement else { continue };

			if replacement == lowered {
				continue;
			}

			let rebuilt = format!("{lead}{replacement}{trail}");

			corrections.push(Correction { from: core.to_string(), to: replacement.to_string() });

			*token = rebuilt;
		}

		if corrections.is_empty() {
			return (query.to_string(), corrections);
		}

		(tokens.join(" "), corrections)
	}
}

fn apply_direct_replacements(query: &str) -> (String, Vec<Correction>) {
	let mut text = query.to_string();
	let mut corrections = Vec::new();

	for (pattern, fix) in DIRECT_PATTERNS.iter() {
		if !pattern.is_match(&text) {
			continue;
		}

		for found in pattern.find_iter(&text) {
			let surface = found.as_str();
			let recorded = corrections.iter().any(|c: &Correction| c.from == surface);

			if !recorded && surface.to_lowercase() != *fix {
				corrections.push(Correction { from: surface.to_string(), to: fix.to_string() });
			}
		}

		text = pattern.replace_all(&text, *fix).into_owned();
	}

	(text, corrections)
}

fn direct_replacement(token: &str) -> Option<&'static str> {
	DIRECT_REPLACEMENTS.iter().find(|(typo, _)| *typo == token).map(|(_, fix)| *fix)
}

fn merge_correction(corrections: &mut Vec<Correction>, correction: Correction) {
	match corrections.iter_mut().find(|c| c.from == correction.from) {
		Some(existing) => existing.to = correction.to,
		None => corrections.push(correction),
	}
}

// Splits surrounding ASCII punctuation off a whitespace token.
fn split_punctuation(token: &str) -> (&str, &str, &str) {
	let core_start = token.find(|c: char| !c.is_ascii_punctuation()).unwrap_or(token.len());
	let core_end = token
		.rfind(|c: char| !c.is_ascii_punctuation())
		.map(|idx| idx + token[idx..].chars().next().map(char::len_utf8).unwrap_or(1))
		.unwrap_or(core_start);

	(&token[..core_start], &token[core_start..core_end], &token[core_end..])
}

fn is_possessive(token: &str) -> bool {
	token.contains('\'') || token.contains('’')
}

fn is_title_case(word: &str) -> bool {
	let mut chars = word.chars();
	let Some(first) = chars.next() else { return false };
	let rest: Vec<char> = chars.collect();

	!rest.is_empty()
		&& first.is_uppercase()
		&& rest.iter().any(|c| c.is_alphabetic())
		&& rest.iter().all(|c| !c.is_alphabetic() || c.is_lowercase())
}
