use std::sync::LazyLock;

use regex::Regex;

static LEADING_COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?:top|give me|list|into|in|show|summarize|provide)\s+(\d{1,2})")
		.expect("leading count regex is valid")
});
static TRAILING_COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"\b(\d{1,2})\s+(?:bullets?|points?|items?|numbered|sentences?)\b")
		.expect("trailing count regex is valid")
});
static TOP_N_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\btop\s+\d+\b").expect("top n regex is valid"));
static LIST_MARKER_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?:^|\s)[123]\.(?:\s|$)").expect("list marker regex is valid"));

const MAX_COUNT: u8 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatStyle {
	Bullets,
	Numbered,
	Lines,
	Prose,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatRequest {
	pub style: FormatStyle,
	/// Explicit item count, only kept when it is between 1 and 10.
	pub count: Option<u8>,
}
impl FormatRequest {
	pub fn infer(question: &str) -> Self {
		let q = question.trim().to_lowercase();
		let count = explicit_count(&q).filter(|n| (1..=MAX_COUNT).contains(n));
		let has = |needle: &str| q.contains(needle);
		let style = if ["bullet", "bulleted", "bullet points", "points", "as a list"]
			.into_iter()
			.any(has) || q.starts_with("list ")
		{
			FormatStyle::Bullets
		} else if has("numbered") || LIST_MARKER_RE.is_match(&q) || TOP_N_RE.is_match(&q) {
			FormatStyle::Numbered
		} else if ["each on a new line", "separate lines", "new line", "new lines", "line by line"]
			.into_iter()
			.any(has)
		{
			FormatStyle::Lines
		} else {
			FormatStyle::Prose
		};

		Self { style, count }
	}

	/// Formatting instruction handed to the generator.
	pub fn directive(&self) -> String {
		match (self.style, self.count) {
			(FormatStyle::Bullets, count) => format!(
				"Format the answer strictly as bullet points using '- ' at the start of each line. \
				 Each bullet should be one concise sentence. {} Do not include any preamble or \
				 conclusion, bullets only. End each bullet with source markers like [1], [2] based \
				 on the context items used.",
				count
					.map(|n| format!("Write exactly {n} bullet points."))
					.unwrap_or_else(|| "Write 3–5 bullet points.".to_string()),
			),
			(FormatStyle::Numbered, count) => format!(
				"Format the answer strictly as a numbered list using '1.', '2.', '3.' at the start \
				 of lines. Each item should be one concise sentence. {} Do not include any preamble \
				 or conclusion, list only. End each item with source markers like [1], [2] based on \
				 the context items used.",
				count
					.map(|n| format!("Write exactly {n} numbered items."))
					.unwrap_or_else(|| "Write 3–5 numbered items.".to_string()),
			),
			(FormatStyle::Lines, count) => format!(
				"Write clear sentences, each on its own new line. Write exactly {} sentences. \
				 Append source markers like [1], [2] at the end of sentences where relevant.",
				count.unwrap_or(3),
			),
			(FormatStyle::Prose, Some(n)) => format!(
				"Write a concise answer in exactly {n} sentences. Respect any formatting hints in \
				 the question. Include source markers like [1], [2] inline where appropriate."
			),
			(FormatStyle::Prose, None) => "Write a concise answer in 3–5 sentences. Respect any \
			                               formatting hints in the question. Include source \
			                               markers like [1], [2] inline where appropriate."
				.to_string(),
		}
	}
}

fn explicit_count(q: &str) -> Option<u8> {
	if let Some(caps) = LEADING_COUNT_RE.captures(q) {
		return caps.get(1).and_then(|m| m.as_str().parse().ok());
	}

	TRAILING_COUNT_RE.captures(q).and_then(|caps| caps.get(1)).and_then(|m| m.as_str().parse().ok())
}
