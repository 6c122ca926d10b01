use finq_domain::{chunk::Chunk, style::FormatRequest, text};

pub const SYSTEM_RULES: &str = "You are a financial document assistant. Use ONLY the provided \
	context to answer. If the context is insufficient to answer, reply exactly: \"Insufficient \
	context.\" Never invent facts. Always include inline source markers like [1], [2] that \
	correspond to the context items used. Follow the requested output formatting strictly.";

/// One numbered context entry. Markers start at 1 so they match the `[n]` citations the model is
/// asked to emit.
pub fn context_item(marker: usize, chunk: &Chunk, max_chars: usize) -> String {
	let snippet = text::single_line(text::truncate_chars(&chunk.text, max_chars));

	format!(
		"[{marker}] (Doc: {}, pages {}-{})\n{}",
		chunk.doc,
		chunk.page_start,
		chunk.page_end,
		snippet.trim()
	)
}

pub fn build_prompt(question: &str, chunks: &[&Chunk], max_context_chars: usize) -> String {
	let directive = FormatRequest::infer(question).directive();
	let context = chunks
		.iter()
		.enumerate()
		.map(|(idx, chunk)| context_item(idx + 1, chunk, max_context_chars))
		.collect::<Vec<_>>()
		.join("\n\n");

	format!(
		"{SYSTEM_RULES}\n\nFormatting requirements: {directive}\n\nQuestion:\n{question}\n\n\
		 Context:\n{context}\n\nAnswer:"
	)
}
