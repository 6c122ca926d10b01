pub mod extractive;
pub mod prompt;

use finq_domain::chunk::Chunk;

use crate::answer::Source;

/// Distinct page spans in selection order.
pub fn sources(chunks: &[&Chunk]) -> Vec<Source> {
	let mut out: Vec<Source> = Vec::with_capacity(chunks.len());

	for chunk in chunks {
		let already_listed = out.iter().any(|source| {
			(source.doc.as_str(), source.page_start, source.page_end) == chunk.page_signature()
		});

		if !already_listed {
			out.push(Source {
				doc: chunk.doc.clone(),
				page_start: chunk.page_start,
				page_end: chunk.page_end,
			});
		}
	}

	out
}
