use serde::Deserialize;

use finq_domain::chunk::Chunk;

use crate::{ChunkingConfig, PAGE_BREAK};

/// Provenance of one filing, as written next to the downloaded document.
#[derive(Clone, Debug, Deserialize)]
pub struct FilingMeta {
	#[serde(rename = "ticker")]
	pub issuer: String,
	#[serde(default = "unknown_form")]
	pub form: String,
	/// `YYYY-MM-DD`.
	#[serde(rename = "filingDate", default)]
	pub filing_date: Option<String>,
	pub accession: String,
}
impl FilingMeta {
	pub fn year(&self) -> Option<i32> {
		self.filing_date.as_deref()?.split('-').next()?.trim().parse().ok()
	}

	pub fn doc_name(&self) -> String {
		format!("{}_{}_{}.html", self.issuer, self.form, self.year().unwrap_or(0))
	}

	/// Stable across runs so re-ingesting the same filing is a no-op.
	pub fn chunk_id(&self, ordinal: usize) -> String {
		format!(
			"{}_{}_{}_{}_c{ordinal}",
			self.issuer,
			self.form,
			self.year().unwrap_or(0),
			self.accession
		)
	}
}

/// Chunks one filing. Form-feed separated text is packed by paragraph with real page spans,
/// anything else is windowed by characters and attributed to page 1.
pub fn build_chunks(text: &str, meta: &FilingMeta, cfg: &ChunkingConfig) -> Vec<Chunk> {
	let pieces: Vec<(u32, u32, String)> = if text.contains(PAGE_BREAK) {
		crate::pack_pages(text, cfg)
			.into_iter()
			.map(|chunk| (chunk.page_start, chunk.page_end, chunk.text))
			.collect()
	} else {
		crate::split_text(text, cfg).into_iter().map(|chunk| (1, 1, chunk)).collect()
	};
	let doc = meta.doc_name();
	let year = meta.year();

	pieces
		.into_iter()
		.enumerate()
		.map(|(idx, (page_start, page_end, text))| Chunk {
			id: meta.chunk_id(idx + 1),
			doc: doc.clone(),
			issuer: Some(meta.issuer.clone()),
			form: Some(meta.form.clone()),
			year,
			page_start,
			page_end,
			text,
			accession: Some(meta.accession.clone()),
		})
		.collect()
}

fn unknown_form() -> String {
	"UNK".to_string()
}
