use serde::{Deserialize, Serialize};

/// A retrievable span of filing text with its provenance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
	/// Empty only for legacy records; readers call [`Chunk::ensure_id`] after decoding.
	#[serde(default)]
	pub id: String,
	#[serde(default = "unknown_doc")]
	pub doc: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub issuer: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub form: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub year: Option<i32>,
	#[serde(default = "first_page")]
	pub page_start: u32,
	#[serde(default = "first_page")]
	pub page_end: u32,
	#[serde(default)]
	pub text: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub accession: Option<String>,
}
impl Chunk {
	pub fn derived_id(&self) -> String {
		let digest = blake3::hash(self.text.as_bytes()).to_hex();

		format!("{}:p{}-{}:{}", self.doc, self.page_start, self.page_end, &digest.as_str()[..16])
	}

	pub fn ensure_id(&mut self) {
		if self.id.trim().is_empty() {
			self.id = self.derived_id();
		}
	}

	pub fn page_signature(&self) -> (&str, u32, u32) {
		(self.doc.as_str(), self.page_start, self.page_end)
	}

	pub fn has_issuer(&self, symbol: &str) -> bool {
		self.issuer.as_deref() == Some(symbol)
	}
}

fn unknown_doc() -> String {
	"?".to_string()
}

fn first_page() -> u32 {
	1
}
