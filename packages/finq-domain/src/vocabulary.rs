use std::collections::{HashMap, HashSet};

use crate::text;

/// Known words drawn from the chunk store, used only to steer query correction.
#[derive(Clone, Debug, Default)]
pub struct Vocabulary {
	ranked: Vec<String>,
	known: HashSet<String>,
}
impl Vocabulary {
	/// Counts every word over `texts` and keeps the `max_words` most frequent. Equal counts keep
	/// first-seen order.
	pub fn build<'a, I>(texts: I, max_words: usize) -> Self
	where
		I: IntoIterator<Item = &'a str>,
	{
		let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
		let mut seen = 0_usize;

		for text in texts {
			for word in text::words(text) {
				let entry = counts.entry(word).or_insert_with(|| {
					seen += 1;

					(0, seen)
				});

				entry.0 += 1;
			}
		}

		let mut ranked: Vec<(String, usize, usize)> =
			counts.into_iter().map(|(word, (count, first))| (word, count, first)).collect();

		ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
		ranked.truncate(max_words);

		let ranked: Vec<String> = ranked.into_iter().map(|(word, _, _)| word).collect();
		let known = ranked.iter().cloned().collect();

		Self { ranked, known }
	}

	pub fn contains(&self, word: &str) -> bool {
		self.known.contains(word)
	}

	/// Most frequent first.
	pub fn words(&self) -> &[String] {
		&self.ranked
	}

	pub fn len(&self) -> usize {
		self.ranked.len()
	}

	pub fn is_empty(&self) -> bool {
		self.ranked.is_empty()
	}
}
