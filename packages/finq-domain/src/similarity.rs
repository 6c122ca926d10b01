//! Gestalt pattern matching ratio (Ratcliff/Obershelp), as used for fuzzy token correction.

/// `2 * M / T`, where `M` counts characters in matching blocks and `T` is the combined length.
/// Two empty strings are identical.
pub fn ratio(a: &str, b: &str) -> f64 {
	let a: Vec<char> = a.chars().collect();
	let b: Vec<char> = b.chars().collect();
	let total = a.len() + b.len();

	if total == 0 {
		return 1.0;
	}

	2.0 * matched_chars(&a, &b) as f64 / total as f64
}

/// Best candidate whose ratio against `word` reaches `cutoff`. Equal ratios resolve to the
/// lexicographically greater candidate so the choice does not depend on candidate order.
pub fn close_match<'a, I>(word: &str, candidates: I, cutoff: f64) -> Option<&'a str>
where
	I: IntoIterator<Item = &'a str>,
{
	let word_len = word.chars().count();
	let mut best: Option<(f64, &'a str)> = None;

	for candidate in candidates {
		if !length_bound_allows(word_len, candidate.chars().count(), cutoff) {
			continue;
		}

		let score = ratio(candidate, word);

		if score < cutoff {
			continue;
		}

		let better = match best {
			None => true,
			Some((best_score, best_word)) =>
				score > best_score || (score == best_score && candidate > best_word),
		};

		if better {
			best = Some((score, candidate));
		}
	}

	best.map(|(_, candidate)| candidate)
}

// Upper bound of the ratio from lengths alone.
fn length_bound_allows(a_len: usize, b_len: usize, cutoff: f64) -> bool {
	let total = a_len + b_len;

	if total == 0 {
		return true;
	}

	2.0 * a_len.min(b_len) as f64 / total as f64 >= cutoff
}

fn matched_chars(a: &[char], b: &[char]) -> usize {
	let mut matched = 0;
	let mut pending = vec![(0, a.len(), 0, b.len())];

	while let Some((alo, ahi, blo, bhi)) = pending.pop() {
		let (i, j, size) = longest_match(a, b, alo, ahi, blo, bhi);

		if size == 0 {
			continue;
		}

		matched += size;

		if alo < i && blo < j {
			pending.push((alo, i, blo, j));
		}
		if i + size < ahi && j + size < bhi {
			pending.push((i + size, ahi, j + size, bhi));
		}
	}

	matched
}

// Earliest longest common block inside the window.
fn longest_match(
	a: &[char],
	b: &[char],
	alo: usize,
	ahi: usize,
	blo: usize,
	bhi: usize,
) -> (usize, usize, usize) {
	let mut best = (alo, blo, 0_usize);
	let mut prev = vec![0_usize; b.len() + 1];

	for i in alo..ahi {
		let mut curr = vec![0_usize; b.len() + 1];

		for j in blo..bhi {
			if a[i] != b[j] {
				continue;
			}

			let run = prev[j] + 1;

			curr[j + 1] = run;

			if run > best.2 {
				best = (i + 1 - run, j + 1 - run, run);
			}
		}

		prev = curr;
	}

	best
}
