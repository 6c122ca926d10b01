use std::collections::{BTreeMap, VecDeque};

use finq_domain::intent::QueryHints;
use finq_storage::{chunk_store::ChunkStore, vector_index::Candidate};

/// Picks at most `top_k` store positions from the candidate pool.
///
/// Requested issuers narrow the pool unless that would empty it, a requested year moves its
/// chunks to the front without reordering either side, and questions naming two or more issuers
/// interleave them one chunk at a time. Whenever valid candidates exist the result is non-empty.
pub fn rerank(
	candidates: &[Candidate],
	store: &ChunkStore,
	hints: &QueryHints,
	top_k: usize,
) -> Vec<usize> {
	let valid: Vec<usize> = candidates
		.iter()
		.filter_map(|hit| hit.position)
		.filter(|position| *position < store.len())
		.collect();
	let mut pool = valid.clone();

	if !hints.issuers.is_empty() {
		let filtered: Vec<usize> = pool
			.iter()
			.copied()
			.filter(|position| {
				store.get(*position).is_some_and(|chunk| {
					hints.issuers.iter().any(|symbol| chunk.has_issuer(symbol))
				})
			})
			.collect();

		if !filtered.is_empty() {
			pool = filtered;
		}
	}
	if let Some(year) = hints.year {
		let (mut preferred, rest): (Vec<usize>, Vec<usize>) = pool
			.into_iter()
			.partition(|position| store.get(*position).and_then(|chunk| chunk.year) == Some(year));

		preferred.extend(rest);

		pool = preferred;
	}

	let chosen = if hints.is_multi_issuer() {
		interleave_issuers(&pool, store, top_k)
	} else {
		pool.truncate(top_k);

		pool
	};

	if chosen.is_empty() { valid.into_iter().take(top_k).collect() } else { chosen }
}

// Buckets keep pool order; issuers are visited in ascending symbol order with issuer-less chunks
// first.
fn interleave_issuers(pool: &[usize], store: &ChunkStore, top_k: usize) -> Vec<usize> {
	let mut buckets: BTreeMap<Option<&str>, VecDeque<usize>> = BTreeMap::new();

	for position in pool {
		buckets.entry(issuer_at(store, *position)).or_default().push_back(*position);
	}

	let mut out = Vec::with_capacity(top_k.min(pool.len()));

	while out.len() < top_k {
		let mut drew = false;

		for bucket in buckets.values_mut() {
			if out.len() >= top_k {
				break;
			}
			if let Some(position) = bucket.pop_front() {
				out.push(position);

				drew = true;
			}
		}

		if !drew {
			break;
		}
	}

	out
}

fn issuer_at(store: &ChunkStore, position: usize) -> Option<&str> {
	store.get(position).and_then(|chunk| chunk.issuer.as_deref())
}
