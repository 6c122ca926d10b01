use std::{collections::BTreeSet, sync::LazyLock};

use regex::Regex;

static YEAR_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").expect("year regex is valid"));

const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1990..=2100;

/// Local macro series the pipeline can answer from directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MacroSeries {
	Cpi,
	Unemployment,
}
impl MacroSeries {
	/// File stem of the series CSV inside the macro directory.
	pub fn file_stem(self) -> &'static str {
		match self {
			Self::Cpi => "cpi",
			Self::Unemployment => "unemployment",
		}
	}

	pub fn fred_id(self) -> &'static str {
		match self {
			Self::Cpi => "CPIAUCSL",
			Self::Unemployment => "UNRATE",
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MacroIntent {
	None,
	CpiYoy,
	CpiLevel,
	Unemployment,
}
impl MacroIntent {
	pub fn classify(query: &str) -> Self {
		let lowered = query.to_lowercase();
		let has = |needle: &str| lowered.contains(needle);

		if has("cpi") {
			if ["yoy", "year over year", "year-on-year"].into_iter().any(has) {
				return Self::CpiYoy;
			}
			if ["level", "index", "latest", "value"].into_iter().any(has) {
				return Self::CpiLevel;
			}
		}
		if has("unemployment") || has("jobless") {
			return Self::Unemployment;
		}

		Self::None
	}

	pub fn series(self) -> Option<MacroSeries> {
		match self {
			Self::None => None,
			Self::CpiYoy | Self::CpiLevel => Some(MacroSeries::Cpi),
			Self::Unemployment => Some(MacroSeries::Unemployment),
		}
	}
}

/// Issuer and year preferences read off the question. Empty hints mean no preference.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryHints {
	/// Ordered so multi-issuer interleaving visits symbols deterministically.
	pub issuers: BTreeSet<String>,
	pub year: Option<i32>,
}
impl QueryHints {
	pub fn from_query(query: &str, issuers: &[finq_config::Issuer]) -> Self {
		let lowered = query.to_lowercase();
		let issuers = issuers
			.iter()
			.filter(|issuer| {
				issuer.aliases.iter().any(|alias| !alias.is_empty() && lowered.contains(alias))
			})
			.map(|issuer| issuer.symbol.clone())
			.collect();
		let year = YEAR_RE
			.find_iter(query)
			.filter_map(|m| m.as_str().parse::<i32>().ok())
			.find(|year| YEAR_RANGE.contains(year));

		Self { issuers, year }
	}

	pub fn is_multi_issuer(&self) -> bool {
		self.issuers.len() >= 2
	}
}
