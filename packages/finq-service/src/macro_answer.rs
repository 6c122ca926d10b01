use finq_domain::intent::{MacroIntent, MacroSeries};
use finq_storage::macro_series::Observation;

use crate::MacroSource;

/// Sentence answering a macro question, or `None` when the query has no macro intent. Missing or
/// unreadable series degrade to an apology instead of an error.
pub fn answer(intent: MacroIntent, source: &dyn MacroSource) -> Option<String> {
	let series = intent.series()?;
	let result = match intent {
		MacroIntent::CpiYoy => source.latest_yoy(series),
		_ => source.latest_value(series),
	};
	let Some(obs) = lookup(result, series) else {
		return Some(apology(intent).to_string());
	};
	let (value, date, fred_id) = (obs.value, obs.date, series.fred_id());
	let text = match intent {
		MacroIntent::CpiYoy =>
			format!("Latest CPI YoY is {value:.2}% as of {date}. Source: FRED series {fred_id}."),
		MacroIntent::CpiLevel => format!(
			"Latest CPI level is {value:.3} (index, 1982–84=100) as of {date}. Source: FRED \
			 series {fred_id}."
		),
		MacroIntent::Unemployment | MacroIntent::None => format!(
			"Latest unemployment rate is {value:.2}% as of {date}. Source: FRED series {fred_id}."
		),
	};

	Some(text)
}

fn apology(intent: MacroIntent) -> &'static str {
	match intent {
		MacroIntent::CpiYoy => "Sorry, I couldn't compute CPI YoY from the local CSV.",
		MacroIntent::CpiLevel => "Sorry, I couldn't read the latest CPI level from the local CSV.",
		MacroIntent::Unemployment | MacroIntent::None =>
			"Sorry, I couldn't read the unemployment rate from the local CSV.",
	}
}

fn lookup(
	result: finq_storage::Result<Option<Observation>>,
	series: MacroSeries,
) -> Option<Observation> {
	match result {
		Ok(observation) => observation,
		Err(err) => {
			tracing::warn!(error = %err, series = series.fred_id(), "Macro series lookup failed.");

			None
		},
	}
}

#[cfg(test)]
mod tests {
	use std::path::PathBuf;

	use finq_storage::Error;

	use super::*;

	struct FixedSeries {
		value: Option<Observation>,
		yoy: Option<Observation>,
		broken: bool,
	}
	impl MacroSource for FixedSeries {
		fn latest_value(&self, _series: MacroSeries) -> finq_storage::Result<Option<Observation>> {
			if self.broken {
				return Err(Error::InvalidIndex {
					path: PathBuf::from("cpi.csv"),
					message: "unreadable".to_string(),
				});
			}

			Ok(self.value)
		}

		fn latest_yoy(&self, _series: MacroSeries) -> finq_storage::Result<Option<Observation>> {
			Ok(self.yoy)
		}
	}

	fn observation(value: f64) -> Observation {
		Observation {
			date: time::Date::from_calendar_date(2024, time::Month::August, 1)
				.expect("valid date"),
			value,
		}
	}

	#[test]
	fn formats_each_macro_intent() {
		let source = FixedSeries {
			value: Some(observation(314.1234)),
			yoy: Some(observation(2.5317)),
			broken: false,
		};

		assert_eq!(
			answer(MacroIntent::CpiYoy, &source).as_deref(),
			Some("Latest CPI YoY is 2.53% as of 2024-08-01. Source: FRED series CPIAUCSL.")
		);
		assert_eq!(
			answer(MacroIntent::CpiLevel, &source).as_deref(),
			Some(
				"Latest CPI level is 314.123 (index, 1982–84=100) as of 2024-08-01. Source: FRED \
				 series CPIAUCSL."
			)
		);
		assert!(
			answer(MacroIntent::Unemployment, &source)
				.is_some_and(|text| text.starts_with("Latest unemployment rate is 314.12%"))
		);
		assert_eq!(answer(MacroIntent::None, &source), None);
	}

	#[test]
	fn missing_or_broken_series_apologize() {
		let missing = FixedSeries { value: None, yoy: None, broken: false };
		let broken = FixedSeries { value: None, yoy: None, broken: true };

		assert_eq!(
			answer(MacroIntent::CpiYoy, &missing).as_deref(),
			Some("Sorry, I couldn't compute CPI YoY from the local CSV.")
		);
		assert!(
			answer(MacroIntent::Unemployment, &broken).is_some_and(|text| text.starts_with("Sorry"))
		);
	}
}
