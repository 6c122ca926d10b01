use std::path::{Path, PathBuf};

use serde::Deserialize;
use time::{Date, macros::format_description};

use crate::{Error, Result};

/// Periods per year for monthly series.
pub const YOY_PERIODS: usize = 12;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Observation {
	pub date: Date,
	pub value: f64,
}

#[derive(Debug, Deserialize)]
struct Row {
	date: String,
	value: Option<String>,
}

/// Local `date,value` CSV files, one per series, as downloaded from FRED.
#[derive(Clone, Debug)]
pub struct MacroStore {
	dir: PathBuf,
}
impl MacroStore {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	pub fn series_path(&self, stem: &str) -> PathBuf {
		self.dir.join(format!("{stem}.csv"))
	}

	/// Observations in file order with missing values dropped. `None` when the series file does
	/// not exist.
	pub fn observations(&self, stem: &str) -> Result<Option<Vec<Observation>>> {
		let path = self.series_path(stem);

		if !path.exists() {
			tracing::warn!(path = %path.display(), "Macro series file is missing.");

			return Ok(None);
		}

		read_series(&path).map(Some)
	}

	pub fn latest_value(&self, stem: &str) -> Result<Option<Observation>> {
		Ok(self.observations(stem)?.and_then(|rows| rows.last().copied()))
	}

	/// Percent change of the latest observation against the one a year earlier.
	pub fn latest_yoy(&self, stem: &str) -> Result<Option<Observation>> {
		Ok(self.observations(stem)?.and_then(|rows| year_over_year(&rows, YOY_PERIODS)))
	}
}

pub fn year_over_year(rows: &[Observation], periods: usize) -> Option<Observation> {
	if periods == 0 || rows.len() <= periods {
		return None;
	}

	let latest = rows[rows.len() - 1];
	let base = rows[rows.len() - 1 - periods];
	let change = (latest.value / base.value - 1.0) * 100.0;

	change.is_finite().then_some(Observation { date: latest.date, value: change })
}

fn read_series(path: &Path) -> Result<Vec<Observation>> {
	let csv_error = |source| Error::Csv { path: path.to_path_buf(), source };
	let mut reader = csv::Reader::from_path(path).map_err(csv_error)?;
	let mut rows = Vec::new();

	for record in reader.deserialize::<Row>() {
		let row = record.map_err(csv_error)?;
		let Some(value) = row.value.as_deref().and_then(|raw| raw.trim().parse::<f64>().ok())
		else {
			continue;
		};

		if !value.is_finite() {
			continue;
		}

		let Some(date) = parse_date(&row.date) else {
			tracing::warn!(path = %path.display(), date = %row.date, "Skipping row with bad date.");

			continue;
		};

		rows.push(Observation { date, value });
	}

	Ok(rows)
}

// Accepts `YYYY-MM-DD`, optionally followed by a time component.
fn parse_date(raw: &str) -> Option<Date> {
	let day = raw.trim().get(..10)?;

	Date::parse(day, format_description!("[year]-[month]-[day]")).ok()
}
