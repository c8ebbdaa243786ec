use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::date_utils::{enumerate_dates, parse_date};

/// One public-holiday block and the weekend days worked to make up for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Holiday {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub tx_date_list: Vec<String>,
}

impl Holiday {
    pub fn new(name: &str, start_date: &str, end_date: &str, tx_date_list: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            start_date: start_date.to_string(),
            end_date: end_date.to_string(),
            tx_date_list: tx_date_list.iter().map(|d| d.to_string()).collect(),
        }
    }

    /// Checks that every date parses. Inverted ranges and tx days inside the
    /// range are reported but accepted.
    #[tracing::instrument(skip(self), fields(name = %self.name))]
    pub fn validate(&self) -> anyhow::Result<()> {
        let start = parse_date(&self.start_date)
            .with_context(|| format!("holiday {:?}: bad startDate", self.name))?;
        let end = parse_date(&self.end_date)
            .with_context(|| format!("holiday {:?}: bad endDate", self.name))?;

        if start > end {
            warn!(
                start = %self.start_date,
                end = %self.end_date,
                "holiday range is inverted and covers no dates"
            );
        }

        for raw in &self.tx_date_list {
            let tx = parse_date(raw)
                .with_context(|| format!("holiday {:?}: bad txDateList entry", self.name))?;
            if start <= tx && tx <= end {
                warn!(
                    tx = %raw,
                    "compensatory workday falls inside its own holiday range"
                );
            }
        }

        Ok(())
    }

    /// Inclusive list of canonical dates covered by the range.
    pub fn dates(&self) -> anyhow::Result<Vec<String>> {
        enumerate_dates(&self.start_date, &self.end_date)
            .with_context(|| format!("failed to expand holiday {:?}", self.name))
    }
}

/// Directory of static per-year datasets named `<year>.json`.
#[derive(Debug)]
pub struct HolidayStore {
    pub data_dir: PathBuf,
}

impl HolidayStore {
    /// A missing directory is not fatal: every year is then empty and the
    /// calendar falls back to plain weekends.
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        if data_dir.exists() && !data_dir.is_dir() {
            return Err(anyhow!("holiday data path is not a directory: {}", data_dir.display()));
        }
        if !data_dir.exists() {
            warn!(data_dir = %data_dir.display(), "holiday data directory does not exist");
        }

        info!(data_dir = %data_dir.display(), "opened holiday store");
        Ok(Self {
            data_dir: data_dir.to_path_buf(),
        })
    }

    pub fn year_path(&self, year: i32) -> PathBuf {
        self.data_dir.join(format!("{year}.json"))
    }

    /// Years with a dataset file, ascending.
    #[tracing::instrument(skip(self))]
    pub fn available_years(&self) -> anyhow::Result<Vec<i32>> {
        let mut years = Vec::new();
        if !self.data_dir.is_dir() {
            return Ok(years);
        }
        let entries = fs::read_dir(&self.data_dir)
            .with_context(|| format!("failed reading {}", self.data_dir.display()))?;

        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(year) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<i32>().ok())
            {
                years.push(year);
            }
        }

        years.sort_unstable();
        debug!(?years, "scanned dataset years");
        Ok(years)
    }

    /// Loads and validates one year. A missing file is an empty year, not
    /// an error.
    #[tracing::instrument(skip(self))]
    pub fn load_year(&self, year: i32) -> anyhow::Result<Vec<Holiday>> {
        let path = self.year_path(year);
        if !path.exists() {
            debug!(file = %path.display(), "no holiday dataset for year");
            return Ok(Vec::new());
        }
        load_dataset(&path)
    }

    /// Loads `year` and its neighbours so ranges and tx days that spill
    /// across a year boundary still show up.
    #[tracing::instrument(skip(self))]
    pub fn load_around(&self, year: i32) -> anyhow::Result<Vec<Holiday>> {
        let mut out = Vec::new();
        for y in [year.saturating_sub(1), year, year.saturating_add(1)] {
            out.extend(self.load_year(y)?);
        }
        Ok(out)
    }
}

#[tracing::instrument(skip(path))]
pub fn load_dataset(path: &Path) -> anyhow::Result<Vec<Holiday>> {
    debug!(file = %path.display(), "loading holiday dataset");
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading {}", path.display()))?;
    let holidays = parse_dataset(&raw)
        .with_context(|| format!("failed parsing {}", path.display()))?;
    info!(file = %path.display(), count = holidays.len(), "loaded holidays");
    Ok(holidays)
}

pub fn parse_dataset(raw: &str) -> anyhow::Result<Vec<Holiday>> {
    let holidays: Vec<Holiday> = serde_json::from_str(raw)?;
    for (idx, holiday) in holidays.iter().enumerate() {
        holiday
            .validate()
            .with_context(|| format!("record {}", idx + 1))?;
    }
    Ok(holidays)
}
