//! Month grid layout and per-day
//! classification.
//!
//! A day gets exactly one [`DayClass`],
//! taken from the first rule in
//! [`PRECEDENCE`] that matches its
//! [`DayFacts`].

use std::collections::HashSet;

use anyhow::Context;
use chrono::{
  Datelike,
  NaiveDate
};
use serde::Serialize;

use crate::date_utils::{
  date_from_parts,
  days_in_month,
  first_weekday_of_month,
  format_date,
  is_weekend,
  monday_first_weekday,
  parse_date
};
use crate::holiday::Holiday;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize
)]
#[serde(rename_all = "snake_case")]
pub enum DayClass {
  Today,
  Holiday,
  CompensatoryWorkday,
  Weekend,
  Normal
}

/// Everything the classifier needs to
/// know about one date.
#[derive(
  Debug,
  Clone,
  Copy,
  Default
)]
pub struct DayFacts {
  pub is_today:   bool,
  pub in_holiday: bool,
  pub in_tx:      bool,
  pub is_weekend: bool
}

type Rule = (DayClass, fn(&DayFacts) -> bool);

/// Highest priority first. `Normal`
/// is the fallback when nothing matches.
pub const PRECEDENCE: [Rule; 4] = [
  (DayClass::Today, |f| f.is_today),
  (DayClass::Holiday, |f| {
    f.in_holiday
  }),
  (
    DayClass::CompensatoryWorkday,
    |f| f.in_tx
  ),
  (DayClass::Weekend, |f| {
    f.is_weekend
  })
];

#[must_use]
pub fn classify(
  facts: &DayFacts
) -> DayClass {
  PRECEDENCE
    .iter()
    .find(|(_, applies)| applies(facts))
    .map(|(class, _)| *class)
    .unwrap_or(DayClass::Normal)
}

/// Canonical-key sets for holiday and
/// compensatory dates. Build once per
/// dataset; lookups are O(1) on average.
#[derive(Debug, Clone, Default)]
pub struct HolidayIndex {
  holiday_dates: HashSet<String>,
  tx_dates:      HashSet<String>
}

impl HolidayIndex {
  #[tracing::instrument(skip_all, fields(count = holidays.len()))]
  pub fn build(
    holidays: &[Holiday]
  ) -> anyhow::Result<Self> {
    let mut index = Self::default();

    for holiday in holidays {
      index
        .holiday_dates
        .extend(holiday.dates()?);

      for raw in &holiday.tx_date_list {
        let tx = parse_date(raw)
          .with_context(|| {
            format!(
              "holiday {:?}: bad \
               compensatory date",
              holiday.name
            )
          })?;
        index
          .tx_dates
          .insert(format_date(tx));
      }
    }

    tracing::debug!(
      holiday_dates =
        index.holiday_dates.len(),
      tx_dates = index.tx_dates.len(),
      "built holiday index"
    );
    Ok(index)
  }

  pub fn is_holiday(
    &self,
    iso_date: &str
  ) -> bool {
    self
      .holiday_dates
      .contains(iso_date)
  }

  pub fn is_compensatory(
    &self,
    iso_date: &str
  ) -> bool {
    self.tx_dates.contains(iso_date)
  }

  pub fn facts(
    &self,
    date: NaiveDate,
    today: NaiveDate
  ) -> DayFacts {
    let iso = format_date(date);
    DayFacts {
      is_today:   date == today,
      in_holiday: self.is_holiday(&iso),
      in_tx:      self
        .is_compensatory(&iso),
      is_weekend: is_weekend(date)
    }
  }
}

#[derive(Debug, Clone, Copy)]
pub struct CalendarRequest<'a> {
  pub year:     i32,
  /// Zero-based, 0..=11.
  pub month:    u32,
  pub holidays: &'a [Holiday]
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize
)]
pub struct DayCell {
  pub day_number:     u32,
  pub iso_date:       String,
  /// 1 = Monday .. 7 = Sunday.
  pub weekday:        u32,
  pub classification: DayClass
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize
)]
pub struct TitleParts {
  pub year:  i32,
  /// 1-based for display.
  pub month: u32
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize
)]
pub struct MonthGrid {
  pub year:                i32,
  /// Zero-based.
  pub month:               u32,
  pub leading_blank_count: u32,
  pub days:                Vec<DayCell>
}

impl MonthGrid {
  pub fn title_parts(
    &self
  ) -> TitleParts {
    TitleParts {
      year:  self.year,
      month: self.month + 1
    }
  }

  /// Rows of seven Monday-first slots,
  /// `None` for blanks before the 1st and
  /// after the last day.
  pub fn weeks(
    &self
  ) -> Vec<[Option<&DayCell>; 7]> {
    let mut slots: Vec<Option<&DayCell>> =
      Vec::with_capacity(42);
    slots.extend(
      (0..self.leading_blank_count)
        .map(|_| None)
    );
    slots.extend(
      self.days.iter().map(Some)
    );
    while slots.len() % 7 != 0 {
      slots.push(None);
    }

    slots
      .chunks(7)
      .map(|chunk| {
        let mut row = [None; 7];
        row.copy_from_slice(chunk);
        row
      })
      .collect()
  }
}

#[tracing::instrument(
  skip(request),
  fields(
    year = request.year,
    month = request.month
  )
)]
pub fn build_grid(
  request: &CalendarRequest<'_>,
  today: NaiveDate
) -> anyhow::Result<MonthGrid> {
  let index = HolidayIndex::build(
    request.holidays
  )?;
  build_grid_with_index(
    request.year,
    request.month,
    &index,
    today
  )
}

pub fn build_grid_with_index(
  year: i32,
  month: u32,
  index: &HolidayIndex,
  today: NaiveDate
) -> anyhow::Result<MonthGrid> {
  let first_weekday =
    first_weekday_of_month(year, month)?;
  let day_count =
    days_in_month(year, month)?;

  let mut days = Vec::with_capacity(
    day_count as usize
  );
  for day_number in 1..=day_count {
    let date = date_from_parts(
      year, month, day_number
    )?;
    let facts =
      index.facts(date, today);
    days.push(DayCell {
      day_number,
      iso_date: format_date(date),
      weekday: monday_first_weekday(
        date.weekday()
      ),
      classification: classify(&facts)
    });
  }

  tracing::debug!(
    year,
    month,
    leading_blanks = first_weekday - 1,
    days = days.len(),
    "built month grid"
  );

  Ok(MonthGrid {
    year,
    month,
    leading_blank_count: first_weekday
      - 1,
    days
  })
}
