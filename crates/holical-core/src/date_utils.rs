//! Gregorian date primitives shared by
//! the grid builder and the statistics.
//!
//! Months are zero-based (0 = January)
//! at this boundary. Dates are compared
//! through their canonical `YYYY-MM-DD`
//! form produced by [`format_date`].

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  Datelike,
  Duration,
  NaiveDate,
  Weekday
};

pub const ISO_DATE_FORMAT: &str =
  "%Y-%m-%d";

/// Builds a date from a zero-based
/// month and a 1-based day.
pub fn date_from_parts(
  year: i32,
  month: u32,
  day: u32
) -> anyhow::Result<NaiveDate> {
  if month > 11 {
    return Err(anyhow!(
      "month index out of range \
       (expected 0-11): {month}"
    ));
  }
  NaiveDate::from_ymd_opt(
    year,
    month + 1,
    day
  )
  .ok_or_else(|| {
    anyhow!(
      "invalid calendar date: \
       {year}-{:02}-{day:02}",
      month + 1
    )
  })
}

/// Number of days in the zero-based
/// `month` of `year`: the day before the
/// first of the following month.
pub fn days_in_month(
  year: i32,
  month: u32
) -> anyhow::Result<u32> {
  date_from_parts(year, month, 1)?;
  let (next_year, next_month) =
    shift_month(year, month, 1);
  let first_of_next = date_from_parts(
    next_year, next_month, 1
  )
  .with_context(|| {
    format!(
      "failed to resolve month after \
       {year}/{month}"
    )
  })?;
  let last = first_of_next
    .pred_opt()
    .ok_or_else(|| {
      anyhow!(
        "date underflow before \
         {first_of_next}"
      )
    })?;
  Ok(last.day())
}

/// Weekday of the 1st of the month on a
/// Monday-first scale: 1 = Monday ..
/// 7 = Sunday.
pub fn first_weekday_of_month(
  year: i32,
  month: u32
) -> anyhow::Result<u32> {
  let first =
    date_from_parts(year, month, 1)?;
  Ok(monday_first_weekday(
    first.weekday()
  ))
}

/// Remaps the Sunday-first index (Sunday
/// = 0) onto 1..=7 with Sunday last.
pub fn monday_first_weekday(
  weekday: Weekday
) -> u32 {
  match weekday.num_days_from_sunday()
  {
    | 0 => 7,
    | other => other
  }
}

pub fn is_weekend(
  date: NaiveDate
) -> bool {
  matches!(
    date.weekday(),
    Weekday::Sat | Weekday::Sun
  )
}

#[must_use]
pub fn format_date(
  date: NaiveDate
) -> String {
  date
    .format(ISO_DATE_FORMAT)
    .to_string()
}

pub fn parse_date(
  raw: &str
) -> anyhow::Result<NaiveDate> {
  NaiveDate::parse_from_str(
    raw.trim(),
    ISO_DATE_FORMAT
  )
  .with_context(|| {
    format!(
      "invalid date (expected \
       YYYY-MM-DD): {raw:?}"
    )
  })
}

/// Every date from `start` to `end`
/// inclusive, in canonical form. An
/// inverted range yields no dates.
#[tracing::instrument]
pub fn enumerate_dates(
  start: &str,
  end: &str
) -> anyhow::Result<Vec<String>> {
  let start = parse_date(start)?;
  let end = parse_date(end)?;

  if start > end {
    tracing::debug!(
      %start,
      %end,
      "inverted date range; \
       enumerating nothing"
    );
    return Ok(Vec::new());
  }

  let span =
    (end - start).num_days() as usize;
  let mut out =
    Vec::with_capacity(span + 1);
  let mut current = start;
  while current <= end {
    out.push(format_date(current));
    current = match current
      .checked_add_signed(
        Duration::days(1)
      ) {
      | Some(next) => next,
      | None => break
    };
  }

  Ok(out)
}

/// Moves a (year, zero-based month) pair
/// by `delta` months, carrying the year.
#[must_use]
pub fn shift_month(
  year: i32,
  month: u32,
  delta: i32
) -> (i32, u32) {
  let absolute = i64::from(year) * 12
    + i64::from(month)
    + i64::from(delta);
  let year =
    absolute.div_euclid(12) as i32;
  let month =
    absolute.rem_euclid(12) as u32;
  (year, month)
}

#[cfg(test)]
mod tests {
  use chrono::{
    Datelike,
    NaiveDate
  };

  use super::{
    date_from_parts,
    days_in_month,
    enumerate_dates,
    first_weekday_of_month,
    format_date,
    is_weekend,
    parse_date,
    shift_month
  };

  #[test]
  fn days_in_month_handles_leap_years() {
    assert_eq!(
      days_in_month(2024, 1)
        .expect("feb 2024"),
      29
    );
    assert_eq!(
      days_in_month(2025, 1)
        .expect("feb 2025"),
      28
    );
    assert_eq!(
      days_in_month(1900, 1)
        .expect("feb 1900"),
      28
    );
    assert_eq!(
      days_in_month(2000, 1)
        .expect("feb 2000"),
      29
    );
    assert_eq!(
      days_in_month(2025, 11)
        .expect("dec 2025"),
      31
    );
    assert_eq!(
      days_in_month(2025, 3)
        .expect("apr 2025"),
      30
    );
  }

  #[test]
  fn january_2025_starts_on_wednesday()
  {
    assert_eq!(
      first_weekday_of_month(2025, 0)
        .expect("jan 2025"),
      3
    );
  }

  #[test]
  fn sunday_maps_to_seven() {
    // June 2025 starts on a Sunday.
    assert_eq!(
      first_weekday_of_month(2025, 5)
        .expect("jun 2025"),
      7
    );
    // September 2025 starts on a Monday.
    assert_eq!(
      first_weekday_of_month(2025, 8)
        .expect("sep 2025"),
      1
    );
  }

  #[test]
  fn single_day_range_yields_one_date() {
    let dates = enumerate_dates(
      "2025-03-05",
      "2025-03-05"
    )
    .expect("enumerate");
    assert_eq!(dates, vec![
      "2025-03-05".to_string()
    ]);
  }

  #[test]
  fn inverted_range_is_empty() {
    let dates = enumerate_dates(
      "2025-03-05",
      "2025-03-01"
    )
    .expect("enumerate");
    assert!(dates.is_empty());
  }

  #[test]
  fn range_crosses_month_and_year() {
    let dates = enumerate_dates(
      "2025-12-30",
      "2026-01-02"
    )
    .expect("enumerate");
    assert_eq!(dates, vec![
      "2025-12-30",
      "2025-12-31",
      "2026-01-01",
      "2026-01-02"
    ]);
  }

  #[test]
  fn malformed_date_is_an_error() {
    assert!(
      enumerate_dates(
        "2025-13-01",
        "2025-12-31"
      )
      .is_err()
    );
    assert!(parse_date("tomorrow").is_err());
  }

  #[test]
  fn format_pads_month_and_day() {
    let date = date_from_parts(2025, 2, 5)
      .expect("date");
    assert_eq!(
      format_date(date),
      "2025-03-05"
    );
  }

  #[test]
  fn format_then_parse_round_trips() {
    let mut date =
      NaiveDate::from_ymd_opt(2024, 1, 1)
        .expect("start");
    let end =
      NaiveDate::from_ymd_opt(2026, 1, 1)
        .expect("end");
    while date < end {
      let parsed =
        parse_date(&format_date(date))
          .expect("reparse");
      assert_eq!(parsed, date);
      date = date
        .succ_opt()
        .expect("next day");
    }
  }

  #[test]
  fn month_index_out_of_range_is_rejected()
  {
    assert!(
      date_from_parts(2025, 12, 1)
        .is_err()
    );
    for month in [12, 13, 24, 100] {
      assert!(
        days_in_month(2025, month)
          .is_err(),
        "month index {month}"
      );
    }
    assert!(
      first_weekday_of_month(2025, 12)
        .is_err()
    );
  }

  #[test]
  fn weekend_detection() {
    let saturday =
      NaiveDate::from_ymd_opt(2025, 10, 11)
        .expect("date");
    assert_eq!(
      saturday.weekday(),
      chrono::Weekday::Sat
    );
    assert!(is_weekend(saturday));
    assert!(!is_weekend(
      saturday
        .succ_opt()
        .and_then(|d| d.succ_opt())
        .expect("monday")
    ));
  }

  #[test]
  fn shift_month_carries_year() {
    assert_eq!(
      shift_month(2025, 11, 1),
      (2026, 0)
    );
    assert_eq!(
      shift_month(2025, 0, -1),
      (2024, 11)
    );
    assert_eq!(
      shift_month(2025, 5, -18),
      (2023, 11)
    );
    assert_eq!(
      shift_month(2025, 5, 0),
      (2025, 5)
    );
  }
}
