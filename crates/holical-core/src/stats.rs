use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::Serialize;

use crate::date_utils::{date_from_parts, days_in_month, parse_date};
use crate::grid::HolidayIndex;
use crate::holiday::Holiday;

/// Hour at which the working day ends when no holiday is upcoming.
pub const END_OF_WORKDAY_HOUR: u32 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthStats {
    pub total_days: u32,
    pub weekend_days: u32,
    pub holiday_days: u32,
    pub tx_days: u32,
    pub work_days: u32,
}

impl MonthStats {
    /// Counts are taken from the underlying day facts, so today's date is
    /// counted under whatever it would otherwise be.
    #[tracing::instrument(skip(index))]
    pub fn compute(year: i32, month: u32, index: &HolidayIndex) -> anyhow::Result<Self> {
        let total_days = days_in_month(year, month)?;
        let mut stats = Self {
            total_days,
            weekend_days: 0,
            holiday_days: 0,
            tx_days: 0,
            work_days: 0,
        };

        for day in 1..=total_days {
            let date = date_from_parts(year, month, day)?;
            // Today is irrelevant for counting.
            let facts = index.facts(date, NaiveDate::MIN);

            if facts.is_weekend {
                stats.weekend_days += 1;
            }
            if facts.in_holiday {
                stats.holiday_days += 1;
            }
            if facts.in_tx {
                stats.tx_days += 1;
            }
            if facts.in_tx || (!facts.in_holiday && !facts.is_weekend) {
                stats.work_days += 1;
            }
        }

        tracing::debug!(?stats, "computed month stats");
        Ok(stats)
    }
}

/// The earliest holiday starting strictly after `today`.
pub fn next_holiday(holidays: &[Holiday], today: NaiveDate) -> anyhow::Result<Option<&Holiday>> {
    let mut best: Option<(NaiveDate, &Holiday)> = None;
    for holiday in holidays {
        let start = parse_date(&holiday.start_date)?;
        if start <= today {
            continue;
        }
        if best.is_none_or(|(current, _)| start < current) {
            best = Some((start, holiday));
        }
    }
    Ok(best.map(|(_, holiday)| holiday))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Countdown {
    Holiday { name: String, days: i64, hours: i64 },
    EndOfWorkday { hours: i64, minutes: i64 },
}

/// Time left until the next holiday starts, or until the end of today's
/// working hours when the dataset has nothing upcoming.
pub fn countdown(holidays: &[Holiday], now: NaiveDateTime) -> anyhow::Result<Countdown> {
    if let Some(holiday) = next_holiday(holidays, now.date())? {
        let start = parse_date(&holiday.start_date)?.and_time(NaiveTime::MIN);
        let left = start - now;
        return Ok(Countdown::Holiday {
            name: holiday.name.clone(),
            days: left.num_days(),
            hours: left.num_hours() % 24,
        });
    }

    let end_of_day = now.date().and_time(
        NaiveTime::from_hms_opt(END_OF_WORKDAY_HOUR, 0, 0).unwrap_or(NaiveTime::MIN),
    );
    let left = (end_of_day - now).max(TimeDelta::zero());
    Ok(Countdown::EndOfWorkday {
        hours: left.num_hours(),
        minutes: left.num_minutes() % 60,
    })
}
