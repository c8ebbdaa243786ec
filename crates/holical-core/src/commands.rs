use anyhow::{Context, anyhow};
use chrono::Datelike;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::cli::{Command, MonthArgs, YearArgs};
use crate::config::Config;
use crate::datetime::Clock;
use crate::grid::{HolidayIndex, MonthGrid, TitleParts, build_grid_with_index};
use crate::holiday::HolidayStore;
use crate::i18n::Language;
use crate::render::Renderer;
use crate::stats::{MonthStats, countdown};

/// Everything a command needs, resolved once per invocation.
pub struct Session<'a> {
    pub store: &'a HolidayStore,
    pub cfg: &'a Config,
    pub renderer: &'a Renderer,
    pub clock: Clock,
    pub language: Language,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct MonthView<'a> {
    title: String,
    #[serde(flatten)]
    grid: &'a MonthGrid,
}

#[derive(Debug, Serialize)]
struct StatsView {
    year: i32,
    month: u32,
    #[serde(flatten)]
    stats: MonthStats,
}

#[instrument(skip(session, command))]
pub fn dispatch(session: &Session<'_>, command: Option<Command>) -> anyhow::Result<()> {
    let command = command.unwrap_or_else(|| Command::Month(MonthArgs::default()));
    debug!(?command, "dispatching command");

    match command {
        Command::Month(args) => cmd_month(session, &args),
        Command::Stats(args) => cmd_stats(session, &args),
        Command::Next => cmd_next(session),
        Command::List(args) => cmd_list(session, &args),
        Command::Check(args) => cmd_check(session, &args),
        Command::Show => cmd_show(session),
    }
}

fn month_index(session: &Session<'_>, year: i32) -> anyhow::Result<HolidayIndex> {
    let holidays = session.store.load_around(year)?;
    HolidayIndex::build(&holidays)
        .with_context(|| format!("failed to index holidays around {year}"))
}

#[instrument(skip(session, args))]
fn cmd_month(session: &Session<'_>, args: &MonthArgs) -> anyhow::Result<()> {
    let today = session.clock.today();
    let (year, month) = args.resolve(today);
    info!(year, month = month + 1, "command month");

    let index = month_index(session, year)?;
    let grid = build_grid_with_index(year, month, &index, today)?;

    if session.json {
        let view = MonthView {
            title: session.language.title(grid.title_parts()),
            grid: &grid,
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    session.renderer.print_month(&grid)
}

#[instrument(skip(session, args))]
fn cmd_stats(session: &Session<'_>, args: &MonthArgs) -> anyhow::Result<()> {
    let (year, month) = args.resolve(session.clock.today());
    info!(year, month = month + 1, "command stats");

    let index = month_index(session, year)?;
    let stats = MonthStats::compute(year, month, &index)?;

    if session.json {
        let view = StatsView {
            year,
            month: month + 1,
            stats,
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    session.renderer.print_stats(
        TitleParts {
            year,
            month: month + 1,
        },
        &stats,
    )
}

#[instrument(skip(session))]
fn cmd_next(session: &Session<'_>) -> anyhow::Result<()> {
    let now = session.clock.now();
    let year = now.year();
    let mut holidays = session.store.load_year(year)?;
    holidays.extend(session.store.load_year(year.saturating_add(1))?);

    let left = countdown(&holidays, now)?;
    if session.json {
        println!("{}", serde_json::to_string_pretty(&left)?);
        return Ok(());
    }
    session.renderer.print_countdown(&left)
}

#[instrument(skip(session, args))]
fn cmd_list(session: &Session<'_>, args: &YearArgs) -> anyhow::Result<()> {
    let year = args.year.unwrap_or_else(|| session.clock.today().year());
    let holidays = session.store.load_year(year)?;

    if session.json {
        println!("{}", serde_json::to_string_pretty(&holidays)?);
        return Ok(());
    }
    session.renderer.print_holiday_table(&holidays)
}

#[instrument(skip(session, args))]
fn cmd_check(session: &Session<'_>, args: &YearArgs) -> anyhow::Result<()> {
    let years = match args.year {
        Some(year) => vec![year],
        None => session.store.available_years()?,
    };
    if years.is_empty() {
        return Err(anyhow!(
            "no holiday datasets found in {}",
            session.store.data_dir.display()
        ));
    }

    for year in years {
        let path = session.store.year_path(year);
        if !path.exists() {
            return Err(anyhow!("missing dataset {}", path.display()));
        }
        let holidays = session.store.load_year(year)?;
        HolidayIndex::build(&holidays)?;
        println!("{}: {} holidays ok", path.display(), holidays.len());
    }
    Ok(())
}

fn cmd_show(session: &Session<'_>) -> anyhow::Result<()> {
    let mut entries: Vec<_> = session.cfg.iter().collect();
    entries.sort();
    for (key, value) in entries {
        println!("{key}={value}");
    }
    for file in &session.cfg.loaded_files {
        println!("# loaded {}", file.display());
    }
    match session.clock.timezone() {
        Some(tz) => println!("# timezone {tz}"),
        None => println!("# timezone host-local"),
    }
    Ok(())
}
