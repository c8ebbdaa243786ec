use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use chrono::{Datelike, NaiveDate};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::date_utils::shift_month;

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "holical",
    version,
    about = "Month calendar with public holidays and compensatory workdays",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "rc-file", global = true)]
    pub rc_file: Option<PathBuf>,

    /// Directory holding `<year>.json` holiday datasets.
    #[arg(long = "data", global = true)]
    pub data: Option<PathBuf>,

    /// Display language: zh or en.
    #[arg(long = "lang", global = true)]
    pub lang: Option<String>,

    /// Colour theme: light or dark.
    #[arg(long = "theme", global = true)]
    pub theme: Option<String>,

    /// Print machine-readable JSON instead of text.
    #[arg(long = "json", global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Render one month (default).
    Month(MonthArgs),
    /// Day counts for one month.
    Stats(MonthArgs),
    /// Countdown to the next holiday.
    Next,
    /// Holidays of one dataset year.
    List(YearArgs),
    /// Validate one dataset year.
    Check(YearArgs),
    /// Print the effective configuration.
    Show,
}

#[derive(Args, Debug, Clone, Default)]
pub struct MonthArgs {
    #[arg(long)]
    pub year: Option<i32>,

    /// Calendar month, 1-12.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,

    /// Months to move from the selected month, e.g. -1 or 3.
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub offset: i32,
}

impl MonthArgs {
    /// The (year, zero-based month) this invocation points at.
    pub fn resolve(&self, today: NaiveDate) -> (i32, u32) {
        let year = self.year.unwrap_or_else(|| today.year());
        let month = self
            .month
            .map(|m| m - 1)
            .unwrap_or_else(|| today.month0());
        shift_month(year, month, self.offset)
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct YearArgs {
    #[arg(long)]
    pub year: Option<i32>,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Pulls positional `rc.key=value` / `rc.key:value` overrides out of the
/// argument list before clap sees it.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> anyhow::Result<PreprocessedArgs> {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    for arg in iter {
        let s = arg.to_string_lossy();
        if let Some(rest) = s.strip_prefix("rc.") {
            let parsed = if let Some((k, v)) = rest.split_once('=') {
                Some((format!("rc.{k}"), v.to_string()))
            } else if let Some((k, v)) = rest.split_once(':') {
                Some((format!("rc.{k}"), v.to_string()))
            } else {
                None
            };

            if let Some((k, v)) = parsed {
                debug!(key = %k, value = %v, "captured positional rc override");
                overrides.push((k, v));
                continue;
            }
        }

        cleaned.push(arg);
    }

    Ok(PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    })
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use chrono::NaiveDate;
    use clap::Parser;

    use super::{Command, GlobalCli, MonthArgs, preprocess_args};

    fn args(raw: &[&str]) -> Vec<OsString> {
        raw.iter().map(OsString::from).collect()
    }

    #[test]
    fn extracts_positional_rc_overrides() {
        let pre = preprocess_args(&args(&["holical", "rc.language=en", "month", "rc.theme:dark"]))
            .expect("preprocess");
        assert_eq!(pre.cleaned_args, args(&["holical", "month"]));
        assert_eq!(
            pre.rc_overrides,
            vec![
                ("rc.language".to_string(), "en".to_string()),
                ("rc.theme".to_string(), "dark".to_string()),
            ]
        );
    }

    #[test]
    fn parses_month_subcommand() {
        let cli = GlobalCli::try_parse_from(args(&[
            "holical", "--lang", "en", "month", "--year", "2025", "--month", "10", "--offset", "-1",
        ]))
        .expect("parse");
        assert_eq!(cli.lang.as_deref(), Some("en"));
        let Some(Command::Month(month)) = cli.command else {
            panic!("expected month command");
        };
        let today = NaiveDate::from_ymd_opt(2026, 1, 15).expect("date");
        assert_eq!(month.resolve(today), (2025, 8));
    }

    #[test]
    fn rejects_month_out_of_range() {
        assert!(GlobalCli::try_parse_from(args(&["holical", "month", "--month", "13"])).is_err());
    }

    #[test]
    fn defaults_to_current_month() {
        let today = NaiveDate::from_ymd_opt(2025, 12, 3).expect("date");
        assert_eq!(MonthArgs::default().resolve(today), (2025, 11));
        let next = MonthArgs {
            offset: 1,
            ..MonthArgs::default()
        };
        assert_eq!(next.resolve(today), (2026, 0));
    }
}
