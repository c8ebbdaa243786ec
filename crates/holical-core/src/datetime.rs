use std::fs;
use std::path::{
  Path,
  PathBuf
};

use chrono::{
  Local,
  NaiveDate,
  NaiveDateTime,
  Utc
};
use chrono_tz::Tz;
use serde::Deserialize;

const TIMEZONE_CONFIG_FILE: &str =
  "holical-time.toml";
const TIMEZONE_ENV_VAR: &str =
  "HOLICAL_TIMEZONE";
const TIMEZONE_CONFIG_ENV_VAR: &str =
  "HOLICAL_TIME_CONFIG";

#[derive(Debug, Deserialize)]
struct TimezoneConfig {
  timezone: Option<String>,
  time:     Option<TimezoneSection>
}

#[derive(Debug, Deserialize)]
struct TimezoneSection {
  timezone: Option<String>
}

/// Source of the reference "now". Reads
/// the host-local wall clock unless a
/// timezone was configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct Clock {
  timezone: Option<Tz>
}

impl Clock {
  #[must_use]
  pub fn local() -> Self {
    Self { timezone: None }
  }

  #[must_use]
  pub fn in_timezone(tz: Tz) -> Self {
    Self { timezone: Some(tz) }
  }

  /// Env var, then the config value,
  /// then `holical-time.toml`; host
  /// local time when none is usable.
  #[tracing::instrument]
  pub fn resolve(
    configured: Option<&str>
  ) -> Self {
    let from_env =
      std::env::var(TIMEZONE_ENV_VAR).ok();
    Self::resolve_from(
      from_env.as_deref(),
      configured,
      timezone_config_path().as_deref()
    )
  }

  /// Same order as [`Clock::resolve`]
  /// with every source passed in.
  pub fn resolve_from(
    from_env: Option<&str>,
    configured: Option<&str>,
    config_file: Option<&Path>
  ) -> Self {
    if let Some(raw) = from_env
      && let Some(tz) = parse_timezone(
        raw,
        TIMEZONE_ENV_VAR
      )
    {
      return Self::in_timezone(tz);
    }

    if let Some(raw) = configured
      && let Some(tz) =
        parse_timezone(raw, "config")
    {
      return Self::in_timezone(tz);
    }

    if let Some(path) = config_file
      && let Some(tz) =
        load_timezone_from_file(path)
    {
      return Self::in_timezone(tz);
    }

    tracing::debug!(
      "no timezone configured; using \
       host local time"
    );
    Self::local()
  }

  pub fn timezone(&self) -> Option<Tz> {
    self.timezone
  }

  pub fn now(&self) -> NaiveDateTime {
    match self.timezone {
      | Some(tz) => {
        Utc::now()
          .with_timezone(&tz)
          .naive_local()
      }
      | None => Local::now().naive_local()
    }
  }

  pub fn today(&self) -> NaiveDate {
    self.now().date()
  }
}

fn timezone_config_path()
-> Option<PathBuf> {
  if let Ok(raw) = std::env::var(
    TIMEZONE_CONFIG_ENV_VAR
  ) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(
        trimmed
      ));
    }
  }

  std::env::current_dir().ok().map(
    |dir| {
      dir.join(TIMEZONE_CONFIG_FILE)
    }
  )
}

fn load_timezone_from_file(
  path: &Path
) -> Option<Tz> {
  if !path.exists() {
    tracing::trace!(
      file = %path.display(),
      "timezone config file not found"
    );
    return None;
  }

  let raw = match fs::read_to_string(
    path
  ) {
    | Ok(raw) => raw,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed reading timezone config file"
      );
      return None;
    }
  };

  let parsed = match toml::from_str::<
    TimezoneConfig
  >(&raw)
  {
    | Ok(parsed) => parsed,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed parsing timezone config file"
      );
      return None;
    }
  };

  let timezone =
    parsed.timezone.or_else(|| {
      parsed.time.and_then(|section| {
        section.timezone
      })
    });
  let Some(timezone) = timezone else {
    tracing::warn!(
      file = %path.display(),
      "timezone config had no timezone field"
    );
    return None;
  };

  parse_timezone(
    timezone.as_str(),
    &format!("file:{}", path.display())
  )
}

fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::info!(
        source,
        timezone = %trimmed,
        "using configured timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use std::fs;

  use super::{
    Clock,
    TIMEZONE_ENV_VAR,
    load_timezone_from_file,
    parse_timezone
  };

  #[test]
  fn parses_known_timezone() {
    assert_eq!(
      parse_timezone(
        " Asia/Shanghai ",
        "test"
      ),
      Some(chrono_tz::Asia::Shanghai)
    );
    assert!(
      parse_timezone("Mars/Base", "test")
        .is_none()
    );
    assert!(
      parse_timezone("  ", "test")
        .is_none()
    );
  }

  #[test]
  fn reads_nested_time_section() {
    let dir = tempfile::tempdir()
      .expect("tempdir");
    let path =
      dir.path().join("holical-time.toml");
    fs::write(
      &path,
      "[time]\ntimezone = \
       \"Asia/Shanghai\"\n"
    )
    .expect("write");
    assert_eq!(
      load_timezone_from_file(&path),
      Some(chrono_tz::Asia::Shanghai)
    );
  }

  #[test]
  fn missing_file_yields_none() {
    let dir = tempfile::tempdir()
      .expect("tempdir");
    assert!(
      load_timezone_from_file(
        &dir.path().join("absent.toml")
      )
      .is_none()
    );
  }

  #[test]
  fn configured_zone_is_used() {
    let clock = Clock::resolve_from(
      None,
      Some("Asia/Tokyo"),
      None
    );
    assert_eq!(
      clock.timezone(),
      Some(chrono_tz::Asia::Tokyo)
    );

    if std::env::var(TIMEZONE_ENV_VAR)
      .is_err()
    {
      assert_eq!(
        Clock::resolve(Some("Asia/Tokyo"))
          .timezone(),
        Some(chrono_tz::Asia::Tokyo)
      );
    }
  }

  #[test]
  fn unparsable_zone_falls_back_to_host_local()
  {
    let dir = tempfile::tempdir()
      .expect("tempdir");
    let clock = Clock::resolve_from(
      Some("Nowhere/Else"),
      Some("Mars/Base"),
      Some(
        dir
          .path()
          .join("absent.toml")
          .as_path()
      )
    );
    assert!(clock.timezone().is_none());
  }

  #[test]
  fn resolution_order_env_config_file() {
    let dir = tempfile::tempdir()
      .expect("tempdir");
    let path =
      dir.path().join("holical-time.toml");
    fs::write(
      &path,
      "timezone = \"Europe/Berlin\"\n"
    )
    .expect("write");

    let from_file = Clock::resolve_from(
      None,
      None,
      Some(path.as_path())
    );
    assert_eq!(
      from_file.timezone(),
      Some(chrono_tz::Europe::Berlin)
    );

    let from_config = Clock::resolve_from(
      None,
      Some("Asia/Tokyo"),
      Some(path.as_path())
    );
    assert_eq!(
      from_config.timezone(),
      Some(chrono_tz::Asia::Tokyo)
    );

    let from_env = Clock::resolve_from(
      Some("Asia/Shanghai"),
      Some("Asia/Tokyo"),
      Some(path.as_path())
    );
    assert_eq!(
      from_env.timezone(),
      Some(chrono_tz::Asia::Shanghai)
    );
  }

  #[test]
  fn zoned_clock_reports_its_zone() {
    let clock = Clock::in_timezone(
      chrono_tz::Asia::Shanghai
    );
    assert_eq!(
      clock.timezone(),
      Some(chrono_tz::Asia::Shanghai)
    );
    assert!(
      Clock::local().timezone().is_none()
    );
  }
}
