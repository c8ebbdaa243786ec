//! Holiday-aware month calendar.
//!
//! [`grid::build_grid`] is the core: it lays out one month on a
//! Monday-first grid and classifies every day as today, holiday,
//! compensatory workday, weekend or normal. The remaining modules load the
//! holiday dataset, resolve configuration and drive the `holical` CLI.

pub mod cli;
pub mod commands;
pub mod config;
pub mod date_utils;
pub mod datetime;
pub mod grid;
pub mod holiday;
pub mod i18n;
pub mod render;
pub mod stats;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting holical"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.rc_file.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let language = cli
    .lang
    .or_else(|| cfg.get("language"))
    .unwrap_or_default();
  let language = if language.is_empty() {
    i18n::Language::default()
  } else {
    language.parse::<i18n::Language>()?
  };

  let theme = cli
    .theme
    .or_else(|| cfg.get("theme"))
    .unwrap_or_default();
  let theme = if theme.is_empty() {
    render::Theme::default()
  } else {
    theme.parse::<render::Theme>()?
  };

  let data_dir =
    config::resolve_data_dir(
      &cfg,
      cli.data.as_deref()
    );
  let store =
    holiday::HolidayStore::open(
      &data_dir
    )
    .with_context(|| {
      format!(
        "failed to open holiday data \
         at {}",
        data_dir.display()
      )
    })?;

  let clock = datetime::Clock::resolve(
    cfg.get("timezone").as_deref()
  );
  let renderer = render::Renderer::new(
    &cfg, language, theme
  )?;

  let session = commands::Session {
    store: &store,
    cfg: &cfg,
    renderer: &renderer,
    clock,
    language,
    json: cli.json
  };
  commands::dispatch(
    &session,
    cli.command
  )?;

  info!("done");
  Ok(())
}
