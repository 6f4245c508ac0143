// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use fern::colors::{Color, ColoredLevelConfig};

/// Main entry function
///
/// We initialize the fern logger here, create a Clap command line
/// parser and hand over to the batch driver.
fn main() -> anyhow::Result<()> {
  let app = pixelfix_lib::app::create_app();
  let matches = app.try_get_matches().unwrap_or_else(|e| e.exit());

  let colors = ColoredLevelConfig::new().debug(Color::Magenta);
  fern::Dispatch::new()
    .chain(std::io::stderr())
    .level({
      if matches.get_flag("verbose") {
        log::LevelFilter::Debug
      } else {
        log::LevelFilter::Info
      }
    })
    .format(move |out, message, record| {
      out.finish(format_args!(
        "[{:6}][{}] {} ({}:{})",
        colors.color(record.level()),
        record.target(),
        message,
        record.file().unwrap_or("<undefined>"),
        record.line().unwrap_or(0)
      ))
    })
    .apply()
    .expect("Invalid fern configuration, exiting");

  pixelfix_lib::fixbadpix::fixbadpix(&matches)?;
  Ok(())
}
