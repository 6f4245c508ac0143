// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::path::PathBuf;
use std::str::FromStr;

use clap::builder::{NonEmptyStringValueParser, TypedValueParser};
use clap::{Arg, ArgAction, Command, crate_version, value_parser};
use log::debug;

use crate::badpix::PixelCoord;

pub fn create_app() -> Command {
  debug!("Creating CLAP app configuration");
  Command::new("pixelfix")
    .version(crate_version!())
    .author("Daniel V. <daniel@chaospixel.com>")
    .about("PixelFix - bad pixel correction metadata for DNG files")
    .arg(
      Arg::new("verbose")
        .short('v')
        .long("verbose")
        .action(ArgAction::SetTrue)
        .help("Print more messages"),
    )
    .arg(
      Arg::new("output")
        .short('o')
        .long("output-file")
        .value_name("PATH")
        .value_parser(value_parser!(PathBuf))
        .help("Output file, honored for a single input file only"),
    )
    .arg(
      Arg::new("pixel")
        .short('p')
        .long("pixel")
        .value_name("X,Y")
        .action(ArgAction::Append)
        .value_parser(PixelCoordParser)
        .help("Mark the pixel at X,Y as defective (repeatable)"),
    )
    .arg(
      Arg::new("column")
        .short('c')
        .long("column")
        .value_name("X")
        .action(ArgAction::Append)
        .value_parser(value_parser!(u32))
        .help("Mark the whole column X as defective (repeatable)"),
    )
    .arg(
      Arg::new("FILE")
        .required(true)
        .num_args(1..)
        .value_parser(value_parser!(PathBuf))
        .help("DNG file(s) to patch"),
    )
}

#[derive(Clone)]
pub struct PixelCoordParser;

impl TypedValueParser for PixelCoordParser {
  type Value = PixelCoord;

  fn parse_ref(&self, cmd: &clap::Command, arg: Option<&clap::Arg>, value: &std::ffi::OsStr) -> std::result::Result<Self::Value, clap::Error> {
    let inner = NonEmptyStringValueParser::new();
    let val = inner.parse_ref(cmd, arg, value)?;

    match PixelCoord::from_str(&val) {
      Ok(coord) => Ok(coord),
      Err(fail) => {
        let mut err = clap::Error::new(clap::error::ErrorKind::ValueValidation).with_cmd(cmd);
        if let Some(arg) = arg {
          err.insert(clap::error::ContextKind::InvalidArg, clap::error::ContextValue::String(arg.to_string()));
        }
        err.insert(clap::error::ContextKind::InvalidValue, clap::error::ContextValue::String(val));
        err.insert(clap::error::ContextKind::Suggested, clap::error::ContextValue::String(fail));
        Err(err)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn app_parses_all_options() {
    let matches = create_app()
      .try_get_matches_from(["pixelfix", "-v", "-p", "10,20", "-p", "30,40", "-c", "5", "-o", "out.dng", "shot.dng"])
      .expect("arguments must parse");
    assert!(matches.get_flag("verbose"));
    let pixels: Vec<PixelCoord> = matches.get_many("pixel").unwrap().copied().collect();
    assert_eq!(pixels, vec![PixelCoord { x: 10, y: 20 }, PixelCoord { x: 30, y: 40 }]);
    let columns: Vec<u32> = matches.get_many("column").unwrap().copied().collect();
    assert_eq!(columns, vec![5]);
    assert_eq!(matches.get_one::<PathBuf>("output"), Some(&PathBuf::from("out.dng")));
    let files: Vec<&PathBuf> = matches.get_many("FILE").unwrap().collect();
    assert_eq!(files, vec![&PathBuf::from("shot.dng")]);
  }

  #[test]
  fn app_requires_input_files() {
    assert!(create_app().try_get_matches_from(["pixelfix"]).is_err());
    assert!(create_app().try_get_matches_from(["pixelfix", "-p", "10,20"]).is_err());
  }

  #[test]
  fn app_rejects_malformed_pixel() {
    assert!(create_app().try_get_matches_from(["pixelfix", "-p", "10", "shot.dng"]).is_err());
    assert!(create_app().try_get_matches_from(["pixelfix", "-c", "x", "shot.dng"]).is_err());
  }
}
