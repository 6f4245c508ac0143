// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

//! Batch driver: one patch job per input file.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::ArgMatches;
use log::{info, warn};

use crate::Result;
use crate::badpix::PixelCoord;
use crate::jobs::Job;
use crate::jobs::patchdng::{JobResult, PatchDngJob, PatchParams};

/// Suffix marking files this tool has already written
const FIXED_SUFFIX: &str = "-fixed";

/// Entry point for the command line interface
pub fn fixbadpix(options: &ArgMatches) -> Result<()> {
  let now = Instant::now();

  let inputs: Vec<&PathBuf> = options.get_many("FILE").expect("FILE is required").collect();
  let params = PatchParams {
    pixels: options.get_many::<PixelCoord>("pixel").map(|v| v.copied().collect()).unwrap_or_default(),
    columns: options.get_many::<u32>("column").map(|v| v.copied().collect()).unwrap_or_default(),
  };

  let output_override: Option<&PathBuf> = options.get_one("output");
  let jobs = build_jobs(&inputs, output_override, &params);

  let mut results: Vec<JobResult> = Vec::new();
  for job in &jobs {
    let result = job.execute();
    if let Some(error) = result.error.as_ref() {
      log::error!("Failed to patch '{}': {}", job.input.display(), error);
    } else {
      info!("{}", result);
    }
    results.push(result);
  }

  let total = results.len();
  let success = results.iter().filter(|j| j.error.is_none()).count();
  let failure = results.iter().filter(|j| j.error.is_some()).count();

  if failure == 0 {
    println!("Patched {}/{} files", success, total);
  } else {
    eprintln!("Patched {}/{} files, {} failed:", success, total, failure);
    for failed in results.iter().filter(|j| j.error.is_some()) {
      eprintln!("   {}", failed.job.input.display());
    }
  }
  println!("Total time: {:.2}s", now.elapsed().as_secs_f32());
  Ok(())
}

/// Turn the input list into jobs: already-patched files are skipped and
/// the output override only applies to a single-input run.
fn build_jobs(inputs: &[&PathBuf], output_override: Option<&PathBuf>, params: &PatchParams) -> Vec<PatchDngJob> {
  let single_input = inputs.len() == 1;
  if output_override.is_some() && !single_input {
    warn!("--output-file is only honored for a single input file, using default output names");
  }

  let mut jobs = Vec::new();
  for &input in inputs {
    if is_already_fixed(input) {
      info!("Skipping '{}', it is already a patched file", input.display());
      continue;
    }
    let output = match output_override {
      Some(path) if single_input => path.clone(),
      _ => default_output_path(input),
    };
    jobs.push(PatchDngJob {
      input: input.clone(),
      output,
      params: params.clone(),
    });
  }
  jobs
}

/// Output files get a `-fixed` suffix; such files are skipped on input so
/// a patched file is never patched again.
fn is_already_fixed(path: &Path) -> bool {
  path
    .file_stem()
    .and_then(OsStr::to_str)
    .map(|stem| stem.to_ascii_lowercase().ends_with(FIXED_SUFFIX))
    .unwrap_or(false)
}

fn default_output_path(input: &Path) -> PathBuf {
  let stem = input.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
  let file_name = match input.extension() {
    Some(ext) => format!("{}{}.{}", stem, FIXED_SUFFIX, ext.to_string_lossy()),
    None => format!("{}{}", stem, FIXED_SUFFIX),
  };
  input.with_file_name(file_name)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_output_appends_fixed_before_extension() {
    assert_eq!(default_output_path(Path::new("shot.dng")), PathBuf::from("shot-fixed.dng"));
    assert_eq!(default_output_path(Path::new("/data/raw/L1000001.DNG")), PathBuf::from("/data/raw/L1000001-fixed.DNG"));
    assert_eq!(default_output_path(Path::new("noext")), PathBuf::from("noext-fixed"));
  }

  #[test]
  fn fixed_files_are_detected_case_insensitive() {
    assert!(is_already_fixed(Path::new("shot-fixed.dng")));
    assert!(is_already_fixed(Path::new("SHOT-FIXED.DNG")));
    assert!(is_already_fixed(Path::new("shot-Fixed.dng")));
    assert!(!is_already_fixed(Path::new("shot.dng")));
    assert!(!is_already_fixed(Path::new("fixed-shot.dng")));
  }

  #[test]
  fn output_override_honored_for_a_single_input() {
    let input = PathBuf::from("shot.dng");
    let custom = PathBuf::from("custom.dng");
    let jobs = build_jobs(&[&input], Some(&custom), &PatchParams::default());
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].output, PathBuf::from("custom.dng"));
  }

  #[test]
  fn output_override_ignored_for_multiple_inputs() {
    let first = PathBuf::from("a.dng");
    let second = PathBuf::from("b.dng");
    let custom = PathBuf::from("custom.dng");
    let jobs = build_jobs(&[&first, &second], Some(&custom), &PatchParams::default());
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].output, PathBuf::from("a-fixed.dng"));
    assert_eq!(jobs[1].output, PathBuf::from("b-fixed.dng"));
  }

  #[test]
  fn already_patched_inputs_produce_no_jobs() {
    let fresh = PathBuf::from("shot.dng");
    let done = PathBuf::from("shot-fixed.dng");
    let jobs = build_jobs(&[&fresh, &done], None, &PatchParams::default());
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].input, PathBuf::from("shot.dng"));
  }
}
