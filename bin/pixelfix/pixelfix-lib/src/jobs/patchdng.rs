// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use super::Job;
use crate::{
  AppError, Result,
  badpix::{PixelCoord, collect_points, collect_rects},
};
use dngpatch::{
  dng::{DNG_VERSION_V1_3, DngFile},
  dng::opcodes::{FixBadPixelsList, Opcode, OpcodeList},
  tags::DngTag,
  tiff::Value,
};
use log::debug;
use std::{
  fmt::Display,
  fs::File,
  io::{BufReader, BufWriter, Write},
};
use std::{path::PathBuf, time::Instant};

/// Defect list to apply, shared by all files of a batch.
#[derive(Debug, Clone, Default)]
pub struct PatchParams {
  pub pixels: Vec<PixelCoord>,
  pub columns: Vec<u32>,
}

/// Job for patching bad pixel opcodes into a DNG
#[derive(Debug, Clone)]
pub struct PatchDngJob {
  pub input: PathBuf,
  pub output: PathBuf,
  pub params: PatchParams,
}

/// State of patch operation
#[derive(Debug)]
pub struct JobResult {
  pub job: PatchDngJob,
  pub duration: f32,
  pub error: Option<AppError>,
}

impl Display for JobResult {
  /// Pretty print the patch state
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    if let Some(error) = self.error.as_ref() {
      f.write_fmt(format_args!("Failed: '{}', {}", self.job.input.display(), error))?;
    } else {
      f.write_fmt(format_args!(
        "Patched '{}' => '{}' (in {:.2}s)",
        self.job.input.display(),
        self.job.output.display(),
        self.duration
      ))?;
    }
    Ok(())
  }
}

impl PatchDngJob {
  fn internal_exec(&self) -> Result<JobResult> {
    let dng_file = File::open(&self.input)?;
    let mut dng = DngFile::new(BufReader::new(dng_file))?;

    if !dng.has_entry(DngTag::DNGVersion) {
      debug!("Input is not a DNG file");
      return Err(AppError::UnsupportedFile("Input file is not a DNG".into()));
    }

    let (width, height) = dng.dimensions()?;
    debug!("Main image is {}x{}", width, height);

    let points = collect_points(&self.params.pixels, width, height);
    let rects = collect_rects(&self.params.columns, width, height);
    debug!("Encoding {} bad pixel(s) and {} bad column rect(s)", points.len(), rects.len());

    let mut opcodes = OpcodeList::new();
    opcodes.push(Opcode::FixBadPixelsList(FixBadPixelsList {
      bayer_phase: 0,
      points,
      rects,
    }));

    // FixBadPixelsList requires DNG 1.3
    dng.root_ifd_mut().set_entry(DngTag::DNGVersion, DNG_VERSION_V1_3);
    dng.main_ifd_mut().set_value(DngTag::OpcodeList1, Value::Undefined(opcodes.emit()));

    let mut stream = BufWriter::new(File::create(&self.output)?);
    dng.save(&mut stream)?;
    stream.flush()?;

    Ok(JobResult {
      job: self.clone(),
      duration: 0.0,
      error: None,
    })
  }
}

impl Job for PatchDngJob {
  type Output = JobResult;

  fn execute(&self) -> Self::Output {
    debug!("Job running: input: {:?}, output: {:?}", self.input, self.output);
    let now = Instant::now();
    match self.internal_exec() {
      Ok(mut stat) => {
        stat.duration = now.elapsed().as_secs_f32();
        stat
      }
      Err(e) => JobResult {
        job: self.clone(),
        duration: now.elapsed().as_secs_f32(),
        error: Some(e),
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use dngpatch::{
    bits::Endian,
    tags::BaselineTag,
    tiff::{IFD, TiffFile},
  };
  use std::io::Cursor;

  fn be32(buf: &[u8], idx: usize) -> u32 {
    u32::from_be_bytes(buf[idx * 4..idx * 4 + 4].try_into().unwrap())
  }

  /// A 100x100 raw image in SubIFD 1, preview in IFD0, no image data.
  fn sample_dng() -> Vec<u8> {
    let mut main = IFD::default();
    main.set_entry(BaselineTag::NewSubFileType, 0_u32);
    main.set_entry(BaselineTag::ImageWidth, 100_u16);
    main.set_entry(BaselineTag::ImageLength, 100_u16);

    let mut root = IFD::default();
    root.set_entry(BaselineTag::NewSubFileType, 1_u32);
    root.set_entry(BaselineTag::ImageWidth, 64_u16);
    root.set_entry(BaselineTag::ImageLength, 48_u16);
    root.set_entry(DngTag::DNGVersion, [1_u8, 2, 0, 0]);
    root.sub.insert(BaselineTag::SubIFDs.into(), vec![main]);

    let file = TiffFile {
      endian: Endian::Little,
      chain: vec![root],
    };
    let mut out = Cursor::new(Vec::new());
    file.save(&mut Cursor::new(Vec::new()), &mut out).expect("sample must serialize");
    out.into_inner()
  }

  #[test]
  fn job_patches_version_and_opcode_list() {
    let dir = std::env::temp_dir();
    let input = dir.join(format!("pixelfix-test-{}.dng", std::process::id()));
    let output = dir.join(format!("pixelfix-test-{}-fixed.dng", std::process::id()));
    std::fs::write(&input, sample_dng()).expect("test input must be writable");

    let job = PatchDngJob {
      input: input.clone(),
      output: output.clone(),
      params: PatchParams {
        pixels: vec![PixelCoord { x: 10, y: 20 }, PixelCoord { x: 99, y: 0 }],
        columns: vec![5],
      },
    };
    let result = job.execute();
    assert!(result.error.is_none(), "job failed: {:?}", result.error);

    let patched = std::fs::read(&output).expect("output must exist");
    let _ = std::fs::remove_file(&input);
    let _ = std::fs::remove_file(&output);

    let dng = DngFile::new(Cursor::new(patched)).expect("output must parse");
    assert_eq!(
      dng.root_ifd().get_entry(DngTag::DNGVersion).unwrap().value,
      Value::Byte(vec![1, 3, 0, 0])
    );

    let opcodes = match &dng.main_ifd().get_entry(DngTag::OpcodeList1).expect("opcode list must be set").value {
      Value::Undefined(data) => data.clone(),
      other => panic!("OpcodeList1 has wrong type: {:?}", other),
    };

    // One FixBadPixelsList opcode, one surviving pixel, one column rect.
    // The pixel at 99,0 is out of range and must have been dropped.
    assert_eq!(be32(&opcodes, 0), 1);
    assert_eq!(be32(&opcodes, 1), 5);
    assert_eq!(be32(&opcodes, 5), 0); // Bayer phase
    assert_eq!(be32(&opcodes, 6), 1); // pixel count
    assert_eq!(be32(&opcodes, 7), 1); // rect count
    assert_eq!((be32(&opcodes, 8), be32(&opcodes, 9)), (12, 22));
    assert_eq!(
      (be32(&opcodes, 10), be32(&opcodes, 11), be32(&opcodes, 12), be32(&opcodes, 13)),
      (0, 7, 100, 8)
    );
  }

  #[test]
  fn job_fails_on_non_dng_input() {
    let dir = std::env::temp_dir();
    let input = dir.join(format!("pixelfix-test-{}.txt", std::process::id()));
    std::fs::write(&input, b"not a tiff at all").expect("test input must be writable");

    let job = PatchDngJob {
      input: input.clone(),
      output: dir.join("never-written.dng"),
      params: PatchParams::default(),
    };
    let result = job.execute();
    let _ = std::fs::remove_file(&input);
    assert!(result.error.is_some());
  }
}
