// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::io::{Read, Seek, Write};

use log::debug;

use crate::{
  tags::{BaselineTag, TiffTag},
  tiff::{IFD, Result, TiffError, TiffFile, Value},
};

/// Which IFD carries the raw image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MainIfd {
  Root,
  Sub(usize),
}

/// A DNG opened for patching. Keeps the source reader around so image
/// data can be copied over verbatim on save.
pub struct DngFile<R: Read + Seek> {
  rdr: R,
  pub file: TiffFile,
  main: MainIfd,
}

impl<R: Read + Seek> DngFile<R> {
  pub fn new(mut rdr: R) -> Result<Self> {
    let mut file = TiffFile::read(&mut rdr, Some(10))?;
    for ifd in &mut file.chain {
      normalize_xmp(ifd);
    }
    if log::log_enabled!(log::Level::Debug) {
      for line in file.root_ifd().dump(8) {
        debug!("{}", line);
      }
    }
    let main = locate_main_ifd(file.root_ifd());
    Ok(Self { rdr, file, main })
  }

  pub fn root_ifd(&self) -> &IFD {
    self.file.root_ifd()
  }

  pub fn root_ifd_mut(&mut self) -> &mut IFD {
    self.file.root_ifd_mut()
  }

  /// The IFD carrying the raw image (NewSubFileType 0), IFD0 as fallback.
  pub fn main_ifd(&self) -> &IFD {
    match self.main {
      MainIfd::Root => self.file.root_ifd(),
      MainIfd::Sub(idx) => self
        .file
        .root_ifd()
        .sub
        .get(&BaselineTag::SubIFDs.into())
        .and_then(|ifds| ifds.get(idx))
        .expect("main IFD location must be valid"),
    }
  }

  pub fn main_ifd_mut(&mut self) -> &mut IFD {
    match self.main {
      MainIfd::Root => self.file.root_ifd_mut(),
      MainIfd::Sub(idx) => self
        .file
        .root_ifd_mut()
        .sub
        .get_mut(&BaselineTag::SubIFDs.into())
        .and_then(|ifds| ifds.get_mut(idx))
        .expect("main IFD location must be valid"),
    }
  }

  /// Width and height of the raw image.
  pub fn dimensions(&self) -> Result<(u32, u32)> {
    let ifd = self.main_ifd();
    let width = ifd
      .get_entry(BaselineTag::ImageWidth)
      .ok_or_else(|| TiffError::General("Main IFD contains no ImageWidth".into()))?
      .value
      .get_usize(0)? as u32;
    let height = ifd
      .get_entry(BaselineTag::ImageLength)
      .ok_or_else(|| TiffError::General("Main IFD contains no ImageLength".into()))?
      .value
      .get_usize(0)? as u32;
    Ok((width, height))
  }

  pub fn has_entry<T: TiffTag>(&self, tag: T) -> bool {
    self.file.chain.iter().any(|ifd| ifd.get_entry_recursive(tag).is_some())
  }

  /// Write the patched structure to `out`, copying image data from the
  /// source and keeping its byte order.
  pub fn save<W: Write + Seek>(&mut self, out: W) -> Result<()> {
    self.file.save(&mut self.rdr, out)
  }
}

fn locate_main_ifd(root: &IFD) -> MainIfd {
  if subfile_type(root) == Some(0) {
    return MainIfd::Root;
  }
  if let Some(subs) = root.sub.get(&BaselineTag::SubIFDs.into()) {
    if let Some(idx) = subs.iter().position(|ifd| subfile_type(ifd) == Some(0)) {
      return MainIfd::Sub(idx);
    }
  }
  debug!("No IFD with NewSubFileType 0 found, falling back to IFD0 as main image");
  MainIfd::Root
}

fn subfile_type(ifd: &IFD) -> Option<u32> {
  ifd.get_entry(BaselineTag::NewSubFileType).and_then(|entry| entry.value.get_u32(0).ok().flatten())
}

// Older M9 firmware stores XMP data as UNDEFINED rather than BYTE
fn normalize_xmp(ifd: &mut IFD) {
  if let Some(entry) = ifd.entries.get_mut(&BaselineTag::Xmp.into()) {
    if let Value::Undefined(data) = &entry.value {
      let data = data.clone();
      entry.value = Value::Byte(data);
    }
  }
  for ifds in ifd.sub.values_mut() {
    for sub in ifds {
      normalize_xmp(sub);
    }
  }
}
