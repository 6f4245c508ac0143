// SPDX-License-Identifier: MIT
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

//! TIFF container support, scoped to read-modify-write of tag metadata.
//!
//! Image data (strips, tiles) is never decoded, only relocated verbatim
//! when the container is written back out.

use thiserror::Error;

pub mod entry;
pub mod file;
pub mod ifd;
pub mod reader;
pub mod value;
pub mod writer;

pub use entry::Entry;
pub use file::TiffFile;
pub use ifd::IFD;
pub use value::{Rational, SRational, TiffAscii, Value};
pub use writer::TiffWriter;

pub(crate) const TIFF_MAGIC: u16 = 42;

use crate::tags::BaselineTag;

/// Pointer tags which are expanded into sub-IFD trees on load and
/// relinked on save.
pub fn wellknown_sub_ifd_tags() -> Vec<u16> {
  vec![BaselineTag::SubIFDs.into(), BaselineTag::ExifIFDPointer.into(), BaselineTag::GpsInfo.into()]
}

/// Error variants for container processing
#[derive(Debug, Error)]
pub enum TiffError {
  /// Overflow of input, size constraints...
  #[error("Overflow error: {}", _0)]
  Overflow(String),

  #[error("General error: {}", _0)]
  General(String),

  #[error("Format mismatch: {}", _0)]
  FormatMismatch(String),

  /// Error on internal cursor type
  #[error("I/O error: {:?}", _0)]
  Io(#[from] std::io::Error),
}

/// Result type for container operations
pub type Result<T> = std::result::Result<T, TiffError>;
