//! Library to patch metadata in DNG/TIFF containers.
//!
//! The container is read into a mutable IFD tree, individual tags can be
//! replaced or added, and the whole structure is written back out with all
//! image data copied verbatim from the source. The output keeps the byte
//! order of the input file.
//!
//! # Example
//! ```rust,no_run
//! use std::fs::File;
//! use std::io::{BufReader, BufWriter};
//!
//! use dngpatch::dng::{DNG_VERSION_V1_3, DngFile};
//! use dngpatch::tags::DngTag;
//!
//! fn main() {
//!   let input = BufReader::new(File::open("leica.dng").unwrap());
//!   let mut dng = DngFile::new(input).unwrap();
//!   dng.root_ifd_mut().set_entry(DngTag::DNGVersion, DNG_VERSION_V1_3);
//!   let output = BufWriter::new(File::create("leica-fixed.dng").unwrap());
//!   dng.save(output).unwrap();
//! }
//! ```

#![deny(
    //missing_docs,
    //missing_debug_implementations,
    //missing_copy_implementations,
    //unsafe_code,
    unstable_features,
    //unused_import_braces,
    //unused_qualifications
  )]

pub mod bits;
pub mod dng;
pub mod tags;
pub mod tiff;

pub use tiff::TiffError;
