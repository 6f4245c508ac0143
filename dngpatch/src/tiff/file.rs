// SPDX-License-Identifier: MIT
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::io::{Read, Seek, SeekFrom, Write};

use byteorder::{LittleEndian, ReadBytesExt};

use super::{IFD, Result, TIFF_MAGIC, TiffError, TiffWriter, reader::EndianReader, wellknown_sub_ifd_tags};
use crate::bits::Endian;

/// A parsed TIFF structure: the byte order and the chain of IFDs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TiffFile {
  pub endian: Endian,
  pub chain: Vec<IFD>,
}

impl TiffFile {
  /// Parse a complete TIFF structure. Byte order is detected from the
  /// header, sub-IFD trees are expanded for the well-known pointer tags.
  pub fn read<R: Read + Seek>(file: &mut R, max_chained: Option<usize>) -> Result<Self> {
    file.seek(SeekFrom::Start(0))?;
    let endian = match file.read_u16::<LittleEndian>()? {
      0x4949 => Endian::Little,
      0x4d4d => Endian::Big,
      x => {
        return Err(TiffError::General(format!("TIFF: don't know marker 0x{:x}", x)));
      }
    };
    let mut reader = EndianReader::new(file, endian);
    let magic = reader.read_u16()?;
    if magic != TIFF_MAGIC {
      return Err(TiffError::FormatMismatch(format!("Invalid magic marker for TIFF: {}", magic)));
    }
    let mut next_ifd = reader.read_u32()?;
    if next_ifd == 0 {
      return Err(TiffError::General("Invalid TIFF header, contains no root IFD".to_string()));
    }

    let reader = reader.into_inner();
    let sub_tags = wellknown_sub_ifd_tags();

    let mut chain = Vec::new();
    while next_ifd != 0 {
      let ifd = IFD::new(reader, next_ifd, endian, &sub_tags)?;
      if ifd.entries.is_empty() {
        return Err(TiffError::General("TIFF is invalid, IFD must contain at least one entry".to_string()));
      }
      next_ifd = ifd.next_ifd;
      chain.push(ifd);
      if let Some(max) = max_chained {
        if chain.len() > max {
          break;
        }
      }
    }

    if chain.is_empty() {
      return Err(TiffError::General("TIFF is invalid, must contain at least one IFD".to_string()));
    }
    Ok(Self { endian, chain })
  }

  pub fn root_ifd(&self) -> &IFD {
    &self.chain[0]
  }

  pub fn root_ifd_mut(&mut self) -> &mut IFD {
    &mut self.chain[0]
  }

  /// Write the structure to `out`, copying all image data from `src`.
  /// The output keeps the byte order of the parsed file, the IFD chain
  /// is linked back up in the original order.
  pub fn save<R: Read + Seek, W: Write + Seek>(&self, src: &mut R, out: W) -> Result<()> {
    let mut tiff = TiffWriter::new(out, self.endian)?;
    let mut next_ifd = 0_u32;
    for ifd in self.chain.iter().rev() {
      next_ifd = tiff.write_ifd(ifd, src, next_ifd)?;
    }
    tiff.build(next_ifd)
  }
}

#[cfg(test)]
mod tests {
  use std::io::Cursor;

  use super::*;
  use crate::tags::BaselineTag;
  use crate::tiff::{Entry, Rational, Value};

  fn roundtrip(file: &TiffFile) -> Result<TiffFile> {
    let mut out = Cursor::new(Vec::new());
    file.save(&mut Cursor::new(Vec::new()), &mut out)?;
    TiffFile::read(&mut Cursor::new(out.into_inner()), None)
  }

  #[test]
  fn write_read_single_ifd() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut ifd = IFD::default();
    ifd.set_entry(BaselineTag::ImageWidth, 320_u16);
    ifd.set_entry(BaselineTag::ImageLength, 240_u16);
    ifd.set_entry(BaselineTag::Make, "Leica Camera AG");
    ifd.set_value(BaselineTag::XResolution, Value::Rational(vec![Rational::new(72, 1)]));
    // Private tag with a type we don't know must pass through untouched
    ifd.entries.insert(
      51123,
      Entry {
        tag: 51123,
        value: Value::Unknown(200, vec![1, 2, 3, 4, 5]),
      },
    );
    let file = TiffFile {
      endian: Endian::Little,
      chain: vec![ifd],
    };

    let reread = roundtrip(&file)?;
    assert!(reread.endian.little());
    assert_eq!(reread.chain.len(), 1);
    let root = reread.root_ifd();
    assert_eq!(root.get_entry(BaselineTag::ImageWidth).unwrap().value, Value::Short(vec![320]));
    assert_eq!(
      root.get_entry(BaselineTag::Make).unwrap().value.visual_rep(1),
      String::from("Leica Camera AG")
    );
    assert_eq!(
      root.get_entry(BaselineTag::XResolution).unwrap().value,
      Value::Rational(vec![Rational::new(72, 1)])
    );
    assert_eq!(root.entries.get(&51123).unwrap().value, Value::Unknown(200, vec![1, 2, 3, 4, 5]));
    Ok(())
  }

  #[test]
  fn write_read_big_endian() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut ifd = IFD::default();
    ifd.set_entry(BaselineTag::ImageWidth, 640_u16);
    ifd.set_entry(BaselineTag::ImageLength, 480_u32);
    let file = TiffFile {
      endian: Endian::Big,
      chain: vec![ifd],
    };

    let reread = roundtrip(&file)?;
    assert!(reread.endian.big());
    assert_eq!(reread.root_ifd().get_entry(BaselineTag::ImageWidth).unwrap().value, Value::Short(vec![640]));
    assert_eq!(reread.root_ifd().get_entry(BaselineTag::ImageLength).unwrap().value, Value::Long(vec![480]));
    Ok(())
  }

  #[test]
  fn write_read_preserves_ifd_chain() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut first = IFD::default();
    first.set_entry(BaselineTag::ImageWidth, 100_u16);
    let mut second = IFD::default();
    second.set_entry(BaselineTag::ImageWidth, 200_u16);
    let file = TiffFile {
      endian: Endian::Little,
      chain: vec![first, second],
    };

    let reread = roundtrip(&file)?;
    assert_eq!(reread.chain.len(), 2);
    assert_eq!(reread.chain[0].get_entry(BaselineTag::ImageWidth).unwrap().value, Value::Short(vec![100]));
    assert_eq!(reread.chain[1].get_entry(BaselineTag::ImageWidth).unwrap().value, Value::Short(vec![200]));
    Ok(())
  }

  #[test]
  fn read_rejects_non_tiff_input() {
    let result = TiffFile::read(&mut Cursor::new(b"JFIF\x00\x00\x00\x00".to_vec()), None);
    assert!(result.is_err());
  }
}
