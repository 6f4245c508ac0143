// SPDX-License-Identifier: MIT
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::{
  collections::BTreeMap,
  io::{Read, Seek, SeekFrom, Write},
};

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

use super::{IFD, Result, TIFF_MAGIC, TiffError, Value, wellknown_sub_ifd_tags};
use crate::{bits::Endian, tags::BaselineTag};

/// Writer wrapper which encodes according to the container byte order.
pub struct EndianWriter<'a, W: Write> {
  endian: Endian,
  inner: &'a mut W,
}

impl<'a, W: Write> EndianWriter<'a, W> {
  pub fn new(inner: &'a mut W, endian: Endian) -> Self {
    Self { endian, inner }
  }

  pub fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
    self.inner.write_all(buf)
  }

  pub fn write_u8(&mut self, v: u8) -> std::io::Result<()> {
    self.inner.write_u8(v)
  }

  pub fn write_i8(&mut self, v: i8) -> std::io::Result<()> {
    self.inner.write_i8(v)
  }

  pub fn write_u16(&mut self, v: u16) -> std::io::Result<()> {
    match self.endian {
      Endian::Little => self.inner.write_u16::<LittleEndian>(v),
      Endian::Big => self.inner.write_u16::<BigEndian>(v),
    }
  }

  pub fn write_i16(&mut self, v: i16) -> std::io::Result<()> {
    match self.endian {
      Endian::Little => self.inner.write_i16::<LittleEndian>(v),
      Endian::Big => self.inner.write_i16::<BigEndian>(v),
    }
  }

  pub fn write_u32(&mut self, v: u32) -> std::io::Result<()> {
    match self.endian {
      Endian::Little => self.inner.write_u32::<LittleEndian>(v),
      Endian::Big => self.inner.write_u32::<BigEndian>(v),
    }
  }

  pub fn write_i32(&mut self, v: i32) -> std::io::Result<()> {
    match self.endian {
      Endian::Little => self.inner.write_i32::<LittleEndian>(v),
      Endian::Big => self.inner.write_i32::<BigEndian>(v),
    }
  }

  pub fn write_f32(&mut self, v: f32) -> std::io::Result<()> {
    match self.endian {
      Endian::Little => self.inner.write_f32::<LittleEndian>(v),
      Endian::Big => self.inner.write_f32::<BigEndian>(v),
    }
  }

  pub fn write_f64(&mut self, v: f64) -> std::io::Result<()> {
    match self.endian {
      Endian::Little => self.inner.write_f64::<LittleEndian>(v),
      Endian::Big => self.inner.write_f64::<BigEndian>(v),
    }
  }
}

/// Writes a complete TIFF structure in the byte order of the source file.
///
/// Directories are emitted value-data first, then the directory table, so
/// all offsets are known when the table is written. Strip and tile data is
/// copied from the source reader and the offset tags relinked.
pub struct TiffWriter<W: Write + Seek> {
  writer: W,
  endian: Endian,
  ifd_location: u64,
}

impl<W: Write + Seek> TiffWriter<W> {
  pub fn new(writer: W, endian: Endian) -> Result<Self> {
    let mut tmp = Self {
      writer,
      endian,
      ifd_location: 0,
    };
    tmp.write_header()?;
    Ok(tmp)
  }

  fn write_header(&mut self) -> Result<()> {
    let prefix: &[u8; 2] = if self.endian.little() { b"II" } else { b"MM" };
    self.writer.write_all(prefix)?;
    let mut ew = EndianWriter::new(&mut self.writer, self.endian);
    ew.write_u16(TIFF_MAGIC)?;
    self.ifd_location = self.writer.stream_position()?;
    EndianWriter::new(&mut self.writer, self.endian).write_u32(0_u32)?;
    Ok(())
  }

  pub fn position(&mut self) -> Result<u32> {
    Ok(self.writer.stream_position().map(|v| v as u32)?)
  }

  pub(crate) fn pad_word_boundary(&mut self) -> Result<()> {
    if self.position()? % 4 != 0 {
      let padding = [0, 0, 0];
      let padd_len = 4 - (self.position()? % 4);
      self.writer.write_all(&padding[..padd_len as usize])?;
    }
    Ok(())
  }

  /// Patch the header with the offset of the root directory and finish.
  pub fn build(mut self, ifd0_offset: u32) -> Result<()> {
    self.writer.seek(SeekFrom::Start(self.ifd_location))?;
    EndianWriter::new(&mut self.writer, self.endian).write_u32(ifd0_offset)?;
    Ok(())
  }

  /// Write one directory including its sub-IFD trees and image data,
  /// returning the offset of the directory table.
  pub fn write_ifd<R: Read + Seek>(&mut self, ifd: &IFD, src: &mut R, next_ifd: u32) -> Result<u32> {
    let mut values: BTreeMap<u16, Value> = ifd.entries.iter().map(|(tag, entry)| (*tag, entry.value.clone())).collect();

    // Children first, then relink the pointer tags
    for (tag, children) in &ifd.sub {
      if children.is_empty() {
        log::warn!("Sub-IFD pointer tag 0x{:X} has no parsed target, dropping it", tag);
        values.remove(tag);
        continue;
      }
      let mut offsets = Vec::with_capacity(children.len());
      for child in children {
        offsets.push(self.write_ifd(child, src, 0)?);
      }
      values.insert(*tag, Value::Long(offsets));
    }
    // A pointer tag without a target would dangle in the output
    for tag in wellknown_sub_ifd_tags() {
      if values.contains_key(&tag) && !ifd.sub.contains_key(&tag) {
        log::warn!("Sub-IFD pointer tag 0x{:X} has no parsed target, dropping it", tag);
        values.remove(&tag);
      }
    }

    self.relocate_image_data(&mut values, src, BaselineTag::StripOffsets, BaselineTag::StripByteCounts)?;
    self.relocate_image_data(&mut values, src, BaselineTag::TileOffsets, BaselineTag::TileByteCounts)?;

    // Out-of-line value data
    let mut fields: Vec<(u16, u16, u32, [u8; 4])> = Vec::with_capacity(values.len());
    for (tag, value) in &values {
      let data = if value.byte_size() > 4 {
        self.pad_word_boundary()?;
        let offset = self.position()?;
        value.write(&mut EndianWriter::new(&mut self.writer, self.endian))?;
        let mut data = [0_u8; 4];
        let mut cursor = std::io::Cursor::new(&mut data[..]);
        EndianWriter::new(&mut cursor, self.endian).write_u32(offset)?;
        data
      } else {
        value.as_embedded(self.endian)?
      };
      fields.push((*tag, value.value_type(), value.count() as u32, data));
    }

    // Directory table
    self.pad_word_boundary()?;
    let table_offset = self.position()?;
    let mut ew = EndianWriter::new(&mut self.writer, self.endian);
    ew.write_u16(fields.len() as u16)?;
    for (tag, typ, count, data) in fields {
      ew.write_u16(tag)?;
      ew.write_u16(typ)?;
      ew.write_u32(count)?;
      ew.write_all(&data)?;
    }
    ew.write_u32(next_ifd)?;

    Ok(table_offset)
  }

  /// Copy strip or tile data from the source file and replace the offset
  /// tag with the new positions. Offsets are always written as LONG.
  fn relocate_image_data<R: Read + Seek>(
    &mut self,
    values: &mut BTreeMap<u16, Value>,
    src: &mut R,
    offsets_tag: BaselineTag,
    counts_tag: BaselineTag,
  ) -> Result<()> {
    let Some(offsets_value) = values.get(&offsets_tag.into()) else {
      return Ok(());
    };
    let counts_value = values
      .get(&counts_tag.into())
      .ok_or_else(|| TiffError::General(format!("IFD contains {:?} but no {:?}", offsets_tag, counts_tag)))?;
    let offsets = as_u32_list(offsets_value)?;
    let counts = as_u32_list(counts_value)?;
    if offsets.len() != counts.len() {
      return Err(TiffError::General(format!(
        "Can't copy image data: offsets has len {} but counts has len {}",
        offsets.len(),
        counts.len()
      )));
    }

    let mut new_offsets = Vec::with_capacity(offsets.len());
    for (offset, count) in offsets.iter().zip(counts.iter()) {
      src.seek(SeekFrom::Start(*offset as u64))?;
      let mut data = vec![0_u8; *count as usize];
      src.read_exact(&mut data)?;
      self.pad_word_boundary()?;
      new_offsets.push(self.position()?);
      self.writer.write_all(&data)?;
    }
    values.insert(offsets_tag.into(), Value::Long(new_offsets));
    Ok(())
  }
}

fn as_u32_list(value: &Value) -> Result<Vec<u32>> {
  match value {
    Value::Long(v) => Ok(v.clone()),
    Value::Short(v) => Ok(v.iter().map(|v| *v as u32).collect()),
    _ => Err(TiffError::FormatMismatch(format!(
      "Expected SHORT or LONG for image data offsets/counts, got {}",
      value.value_type_name()
    ))),
  }
}
