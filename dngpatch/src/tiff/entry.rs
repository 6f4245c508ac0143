// SPDX-License-Identifier: MIT
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::io::{Read, Seek};

use log::debug;

use super::{Rational, Result, SRational, TiffAscii, Value, reader::EndianReader};

const TYPE_BYTE: u16 = 1;
const TYPE_ASCII: u16 = 2;
const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;
const TYPE_RATIONAL: u16 = 5;
const TYPE_SBYTE: u16 = 6;
const TYPE_UNDEFINED: u16 = 7;
const TYPE_SSHORT: u16 = 8;
const TYPE_SLONG: u16 = 9;
const TYPE_SRATIONAL: u16 = 10;
const TYPE_FLOAT: u16 = 11;
const TYPE_DOUBLE: u16 = 12;

// 0-1-2-3-4-5-6-7-8-9-10-11-12-13
const DATASHIFTS: [u8; 14] = [0, 0, 0, 1, 2, 3, 0, 0, 1, 2, 3, 2, 3, 2];

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
  pub tag: u16,
  pub value: Value,
}

impl std::ops::Deref for Entry {
  type Target = Value;

  fn deref(&self) -> &Self::Target {
    &self.value
  }
}

impl Entry {
  pub fn value_type(&self) -> u16 {
    self.value.value_type()
  }

  pub fn count(&self) -> u32 {
    self.value.count() as u32
  }

  pub fn type_name(&self) -> String {
    self.value.value_type_name()
  }

  /// Parse a single 12-byte directory field. The reader must be positioned
  /// right behind the tag id; on return it is positioned at the next field.
  pub fn parse<R: Read + Seek>(reader: &mut EndianReader<R>, tag: u16) -> Result<Entry> {
    let pos = reader.position()? - 2; // start of field, tag id is already consumed

    let typ = reader.read_u16()?;
    let count = reader.read_u32()?;

    debug!("Tag: {:#x}, Typ: {:#x}, count: {}", tag, typ, count);

    // If we don't know the type assume byte data (undefined)
    let compat_typ = if typ == 0 || typ > 12 { TYPE_UNDEFINED } else { typ };

    let bytesize: usize = (count as usize) << DATASHIFTS[compat_typ as usize];
    if bytesize > 4 {
      let offset = reader.read_u32()?;
      reader.goto(offset)?;
    }

    let value = match typ {
      TYPE_BYTE => {
        let mut v = vec![0; count as usize];
        reader.read_u8_into(&mut v)?;
        Value::Byte(v)
      }
      TYPE_ASCII => {
        let mut v = vec![0; count as usize];
        reader.read_u8_into(&mut v)?;
        Value::Ascii(TiffAscii::new_from_raw(&v))
      }
      TYPE_SHORT => {
        let mut v = vec![0; count as usize];
        reader.read_u16_into(&mut v)?;
        Value::Short(v)
      }
      TYPE_LONG => {
        let mut v = vec![0; count as usize];
        reader.read_u32_into(&mut v)?;
        Value::Long(v)
      }
      TYPE_RATIONAL => {
        let mut tmp = vec![0; count as usize * 2]; // Rational is 2x u32
        reader.read_u32_into(&mut tmp)?;
        let v = tmp.chunks_exact(2).map(|n| Rational::new(n[0], n[1])).collect();
        Value::Rational(v)
      }
      TYPE_SBYTE => {
        let mut v = vec![0; count as usize];
        reader.read_i8_into(&mut v)?;
        Value::SByte(v)
      }
      TYPE_UNDEFINED => {
        let mut v = vec![0; count as usize];
        reader.read_u8_into(&mut v)?;
        Value::Undefined(v)
      }
      TYPE_SSHORT => {
        let mut v = vec![0; count as usize];
        reader.read_i16_into(&mut v)?;
        Value::SShort(v)
      }
      TYPE_SLONG => {
        let mut v = vec![0; count as usize];
        reader.read_i32_into(&mut v)?;
        Value::SLong(v)
      }
      TYPE_SRATIONAL => {
        let mut tmp = vec![0; count as usize * 2]; // SRational is 2x i32
        reader.read_i32_into(&mut tmp)?;
        let v = tmp.chunks_exact(2).map(|n| SRational::new(n[0], n[1])).collect();
        Value::SRational(v)
      }
      TYPE_FLOAT => {
        let mut v = vec![0.0; count as usize];
        reader.read_f32_into(&mut v)?;
        Value::Float(v)
      }
      TYPE_DOUBLE => {
        let mut v = vec![0.0; count as usize];
        reader.read_f64_into(&mut v)?;
        Value::Double(v)
      }
      x => {
        let mut v = vec![0; count as usize];
        reader.read_u8_into(&mut v)?;
        Value::Unknown(x, v)
      }
    };
    reader.goto(pos + 12)?; // Size of IFD field
    Ok(Entry { tag, value })
  }
}
