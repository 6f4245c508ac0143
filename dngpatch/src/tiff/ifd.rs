// SPDX-License-Identifier: MIT
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::{
  collections::{BTreeMap, HashMap},
  io::{Read, Seek},
};

use log::debug;

use super::{Entry, Result, Value, reader::EndianReader};
use crate::{
  bits::Endian,
  tags::{TiffTag, tag_name},
};

/// A single image file directory with its sub-IFD trees expanded.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IFD {
  pub next_ifd: u32,
  pub entries: BTreeMap<u16, Entry>,
  pub endian: Endian,
  pub sub: HashMap<u16, Vec<IFD>>,
}

impl IFD {
  /// Parse the directory at `offset`. Entries listed in `sub_tags` are
  /// treated as IFD pointers and their targets parsed into the `sub` tree.
  pub fn new<R: Read + Seek>(reader: &mut R, offset: u32, endian: Endian, sub_tags: &[u16]) -> Result<IFD> {
    let mut reader = EndianReader::new(reader, endian);
    reader.goto(offset)?;
    let entry_count = reader.read_u16()?;
    let mut entries = BTreeMap::new();
    let mut sub = HashMap::new();
    let mut sub_ifd_offsets = HashMap::new();
    let mut next_pos = reader.position()?;
    debug!("Parse entries");
    for _ in 0..entry_count {
      reader.goto(next_pos)?;
      next_pos += 12;
      let tag = reader.read_u16()?;

      match Entry::parse(&mut reader, tag) {
        Ok(entry) => {
          if sub_tags.contains(&tag) {
            match &entry.value {
              Value::Long(offsets) => {
                sub_ifd_offsets.insert(tag, offsets.clone());
              }
              val => {
                log::info!(
                  "Found IFD offset tag, but type mismatch: {:?}. Ignoring SubIFD parsing for tag 0x{:X}",
                  val,
                  tag
                );
              }
            }
          }
          entries.insert(entry.tag, entry);
        }
        Err(err) => {
          log::info!("Failed to parse TIFF tag 0x{:X}, skipping: {:?}", tag, err);
        }
      }
    }

    // Some TIFF writers skip the next ifd pointer
    // If we get an I/O error, we fallback to 0, signaling the end of IFD chains.
    let next_ifd = match reader.read_u32() {
      Ok(ptr) => ptr,
      Err(e) => {
        debug!(
          "TIFF IFD reader failed to get next IFD pointer, fallback to 0 and continue. Original error was: {}",
          e
        );
        0
      }
    };

    // Process sub-IFDs
    let reader = reader.into_inner();
    for (tag, offsets) in sub_ifd_offsets {
      let mut ifds = Vec::new();
      for offset in offsets {
        match Self::new(reader, offset, endian, &[]) {
          Ok(ifd) => ifds.push(ifd),
          Err(err) => {
            log::warn!("Error while processing TIFF sub-IFD for tag 0x{:X}, ignoring it: {}", tag, err);
          }
        }
      }
      sub.insert(tag, ifds);
    }

    Ok(IFD {
      next_ifd,
      entries,
      endian,
      sub,
    })
  }

  pub fn entry_count(&self) -> u16 {
    self.entries.len() as u16
  }

  pub fn entries(&self) -> &BTreeMap<u16, Entry> {
    &self.entries
  }

  pub fn get_entry<T: TiffTag>(&self, tag: T) -> Option<&Entry> {
    self.entries.get(&tag.into())
  }

  pub fn has_entry<T: TiffTag>(&self, tag: T) -> bool {
    self.get_entry(tag).is_some()
  }

  /// Replace or add a tag. The directory type is implied by the value.
  pub fn set_entry<T: TiffTag, V: Into<Value>>(&mut self, tag: T, value: V) {
    self.set_value(tag, value.into());
  }

  pub fn set_value<T: TiffTag>(&mut self, tag: T, value: Value) {
    let tag: u16 = tag.into();
    self.entries.insert(tag, Entry { tag, value });
  }

  pub fn sub_ifds(&self) -> &HashMap<u16, Vec<IFD>> {
    &self.sub
  }

  pub fn get_sub_ifd<T: TiffTag>(&self, tag: T) -> Option<&IFD> {
    self.sub.get(&tag.into()).and_then(|ifds| ifds.first())
  }

  pub fn get_entry_recursive<T: TiffTag>(&self, tag: T) -> Option<&Entry> {
    self.entries.get(&tag.into()).or_else(|| {
      self
        .sub
        .values()
        .flatten()
        .find_map(|ifd| ifd.get_entry_recursive(tag))
    })
  }

  pub fn find_ifds_with_tag<T: TiffTag>(&self, tag: T) -> Vec<&IFD> {
    let mut ifds = Vec::new();
    if self.get_entry(tag).is_some() {
      ifds.push(self);
    }
    // Now search in all sub IFDs
    for subs in self.sub_ifds() {
      for ifd in subs.1 {
        ifds.append(&mut ifd.find_ifds_with_tag(tag));
      }
    }
    ifds
  }

  /// Dump all entries for debugging, recursing into sub-IFDs.
  pub fn dump(&self, limit: usize) -> Vec<String> {
    let mut out = Vec::new();
    out.push(format!("IFD entries: {}", self.entries.len()));
    out.push(format!("{0:<34}  | {1:<10} | {2:<6} | {3}", "Tag", "Type", "Count", "Data"));
    for (tag, entry) in &self.entries {
      let mut line = String::new();
      line.push_str(&format!(
        "{0:#06x} : {0:<6} {1:<20}| {2:<10} | {3:<6} | ",
        tag,
        tag_name(*tag),
        entry.type_name(),
        entry.count()
      ));
      line.push_str(&entry.visual_rep(limit));
      out.push(line);
    }
    for subs in self.sub_ifds().iter() {
      for (i, sub) in subs.1.iter().enumerate() {
        out.push(format!("SubIFD({}:{})", subs.0, i));
        for line in sub.dump(limit) {
          out.push(format!("   {}", line));
        }
      }
    }
    out
  }
}
