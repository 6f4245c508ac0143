// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

//! DNG opcode list serialization.
//!
//! Opcode lists are stored as UNDEFINED tag data and are always big-endian,
//! regardless of the byte order of the surrounding container.

use super::DNG_VERSION_V1_3;

/// Opcode may be skipped by readers which don't know it
pub const OPCODE_FLAG_OPTIONAL: u32 = 1;

/// A defective pixel, in sensor coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BadPoint {
  pub x: u32,
  pub y: u32,
}

/// A defective area as top/left/bottom/right coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DngRect {
  pub top: u32,
  pub left: u32,
  pub bottom: u32,
  pub right: u32,
}

/// Parameters for the FixBadPixelsList opcode (DNG 1.3, opcode id 5).
#[derive(Clone, Debug, Default)]
pub struct FixBadPixelsList {
  pub bayer_phase: u32,
  pub points: Vec<BadPoint>,
  pub rects: Vec<DngRect>,
}

impl FixBadPixelsList {
  const OPCODE_ID: u32 = 5;

  /// Byte length of the variable parameter area.
  fn param_size(&self) -> u32 {
    (3 * 4 + self.points.len() * 8 + self.rects.len() * 16) as u32
  }

  fn emit_params(&self, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&self.bayer_phase.to_be_bytes());
    buf.extend_from_slice(&(self.points.len() as u32).to_be_bytes());
    buf.extend_from_slice(&(self.rects.len() as u32).to_be_bytes());
    for point in &self.points {
      buf.extend_from_slice(&point.x.to_be_bytes());
      buf.extend_from_slice(&point.y.to_be_bytes());
    }
    for rect in &self.rects {
      buf.extend_from_slice(&rect.top.to_be_bytes());
      buf.extend_from_slice(&rect.left.to_be_bytes());
      buf.extend_from_slice(&rect.bottom.to_be_bytes());
      buf.extend_from_slice(&rect.right.to_be_bytes());
    }
  }
}

#[derive(Clone, Debug)]
pub enum Opcode {
  FixBadPixelsList(FixBadPixelsList),
}

impl Opcode {
  fn id(&self) -> u32 {
    match self {
      Self::FixBadPixelsList(_) => FixBadPixelsList::OPCODE_ID,
    }
  }

  /// Minimal DNG version required to process the opcode.
  fn version(&self) -> u32 {
    match self {
      Self::FixBadPixelsList(_) => u32::from_be_bytes(DNG_VERSION_V1_3),
    }
  }

  fn flags(&self) -> u32 {
    match self {
      Self::FixBadPixelsList(_) => OPCODE_FLAG_OPTIONAL,
    }
  }

  fn param_size(&self) -> u32 {
    match self {
      Self::FixBadPixelsList(op) => op.param_size(),
    }
  }

  fn emit_params(&self, buf: &mut Vec<u8>) {
    match self {
      Self::FixBadPixelsList(op) => op.emit_params(buf),
    }
  }
}

/// An ordered list of opcodes for one of the OpcodeList tags.
#[derive(Clone, Debug, Default)]
pub struct OpcodeList {
  opcodes: Vec<Opcode>,
}

impl OpcodeList {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, opcode: Opcode) {
    self.opcodes.push(opcode);
  }

  pub fn len(&self) -> usize {
    self.opcodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.opcodes.is_empty()
  }

  /// Serialize the opcode list as big-endian tag data: opcode count,
  /// then per opcode the header (id, version, flags, parameter length)
  /// followed by the parameter area.
  pub fn emit(&self) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(self.opcodes.len() as u32).to_be_bytes());
    for opcode in &self.opcodes {
      buf.extend_from_slice(&opcode.id().to_be_bytes());
      buf.extend_from_slice(&opcode.version().to_be_bytes());
      buf.extend_from_slice(&opcode.flags().to_be_bytes());
      buf.extend_from_slice(&opcode.param_size().to_be_bytes());
      opcode.emit_params(&mut buf);
    }
    buf
  }
}
