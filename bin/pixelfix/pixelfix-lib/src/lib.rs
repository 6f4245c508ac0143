// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::path::PathBuf;

use dngpatch::TiffError;
use thiserror::Error;

pub mod app;
pub mod badpix;
pub mod fixbadpix;
pub mod jobs;

#[derive(Error, Debug)]
pub enum AppError {
  #[error("{}", _0)]
  General(String),
  #[error("Invalid arguments: {}", _0)]
  InvalidCmdSwitch(String),
  #[error("I/O error: {}", _0)]
  Io(#[from] std::io::Error),
  #[error("Not found: {}", _0.display())]
  NotFound(PathBuf),
  #[error("Already exists: {}", _0.display())]
  AlreadyExists(PathBuf),
  #[error("Unsupported file: {}", _0)]
  UnsupportedFile(String),
  #[error(transparent)]
  Other(#[from] anyhow::Error),
}

impl From<TiffError> for AppError {
  fn from(value: TiffError) -> Self {
    anyhow::Error::new(value).into()
  }
}

pub type Result<T> = std::result::Result<T, AppError>;
