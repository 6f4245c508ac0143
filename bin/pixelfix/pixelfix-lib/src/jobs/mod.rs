// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::fmt::Display;

pub mod patchdng;

/// A job, executed one at a time by the batch driver.
pub trait Job {
  type Output: Display;

  fn execute(&self) -> Self::Output;
}
