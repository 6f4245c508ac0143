// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

//! Bad pixel and bad column validation.
//!
//! Coordinates are given in visible-image space; the sensor has a 2 pixel
//! calibration border around the visible area, so valid entries are shifted
//! by that border before they go into the opcode parameters.

use std::{fmt::Display, str::FromStr};

use dngpatch::dng::opcodes::{BadPoint, DngRect};
use itertools::Itertools;
use log::warn;

/// Calibration pixels around the visible sensor area
pub const SENSOR_BORDER: u32 = 2;

/// Defects closer than this to the right/bottom edge can not be
/// interpolated and are rejected
pub const EDGE_MARGIN: u32 = 4;

/// A bad pixel coordinate as given on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelCoord {
  pub x: u32,
  pub y: u32,
}

impl FromStr for PixelCoord {
  type Err = String;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    let (x, y) = s
      .split(',')
      .map(str::trim)
      .map(str::parse::<u32>)
      .collect::<std::result::Result<Vec<_>, _>>()
      .map_err(|err| err.to_string())
      .and_then(|items| items.into_iter().collect_tuple().ok_or(String::from("expected X,Y")))?;
    Ok(Self { x, y })
  }
}

impl Display for PixelCoord {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_fmt(format_args!("{},{}", self.x, self.y))
  }
}

/// Validate pixel coordinates against the image dimensions and apply the
/// sensor border offset. Out-of-range entries are logged and dropped.
pub fn collect_points(pixels: &[PixelCoord], width: u32, height: u32) -> Vec<BadPoint> {
  pixels
    .iter()
    .filter_map(|pixel| {
      if pixel.x >= width.saturating_sub(EDGE_MARGIN) || pixel.y >= height.saturating_sub(EDGE_MARGIN) {
        warn!("Pixel {} is outside the correctable area of a {}x{} image, ignoring it", pixel, width, height);
        None
      } else {
        Some(BadPoint {
          x: pixel.x + SENSOR_BORDER,
          y: pixel.y + SENSOR_BORDER,
        })
      }
    })
    .collect()
}

/// Validate column coordinates and expand each into the full-height
/// rectangle the FixBadPixelsList opcode expects.
pub fn collect_rects(columns: &[u32], width: u32, height: u32) -> Vec<DngRect> {
  columns
    .iter()
    .filter_map(|&column| {
      if column >= width.saturating_sub(EDGE_MARGIN) {
        warn!("Column {} is outside the correctable area of a {}x{} image, ignoring it", column, width, height);
        None
      } else {
        Some(DngRect {
          top: 0,
          left: column + SENSOR_BORDER,
          bottom: height,
          right: column + SENSOR_BORDER + 1,
        })
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_pixel_coord() {
    assert_eq!("10,20".parse::<PixelCoord>(), Ok(PixelCoord { x: 10, y: 20 }));
    assert_eq!(" 3 , 4 ".parse::<PixelCoord>(), Ok(PixelCoord { x: 3, y: 4 }));
    assert!("10".parse::<PixelCoord>().is_err());
    assert!("10,20,30".parse::<PixelCoord>().is_err());
    assert!("a,b".parse::<PixelCoord>().is_err());
  }

  #[test]
  fn points_get_border_offset() {
    let points = collect_points(&[PixelCoord { x: 10, y: 20 }], 100, 100);
    assert_eq!(points, vec![BadPoint { x: 12, y: 22 }]);
  }

  #[test]
  fn out_of_range_points_are_dropped_not_fatal() {
    let pixels = [
      PixelCoord { x: 10, y: 20 },
      PixelCoord { x: 96, y: 20 }, // x >= width - 4
      PixelCoord { x: 10, y: 96 }, // y >= height - 4
      PixelCoord { x: 95, y: 95 },
    ];
    let points = collect_points(&pixels, 100, 100);
    assert_eq!(points, vec![BadPoint { x: 12, y: 22 }, BadPoint { x: 97, y: 97 }]);
  }

  #[test]
  fn columns_become_full_height_rects() {
    let rects = collect_rects(&[5], 100, 100);
    assert_eq!(
      rects,
      vec![DngRect {
        top: 0,
        left: 7,
        bottom: 100,
        right: 8,
      }]
    );
  }

  #[test]
  fn out_of_range_columns_are_dropped() {
    let rects = collect_rects(&[96, 3, 95], 100, 50);
    assert_eq!(
      rects,
      vec![
        DngRect {
          top: 0,
          left: 5,
          bottom: 50,
          right: 6,
        },
        DngRect {
          top: 0,
          left: 97,
          bottom: 50,
          right: 98,
        },
      ]
    );
  }

  #[test]
  fn tiny_images_reject_everything() {
    assert!(collect_points(&[PixelCoord { x: 0, y: 0 }], 3, 3).is_empty());
    assert!(collect_rects(&[0], 2, 2).is_empty());
  }
}
