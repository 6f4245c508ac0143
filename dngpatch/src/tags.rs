// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

//! TIFF and DNG tag identifiers used by the patcher.

use std::fmt::Debug;

/// Marker trait for tag enums, so IFD accessors can take any of them.
pub trait TiffTag: Into<u16> + Copy + Debug {}

macro_rules! tiff_tag_enum {
    {
        $( #[$enum_attr:meta] )*
        $vis:vis enum $name:ident {
            $($(#[$ident_attr:meta])* $tag:ident = $val:expr,)*
        }
    } => {
        $( #[$enum_attr] )*
        #[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
        #[non_exhaustive]
        $vis enum $name {
            $($(#[$ident_attr])* $tag,)*
        }

        impl From<$name> for u16 {
            fn from(tag: $name) -> u16 {
                match tag {
                    $( $name::$tag => $val, )*
                }
            }
        }

        impl TryFrom<u16> for $name {
            type Error = u16;

            fn try_from(value: u16) -> std::result::Result<Self, Self::Error> {
                match value {
                    $( $val => Ok($name::$tag), )*
                    other => Err(other),
                }
            }
        }

        impl TiffTag for $name {}
    };
}

tiff_tag_enum! {
/// TIFF baseline and TIFF-EP tags
pub enum BaselineTag {
    NewSubFileType = 254,
    ImageWidth = 256,
    ImageLength = 257,
    BitsPerSample = 258,
    Compression = 259,
    PhotometricInt = 262,
    Make = 271,
    Model = 272,
    StripOffsets = 273,
    Orientation = 274,
    SamplesPerPixel = 277,
    RowsPerStrip = 278,
    StripByteCounts = 279,
    XResolution = 282,
    YResolution = 283,
    Software = 305,
    DateTime = 306,
    Artist = 315,
    TileWidth = 322,
    TileLength = 323,
    TileOffsets = 324,
    TileByteCounts = 325,
    SubIFDs = 330,
    Xmp = 700,
    // Pointer tags, expanded into sub-IFDs on load
    ExifIFDPointer = 34665,
    GpsInfo = 34853,
}
}

tiff_tag_enum! {
/// DNG specific tags
pub enum DngTag {
    DNGVersion = 50706,
    DNGBackwardVersion = 50707,
    UniqueCameraModel = 50708,
    LocalizedCameraModel = 50709,
    BlackLevel = 50714,
    WhiteLevel = 50717,
    DefaultCropOrigin = 50719,
    DefaultCropSize = 50720,
    ActiveArea = 50829,
    // 1.3.0
    OpcodeList1 = 51008,
    OpcodeList2 = 51009,
    OpcodeList3 = 51022,
    NoiseProfile = 51041,
}
}

/// Human readable tag name for dumps and log messages.
pub fn tag_name(tag: u16) -> String {
  if let Ok(known) = BaselineTag::try_from(tag) {
    format!("{:?}", known)
  } else if let Ok(known) = DngTag::try_from(tag) {
    format!("{:?}", known)
  } else {
    format!("<?{}>", tag)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tag_roundtrip() {
    assert_eq!(u16::from(DngTag::OpcodeList1), 51008);
    assert_eq!(BaselineTag::try_from(256), Ok(BaselineTag::ImageWidth));
    assert_eq!(BaselineTag::try_from(9999), Err(9999));
  }

  #[test]
  fn tag_names() {
    assert_eq!(tag_name(50706), "DNGVersion");
    assert_eq!(tag_name(273), "StripOffsets");
    assert_eq!(tag_name(9999), "<?9999>");
  }
}
