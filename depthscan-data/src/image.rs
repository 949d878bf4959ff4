#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Raw depth sample buffer in one of the supported pixel encodings.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DepthData {
    /// 16-bit unsigned distance in millimeters. Zero marks a missing return.
    MillimetersU16(Vec<u16>),
    /// 32-bit float distance in meters. NaN and infinities mark invalid samples.
    MetersF32(Vec<f32>),
}

impl DepthData {
    /// Number of samples in the buffer.
    pub fn len(&self) -> usize {
        match self {
            DepthData::MillimetersU16(samples) => samples.len(),
            DepthData::MetersF32(samples) => samples.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One dense depth image.
///
/// The buffer stores rows top to bottom, `row_stride` samples apart. The
/// stride equals `width` for tightly packed images and exceeds it when rows
/// carry padding.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DepthImage {
    /// Number of pixel columns.
    pub width: u32,
    /// Number of pixel rows.
    pub height: u32,
    /// Samples per row in the buffer.
    pub row_stride: u32,
    /// The sample buffer.
    pub data: DepthData,
}

impl DepthImage {
    /// Tightly packed image from 16-bit millimeter samples.
    pub fn from_millimeters(width: u32, height: u32, samples: Vec<u16>) -> DepthImage {
        assert_eq!(
            samples.len(),
            (width * height) as usize,
            "sample count must match width * height"
        );
        DepthImage {
            width,
            height,
            row_stride: width,
            data: DepthData::MillimetersU16(samples),
        }
    }

    /// Tightly packed image from float meter samples.
    pub fn from_meters(width: u32, height: u32, samples: Vec<f32>) -> DepthImage {
        assert_eq!(
            samples.len(),
            (width * height) as usize,
            "sample count must match width * height"
        );
        DepthImage {
            width,
            height,
            row_stride: width,
            data: DepthData::MetersF32(samples),
        }
    }

    /// Tightly packed image decoded from a 16-bit millimeter wire buffer.
    ///
    /// Depth cameras deliver two bytes per sample; `big_endian` selects the
    /// byte order of the source device.
    pub fn from_millimeter_bytes(
        width: u32,
        height: u32,
        big_endian: bool,
        bytes: &[u8],
    ) -> DepthImage {
        assert_eq!(
            bytes.len(),
            (width * height) as usize * 2,
            "byte count must match two bytes per pixel"
        );
        let u16_from_bytes = if big_endian {
            u16::from_be_bytes
        } else {
            u16::from_le_bytes
        };
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| u16_from_bytes([pair[0], pair[1]]))
            .collect();
        DepthImage::from_millimeters(width, height, samples)
    }
}

/// Pinhole camera intrinsics, in pixel units.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CameraIntrinsics {
    /// Horizontal focal length.
    pub focal_x: f64,
    /// Vertical focal length.
    pub focal_y: f64,
    /// Principal point column.
    pub center_x: f64,
    /// Principal point row.
    pub center_y: f64,
}

/// A depth image paired with the intrinsics it was captured under.
///
/// This is the unit of work handed to the conversion worker; the pairing
/// matters because intrinsics can change between frames on cameras that
/// switch resolution modes.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DepthFrame {
    pub image: DepthImage,
    pub intrinsics: CameraIntrinsics,
}
