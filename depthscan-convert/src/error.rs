use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum ConvertError {
    InvalidFocalLength(f64),
    InvalidPrincipalPoint(f64, f64),
    ImageTooSmall(u32, u32),
    InvalidScanHeight(u32),
    StrideTooSmall(usize, usize),
    InsufficientSamples(usize, usize),
    WindowOutOfBounds(i64, u32, u32),
    RangesSizeMismatch(usize, usize),
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConvertError::InvalidFocalLength(focal) => write!(f, "Focal length must be positive and finite. Actually {}.", focal),
            ConvertError::InvalidPrincipalPoint(cx, cy) => write!(f, "Principal point must be finite. Actually ({}, {}).", cx, cy),
            ConvertError::ImageTooSmall(width, height) => write!(f, "Image must be at least two columns wide and one row tall. Actually {}x{}.", width, height),
            ConvertError::InvalidScanHeight(scan_height) => write!(f, "Scan height must cover at least one row. Actually {}.", scan_height),
            ConvertError::StrideTooSmall(row_stride, width) => write!(f, "Row stride of {} samples cannot hold rows of width {}.", row_stride, width),
            ConvertError::InsufficientSamples(expected, actual) => write!(f, "Expected a buffer of at least {} samples but found {}.", expected, actual),
            ConvertError::WindowOutOfBounds(offset, scan_height, height) => write!(f, "Row window starting at {} with {} rows exceeds the image height of {}.", offset, scan_height, height),
            ConvertError::RangesSizeMismatch(expected, actual) => write!(f, "Angular span calls for {} bins but the output scan holds {}.", expected, actual),
        }
    }
}

impl Error for ConvertError {}
