#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Struct to hold one planar laser scan.
///
/// Bins run from `angle_min` to `angle_max` in steps of `angle_increment`,
/// so `ranges[i]` is the resolved distance at bearing
/// `angle_min + i * angle_increment`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LaserScan {
    /// Frame the scan is expressed in. Usually not the camera's optical frame.
    pub frame_id: String,
    /// Bearing of the first bin in radian.
    pub angle_min: f32,
    /// Bearing of the last bin in radian.
    pub angle_max: f32,
    /// Angular distance between consecutive bins in radian.
    pub angle_increment: f32,
    /// Time between consecutive bins in seconds. Zero for camera-derived scans.
    pub time_increment: f32,
    /// Time between consecutive scans in seconds.
    pub scan_time: f32,
    /// Minimum accepted range in meters.
    pub range_min: f32,
    /// Maximum accepted range in meters.
    pub range_max: f32,
    /// Resolved range per bin in meters. `NO_RETURN` where no reading landed.
    pub ranges: Vec<f32>,
}

impl LaserScan {
    /// Placeholder for a bin that never received a valid reading.
    ///
    /// Positive infinity compares greater than every real range, so a
    /// closer-wins reduction seeds untouched bins without a special case.
    pub const NO_RETURN: f32 = f32::INFINITY;
}
