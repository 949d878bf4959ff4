use crate::depth::DepthSample;
use depthscan_data::{CameraIntrinsics, LaserScan};

/// Decides whether a candidate range replaces the value a bin holds.
///
/// The acceptance window `[range_min, range_max]` is inclusive at both ends.
/// Bins start at `LaserScan::NO_RETURN`, which compares greater than every
/// accepted candidate, so the first in-range reading seeds a bin and every
/// later one must be strictly closer to win. Non-finite and out-of-window
/// candidates never displace a stored value; on an exact tie the stored
/// value is kept.
pub(crate) fn use_point(new_value: f64, old_value: f64, range_min: f64, range_max: f64) -> bool {
    if !(range_min..=range_max).contains(&new_value) {
        return false;
    }
    new_value < old_value
}

/// Projects a window of depth rows into the angular bins of `scan`.
///
/// Every pixel of rows `offset .. offset + scan_height` is inverse-projected
/// through the pinhole model: the column fixes the bearing, the sample fixes
/// the planar range along that bearing, and `use_point` resolves collisions
/// when several pixels land in one bin. With `scan_height > 1` obstacles at
/// any sampled row height tighten their bin, compressing vertical structure
/// into the single output slice.
///
/// The caller has already validated the window and the shell; this loop
/// performs no bounds checks beyond discarding bearings outside the scan.
pub(crate) fn project_window<T: DepthSample>(
    samples: &[T],
    width: u32,
    row_stride: usize,
    offset: usize,
    scan_height: u32,
    intrinsics: &CameraIntrinsics,
    scan: &mut LaserScan,
) {
    let unit_scaling = T::unit_scale();
    let constant_x = unit_scaling / intrinsics.focal_x;

    let angle_min = f64::from(scan.angle_min);
    let angle_increment = f64::from(scan.angle_increment);
    let range_min = f64::from(scan.range_min);
    let range_max = f64::from(scan.range_max);
    let n_bins = scan.ranges.len();

    for v in offset..offset + scan_height as usize {
        let row = &samples[v * row_stride..v * row_stride + width as usize];
        for (u, &depth) in row.iter().enumerate() {
            // The bearing depends on the column alone, so an invalid sample
            // still addresses the bin it would have measured.
            let th = -f64::atan2((u as f64 - intrinsics.center_x) * constant_x, unit_scaling);
            let index = ((th - angle_min) / angle_increment).floor();
            if index < 0. || index >= n_bins as f64 {
                // The column's bearing falls outside the scan span.
                continue;
            }
            let index = index as usize;

            // Invalid samples pass through raw so their markers reach the
            // acceptance check instead of claiming the bin.
            let mut r = depth.raw_value();
            if depth.is_valid() {
                let x = (u as f64 - intrinsics.center_x) * depth.raw_value() * constant_x;
                let z = depth.to_meters();
                // Range runs along the ray to the point, not the optical
                // axis; hypot keeps precision across small and large ranges.
                r = x.hypot(z);
            }

            if use_point(r, f64::from(scan.ranges[index]), range_min, range_max) {
                scan.ranges[index] = r as f32;
            }
        }
    }
}
