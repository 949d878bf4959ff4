use std::sync::mpsc;

mod constants;
mod depth;
mod error;
mod geometry;
mod project;
mod stream;
mod time;

use crate::constants::{
    DEFAULT_OUTPUT_FRAME, DEFAULT_RANGE_MAX, DEFAULT_RANGE_MIN, DEFAULT_SCAN_HEIGHT,
    DEFAULT_SCAN_TIME,
};
pub use crate::error::ConvertError;
use crate::geometry::{angle_between_rays, ray_through_pixel};
use crate::project::project_window;
use crate::stream::convert_frames;
pub use crate::stream::ConverterThreads;
use crossbeam_channel::bounded;
use depthscan_data::{CameraIntrinsics, DepthData, DepthFrame, DepthImage, LaserScan};

/// Converts dense depth images into planar laser scans.
///
/// Each pixel of a horizontal window of image rows is inverse-projected
/// through the pinhole camera model, bucketed into an angular bin by its
/// bearing, and reduced per bin to the closest accepted range, the way a
/// scanning rangefinder reports the nearest surface along each ray.
///
/// Configuration is fixed while a conversion runs; callers that need
/// concurrent frame streams use independent converter instances.
#[derive(Clone, Debug)]
pub struct DepthScanConverter {
    scan_time: f32,
    range_min: f32,
    range_max: f32,
    scan_height: u32,
    output_frame_id: String,
}

impl Default for DepthScanConverter {
    fn default() -> DepthScanConverter {
        DepthScanConverter {
            scan_time: DEFAULT_SCAN_TIME,
            range_min: DEFAULT_RANGE_MIN,
            range_max: DEFAULT_RANGE_MAX,
            scan_height: DEFAULT_SCAN_HEIGHT,
            output_frame_id: DEFAULT_OUTPUT_FRAME.to_string(),
        }
    }
}

impl DepthScanConverter {
    pub fn new() -> DepthScanConverter {
        DepthScanConverter::default()
    }

    /// Sets the time between consecutive scans, in seconds.
    ///
    /// The value is copied onto outgoing scans verbatim; it cannot be
    /// derived from single frames and is left to the caller to set.
    pub fn set_scan_time(&mut self, scan_time: f32) {
        self.scan_time = scan_time;
    }

    /// Sets the acceptance window for output ranges, in meters.
    ///
    /// Candidates outside `[range_min, range_max]` (inclusive) never enter
    /// a scan. `range_min` also decides how close a reading may be when
    /// several pixels land in the same angular bin.
    pub fn set_range_limits(&mut self, range_min: f32, range_max: f32) {
        self.range_min = range_min;
        self.range_max = range_max;
    }

    /// Sets the number of image rows, centered on the principal point,
    /// contributing to one scan.
    ///
    /// Each bin then receives up to `scan_height` candidate readings, so
    /// tall vertical hazards compress into the single output slice.
    pub fn set_scan_height(&mut self, scan_height: u32) {
        self.scan_height = scan_height;
    }

    /// Sets the frame label attached to outgoing scans.
    ///
    /// Usually not the camera's optical frame: scans follow the rangefinder
    /// convention with x forward, while optical frames have z forward.
    pub fn set_output_frame(&mut self, output_frame_id: &str) {
        self.output_frame_id = output_frame_id.to_string();
    }

    /// Converts one depth image into a laser scan.
    ///
    /// The angular span is derived from the image width and the intrinsics
    /// by inverse-projecting the boundary columns; the returned scan holds
    /// one bin per column, filled per the closest-wins reduction. Bins no
    /// pixel validly landed in hold [`LaserScan::NO_RETURN`].
    pub fn convert(
        &self,
        image: &DepthImage,
        intrinsics: &CameraIntrinsics,
    ) -> Result<LaserScan, ConvertError> {
        let mut scan = self.build_scan_shell(image, intrinsics)?;
        self.project_into(image, intrinsics, &mut scan)?;
        Ok(scan)
    }

    /// Fills the ranges of a caller-prepared scan shell from a depth image.
    ///
    /// The shell's `angle_min`, `angle_max`, `angle_increment`, `range_min`
    /// and `range_max` must be populated and its ranges sized to the angular
    /// span and reset to [`LaserScan::NO_RETURN`] beforehand. All
    /// preconditions are checked before the shell is touched; on error the
    /// shell is returned unmodified.
    pub fn project_into(
        &self,
        image: &DepthImage,
        intrinsics: &CameraIntrinsics,
        scan: &mut LaserScan,
    ) -> Result<(), ConvertError> {
        validate_intrinsics(intrinsics)?;
        validate_image(image)?;

        if self.scan_height == 0 {
            return Err(ConvertError::InvalidScanHeight(self.scan_height));
        }

        let expected = expected_bins(scan.angle_min, scan.angle_max, scan.angle_increment);
        if expected != scan.ranges.len() {
            return Err(ConvertError::RangesSizeMismatch(expected, scan.ranges.len()));
        }

        // Window start row, rounded half up.
        let offset =
            (intrinsics.center_y - f64::from(self.scan_height) / 2. + 0.5).floor() as i64;
        if offset < 0 || offset + i64::from(self.scan_height) > i64::from(image.height) {
            return Err(ConvertError::WindowOutOfBounds(
                offset,
                self.scan_height,
                image.height,
            ));
        }
        let offset = offset as usize;
        let row_stride = image.row_stride as usize;

        match &image.data {
            DepthData::MillimetersU16(samples) => project_window(
                samples,
                image.width,
                row_stride,
                offset,
                self.scan_height,
                intrinsics,
                scan,
            ),
            DepthData::MetersF32(samples) => project_window(
                samples,
                image.width,
                row_stride,
                offset,
                self.scan_height,
                intrinsics,
                scan,
            ),
        }
        Ok(())
    }

    fn build_scan_shell(
        &self,
        image: &DepthImage,
        intrinsics: &CameraIntrinsics,
    ) -> Result<LaserScan, ConvertError> {
        validate_intrinsics(intrinsics)?;
        validate_image(image)?;

        let center = ray_through_pixel(intrinsics, intrinsics.center_x, intrinsics.center_y);
        let left = ray_through_pixel(intrinsics, 0., intrinsics.center_y);
        let right =
            ray_through_pixel(intrinsics, f64::from(image.width - 1), intrinsics.center_y);

        // Positive bearings are to the left of the optical axis, so the
        // first bin belongs to the rightmost column.
        let angle_max = angle_between_rays(&left, &center) as f32;
        let angle_min = -angle_between_rays(&center, &right) as f32;
        let angle_increment =
            ((f64::from(angle_max) - f64::from(angle_min)) / f64::from(image.width - 1)) as f32;
        let n_bins = expected_bins(angle_min, angle_max, angle_increment);

        Ok(LaserScan {
            frame_id: self.output_frame_id.clone(),
            angle_min,
            angle_max,
            angle_increment,
            time_increment: 0.,
            scan_time: self.scan_time,
            range_min: self.range_min,
            range_max: self.range_max,
            ranges: vec![LaserScan::NO_RETURN; n_bins],
        })
    }
}

/// Number of bins an angular span calls for.
fn expected_bins(angle_min: f32, angle_max: f32, angle_increment: f32) -> usize {
    let span = f64::from(angle_max) - f64::from(angle_min);
    (span / f64::from(angle_increment)).floor() as usize + 1
}

fn validate_intrinsics(intrinsics: &CameraIntrinsics) -> Result<(), ConvertError> {
    for focal in [intrinsics.focal_x, intrinsics.focal_y] {
        if !focal.is_finite() || focal <= 0. {
            return Err(ConvertError::InvalidFocalLength(focal));
        }
    }
    if !intrinsics.center_x.is_finite() || !intrinsics.center_y.is_finite() {
        return Err(ConvertError::InvalidPrincipalPoint(
            intrinsics.center_x,
            intrinsics.center_y,
        ));
    }
    Ok(())
}

fn validate_image(image: &DepthImage) -> Result<(), ConvertError> {
    if image.width < 2 || image.height < 1 {
        return Err(ConvertError::ImageTooSmall(image.width, image.height));
    }
    let width = image.width as usize;
    let row_stride = image.row_stride as usize;
    if row_stride < width {
        return Err(ConvertError::StrideTooSmall(row_stride, width));
    }
    // The last row may be delivered without padding.
    let needed = (image.height as usize - 1) * row_stride + width;
    if image.data.len() < needed {
        return Err(ConvertError::InsufficientSamples(needed, image.data.len()));
    }
    Ok(())
}

/// Function to launch a conversion worker thread.
///
/// The worker drains depth frames from the returned sender, converts each
/// against its own copy of `converter`, and emits the scans on the returned
/// receiver. Frames that fail conversion are logged and dropped so one bad
/// frame never stalls the stream.
/// # Arguments
///
/// * `converter` - Converter configuration, owned by the worker for its lifetime.
pub fn run_converter(
    converter: DepthScanConverter,
) -> (
    ConverterThreads,
    mpsc::SyncSender<DepthFrame>,
    mpsc::Receiver<LaserScan>,
) {
    let (worker_terminator_tx, worker_terminator_rx) = bounded(10);
    let (frame_tx, frame_rx) = mpsc::sync_channel::<DepthFrame>(10);
    let (scan_tx, scan_rx) = mpsc::sync_channel::<LaserScan>(10);

    let worker_thread = Some(std::thread::spawn(move || {
        convert_frames(converter, frame_rx, scan_tx, worker_terminator_rx);
    }));

    let converter_threads = ConverterThreads {
        worker_terminator_tx,
        worker_thread,
    };

    (converter_threads, frame_tx, scan_rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAN: f32 = f32::NAN;
    const INF: f32 = f32::INFINITY;

    fn intrinsics(focal: f64, center_x: f64, center_y: f64) -> CameraIntrinsics {
        CameraIntrinsics {
            focal_x: focal,
            focal_y: focal,
            center_x,
            center_y,
        }
    }

    fn empty_shell(angle_min: f32, angle_max: f32, angle_increment: f32, n_bins: usize) -> LaserScan {
        LaserScan {
            frame_id: String::new(),
            angle_min,
            angle_max,
            angle_increment,
            time_increment: 0.,
            scan_time: 0.,
            range_min: 0.1,
            range_max: 10.,
            ranges: vec![LaserScan::NO_RETURN; n_bins],
        }
    }

    #[test]
    fn test_center_pixel_keeps_axial_depth() {
        // Lateral offset is zero at the principal point column, so the
        // resolved range equals the depth reading itself.
        let image = DepthImage::from_meters(
            3,
            3,
            vec![NAN, NAN, NAN, NAN, 2.0, NAN, NAN, NAN, NAN],
        );
        let converter = DepthScanConverter::new();
        let scan = converter.convert(&image, &intrinsics(100., 1., 1.)).unwrap();

        assert_eq!(scan.ranges.len(), 3);
        assert!((f64::from(scan.ranges[1]) - 2.0).abs() < 1e-9);
        assert_eq!(scan.ranges[0], INF);
        assert_eq!(scan.ranges[2], INF);

        let expected_angle = f64::atan2(0.01, 1.);
        assert!((f64::from(scan.angle_max) - expected_angle).abs() < 1e-6);
        assert!((f64::from(scan.angle_min) + expected_angle).abs() < 1e-6);
        assert_eq!(scan.frame_id, "camera_depth_frame");
        assert_eq!(scan.range_min, 0.45);
        assert_eq!(scan.range_max, 10.);
        assert_eq!(scan.time_increment, 0.);
        assert!((scan.scan_time - 1. / 30.).abs() < 1e-9);
    }

    #[test]
    fn test_millimeter_encoding() {
        // Zero is a missing return, 65535 mm lies beyond range_max; only the
        // center column contributes.
        let image = DepthImage::from_millimeters(3, 1, vec![0, 1500, 65535]);
        let converter = DepthScanConverter::new();
        let scan = converter.convert(&image, &intrinsics(100., 1., 0.)).unwrap();

        assert_eq!(scan.ranges.len(), 3);
        assert_eq!(scan.ranges[0], INF);
        assert!((f64::from(scan.ranges[1]) - 1.5).abs() < 1e-9);
        assert_eq!(scan.ranges[2], INF);
    }

    #[test]
    fn test_project_into_prepared_shell() {
        // Four columns spread over four bins; the rightmost column carries
        // an invalid sample and leaves its bin untouched.
        let image = DepthImage::from_meters(4, 1, vec![2.0, 1.0, 3.0, NAN]);
        let camera = intrinsics(1., 1.5, 0.5);
        let mut scan = empty_shell(-1.2, 0.7, 0.62, 4);

        let converter = DepthScanConverter::new();
        converter.project_into(&image, &camera, &mut scan).unwrap();

        // Columns map right to left: u = 3, 2, 1, 0 land in bins 0..4.
        assert_eq!(scan.ranges[0], INF);
        assert!((f64::from(scan.ranges[1]) - f64::hypot(1.5, 3.)).abs() < 1e-6);
        assert!((f64::from(scan.ranges[2]) - f64::hypot(0.5, 1.)).abs() < 1e-6);
        assert!((f64::from(scan.ranges[3]) - f64::hypot(3., 2.)).abs() < 1e-6);
    }

    #[test]
    fn test_closest_candidate_wins_across_rows() {
        let camera = intrinsics(100., 1., 1.);
        let mut converter = DepthScanConverter::new();
        converter.set_scan_height(3);

        let image = DepthImage::from_meters(
            3,
            3,
            vec![NAN, 5.0, NAN, NAN, 2.0, NAN, NAN, 7.0, NAN],
        );
        let scan = converter.convert(&image, &camera).unwrap();
        assert!((f64::from(scan.ranges[1]) - 2.0).abs() < 1e-9);

        // Same candidates in reverse row order resolve identically.
        let reversed = DepthImage::from_meters(
            3,
            3,
            vec![NAN, 7.0, NAN, NAN, 2.0, NAN, NAN, 5.0, NAN],
        );
        let scan_reversed = converter.convert(&reversed, &camera).unwrap();
        assert_eq!(scan.ranges, scan_reversed.ranges);
    }

    #[test]
    fn test_taller_window_only_tightens_bins() {
        let camera = intrinsics(100., 1., 1.);
        let image = DepthImage::from_meters(
            3,
            3,
            vec![NAN, 2.0, NAN, NAN, 5.0, NAN, NAN, 7.0, NAN],
        );

        let mut converter = DepthScanConverter::new();
        converter.set_scan_height(1);
        let single = converter.convert(&image, &camera).unwrap();
        converter.set_scan_height(3);
        let tall = converter.convert(&image, &camera).unwrap();

        assert!((f64::from(single.ranges[1]) - 5.0).abs() < 1e-9);
        assert!((f64::from(tall.ranges[1]) - 2.0).abs() < 1e-9);
        for (t, s) in tall.ranges.iter().zip(single.ranges.iter()) {
            assert!(t <= s);
        }
    }

    #[test]
    fn test_out_of_window_candidates_leave_sentinel() {
        let image = DepthImage::from_meters(2, 1, vec![0.2, 20.0]);
        let converter = DepthScanConverter::new();
        let scan = converter.convert(&image, &intrinsics(100., 0.5, 0.)).unwrap();
        assert!(scan.ranges.iter().all(|r| *r == INF));
    }

    #[test]
    fn test_acceptance_window_is_inclusive() {
        let camera = intrinsics(100., 1., 0.);
        let converter = DepthScanConverter::new();

        let image = DepthImage::from_meters(3, 1, vec![NAN, 10.0, NAN]);
        let scan = converter.convert(&image, &camera).unwrap();
        assert_eq!(scan.ranges[1], 10.);

        let image = DepthImage::from_meters(3, 1, vec![NAN, 0.45, NAN]);
        let scan = converter.convert(&image, &camera).unwrap();
        assert_eq!(scan.ranges[1], 0.45);
    }

    #[test]
    fn test_columns_outside_scan_span_are_discarded() {
        // The shell covers three bins. The rightmost column's bearing falls
        // below angle_min and is discarded; the leftmost column's bearing
        // exceeds angle_max but still floors into the last bin.
        let image = DepthImage::from_meters(4, 1, vec![2.0, 1.0, 2.0, 2.0]);
        let camera = intrinsics(1., 1.5, 0.5);
        let mut scan = empty_shell(-0.5, 0.5, 0.5, 3);

        let converter = DepthScanConverter::new();
        converter.project_into(&image, &camera, &mut scan).unwrap();

        assert!((f64::from(scan.ranges[0]) - f64::hypot(1., 2.)).abs() < 1e-6);
        assert!((f64::from(scan.ranges[1]) - f64::hypot(0.5, 1.)).abs() < 1e-6);
        assert!((f64::from(scan.ranges[2]) - f64::hypot(3., 2.)).abs() < 1e-6);
    }

    #[test]
    fn test_padded_row_stride() {
        // Rows sit four samples apart in the buffer; the last row arrives
        // without padding. The padding sample must never be read as a pixel.
        let image = DepthImage {
            width: 3,
            height: 2,
            row_stride: 4,
            data: DepthData::MetersF32(vec![NAN, 5.0, NAN, 99.0, NAN, 2.0, NAN]),
        };
        let mut converter = DepthScanConverter::new();
        converter.set_scan_height(2);
        let scan = converter.convert(&image, &intrinsics(100., 1., 1.)).unwrap();

        assert_eq!(scan.ranges.len(), 3);
        assert_eq!(scan.ranges[0], INF);
        assert!((f64::from(scan.ranges[1]) - 2.0).abs() < 1e-9);
        assert_eq!(scan.ranges[2], INF);
    }

    #[test]
    fn test_window_out_of_bounds_is_rejected() {
        let converter = {
            let mut c = DepthScanConverter::new();
            c.set_scan_height(3);
            c
        };

        let image = DepthImage::from_meters(3, 1, vec![1.0, 1.0, 1.0]);
        assert!(matches!(
            converter.convert(&image, &intrinsics(100., 1., 0.)),
            Err(ConvertError::WindowOutOfBounds(-1, 3, 1))
        ));

        let image = DepthImage::from_meters(3, 3, vec![1.0; 9]);
        assert!(matches!(
            converter.convert(&image, &intrinsics(100., 1., 2.)),
            Err(ConvertError::WindowOutOfBounds(1, 3, 3))
        ));
    }

    #[test]
    fn test_mismatched_shell_is_rejected() {
        let image = DepthImage::from_meters(4, 1, vec![2.0; 4]);
        let camera = intrinsics(1., 1.5, 0.5);
        let mut scan = empty_shell(-1.2, 0.7, 0.62, 2);

        let converter = DepthScanConverter::new();
        assert!(matches!(
            converter.project_into(&image, &camera, &mut scan),
            Err(ConvertError::RangesSizeMismatch(4, 2))
        ));
        // Rejected before any mutation.
        assert!(scan.ranges.iter().all(|r| *r == INF));
    }

    #[test]
    fn test_invalid_intrinsics_are_rejected() {
        let image = DepthImage::from_meters(2, 1, vec![1.0, 1.0]);
        let converter = DepthScanConverter::new();

        let mut camera = intrinsics(0., 0.5, 0.);
        assert!(matches!(
            converter.convert(&image, &camera),
            Err(ConvertError::InvalidFocalLength(_))
        ));

        camera = intrinsics(100., f64::NAN, 0.);
        assert!(matches!(
            converter.convert(&image, &camera),
            Err(ConvertError::InvalidPrincipalPoint(_, _))
        ));
    }

    #[test]
    fn test_malformed_buffers_are_rejected() {
        let converter = DepthScanConverter::new();
        let camera = intrinsics(100., 1., 0.);

        let image = DepthImage {
            width: 3,
            height: 1,
            row_stride: 2,
            data: DepthData::MetersF32(vec![1.0, 1.0, 1.0]),
        };
        assert!(matches!(
            converter.convert(&image, &camera),
            Err(ConvertError::StrideTooSmall(2, 3))
        ));

        let image = DepthImage {
            width: 3,
            height: 2,
            row_stride: 3,
            data: DepthData::MetersF32(vec![1.0; 5]),
        };
        assert!(matches!(
            converter.convert(&image, &camera),
            Err(ConvertError::InsufficientSamples(6, 5))
        ));

        let image = DepthImage::from_meters(1, 1, vec![1.0]);
        assert!(matches!(
            converter.convert(&image, &camera),
            Err(ConvertError::ImageTooSmall(1, 1))
        ));
    }

    #[test]
    fn test_zero_scan_height_is_rejected() {
        let mut converter = DepthScanConverter::new();
        converter.set_scan_height(0);
        let image = DepthImage::from_meters(2, 1, vec![1.0, 1.0]);
        assert!(matches!(
            converter.convert(&image, &intrinsics(100., 0.5, 0.)),
            Err(ConvertError::InvalidScanHeight(0))
        ));
    }

    #[test]
    fn test_run_converter_streams_scans() {
        let (threads, frame_tx, scan_rx) = run_converter(DepthScanConverter::new());

        // A frame whose window misses the image is logged and dropped.
        frame_tx
            .send(DepthFrame {
                image: DepthImage::from_millimeters(3, 1, vec![0, 1500, 65535]),
                intrinsics: intrinsics(100., 1., 5.),
            })
            .unwrap();
        frame_tx
            .send(DepthFrame {
                image: DepthImage::from_millimeters(3, 1, vec![0, 1500, 65535]),
                intrinsics: intrinsics(100., 1., 0.),
            })
            .unwrap();

        let scan = scan_rx.recv().unwrap();
        assert_eq!(scan.ranges.len(), 3);
        assert!((f64::from(scan.ranges[1]) - 1.5).abs() < 1e-9);
        assert_eq!(scan.ranges[0], INF);
        assert_eq!(scan.ranges[2], INF);

        drop(threads);
    }
}
