// Defaults matching common structured-light depth cameras.
pub(crate) const DEFAULT_SCAN_TIME: f32 = 1.0 / 30.0;
pub(crate) const DEFAULT_RANGE_MIN: f32 = 0.45;
pub(crate) const DEFAULT_RANGE_MAX: f32 = 10.0;
pub(crate) const DEFAULT_SCAN_HEIGHT: u32 = 1;
pub(crate) const DEFAULT_OUTPUT_FRAME: &str = "camera_depth_frame";
