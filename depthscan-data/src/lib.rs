pub mod image;
pub mod scan;

pub use image::{CameraIntrinsics, DepthData, DepthFrame, DepthImage};
pub use scan::LaserScan;
