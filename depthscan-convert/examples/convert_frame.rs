use clap::{Arg, Command};
use depthscan_convert::DepthScanConverter;
use depthscan_data::{CameraIntrinsics, DepthImage};

fn get_dimensions() -> (u32, u32) {
    let matches = Command::new("Depth frame converter.")
        .about("Converts a synthetic depth frame into a laser scan.")
        .disable_version_flag(true)
        .arg(
            Arg::new("width")
                .help("Depth image width in pixels")
                .value_parser(clap::value_parser!(u32))
                .default_value("160"),
        )
        .arg(
            Arg::new("height")
                .help("Depth image height in pixels")
                .value_parser(clap::value_parser!(u32))
                .default_value("120"),
        )
        .get_matches();

    let width: u32 = *matches.get_one("width").unwrap();
    let height: u32 = *matches.get_one("height").unwrap();
    (width, height)
}

/// A flat wall at three meters with a nearer post and a dropout stripe.
fn synthetic_depth(width: u32, height: u32) -> Vec<f32> {
    let mut samples = vec![3.0f32; (width * height) as usize];
    let post = width / 3..width / 3 + width / 10 + 1;
    let dropout = (width * 3 / 4) as usize;
    for v in 0..height as usize {
        for u in post.clone() {
            samples[v * width as usize + u as usize] = 1.2;
        }
        samples[v * width as usize + dropout] = f32::NAN;
    }
    samples
}

fn main() {
    env_logger::init();

    let (width, height) = get_dimensions();
    let image = DepthImage::from_meters(width, height, synthetic_depth(width, height));
    let intrinsics = CameraIntrinsics {
        focal_x: f64::from(width),
        focal_y: f64::from(width),
        center_x: f64::from(width - 1) / 2.,
        center_y: f64::from(height - 1) / 2.,
    };

    let mut converter = DepthScanConverter::new();
    converter.set_scan_height((height / 4).max(1));
    converter.set_output_frame("camera_depth_frame");

    let scan = converter.convert(&image, &intrinsics).unwrap();
    println!("{}", serde_json::to_string(&scan).unwrap());
}
