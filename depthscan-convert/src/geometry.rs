use depthscan_data::CameraIntrinsics;

/// Unit-depth ray through a pixel, in the camera optical frame.
pub(crate) fn ray_through_pixel(intrinsics: &CameraIntrinsics, u: f64, v: f64) -> [f64; 3] {
    [
        (u - intrinsics.center_x) / intrinsics.focal_x,
        (v - intrinsics.center_y) / intrinsics.focal_y,
        1.0,
    ]
}

/// Euclidean length of a ray anchored at the camera origin.
pub(crate) fn magnitude_of_ray(ray: &[f64; 3]) -> f64 {
    (ray[0] * ray[0] + ray[1] * ray[1] + ray[2] * ray[2]).sqrt()
}

/// Angle between two rays anchored at the camera origin,
/// `acos(a . b / (|a| |b|))`.
pub(crate) fn angle_between_rays(ray1: &[f64; 3], ray2: &[f64; 3]) -> f64 {
    let dot = ray1[0] * ray2[0] + ray1[1] * ray2[1] + ray1[2] * ray2[2];
    let cosine = dot / (magnitude_of_ray(ray1) * magnitude_of_ray(ray2));
    // Rounding can push the cosine of near-parallel rays past 1.
    cosine.clamp(-1.0, 1.0).acos()
}
