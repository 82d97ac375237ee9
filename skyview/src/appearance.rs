//! Magnitude-dependent star sizes and colors.
//!
//! All sizes are in the renderer's units: point-sprite size for the sphere
//! and pixel radius for the disk and flat map.

use sky_types::SpectralClass;

/// Display color for a star of the given class and magnitude.
///
/// The class color is dimmed by `clamp(1 - 0.03 * m, 0.8, 1)`. NaN
/// magnitudes get the undimmed color.
pub fn star_color(class: SpectralClass, magnitude: f64) -> [f32; 3] {
    let factor = if magnitude.is_nan() {
        1.0
    } else {
        (1.0 - 0.03 * magnitude).clamp(0.8, 1.0) as f32
    };
    class.base_color().map(|channel| channel * factor)
}

/// Point-sprite size on the sphere: `max(e^(-0.28 m), 0.1) * 200`.
pub fn sphere_point_size(magnitude: f64) -> f64 {
    (-0.28 * magnitude).exp().max(0.1) * 200.0
}

/// Marker radius on the all-sky disk: `min(10, 6 e^(-0.38 m))`.
pub fn disk_marker_radius(magnitude: f64) -> f64 {
    (6.0 * (-0.38 * magnitude).exp()).min(10.0)
}

/// Marker radius on the flat map, capped at 4 pixels.
pub fn map_marker_radius(magnitude: f64) -> f64 {
    (6.0 * (-0.38 * magnitude).exp()).min(4.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_star_color_dimming_is_clamped() {
        let bright = star_color(SpectralClass::G, -1.5);
        assert_eq!(bright, SpectralClass::G.base_color());

        let mid = star_color(SpectralClass::Other, 5.0);
        assert_relative_eq!(mid[0], 0.85, epsilon = 1e-6);

        let faint = star_color(SpectralClass::O, 12.0);
        assert_relative_eq!(faint[2], 0.8, epsilon = 1e-6);
        assert_relative_eq!(faint[0], 0.4, epsilon = 1e-6);
    }

    #[test]
    fn test_sphere_point_size() {
        assert_relative_eq!(sphere_point_size(0.0), 200.0);
        assert!(sphere_point_size(1.0) < sphere_point_size(0.0));
        // Very faint stars bottom out at 0.1 * 200
        assert_relative_eq!(sphere_point_size(20.0), 20.0);
    }

    #[test]
    fn test_marker_radii_are_capped() {
        assert_relative_eq!(disk_marker_radius(0.0), 6.0);
        assert_relative_eq!(disk_marker_radius(-3.0), 10.0);
        assert_relative_eq!(map_marker_radius(-1.0), 4.0);
        assert!(disk_marker_radius(6.0) < 1.0);
    }
}
