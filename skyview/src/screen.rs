//! World-to-screen mapping and the perspective camera of the 3D view.

use nalgebra::{Matrix4, Perspective3, Point3, Vector3, Vector4};
use serde::{Deserialize, Serialize};
use sky_types::Equatorial;

use crate::celestial::equatorial_to_sphere;

/// Distance along the view ray used when recovering the camera pointing
pub const POINTING_DISTANCE: f64 = 1000.0;

const DEFAULT_CAMERA_FOV_DEG: f64 = 75.0;
const DEFAULT_NEAR: f64 = 1.0;
const DEFAULT_FAR: f64 = 2000.0;

fn usable_aspect(aspect: f64) -> f64 {
    if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        1.0
    }
}

/// Pixel position, origin at the top-left corner, y growing downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean pixel distance
    pub fn distance_to(&self, other: &ScreenPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Size of the drawing surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Width over height, or 1 for an empty or non-finite viewport.
    pub fn aspect(&self) -> f64 {
        let aspect = self.width / self.height;
        if self.width > 0.0 && self.height > 0.0 && aspect.is_finite() {
            aspect
        } else {
            1.0
        }
    }
}

/// Map a world point through a view-projection matrix onto the viewport.
///
/// Returns `None` for points behind the camera (`w <= 0`) or when the
/// result is not finite.
pub fn world_to_screen(
    point: &Vector3<f64>,
    view_projection: &Matrix4<f64>,
    viewport_width: f64,
    viewport_height: f64,
) -> Option<ScreenPoint> {
    let clip = view_projection * Vector4::new(point.x, point.y, point.z, 1.0);
    if clip.w <= 0.0 {
        return None;
    }

    let ndc_x = clip.x / clip.w;
    let ndc_y = clip.y / clip.w;
    let x = (ndc_x + 1.0) / 2.0 * viewport_width;
    let y = (1.0 - ndc_y) / 2.0 * viewport_height;

    (x.is_finite() && y.is_finite()).then_some(ScreenPoint { x, y })
}

/// Equatorial direction the camera is looking at.
///
/// Projects a point `aux_distance` along the forward ray and inverts the
/// sphere mapping: `ra = atan2(-z, x)`, `dec = asin(y / |p|)`. RA is
/// normalized into [0, 360).
pub fn screen_direction_to_equatorial(
    camera_position: &Vector3<f64>,
    forward: &Vector3<f64>,
    aux_distance: f64,
) -> Option<Equatorial> {
    let target = camera_position + forward * aux_distance;
    let length = target.norm();
    if length == 0.0 || !length.is_finite() {
        return None;
    }

    let ra = (-target.z).atan2(target.x).to_degrees();
    let dec = (target.y / length).clamp(-1.0, 1.0).asin().to_degrees();
    Some(Equatorial::new(ra, dec).normalized())
}

/// Perspective camera sitting inside the celestial sphere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkyCamera {
    /// Camera position in world units
    pub position: Vector3<f64>,
    /// Unit view direction
    forward: Vector3<f64>,
    /// Vertical field of view in degrees
    pub fov_deg: f64,
    /// Width over height
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
}

impl SkyCamera {
    /// Camera at `(0, 0, 1)` looking toward RA 0, Dec 0.
    ///
    /// A zero, negative or non-finite `aspect` is replaced by 1.
    pub fn new(fov_deg: f64, aspect: f64) -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 1.0),
            forward: Vector3::new(1.0, 0.0, 0.0),
            fov_deg,
            aspect: usable_aspect(aspect),
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
        }
    }

    /// Unit view direction
    pub fn forward(&self) -> Vector3<f64> {
        self.forward
    }

    /// Point the camera along `direction`. Zero-length directions are ignored.
    pub fn look_along(&mut self, direction: &Vector3<f64>) {
        if let Some(unit) = direction.try_normalize(f64::EPSILON) {
            self.forward = unit;
        }
    }

    /// Point the camera at an equatorial position.
    pub fn look_at_equatorial(&mut self, ra_deg: f64, dec_deg: f64) {
        let direction = equatorial_to_sphere(ra_deg, dec_deg, 1.0);
        self.look_along(&direction);
    }

    /// What the camera is pointing at, used for the 3D to 2D hand-off
    pub fn pointing(&self) -> Option<Equatorial> {
        screen_direction_to_equatorial(&self.position, &self.forward, POINTING_DISTANCE)
    }

    /// World-to-camera transform
    pub fn view_matrix(&self) -> Matrix4<f64> {
        // Fall back to +z as "up" when looking straight at a pole
        let up = if self.forward.cross(&Vector3::y()).norm() < 1e-9 {
            Vector3::z()
        } else {
            Vector3::y()
        };
        let eye = Point3::from(self.position);
        let target = Point3::from(self.position + self.forward);
        Matrix4::look_at_rh(&eye, &target, &up)
    }

    /// Camera-to-clip transform. Out-of-range fields fall back to defaults.
    pub fn projection_matrix(&self) -> Matrix4<f64> {
        let fov_deg = if self.fov_deg.is_finite() && self.fov_deg > 0.0 && self.fov_deg < 180.0 {
            self.fov_deg
        } else {
            DEFAULT_CAMERA_FOV_DEG
        };
        let depth_ok = self.near.is_finite()
            && self.far.is_finite()
            && self.near > 0.0
            && self.far - self.near > f64::EPSILON * self.far.abs().max(1.0);
        let (near, far) = if depth_ok {
            (self.near, self.far)
        } else {
            (DEFAULT_NEAR, DEFAULT_FAR)
        };
        *Perspective3::new(usable_aspect(self.aspect), fov_deg.to_radians(), near, far).as_matrix()
    }

    /// Combined world-to-clip transform
    pub fn view_projection(&self) -> Matrix4<f64> {
        self.projection_matrix() * self.view_matrix()
    }

    /// Project a world point to pixels using this camera
    pub fn project(&self, point: &Vector3<f64>, viewport: &Viewport) -> Option<ScreenPoint> {
        world_to_screen(
            point,
            &self.view_projection(),
            viewport.width,
            viewport.height,
        )
    }
}

impl Default for SkyCamera {
    fn default() -> Self {
        Self::new(DEFAULT_CAMERA_FOV_DEG, 1.0)
    }
}
