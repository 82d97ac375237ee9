//! Equatorial coordinate projections.
//!
//! Two models of the sky are supported:
//!
//! - **Sphere**: stars placed on a sphere around the viewer for the 3D view.
//!   Right ascension is negated so that the sky reads correctly when seen
//!   from inside the sphere.
//! - **Disk**: an all-sky view for an observer at a given latitude and
//!   sidereal time. Zenith distance maps linearly onto the disk radius
//!   (`r = 1 - 2 * alt / pi`), so the horizon sits at the unit circle and the
//!   zenith at the center.
//!
//! Both are pure functions of their inputs.

use std::f64::consts::FRAC_PI_2;
use std::fmt;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Altitude below which disk points are dropped, in degrees
pub const DEFAULT_HORIZON_DEG: f64 = 2.0;

/// Faintest magnitude drawn on the disk
pub const DEFAULT_DISK_MAGNITUDE_CUTOFF: f64 = 6.0;

/// Azimuth rotation applied by the 2D view, in degrees
pub const DEFAULT_DISK_ROTATION_DEG: f64 = 180.0;

/// Cosine of altitude under which a point is treated as the zenith
const ZENITH_EPSILON: f64 = 1e-12;

/// Place an equatorial position on a sphere of the given radius.
///
/// ```text
/// ra'  = -ra
/// x = r * cos(dec) * cos(ra')
/// y = r * sin(dec)
/// z = r * cos(dec) * sin(ra')
/// ```
pub fn equatorial_to_sphere(ra_deg: f64, dec_deg: f64, radius: f64) -> Vector3<f64> {
    let ra_rad = -ra_deg.to_radians();
    let dec_rad = dec_deg.to_radians();

    Vector3::new(
        radius * dec_rad.cos() * ra_rad.cos(),
        radius * dec_rad.sin(),
        radius * dec_rad.cos() * ra_rad.sin(),
    )
}

/// Position of a visible point on the all-sky disk. Always inside the unit disk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiskPoint {
    pub x: f64,
    pub y: f64,
}

impl DiskPoint {
    /// Distance from the disk center (0 at zenith, 1 at the horizon)
    pub fn radius(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Scale onto a canvas circle centered at `(center_x, center_y)`
    pub fn to_canvas(&self, center_x: f64, center_y: f64, radius_px: f64) -> (f64, f64) {
        (center_x + self.x * radius_px, center_y + self.y * radius_px)
    }
}

/// Why a point was left off the disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotVisible {
    /// Altitude is under the horizon threshold
    BelowHorizon,
    /// Magnitude is fainter than the visibility cutoff
    TooFaint,
    /// Position or magnitude is not a finite number
    Undisplayable,
}

impl fmt::Display for NotVisible {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::BelowHorizon => f.write_str("below horizon"),
            Self::TooFaint => f.write_str("fainter than cutoff"),
            Self::Undisplayable => f.write_str("no usable position"),
        }
    }
}

/// All-sky disk projection for one observer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiskProjection {
    /// Local sidereal time in degrees; also the RA at the meridian
    pub sidereal_time_deg: f64,
    /// Observer latitude in degrees
    pub latitude_deg: f64,
    /// Rotation applied to azimuth, in degrees
    pub rotation_offset_deg: f64,
    /// Points lower than this altitude are not visible, in degrees
    pub horizon_deg: f64,
    /// Points fainter than this magnitude are not visible
    pub magnitude_cutoff: f64,
}

impl DiskProjection {
    /// Projection with the default horizon, cutoff and rotation
    pub fn new(sidereal_time_deg: f64, latitude_deg: f64) -> Self {
        Self {
            sidereal_time_deg,
            latitude_deg,
            rotation_offset_deg: DEFAULT_DISK_ROTATION_DEG,
            horizon_deg: DEFAULT_HORIZON_DEG,
            magnitude_cutoff: DEFAULT_DISK_MAGNITUDE_CUTOFF,
        }
    }

    /// Override the azimuth rotation
    pub fn with_rotation(mut self, rotation_offset_deg: f64) -> Self {
        self.rotation_offset_deg = rotation_offset_deg;
        self
    }

    /// Override the horizon threshold
    pub fn with_horizon(mut self, horizon_deg: f64) -> Self {
        self.horizon_deg = horizon_deg;
        self
    }

    /// Override the magnitude cutoff
    pub fn with_magnitude_cutoff(mut self, magnitude_cutoff: f64) -> Self {
        self.magnitude_cutoff = magnitude_cutoff;
        self
    }

    /// Project one star. A NaN magnitude is treated as undisplayable.
    pub fn project(&self, ra_deg: f64, dec_deg: f64, magnitude: f64) -> Result<DiskPoint, NotVisible> {
        if magnitude.is_nan() {
            return Err(NotVisible::Undisplayable);
        }
        if magnitude > self.magnitude_cutoff {
            return Err(NotVisible::TooFaint);
        }
        self.project_position(ra_deg, dec_deg)
    }

    /// Project a position without any magnitude check.
    pub fn project_position(&self, ra_deg: f64, dec_deg: f64) -> Result<DiskPoint, NotVisible> {
        if !(ra_deg.is_finite() && dec_deg.is_finite()) {
            return Err(NotVisible::Undisplayable);
        }

        let hour_angle = ra_deg.to_radians() - self.sidereal_time_deg.to_radians();
        let dec = dec_deg.to_radians();
        let lat = self.latitude_deg.to_radians();

        let sin_alt = hour_angle.cos() * dec.cos() * lat.cos() + dec.sin() * lat.sin();
        let sin_alt = sin_alt.clamp(-1.0, 1.0);
        if sin_alt < self.horizon_deg.to_radians().sin() {
            return Err(NotVisible::BelowHorizon);
        }

        let cos_alt = (1.0 - sin_alt * sin_alt).sqrt();
        let r = 1.0 - sin_alt.asin() / FRAC_PI_2;
        if cos_alt < ZENITH_EPSILON {
            return Ok(DiskPoint { x: 0.0, y: 0.0 });
        }

        let sin_az = hour_angle.sin() * dec.cos() / cos_alt;
        let cos_az = (hour_angle.cos() * dec.cos() * lat.sin() - dec.sin() * lat.cos()) / cos_alt;

        let offset = self.rotation_offset_deg.to_radians();
        let rotated_sin = sin_az * offset.cos() + cos_az * offset.sin();
        let rotated_cos = cos_az * offset.cos() - sin_az * offset.sin();

        Ok(DiskPoint {
            x: r * rotated_sin,
            y: -r * rotated_cos,
        })
    }
}

/// Disk projection without a magnitude cutoff, using the default 2 degree horizon.
///
/// Returns `None` when the point is not visible; callers skip it rather than
/// drawing a placeholder.
pub fn equatorial_to_disk(
    ra_deg: f64,
    dec_deg: f64,
    sidereal_time_deg: f64,
    latitude_deg: f64,
    rotation_offset_deg: f64,
) -> Option<DiskPoint> {
    DiskProjection::new(sidereal_time_deg, latitude_deg)
        .with_rotation(rotation_offset_deg)
        .project_position(ra_deg, dec_deg)
        .ok()
}
