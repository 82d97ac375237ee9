//! Nearest-element lookup for mouse picking.
//!
//! Everything here works in screen pixels. Candidates are produced by
//! projecting stars or arc samples with a [`SkyCamera`]; the search itself is
//! a plain linear scan, which is fast enough for a few thousand stars.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::celestial::equatorial_to_sphere;
use crate::screen::{world_to_screen, ScreenPoint, SkyCamera, Viewport};

/// Pixel radius inside which a click selects something
pub const DEFAULT_MIN_SELECTION_DISTANCE: f64 = 10.0;

/// Faintest magnitude that can be picked
pub const DEFAULT_MAX_PICK_MAGNITUDE: f64 = 6.0;

/// Pixel radius of a flat-map click
pub const DEFAULT_MAP_CLICK_RADIUS: f64 = 3.0;

/// A star projected to the screen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PickCandidate {
    pub index: usize,
    pub screen: ScreenPoint,
    pub magnitude: f64,
}

/// Closest star to a query point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointHit {
    pub index: usize,
    pub screen: ScreenPoint,
    pub distance: f64,
}

/// Closest polyline to a query point, by position in the input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveHit {
    pub curve: usize,
    pub distance: f64,
}

/// Closest candidate no fainter than `max_magnitude`.
///
/// NaN magnitudes never qualify. On equal distance the earlier candidate
/// wins.
pub fn find_closest_point(
    query: &ScreenPoint,
    candidates: &[PickCandidate],
    max_magnitude: f64,
) -> Option<PointHit> {
    let mut best: Option<PointHit> = None;
    for candidate in candidates {
        if candidate.magnitude.is_nan() || candidate.magnitude > max_magnitude {
            continue;
        }
        let distance = query.distance_to(&candidate.screen);
        if best.map_or(true, |hit| distance < hit.distance) {
            best = Some(PointHit {
                index: candidate.index,
                screen: candidate.screen,
                distance,
            });
        }
    }
    best
}

/// Curve with the nearest vertex to `query`.
///
/// A curve's distance is the minimum over its vertices; empty curves are
/// skipped. On equal distance the earlier curve wins.
pub fn find_closest_curve<C>(query: &ScreenPoint, curves: &[C]) -> Option<CurveHit>
where
    C: AsRef<[ScreenPoint]>,
{
    let mut best: Option<CurveHit> = None;
    for (curve, vertices) in curves.iter().enumerate() {
        let nearest = vertices
            .as_ref()
            .iter()
            .map(|vertex| query.distance_to(vertex))
            .fold(f64::INFINITY, f64::min);
        if !nearest.is_finite() {
            continue;
        }
        if best.map_or(true, |hit| nearest < hit.distance) {
            best = Some(CurveHit {
                curve,
                distance: nearest,
            });
        }
    }
    best
}

/// Maximum pixel distance for a pick to count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PickThreshold {
    pub min_selection_distance: f64,
}

impl Default for PickThreshold {
    fn default() -> Self {
        Self {
            min_selection_distance: DEFAULT_MIN_SELECTION_DISTANCE,
        }
    }
}

impl PickThreshold {
    pub fn new(min_selection_distance: f64) -> Self {
        Self {
            min_selection_distance,
        }
    }

    /// Strictly closer than the threshold
    pub fn accepts(&self, distance: f64) -> bool {
        distance < self.min_selection_distance
    }

    pub fn filter_point(&self, hit: Option<PointHit>) -> Option<PointHit> {
        hit.filter(|hit| self.accepts(hit.distance))
    }

    pub fn filter_curve(&self, hit: Option<CurveHit>) -> Option<CurveHit> {
        hit.filter(|hit| self.accepts(hit.distance))
    }
}

/// Screen positions of every displayable star in front of the camera.
pub fn project_stars(
    catalog: &Catalog,
    camera: &SkyCamera,
    viewport: &Viewport,
    radius: f64,
) -> Vec<PickCandidate> {
    let view_projection = camera.view_projection();
    catalog
        .stars()
        .iter()
        .filter(|star| star.is_displayable())
        .filter_map(|star| {
            let world: Vector3<f64> = equatorial_to_sphere(star.ra_deg, star.dec_deg, radius);
            let screen = world_to_screen(&world, &view_projection, viewport.width, viewport.height)?;
            Some(PickCandidate {
                index: star.index,
                screen,
                magnitude: star.apparent_magnitude,
            })
        })
        .collect()
}

/// Brightest candidate at most `radius` pixels from `query`.
///
/// Used by the flat map, where clicks favour bright stars over near ones.
/// NaN magnitudes are ignored; ties keep the earlier candidate.
pub fn find_brightest_within(
    query: &ScreenPoint,
    candidates: &[PickCandidate],
    radius: f64,
) -> Option<PickCandidate> {
    candidates
        .iter()
        .filter(|c| !c.magnitude.is_nan() && query.distance_to(&c.screen) <= radius)
        .fold(None, |best: Option<&PickCandidate>, c| match best {
            Some(b) if b.magnitude <= c.magnitude => Some(b),
            _ => Some(c),
        })
        .copied()
}
