//! Equirectangular map of the whole sky.
//!
//! RA runs left to right across `width`, Dec from +90 at the top to -90 at
//! the bottom. The map can be scrolled horizontally in 15 degree steps; a
//! link whose endpoints end up more than half the map apart is treated as
//! crossing the seam and is not drawn.

use serde::{Deserialize, Serialize};

use crate::annotations::AnnotationStore;
use crate::catalog::Catalog;
use crate::picking::{find_brightest_within, PickCandidate, DEFAULT_MAP_CLICK_RADIUS};
use crate::screen::ScreenPoint;

/// Degrees the map scrolls per step
pub const MAP_SHIFT_STEP_DEG: f64 = 15.0;

/// Stars at or above this magnitude are not drawn on the map
pub const MAP_MAGNITUDE_LIMIT: f64 = 6.0;

/// Flat map geometry and scroll state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlatMap {
    pub width: f64,
    pub height: f64,
    /// Horizontal scroll in degrees, always in [0, 360)
    ra_offset: f64,
}

/// A drawable link on the map
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapSegment {
    pub start: ScreenPoint,
    pub end: ScreenPoint,
}

impl FlatMap {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ra_offset: 0.0,
        }
    }

    pub fn ra_offset(&self) -> f64 {
        self.ra_offset
    }

    /// Scroll by `delta_deg`, wrapping into [0, 360).
    pub fn shift(&mut self, delta_deg: f64) {
        self.ra_offset = (self.ra_offset + delta_deg).rem_euclid(360.0);
    }

    fn shifted_ra(&self, ra_deg: f64) -> f64 {
        (ra_deg + self.ra_offset).rem_euclid(360.0)
    }

    /// Pixel position of an equatorial point
    pub fn project(&self, ra_deg: f64, dec_deg: f64) -> ScreenPoint {
        ScreenPoint::new(
            self.shifted_ra(ra_deg) / 360.0 * self.width,
            (90.0 - dec_deg) / 180.0 * self.height,
        )
    }

    /// Segment between two positions, or `None` when it would cross the seam
    /// or either end is not a finite position.
    pub fn link_segment(&self, a: (f64, f64), b: (f64, f64)) -> Option<MapSegment> {
        let (ra_a, dec_a) = a;
        let (ra_b, dec_b) = b;
        if ![ra_a, dec_a, ra_b, dec_b].iter().all(|v| v.is_finite()) {
            return None;
        }
        if (self.shifted_ra(ra_a) - self.shifted_ra(ra_b)).abs() >= 180.0 {
            return None;
        }
        Some(MapSegment {
            start: self.project(ra_a, dec_a),
            end: self.project(ra_b, dec_b),
        })
    }

    /// Labels for the RA axis: pixel x and the RA shown there, every 15 degrees.
    pub fn ra_axis_labels(&self) -> Vec<(f64, f64)> {
        (0..=24)
            .map(|step| {
                let at = step as f64 * MAP_SHIFT_STEP_DEG;
                (at / 360.0 * self.width, (at - self.ra_offset).rem_euclid(360.0))
            })
            .collect()
    }

    /// Screen positions of the stars drawn on the map
    pub fn star_candidates(&self, catalog: &Catalog) -> Vec<PickCandidate> {
        catalog
            .stars()
            .iter()
            .filter(|star| star.is_displayable() && star.apparent_magnitude < MAP_MAGNITUDE_LIMIT)
            .map(|star| PickCandidate {
                index: star.index,
                screen: self.project(star.ra_deg, star.dec_deg),
                magnitude: star.apparent_magnitude,
            })
            .collect()
    }

    /// Star selected by a click: the brightest within 3 pixels.
    pub fn pick(&self, catalog: &Catalog, click: &ScreenPoint) -> Option<usize> {
        let candidates = self.star_candidates(catalog);
        find_brightest_within(click, &candidates, DEFAULT_MAP_CLICK_RADIUS)
            .map(|candidate| candidate.index)
    }

    /// Drawable segments for every resolvable link
    pub fn link_segments(&self, store: &AnnotationStore, catalog: &Catalog) -> Vec<MapSegment> {
        store
            .links()
            .iter()
            .filter_map(|link| {
                let a = catalog.get(link.star_index_a)?;
                let b = catalog.get(link.star_index_b)?;
                if !(a.is_displayable() && b.is_displayable()) {
                    return None;
                }
                self.link_segment((a.ra_deg, a.dec_deg), (b.ra_deg, b.dec_deg))
            })
            .collect()
    }
}
