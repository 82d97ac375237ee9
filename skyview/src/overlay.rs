//! Polylines drawn on top of the star field.
//!
//! Every overlay is a list of world-space polylines on the celestial sphere:
//!
//! - the RA/Dec coordinate grid,
//! - the galactic band (centerline plus two edges),
//! - user constellations as great-circle arcs, tagged with their link id and
//!   group name so they can be picked and labelled.
//!
//! Overlays carry no renderer state. The caller draws them however it likes.

use std::collections::BTreeMap;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use sky_types::{Equatorial, LinkId};

use crate::annotations::AnnotationStore;
use crate::arc::ArcBuilder;
use crate::catalog::Catalog;
use crate::celestial::{equatorial_to_sphere, DiskPoint, DiskProjection};
use crate::picking::{find_closest_curve, PickThreshold};
use crate::screen::{world_to_screen, ScreenPoint, SkyCamera, Viewport};

/// Spacing between grid lines, degrees
pub const GRID_SPACING_DEG: f64 = 30.0;

/// Samples per meridian, pole to pole
const MERIDIAN_SAMPLES: usize = 65;

/// Samples per parallel, once around
const PARALLEL_SAMPLES: usize = 361;

/// RA of the north galactic pole (J2000), degrees
pub const GALACTIC_POLE_RA_DEG: f64 = 192.85948;

/// Dec of the north galactic pole (J2000), degrees
pub const GALACTIC_POLE_DEC_DEG: f64 = 27.12825;

/// Galactic longitude of the north celestial pole (J2000), degrees
pub const GALACTIC_NCP_LONGITUDE_DEG: f64 = 122.93192;

/// The coordinate grid, split by line family.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    /// Lines of constant RA, from Dec -90 to +90
    pub meridians: Vec<Vec<Vector3<f64>>>,
    /// Lines of constant Dec, once around in RA
    pub parallels: Vec<Vec<Vector3<f64>>>,
}

/// RA/Dec grid on a sphere of the given radius.
pub fn ra_dec_grid(radius: f64) -> Grid {
    let meridian_count = (360.0 / GRID_SPACING_DEG) as usize;
    let meridians = (0..meridian_count)
        .map(|i| {
            let ra = i as f64 * GRID_SPACING_DEG;
            (0..MERIDIAN_SAMPLES)
                .map(|j| {
                    let dec = -90.0 + 180.0 * j as f64 / (MERIDIAN_SAMPLES - 1) as f64;
                    equatorial_to_sphere(ra, dec, radius)
                })
                .collect()
        })
        .collect();

    let half = (90.0 / GRID_SPACING_DEG) as i32;
    let parallels = (-half..=half)
        .map(|i| {
            let dec = i as f64 * GRID_SPACING_DEG;
            (0..PARALLEL_SAMPLES)
                .map(|j| {
                    let ra = 360.0 * j as f64 / (PARALLEL_SAMPLES - 1) as f64;
                    equatorial_to_sphere(ra, dec, radius)
                })
                .collect()
        })
        .collect();

    Grid {
        meridians,
        parallels,
    }
}

/// Convert galactic longitude/latitude to equatorial (J2000).
pub fn galactic_to_equatorial(l_deg: f64, b_deg: f64) -> Equatorial {
    let b = b_deg.to_radians();
    let dl = (GALACTIC_NCP_LONGITUDE_DEG - l_deg).to_radians();
    let pole_dec = GALACTIC_POLE_DEC_DEG.to_radians();

    let sin_dec = b.sin() * pole_dec.sin() + b.cos() * pole_dec.cos() * dl.cos();
    let dec = sin_dec.clamp(-1.0, 1.0).asin();

    let y = b.cos() * dl.sin();
    let x = b.sin() * pole_dec.cos() - b.cos() * pole_dec.sin() * dl.cos();
    let ra = GALACTIC_POLE_RA_DEG.to_radians() + y.atan2(x);

    Equatorial::new(ra.to_degrees(), dec.to_degrees()).normalized()
}

/// The galactic band as three closed polylines.
#[derive(Debug, Clone, PartialEq)]
pub struct GalacticBand {
    /// Galactic equator
    pub center: Vec<Vector3<f64>>,
    /// Edge at +half width
    pub north_edge: Vec<Vector3<f64>>,
    /// Edge at -half width
    pub south_edge: Vec<Vector3<f64>>,
}

/// Sample the galactic band, `samples` intervals around in longitude.
pub fn galactic_band(radius: f64, half_width_deg: f64, samples: usize) -> GalacticBand {
    let samples = samples.max(1);
    let line = |b_deg: f64| -> Vec<Vector3<f64>> {
        (0..=samples)
            .map(|i| {
                let l = 360.0 * i as f64 / samples as f64;
                let eq = galactic_to_equatorial(l, b_deg);
                equatorial_to_sphere(eq.ra_deg, eq.dec_deg, radius)
            })
            .collect()
    };

    GalacticBand {
        center: line(0.0),
        north_edge: line(half_width_deg),
        south_edge: line(-half_width_deg),
    }
}

/// One user link rendered as a great-circle arc.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkArc {
    pub link_id: LinkId,
    pub name: Option<String>,
    pub points: Vec<Vector3<f64>>,
}

impl LinkArc {
    /// Midpoint of the chord between the arc's endpoints
    pub fn chord_midpoint(&self) -> Option<Vector3<f64>> {
        let first = self.points.first()?;
        let last = self.points.last()?;
        Some(first.lerp(last, 0.5))
    }
}

/// Arcs for every link whose stars exist in `catalog`.
///
/// Links pointing past the end of the catalog (for instance after a smaller
/// catalog was loaded) are skipped, not an error.
pub fn constellation_arcs(
    store: &AnnotationStore,
    catalog: &Catalog,
    radius: f64,
    builder: &ArcBuilder,
) -> Vec<LinkArc> {
    store
        .links()
        .iter()
        .filter_map(|link| {
            let a = catalog.get(link.star_index_a)?;
            let b = catalog.get(link.star_index_b)?;
            if !(a.is_displayable() && b.is_displayable()) {
                return None;
            }
            let start = equatorial_to_sphere(a.ra_deg, a.dec_deg, radius);
            let end = equatorial_to_sphere(b.ra_deg, b.dec_deg, radius);
            Some(LinkArc {
                link_id: link.id,
                name: store.name_of(link.id).map(str::to_string),
                points: builder.build(&start, &end),
            })
        })
        .collect()
}

/// Straight disk segments for every link with both stars above the horizon.
///
/// Visibility is positional only; the projection's magnitude cutoff does not
/// hide a link. Dangling links are skipped.
pub fn disk_link_segments(
    store: &AnnotationStore,
    catalog: &Catalog,
    projection: &DiskProjection,
) -> Vec<(DiskPoint, DiskPoint)> {
    store
        .links()
        .iter()
        .filter_map(|link| {
            let a = catalog.get(link.star_index_a)?;
            let b = catalog.get(link.star_index_b)?;
            let start = projection.project_position(a.ra_deg, a.dec_deg).ok()?;
            let end = projection.project_position(b.ra_deg, b.dec_deg).ok()?;
            Some((start, end))
        })
        .collect()
}

/// Label anchor for each named group: the mean of its arcs' chord midpoints.
pub fn group_anchors(arcs: &[LinkArc]) -> BTreeMap<String, Vector3<f64>> {
    let mut sums: BTreeMap<String, (Vector3<f64>, usize)> = BTreeMap::new();
    for arc in arcs {
        let (Some(name), Some(mid)) = (arc.name.as_ref(), arc.chord_midpoint()) else {
            continue;
        };
        let entry = sums.entry(name.clone()).or_insert((Vector3::zeros(), 0));
        entry.0 += mid;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(name, (sum, count))| (name, sum / count as f64))
        .collect()
}

/// Link under the cursor, if any arc passes within the pick threshold.
pub fn pick_link(
    arcs: &[LinkArc],
    camera: &SkyCamera,
    viewport: &Viewport,
    query: &ScreenPoint,
    threshold: &PickThreshold,
) -> Option<LinkId> {
    let view_projection = camera.view_projection();
    let curves: Vec<Vec<ScreenPoint>> = arcs
        .iter()
        .map(|arc| {
            arc.points
                .iter()
                .filter_map(|p| {
                    world_to_screen(p, &view_projection, viewport.width, viewport.height)
                })
                .collect()
        })
        .collect();

    let hit = threshold.filter_curve(find_closest_curve(query, &curves))?;
    arcs.get(hit.curve).map(|arc| arc.link_id)
}
