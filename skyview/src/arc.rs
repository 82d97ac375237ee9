//! Great-circle polylines between points on the celestial sphere.
//!
//! Constellation links are drawn along the sphere surface instead of as
//! straight chords, which would cut through the interior and vanish behind
//! the camera's near plane.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Samples per arc used by the viewer
pub const DEFAULT_ARC_SEGMENTS: usize = 100;

/// Tolerance below which two unit vectors are considered antipodal
const DEGENERATE_EPSILON: f64 = 1e-9;

/// How interior samples are interpolated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ArcMethod {
    /// Lerp the unit vectors and renormalize. Samples are not evenly spaced
    /// in angle but stay on the sphere.
    #[default]
    NormalizedLerp,
    /// Sine-weighted spherical interpolation, evenly spaced in angle
    Slerp,
}

/// What to return when no unique great circle exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ArcFallback {
    /// Straight samples from `a` to `b`
    #[default]
    Chord,
    /// A single point halfway between `a` and `b`
    Midpoint,
}

/// Builds sampled great-circle arcs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcBuilder {
    pub segments: usize,
    pub method: ArcMethod,
    pub fallback: ArcFallback,
}

impl Default for ArcBuilder {
    fn default() -> Self {
        Self {
            segments: DEFAULT_ARC_SEGMENTS,
            method: ArcMethod::default(),
            fallback: ArcFallback::default(),
        }
    }
}

impl ArcBuilder {
    pub fn new(segments: usize) -> Self {
        Self {
            segments,
            ..Self::default()
        }
    }

    pub fn with_method(mut self, method: ArcMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_fallback(mut self, fallback: ArcFallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Sample the arc from `a` to `b`.
    ///
    /// The radius is taken from `a`. The first and last samples are exactly
    /// `a` and `b`; interior samples lie on the sphere. Zero-length or
    /// antipodal endpoints produce the configured fallback instead.
    pub fn build(&self, a: &Vector3<f64>, b: &Vector3<f64>) -> Vec<Vector3<f64>> {
        let segments = self.segments.max(1);
        let radius = a.norm();

        let (Some(start), Some(end)) = (
            a.try_normalize(DEGENERATE_EPSILON),
            b.try_normalize(DEGENERATE_EPSILON),
        ) else {
            return self.degenerate(a, b, segments);
        };

        if (start + end).norm() < DEGENERATE_EPSILON {
            return self.degenerate(a, b, segments);
        }

        let angle = start.dot(&end).clamp(-1.0, 1.0).acos();
        let sin_angle = angle.sin();

        let mut points = Vec::with_capacity(segments + 1);
        points.push(*a);
        for i in 1..segments {
            let t = i as f64 / segments as f64;
            let direction = match self.method {
                ArcMethod::Slerp if sin_angle > DEGENERATE_EPSILON => {
                    let wa = ((1.0 - t) * angle).sin() / sin_angle;
                    let wb = (t * angle).sin() / sin_angle;
                    (start * wa + end * wb).normalize()
                }
                // Coincident endpoints fall through to lerp, which stays put
                _ => start.lerp(&end, t).normalize(),
            };
            points.push(direction * radius);
        }
        points.push(*b);
        points
    }

    fn degenerate(&self, a: &Vector3<f64>, b: &Vector3<f64>, segments: usize) -> Vec<Vector3<f64>> {
        match self.fallback {
            ArcFallback::Chord => (0..=segments)
                .map(|i| {
                    if i == 0 {
                        *a
                    } else if i == segments {
                        *b
                    } else {
                        a.lerp(b, i as f64 / segments as f64)
                    }
                })
                .collect(),
            ArcFallback::Midpoint => vec![a.lerp(b, 0.5)],
        }
    }
}

/// Normalized-lerp arc with a chord fallback.
pub fn build_arc(a: &Vector3<f64>, b: &Vector3<f64>, segments: usize) -> Vec<Vector3<f64>> {
    ArcBuilder::new(segments).build(a, b)
}
