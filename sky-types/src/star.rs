//! Star catalog records and equatorial coordinates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A direction on the sky in equatorial coordinates, both angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Equatorial {
    /// Right ascension in degrees
    pub ra_deg: f64,
    /// Declination in degrees
    pub dec_deg: f64,
}

impl Equatorial {
    /// Create a new coordinate pair
    pub fn new(ra_deg: f64, dec_deg: f64) -> Self {
        Self { ra_deg, dec_deg }
    }

    /// Same direction with right ascension wrapped into [0, 360)
    pub fn normalized(self) -> Self {
        let ra = self.ra_deg.rem_euclid(360.0);
        // rem_euclid can round up to exactly 360 for tiny negative inputs
        let ra_deg = if ra >= 360.0 { 0.0 } else { ra };
        Self {
            ra_deg,
            dec_deg: self.dec_deg,
        }
    }

    /// True when both angles are finite numbers
    pub fn is_finite(&self) -> bool {
        self.ra_deg.is_finite() && self.dec_deg.is_finite()
    }
}

/// Harvard spectral class, selected by the first character of the spectral type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpectralClass {
    O,
    B,
    A,
    F,
    G,
    K,
    M,
    Other,
}

impl SpectralClass {
    /// Classify a spectral type string such as `"G2V"` or `"K5III"`.
    pub fn from_spectral_type(spectral_type: &str) -> Self {
        match spectral_type.trim_start().chars().next() {
            Some('O') => Self::O,
            Some('B') => Self::B,
            Some('A') => Self::A,
            Some('F') => Self::F,
            Some('G') => Self::G,
            Some('K') => Self::K,
            Some('M') => Self::M,
            _ => Self::Other,
        }
    }

    /// Linear RGB display color before any brightness scaling.
    pub fn base_color(&self) -> [f32; 3] {
        match self {
            Self::O => [0.5, 0.5, 1.0],
            Self::B => [0.7, 0.7, 1.0],
            Self::A => [0.9, 0.9, 1.0],
            Self::F => [1.0, 1.0, 0.9],
            Self::G => [1.0, 0.9, 0.7],
            Self::K => [1.0, 0.8, 0.6],
            Self::M => [1.0, 0.7, 0.7],
            Self::Other => [1.0, 1.0, 1.0],
        }
    }
}

impl fmt::Display for SpectralClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let letter = match self {
            Self::O => "O",
            Self::B => "B",
            Self::A => "A",
            Self::F => "F",
            Self::G => "G",
            Self::K => "K",
            Self::M => "M",
            Self::Other => "?",
        };
        f.write_str(letter)
    }
}

/// One row of a loaded star catalog.
///
/// `index` is the position of the row in the loaded sequence and is the only
/// identity used by constellation links. It is unrelated to `catalog_id` and
/// to any of the name fields.
///
/// Numeric fields that were missing or unparseable in the source hold NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarRecord {
    /// Position in the loaded catalog
    pub index: usize,
    /// Identifier column of the source catalog, if present
    pub catalog_id: Option<String>,
    /// Right ascension in degrees (0-360)
    pub ra_deg: f64,
    /// Declination in degrees (-90 to 90)
    pub dec_deg: f64,
    /// Apparent visual magnitude (lower is brighter)
    pub apparent_magnitude: f64,
    /// Absolute magnitude
    pub absolute_magnitude: f64,
    /// Distance in parsecs
    pub distance_parsec: f64,
    /// Effective temperature in Kelvin
    pub temperature_kelvin: f64,
    /// Spectral type string, e.g. "A0V"
    pub spectral_type: String,
    /// Common (proper) name such as "Sirius"
    pub proper_name: Option<String>,
    /// Catalog designation
    pub catalog_name: String,
    /// Constellation abbreviation, e.g. "CMa"
    pub constellation: String,
}

impl StarRecord {
    /// Sky position of the star
    pub fn position(&self) -> Equatorial {
        Equatorial::new(self.ra_deg, self.dec_deg)
    }

    /// Spectral class derived from the spectral type
    pub fn spectral_class(&self) -> SpectralClass {
        SpectralClass::from_spectral_type(&self.spectral_type)
    }

    /// Name shown to users: `"Proper (designation)"` or just the designation.
    pub fn display_name(&self) -> String {
        match self.proper_name.as_deref() {
            Some(proper) if !proper.is_empty() => format!("{proper} ({})", self.catalog_name),
            _ => self.catalog_name.clone(),
        }
    }

    /// Name used for searching: the proper name if there is one.
    pub fn search_name(&self) -> &str {
        match self.proper_name.as_deref() {
            Some(proper) if !proper.is_empty() => proper,
            _ => &self.catalog_name,
        }
    }

    /// Whether the star has a usable sky position
    pub fn is_displayable(&self) -> bool {
        self.position().is_finite()
    }
}
