//! Interactive view state: camera hand-off, zoom and selection.

use serde::{Deserialize, Serialize};
use sky_types::{Equatorial, LinkId};

use crate::config::SkyConfig;
use crate::flat_map::{FlatMap, MAP_SHIFT_STEP_DEG};
use crate::storage::{keys, KeyValueStore, StorageError};

pub const DEFAULT_FOV_DEG: f64 = 75.0;
pub const MIN_FOV_DEG: f64 = 10.0;
pub const MAX_FOV_DEG: f64 = 75.0;

/// FOV change per wheel notch, degrees
pub const FOV_STEP_DEG: f64 = 1.0;

/// Camera direction handed from the 3D view to the 2D views.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraHandoff {
    pub ra_deg: f64,
    pub dec_deg: f64,
}

impl CameraHandoff {
    pub fn new(ra_deg: f64, dec_deg: f64) -> Self {
        Self { ra_deg, dec_deg }
    }

    pub fn save(&self, storage: &mut dyn KeyValueStore) -> Result<(), StorageError> {
        storage.set(keys::CURRENT_RA, &self.ra_deg.to_string())?;
        storage.set(keys::CURRENT_DEC, &self.dec_deg.to_string())?;
        Ok(())
    }

    /// Read the hand-off; missing or unparseable values are 0.
    pub fn load(storage: &dyn KeyValueStore) -> Self {
        let read = |key: &str| {
            storage
                .get(key)
                .and_then(|raw| raw.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .unwrap_or(0.0)
        };
        Self {
            ra_deg: read(keys::CURRENT_RA),
            dec_deg: read(keys::CURRENT_DEC),
        }
    }
}

impl From<Equatorial> for CameraHandoff {
    fn from(eq: Equatorial) -> Self {
        Self::new(eq.ra_deg, eq.dec_deg)
    }
}

/// Vertical field of view with wheel zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldOfView {
    fov_deg: f64,
    min_deg: f64,
    max_deg: f64,
}

impl Default for FieldOfView {
    fn default() -> Self {
        Self::new(DEFAULT_FOV_DEG, MIN_FOV_DEG, MAX_FOV_DEG)
    }
}

impl FieldOfView {
    /// `fov_deg` is clamped into `[min_deg, max_deg]`.
    ///
    /// Inverted bounds are swapped; non-finite bounds fall back to
    /// [`MIN_FOV_DEG`]..[`MAX_FOV_DEG`] and a NaN `fov_deg` to the upper bound.
    pub fn new(fov_deg: f64, min_deg: f64, max_deg: f64) -> Self {
        let (min_deg, max_deg) = if min_deg.is_finite() && max_deg.is_finite() {
            (min_deg.min(max_deg), min_deg.max(max_deg))
        } else {
            (MIN_FOV_DEG, MAX_FOV_DEG)
        };
        let fov_deg = if fov_deg.is_nan() {
            max_deg
        } else {
            fov_deg.clamp(min_deg, max_deg)
        };
        Self {
            fov_deg,
            min_deg,
            max_deg,
        }
    }

    pub fn degrees(&self) -> f64 {
        self.fov_deg
    }

    /// Apply one wheel notch: positive zooms out, negative zooms in.
    pub fn wheel(&mut self, delta: f64) {
        if delta > 0.0 {
            self.fov_deg = (self.fov_deg + FOV_STEP_DEG).min(self.max_deg);
        } else if delta < 0.0 {
            self.fov_deg = (self.fov_deg - FOV_STEP_DEG).max(self.min_deg);
        }
    }

    /// Orbit speed scales with zoom so narrow views rotate slower
    pub fn rotate_speed(&self) -> f64 {
        self.fov_deg / MAX_FOV_DEG
    }
}

/// Result of picking a star for a new link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEvent {
    /// First star chosen; waiting for the second
    Armed(usize),
    /// Second star chosen; the pair should become a link
    Completed(usize, usize),
}

/// Two-click star selection for creating links.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StarSelection {
    pending: Option<usize>,
}

impl StarSelection {
    pub fn pick(&mut self, index: usize) -> SelectionEvent {
        match self.pending.take() {
            Some(first) => SelectionEvent::Completed(first, index),
            None => {
                self.pending = Some(index);
                SelectionEvent::Armed(index)
            }
        }
    }

    pub fn pending(&self) -> Option<usize> {
        self.pending
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }
}

/// Links armed for naming or deletion, in the order they were armed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSelection {
    armed: Vec<LinkId>,
}

impl LinkSelection {
    /// Arm or disarm a link; returns whether it is armed afterwards.
    pub fn toggle(&mut self, id: LinkId) -> bool {
        if let Some(pos) = self.armed.iter().position(|armed| *armed == id) {
            self.armed.remove(pos);
            false
        } else {
            self.armed.push(id);
            true
        }
    }

    pub fn is_armed(&self, id: LinkId) -> bool {
        self.armed.contains(&id)
    }

    pub fn armed(&self) -> &[LinkId] {
        &self.armed
    }

    pub fn clear(&mut self) {
        self.armed.clear();
    }
}

/// Which rendering of the sky is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewMode {
    #[default]
    Sphere,
    Disk,
    Map,
}

/// Everything the UI toggles between frames.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub mode: ViewMode,
    pub grid_visible: bool,
    pub constellations_visible: bool,
    pub galaxy_visible: bool,
    pub fov: FieldOfView,
    pub stars: StarSelection,
    pub links: LinkSelection,
    pub map: FlatMap,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            mode: ViewMode::default(),
            grid_visible: true,
            constellations_visible: true,
            galaxy_visible: true,
            fov: FieldOfView::default(),
            stars: StarSelection::default(),
            links: LinkSelection::default(),
            map: FlatMap::new(1440.0, 720.0),
        }
    }
}

impl ViewState {
    /// Default toggles with the zoom limits from `config`
    pub fn from_config(config: &SkyConfig) -> Self {
        Self {
            fov: FieldOfView::new(config.fov_deg, config.min_fov_deg, config.max_fov_deg),
            ..Self::default()
        }
    }

    pub fn toggle_grid(&mut self) -> bool {
        self.grid_visible = !self.grid_visible;
        self.grid_visible
    }

    pub fn toggle_constellations(&mut self) -> bool {
        self.constellations_visible = !self.constellations_visible;
        self.constellations_visible
    }

    pub fn toggle_galaxy(&mut self) -> bool {
        self.galaxy_visible = !self.galaxy_visible;
        self.galaxy_visible
    }

    /// Drop any half-made star pair and all armed links.
    pub fn escape(&mut self) {
        self.stars.clear();
        self.links.clear();
    }

    pub fn shift_map_left(&mut self) {
        self.map.shift(-MAP_SHIFT_STEP_DEG);
    }

    pub fn shift_map_right(&mut self) {
        self.map.shift(MAP_SHIFT_STEP_DEG);
    }
}
