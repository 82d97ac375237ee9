//! Core of the star sky viewer.
//!
//! Turns a star catalog into things a renderer can draw and a user can click:
//!
//! - [`celestial`]: equatorial positions on the 3D sphere and the all-sky disk
//! - [`screen`]: perspective camera and world-to-pixel mapping
//! - [`picking`]: nearest star / nearest arc under the cursor
//! - [`annotations`]: user-drawn constellation links and their names
//! - [`arc`]: great-circle polylines for those links
//! - [`overlay`], [`flat_map`], [`appearance`], [`format`]: presentation helpers
//! - [`catalog`], [`storage`], [`config`], [`view`]: loading, persistence and UI state
//!
//! Rendering, input handling and networking live outside this crate.

pub mod annotations;
pub mod appearance;
pub mod arc;
pub mod catalog;
pub mod celestial;
pub mod config;
pub mod flat_map;
pub mod format;
pub mod overlay;
pub mod picking;
pub mod screen;
pub mod storage;
pub mod view;

pub use annotations::{AnnotationError, AnnotationStore, RestoreStatus, Restored};
pub use arc::{build_arc, ArcBuilder, ArcFallback, ArcMethod};
pub use catalog::{Catalog, CatalogError, CatalogSlot, CatalogState, LoadOutcome, LoadTicket};
pub use celestial::{equatorial_to_disk, equatorial_to_sphere, DiskPoint, DiskProjection, NotVisible};
pub use config::{ConfigError, SkyConfig};
pub use picking::{
    find_brightest_within, find_closest_curve, find_closest_point, project_stars, CurveHit,
    PickCandidate, PickThreshold, PointHit,
};
pub use screen::{screen_direction_to_equatorial, world_to_screen, ScreenPoint, SkyCamera, Viewport};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};

pub use sky_types::{ConstellationLink, Equatorial, LinkId, NameAssignment, SpectralClass, StarRecord};
