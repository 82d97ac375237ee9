//! Shared serde types for the sky viewer.
//!
//! Everything here is plain data and stays WASM-compatible so a browser
//! front end can exchange the same records with the native tools.

mod annotation;
mod star;

pub use annotation::{ConstellationLink, LinkId, NameAssignment};
pub use star::{Equatorial, SpectralClass, StarRecord};
