//! User-authored constellation annotations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a constellation link.
///
/// Generated once when the link is created and never reused by the store
/// that issued it, so name bindings survive removal of other links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(pub u64);

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A user-drawn line between two catalog stars, addressed by catalog index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstellationLink {
    pub id: LinkId,
    #[serde(rename = "starIndex1")]
    pub star_index_a: usize,
    #[serde(rename = "starIndex2")]
    pub star_index_b: usize,
}

impl ConstellationLink {
    /// Both star indices of the link
    pub fn endpoints(&self) -> (usize, usize) {
        (self.star_index_a, self.star_index_b)
    }

    /// True when both endpoints exist in a catalog of `catalog_len` stars
    pub fn resolves_in(&self, catalog_len: usize) -> bool {
        self.star_index_a < catalog_len && self.star_index_b < catalog_len
    }
}

/// Display name bound to one link. Links sharing a name form a constellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameAssignment {
    #[serde(rename = "linkId")]
    pub link_id: LinkId,
    pub name: String,
}
