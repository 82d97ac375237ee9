//! User-authored constellations: star-to-star links and their names.
//!
//! [`AnnotationStore`] owns the link list, the name bindings and the set of
//! registered names. Every link gets a [`LinkId`] when it is created and names
//! are bound to that id, never to the link's position, so removing one link
//! cannot move a name onto a different link.
//!
//! The store does not flush itself. Callers decide when to call
//! [`AnnotationStore::persist`], typically after every user action.
//!
//! # Stored format
//!
//! `ownConstellation` holds `[{"id": 0, "starIndex1": 3, "starIndex2": 9}, ...]`.
//! `constellationNames` holds a mix of:
//! - `{"linkId": 0, "name": "Orion"}` bindings,
//! - `{"lineIndex": 2, "name": "Orion"}` older positional bindings, resolved
//!   against link order when restoring,
//! - `{"name": "Lyra"}` names registered without any link.
//!
//! Links written without an `id` get fresh ids on restore.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use sky_types::{ConstellationLink, LinkId, NameAssignment};
use thiserror::Error;

use crate::storage::{keys, KeyValueStore, StorageError};

/// Errors from annotation edits. The store is unchanged when one is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnotationError {
    #[error("star index {index} is outside the catalog of {catalog_len} stars")]
    InvalidReference { index: usize, catalog_len: usize },
    #[error("constellation name {0:?} already exists")]
    DuplicateName(String),
    #[error("constellation name must not be empty")]
    EmptyName,
    #[error("no link ids left to issue")]
    IdsExhausted,
}

/// How one persisted key was read back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreStatus {
    /// Value present and parsed
    Loaded,
    /// Nothing stored under the key
    Missing,
    /// Value present but unusable; treated as empty
    Malformed(String),
}

impl RestoreStatus {
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

impl fmt::Display for RestoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Loaded => f.write_str("loaded"),
            Self::Missing => f.write_str("missing"),
            Self::Malformed(reason) => write!(f, "malformed ({reason})"),
        }
    }
}

/// Store rebuilt from persisted state, with a report per key
#[derive(Debug, Clone)]
pub struct Restored {
    pub store: AnnotationStore,
    pub links: RestoreStatus,
    pub names: RestoreStatus,
}

/// Link as written to storage; `id` is absent in older data.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredLink {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<LinkId>,
    #[serde(rename = "starIndex1")]
    star_index_a: usize,
    #[serde(rename = "starIndex2")]
    star_index_b: usize,
}

/// Name record as written to storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredName {
    #[serde(rename = "linkId", default, skip_serializing_if = "Option::is_none")]
    link_id: Option<LinkId>,
    #[serde(rename = "lineIndex", default, skip_serializing_if = "Option::is_none")]
    line_index: Option<usize>,
    name: String,
}

/// Links, name bindings and registered names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationStore {
    links: Vec<ConstellationLink>,
    names: HashMap<LinkId, String>,
    registered: BTreeSet<String>,
    next_id: u64,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next unused id. `u64::MAX` is never issued so `next_id` cannot wrap.
    fn issue_id(&mut self) -> Option<LinkId> {
        if self.next_id == u64::MAX {
            return None;
        }
        let id = LinkId(self.next_id);
        self.next_id += 1;
        Some(id)
    }

    // =========================================================================
    // Links
    // =========================================================================

    /// Append a link between two catalog stars.
    ///
    /// Duplicate links are allowed. Fails with
    /// [`AnnotationError::InvalidReference`] when either index is not below
    /// `catalog_len`.
    pub fn add_link(
        &mut self,
        star_index_a: usize,
        star_index_b: usize,
        catalog_len: usize,
    ) -> Result<LinkId, AnnotationError> {
        for index in [star_index_a, star_index_b] {
            if index >= catalog_len {
                return Err(AnnotationError::InvalidReference { index, catalog_len });
            }
        }

        let id = self.issue_id().ok_or(AnnotationError::IdsExhausted)?;
        self.links.push(ConstellationLink {
            id,
            star_index_a,
            star_index_b,
        });
        debug!("Added link {id} between stars {star_index_a} and {star_index_b}");
        Ok(id)
    }

    /// Remove a link together with its name binding.
    pub fn remove_link(&mut self, id: LinkId) -> Option<ConstellationLink> {
        let position = self.position_of(id)?;
        let link = self.links.remove(position);
        self.names.remove(&id);
        debug!("Removed link {id}");
        Some(link)
    }

    /// Remove several links; returns how many existed.
    pub fn remove_links<'a, I>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = &'a LinkId>,
    {
        ids.into_iter()
            .filter(|id| self.remove_link(**id).is_some())
            .count()
    }

    pub fn link(&self, id: LinkId) -> Option<&ConstellationLink> {
        self.links.iter().find(|link| link.id == id)
    }

    /// Links in creation order
    pub fn links(&self) -> &[ConstellationLink] {
        &self.links
    }

    /// Current position of a link in creation order
    pub fn position_of(&self, id: LinkId) -> Option<usize> {
        self.links.iter().position(|link| link.id == id)
    }

    pub fn link_at(&self, position: usize) -> Option<&ConstellationLink> {
        self.links.get(position)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    // =========================================================================
    // Names
    // =========================================================================

    /// Bind `name` to every existing link in `ids`, replacing earlier names.
    ///
    /// Unknown ids are skipped. Returns how many links were named. The name
    /// is registered even when no link matched.
    pub fn name_links<'a, I>(&mut self, ids: I, name: &str) -> Result<usize, AnnotationError>
    where
        I: IntoIterator<Item = &'a LinkId>,
    {
        let name = name.trim();
        if name.is_empty() {
            return Err(AnnotationError::EmptyName);
        }

        let mut named = 0;
        for id in ids {
            if self.link(*id).is_some() {
                self.names.insert(*id, name.to_string());
                named += 1;
            }
        }
        self.registered.insert(name.to_string());
        debug!("Named {named} links {name:?}");
        Ok(named)
    }

    /// Name bound to a link
    pub fn name_of(&self, id: LinkId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Move every link named `old` to `new`; returns how many were renamed.
    pub fn rename_group(&mut self, old: &str, new: &str) -> Result<usize, AnnotationError> {
        let new = new.trim();
        if new.is_empty() {
            return Err(AnnotationError::EmptyName);
        }

        let mut renamed = 0;
        for name in self.names.values_mut().filter(|name| name.as_str() == old) {
            *name = new.to_string();
            renamed += 1;
        }
        self.registered.remove(old);
        self.registered.insert(new.to_string());
        Ok(renamed)
    }

    /// Register a name for later use without binding it to any link.
    pub fn register_name(&mut self, name: &str) -> Result<(), AnnotationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AnnotationError::EmptyName);
        }
        if !self.registered.insert(name.to_string()) {
            return Err(AnnotationError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    /// All registered names, sorted
    pub fn known_names(&self) -> Vec<&str> {
        self.registered.iter().map(String::as_str).collect()
    }

    /// Name bindings in link order
    pub fn assignments(&self) -> Vec<NameAssignment> {
        self.links
            .iter()
            .filter_map(|link| {
                self.names.get(&link.id).map(|name| NameAssignment {
                    link_id: link.id,
                    name: name.clone(),
                })
            })
            .collect()
    }

    /// Named groups: each name maps to its link ids in link order.
    pub fn list_named_groups(&self) -> BTreeMap<String, Vec<LinkId>> {
        let mut groups: BTreeMap<String, Vec<LinkId>> = BTreeMap::new();
        for assignment in self.assignments() {
            groups
                .entry(assignment.name)
                .or_default()
                .push(assignment.link_id);
        }
        groups
    }

    /// Drop every link, binding and registered name.
    pub fn clear(&mut self) {
        self.links.clear();
        self.names.clear();
        self.registered.clear();
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Write links and names to `storage`, replacing whatever was there.
    pub fn persist(&self, storage: &mut dyn KeyValueStore) -> Result<(), StorageError> {
        let links: Vec<StoredLink> = self
            .links
            .iter()
            .map(|link| StoredLink {
                id: Some(link.id),
                star_index_a: link.star_index_a,
                star_index_b: link.star_index_b,
            })
            .collect();

        let assigned: BTreeSet<&str> = self.names.values().map(String::as_str).collect();
        let mut names: Vec<StoredName> = self
            .assignments()
            .into_iter()
            .map(|assignment| StoredName {
                link_id: Some(assignment.link_id),
                line_index: None,
                name: assignment.name,
            })
            .collect();
        names.extend(
            self.registered
                .iter()
                .filter(|name| !assigned.contains(name.as_str()))
                .map(|name| StoredName {
                    link_id: None,
                    line_index: None,
                    name: name.clone(),
                }),
        );

        storage.set(keys::OWN_CONSTELLATION, &serde_json::to_string(&links)?)?;
        storage.set(keys::CONSTELLATION_NAMES, &serde_json::to_string(&names)?)?;
        debug!("Persisted {} links and {} name records", links.len(), names.len());
        Ok(())
    }

    /// Rebuild a store from `storage`. Never fails: missing or malformed
    /// values yield empty collections and are reported in [`Restored`].
    pub fn restore(storage: &dyn KeyValueStore) -> Restored {
        let mut store = Self::new();

        let (stored_links, links_status) =
            read_array::<StoredLink>(storage, keys::OWN_CONSTELLATION);
        let (stored_names, names_status) =
            read_array::<StoredName>(storage, keys::CONSTELLATION_NAMES);

        // Keep explicit ids when every reissued one still fits above the
        // largest, otherwise renumber all links from zero
        let highest = stored_links.iter().filter_map(|link| link.id).max();
        let keep_ids = match highest {
            Some(LinkId(max)) => max
                .checked_add(stored_links.len() as u64)
                .is_some_and(|end| end < u64::MAX),
            None => true,
        };
        store.next_id = match highest {
            Some(LinkId(max)) if keep_ids => max + 1,
            Some(LinkId(max)) => {
                warn!("Stored link id {max} leaves no room for new ids, renumbering links");
                0
            }
            None => 0,
        };

        // Stored id -> id in the restored store, first occurrence wins
        let mut remap: HashMap<LinkId, LinkId> = HashMap::new();
        for stored in stored_links {
            let id = match stored.id {
                Some(id) if keep_ids && !remap.contains_key(&id) => id,
                _ => match store.issue_id() {
                    Some(id) => id,
                    None => {
                        warn!("Ran out of link ids while restoring, dropping the rest");
                        break;
                    }
                },
            };
            if let Some(old) = stored.id {
                remap.entry(old).or_insert(id);
            }
            store.links.push(ConstellationLink {
                id,
                star_index_a: stored.star_index_a,
                star_index_b: stored.star_index_b,
            });
        }

        for stored in stored_names {
            let name = stored.name.trim();
            if name.is_empty() {
                continue;
            }
            let target = match (stored.link_id, stored.line_index) {
                (Some(id), _) => remap.get(&id).copied(),
                (None, Some(position)) => store.link_at(position).map(|link| link.id),
                (None, None) => None,
            };
            if let Some(id) = target {
                store.names.insert(id, name.to_string());
            }
            store.registered.insert(name.to_string());
        }

        debug!(
            "Restored {} links ({links_status}), {} names ({names_status})",
            store.links.len(),
            store.names.len()
        );
        Restored {
            store,
            links: links_status,
            names: names_status,
        }
    }

    /// Clear memory and delete both persisted keys.
    pub fn reset(&mut self, storage: &mut dyn KeyValueStore) -> Result<(), StorageError> {
        self.clear();
        storage.remove(keys::OWN_CONSTELLATION)?;
        storage.remove(keys::CONSTELLATION_NAMES)?;
        Ok(())
    }
}

/// Parse a JSON array stored under `key`, defaulting to empty.
fn read_array<T>(storage: &dyn KeyValueStore, key: &str) -> (Vec<T>, RestoreStatus)
where
    T: for<'de> Deserialize<'de>,
{
    let Some(raw) = storage.get(key) else {
        return (Vec::new(), RestoreStatus::Missing);
    };
    // "null" is what an empty browser store hands back
    if raw.trim().is_empty() || raw.trim() == "null" {
        return (Vec::new(), RestoreStatus::Missing);
    }

    match serde_json::from_str::<Vec<T>>(&raw) {
        Ok(values) => (values, RestoreStatus::Loaded),
        Err(e) => {
            warn!("Ignoring malformed {key:?}: {e}");
            (Vec::new(), RestoreStatus::Malformed(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn store_with_links(count: usize) -> (AnnotationStore, Vec<LinkId>) {
        let mut store = AnnotationStore::new();
        let ids = (0..count)
            .map(|i| store.add_link(i, i + 1, count + 1).unwrap())
            .collect();
        (store, ids)
    }

    #[test]
    fn test_add_link_rejects_out_of_range() {
        let mut store = AnnotationStore::new();
        let err = store.add_link(0, 3, 3).unwrap_err();
        assert_eq!(
            err,
            AnnotationError::InvalidReference {
                index: 3,
                catalog_len: 3
            }
        );
        assert!(store.is_empty());

        assert!(store.add_link(0, 0, 0).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_duplicate_links_allowed_with_distinct_ids() {
        let mut store = AnnotationStore::new();
        let a = store.add_link(1, 2, 5).unwrap();
        let b = store.add_link(1, 2, 5).unwrap();
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_remove_link_drops_its_name() {
        let (mut store, ids) = store_with_links(1);
        store.name_links(&[ids[0]], "Orion").unwrap();
        store.remove_link(ids[0]).unwrap();

        assert!(store.assignments().is_empty());
        assert!(store.name_of(ids[0]).is_none());
        assert!(store.list_named_groups().is_empty());
        // The name itself stays available for reuse
        assert_eq!(store.known_names(), vec!["Orion"]);
    }

    #[test]
    fn test_remove_link_keeps_other_bindings() {
        let (mut store, ids) = store_with_links(4);
        store.name_links(&[ids[1], ids[3]], "Lyra").unwrap();
        store.name_links(&[ids[2]], "Cygnus").unwrap();

        store.remove_link(ids[0]).unwrap();

        assert_eq!(store.name_of(ids[1]), Some("Lyra"));
        assert_eq!(store.name_of(ids[2]), Some("Cygnus"));
        assert_eq!(store.name_of(ids[3]), Some("Lyra"));
        assert_eq!(store.position_of(ids[1]), Some(0));
        assert_eq!(store.link_at(0).unwrap().id, ids[1]);
    }

    #[test]
    fn test_remove_links_counts_existing() {
        let (mut store, ids) = store_with_links(3);
        assert_eq!(store.remove_links(&[ids[0], ids[2], LinkId(99)]), 2);
        assert_eq!(store.len(), 1);
        assert!(store.remove_link(ids[0]).is_none());
    }

    #[test]
    fn test_ids_not_reused_after_removal() {
        let (mut store, ids) = store_with_links(2);
        store.remove_link(ids[1]).unwrap();
        let fresh = store.add_link(0, 1, 3).unwrap();
        assert!(!ids.contains(&fresh));
    }

    #[test]
    fn test_name_links_updates_and_groups() {
        let (mut store, ids) = store_with_links(3);
        assert_eq!(store.name_links(&[ids[0], ids[2]], "Orion").unwrap(), 2);
        assert_eq!(store.name_links(&[ids[2], LinkId(42)], "Taurus").unwrap(), 1);

        let groups = store.list_named_groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["Orion"], vec![ids[0]]);
        assert_eq!(groups["Taurus"], vec![ids[2]]);
    }

    #[test]
    fn test_groups_follow_link_order() {
        let (mut store, ids) = store_with_links(3);
        store.name_links(&[ids[2], ids[0], ids[1]], "Draco").unwrap();
        assert_eq!(store.list_named_groups()["Draco"], ids);
    }

    #[test]
    fn test_empty_name_rejected() {
        let (mut store, ids) = store_with_links(1);
        assert_eq!(
            store.name_links(&[ids[0]], "  "),
            Err(AnnotationError::EmptyName)
        );
        assert!(store.name_of(ids[0]).is_none());
    }

    #[test]
    fn test_register_name_rejects_duplicates() {
        let mut store = AnnotationStore::new();
        store.register_name("Lyra").unwrap();
        assert_eq!(
            store.register_name("Lyra"),
            Err(AnnotationError::DuplicateName("Lyra".to_string()))
        );
        store.register_name("Aquila").unwrap();
        assert_eq!(store.known_names(), vec!["Aquila", "Lyra"]);
    }

    #[test]
    fn test_rename_group() {
        let (mut store, ids) = store_with_links(3);
        store.name_links(&[ids[0], ids[1]], "Big Dipper").unwrap();
        store.name_links(&[ids[2]], "Cassiopeia").unwrap();

        assert_eq!(store.rename_group("Big Dipper", "Ursa Major").unwrap(), 2);
        let groups = store.list_named_groups();
        assert_eq!(groups["Ursa Major"], vec![ids[0], ids[1]]);
        assert!(!groups.contains_key("Big Dipper"));
        assert_eq!(store.known_names(), vec!["Cassiopeia", "Ursa Major"]);
    }

    #[test]
    fn test_persist_restore_round_trip() {
        let (mut store, ids) = store_with_links(3);
        store.add_link(1, 2, 4).unwrap();
        store.name_links(&[ids[0], ids[2]], "Orion").unwrap();
        store.register_name("Unused").unwrap();

        let mut storage = MemoryStore::new();
        store.persist(&mut storage).unwrap();

        let restored = AnnotationStore::restore(&storage);
        assert_eq!(restored.links, RestoreStatus::Loaded);
        assert_eq!(restored.names, RestoreStatus::Loaded);
        assert_eq!(restored.store.links(), store.links());
        assert_eq!(restored.store.list_named_groups(), store.list_named_groups());
        assert_eq!(restored.store.known_names(), vec!["Orion", "Unused"]);

        // New links after a restore must not collide with restored ids
        let mut reopened = restored.store;
        let fresh = reopened.add_link(0, 0, 1).unwrap();
        assert!(store.link(fresh).is_none());
    }

    #[test]
    fn test_restore_malformed_is_empty() {
        let mut storage = MemoryStore::new();
        storage.set(keys::OWN_CONSTELLATION, "{not json").unwrap();
        storage.set(keys::CONSTELLATION_NAMES, r#"{"name": "x"}"#).unwrap();

        let restored = AnnotationStore::restore(&storage);
        assert!(restored.store.is_empty());
        assert!(restored.store.known_names().is_empty());
        assert!(restored.links.is_malformed());
        assert!(restored.names.is_malformed());
    }

    #[test]
    fn test_restore_missing_is_empty() {
        let storage = MemoryStore::new();
        let restored = AnnotationStore::restore(&storage);
        assert!(restored.store.is_empty());
        assert_eq!(restored.links, RestoreStatus::Missing);
        assert_eq!(restored.names, RestoreStatus::Missing);
    }

    #[test]
    fn test_restore_legacy_positional_names() {
        let mut storage = MemoryStore::new();
        storage
            .set(
                keys::OWN_CONSTELLATION,
                r#"[{"starIndex1":0,"starIndex2":1},{"starIndex1":1,"starIndex2":2},{"starIndex1":2,"starIndex2":0}]"#,
            )
            .unwrap();
        storage
            .set(
                keys::CONSTELLATION_NAMES,
                r#"[{"lineIndex":2,"name":"Triangle"},{"lineIndex":9,"name":"Lost"},{"name":"Spare"}]"#,
            )
            .unwrap();

        let restored = AnnotationStore::restore(&storage);
        let store = restored.store;
        assert_eq!(store.len(), 3);

        let third = store.link_at(2).unwrap();
        assert_eq!(third.endpoints(), (2, 0));
        assert_eq!(store.name_of(third.id), Some("Triangle"));
        assert_eq!(store.assignments().len(), 1);
        assert_eq!(store.known_names(), vec!["Lost", "Spare", "Triangle"]);
    }

    #[test]
    fn test_restore_duplicate_ids_are_reissued() {
        let mut storage = MemoryStore::new();
        storage
            .set(
                keys::OWN_CONSTELLATION,
                r#"[{"id":4,"starIndex1":0,"starIndex2":1},{"id":4,"starIndex1":1,"starIndex2":2}]"#,
            )
            .unwrap();

        let store = AnnotationStore::restore(&storage).store;
        assert_eq!(store.link_at(0).unwrap().id, LinkId(4));
        assert_eq!(store.link_at(1).unwrap().id, LinkId(5));
    }

    #[test]
    fn test_restore_max_id_is_renumbered() {
        let mut storage = MemoryStore::new();
        storage
            .set(
                keys::OWN_CONSTELLATION,
                r#"[{"id":18446744073709551615,"starIndex1":0,"starIndex2":1},{"starIndex1":1,"starIndex2":2}]"#,
            )
            .unwrap();
        storage
            .set(
                keys::CONSTELLATION_NAMES,
                r#"[{"linkId":18446744073709551615,"name":"Lyra"}]"#,
            )
            .unwrap();

        let restored = AnnotationStore::restore(&storage);
        let mut store = restored.store;
        assert_eq!(store.len(), 2);
        assert_eq!(store.link_at(0).unwrap().id, LinkId(0));
        assert_eq!(store.link_at(1).unwrap().id, LinkId(1));
        assert_eq!(store.name_of(LinkId(0)), Some("Lyra"));

        let next = store.add_link(0, 2, 3).unwrap();
        assert_eq!(next, LinkId(2));
    }

    #[test]
    fn test_add_link_when_ids_run_out() {
        let mut storage = MemoryStore::new();
        storage
            .set(
                keys::OWN_CONSTELLATION,
                r#"[{"id":18446744073709551613,"starIndex1":0,"starIndex2":1}]"#,
            )
            .unwrap();

        let mut store = AnnotationStore::restore(&storage).store;
        assert_eq!(store.link_at(0).unwrap().id, LinkId(u64::MAX - 2));
        assert_eq!(store.add_link(1, 2, 3), Ok(LinkId(u64::MAX - 1)));
        assert_eq!(store.add_link(1, 2, 3), Err(AnnotationError::IdsExhausted));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_reset_clears_storage() {
        let (mut store, ids) = store_with_links(2);
        store.name_links(&[ids[0]], "Orion").unwrap();
        let mut storage = MemoryStore::new();
        store.persist(&mut storage).unwrap();

        store.reset(&mut storage).unwrap();
        assert!(store.is_empty());
        assert!(store.known_names().is_empty());
        assert!(storage.get(keys::OWN_CONSTELLATION).is_none());
        assert!(storage.get(keys::CONSTELLATION_NAMES).is_none());
    }
}
