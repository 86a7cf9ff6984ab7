//! Persistence of user-chosen Space names.
//!
//! Labels are kept as one string → string map under a single preference key.
//! Every operation loads the whole map, changes it and writes it back; there
//! is exactly one writer (this process, on the main thread).

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, warn};

use super::space::SpaceId;

/// Preference key the label map is stored under.
pub const LABELS_KEY: &str = "SpaceLabels";

/// Space identifier (decimal string) → label.
pub type LabelMap = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access label file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("label file {} is not a JSON object", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("preference store rejected the write for key {0:?}")]
    Rejected(String),
}

/// A key-value preference domain that can hold string maps.
pub trait Preferences {
    /// Returns `Ok(None)` when nothing is stored under `key`.
    fn read_map(&self, key: &str) -> Result<Option<LabelMap>, StoreError>;

    fn write_map(&self, key: &str, map: &LabelMap) -> Result<(), StoreError>;
}

impl<P: Preferences + ?Sized> Preferences for &P {
    fn read_map(&self, key: &str) -> Result<Option<LabelMap>, StoreError> {
        (**self).read_map(key)
    }

    fn write_map(&self, key: &str, map: &LabelMap) -> Result<(), StoreError> {
        (**self).write_map(key, map)
    }
}

impl<P: Preferences + ?Sized> Preferences for Box<P> {
    fn read_map(&self, key: &str) -> Result<Option<LabelMap>, StoreError> {
        (**self).read_map(key)
    }

    fn write_map(&self, key: &str, map: &LabelMap) -> Result<(), StoreError> {
        (**self).write_map(key, map)
    }
}

/// Preferences that live only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    maps: RefCell<HashMap<String, LabelMap>>,
}

impl Preferences for MemoryPreferences {
    fn read_map(&self, key: &str) -> Result<Option<LabelMap>, StoreError> {
        Ok(self.maps.borrow().get(key).cloned())
    }

    fn write_map(&self, key: &str, map: &LabelMap) -> Result<(), StoreError> {
        self.maps.borrow_mut().insert(key.to_owned(), map.clone());
        Ok(())
    }
}

pub struct LabelStore<P> {
    prefs: P,
}

impl<P: Preferences> LabelStore<P> {
    pub fn new(prefs: P) -> Self { Self { prefs } }

    /// Label for `space`, if the user has named it.
    ///
    /// An unreadable map is logged and treated as empty.
    pub fn get(&self, space: SpaceId) -> Option<String> {
        match self.prefs.read_map(LABELS_KEY) {
            Ok(map) => map.and_then(|mut map| map.remove(&space.key())),
            Err(err) => {
                warn!(%space, error = %err, "Unable to read label map; treating as empty");
                None
            }
        }
    }

    /// Stores `name` (trimmed) for `space`, replacing any earlier label.
    ///
    /// Returns the stored name, or `None` when the name is blank and nothing
    /// was written.
    pub fn set(&self, space: SpaceId, name: &str) -> Result<Option<String>, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            debug!(%space, "Ignoring blank label");
            return Ok(None);
        }
        let mut map = self.load()?;
        map.insert(space.key(), name.to_owned());
        self.prefs.write_map(LABELS_KEY, &map)?;
        debug!(%space, name, "Saved label");
        Ok(Some(name.to_owned()))
    }

    /// Removes the label for `space`. Returns whether one existed.
    pub fn remove(&self, space: SpaceId) -> Result<bool, StoreError> {
        let mut map = self.load()?;
        if map.remove(&space.key()).is_none() {
            return Ok(false);
        }
        self.prefs.write_map(LABELS_KEY, &map)?;
        debug!(%space, "Removed label");
        Ok(true)
    }

    /// Every stored label, keyed by the persisted identifier string.
    pub fn all(&self) -> Result<LabelMap, StoreError> { self.load() }

    // Mutations must not overwrite a map we failed to read.
    fn load(&self) -> Result<LabelMap, StoreError> {
        Ok(self.prefs.read_map(LABELS_KEY)?.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn store() -> LabelStore<MemoryPreferences> { LabelStore::new(MemoryPreferences::default()) }

    struct BrokenPreferences;

    impl Preferences for BrokenPreferences {
        fn read_map(&self, _key: &str) -> Result<Option<LabelMap>, StoreError> {
            Err(StoreError::Io {
                path: PathBuf::from("labels.json"),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            })
        }

        fn write_map(&self, key: &str, _map: &LabelMap) -> Result<(), StoreError> {
            Err(StoreError::Rejected(key.to_owned()))
        }
    }

    #[test_log::test]
    fn missing_map_reads_as_empty() {
        let store = store();
        assert_eq!(store.get(SpaceId::new(3)), None);
        assert_eq!(store.all().unwrap(), LabelMap::new());
    }

    #[test_log::test]
    fn set_trims_and_overwrites() {
        let store = store();
        let space = SpaceId::new(42);

        assert_eq!(store.set(space, "  Dev \n").unwrap(), Some("Dev".to_owned()));
        assert_eq!(store.get(space).as_deref(), Some("Dev"));

        store.set(space, "Mail").unwrap();
        assert_eq!(store.get(space).as_deref(), Some("Mail"));
    }

    #[test_log::test]
    fn blank_names_keep_the_previous_label() {
        let store = store();
        let space = SpaceId::new(9);

        assert_eq!(store.set(space, " \t ").unwrap(), None);
        assert_eq!(store.get(space), None);

        store.set(space, "Music").unwrap();
        assert_eq!(store.set(space, "").unwrap(), None);
        assert_eq!(store.get(space).as_deref(), Some("Music"));
    }

    #[test_log::test]
    fn remove_is_idempotent() {
        let store = store();
        let space = SpaceId::new(5);

        assert!(!store.remove(space).unwrap());
        store.set(space, "Chat").unwrap();
        assert!(store.remove(space).unwrap());
        assert_eq!(store.get(space), None);
        assert!(!store.remove(space).unwrap());
    }

    #[test_log::test]
    fn labels_are_independent_per_space() {
        let store = store();
        store.set(SpaceId::new(1), "One").unwrap();
        store.set(SpaceId::new(2), "Two").unwrap();
        store.remove(SpaceId::new(1)).unwrap();

        let expected = LabelMap::from([("2".to_owned(), "Two".to_owned())]);
        assert_eq!(store.all().unwrap(), expected);
    }

    #[test_log::test]
    fn unreadable_store_reads_as_unlabeled_but_refuses_writes() {
        let store = LabelStore::new(BrokenPreferences);
        assert_eq!(store.get(SpaceId::new(1)), None);
        assert!(matches!(store.set(SpaceId::new(1), "x"), Err(StoreError::Io { .. })));
        assert!(matches!(store.remove(SpaceId::new(1)), Err(StoreError::Io { .. })));
    }
}
