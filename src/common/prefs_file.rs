//! Preference domain backed by a JSON file, for when `NSUserDefaults` is not
//! wanted (or not available).

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde_json::Value;
use tracing::{trace, warn};

use crate::model::labels::{LabelMap, Preferences, StoreError};

type Domain = BTreeMap<String, Value>;

/// The whole domain is one JSON object of `key → value`. Label maps are
/// stored as `{ id → label }` objects; other keys are kept as they are.
#[derive(Debug, Clone)]
pub struct JsonFilePreferences {
    path: PathBuf,
}

impl JsonFilePreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io { path: self.path.clone(), source }
    }

    fn read_domain(&self) -> Result<Domain, StoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Domain::new()),
            Err(err) => return Err(self.io_err(err)),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Domain::new());
        }
        serde_json::from_slice(&bytes)
            .map_err(|source| StoreError::Json { path: self.path.clone(), source })
    }

    fn write_domain(&self, domain: &Domain) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| self.io_err(err))?;
        }
        let json = serde_json::to_vec_pretty(domain)
            .map_err(|source| StoreError::Json { path: self.path.clone(), source })?;
        // Write beside the target and rename over it so readers never see a
        // half-written file.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|err| self.io_err(err))?;
        std::fs::rename(&tmp, &self.path).map_err(|err| self.io_err(err))?;
        trace!(path = %self.path.display(), "Wrote preference file");
        Ok(())
    }
}

impl Preferences for JsonFilePreferences {
    fn read_map(&self, key: &str) -> Result<Option<LabelMap>, StoreError> {
        let Some(value) = self.read_domain()?.remove(key) else { return Ok(None) };
        match serde_json::from_value(value) {
            Ok(map) => Ok(Some(map)),
            Err(err) => {
                warn!(key, error = %err, "Stored value is not a string map; ignoring it");
                Ok(None)
            }
        }
    }

    fn write_map(&self, key: &str, map: &LabelMap) -> Result<(), StoreError> {
        let mut domain = self.read_domain()?;
        let value = serde_json::to_value(map)
            .map_err(|source| StoreError::Json { path: self.path.clone(), source })?;
        domain.insert(key.to_owned(), value);
        self.write_domain(&domain)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::labels::{LABELS_KEY, LabelStore};
    use crate::model::space::SpaceId;

    #[test_log::test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = JsonFilePreferences::new(dir.path().join("labels.json"));
        assert_eq!(prefs.read_map(LABELS_KEY).unwrap(), None);
    }

    #[test_log::test]
    fn labels_survive_a_new_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("labels.json");

        let store = LabelStore::new(JsonFilePreferences::new(&path));
        store.set(SpaceId::new(42), "Dev").unwrap();
        store.set(SpaceId::new(7), "Mail").unwrap();
        store.remove(SpaceId::new(7)).unwrap();

        let reopened = LabelStore::new(JsonFilePreferences::new(&path));
        assert_eq!(reopened.get(SpaceId::new(42)).as_deref(), Some("Dev"));
        assert_eq!(reopened.get(SpaceId::new(7)), None);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test_log::test]
    fn other_keys_are_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, r#"{"Other": {"a": "b"}}"#).unwrap();

        let prefs = JsonFilePreferences::new(&path);
        let map = LabelMap::from([("1".to_owned(), "One".to_owned())]);
        prefs.write_map(LABELS_KEY, &map).unwrap();

        assert_eq!(prefs.read_map(LABELS_KEY).unwrap(), Some(map));
        assert_eq!(
            prefs.read_map("Other").unwrap(),
            Some(LabelMap::from([("a".to_owned(), "b".to_owned())]))
        );
    }

    #[test_log::test]
    fn unrelated_values_do_not_hide_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, r#"{"Other": 3, "SpaceLabels": {"42": "Dev"}}"#).unwrap();

        let store = LabelStore::new(JsonFilePreferences::new(&path));
        assert_eq!(store.get(SpaceId::new(42)).as_deref(), Some("Dev"));
        store.set(SpaceId::new(7), "Mail").unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let written: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(written["Other"], Value::from(3));
        assert_eq!(written["SpaceLabels"]["7"], Value::from("Mail"));
        assert_eq!(written["SpaceLabels"]["42"], Value::from("Dev"));
    }

    #[test_log::test]
    fn non_string_label_map_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, r#"{"SpaceLabels": {"42": 1}}"#).unwrap();

        let prefs = JsonFilePreferences::new(&path);
        assert_eq!(prefs.read_map(LABELS_KEY).unwrap(), None);

        let store = LabelStore::new(prefs);
        store.set(SpaceId::new(42), "Dev").unwrap();
        assert_eq!(store.get(SpaceId::new(42)).as_deref(), Some("Dev"));
    }

    #[test_log::test]
    fn corrupt_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = LabelStore::new(JsonFilePreferences::new(&path));
        assert_eq!(store.get(SpaceId::new(1)), None);
        assert!(matches!(store.set(SpaceId::new(1), "x"), Err(StoreError::Json { .. })));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }
}
