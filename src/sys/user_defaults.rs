use objc2::rc::Retained;
use objc2::runtime::AnyObject;
use objc2_foundation::{NSDictionary, NSString, NSUserDefaults};
use tracing::warn;

use crate::model::labels::{LabelMap, Preferences, StoreError};

/// The application's `NSUserDefaults` domain.
///
/// Maps are stored as `NSDictionary<NSString, NSString>`, which is what the
/// defaults system writes to the app's preference plist.
pub struct UserDefaults {
    defaults: Retained<NSUserDefaults>,
}

impl UserDefaults {
    pub fn standard() -> Self {
        Self {
            defaults: NSUserDefaults::standardUserDefaults(),
        }
    }
}

impl Preferences for UserDefaults {
    fn read_map(&self, key: &str) -> Result<Option<LabelMap>, StoreError> {
        let ns_key = NSString::from_str(key);
        #[allow(unused_unsafe)]
        let Some(dict) = (unsafe { self.defaults.dictionaryForKey(&ns_key) }) else {
            return Ok(None);
        };

        let mut map = LabelMap::new();
        for entry_key in dict.allKeys().to_vec() {
            let value = dict.objectForKey(&entry_key);
            match value.map(Retained::downcast::<NSString>) {
                Some(Ok(value)) => {
                    map.insert(entry_key.to_string(), value.to_string());
                }
                _ => {
                    // A map that is not all strings is unusable as a whole.
                    warn!(key, entry = %entry_key, "Stored label map has a non-string entry; ignoring it");
                    return Ok(None);
                }
            }
        }
        Ok(Some(map))
    }

    fn write_map(&self, key: &str, map: &LabelMap) -> Result<(), StoreError> {
        let ns_key = NSString::from_str(key);
        // Managed (profile-installed) values silently win over anything we set.
        if self.defaults.objectIsForcedForKey(&ns_key) {
            return Err(StoreError::Rejected(key.to_owned()));
        }

        let keys: Vec<Retained<NSString>> = map.keys().map(|k| NSString::from_str(k)).collect();
        let values: Vec<Retained<NSString>> = map.values().map(|v| NSString::from_str(v)).collect();
        let key_refs: Vec<&NSString> = keys.iter().map(|k| &**k).collect();
        let value_refs: Vec<&NSString> = values.iter().map(|v| &**v).collect();
        let dict = NSDictionary::from_slices(&key_refs, &value_refs);

        let object: &AnyObject = &dict;
        unsafe {
            self.defaults.setObject_forKey(Some(object), &ns_key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use objc2::{AllocAnyThread, define_class, msg_send};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::labels::{LABELS_KEY, LabelStore};
    use crate::model::space::SpaceId;

    define_class!(
        /// Defaults whose every key behaves as if set by a configuration profile.
        #[unsafe(super(NSUserDefaults))]
        #[name = "SpaceLabelManagedDefaults"]
        struct ManagedDefaults;

        impl ManagedDefaults {
            #[unsafe(method(objectIsForcedForKey:))]
            fn object_is_forced_for_key(&self, _key: &NSString) -> bool { true }
        }
    );

    /// A scratch defaults suite, removed again on drop.
    struct Suite {
        name: Retained<NSString>,
        defaults: UserDefaults,
    }

    impl Suite {
        fn new(test: &str) -> Self {
            let name = suite_name(test);
            let defaults =
                NSUserDefaults::initWithSuiteName(NSUserDefaults::alloc(), Some(&name)).unwrap();
            Self { name, defaults: UserDefaults { defaults } }
        }

        fn managed(test: &str) -> Self {
            let name = suite_name(test);
            let this = ManagedDefaults::alloc().set_ivars(());
            let managed: Option<Retained<ManagedDefaults>> =
                unsafe { msg_send![super(this), initWithSuiteName: &*name] };
            let defaults = Retained::into_super(managed.unwrap());
            Self { name, defaults: UserDefaults { defaults } }
        }
    }

    impl Drop for Suite {
        fn drop(&mut self) { self.defaults.defaults.removePersistentDomainForName(&self.name); }
    }

    fn suite_name(test: &str) -> Retained<NSString> {
        NSString::from_str(&format!(
            "com.drpedapati.spacelabel.tests.{}.{test}",
            std::process::id()
        ))
    }

    #[test_log::test]
    fn labels_round_trip_through_defaults() {
        let suite = Suite::new("round_trip");
        assert_eq!(suite.defaults.read_map(LABELS_KEY).unwrap(), None);

        let store = LabelStore::new(&suite.defaults);
        store.set(SpaceId::new(42), "Dev").unwrap();
        assert_eq!(store.get(SpaceId::new(42)).as_deref(), Some("Dev"));
        assert!(store.remove(SpaceId::new(42)).unwrap());
        assert_eq!(suite.defaults.read_map(LABELS_KEY).unwrap(), Some(LabelMap::new()));
    }

    #[test_log::test]
    fn non_string_entry_reads_as_absent() {
        let suite = Suite::new("non_string");
        let inner = NSDictionary::<NSString, NSString>::new();
        let key = NSString::from_str("42");
        let value: &AnyObject = &inner;
        let dict = NSDictionary::<NSString, AnyObject>::from_slices(&[&*key], &[value]);
        let object: &AnyObject = &dict;
        let labels_key = NSString::from_str(LABELS_KEY);
        unsafe { suite.defaults.defaults.setObject_forKey(Some(object), &labels_key) };

        assert_eq!(suite.defaults.read_map(LABELS_KEY).unwrap(), None);
        assert_eq!(LabelStore::new(&suite.defaults).get(SpaceId::new(42)), None);
    }

    #[test_log::test]
    fn forced_key_rejects_writes() {
        let suite = Suite::managed("forced");
        let store = LabelStore::new(&suite.defaults);
        assert!(matches!(store.set(SpaceId::new(1), "Dev"), Err(StoreError::Rejected(_))));
        assert_eq!(suite.defaults.read_map(LABELS_KEY).unwrap(), None);
    }
}
