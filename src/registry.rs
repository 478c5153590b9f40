//! Load-time registry of watched record types.
//!
//! Each watched type carries its payload transform, resolved by direct
//! lookup at dispatch time. The default transform over the declared fields
//! is attached once, when the entry is created.

use crate::error::EventError;
use crate::naming::slug_model_name;
use crate::record::{snapshot, Record};

use serde_json::{Map, Value};
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// Typed payload transform for a watched record type.
pub type SerializerFn<R> =
    Arc<dyn Fn(&R) -> Result<Map<String, Value>, EventError> + Send + Sync>;

/// Watch options for one record type.
///
/// # Example
///
/// ```rust,ignore
/// registry.watch::<StatusModel>(Watch::new().status_field("status"))?;
/// registry.watch::<Model1>(Watch::new().serializer(|m: &Model1| { /* ... */ }))?;
/// ```
pub struct Watch<R: Record> {
    serializer: Option<SerializerFn<R>>,
    status_field: Option<String>,
    event_name_prefix: Option<String>,
}

impl<R: Record> Watch<R> {
    /// Create watch options with the defaults: all declared fields,
    /// create/update/delete naming, snake_case base name.
    #[must_use]
    pub fn new() -> Self {
        Self {
            serializer: None,
            status_field: None,
            event_name_prefix: None,
        }
    }

    /// Use a custom payload transform instead of the full-field default.
    pub fn serializer(
        mut self,
        f: impl Fn(&R) -> Result<Map<String, Value>, EventError> + Send + Sync + 'static,
    ) -> Self {
        self.serializer = Some(Arc::new(f));
        self
    }

    /// Name events after the current value of this field instead of the
    /// create/update distinction.
    pub fn status_field(mut self, field: impl Into<String>) -> Self {
        self.status_field = Some(field.into());
        self
    }

    /// Override the derived snake_case base name.
    pub fn event_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.event_name_prefix = Some(prefix.into());
        self
    }
}

impl<R: Record> Default for Watch<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// One watched type, immutable after load.
pub(crate) struct WatchedType {
    pub base_name: String,
    pub status_field: Option<String>,
    type_id: TypeId,
    serializer: Box<dyn Any + Send + Sync>,
}

impl WatchedType {
    /// Downcast the stored transform back to its typed form.
    ///
    /// Returns None if the entry was registered for a different type that
    /// shares the same model name.
    pub(crate) fn serializer_for<R: Record>(&self) -> Option<&SerializerFn<R>> {
        if self.type_id != TypeId::of::<R>() {
            return None;
        }
        self.serializer.downcast_ref::<SerializerFn<R>>()
    }
}

/// Registry of watched types plus the set currently active.
///
/// Entries are created at process start and never change; activation is the
/// only mutable part, so `register`/`unregister` can be called on a shared
/// dispatcher.
pub struct Registry {
    entries: HashMap<&'static str, WatchedType>,
    active: RwLock<HashSet<&'static str>>,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            active: RwLock::new(HashSet::new()),
        }
    }

    /// Add a watched type. The entry starts active.
    ///
    /// Fails if the model is already watched, or if the configured status
    /// field is not one of the type's declared fields. Both are fatal
    /// configuration errors and the process should not start.
    pub fn watch<R: Record>(&mut self, watch: Watch<R>) -> Result<(), EventError> {
        if self.entries.contains_key(R::MODEL) {
            return Err(EventError::DuplicateWatch {
                model: R::MODEL.to_string(),
            });
        }

        if let Some(field) = &watch.status_field {
            if !R::FIELDS.contains(&field.as_str()) {
                return Err(EventError::UnknownStatusField {
                    model: R::MODEL.to_string(),
                    field: field.clone(),
                });
            }
        }

        let serializer: SerializerFn<R> = match watch.serializer {
            Some(f) => f,
            None => Arc::new(|record: &R| snapshot(record)),
        };

        let base_name = watch
            .event_name_prefix
            .unwrap_or_else(|| slug_model_name(R::MODEL));

        self.entries.insert(
            R::MODEL,
            WatchedType {
                base_name,
                status_field: watch.status_field,
                type_id: TypeId::of::<R>(),
                serializer: Box::new(serializer),
            },
        );
        self.active
            .write()
            .expect("active set lock poisoned")
            .insert(R::MODEL);
        Ok(())
    }

    pub(crate) fn entry(&self, model: &str) -> Option<&WatchedType> {
        self.entries.get(model)
    }

    pub(crate) fn is_active(&self, model: &str) -> bool {
        self.active
            .read()
            .expect("active set lock poisoned")
            .contains(model)
    }

    /// Activate watched types: all of them, or only those in `models`.
    pub fn register(&self, models: Option<&[&str]>) {
        let mut active = self.active.write().expect("active set lock poisoned");
        for model in self.entries.keys() {
            if models.map_or(true, |filter| filter.contains(model)) {
                active.insert(*model);
            }
        }
    }

    /// Deactivate watched types: all of them, or only those in `models`.
    ///
    /// Deactivated types are silently skipped by the dispatcher until
    /// registered again.
    pub fn unregister(&self, models: Option<&[&str]>) {
        let mut active = self.active.write().expect("active set lock poisoned");
        for model in self.entries.keys() {
            if models.map_or(true, |filter| filter.contains(model)) {
                active.remove(model);
            }
        }
    }

    /// Model names of every watched type, active or not.
    pub fn models(&self) -> Vec<&'static str> {
        self.entries.keys().copied().collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Debug, Serialize)]
    struct Sample {
        id: i64,
        status: String,
    }

    impl Record for Sample {
        const MODEL: &'static str = "app.Sample";
        const FIELDS: &'static [&'static str] = &["id", "status"];

        fn record_id(&self) -> String {
            self.id.to_string()
        }
    }

    #[test]
    fn test_watch_is_active_by_default() {
        let mut registry = Registry::new();
        registry.watch::<Sample>(Watch::new()).unwrap();

        assert!(registry.is_active("app.Sample"));
        assert_eq!(registry.entry("app.Sample").unwrap().base_name, "sample");
    }

    #[test]
    fn test_duplicate_watch_rejected() {
        let mut registry = Registry::new();
        registry.watch::<Sample>(Watch::new()).unwrap();

        let err = registry.watch::<Sample>(Watch::new()).unwrap_err();
        assert!(matches!(err, EventError::DuplicateWatch { .. }));
    }

    #[test]
    fn test_unknown_status_field_fails_at_load() {
        let mut registry = Registry::new();
        let err = registry
            .watch::<Sample>(Watch::new().status_field("state"))
            .unwrap_err();

        assert!(matches!(
            err,
            EventError::UnknownStatusField { ref field, .. } if field == "state"
        ));
    }

    #[test]
    fn test_event_name_prefix_overrides_slug() {
        let mut registry = Registry::new();
        registry
            .watch::<Sample>(Watch::new().event_name_prefix("custom_name"))
            .unwrap();

        assert_eq!(
            registry.entry("app.Sample").unwrap().base_name,
            "custom_name"
        );
    }

    #[test]
    fn test_default_serializer_covers_declared_fields() {
        let mut registry = Registry::new();
        registry.watch::<Sample>(Watch::new()).unwrap();

        let entry = registry.entry("app.Sample").unwrap();
        let serializer = entry.serializer_for::<Sample>().unwrap();
        let payload = serializer(&Sample {
            id: 3,
            status: "created".to_string(),
        })
        .unwrap();

        let keys: Vec<&str> = payload.keys().map(String::as_str).collect();
        assert_eq!(keys, Sample::FIELDS);
    }

    #[test]
    fn test_register_unregister_filtered() {
        let mut registry = Registry::new();
        registry.watch::<Sample>(Watch::new()).unwrap();

        registry.unregister(Some(&["app.Other"]));
        assert!(registry.is_active("app.Sample"));

        registry.unregister(Some(&["app.Sample"]));
        assert!(!registry.is_active("app.Sample"));

        registry.register(None);
        assert!(registry.is_active("app.Sample"));
    }
}
