//! Thread-scoped dispatch suppression, for test isolation.
//!
//! The store is partitioned by thread, so no locking is needed: each thread
//! only reads and writes its own partition. Scopes are RAII guards; entries
//! are counted so nested scopes restore prior state exactly, including when
//! a guard is dropped during unwinding.

use crate::record::Record;

use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Default)]
struct SuppressionSet {
    types: HashMap<String, usize>,
    instances: HashMap<(String, String), usize>,
}

thread_local! {
    static SUPPRESSED: RefCell<SuppressionSet> = RefCell::new(SuppressionSet::default());
}

/// True if dispatch is suppressed for this model or this specific instance
/// on the current thread.
pub fn is_suppressed(model: &str, record_id: &str) -> bool {
    SUPPRESSED.with(|set| {
        let set = set.borrow();
        set.types.contains_key(model)
            || set
                .instances
                .contains_key(&(model.to_string(), record_id.to_string()))
    })
}

/// Guard suppressing dispatch for a set of watched types.
#[must_use = "dispatch is re-enabled when the guard is dropped"]
pub struct TypeSuppression {
    models: Vec<String>,
}

impl Drop for TypeSuppression {
    fn drop(&mut self) {
        SUPPRESSED.with(|set| {
            let mut set = set.borrow_mut();
            for model in &self.models {
                release(&mut set.types, model);
            }
        });
    }
}

/// Guard suppressing dispatch for specific record instances.
#[must_use = "dispatch is re-enabled when the guard is dropped"]
pub struct RecordSuppression {
    keys: Vec<(String, String)>,
}

impl Drop for RecordSuppression {
    fn drop(&mut self) {
        SUPPRESSED.with(|set| {
            let mut set = set.borrow_mut();
            for key in &self.keys {
                release(&mut set.instances, key);
            }
        });
    }
}

fn acquire<K: std::hash::Hash + Eq + Clone>(map: &mut HashMap<K, usize>, key: &K) {
    *map.entry(key.clone()).or_insert(0) += 1;
}

fn release<K: std::hash::Hash + Eq>(map: &mut HashMap<K, usize>, key: &K) {
    if let Some(count) = map.get_mut(key) {
        *count -= 1;
        if *count == 0 {
            map.remove(key);
        }
    }
}

/// Suppress dispatch for the given model names until the guard is dropped.
pub fn suppress_types<I, S>(models: I) -> TypeSuppression
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let models: Vec<String> = models.into_iter().map(Into::into).collect();
    SUPPRESSED.with(|set| {
        let mut set = set.borrow_mut();
        for model in &models {
            acquire(&mut set.types, model);
        }
    });
    TypeSuppression { models }
}

/// Suppress dispatch for one watched type until the guard is dropped.
pub fn suppress_type<R: Record>() -> TypeSuppression {
    suppress_types([R::MODEL])
}

/// Suppress dispatch for specific instances until the guard is dropped.
///
/// Sibling instances of the same type keep dispatching.
pub fn suppress_records<'a, R, I>(records: I) -> RecordSuppression
where
    R: Record,
    I: IntoIterator<Item = &'a R>,
{
    let keys: Vec<(String, String)> = records
        .into_iter()
        .map(|r| (R::MODEL.to_string(), r.record_id()))
        .collect();
    SUPPRESSED.with(|set| {
        let mut set = set.borrow_mut();
        for key in &keys {
            acquire(&mut set.instances, key);
        }
    });
    RecordSuppression { keys }
}

/// Suppress dispatch for one instance until the guard is dropped.
pub fn suppress_record<R: Record>(record: &R) -> RecordSuppression {
    suppress_records([record])
}
