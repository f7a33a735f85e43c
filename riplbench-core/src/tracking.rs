//! Per-key value collection
//!
//! [`Tracked`] accumulates engine-reported values for a set of keys (assume
//! symbols or observe indices) across samples or sweeps. A key whose values
//! stop being consistent is dropped and stays dropped for the rest of the
//! collection run.

use crate::value::{Scalar, Value};
use fxhash::{FxHashMap, FxHashSet};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::hash::Hash;

/// Seed for choosing which predicts to track.
///
/// Fixed so that the same universe and count always select the same subset.
pub const TRACK_SEED: u64 = 1653315835;

/// Values collected per key during one collection run
#[derive(Debug, Clone)]
pub struct Tracked<K> {
    values: FxHashMap<K, Vec<Value>>,
    dropped: FxHashSet<K>,
}

impl<K: Eq + Hash + Clone + Ord> Tracked<K> {
    /// Start tracking `keys`, each with no values yet
    pub fn new(keys: impl IntoIterator<Item = K>) -> Self {
        Self {
            values: keys.into_iter().map(|k| (k, Vec::new())).collect(),
            dropped: FxHashSet::default(),
        }
    }

    /// Keys still being tracked, sorted
    pub fn keys(&self) -> Vec<K> {
        let mut keys: Vec<K> = self.values.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Values recorded so far for `key`
    pub fn get(&self, key: &K) -> Option<&[Value]> {
        self.values.get(key).map(Vec::as_slice)
    }

    /// Whether `key` is still tracked
    pub fn contains(&self, key: &K) -> bool {
        self.values.contains_key(key)
    }

    /// Whether `key` was dropped during this run
    pub fn is_dropped(&self, key: &K) -> bool {
        self.dropped.contains(key)
    }

    /// Number of keys still tracked
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no keys remain
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Stop tracking `key`, discarding everything recorded for it
    pub fn drop_key(&mut self, key: &K) {
        if self.values.remove(key).is_some() {
            self.dropped.insert(key.clone());
        }
    }

    /// Record `value` for `key`.
    ///
    /// The first value must be recordable; every later value must have the
    /// same kind as the first. Otherwise the key is dropped. Returns whether
    /// the value was kept.
    pub fn record(&mut self, key: &K, value: Value) -> bool {
        let Some(values) = self.values.get_mut(key) else {
            return false;
        };

        let consistent = match values.first() {
            Some(first) => first.kind() == value.kind(),
            None => value.is_recordable(),
        };

        if consistent {
            values.push(value);
        } else {
            tracing::warn!(
                "Dropping series: {:?} is inconsistent with earlier values",
                value.kind()
            );
            self.drop_key(key);
        }
        consistent
    }

    /// Consume into `(key, scalars)` pairs sorted by key
    pub fn into_series(self) -> Vec<(K, Vec<Scalar>)> {
        let mut series: Vec<(K, Vec<Scalar>)> = self
            .values
            .into_iter()
            .map(|(k, vs)| (k, vs.iter().filter_map(Value::scalar).collect()))
            .collect();
        series.sort_by(|a, b| a.0.cmp(&b.0));
        series
    }
}

/// Keep a uniformly random subset of at most `track` entries.
///
/// Entries are ordered by key before sampling and the generator is seeded
/// with [`TRACK_SEED`], so the result depends only on the key universe and
/// `track`. The engine's own random state is not touched.
pub fn select_tracked<K, V>(entries: FxHashMap<K, V>, track: usize) -> FxHashMap<K, V>
where
    K: Eq + Hash + Ord,
{
    let mut entries: Vec<(K, V)> = entries.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let amount = track.min(entries.len());
    let mut rng = StdRng::seed_from_u64(TRACK_SEED);
    let mut keep = vec![false; entries.len()];
    for idx in rand::seq::index::sample(&mut rng, entries.len(), amount).iter() {
        keep[idx] = true;
    }

    entries
        .into_iter()
        .zip(keep)
        .filter_map(|(entry, kept)| kept.then_some(entry))
        .collect()
}
