//! Expiring type-info cache.
//!
//! An owned map from type name to `(value, expiry)`. Callers hold it and pass
//! it by reference; time is always supplied by the caller so lookups are
//! deterministic.
use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    Never,
    At(DateTime<Utc>),
}

impl Expiry {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        match self {
            Expiry::Never => true,
            Expiry::At(valid_until) => now < *valid_until,
        }
    }
}

/// What a `Cache-Control` response header allows. Meant for code that
/// fetches type info over HTTP; register annotation caches with
/// `Expiry::Never` and does not go through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    NoStore,
    MaxAge(TimeDelta),
}

impl CachePolicy {
    /// Only `max-age=N` permits caching; a missing, `no-store` or unparsable
    /// header does not.
    pub fn from_header(header: Option<&str>) -> Self {
        let Some(header) = header else { return CachePolicy::NoStore };
        header
            .split(',')
            .map(str::trim)
            .find_map(|directive| {
                let seconds = directive.strip_prefix("max-age=")?;
                seconds.trim().parse::<i64>().ok()
            })
            .filter(|seconds| *seconds >= 0 && !header.contains("no-store"))
            .and_then(TimeDelta::try_seconds)
            .map(CachePolicy::MaxAge)
            .unwrap_or(CachePolicy::NoStore)
    }
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expiry: Expiry,
}

#[derive(Debug, Clone)]
pub struct TypeInfoCache<V> {
    entries: HashMap<String, Entry<V>>,
}

impl<V> Default for TypeInfoCache<V> {
    fn default() -> Self {
        Self { entries: HashMap::new() }
    }
}

impl<V> TypeInfoCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: V, expiry: Expiry) {
        self.entries.insert(name.into(), Entry { value, expiry });
    }

    /// Store according to a response's cache policy. Returns whether the value was kept.
    pub fn insert_with_policy(
        &mut self,
        name: impl Into<String>,
        value: V,
        policy: CachePolicy,
        now: DateTime<Utc>,
    ) -> bool {
        let name = name.into();
        match policy {
            CachePolicy::NoStore => {
                debug!(type_name = %name, "not caching: no-store");
                false
            }
            CachePolicy::MaxAge(ttl) => {
                debug!(type_name = %name, ttl_secs = ttl.num_seconds(), "caching type info");
                self.insert(name, value, Expiry::At(now + ttl));
                true
            }
        }
    }

    /// Live entry for `name`; expired entries read as absent.
    pub fn get(&self, name: &str, now: DateTime<Utc>) -> Option<&V> {
        self.entries
            .get(name)
            .filter(|entry| entry.expiry.is_live(now))
            .map(|entry| &entry.value)
    }

    pub fn contains(&self, name: &str, now: DateTime<Utc>) -> bool {
        self.get(name, now).is_some()
    }

    /// Drop expired entries; returns how many were removed.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expiry.is_live(now));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
