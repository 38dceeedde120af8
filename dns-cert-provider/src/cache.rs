//! In-process caches owned by adapter instances.
//!
//! Vendors without a cheap "get by id" endpoint, or that address records through a
//! compound (zone id, record id) pair, keep what they have already seen here.
//! Both caches follow [`CachePolicy::NeverExpire`]: entries live as long as the
//! adapter instance, are overwritten when the same id is seen again, and are only
//! removed when the adapter itself deletes the record. A record deleted outside
//! this process stays cached; callers that need fresh data list again.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::types::{DomainInfo, DomainRecord};

/// Eviction policy of an adapter cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Entries are kept for the adapter's lifetime.
    NeverExpire,
}

/// Record id → uniform record.
#[derive(Debug)]
pub struct RecordCache {
    policy: CachePolicy,
    records: RwLock<HashMap<String, DomainRecord>>,
}

impl RecordCache {
    pub fn new() -> Self {
        Self {
            policy: CachePolicy::NeverExpire,
            records: RwLock::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    pub async fn get(&self, id: &str) -> Option<DomainRecord> {
        self.records.read().await.get(id).cloned()
    }

    pub async fn put(&self, record: &DomainRecord) {
        if record.id.is_empty() {
            return;
        }
        self.records
            .write()
            .await
            .insert(record.id.clone(), record.clone());
    }

    pub async fn put_all(&self, records: &[DomainRecord]) {
        let mut guard = self.records.write().await;
        for record in records.iter().filter(|r| !r.id.is_empty()) {
            guard.insert(record.id.clone(), record.clone());
        }
    }

    pub async fn remove(&self, id: &str) -> Option<DomainRecord> {
        self.records.write().await.remove(id)
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for RecordCache {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
struct ZoneIndex {
    by_name: HashMap<String, DomainInfo>,
    by_id: HashMap<String, DomainInfo>,
}

/// Zone name ↔ zone id, for vendors whose record endpoints take a zone id.
#[derive(Debug)]
pub struct ZoneCache {
    policy: CachePolicy,
    index: RwLock<ZoneIndex>,
}

impl ZoneCache {
    pub fn new() -> Self {
        Self {
            policy: CachePolicy::NeverExpire,
            index: RwLock::new(ZoneIndex::default()),
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Lookup by zone name; trailing dots and case are ignored.
    pub async fn get_by_name(&self, name: &str) -> Option<DomainInfo> {
        self.index
            .read()
            .await
            .by_name
            .get(&zone_key(name))
            .cloned()
    }

    pub async fn get_by_id(&self, id: &str) -> Option<DomainInfo> {
        self.index.read().await.by_id.get(id).cloned()
    }

    pub async fn put_all(&self, zones: &[DomainInfo]) {
        let mut guard = self.index.write().await;
        for zone in zones {
            guard.by_name.insert(zone_key(&zone.name), zone.clone());
            guard.by_id.insert(zone.id.clone(), zone.clone());
        }
    }

    pub async fn is_empty(&self) -> bool {
        self.index.read().await.by_id.is_empty()
    }
}

impl Default for ZoneCache {
    fn default() -> Self {
        Self::new()
    }
}

fn zone_key(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, value: &str) -> DomainRecord {
        DomainRecord {
            id: id.to_string(),
            value: value.to_string(),
            ..DomainRecord::default()
        }
    }

    #[tokio::test]
    async fn record_cache_overwrites_and_removes() {
        let cache = RecordCache::new();
        assert_eq!(cache.policy(), CachePolicy::NeverExpire);

        cache.put(&record("1", "a")).await;
        cache.put(&record("1", "b")).await;
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("1").await.map(|r| r.value), Some("b".to_string()));

        assert!(cache.remove("1").await.is_some());
        assert!(cache.get("1").await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn record_cache_ignores_records_without_id() {
        let cache = RecordCache::new();
        cache.put_all(&[record("", "x"), record("2", "y")]).await;
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn zone_cache_indexes_by_name_and_id() {
        let cache = ZoneCache::new();
        assert!(cache.is_empty().await);

        cache
            .put_all(&[DomainInfo {
                id: "zone-1".into(),
                name: "Example.com".into(),
                ..DomainInfo::default()
            }])
            .await;

        assert_eq!(
            cache.get_by_name("example.com.").await.map(|z| z.id),
            Some("zone-1".to_string())
        );
        assert_eq!(
            cache.get_by_id("zone-1").await.map(|z| z.name),
            Some("Example.com".to_string())
        );
        assert!(cache.get_by_name("other.com").await.is_none());
    }
}
