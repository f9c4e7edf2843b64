use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Time source for the cache. Injected so tests can run against a
/// manual clock instead of sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct CacheEntry {
    value: serde_json::Value,
    expires_at: Instant,
}

/// Read-through TTL cache for response payloads, keyed by query shape
/// (e.g. "tickets:list:<dinas>:<filters>"). Invalidation is a blunt
/// prefix wipe: any ticket mutation clears every derived view at once.
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    clock: Box<dyn Clock>,
}

impl ResponseCache {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: &str, value: serde_json::Value, ttl: Duration) {
        let expires_at = self.clock.now() + ttl;
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.insert(key.to_string(), CacheEntry { value, expires_at });
    }

    /// Remove every entry whose key starts with the given prefix.
    pub fn invalidate_prefix(&self, prefix: &str) {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.retain(|k, _| !k.starts_with(prefix));
    }

    /// Wipe all ticket-derived views. Called on every ticket mutation.
    pub fn invalidate_tickets(&self) {
        self.invalidate_prefix("tickets:");
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(Box::new(SystemClock))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Clock whose time only moves when the test advances it.
    struct ManualClock {
        base: Instant,
        offset_secs: AtomicU64,
    }

    impl ManualClock {
        fn new() -> Self {
            Self {
                base: Instant::now(),
                offset_secs: AtomicU64::new(0),
            }
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.base + Duration::from_secs(self.offset_secs.load(Ordering::SeqCst))
        }
    }

    fn advance(clock: &std::sync::Arc<ManualClock>, secs: u64) {
        clock.offset_secs.fetch_add(secs, Ordering::SeqCst);
    }

    struct SharedClock(std::sync::Arc<ManualClock>);

    impl Clock for SharedClock {
        fn now(&self) -> Instant {
            self.0.now()
        }
    }

    #[test]
    fn entries_expire_after_ttl() {
        let clock = std::sync::Arc::new(ManualClock::new());
        let cache = ResponseCache::new(Box::new(SharedClock(clock.clone())));

        cache.put(
            "tickets:list:all",
            serde_json::json!([1, 2, 3]),
            Duration::from_secs(30),
        );
        assert!(cache.get("tickets:list:all").is_some());

        advance(&clock, 31);
        assert!(cache.get("tickets:list:all").is_none());
    }

    #[test]
    fn prefix_invalidation_wipes_derived_views_only() {
        let cache = ResponseCache::default();
        cache.put("tickets:list:a", serde_json::json!(1), Duration::from_secs(60));
        cache.put("tickets:stats:b", serde_json::json!(2), Duration::from_secs(60));
        cache.put("landmarks:all", serde_json::json!(3), Duration::from_secs(60));

        cache.invalidate_tickets();

        assert!(cache.get("tickets:list:a").is_none());
        assert!(cache.get("tickets:stats:b").is_none());
        assert!(cache.get("landmarks:all").is_some());
    }
}
