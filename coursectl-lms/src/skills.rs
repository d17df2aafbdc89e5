//! Bounded cache of skill names
//!
//! Catalog cards show skill names, but learning objects only reference skills
//! by id. Names are looked up once per id and kept in an LRU so a long browsing
//! session does not grow memory without bound.

use std::num::NonZeroUsize;

use lru::LruCache;
use tokio::sync::Mutex;

/// Most skill names shown per card
pub const MAX_SKILLS_PER_COURSE: usize = 2;

pub struct SkillCache {
    names: Mutex<LruCache<String, String>>,
}

impl SkillCache {
    /// Create a cache holding at most `capacity` names (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            names: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Look up a name, marking it as recently used
    pub async fn get(&self, skill_id: &str) -> Option<String> {
        self.names.lock().await.get(skill_id).cloned()
    }

    pub async fn insert(&self, skill_id: impl Into<String>, name: impl Into<String>) {
        self.names.lock().await.put(skill_id.into(), name.into());
    }

    pub async fn len(&self) -> usize {
        self.names.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
