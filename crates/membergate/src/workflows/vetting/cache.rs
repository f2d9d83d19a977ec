use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use super::domain::{ApplicationId, UserId, VettingStatus};

/// Resolved vetting state for one user, as the access gate consumes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VettingLookup {
    /// No application on file for the user.
    NoApplication,
    OnFile {
        application_id: ApplicationId,
        status: VettingStatus,
    },
}

/// Per-user status cache with point invalidation. The transition engine calls
/// `invalidate` whenever it mutates a linked user's application, so a stale
/// "allowed" answer cannot outlive a deny.
pub trait StatusCache: Send + Sync {
    fn get(&self, user: &UserId) -> Option<VettingLookup>;
    fn set(&self, user: &UserId, lookup: VettingLookup);
    fn invalidate(&self, user: &UserId);
}

const SHARD_COUNT: usize = 16;

/// Sharded TTL cache. Entries expire lazily on read; shards keep access-check
/// volume from contending on one lock.
pub struct TtlStatusCache {
    ttl: Duration,
    shards: Vec<RwLock<HashMap<UserId, (VettingLookup, Instant)>>>,
}

impl TtlStatusCache {
    pub fn new(ttl: Duration) -> Self {
        let shards = (0..SHARD_COUNT).map(|_| RwLock::new(HashMap::new())).collect();
        Self { ttl, shards }
    }

    fn shard(&self, user: &UserId) -> &RwLock<HashMap<UserId, (VettingLookup, Instant)>> {
        let mut hasher = DefaultHasher::new();
        user.hash(&mut hasher);
        let index = (hasher.finish() as usize) % SHARD_COUNT;
        &self.shards[index]
    }
}

impl StatusCache for TtlStatusCache {
    fn get(&self, user: &UserId) -> Option<VettingLookup> {
        let shard = self.shard(user);
        {
            let guard = shard.read().expect("cache shard poisoned");
            match guard.get(user) {
                Some((lookup, stored_at)) if stored_at.elapsed() < self.ttl => {
                    return Some(lookup.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        // Expired entry: drop it so the map does not accumulate dead users.
        shard.write().expect("cache shard poisoned").remove(user);
        None
    }

    fn set(&self, user: &UserId, lookup: VettingLookup) {
        self.shard(user)
            .write()
            .expect("cache shard poisoned")
            .insert(user.clone(), (lookup, Instant::now()));
    }

    fn invalidate(&self, user: &UserId) {
        self.shard(user)
            .write()
            .expect("cache shard poisoned")
            .remove(user);
    }
}

/// Cache that never stores anything, for callers that want every check to hit
/// the store.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStatusCache;

impl StatusCache for NoStatusCache {
    fn get(&self, _user: &UserId) -> Option<VettingLookup> {
        None
    }

    fn set(&self, _user: &UserId, _lookup: VettingLookup) {}

    fn invalidate(&self, _user: &UserId) {}
}
