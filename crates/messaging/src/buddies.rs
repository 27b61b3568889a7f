//! The buddy index: who has exchanged messages with whom.
//!
//! The whole adjacency map lives in memory and is persisted as a single
//! document on every change. It is loaded once when the service starts.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use kv_store::{get_json, set_json, KvStore};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{MessagingError, Result};
use crate::user::UserId;

/// Collection holding the buddy map.
pub const BUDDIES_COLLECTION: &str = "buddies";

/// Key of the single buddy map document.
pub const BUDDIES_KEY: &str = "buddies_map";

type BuddyMap = BTreeMap<UserId, BTreeSet<UserId>>;

/// Symmetric adjacency between users who have conversed.
///
/// `b ∈ buddies_of(a)` iff `a ∈ buddies_of(b)`. Writers are serialized by the
/// map's write lock, which is held until the new map has been persisted.
pub struct BuddyIndex {
    store: Arc<dyn KvStore>,
    buddies: RwLock<BuddyMap>,
}

impl BuddyIndex {
    /// Load the persisted map, or start empty if none exists.
    ///
    /// This is the only constructor, so an index is never used before it is loaded.
    pub async fn load(store: Arc<dyn KvStore>) -> Result<Self> {
        let stored: Option<BuddyMap> =
            get_json(store.as_ref(), BUDDIES_COLLECTION, BUDDIES_KEY).await?;

        let buddies = match stored {
            Some(map) => {
                let (map, repaired) = symmetrize(map);
                if repaired {
                    warn!("Stored buddy map was not symmetric; repaired in memory");
                }
                map
            }
            None => BuddyMap::new(),
        };

        info!(users = buddies.len(), "Buddy index loaded");

        Ok(Self {
            store,
            buddies: RwLock::new(buddies),
        })
    }

    /// Users `user` has conversed with, sorted. Empty for unknown users.
    pub async fn buddies_of(&self, user: &UserId) -> BTreeSet<UserId> {
        let buddies = self.buddies.read().await;
        buddies.get(user).cloned().unwrap_or_default()
    }

    /// Record that `a` and `b` have conversed, then persist the whole map.
    ///
    /// Idempotent in content, but always writes. On a failed write the
    /// in-memory map is left as it was.
    pub async fn register_pair(&self, a: &UserId, b: &UserId) -> Result<()> {
        if a == b {
            return Err(MessagingError::SelfBuddy);
        }

        let mut buddies = self.buddies.write().await;

        let mut next = buddies.clone();
        next.entry(a.clone()).or_default().insert(b.clone());
        next.entry(b.clone()).or_default().insert(a.clone());

        set_json(self.store.as_ref(), BUDDIES_COLLECTION, BUDDIES_KEY, &next).await?;
        *buddies = next;

        debug!(a = %a, b = %b, "Buddy pair registered");
        Ok(())
    }

    /// Persist the current map.
    pub async fn flush(&self) -> Result<()> {
        let buddies = self.buddies.read().await;
        set_json(self.store.as_ref(), BUDDIES_COLLECTION, BUDDIES_KEY, &*buddies).await?;
        Ok(())
    }

    /// Number of users with at least one buddy.
    pub async fn user_count(&self) -> usize {
        self.buddies.read().await.len()
    }
}

/// Add missing reverse edges and drop self edges.
fn symmetrize(map: BuddyMap) -> (BuddyMap, bool) {
    let mut fixed = BuddyMap::new();
    for (user, buddies) in &map {
        for buddy in buddies {
            if buddy == user {
                continue;
            }
            fixed.entry(user.clone()).or_default().insert(buddy.clone());
            fixed.entry(buddy.clone()).or_default().insert(user.clone());
        }
    }
    let repaired = fixed != map;
    (fixed, repaired)
}
