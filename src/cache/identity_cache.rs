use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::task::JoinHandle;

use crate::types::internal::User;

/// Process-wide username → user cache with time-based expiry
///
/// Every write to a key (`put`, `invalidate`, accepted fill) stamps the slot
/// with a fresh version from a global counter. Read-through fills take a
/// [`FillTicket`] before reading the store and are only applied if the slot
/// version is still the one they observed, so a fill that raced with an
/// invalidation of the same key is dropped instead of resurrecting the old
/// value.
///
/// Expiry is checked on every `get`; the sweeper only reclaims memory.
pub struct IdentityCache {
    entries: DashMap<String, Slot>,
    default_ttl: Duration,
    sweep_interval: Duration,
    next_version: AtomicU64,
}

struct Slot {
    version: u64,
    state: SlotState,
}

enum SlotState {
    Live {
        user: User,
        // None when ttl overflows Instant
        expires_at: Option<Instant>,
    },
    Invalidated {
        at: Instant,
    },
}

impl Slot {
    fn is_reclaimable(&self, now: Instant, sweep_interval: Duration) -> bool {
        match &self.state {
            SlotState::Live { expires_at, .. } => expires_at.is_some_and(|at| at <= now),
            SlotState::Invalidated { at } => now.duration_since(*at) >= sweep_interval,
        }
    }
}

/// Slot version observed before a read-through fill started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillTicket {
    observed: u64,
}

impl IdentityCache {
    /// # Arguments
    /// * `default_ttl` - Lifetime of entries written without an explicit ttl
    /// * `sweep_interval` - Period of the background sweep; raised to `default_ttl` if shorter
    pub fn new(default_ttl: Duration, sweep_interval: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
            sweep_interval: sweep_interval.max(default_ttl).max(Duration::from_millis(1)),
            next_version: AtomicU64::new(1),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    /// Pure lookup. Expired or invalidated entries are reported as absent.
    pub fn get(&self, username: &str) -> Option<User> {
        let slot = self.entries.get(username)?;
        match &slot.state {
            SlotState::Live { user, expires_at } => {
                if expires_at.is_some_and(|at| at <= Instant::now()) {
                    None
                } else {
                    Some(user.clone())
                }
            }
            SlotState::Invalidated { .. } => None,
        }
    }

    /// Insert or overwrite an entry. `None` uses the default ttl.
    pub fn put(&self, username: &str, user: User, ttl: Option<Duration>) {
        let slot = self.live_slot(user, ttl);
        self.entries.insert(username.to_string(), slot);
    }

    /// Remove the entry and fence off fills that started before this call
    pub fn invalidate(&self, username: &str) {
        let slot = Slot {
            version: self.bump(),
            state: SlotState::Invalidated { at: Instant::now() },
        };
        self.entries.insert(username.to_string(), slot);
    }

    /// Take a ticket before reading the store for a read-through fill
    pub fn fill_ticket(&self, username: &str) -> FillTicket {
        FillTicket {
            observed: self.entries.get(username).map_or(0, |slot| slot.version),
        }
    }

    /// Apply a read-through fill if nothing wrote the key since `ticket`
    ///
    /// # Returns
    /// `true` if the value was stored, `false` if a newer write won
    pub fn put_if_unchanged(&self, username: &str, user: User, ticket: FillTicket) -> bool {
        match self.entries.entry(username.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().version != ticket.observed {
                    return false;
                }
                let slot = self.live_slot(user, None);
                occupied.insert(slot);
                true
            }
            // A vacant slot with a non-zero ticket was swept mid-fill
            Entry::Vacant(vacant) => {
                if ticket.observed != 0 {
                    return false;
                }
                vacant.insert(self.live_slot(user, None));
                true
            }
        }
    }

    /// Drop expired entries and old invalidation markers
    ///
    /// # Returns
    /// Number of slots removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries
            .retain(|_, slot| !slot.is_reclaimable(now, self.sweep_interval));
        before.saturating_sub(self.entries.len())
    }

    /// Number of slots held, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run `purge_expired` every `sweep_interval` until the cache is dropped
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let cache: Weak<Self> = Arc::downgrade(self);
        let period = self.sweep_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // First tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                let removed = cache.purge_expired();
                if removed > 0 {
                    tracing::debug!(removed, remaining = cache.len(), "Identity cache sweep");
                }
            }
        })
    }

    fn bump(&self) -> u64 {
        self.next_version.fetch_add(1, Ordering::Relaxed)
    }

    fn live_slot(&self, user: User, ttl: Option<Duration>) -> Slot {
        let ttl = ttl.unwrap_or(self.default_ttl);
        Slot {
            version: self.bump(),
            state: SlotState::Live {
                user,
                expires_at: Instant::now().checked_add(ttl),
            },
        }
    }
}
