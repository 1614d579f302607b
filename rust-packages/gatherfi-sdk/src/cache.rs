//! Expiring, size-bounded read cache.
//!
//! Entries expire independently, measured from when they were set. When the
//! cache grows past its capacity the oldest-inserted entry is dropped
//! regardless of how recently it was read (FIFO, not LRU). Overwriting a key
//! refreshes its value and timestamp but keeps its place in line.
//!
//! Writes clear the whole cache on success, so nothing here tracks which
//! entries a given transaction touches.

use indexmap::IndexMap;
use parking_lot::Mutex;
use solana_sdk::pubkey::Pubkey;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::constants::{DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL};
use crate::state::EventStatus;

/// Logical identity of a cached query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Event(Pubkey),
    AllEvents,
    EventsByOrganizer(Pubkey),
    EventsByStatus(EventStatus),
    Contributor { event: Pubkey, contributor: Pubkey },
    ContributionsBy(Pubkey),
    Milestone { event: Pubkey, index: u8 },
    Milestones(Pubkey),
    Ticket { event: Pubkey, ticket_number: u32 },
    TicketsByEvent(Pubkey),
    TicketsByOwner(Pubkey),
    TicketByMint(Pubkey),
    Budget(Pubkey),
    Vote { event: Pubkey, voter: Pubkey },
    Votes(Pubkey),
    Escrow(Pubkey),
    ProfitDistribution(Pubkey),
    PlatformConfig,
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Event(address) => write!(f, "event-{}", address),
            CacheKey::AllEvents => write!(f, "events-all"),
            CacheKey::EventsByOrganizer(organizer) => write!(f, "events-organizer-{}", organizer),
            CacheKey::EventsByStatus(status) => write!(f, "events-status-{:?}", status),
            CacheKey::Contributor { event, contributor } => {
                write!(f, "contributor-{}-{}", event, contributor)
            }
            CacheKey::ContributionsBy(contributor) => write!(f, "contributions-{}", contributor),
            CacheKey::Milestone { event, index } => write!(f, "milestone-{}-{}", event, index),
            CacheKey::Milestones(event) => write!(f, "milestones-{}", event),
            CacheKey::Ticket { event, ticket_number } => {
                write!(f, "ticket-{}-{}", event, ticket_number)
            }
            CacheKey::TicketsByEvent(event) => write!(f, "tickets-event-{}", event),
            CacheKey::TicketsByOwner(owner) => write!(f, "tickets-owner-{}", owner),
            CacheKey::TicketByMint(mint) => write!(f, "ticket-mint-{}", mint),
            CacheKey::Budget(event) => write!(f, "budget-{}", event),
            CacheKey::Vote { event, voter } => write!(f, "vote-{}-{}", event, voter),
            CacheKey::Votes(event) => write!(f, "votes-{}", event),
            CacheKey::Escrow(event) => write!(f, "escrow-{}", event),
            CacheKey::ProfitDistribution(event) => write!(f, "profit-{}", event),
            CacheKey::PlatformConfig => write!(f, "platform-config"),
        }
    }
}

/// Sizing for a `ReadCache`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub ttl: Duration,
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_CACHE_TTL,
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

struct CachedEntry {
    value: Arc<dyn Any + Send + Sync>,
    inserted_at: Instant,
}

/// Process-wide read cache. Share it as `Arc<ReadCache>`.
pub struct ReadCache {
    entries: Mutex<IndexMap<CacheKey, CachedEntry>>,
    config: CacheConfig,
}

impl ReadCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: Mutex::new(IndexMap::with_capacity(config.capacity + 1)),
            config,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get a value if present and younger than the default TTL
    pub fn get<T>(&self, key: &CacheKey) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.get_with_ttl(key, self.config.ttl)
    }

    /// Get a value if present and younger than `ttl`
    pub fn get_with_ttl<T>(&self, key: &CacheKey, ttl: Duration) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let entries = self.entries.lock();
        let entry = match entries.get(key) {
            Some(entry) => entry,
            None => {
                tracing::debug!("Cache miss for {}", key);
                return None;
            }
        };

        let age = entry.inserted_at.elapsed();
        if age >= ttl {
            tracing::debug!("Cache expired for {} (age: {:?})", key, age);
            return None;
        }

        let value = entry.value.downcast_ref::<T>().cloned();
        if value.is_some() {
            tracing::debug!("Cache hit for {} (age: {:?})", key, age);
        }
        value
    }

    /// Store a value, evicting the oldest-inserted entry past capacity
    pub fn set<T>(&self, key: CacheKey, value: T)
    where
        T: Send + Sync + 'static,
    {
        let mut entries = self.entries.lock();
        entries.insert(
            key,
            CachedEntry {
                value: Arc::new(value),
                inserted_at: Instant::now(),
            },
        );
        while entries.len() > self.config.capacity {
            if let Some((evicted, _)) = entries.shift_remove_index(0) {
                tracing::debug!("Cache full, evicted {}", evicted);
            }
        }
    }

    /// Drop every entry
    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        let dropped = entries.len();
        entries.clear();
        tracing::debug!("Read cache cleared ({} entries)", dropped);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Whether `key` is stored, expired or not
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.lock().contains_key(key)
    }
}

impl Default for ReadCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl fmt::Debug for ReadCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadCache")
            .field("entries", &self.len())
            .field("config", &self.config)
            .finish()
    }
}
