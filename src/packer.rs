//! In-memory caching and packaging of scraped records.
//!
//! The packer keeps the most recently used responses so that walking a
//! championship, its seasons and their games does not refetch the same
//! pages. Entries are evicted least-recently-used first, and a failed
//! computation is never stored.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use tracing::debug;

use crate::error::Result;
use crate::models::{Championship, Game, Season, SeasonStatus, Table, Tabular, Team};
use crate::seeker::TargetKind;

/// Identity of one scrape: the target kind plus the parameters that
/// select the page, such as the championship path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    kind: TargetKind,
    params: Vec<String>,
}

impl RequestKey {
    pub fn championships() -> Self {
        Self {
            kind: TargetKind::Championships,
            params: Vec::new(),
        }
    }

    pub fn teams() -> Self {
        Self {
            kind: TargetKind::Teams,
            params: Vec::new(),
        }
    }

    pub fn seasons(championship_path: &str) -> Self {
        Self {
            kind: TargetKind::Seasons,
            params: vec![championship_path.to_string()],
        }
    }

    pub fn games(season_path: &str) -> Self {
        Self {
            kind: TargetKind::Games,
            params: vec![season_path.to_string()],
        }
    }

    pub fn status(championship_path: &str, season_id: &str) -> Self {
        Self {
            kind: TargetKind::Status,
            params: vec![championship_path.to_string(), season_id.to_string()],
        }
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}[{}]", self.kind, self.params.join(", "))
        }
    }
}

/// Cached value, one variant per record shape the scrapers produce.
#[derive(Debug, Clone)]
pub enum Payload {
    Championships(Vec<Championship>),
    Seasons(Vec<Season>),
    Teams(Vec<Team>),
    Games(Vec<Game>),
    Status(SeasonStatus),
}

/// Conversion between concrete record types and the cache's payload.
///
/// `from_payload` answers `None` when the stored variant does not match
/// the requested type; the packer treats that as a miss.
pub trait PayloadKind: Clone {
    fn into_payload(self) -> Payload;
    fn from_payload(payload: &Payload) -> Option<Self>;
}

impl PayloadKind for Vec<Championship> {
    fn into_payload(self) -> Payload {
        Payload::Championships(self)
    }

    fn from_payload(payload: &Payload) -> Option<Self> {
        match payload {
            Payload::Championships(records) => Some(records.clone()),
            _ => None,
        }
    }
}

impl PayloadKind for Vec<Season> {
    fn into_payload(self) -> Payload {
        Payload::Seasons(self)
    }

    fn from_payload(payload: &Payload) -> Option<Self> {
        match payload {
            Payload::Seasons(records) => Some(records.clone()),
            _ => None,
        }
    }
}

impl PayloadKind for Vec<Team> {
    fn into_payload(self) -> Payload {
        Payload::Teams(self)
    }

    fn from_payload(payload: &Payload) -> Option<Self> {
        match payload {
            Payload::Teams(records) => Some(records.clone()),
            _ => None,
        }
    }
}

impl PayloadKind for Vec<Game> {
    fn into_payload(self) -> Payload {
        Payload::Games(self)
    }

    fn from_payload(payload: &Payload) -> Option<Self> {
        match payload {
            Payload::Games(records) => Some(records.clone()),
            _ => None,
        }
    }
}

impl PayloadKind for SeasonStatus {
    fn into_payload(self) -> Payload {
        Payload::Status(self)
    }

    fn from_payload(payload: &Payload) -> Option<Self> {
        match payload {
            Payload::Status(status) => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    payload: Payload,
    last_used: u64,
}

#[derive(Debug)]
struct CacheState {
    capacity: usize,
    tick: u64,
    entries: HashMap<RequestKey, CacheEntry>,
}

/// LRU cache over scraped payloads.
///
/// The lock is held across the whole lookup-or-populate so concurrent
/// callers of the same key compute at most once.
#[derive(Debug)]
pub struct Packer {
    state: Mutex<CacheState>,
}

impl Packer {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(CacheState {
                capacity: capacity.max(1),
                tick: 0,
                entries: HashMap::new(),
            }),
        }
    }

    /// Answers the cached records for `key`, or runs `compute` and
    /// stores its result. Errors from `compute` pass through unstored.
    pub fn lookup_or_populate<T, F>(&self, key: RequestKey, compute: F) -> Result<T>
    where
        T: PayloadKind,
        F: FnOnce() -> Result<T>,
    {
        let mut state = self.lock();
        state.tick += 1;
        let now = state.tick;

        if let Some(entry) = state.entries.get_mut(&key) {
            if let Some(records) = T::from_payload(&entry.payload) {
                entry.last_used = now;
                debug!(key = %key, "cache hit");
                return Ok(records);
            }
            // A different record shape under the same key is stale.
            state.entries.remove(&key);
        }

        debug!(key = %key, "cache miss");
        let records = compute()?;

        if state.entries.len() >= state.capacity {
            evict_least_recent(&mut state);
        }
        state.entries.insert(
            key,
            CacheEntry {
                payload: records.clone().into_payload(),
                last_used: now,
            },
        );

        Ok(records)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn contains(&self, key: &RequestKey) -> bool {
        self.lock().entries.contains_key(key)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn evict_least_recent(state: &mut CacheState) {
    let stalest = state
        .entries
        .iter()
        .min_by_key(|(_, entry)| entry.last_used)
        .map(|(key, _)| key.clone());
    if let Some(key) = stalest {
        state.entries.remove(&key);
        debug!(key = %key, "cache full, evicted least recently used entry");
    }
}

/// Lays records out as a table, one row per record in input order.
pub fn pack_table<T: Tabular>(records: &[T]) -> Table {
    Table::from_records(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScrapediaError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn champs(id: &str) -> Vec<Championship> {
        vec![Championship {
            id: id.to_string(),
            name: id.to_string(),
            path: Championship::path_for(id),
        }]
    }

    #[test]
    fn a_hit_answers_without_recomputing() {
        let packer = Packer::new(4);
        let calls = AtomicUsize::new(0);

        let first: Vec<Championship> = packer
            .lookup_or_populate(RequestKey::championships(), || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(champs("brasileiro"))
            })
            .unwrap();
        let second: Vec<Championship> = packer
            .lookup_or_populate(RequestKey::championships(), || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(champs("nunca-visto"))
            })
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
        assert_eq!(packer.len(), 1);
    }

    #[test]
    fn failed_computations_are_not_stored() {
        let packer = Packer::new(4);

        let outcome: Result<Vec<Championship>> =
            packer.lookup_or_populate(RequestKey::championships(), || {
                Err(ScrapediaError::Fetch {
                    status: 503,
                    path: "/".to_string(),
                })
            });

        assert!(outcome.is_err());
        assert!(packer.is_empty());

        let recovered: Vec<Championship> = packer
            .lookup_or_populate(RequestKey::championships(), || Ok(champs("brasileiro")))
            .unwrap();
        assert_eq!(recovered[0].id, "brasileiro");
        assert_eq!(packer.len(), 1);
    }

    #[test]
    fn the_least_recently_used_entry_is_evicted_first() {
        let packer = Packer::new(2);
        let a = RequestKey::seasons("/campeonato/a");
        let b = RequestKey::seasons("/campeonato/b");
        let c = RequestKey::seasons("/campeonato/c");

        let _: Vec<Championship> = packer
            .lookup_or_populate(a.clone(), || Ok(champs("a")))
            .unwrap();
        let _: Vec<Championship> = packer
            .lookup_or_populate(b.clone(), || Ok(champs("b")))
            .unwrap();

        // Touch `a` so `b` becomes the stalest entry.
        let _: Vec<Championship> = packer
            .lookup_or_populate(a.clone(), || Ok(champs("never")))
            .unwrap();
        let _: Vec<Championship> = packer
            .lookup_or_populate(c.clone(), || Ok(champs("c")))
            .unwrap();

        assert_eq!(packer.len(), 2);
        assert!(packer.contains(&a));
        assert!(packer.contains(&c));
        assert!(!packer.contains(&b));
    }

    #[test]
    fn a_stored_shape_mismatch_counts_as_a_miss() {
        let packer = Packer::new(4);
        let key = RequestKey::championships();

        let _: Vec<Championship> = packer
            .lookup_or_populate(key.clone(), || Ok(champs("brasileiro")))
            .unwrap();
        let status: SeasonStatus = packer
            .lookup_or_populate(key, || Ok(SeasonStatus::Finished))
            .unwrap();

        assert_eq!(status, SeasonStatus::Finished);
        assert_eq!(packer.len(), 1);
    }

    #[test]
    fn a_zero_capacity_still_holds_one_entry() {
        let packer = Packer::new(0);
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let _: Vec<Championship> = packer
                .lookup_or_populate(RequestKey::championships(), || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(champs("brasileiro"))
                })
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(packer.len(), 1);
    }
}
