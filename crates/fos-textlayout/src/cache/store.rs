//! Byte-budgeted shaping cache with FIFO eviction

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::ShapingCacheKey;
use crate::result::ShapingResult;

/// Cached result plus its accounting data
#[derive(Debug)]
struct CacheEntry {
    result: Arc<ShapingResult>,
    /// Bytes charged for key and result together
    size: usize,
    /// How long the miss that produced this entry took
    compute_time: Duration,
}

/// Cache statistics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheStats {
    pub entries: usize,
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    /// Results larger than the whole budget, returned without caching
    pub too_big: u64,
    pub evictions: u64,
    /// Sum of the stored compute time of every hit
    pub time_saved: Duration,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups > 0 {
            self.hits as f64 / lookups as f64
        } else {
            0.0
        }
    }
}

#[derive(Debug)]
struct CacheState {
    entries: BTreeMap<ShapingCacheKey<'static>, CacheEntry>,
    /// Keys in insertion order; shares text with `entries`
    order: VecDeque<ShapingCacheKey<'static>>,
    size: usize,
    max_size: usize,
    hits: u64,
    misses: u64,
    too_big: u64,
    evictions: u64,
    time_saved: Duration,
    lookups: u64,
}

impl CacheState {
    fn new(max_size: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            order: VecDeque::new(),
            size: 0,
            max_size,
            hits: 0,
            misses: 0,
            too_big: 0,
            evictions: 0,
            time_saved: Duration::ZERO,
            lookups: 0,
        }
    }

    /// Drop the oldest entry; false once empty
    fn evict_oldest(&mut self) -> bool {
        while let Some(key) = self.order.pop_front() {
            if let Some(entry) = self.entries.remove(&key) {
                self.size -= entry.size;
                self.evictions += 1;
                tracing::debug!(
                    count = key.count(),
                    bytes = entry.size,
                    cache_size = self.size,
                    "evicted shaping result"
                );
                return true;
            }
        }
        false
    }

    fn evict_until_fits(&mut self, incoming: usize) {
        while self.size + incoming > self.max_size {
            if !self.evict_oldest() {
                break;
            }
        }
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            size: self.size,
            max_size: self.max_size,
            hits: self.hits,
            misses: self.misses,
            too_big: self.too_big,
            evictions: self.evictions,
            time_saved: self.time_saved,
        }
    }
}

/// Map lookup with a borrowed key.
///
/// Keys only ever hold shared borrows, so the map coerces to a shorter key
/// lifetime and can be looked up without copying the caller's text.
fn lookup<'a>(
    entries: &'a BTreeMap<ShapingCacheKey<'static>, CacheEntry>,
    key: &ShapingCacheKey<'a>,
) -> Option<&'a CacheEntry> {
    let entries: &'a BTreeMap<ShapingCacheKey<'a>, CacheEntry> = entries;
    entries.get(key)
}

/// Shared, thread-safe shaping cache.
///
/// Entries are charged `key.size() + result.size()` bytes and the running
/// total never exceeds the budget. Hits do not refresh an entry: eviction
/// always removes the oldest insertion.
///
/// A single lock covers the whole lookup-compute-insert sequence, so two
/// threads asking for the same key never shape it twice.
#[derive(Debug)]
pub struct ShapingCache {
    state: Mutex<CacheState>,
    log_stats_every: Option<u64>,
}

impl ShapingCache {
    pub fn new(max_size: usize) -> Self {
        Self {
            state: Mutex::new(CacheState::new(max_size)),
            log_stats_every: None,
        }
    }

    /// Log statistics at info level every `lookups` lookups
    pub fn with_stats_logging(mut self, lookups: Option<u64>) -> Self {
        self.log_stats_every = lookups.filter(|&n| n > 0);
        self
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // a panicking `compute` leaves the state consistent: nothing was inserted yet
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the cached result for `key`, or run `compute`, cache and return it.
    ///
    /// The key's text is copied only when the result is actually inserted.
    pub fn get<F>(&self, key: ShapingCacheKey<'_>, compute: F) -> Arc<ShapingResult>
    where
        F: FnOnce() -> ShapingResult,
    {
        let mut state = self.lock();
        state.lookups += 1;

        let hit = lookup(&state.entries, &key).map(|entry| (entry.result.clone(), entry.compute_time));
        if let Some((result, compute_time)) = hit {
            state.hits += 1;
            state.time_saved += compute_time;
            tracing::trace!(count = key.count(), saved_us = compute_time.as_micros() as u64, "shaping cache hit");
            self.maybe_log(&state);
            return result;
        }

        state.misses += 1;
        let started = Instant::now();
        let result = Arc::new(compute());
        let compute_time = started.elapsed();

        let entry_size = key.size() + result.size();
        if entry_size > state.max_size {
            state.too_big += 1;
            tracing::debug!(
                count = key.count(),
                bytes = entry_size,
                max_size = state.max_size,
                "shaping result exceeds cache budget, not cached"
            );
            self.maybe_log(&state);
            return result;
        }

        state.evict_until_fits(entry_size);

        let key = key.into_owned();
        tracing::debug!(count = key.count(), bytes = entry_size, "caching shaping result");
        state.order.push_back(key.clone());
        state.entries.insert(
            key,
            CacheEntry {
                result: result.clone(),
                size: entry_size,
                compute_time,
            },
        );
        state.size += entry_size;

        self.maybe_log(&state);
        result
    }

    /// Whether `key` is cached. Does not count as a lookup.
    pub fn contains(&self, key: &ShapingCacheKey<'_>) -> bool {
        let state = self.lock();
        lookup(&state.entries, key).is_some()
    }

    /// Change the budget, evicting oldest entries until the cache fits
    pub fn set_max_size(&self, max_size: usize) {
        let mut state = self.lock();
        state.max_size = max_size;
        state.evict_until_fits(0);
        tracing::debug!(max_size, cache_size = state.size, "shaping cache budget changed");
    }

    pub fn max_size(&self) -> usize {
        self.lock().max_size
    }

    /// Bytes currently charged
    pub fn size(&self) -> usize {
        self.lock().size
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Evict every entry. Statistics are kept.
    pub fn clear(&self) {
        let mut state = self.lock();
        let entries = state.entries.len();
        while state.evict_oldest() {}
        tracing::debug!(entries, "shaping cache cleared");
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats()
    }

    /// Zero the counters; entries and sizes are untouched
    pub fn reset_stats(&self) {
        let mut state = self.lock();
        state.hits = 0;
        state.misses = 0;
        state.too_big = 0;
        state.evictions = 0;
        state.time_saved = Duration::ZERO;
        state.lookups = 0;
    }

    /// Emit the current statistics at info level
    pub fn log_stats(&self) {
        log_stats(&self.lock().stats());
    }

    fn maybe_log(&self, state: &CacheState) {
        if let Some(every) = self.log_stats_every {
            if state.lookups % every == 0 {
                log_stats(&state.stats());
            }
        }
    }
}

fn log_stats(stats: &CacheStats) {
    tracing::info!(
        entries = stats.entries,
        size = stats.size,
        max_size = stats.max_size,
        hits = stats.hits,
        misses = stats.misses,
        hit_rate = stats.hit_rate(),
        too_big = stats.too_big,
        evictions = stats.evictions,
        time_saved_ms = stats.time_saved.as_secs_f64() * 1000.0,
        "shaping cache stats"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bidi::BidiFlags;
    use crate::style::{StyleFingerprint, TextStyle, TypefaceId};
    use std::cell::Cell;

    fn utf16(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    fn style() -> StyleFingerprint {
        TextStyle::new(TypefaceId(1), 16.0).fingerprint()
    }

    fn key(text: &[u16]) -> ShapingCacheKey<'_> {
        ShapingCacheKey::new(style(), text, 0, text.len(), BidiFlags::Ltr)
    }

    fn result_for(text: &[u16]) -> ShapingResult {
        ShapingResult::new(vec![1.0; text.len()], text.len() as f32, text.to_vec())
    }

    fn entry_size(text: &[u16]) -> usize {
        key(text).size() + result_for(text).size()
    }

    #[test]
    fn test_miss_then_hit() {
        let cache = ShapingCache::new(1 << 20);
        let text = utf16("hello");
        let calls = Cell::new(0);

        let first = cache.get(key(&text), || {
            calls.set(calls.get() + 1);
            result_for(&text)
        });
        let second = cache.get(key(&text), || {
            calls.set(calls.get() + 1);
            result_for(&text)
        });

        assert_eq!(calls.get(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_size_matches_entries() {
        let cache = ShapingCache::new(1 << 20);
        let a = utf16("one");
        let b = utf16("three");
        cache.get(key(&a), || result_for(&a));
        cache.get(key(&b), || result_for(&b));
        assert_eq!(cache.size(), entry_size(&a) + entry_size(&b));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_fifo_eviction_ignores_hits() {
        let a = utf16("aaaa");
        let b = utf16("bbbb");
        let c = utf16("cccc");
        // room for exactly two equally sized entries
        let cache = ShapingCache::new(entry_size(&a) * 2);

        cache.get(key(&a), || result_for(&a));
        cache.get(key(&b), || result_for(&b));
        // hit on A does not protect it
        cache.get(key(&a), || result_for(&a));
        cache.get(key(&c), || result_for(&c));

        assert!(!cache.contains(&key(&a)));
        assert!(cache.contains(&key(&b)));
        assert!(cache.contains(&key(&c)));
        assert_eq!(cache.stats().evictions, 1);
        assert!(cache.size() <= cache.max_size());
    }

    #[test]
    fn test_too_big_is_returned_uncached() {
        let text = utf16("hello");
        let cache = ShapingCache::new(entry_size(&text) - 1);
        let result = cache.get(key(&text), || result_for(&text));
        assert_eq!(result.advances().len(), 5);
        assert!(cache.is_empty());
        assert_eq!(cache.size(), 0);
        assert_eq!(cache.stats().too_big, 1);
    }

    #[test]
    fn test_zero_budget_never_caches() {
        let cache = ShapingCache::new(0);
        let text = utf16("x");
        let calls = Cell::new(0);
        for _ in 0..3 {
            cache.get(key(&text), || {
                calls.set(calls.get() + 1);
                result_for(&text)
            });
        }
        assert_eq!(calls.get(), 3);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_entry_exactly_at_budget_fits() {
        let text = utf16("fits");
        let cache = ShapingCache::new(entry_size(&text));
        cache.get(key(&text), || result_for(&text));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.size(), cache.max_size());
    }

    #[test]
    fn test_shrinking_budget_evicts_oldest() {
        let a = utf16("aa");
        let b = utf16("bb");
        let cache = ShapingCache::new(1 << 20);
        cache.get(key(&a), || result_for(&a));
        cache.get(key(&b), || result_for(&b));

        cache.set_max_size(entry_size(&b));
        assert!(!cache.contains(&key(&a)));
        assert!(cache.contains(&key(&b)));
        assert_eq!(cache.size(), entry_size(&b));
    }

    #[test]
    fn test_clear_keeps_stats() {
        let text = utf16("abc");
        let cache = ShapingCache::new(1 << 20);
        cache.get(key(&text), || result_for(&text));
        cache.get(key(&text), || result_for(&text));
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.size(), 0);
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));

        cache.reset_stats();
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn test_distinct_flags_are_distinct_entries() {
        let text = utf16("ab");
        let cache = ShapingCache::new(1 << 20);
        cache.get(ShapingCacheKey::new(style(), &text, 0, 2, BidiFlags::ForceLtr), || result_for(&text));
        cache.get(ShapingCacheKey::new(style(), &text, 0, 2, BidiFlags::ForceRtl), || result_for(&text));
        assert_eq!(cache.stats().misses, 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_time_saved_accumulates_on_hits() {
        let text = utf16("slow");
        let cache = ShapingCache::new(1 << 20);
        cache.get(key(&text), || {
            std::thread::sleep(Duration::from_millis(2));
            result_for(&text)
        });
        cache.get(key(&text), || result_for(&text));
        assert!(cache.stats().time_saved >= Duration::from_millis(2));
    }
}
