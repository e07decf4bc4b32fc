//! Multi-highway road event aggregation.
//!
//! This module provides the [`RoadEventAggregator`] which fetches the events of
//! every configured highway, merges them into one deduplicated list and keeps
//! the result in a single-slot cache for a fixed time-to-live.

use std::collections::HashMap;

use anyhow::Context;
use futures::{StreamExt, stream};
use log::{debug, error, info};

use crate::open511::requester::Requester;
use crate::open511::response_structs::EventDetail;
use crate::open511::structs::RoadEvent;
use crate::utils::{Clock, SystemClock, fingerprint};

/// Default time-to-live of the aggregated events.
pub const DEFAULT_CACHE_TTL_MS: u64 = 180_000; // 3 minutes

/// The result of one successful aggregation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationCacheEntry {
    /// Sorted, comma joined highway ids the entry was fetched for
    pub fingerprint: String,
    /// Merged events, unique by id
    pub events: Vec<RoadEvent>,
    /// Start time of the pass, in epoch milliseconds
    pub fetched_at_ms: u64,
}

/// Session scoped cache of the aggregator.
///
/// Holds at most one entry. A new pass replaces it wholesale.
#[derive(Debug, Default)]
pub struct AggregatorState {
    entry: Option<AggregationCacheEntry>,
}

impl AggregatorState {
    /// Returns the cached entry if it matches `fingerprint` and is younger than `ttl_ms`.
    fn fresh(&self, fingerprint: &str, now_ms: u64, ttl_ms: u64) -> Option<&AggregationCacheEntry> {
        self.entry.as_ref().filter(|entry| {
            entry.fingerprint == fingerprint && now_ms.saturating_sub(entry.fetched_at_ms) < ttl_ms
        })
    }

    fn replace(&mut self, entry: AggregationCacheEntry) {
        self.entry = Some(entry);
    }

    /// Events of the current entry, empty if nothing has been cached yet.
    fn events(&self) -> Vec<RoadEvent> {
        self.entry
            .as_ref()
            .map(|entry| entry.events.clone())
            .unwrap_or_default()
    }
}

/// Fetches, merges and caches the events of a set of highways.
///
/// # Examples
///
/// ```no_run
/// let requester = Open511Requester::new("https://api.open511.gov.bc.ca");
/// let mut aggregator = RoadEventAggregator::new(requester);
/// let events = aggregator.get_events(&["Highway 5".to_string()]).await;
/// ```
pub struct RoadEventAggregator<R: Requester, C: Clock = SystemClock> {
    /// Open511 requester
    requester: R,
    /// Time source for the cache expiry
    clock: C,
    /// Single-slot cache
    state: AggregatorState,
    /// Cache time-to-live in milliseconds
    ttl_ms: u64,
    /// Maximum number of highway requests in flight
    max_concurrent_fetches: usize,
}

impl<R: Requester> RoadEventAggregator<R> {
    /// Create a new [RoadEventAggregator] using the system clock, the default
    /// TTL and sequential fetches.
    pub fn new(requester: R) -> Self {
        RoadEventAggregator::with_clock(requester, SystemClock)
    }
}

impl<R: Requester, C: Clock> RoadEventAggregator<R, C> {
    /// Create a new [RoadEventAggregator] with a custom clock.
    pub fn with_clock(requester: R, clock: C) -> Self {
        RoadEventAggregator {
            requester,
            clock,
            state: AggregatorState::default(),
            ttl_ms: DEFAULT_CACHE_TTL_MS,
            max_concurrent_fetches: 1,
        }
    }

    /// Overrides the cache time-to-live.
    pub fn with_ttl_ms(mut self, ttl_ms: u64) -> Self {
        self.ttl_ms = ttl_ms;
        self
    }

    /// Allows up to `max` highway requests in flight. `0` is treated as `1`.
    ///
    /// Merge order stays the sorted order of the highway ids whatever the
    /// completion order.
    pub fn with_max_concurrent_fetches(mut self, max: usize) -> Self {
        self.max_concurrent_fetches = max.max(1);
        self
    }

    /// Returns the events of the given highways.
    ///
    /// A fresh cache entry for the same highway set is returned without any
    /// request. Otherwise every highway is requested in sorted id order,
    /// failed requests contribute no events, and the merged result replaces
    /// the cache. The result does not depend on the order of `highway_ids`.
    ///
    /// Never fails: if the pass itself cannot run, the previously cached
    /// events are returned.
    ///
    /// # Arguments
    ///
    /// * `highway_ids` - Highways to query, in any order.
    pub async fn get_events(&mut self, highway_ids: &[String]) -> Vec<RoadEvent> {
        match self.aggregate(highway_ids).await {
            Ok(events) => events,
            Err(e) => {
                error!("failed to aggregate road events, keeping cached events: {:#}", e);
                self.state.events()
            }
        }
    }

    async fn aggregate(&mut self, highway_ids: &[String]) -> anyhow::Result<Vec<RoadEvent>> {
        let now_ms = self.clock.now_ms().context("unable to read the clock")?;
        let mut ordered_ids = highway_ids.to_vec();
        ordered_ids.sort();
        let fingerprint = fingerprint(&ordered_ids);

        if let Some(entry) = self.state.fresh(&fingerprint, now_ms, self.ttl_ms) {
            debug!("cache hit for highways {}", fingerprint);
            return Ok(entry.events.clone());
        }

        info!("request events for highways {}", fingerprint);
        let batches = self.fetch_all(&ordered_ids).await;
        let events = merge(batches);

        info!("aggregated {} events for highways {}", events.len(), fingerprint);

        self.state.replace(AggregationCacheEntry {
            fingerprint,
            events: events.clone(),
            fetched_at_ms: now_ms,
        });

        Ok(events)
    }

    /// Requests every highway, keeping the results in the order of `highway_ids`.
    async fn fetch_all(&self, highway_ids: &[String]) -> Vec<Vec<EventDetail>> {
        stream::iter(highway_ids)
            .map(|highway_id| self.fetch_highway(highway_id))
            .buffered(self.max_concurrent_fetches)
            .collect()
            .await
    }

    async fn fetch_highway(&self, highway_id: &str) -> Vec<EventDetail> {
        match self.requester.get_events(highway_id).await {
            Ok(events) => events,
            Err(e) => {
                error!("error while requesting events of {}: {}", highway_id, e);
                vec![]
            }
        }
    }

    /// Returns the current cache entry.
    #[cfg(test)]
    pub fn cached(&self) -> Option<&AggregationCacheEntry> {
        self.state.entry.as_ref()
    }
}

/// Normalizes and deduplicates the fetched batches by event id.
///
/// An id keeps the position of its first occurrence and the contents of its
/// last one.
fn merge(batches: Vec<Vec<EventDetail>>) -> Vec<RoadEvent> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<RoadEvent> = Vec::new();

    for detail in batches.into_iter().flatten() {
        debug!("merge event {}", detail);
        let event = RoadEvent::from(detail);

        match positions.get(&event.id) {
            Some(&position) => merged[position] = event,
            None => {
                positions.insert(event.id.clone(), merged.len());
                merged.push(event);
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RequestError;
    use crate::open511::requester::MockRequester;
    use crate::open511::response_structs::RoadDetail;
    use mockall::predicate::eq;
    use reqwest::StatusCode;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, SystemTimeError, UNIX_EPOCH};

    /// Clock advanced by hand.
    #[derive(Clone, Default)]
    struct ManualClock(Arc<AtomicU64>);

    impl ManualClock {
        fn advance(&self, ms: u64) {
            self.0.fetch_add(ms, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now_ms(&self) -> Result<u64, SystemTimeError> {
            Ok(self.0.load(Ordering::SeqCst))
        }
    }

    /// Clock that always fails, past the first `ok_reads` reads.
    struct BrokenClock {
        ok_reads: AtomicU64,
    }

    impl Clock for BrokenClock {
        fn now_ms(&self) -> Result<u64, SystemTimeError> {
            if self.ok_reads.load(Ordering::SeqCst) > 0 {
                self.ok_reads.fetch_sub(1, Ordering::SeqCst);
                return Ok(0);
            }
            UNIX_EPOCH.duration_since(SystemTime::now()).map(|_| 0)
        }
    }

    fn detail(id: &str, description: &str, road: &str) -> EventDetail {
        EventDetail {
            id: Some(id.to_owned()),
            description: Some(description.to_owned()),
            event_type: Some("INCIDENT".to_owned()),
            roads: Some(vec![RoadDetail {
                name: Some(road.to_owned()),
            }]),
            ..Default::default()
        }
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_second_call_within_ttl_is_cached() {
        let mut mock_requester = MockRequester::new();
        mock_requester
            .expect_get_events()
            .with(eq("A"))
            .times(1)
            .returning(|_| Ok(vec![detail("1", "X", "A")]));

        let clock = ManualClock::default();
        let mut aggregator = RoadEventAggregator::with_clock(mock_requester, clock.clone());

        let first = aggregator.get_events(&ids(&["A"])).await;
        clock.advance(DEFAULT_CACHE_TTL_MS - 1);
        let second = aggregator.get_events(&ids(&["A"])).await;

        assert_eq!(first.len(), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_empty_result_is_cached_too() {
        let mut mock_requester = MockRequester::new();
        mock_requester
            .expect_get_events()
            .times(1)
            .returning(|_| Ok(vec![]));

        let mut aggregator =
            RoadEventAggregator::with_clock(mock_requester, ManualClock::default());

        assert!(aggregator.get_events(&ids(&["A"])).await.is_empty());
        assert!(aggregator.get_events(&ids(&["A"])).await.is_empty());
    }

    #[tokio::test]
    async fn test_fingerprint_is_order_independent() {
        let mut mock_requester = MockRequester::new();
        mock_requester
            .expect_get_events()
            .with(eq("A"))
            .times(1)
            .returning(|_| Ok(vec![detail("1", "X", "A")]));
        mock_requester
            .expect_get_events()
            .with(eq("B"))
            .times(1)
            .returning(|_| Ok(vec![detail("2", "Y", "B")]));

        let mut aggregator =
            RoadEventAggregator::with_clock(mock_requester, ManualClock::default());

        let first = aggregator.get_events(&ids(&["A", "B"])).await;
        let second = aggregator.get_events(&ids(&["B", "A"])).await;

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
        assert_eq!(aggregator.cached().unwrap().fingerprint, "A,B");
    }

    #[tokio::test]
    async fn test_expired_cache_refetches() {
        let mut mock_requester = MockRequester::new();
        mock_requester
            .expect_get_events()
            .with(eq("A"))
            .times(2)
            .returning(|_| Ok(vec![detail("1", "X", "A")]));

        let clock = ManualClock::default();
        let mut aggregator = RoadEventAggregator::with_clock(mock_requester, clock.clone());

        aggregator.get_events(&ids(&["A"])).await;
        clock.advance(DEFAULT_CACHE_TTL_MS);
        aggregator.get_events(&ids(&["A"])).await;

        assert_eq!(aggregator.cached().unwrap().fetched_at_ms, DEFAULT_CACHE_TTL_MS);
    }

    #[tokio::test]
    async fn test_later_highway_wins_on_merge() {
        let mut mock_requester = MockRequester::new();
        mock_requester
            .expect_get_events()
            .with(eq("A"))
            .times(1)
            .returning(|_| Ok(vec![detail("1", "X", "A"), detail("2", "Z", "A")]));
        mock_requester
            .expect_get_events()
            .with(eq("B"))
            .times(1)
            .returning(|_| Ok(vec![detail("1", "Y", "B")]));

        let mut aggregator =
            RoadEventAggregator::with_clock(mock_requester, ManualClock::default());
        let events = aggregator.get_events(&ids(&["A", "B"])).await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, "1");
        assert_eq!(events[0].description, "Y");
        assert_eq!(events[0].road_name, "B");
        assert_eq!(events[1].id, "2");
    }

    #[tokio::test]
    async fn test_failed_highway_is_isolated() {
        let mut mock_requester = MockRequester::new();
        mock_requester
            .expect_get_events()
            .with(eq("A"))
            .times(1)
            .returning(|_| Ok(vec![detail("1", "X", "A")]));
        mock_requester
            .expect_get_events()
            .with(eq("B"))
            .times(1)
            .returning(|_| Err(RequestError::Status(StatusCode::INTERNAL_SERVER_ERROR)));
        mock_requester
            .expect_get_events()
            .with(eq("C"))
            .times(1)
            .returning(|_| Ok(vec![detail("3", "Z", "C"), detail("4", "W", "C")]));

        let mut aggregator =
            RoadEventAggregator::with_clock(mock_requester, ManualClock::default());
        let events = aggregator.get_events(&ids(&["A", "B", "C"])).await;

        let event_ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(event_ids, vec!["1", "3", "4"]);
    }

    #[tokio::test]
    async fn test_highway_set_change_invalidates_cache() {
        let mut mock_requester = MockRequester::new();
        mock_requester
            .expect_get_events()
            .with(eq("A"))
            .times(2)
            .returning(|_| Ok(vec![detail("1", "X", "A")]));
        mock_requester
            .expect_get_events()
            .with(eq("B"))
            .times(1)
            .returning(|_| Ok(vec![detail("2", "Y", "B")]));

        let mut aggregator =
            RoadEventAggregator::with_clock(mock_requester, ManualClock::default());

        assert_eq!(aggregator.get_events(&ids(&["A"])).await.len(), 1);
        assert_eq!(aggregator.get_events(&ids(&["A", "B"])).await.len(), 2);
        assert_eq!(aggregator.cached().unwrap().fingerprint, "A,B");
    }

    #[tokio::test]
    async fn test_broken_clock_returns_previous_cache() {
        let mut mock_requester = MockRequester::new();
        mock_requester
            .expect_get_events()
            .with(eq("A"))
            .times(1)
            .returning(|_| Ok(vec![detail("1", "X", "A")]));

        let clock = BrokenClock {
            ok_reads: AtomicU64::new(1),
        };
        let mut aggregator = RoadEventAggregator::with_clock(mock_requester, clock);

        let first = aggregator.get_events(&ids(&["A"])).await;
        let second = aggregator.get_events(&ids(&["A", "B"])).await;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_broken_clock_without_cache_is_empty() {
        let mock_requester = MockRequester::new();
        let clock = BrokenClock {
            ok_reads: AtomicU64::new(0),
        };
        let mut aggregator = RoadEventAggregator::with_clock(mock_requester, clock);

        assert!(aggregator.get_events(&ids(&["A"])).await.is_empty());
        assert!(aggregator.cached().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_fetches_keep_highway_order() {
        let mut mock_requester = MockRequester::new();
        mock_requester
            .expect_get_events()
            .with(eq("A"))
            .returning(|_| Ok(vec![detail("1", "from A", "A")]));
        mock_requester
            .expect_get_events()
            .with(eq("B"))
            .returning(|_| Ok(vec![detail("1", "from B", "B")]));

        let mut aggregator =
            RoadEventAggregator::with_clock(mock_requester, ManualClock::default())
                .with_max_concurrent_fetches(4);
        let events = aggregator.get_events(&ids(&["A", "B"])).await;

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].description, "from B");
    }

    #[tokio::test]
    async fn test_merge_does_not_depend_on_argument_order() {
        fn mock_requester() -> MockRequester {
            let mut mock_requester = MockRequester::new();
            mock_requester
                .expect_get_events()
                .with(eq("A"))
                .times(1)
                .returning(|_| Ok(vec![detail("1", "from A", "A"), detail("2", "only A", "A")]));
            mock_requester
                .expect_get_events()
                .with(eq("B"))
                .times(1)
                .returning(|_| Ok(vec![detail("3", "only B", "B"), detail("1", "from B", "B")]));
            mock_requester
        }

        let mut forward = RoadEventAggregator::with_clock(mock_requester(), ManualClock::default());
        let mut backward = RoadEventAggregator::with_clock(mock_requester(), ManualClock::default());

        let forward_events = forward.get_events(&ids(&["A", "B"])).await;
        let backward_events = backward.get_events(&ids(&["B", "A"])).await;

        assert_eq!(forward_events, backward_events);
        assert_eq!(backward_events[0].description, "from B");
        let event_ids: Vec<&str> = backward_events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(event_ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_merge_without_duplicates_keeps_order() {
        let events = merge(vec![
            vec![detail("1", "X", "A"), detail("2", "Y", "A")],
            vec![detail("3", "Z", "B")],
        ]);

        let event_ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(event_ids, vec!["1", "2", "3"]);
    }
}
