use crate::readings::{
    compute_stats, greenhouse_from_latest, latest_for_node, water_level_for_node,
    GreenhouseSnapshot, Reading, SensorStats,
};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// Collection plus derived snapshot, swapped together so readers never see a
/// readings/snapshot pair from two different polls.
#[derive(Debug, Default)]
struct Held {
    readings: Vec<Reading>,
    greenhouse: Option<GreenhouseSnapshot>,
}

#[derive(Debug)]
pub struct PollStats {
    pub polls_ok: AtomicU64,
    pub polls_failed: AtomicU64,
    pub last_success_unix_ms: AtomicU64,
    in_flight: AtomicBool,
    last_error: Mutex<Option<String>>,
}

impl PollStats {
    fn new() -> Self {
        Self {
            polls_ok: AtomicU64::new(0),
            polls_failed: AtomicU64::new(0),
            last_success_unix_ms: AtomicU64::new(0),
            in_flight: AtomicBool::new(false),
            last_error: Mutex::new(None),
        }
    }

    pub fn set_in_flight(&self, in_flight: bool) {
        self.in_flight.store(in_flight, Ordering::Relaxed);
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Relaxed)
    }

    pub fn record_success(&self) {
        self.polls_ok.fetch_add(1, Ordering::Relaxed);
        self.last_success_unix_ms
            .store(Utc::now().timestamp_millis() as u64, Ordering::Relaxed);
        if let Ok(mut guard) = self.last_error.lock() {
            *guard = None;
        }
    }

    pub fn record_error(&self, err: impl Into<String>) {
        self.polls_failed.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut guard) = self.last_error.lock() {
            *guard = Some(err.into());
        }
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().ok().and_then(|guard| guard.clone())
    }
}

/// Shared sensor state. The poll-completion step is the only writer; consumers
/// get read-only derived views.
#[derive(Clone)]
pub struct SensorStore {
    held: Arc<RwLock<Held>>,
    stats: Arc<PollStats>,
}

impl SensorStore {
    pub fn new() -> Self {
        Self {
            held: Arc::new(RwLock::new(Held::default())),
            stats: Arc::new(PollStats::new()),
        }
    }

    pub fn poll_stats(&self) -> Arc<PollStats> {
        self.stats.clone()
    }

    /// Replaces the collection wholesale and recomputes the greenhouse
    /// snapshot in the same write section. A new collection whose trailing
    /// sample lacks greenhouse slots leaves the previous snapshot in place
    /// (stale-but-valid, never reset once set).
    pub fn replace(&self, readings: Vec<Reading>) {
        let snapshot = greenhouse_from_latest(&readings);
        if let Ok(mut held) = self.held.write() {
            held.readings = readings;
            if snapshot.is_some() {
                held.greenhouse = snapshot;
            }
        }
    }

    /// The most recently accepted collection; empty before the first
    /// successful fetch.
    pub fn current_readings(&self) -> Vec<Reading> {
        self.held
            .read()
            .map(|held| held.readings.clone())
            .unwrap_or_default()
    }

    pub fn greenhouse(&self) -> Option<GreenhouseSnapshot> {
        self.held.read().ok().and_then(|held| held.greenhouse)
    }

    pub fn latest_for_node(&self, node_id: i64) -> Option<Reading> {
        self.held
            .read()
            .ok()
            .and_then(|held| latest_for_node(&held.readings, node_id).cloned())
    }

    pub fn water_level_for_node(&self, node_id: i64) -> f64 {
        self.held
            .read()
            .map(|held| water_level_for_node(&held.readings, node_id))
            .unwrap_or(0.0)
    }

    /// Derived on demand from the held collection; all-zero defaults before
    /// the first fetch.
    pub fn stats(&self) -> SensorStats {
        match self.held.read() {
            Ok(held) => compute_stats(&held.readings, held.greenhouse.as_ref()),
            Err(_) => SensorStats::default(),
        }
    }

    /// True for the whole span of a poll cycle, retries included.
    pub fn is_loading(&self) -> bool {
        self.stats.in_flight()
    }

    /// Set when the most recent cycle exhausted its retries; cleared by the
    /// next successful fetch.
    pub fn last_error(&self) -> Option<String> {
        self.stats.last_error()
    }
}

impl Default for SensorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(node_id: i64, timestamp: i64, values: Vec<Option<f64>>) -> Reading {
        Reading {
            timestamp,
            node_id,
            values,
            distance: None,
            in_geofence: None,
        }
    }

    #[test]
    fn empty_store_defaults() {
        let store = SensorStore::new();
        assert!(store.current_readings().is_empty());
        assert!(store.greenhouse().is_none());
        assert!(store.latest_for_node(1).is_none());
        assert_eq!(store.water_level_for_node(1), 0.0);
        assert_eq!(store.stats(), SensorStats::default());
        assert!(!store.is_loading());
        assert!(store.last_error().is_none());
    }

    #[test]
    fn replace_swaps_collection_wholesale() {
        let store = SensorStore::new();
        store.replace(vec![reading(1, 100, vec![Some(80.0), Some(22.0), Some(55.0)])]);
        assert_eq!(store.water_level_for_node(1), 80.0);

        store.replace(vec![reading(2, 200, vec![Some(60.0), Some(20.0), Some(50.0)])]);
        // Node 1 is gone after the swap, not merged.
        assert_eq!(store.water_level_for_node(1), 0.0);
        assert_eq!(store.water_level_for_node(2), 60.0);
        assert_eq!(store.current_readings().len(), 1);
    }

    #[test]
    fn greenhouse_survives_short_values_replacement() {
        let store = SensorStore::new();
        store.replace(vec![reading(1, 1000, vec![Some(80.0), Some(22.0), Some(55.0)])]);
        let before = store.greenhouse().unwrap();

        store.replace(vec![reading(2, 2000, vec![Some(10.0)])]);
        assert_eq!(store.water_level_for_node(2), 10.0);
        assert_eq!(store.greenhouse(), Some(before));
    }

    #[test]
    fn greenhouse_absent_until_full_sample_seen() {
        let store = SensorStore::new();
        store.replace(vec![reading(2, 1000, vec![Some(10.0)])]);
        assert_eq!(store.water_level_for_node(2), 10.0);
        assert!(store.greenhouse().is_none());
    }

    #[test]
    fn stats_reflect_latest_replacement() {
        let store = SensorStore::new();
        store.replace(vec![
            reading(1, 1000, vec![Some(80.0), Some(22.0), Some(55.0)]),
            reading(2, 1001, vec![Some(40.0), Some(23.0), Some(56.0)]),
        ]);
        let stats = store.stats();
        assert_eq!(stats.total_nodes, 6);
        assert_eq!(stats.avg_water_level, 60.0);
        assert_eq!(stats.greenhouse_temperature, 23.0);
        assert_eq!(stats.greenhouse_humidity, 56.0);
    }

    #[test]
    fn error_set_and_cleared() {
        let store = SensorStore::new();
        let stats = store.poll_stats();

        stats.record_error("HTTP 500");
        assert_eq!(store.last_error().as_deref(), Some("HTTP 500"));
        assert_eq!(stats.polls_failed.load(Ordering::Relaxed), 1);

        stats.record_success();
        assert!(store.last_error().is_none());
        assert_eq!(stats.polls_ok.load(Ordering::Relaxed), 1);
        assert!(stats.last_success_unix_ms.load(Ordering::Relaxed) > 0);
    }

    #[test]
    fn in_flight_flag_round_trips() {
        let store = SensorStore::new();
        let stats = store.poll_stats();
        stats.set_in_flight(true);
        assert!(store.is_loading());
        stats.set_in_flight(false);
        assert!(!store.is_loading());
    }
}
