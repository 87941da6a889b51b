//! Rolling spread observations per symbol and venue pair.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration, Utc};

use super::id::{Symbol, VenueId};
use super::stats;

/// Canonical key of a spread series: venues in lexical order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpreadKey {
    pub symbol: Symbol,
    pub venue_a: VenueId,
    pub venue_b: VenueId,
}

impl SpreadKey {
    /// Build a key, swapping the venues into lexical order if needed.
    pub fn new(symbol: Symbol, first: VenueId, second: VenueId) -> Self {
        let (venue_a, venue_b) = if first <= second {
            (first, second)
        } else {
            (second, first)
        };
        Self {
            symbol,
            venue_a,
            venue_b,
        }
    }
}

/// Bounded, time-ordered sequence of normalized spread observations.
#[derive(Debug, Clone)]
pub struct SpreadHistory {
    observations: VecDeque<(DateTime<Utc>, f64)>,
    lookback: usize,
    max_age: Duration,
}

impl SpreadHistory {
    pub fn new(lookback: usize, max_age: Duration) -> Self {
        Self {
            observations: VecDeque::with_capacity(lookback.min(1024)),
            lookback: lookback.max(1),
            max_age,
        }
    }

    /// Append an observation and evict by count and by age.
    pub fn push(&mut self, at: DateTime<Utc>, spread: f64) {
        self.observations.push_back((at, spread));
        while self.observations.len() > self.lookback {
            self.observations.pop_front();
        }
        self.evict_older_than(at - self.max_age);
    }

    fn evict_older_than(&mut self, cutoff: DateTime<Utc>) {
        while self
            .observations
            .front()
            .is_some_and(|(at, _)| *at < cutoff)
        {
            self.observations.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.observations.iter().map(|(_, v)| *v).collect()
    }

    pub fn latest(&self) -> Option<f64> {
        self.observations.back().map(|(_, v)| *v)
    }

    /// Population mean and standard deviation of the window.
    pub fn mean_std(&self) -> (f64, f64) {
        let values = self.values();
        (stats::mean(&values), stats::std_dev(&values))
    }
}

/// All spread histories owned by the detector.
#[derive(Debug, Clone)]
pub struct SpreadBook {
    histories: HashMap<SpreadKey, SpreadHistory>,
    lookback: usize,
    max_age: Duration,
}

impl SpreadBook {
    pub fn new(lookback: usize, max_age: Duration) -> Self {
        Self {
            histories: HashMap::new(),
            lookback,
            max_age,
        }
    }

    /// Record an observation and return the updated history.
    pub fn record(&mut self, key: SpreadKey, at: DateTime<Utc>, spread: f64) -> &SpreadHistory {
        let (lookback, max_age) = (self.lookback, self.max_age);
        let history = self
            .histories
            .entry(key)
            .or_insert_with(|| SpreadHistory::new(lookback, max_age));
        history.push(at, spread);
        history
    }

    pub fn get(&self, key: &SpreadKey) -> Option<&SpreadHistory> {
        self.histories.get(key)
    }

    pub fn len(&self) -> usize {
        self.histories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_canonical() {
        let forward = SpreadKey::new("BTC".into(), "b".into(), "a".into());
        let backward = SpreadKey::new("BTC".into(), "a".into(), "b".into());

        assert_eq!(forward, backward);
        assert_eq!(forward.venue_a.as_str(), "a");
    }

    #[test]
    fn history_caps_by_count() {
        let now = Utc::now();
        let mut history = SpreadHistory::new(3, Duration::hours(1));
        for i in 0..5 {
            history.push(now + Duration::seconds(i), i as f64);
        }

        assert_eq!(history.values(), vec![2.0, 3.0, 4.0]);
        assert_eq!(history.latest(), Some(4.0));
    }

    #[test]
    fn history_caps_by_age() {
        let now = Utc::now();
        let mut history = SpreadHistory::new(100, Duration::seconds(30));
        history.push(now - Duration::seconds(60), 1.0);
        history.push(now - Duration::seconds(10), 2.0);
        history.push(now, 3.0);

        assert_eq!(history.values(), vec![2.0, 3.0]);
    }

    #[test]
    fn book_keeps_one_history_per_key() {
        let now = Utc::now();
        let mut book = SpreadBook::new(10, Duration::hours(1));
        let key = SpreadKey::new("BTC".into(), "a".into(), "b".into());

        book.record(key.clone(), now, 0.1);
        let history = book.record(key, now, 0.3);

        assert_eq!(history.len(), 2);
        assert_eq!(book.len(), 1);
        let (mean, std) = book
            .get(&SpreadKey::new("BTC".into(), "b".into(), "a".into()))
            .unwrap()
            .mean_std();
        assert!((mean - 0.2).abs() < 1e-12);
        assert!((std - 0.1).abs() < 1e-12);
    }
}
