//! Aggregate stats snapshot and the polling interval that refreshes it.

use crate::net::api::StatsResponse;

#[derive(Clone, Debug, PartialEq)]
pub struct Stats {
    pub remaining_spots: u64,
    pub total_spots: u64,
    pub total_players: u64,
    /// Static display string, never refreshed from the network.
    pub pool_label: String,
    /// False until the first answer (success or failure) arrives.
    pub loaded: bool,
}

impl Stats {
    pub fn new(pool_label: impl Into<String>) -> Self {
        Stats {
            remaining_spots: 0,
            total_spots: 0,
            total_players: 0,
            pool_label: pool_label.into(),
            loaded: false,
        }
    }

    /// Apply a fetch result. Failures zero the counters; the pool label stays.
    pub fn apply(&mut self, result: Result<StatsResponse, String>) {
        let fresh = result.unwrap_or_else(|err| {
            tracing::warn!("stats fetch failed: {err}");
            StatsResponse::default()
        });
        self.remaining_spots = fresh.remaining_spots;
        self.total_spots = fresh.total_spots;
        self.total_players = fresh.total_players;
        self.loaded = true;
    }

    fn counter(&self, value: u64) -> String {
        if self.loaded { value.to_string() } else { "...".to_string() }
    }

    pub fn spots_label(&self) -> String {
        format!("{} / {}", self.counter(self.remaining_spots), self.counter(self.total_spots))
    }

    pub fn players_label(&self) -> String {
        self.counter(self.total_players)
    }
}

/// Repeating countdown driven by simulated frame time.
/// Dropping it is the cancellation.
#[derive(Clone, Debug, PartialEq)]
pub struct Interval {
    period_ms: u32,
    elapsed_ms: u32,
}

impl Interval {
    pub fn new(period_ms: u32) -> Self {
        Interval { period_ms: period_ms.max(1), elapsed_ms: 0 }
    }

    /// Advance by `dt_ms`; true when the period has elapsed. A long frame
    /// fires once, not once per missed period.
    pub fn advance(&mut self, dt_ms: u32) -> bool {
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);
        if self.elapsed_ms >= self.period_ms {
            self.elapsed_ms = 0;
            true
        } else {
            false
        }
    }
}
