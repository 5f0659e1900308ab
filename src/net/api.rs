//! Backend REST client (JSON over HTTP, base path `/api`).
//!
//! Endpoints:
//!   GET  /stats                          → { remainingSpots, totalSpots, totalPlayers }
//!   GET  /leaderboard                    → [{ walletAddress, score }]  (ranked)
//!   GET  /check-payment?walletAddress=…  → { isPaid }
//!   POST /record-payment  { walletAddress, txHash }
//!   POST /update-score    { walletAddress, score }   (controller path)
//!   POST /submit-score    { walletAddress, score }   (scene path)

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::BackendConfig;

// ── Wire types ──

/// Aggregate counters. Missing fields read as 0.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsResponse {
    pub remaining_spots: u64,
    pub total_spots: u64,
    pub total_players: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub wallet_address: String,
    #[serde(deserialize_with = "lenient_score")]
    pub score: u32,
}

/// Any JSON number: rounded, clamped into `u32`.
fn lenient_score<'de, D: Deserializer<'de>>(de: D) -> Result<u32, D::Error> {
    let raw = f64::deserialize(de)?;
    if raw.is_nan() {
        return Ok(0);
    }
    Ok(raw.round().clamp(0.0, u32::MAX as f64) as u32)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentStatusResponse {
    #[serde(default)]
    is_paid: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordPaymentBody<'a> {
    wallet_address: &'a str,
    tx_hash: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScoreBody<'a> {
    wallet_address: &'a str,
    score: u32,
}

// ── Client seam ──

/// Everything the game needs from the backend.
pub trait BackendApi {
    fn stats(&self) -> Result<StatsResponse>;
    fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>>;
    fn check_payment(&self, wallet_address: &str) -> Result<bool>;
    fn record_payment(&self, wallet_address: &str, tx_hash: &str) -> Result<()>;
    fn update_score(&self, wallet_address: &str, score: u32) -> Result<()>;
    fn submit_score(&self, wallet_address: &str, score: u32) -> Result<()>;
}

pub struct HttpBackend {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpBackend {
    pub fn new(cfg: &BackendConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build();
        HttpBackend {
            agent,
            base_url: cfg.api_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    fn post_score(&self, endpoint: &str, wallet_address: &str, score: u32) -> Result<()> {
        self.agent
            .post(&self.url(endpoint))
            .send_json(ScoreBody { wallet_address, score })
            .with_context(|| format!("POST /{endpoint}"))?;
        Ok(())
    }
}

impl BackendApi for HttpBackend {
    fn stats(&self) -> Result<StatsResponse> {
        self.agent
            .get(&self.url("stats"))
            .call()
            .context("GET /stats")?
            .into_json()
            .context("decoding /stats")
    }

    fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>> {
        self.agent
            .get(&self.url("leaderboard"))
            .call()
            .context("GET /leaderboard")?
            .into_json()
            .context("decoding /leaderboard")
    }

    fn check_payment(&self, wallet_address: &str) -> Result<bool> {
        let status: PaymentStatusResponse = self.agent
            .get(&self.url("check-payment"))
            .query("walletAddress", wallet_address)
            .call()
            .context("GET /check-payment")?
            .into_json()
            .context("decoding /check-payment")?;
        Ok(status.is_paid)
    }

    fn record_payment(&self, wallet_address: &str, tx_hash: &str) -> Result<()> {
        self.agent
            .post(&self.url("record-payment"))
            .send_json(RecordPaymentBody { wallet_address, tx_hash })
            .context("POST /record-payment")?;
        Ok(())
    }

    fn update_score(&self, wallet_address: &str, score: u32) -> Result<()> {
        self.post_score("update-score", wallet_address, score)
    }

    fn submit_score(&self, wallet_address: &str, score: u32) -> Result<()> {
        self.post_score("submit-score", wallet_address, score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::test_http::serve_once;

    fn backend(base: &str) -> HttpBackend {
        HttpBackend::new(&BackendConfig { api_url: base.to_string(), timeout_ms: 2000 })
    }

    #[test]
    fn url_joins_without_double_slash() {
        let b = backend("http://localhost:3000/api/");
        assert_eq!(b.url("stats"), "http://localhost:3000/api/stats");
    }

    #[test]
    fn stats_missing_fields_default_to_zero() {
        let s: StatsResponse = serde_json::from_str(r#"{"remainingSpots": 12}"#).unwrap();
        assert_eq!(s, StatsResponse { remaining_spots: 12, total_spots: 0, total_players: 0 });
    }

    #[test]
    fn leaderboard_entry_uses_camel_case() {
        let e: LeaderboardEntry =
            serde_json::from_str(r#"{"walletAddress":"0xabc","score":9}"#).unwrap();
        assert_eq!(e.wallet_address, "0xabc");
        assert_eq!(e.score, 9);
    }

    #[test]
    fn leaderboard_tolerates_odd_scores() {
        let list: Vec<LeaderboardEntry> = serde_json::from_str(
            r#"[{"walletAddress":"0xa","score":12.6},{"walletAddress":"0xb","score":-3},{"walletAddress":"0xc","score":4}]"#,
        )
        .unwrap();
        let scores: Vec<u32> = list.iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![13, 0, 4]);
    }

    #[test]
    fn fetches_stats_over_http() {
        let (base, handle) = serve_once(200, r#"{"remainingSpots":5,"totalSpots":2000,"totalPlayers":40}"#);
        let stats = backend(&format!("{base}/api")).stats().unwrap();
        assert_eq!(stats.total_spots, 2000);
        assert_eq!(stats.total_players, 40);
        let req = handle.join().unwrap();
        assert!(req.starts_with("GET /api/stats "), "{req}");
    }

    #[test]
    fn check_payment_sends_wallet_query() {
        let (base, handle) = serve_once(200, r#"{"isPaid":true}"#);
        assert!(backend(&base).check_payment("0xFeed").unwrap());
        let req = handle.join().unwrap();
        assert!(req.starts_with("GET /check-payment?walletAddress=0xFeed "), "{req}");
    }

    #[test]
    fn submit_score_posts_json_body() {
        let (base, handle) = serve_once(200, "{}");
        backend(&base).submit_score("0xabc", 7).unwrap();
        let req = handle.join().unwrap();
        assert!(req.starts_with("POST /submit-score "), "{req}");
        assert!(req.contains(r#""walletAddress":"0xabc""#), "{req}");
        assert!(req.contains(r#""score":7"#), "{req}");
    }

    #[test]
    fn record_payment_posts_tx_hash() {
        let (base, handle) = serve_once(200, "{}");
        backend(&base).record_payment("0xabc", "0xdead").unwrap();
        let req = handle.join().unwrap();
        assert!(req.starts_with("POST /record-payment "), "{req}");
        assert!(req.contains(r#""txHash":"0xdead""#), "{req}");
    }

    #[test]
    fn server_error_is_reported() {
        let (base, handle) = serve_once(500, "{}");
        let err = backend(&base).leaderboard().unwrap_err();
        assert!(format!("{err:#}").contains("GET /leaderboard"));
        handle.join().unwrap();
    }
}
