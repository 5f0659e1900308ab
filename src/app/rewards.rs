//! Rewards export for the competition admin.

use std::fmt::Write as _;

use crate::domain::rules::{reward_for_rank, REWARD_RANKS};
use crate::net::api::LeaderboardEntry;

pub const REWARDS_FILE: &str = "flappy-base-rewards.csv";
pub const CSV_HEADER: &str = "Rank,Wallet_Address,Points,Reward_USDC";

/// Ranked entries → CSV. Only the first `REWARD_RANKS` rows are written;
/// input order is the server's ranking.
pub fn rewards_csv(entries: &[LeaderboardEntry]) -> String {
    let mut out = String::with_capacity(64 * entries.len().min(REWARD_RANKS) + CSV_HEADER.len());
    out.push_str(CSV_HEADER);
    out.push('\n');
    for (i, entry) in entries.iter().take(REWARD_RANKS).enumerate() {
        let rank = i + 1;
        let _ = writeln!(
            out,
            "{},{},{},{}",
            rank,
            entry.wallet_address,
            entry.score,
            reward_for_rank(rank)
        );
    }
    out
}
