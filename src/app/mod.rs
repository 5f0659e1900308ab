//! View controller: which screen is up, the wallet session, the payment
//! flow, and the single live `GameScene`.
//!
//! ## Views
//!
//! ```text
//!   Menu ──▶ Playing ──▶ GameOver ──▶ Menu | Playing
//!   Menu ──▶ Paying  ──▶ Playing | Menu
//!   Menu ◀─▶ Leaderboard
//! ```
//!
//! The controller performs no I/O. Network work is queued as `Request`s in
//! an outbox that the frame loop hands to the worker; answers come back
//! through `on_response`.

pub mod rewards;
pub mod stats;

use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{GameConfig, PhysicsConfig};
use crate::domain::entity::{FrameInput, Mode};
use crate::net::api::LeaderboardEntry;
use crate::net::wallet::TxStatus;
use crate::net::{Request, Response};
use crate::sim::event::GameEvent;
use crate::sim::save::SaveStore;
use crate::sim::scene::{GameScene, SceneContext, ScoreSink};
use crate::sim::step;
use stats::{Interval, Stats};

const NOTICE_MS: u32 = 3000;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum View {
    Menu,
    Playing,
    GameOver,
    Leaderboard,
    Paying,
}

/// Wallet session, passed explicitly into every scene it starts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    pub wallet_address: Option<String>,
    pub has_paid: bool,
    pub mode: Mode,
}

impl Session {
    pub fn is_connected(&self) -> bool {
        self.wallet_address.is_some()
    }
}

/// At most one payment flow is outstanding; triggers while not `Idle` are ignored.
#[derive(Clone, Debug, PartialEq)]
pub enum PaymentFlow {
    Idle,
    /// Waiting on the backend payment-status lookup.
    Checking,
    /// Waiting for the wallet to sign and broadcast.
    AwaitingWallet,
    Confirming { tx_hash: String, poll: Interval, in_flight: bool },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub text: String,
    pub remaining_ms: u32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

/// Medal for 1-based leaderboard ranks 1–3.
pub fn medal(rank: usize) -> Option<Medal> {
    match rank {
        1 => Some(Medal::Gold),
        2 => Some(Medal::Silver),
        3 => Some(Medal::Bronze),
        _ => None,
    }
}

/// `0x1234...abcd`. Short inputs are returned unchanged.
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Controller settings lifted out of `GameConfig`.
#[derive(Clone, Debug)]
pub struct AppSettings {
    pub physics: PhysicsConfig,
    pub stats_poll_ms: u32,
    pub receipt_poll_ms: u32,
    pub admin_address: String,
    pub entry_fee_label: String,
    pub pool_label: String,
}

impl AppSettings {
    pub fn from_config(cfg: &GameConfig) -> Self {
        AppSettings {
            physics: cfg.physics.clone(),
            stats_poll_ms: cfg.general.stats_poll_ms.min(u32::MAX as u64) as u32,
            receipt_poll_ms: cfg.general.receipt_poll_ms.min(u32::MAX as u64) as u32,
            admin_address: cfg.wallet.admin_address.clone(),
            entry_fee_label: format!("{} USDC", cfg.wallet.entry_fee),
            pool_label: cfg.general.pool_label.clone(),
        }
    }
}

pub struct App {
    pub view: View,
    pub session: Session,
    /// The single live scene. Replaced (old one dropped first) on every start.
    pub scene: Option<GameScene>,
    pub stats: Stats,
    /// `None` while the ranked list is loading.
    pub leaderboard: Option<Vec<LeaderboardEntry>>,
    pub best_score: u32,
    pub last_score: u32,
    pub notice: Option<Notice>,
    pub connecting: bool,
    pub settings: AppSettings,

    payment: PaymentFlow,
    stats_poll: Option<Interval>,
    /// A `FetchStats` is queued or running and has not been answered.
    stats_in_flight: bool,
    outbox: Vec<Request>,
    store: SaveStore,
    sink: Rc<dyn ScoreSink>,
    rng: StdRng,
}

impl App {
    pub fn new(settings: AppSettings, store: SaveStore, sink: Rc<dyn ScoreSink>, rng: StdRng) -> Self {
        let best_score = store.load_best();
        let mut app = App {
            view: View::Menu,
            session: Session::default(),
            scene: None,
            stats: Stats::new(settings.pool_label.clone()),
            leaderboard: None,
            best_score,
            last_score: 0,
            notice: None,
            connecting: false,
            settings,
            payment: PaymentFlow::Idle,
            stats_poll: None,
            stats_in_flight: false,
            outbox: Vec::new(),
            store,
            sink,
            rng,
        };
        app.start_stats_poll();
        app
    }

    pub fn payment(&self) -> &PaymentFlow {
        &self.payment
    }

    pub fn is_admin(&self) -> bool {
        self.session
            .wallet_address
            .as_deref()
            .is_some_and(|a| a.eq_ignore_ascii_case(&self.settings.admin_address))
    }

    /// Requests queued since the last drain, in order.
    pub fn drain_outbox(&mut self) -> Vec<Request> {
        std::mem::take(&mut self.outbox)
    }

    pub fn set_notice(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice { text: text.into(), remaining_ms: NOTICE_MS });
    }

    // ── View transitions ──

    fn set_view(&mut self, next: View) {
        if self.view == next {
            return;
        }
        tracing::debug!(from = ?self.view, to = ?next, "view change");

        if self.view == View::Menu {
            self.stats_poll = None;
        }
        match next {
            View::Menu => self.start_stats_poll(),
            View::Leaderboard => {
                self.leaderboard = None;
                self.outbox.push(Request::FetchLeaderboard);
            }
            View::Playing | View::GameOver | View::Paying => {}
        }
        self.view = next;
    }

    fn start_stats_poll(&mut self) {
        self.request_stats();
        self.stats_poll = Some(Interval::new(self.settings.stats_poll_ms));
    }

    /// At most one stats fetch is outstanding on the worker at a time.
    fn request_stats(&mut self) {
        if !self.stats_in_flight {
            self.stats_in_flight = true;
            self.outbox.push(Request::FetchStats);
        }
    }

    /// Drop the previous scene, then build a fresh one from the session.
    fn start_game(&mut self, mode: Mode) {
        self.scene = None;
        self.session.mode = mode;
        let ctx = SceneContext {
            wallet_address: self.session.wallet_address.clone().unwrap_or_default(),
            mode,
        };
        let rng = StdRng::seed_from_u64(self.rng.gen());
        self.scene = Some(GameScene::new(ctx, self.settings.physics.clone(), self.sink.clone(), rng));
        tracing::info!(mode = mode.label(), "game started");
        self.set_view(View::Playing);
    }

    // ── Wallet ──

    pub fn connect_wallet(&mut self) {
        if self.connecting {
            return;
        }
        self.connecting = true;
        self.outbox.push(Request::ConnectWallet);
    }

    pub fn disconnect(&mut self) {
        if let Some(addr) = self.session.wallet_address.take() {
            tracing::info!(wallet = %addr, "wallet disconnected");
        }
        self.session.has_paid = false;
        self.payment = PaymentFlow::Idle;
        self.set_notice("Wallet disconnected");
    }

    pub fn toggle_wallet(&mut self) {
        if self.session.is_connected() {
            self.disconnect();
        } else {
            self.connect_wallet();
        }
    }

    // ── Menu actions ──

    pub fn practice_click(&mut self) {
        if self.view != View::Menu {
            return;
        }
        self.start_game(Mode::Practice);
    }

    /// Route every Competition trigger through the paid-status check.
    pub fn competition_click(&mut self) {
        if self.view != View::Menu || self.payment != PaymentFlow::Idle {
            return;
        }
        let Some(wallet_address) = self.session.wallet_address.clone() else {
            self.set_notice("Connect a wallet to compete");
            self.connect_wallet();
            return;
        };
        if self.session.has_paid {
            self.start_game(Mode::Competition);
            return;
        }
        self.payment = PaymentFlow::Checking;
        self.outbox.push(Request::CheckPayment { wallet_address });
    }

    pub fn open_leaderboard(&mut self) {
        if self.view == View::Menu {
            self.set_view(View::Leaderboard);
        }
    }

    pub fn close_leaderboard(&mut self) {
        if self.view == View::Leaderboard {
            self.set_view(View::Menu);
        }
    }

    pub fn retry(&mut self) {
        if self.view == View::GameOver {
            self.start_game(self.session.mode);
        }
    }

    pub fn back_to_menu(&mut self) {
        if matches!(self.view, View::Playing | View::GameOver) {
            self.scene = None;
            self.set_view(View::Menu);
        }
    }

    /// Admin-only: write the rewards CSV for the current leaderboard.
    pub fn export_rewards(&mut self) {
        if !self.is_admin() {
            self.set_notice("Admin only");
            return;
        }
        let entries = self.leaderboard.as_deref().unwrap_or_default();
        if entries.is_empty() {
            self.set_notice("No entries to export");
            return;
        }
        let csv = rewards::rewards_csv(entries);
        match self.store.write_export(rewards::REWARDS_FILE, &csv) {
            Ok(path) => {
                tracing::info!(path = %path.display(), "rewards exported");
                self.set_notice(format!("Saved {}", path.display()));
            }
            Err(e) => {
                tracing::warn!("rewards export failed: {e:#}");
                self.set_notice("Export failed");
            }
        }
    }

    // ── Payment flow ──

    fn cancel_payment(&mut self, reason: &str) {
        tracing::info!(reason, "payment cancelled");
        self.payment = PaymentFlow::Idle;
        self.set_notice("Payment Cancelled");
        self.set_view(View::Menu);
    }

    fn payment_confirmed(&mut self) {
        self.payment = PaymentFlow::Idle;
        self.session.has_paid = true;
        self.start_game(Mode::Competition);
    }

    // ── Network answers ──

    pub fn on_response(&mut self, resp: Response) {
        match resp {
            Response::Connected(result) => {
                self.connecting = false;
                match result {
                    Ok(addr) => {
                        tracing::info!(wallet = %addr, "wallet connected");
                        self.set_notice(format!("Connected {}", short_address(&addr)));
                        self.session.wallet_address = Some(addr);
                        self.session.has_paid = false;
                    }
                    Err(e) => self.set_notice(format!("Connection failed: {e}")),
                }
            }
            Response::Stats(result) => {
                self.stats_in_flight = false;
                self.stats.apply(result);
            }
            Response::Leaderboard(result) => {
                let list = result.unwrap_or_else(|e| {
                    tracing::warn!("leaderboard fetch failed: {e}");
                    Vec::new()
                });
                self.leaderboard = Some(list);
            }
            Response::PaymentChecked { wallet_address, paid } => {
                if self.payment != PaymentFlow::Checking
                    || self.session.wallet_address.as_deref() != Some(wallet_address.as_str())
                {
                    return;
                }
                if paid {
                    self.payment_confirmed();
                } else {
                    self.payment = PaymentFlow::AwaitingWallet;
                    self.set_view(View::Paying);
                    self.outbox.push(Request::Pay { wallet_address });
                }
            }
            Response::PaymentSent { wallet_address, result } => {
                if self.payment != PaymentFlow::AwaitingWallet {
                    return;
                }
                match result {
                    Ok(tx_hash) => {
                        self.outbox.push(Request::RecordPayment {
                            wallet_address,
                            tx_hash: tx_hash.clone(),
                        });
                        self.payment = PaymentFlow::Confirming {
                            tx_hash,
                            poll: Interval::new(self.settings.receipt_poll_ms),
                            in_flight: false,
                        };
                    }
                    Err(e) => self.cancel_payment(&e),
                }
            }
            Response::Receipt { tx_hash, status } => {
                let PaymentFlow::Confirming { tx_hash: ref pending, ref mut in_flight, .. } = self.payment else {
                    return;
                };
                if *pending != tx_hash {
                    return;
                }
                *in_flight = false;
                match status {
                    Ok(TxStatus::Pending) => {}
                    Ok(TxStatus::Confirmed) => {
                        tracing::info!(%tx_hash, "entry fee confirmed");
                        self.payment_confirmed();
                    }
                    Ok(TxStatus::Reverted) => self.cancel_payment("transaction reverted"),
                    // Transient RPC trouble: keep polling.
                    Err(e) => tracing::warn!("receipt lookup failed: {e}"),
                }
            }
        }
    }

    // ── Frame tick ──

    /// Advance timers and the live scene by one fixed tick.
    pub fn tick(&mut self, dt_ms: u32, input: FrameInput) -> Vec<GameEvent> {
        if let Some(notice) = &mut self.notice {
            notice.remaining_ms = notice.remaining_ms.saturating_sub(dt_ms);
            if notice.remaining_ms == 0 {
                self.notice = None;
            }
        }

        if let Some(poll) = &mut self.stats_poll {
            if poll.advance(dt_ms) {
                self.request_stats();
            }
        }

        if let PaymentFlow::Confirming { tx_hash, poll, in_flight } = &mut self.payment {
            if poll.advance(dt_ms) && !*in_flight {
                *in_flight = true;
                self.outbox.push(Request::PollReceipt { tx_hash: tx_hash.clone() });
            }
        }

        if self.view != View::Playing {
            return Vec::new();
        }
        let Some(scene) = self.scene.as_mut() else {
            return Vec::new();
        };
        let events = step::step(scene, input, dt_ms);
        let report = events.iter().find_map(|e| match e {
            GameEvent::GameOver { score } => Some(*score),
            _ => None,
        });
        if let Some(score) = report {
            self.handle_game_over(score);
        }
        events
    }

    /// Controller side of the end of a run.
    fn handle_game_over(&mut self, score: u32) {
        self.last_score = score;
        if score > self.best_score {
            self.best_score = score;
            if let Err(e) = self.store.store_best(score) {
                tracing::warn!("could not persist best score: {e:#}");
            }
        }
        if self.session.mode == Mode::Competition {
            if let Some(wallet_address) = self.session.wallet_address.clone() {
                self.outbox.push(Request::UpdateScore { wallet_address, score });
                self.request_stats();
            }
        }
        self.set_view(View::GameOver);
    }
}
