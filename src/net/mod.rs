//! Network worker: backend REST calls and wallet RPC off the frame loop.
//!
//! The frame loop sends `Request`s and drains `Response`s with `try_recv`
//! once per frame. Fire-and-forget writes (payment recording, score
//! submission) never produce a `Response`; their failures are only logged.

pub mod api;
pub mod wallet;

use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use anyhow::{Context, Result};

use crate::sim::scene::ScoreSink;
use api::{BackendApi, LeaderboardEntry, StatsResponse};
use wallet::{TxStatus, Wallet};

#[derive(Clone, Debug, PartialEq)]
pub enum Request {
    ConnectWallet,
    FetchStats,
    FetchLeaderboard,
    CheckPayment { wallet_address: String },
    Pay { wallet_address: String },
    RecordPayment { wallet_address: String, tx_hash: String },
    PollReceipt { tx_hash: String },
    UpdateScore { wallet_address: String, score: u32 },
    SubmitScore { wallet_address: String, score: u32 },
}

/// Errors are flattened to display strings so responses stay `Clone + PartialEq`.
#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    Connected(Result<String, String>),
    Stats(Result<StatsResponse, String>),
    Leaderboard(Result<Vec<LeaderboardEntry>, String>),
    PaymentChecked { wallet_address: String, paid: bool },
    PaymentSent { wallet_address: String, result: Result<String, String> },
    Receipt { tx_hash: String, status: Result<TxStatus, String> },
}

/// What a competition entry costs and where it goes.
#[derive(Clone, Debug)]
pub struct PaymentTerms {
    pub token: String,
    pub receiver: String,
    /// In token base units.
    pub amount: u128,
}

fn flatten<T>(r: Result<T>) -> Result<T, String> {
    r.map_err(|e| format!("{e:#}"))
}

/// Execute one request. Blocking; runs on the worker thread.
pub fn handle(
    api: &dyn BackendApi,
    wallet: &dyn Wallet,
    terms: &PaymentTerms,
    req: Request,
) -> Option<Response> {
    match req {
        Request::ConnectWallet => Some(Response::Connected(flatten(wallet.request_account()))),
        Request::FetchStats => Some(Response::Stats(flatten(api.stats()))),
        Request::FetchLeaderboard => Some(Response::Leaderboard(flatten(api.leaderboard()))),
        Request::CheckPayment { wallet_address } => {
            let paid = match api.check_payment(&wallet_address) {
                Ok(paid) => paid,
                Err(e) => {
                    tracing::warn!("payment status lookup failed: {e:#}");
                    false
                }
            };
            Some(Response::PaymentChecked { wallet_address, paid })
        }
        Request::Pay { wallet_address } => {
            let result = wallet.transfer(&wallet_address, &terms.token, &terms.receiver, terms.amount);
            if let Ok(tx_hash) = &result {
                tracing::info!(%tx_hash, "entry fee broadcast");
            }
            Some(Response::PaymentSent { wallet_address, result: flatten(result) })
        }
        Request::RecordPayment { wallet_address, tx_hash } => {
            if let Err(e) = api.record_payment(&wallet_address, &tx_hash) {
                tracing::warn!("record-payment failed: {e:#}");
            }
            None
        }
        Request::PollReceipt { tx_hash } => {
            let status = flatten(wallet.receipt(&tx_hash));
            Some(Response::Receipt { tx_hash, status })
        }
        Request::UpdateScore { wallet_address, score } => {
            if let Err(e) = api.update_score(&wallet_address, score) {
                tracing::warn!("update-score failed: {e:#}");
            }
            None
        }
        Request::SubmitScore { wallet_address, score } => {
            if let Err(e) = api.submit_score(&wallet_address, score) {
                tracing::warn!("submit-score failed: {e:#}");
            }
            None
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Worker
// ══════════════════════════════════════════════════════════════

pub struct NetClient {
    requests: Sender<Request>,
    responses: Receiver<Response>,
}

impl NetClient {
    pub fn send(&self, req: Request) {
        if self.requests.send(req).is_err() {
            tracing::warn!("network worker has stopped; request dropped");
        }
    }

    pub fn try_recv(&self) -> Option<Response> {
        self.responses.try_recv().ok()
    }

    /// Scene-side submission path sharing this worker.
    pub fn score_sink(&self) -> Rc<dyn ScoreSink> {
        Rc::new(RequestSink(self.requests.clone()))
    }
}

/// Start the worker thread. It exits when the `NetClient` is dropped.
pub fn spawn<A, W>(api: A, wallet: W, terms: PaymentTerms) -> Result<NetClient>
where
    A: BackendApi + Send + 'static,
    W: Wallet + Send + 'static,
{
    let (req_tx, req_rx) = mpsc::channel::<Request>();
    let (resp_tx, resp_rx) = mpsc::channel::<Response>();

    thread::Builder::new()
        .name("net".into())
        .spawn(move || {
            for req in req_rx {
                tracing::debug!(?req, "net request");
                if let Some(resp) = handle(&api, &wallet, &terms, req) {
                    if resp_tx.send(resp).is_err() {
                        break;
                    }
                }
            }
            tracing::debug!("net worker exiting");
        })
        .context("spawning network worker")?;

    Ok(NetClient { requests: req_tx, responses: resp_rx })
}

struct RequestSink(Sender<Request>);

impl ScoreSink for RequestSink {
    fn submit_score(&self, wallet_address: &str, score: u32) {
        let req = Request::SubmitScore { wallet_address: wallet_address.to_string(), score };
        if self.0.send(req).is_err() {
            tracing::warn!("network worker has stopped; score not submitted");
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Test helpers
// ══════════════════════════════════════════════════════════════

/// One-shot HTTP/1.1 server on an ephemeral port. The join handle yields
/// the raw request text (head + body).
#[cfg(test)]
pub(crate) mod test_http {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    fn content_length(head: &str) -> usize {
        head.lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.trim().parse().ok())
            .unwrap_or(0)
    }

    pub fn serve_once(status: u16, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];

            let head_end = loop {
                let n = stream.read(&mut chunk).unwrap();
                if n == 0 {
                    break buf.len();
                }
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = find(&buf, b"\r\n\r\n") {
                    break pos + 4;
                }
            };
            let want = head_end + content_length(&String::from_utf8_lossy(&buf[..head_end]));
            while buf.len() < want {
                let n = stream.read(&mut chunk).unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }

            let reason = if status < 400 { "OK" } else { "Error" };
            let reply = format!(
                "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(reply.as_bytes()).unwrap();
            stream.flush().unwrap();
            String::from_utf8_lossy(&buf).into_owned()
        });

        (format!("http://{addr}"), handle)
    }
}
