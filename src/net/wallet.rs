//! Wallet / payment adapter.
//!
//! Talks Ethereum JSON-RPC 2.0 to a signing wallet endpoint (a desktop
//! wallet exposing a local RPC port). The wallet prompts the user; a
//! rejection comes back as a JSON-RPC error and surfaces as `Err`.
//!
//! The entry fee is an ERC-20 `transfer(address,uint256)` call on the token
//! contract, so the transaction itself carries no native value.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};

/// `keccak256("transfer(address,uint256)")[..4]`
const TRANSFER_SELECTOR: &str = "a9059cbb";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxStatus {
    /// Broadcast but not yet mined.
    Pending,
    Confirmed,
    /// Mined with a failing status.
    Reverted,
}

pub trait Wallet {
    /// Ask the wallet for the active account (prompts the user if needed).
    fn request_account(&self) -> Result<String>;
    /// Sign and broadcast a token transfer. Returns the transaction hash.
    fn transfer(&self, from: &str, token: &str, receiver: &str, amount: u128) -> Result<String>;
    fn receipt(&self, tx_hash: &str) -> Result<TxStatus>;
}

// ══════════════════════════════════════════════════════════════
// Encoding helpers
// ══════════════════════════════════════════════════════════════

/// Parse a decimal token amount into base units, e.g. `("10", 6)` → 10_000_000.
pub fn parse_units(amount: &str, decimals: u32) -> Result<u128> {
    let amount = amount.trim();
    let (whole, frac) = match amount.split_once('.') {
        Some((w, f)) => (w, f),
        None => (amount, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        bail!("empty amount");
    }
    if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        bail!("invalid amount {amount:?}");
    }
    if frac.len() > decimals as usize {
        bail!("{amount} has more than {decimals} decimals");
    }

    let scale = 10u128
        .checked_pow(decimals)
        .ok_or_else(|| anyhow!("decimals {decimals} out of range"))?;
    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().context("amount too large")? };
    let padded = format!("{:0<width$}", frac, width = decimals as usize);
    let frac: u128 = if padded.is_empty() { 0 } else { padded.parse().context("amount too large")? };

    whole
        .checked_mul(scale)
        .and_then(|w| w.checked_add(frac))
        .ok_or_else(|| anyhow!("amount too large"))
}

fn address_hex(address: &str) -> Result<String> {
    let hex = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .unwrap_or(address);
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        bail!("invalid address {address:?}");
    }
    Ok(hex.to_ascii_lowercase())
}

/// ABI-encode `transfer(receiver, amount)` calldata.
pub fn encode_transfer(receiver: &str, amount: u128) -> Result<String> {
    let to = address_hex(receiver)?;
    Ok(format!("0x{TRANSFER_SELECTOR}{to:0>64}{amount:064x}"))
}

// ══════════════════════════════════════════════════════════════
// JSON-RPC wallet
// ══════════════════════════════════════════════════════════════

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

pub struct JsonRpcWallet {
    agent: ureq::Agent,
    url: String,
    next_id: AtomicU64,
}

impl JsonRpcWallet {
    /// Signing prompts can take a while; the timeout only bounds a dead endpoint.
    pub fn new(url: &str, timeout: Duration) -> Self {
        JsonRpcWallet {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            url: url.to_string(),
            next_id: AtomicU64::new(1),
        }
    }

    fn call(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });
        let resp: RpcResponse = self.agent
            .post(&self.url)
            .send_json(body)
            .with_context(|| format!("{method} request"))?
            .into_json()
            .with_context(|| format!("decoding {method} response"))?;

        if let Some(err) = resp.error {
            bail!("{method}: {} (code {})", err.message, err.code);
        }
        Ok(resp.result.unwrap_or(Value::Null))
    }
}

impl Wallet for JsonRpcWallet {
    fn request_account(&self) -> Result<String> {
        let accounts = self.call("eth_requestAccounts", json!([]))?;
        accounts
            .as_array()
            .and_then(|list| list.first())
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| anyhow!("wallet returned no accounts"))
    }

    fn transfer(&self, from: &str, token: &str, receiver: &str, amount: u128) -> Result<String> {
        let data = encode_transfer(receiver, amount)?;
        let tx = json!({ "from": from, "to": token, "data": data, "value": "0x0" });
        let hash = self.call("eth_sendTransaction", json!([tx]))?;
        hash.as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("eth_sendTransaction returned no hash"))
    }

    fn receipt(&self, tx_hash: &str) -> Result<TxStatus> {
        let receipt = self.call("eth_getTransactionReceipt", json!([tx_hash]))?;
        Ok(receipt_status(&receipt))
    }
}

/// `null` receipt → still pending; status `0x1` → confirmed; anything else reverted.
fn receipt_status(receipt: &Value) -> TxStatus {
    if receipt.is_null() {
        return TxStatus::Pending;
    }
    match receipt.get("status").and_then(Value::as_str) {
        Some("0x1") => TxStatus::Confirmed,
        _ => TxStatus::Reverted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::test_http::serve_once;

    const RECEIVER: &str = "0x1FE0D4089D100B30263c83A82a25987e2cdaD715";

    fn wallet(base: &str) -> JsonRpcWallet {
        JsonRpcWallet::new(base, Duration::from_secs(2))
    }

    // ── parse_units ──

    #[test]
    fn entry_fee_scales_by_decimals() {
        assert_eq!(parse_units("10", 6).unwrap(), 10_000_000);
        assert_eq!(parse_units("0.5", 6).unwrap(), 500_000);
        assert_eq!(parse_units("1.000001", 6).unwrap(), 1_000_001);
        assert_eq!(parse_units(".25", 2).unwrap(), 25);
        assert_eq!(parse_units("7", 0).unwrap(), 7);
    }

    #[test]
    fn rejects_malformed_amounts() {
        assert!(parse_units("", 6).is_err());
        assert!(parse_units("1.2345678", 6).is_err());
        assert!(parse_units("-1", 6).is_err());
        assert!(parse_units("1e3", 6).is_err());
    }

    // ── encode_transfer ──

    #[test]
    fn transfer_calldata_layout() {
        let data = encode_transfer(RECEIVER, 10_000_000).unwrap();
        assert_eq!(data.len(), 2 + 8 + 64 + 64);
        assert!(data.starts_with("0xa9059cbb"));
        assert_eq!(
            &data[10..74],
            "0000000000000000000000001fe0d4089d100b30263c83a82a25987e2cdad715"
        );
        assert!(data.ends_with("989680"));
    }

    #[test]
    fn transfer_rejects_bad_address() {
        assert!(encode_transfer("0x1234", 1).is_err());
        assert!(encode_transfer("0xZZE0D4089D100B30263c83A82a25987e2cdaD715", 1).is_err());
    }

    // ── receipt_status ──

    #[test]
    fn receipt_status_mapping() {
        assert_eq!(receipt_status(&Value::Null), TxStatus::Pending);
        assert_eq!(receipt_status(&json!({"status": "0x1"})), TxStatus::Confirmed);
        assert_eq!(receipt_status(&json!({"status": "0x0"})), TxStatus::Reverted);
    }

    // ── JSON-RPC round trips ──

    #[test]
    fn request_account_returns_first() {
        let (base, handle) = serve_once(200, r#"{"jsonrpc":"2.0","id":1,"result":["0xAbC","0xDef"]}"#);
        assert_eq!(wallet(&base).request_account().unwrap(), "0xAbC");
        let req = handle.join().unwrap();
        assert!(req.contains(r#""method":"eth_requestAccounts""#), "{req}");
    }

    #[test]
    fn user_rejection_surfaces_as_error() {
        let (base, handle) = serve_once(
            200,
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":4001,"message":"User rejected the request."}}"#,
        );
        let err = wallet(&base).transfer("0xabc", RECEIVER, RECEIVER, 1).unwrap_err();
        assert!(err.to_string().contains("User rejected"), "{err}");
        handle.join().unwrap();
    }

    #[test]
    fn transfer_sends_token_call() {
        let (base, handle) = serve_once(200, r#"{"jsonrpc":"2.0","id":1,"result":"0xfeed"}"#);
        let hash = wallet(&base).transfer("0xabc", "0xtoken", RECEIVER, 10_000_000).unwrap();
        assert_eq!(hash, "0xfeed");
        let req = handle.join().unwrap();
        assert!(req.contains(r#""method":"eth_sendTransaction""#), "{req}");
        assert!(req.contains(r#""to":"0xtoken""#), "{req}");
        assert!(req.contains("0xa9059cbb"), "{req}");
    }

    #[test]
    fn pending_receipt_is_null_result() {
        let (base, handle) = serve_once(200, r#"{"jsonrpc":"2.0","id":1,"result":null}"#);
        assert_eq!(wallet(&base).receipt("0xfeed").unwrap(), TxStatus::Pending);
        handle.join().unwrap();
    }
}
