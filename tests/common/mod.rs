#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use gift_sync::config::{Config, GiftModule};
use gift_sync::ledger::{LedgerError, LedgerReader, ViewRequest};
use gift_sync::sync::{Snapshot, SyncState};
use gift_sync::wallet::{EntryFunctionPayload, SignerError, SubmittedTransaction, WalletSigner};
use gift_sync::{Address, Amount};
use serde_json::{Value, json};
use tokio::sync::watch;

pub fn addr(s: &str) -> Address {
    s.parse().unwrap()
}

pub fn tokens(base_units: u64) -> Amount {
    Amount::from_base_units(base_units)
}

pub fn config(settle_delay: Duration) -> Config {
    Config {
        node_url: "http://localhost:8080/v1".into(),
        module: GiftModule::new("0xcafe", "birthday_bot"),
        coin_type: "0x1::aptos_coin::AptosCoin".into(),
        settle_delay,
    }
}

struct Delayed {
    delay: Duration,
    response: Value,
}

#[derive(Default)]
struct LedgerState {
    responses: HashMap<String, Value>,
    queued: VecDeque<Delayed>,
    fail: bool,
    requests: Vec<ViewRequest>,
}

/// In-memory ledger answering by function name, keyed by the part after
/// the last `::` (e.g. `view_recipients_gifts`, `balance`).
#[derive(Clone, Default)]
pub struct ScriptedLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl ScriptedLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, function: &str, response: Value) {
        self.state
            .lock()
            .unwrap()
            .responses
            .insert(function.to_string(), response);
    }

    /// Answer the next request (any function) with `response` after `delay`.
    pub fn queue_delayed(&self, delay: Duration, response: Value) {
        self.state
            .lock()
            .unwrap()
            .queued
            .push_back(Delayed { delay, response });
    }

    pub fn set_failing(&self, fail: bool) {
        self.state.lock().unwrap().fail = fail;
    }

    pub fn calls(&self, function: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|r| short_name(&r.function) == function)
            .count()
    }

    pub fn requests(&self) -> Vec<ViewRequest> {
        self.state.lock().unwrap().requests.clone()
    }
}

fn short_name(function: &str) -> &str {
    function.rsplit("::").next().unwrap_or(function)
}

#[async_trait]
impl LedgerReader for ScriptedLedger {
    async fn view(&self, request: &ViewRequest) -> Result<Value, LedgerError> {
        let (delay, response, fail) = {
            let mut state = self.state.lock().unwrap();
            state.requests.push(request.clone());
            let name = short_name(&request.function);
            match state.queued.pop_front() {
                Some(queued) => (queued.delay, queued.response, false),
                None => {
                    let fallback = if name == "balance" {
                        json!("0")
                    } else {
                        json!([[], [], []])
                    };
                    let response = state.responses.get(name).cloned().unwrap_or(fallback);
                    (Duration::ZERO, response, state.fail)
                }
            }
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(LedgerError::Status(503));
        }
        Ok(response)
    }
}

/// Wallet signer with a switchable outcome that records every payload.
#[derive(Clone)]
pub struct ScriptedSigner {
    outcome: Arc<Mutex<Result<(), SignerError>>>,
    payloads: Arc<Mutex<Vec<EntryFunctionPayload>>>,
}

impl ScriptedSigner {
    pub fn new() -> Self {
        Self {
            outcome: Arc::new(Mutex::new(Ok(()))),
            payloads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn fail_with(&self, error: SignerError) {
        *self.outcome.lock().unwrap() = Err(error);
    }

    pub fn payloads(&self) -> Vec<EntryFunctionPayload> {
        self.payloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletSigner for ScriptedSigner {
    async fn sign_and_submit(
        &self,
        payload: &EntryFunctionPayload,
    ) -> Result<SubmittedTransaction, SignerError> {
        let mut payloads = self.payloads.lock().unwrap();
        payloads.push(payload.clone());
        let hash = format!("0x{:x}", payloads.len());
        self.outcome
            .lock()
            .unwrap()
            .clone()
            .map(|_| SubmittedTransaction { hash })
    }
}

/// Wait until the view has applied generation `generation` or later.
pub async fn synced<T: Clone>(
    rx: &mut watch::Receiver<Snapshot<T>>,
    generation: u64,
) -> Snapshot<T> {
    let snapshot = tokio::time::timeout(
        Duration::from_secs(30),
        rx.wait_for(|s| s.state == SyncState::Idle && s.generation >= generation),
    )
    .await
    .expect("view did not sync in time")
    .expect("view dropped");
    snapshot.clone()
}
