//! Cached, self-refreshing views over the ledger.
//!
//! Each view listens to a [`TriggerWatcher`] and refetches on every distinct
//! trigger. Between the start of a settle delay and the end of the following
//! resync the published records are stale; that window is expected.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, warn};

use crate::Amount;
use crate::gate::{GateError, TransactionGate};
use crate::ledger::{LedgerQueryClient, LedgerReader};
use crate::mapper::map_gifts;
use crate::model::{Address, Direction, GiftRecord};
use crate::sync::{SharedSlot, Snapshot, SyncSlot, SyncTrigger, TriggerWatcher};
use crate::wallet::SubmittedTransaction;

pub type GiftSnapshot = Snapshot<Arc<[GiftRecord]>>;
pub type BalanceSnapshot = Snapshot<Option<Amount>>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewError {
    #[error("{action} is not available on the {direction} gift list")]
    WrongDirection {
        action: &'static str,
        direction: Direction,
    },
    #[error(transparent)]
    Gate(#[from] GateError),
}

/// What the user is asked to confirm before a gift is cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelPrompt {
    pub recipient: Address,
    /// Amount of the cached gift, if the recipient is in the current list.
    pub amount: Option<Amount>,
}

/// Query and map gifts for `account`, treating malformed data as empty.
pub async fn load_gifts<R: LedgerReader>(
    ledger: &LedgerQueryClient<R>,
    direction: Direction,
    account: &Address,
) -> Vec<GiftRecord> {
    let raw = ledger.view_gifts(direction, account).await;
    map_gifts(&raw, direction).unwrap_or_else(|e| {
        warn!(account = %account, direction = %direction, reason = %e, "discarding malformed gift data");
        Vec::new()
    })
}

/// The sent or received gift list of the connected account.
pub struct GiftListView<R> {
    direction: Direction,
    ledger: Arc<LedgerQueryClient<R>>,
    gate: Arc<TransactionGate>,
    slot: SharedSlot<Arc<[GiftRecord]>>,
}

impl<R> Clone for GiftListView<R> {
    fn clone(&self) -> Self {
        Self {
            direction: self.direction,
            ledger: Arc::clone(&self.ledger),
            gate: Arc::clone(&self.gate),
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<R: LedgerReader> GiftListView<R> {
    pub fn new(
        direction: Direction,
        ledger: Arc<LedgerQueryClient<R>>,
        gate: Arc<TransactionGate>,
    ) -> Self {
        Self {
            direction,
            ledger,
            gate,
            slot: Arc::new(SyncSlot::new(Arc::from(Vec::new()))),
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn snapshot(&self) -> GiftSnapshot {
        self.slot.snapshot()
    }

    pub fn records(&self) -> Arc<[GiftRecord]> {
        self.slot.snapshot().value
    }

    pub fn subscribe(&self) -> watch::Receiver<GiftSnapshot> {
        self.slot.subscribe()
    }

    pub fn updates(&self) -> WatchStream<GiftSnapshot> {
        self.slot.updates()
    }

    /// Whether claim/cancel controls should be disabled.
    pub fn actions_disabled(&self) -> bool {
        self.gate.is_busy()
    }

    /// Start a resync for `trigger`; superseded results are dropped.
    pub fn request_sync(&self, trigger: SyncTrigger) -> JoinHandle<()> {
        let generation = self.slot.begin();
        let view = self.clone();
        tokio::spawn(async move {
            let records: Vec<GiftRecord> = match trigger.active_account() {
                Some(account) => load_gifts(&view.ledger, view.direction, account).await,
                None => Vec::new(),
            };
            let count = records.len();
            if view.slot.complete(generation, Arc::from(records)) {
                debug!(direction = %view.direction, generation, count, "gift list synced");
            } else {
                debug!(direction = %view.direction, generation, "discarding stale gift list");
            }
        })
    }

    /// Resync on every trigger until the trigger sources go away.
    pub async fn run(self, mut triggers: TriggerWatcher) {
        while let Some(trigger) = triggers.next().await {
            self.request_sync(trigger);
        }
    }

    pub fn spawn(&self, triggers: TriggerWatcher) -> JoinHandle<()> {
        tokio::spawn(self.clone().run(triggers))
    }

    /// Claim the gift sent by `sender`. Release time is not checked here;
    /// the ledger rejects early claims.
    pub async fn claim(&self, sender: &Address) -> Result<SubmittedTransaction, ViewError> {
        self.require(Direction::Received, "claim")?;
        Ok(self.gate.claim_gift(sender).await?)
    }

    /// Cancel the gift sent to `recipient` after `confirm` approves it.
    /// Returns `Ok(None)` when the user declines.
    pub async fn cancel(
        &self,
        recipient: &Address,
        confirm: impl FnOnce(&CancelPrompt) -> bool,
    ) -> Result<Option<SubmittedTransaction>, ViewError> {
        self.require(Direction::Sent, "cancel")?;

        let prompt = CancelPrompt {
            recipient: recipient.clone(),
            amount: self
                .records()
                .iter()
                .find(|gift| &gift.counterparty == recipient)
                .map(|gift| gift.amount),
        };
        if !confirm(&prompt) {
            debug!(recipient = %recipient, "cancel declined");
            return Ok(None);
        }

        Ok(Some(self.gate.cancel_gift(recipient).await?))
    }

    fn require(&self, direction: Direction, action: &'static str) -> Result<(), ViewError> {
        if self.direction != direction {
            return Err(ViewError::WrongDirection {
                action,
                direction: self.direction,
            });
        }
        Ok(())
    }
}

/// Coin balance of the connected account; `None` while disconnected.
pub struct BalanceView<R> {
    ledger: Arc<LedgerQueryClient<R>>,
    slot: SharedSlot<Option<Amount>>,
}

impl<R> Clone for BalanceView<R> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<R: LedgerReader> BalanceView<R> {
    pub fn new(ledger: Arc<LedgerQueryClient<R>>) -> Self {
        Self {
            ledger,
            slot: Arc::new(SyncSlot::new(None)),
        }
    }

    pub fn snapshot(&self) -> BalanceSnapshot {
        self.slot.snapshot()
    }

    pub fn balance(&self) -> Option<Amount> {
        self.slot.snapshot().value
    }

    pub fn subscribe(&self) -> watch::Receiver<BalanceSnapshot> {
        self.slot.subscribe()
    }

    pub fn request_sync(&self, trigger: SyncTrigger) -> JoinHandle<()> {
        let generation = self.slot.begin();
        let view = self.clone();
        tokio::spawn(async move {
            let balance = match trigger.active_account() {
                Some(account) => Some(view.ledger.balance(account).await),
                None => None,
            };
            if !view.slot.complete(generation, balance) {
                debug!(generation, "discarding stale balance");
            }
        })
    }

    pub async fn run(self, mut triggers: TriggerWatcher) {
        while let Some(trigger) = triggers.next().await {
            self.request_sync(trigger);
        }
    }

    pub fn spawn(&self, triggers: TriggerWatcher) -> JoinHandle<()> {
        tokio::spawn(self.clone().run(triggers))
    }
}
