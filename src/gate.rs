//! Single-flight coordination of mutating ledger calls.
//!
//! A [`TransactionLock`] is shared by every view. The [`TransactionGate`]
//! acquires it before a payload reaches the wallet and releases it once the
//! call has failed, or succeeded and the settle delay has elapsed. A second
//! mutation while the lock is held is rejected, never queued.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::Amount;
use crate::config::GiftModule;
use crate::model::Address;
use crate::wallet::{EntryFunctionPayload, SignerError, SubmittedTransaction, WalletSigner};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GateError {
    #[error("another transaction is already in progress")]
    Busy,
    #[error("transaction failed: {0}")]
    Signer(#[from] SignerError),
}

/// Current lock value. `epoch` increases on every transition, so a
/// subscriber that only sees the latest value still notices a round trip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LockState {
    pub busy: bool,
    pub epoch: u64,
}

/// Shared busy flag. Cloning yields another handle to the same cell.
#[derive(Debug, Clone)]
pub struct TransactionLock {
    state: Arc<watch::Sender<LockState>>,
}

impl TransactionLock {
    pub fn new() -> Self {
        let (state, _) = watch::channel(LockState::default());
        Self {
            state: Arc::new(state),
        }
    }

    /// Set the flag. Returns `false` without side effects if already set.
    pub fn acquire(&self) -> bool {
        self.state.send_if_modified(|state| {
            if state.busy {
                return false;
            }
            state.busy = true;
            state.epoch += 1;
            true
        })
    }

    /// Clear the flag. No-op when not set.
    pub fn release(&self) {
        self.state.send_if_modified(|state| {
            if !state.busy {
                return false;
            }
            state.busy = false;
            state.epoch += 1;
            true
        });
    }

    pub fn is_busy(&self) -> bool {
        self.state.borrow().busy
    }

    pub fn state(&self) -> LockState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LockState> {
        self.state.subscribe()
    }
}

impl Default for TransactionLock {
    fn default() -> Self {
        Self::new()
    }
}

/// Proof of a held lock; releases it when dropped.
#[derive(Debug)]
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct MutationGuard {
    lock: TransactionLock,
}

impl MutationGuard {
    /// Release now. Same as dropping the guard.
    pub fn end(self) {}
}

impl Drop for MutationGuard {
    fn drop(&mut self) {
        self.lock.release();
    }
}

/// Wraps the wallet signer with lock discipline.
pub struct TransactionGate {
    lock: TransactionLock,
    signer: Arc<dyn WalletSigner>,
    module: GiftModule,
    settle_delay: Duration,
}

impl TransactionGate {
    pub fn new(
        lock: TransactionLock,
        signer: Arc<dyn WalletSigner>,
        module: GiftModule,
        settle_delay: Duration,
    ) -> Self {
        Self {
            lock,
            signer,
            module,
            settle_delay,
        }
    }

    pub fn lock(&self) -> &TransactionLock {
        &self.lock
    }

    /// Whether mutation controls should currently be disabled.
    pub fn is_busy(&self) -> bool {
        self.lock.is_busy()
    }

    pub fn begin_mutation(&self) -> Result<MutationGuard, GateError> {
        if !self.lock.acquire() {
            return Err(GateError::Busy);
        }
        Ok(MutationGuard {
            lock: self.lock.clone(),
        })
    }

    /// Sign and submit `payload` while holding the lock.
    ///
    /// On success the lock stays held for the settle delay so the read path
    /// can observe the write before views resynchronize. On failure it is
    /// released immediately since nothing changed on the ledger.
    pub async fn submit(
        &self,
        payload: EntryFunctionPayload,
    ) -> Result<SubmittedTransaction, GateError> {
        let guard = self.begin_mutation()?;

        match self.signer.sign_and_submit(&payload).await {
            Ok(submitted) => {
                info!(function = %payload.function, hash = %submitted.hash, "transaction submitted");
                if !self.settle_delay.is_zero() {
                    tokio::time::sleep(self.settle_delay).await;
                }
                guard.end();
                Ok(submitted)
            }
            Err(e) => {
                warn!(function = %payload.function, reason = %e, "transaction failed");
                guard.end();
                Err(e.into())
            }
        }
    }

    pub fn send_payload(
        &self,
        recipient: &Address,
        amount: Amount,
        release_timestamp: u64,
    ) -> EntryFunctionPayload {
        EntryFunctionPayload::new(
            self.module.function(GiftModule::ADD_GIFT),
            vec![
                recipient.to_string(),
                amount.base_units().to_string(),
                release_timestamp.to_string(),
            ],
        )
    }

    pub fn claim_payload(&self, sender: &Address) -> EntryFunctionPayload {
        EntryFunctionPayload::new(
            self.module.function(GiftModule::CLAIM_GIFT),
            vec![sender.to_string()],
        )
    }

    pub fn cancel_payload(&self, recipient: &Address) -> EntryFunctionPayload {
        EntryFunctionPayload::new(
            self.module.function(GiftModule::REMOVE_GIFT),
            vec![recipient.to_string()],
        )
    }

    pub async fn send_gift(
        &self,
        recipient: &Address,
        amount: Amount,
        release_timestamp: u64,
    ) -> Result<SubmittedTransaction, GateError> {
        self.submit(self.send_payload(recipient, amount, release_timestamp))
            .await
    }

    pub async fn claim_gift(&self, sender: &Address) -> Result<SubmittedTransaction, GateError> {
        self.submit(self.claim_payload(sender)).await
    }

    pub async fn cancel_gift(&self, recipient: &Address) -> Result<SubmittedTransaction, GateError> {
        self.submit(self.cancel_payload(recipient)).await
    }
}
