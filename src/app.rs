//! Wiring of one wallet session, one lock and all views.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::Config;
use crate::gate::{TransactionGate, TransactionLock};
use crate::ledger::{LedgerQueryClient, LedgerReader};
use crate::model::Direction;
use crate::sync::TriggerWatcher;
use crate::view::{BalanceView, GiftListView};
use crate::wallet::{WalletSession, WalletSigner};

/// Everything a page session needs: the sent and received gift lists and
/// the balance, all driven by the same session and lock.
pub struct GiftDashboard<R> {
    session: WalletSession,
    gate: Arc<TransactionGate>,
    pub sent: GiftListView<R>,
    pub received: GiftListView<R>,
    pub balance: BalanceView<R>,
}

impl<R: LedgerReader> GiftDashboard<R> {
    pub fn new(config: &Config, reader: R, signer: Arc<dyn WalletSigner>) -> Self {
        let session = WalletSession::new();
        let lock = TransactionLock::new();
        let ledger = Arc::new(LedgerQueryClient::from_config(reader, config));
        let gate = Arc::new(TransactionGate::new(
            lock,
            signer,
            config.module.clone(),
            config.settle_delay,
        ));

        Self {
            sent: GiftListView::new(Direction::Sent, Arc::clone(&ledger), Arc::clone(&gate)),
            received: GiftListView::new(Direction::Received, Arc::clone(&ledger), Arc::clone(&gate)),
            balance: BalanceView::new(ledger),
            session,
            gate,
        }
    }

    pub fn session(&self) -> &WalletSession {
        &self.session
    }

    pub fn gate(&self) -> &TransactionGate {
        &self.gate
    }

    pub fn lock(&self) -> &TransactionLock {
        self.gate.lock()
    }

    /// Start the refresh loops of all three views. They stop once every
    /// handle to the session is dropped.
    pub fn spawn(&self) -> Vec<JoinHandle<()>> {
        let watcher = || TriggerWatcher::new(&self.session, self.gate.lock());
        vec![
            self.sent.spawn(watcher()),
            self.received.spawn(watcher()),
            self.balance.spawn(watcher()),
        ]
    }
}
