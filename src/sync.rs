//! Change detection and stale-response protection shared by all views.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::gate::{LockState, TransactionLock};
use crate::model::Address;
use crate::wallet::{WalletSession, WalletState};

/// Everything whose change makes a view refetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTrigger {
    pub account: Option<Address>,
    pub connected: bool,
    pub lock: LockState,
}

impl SyncTrigger {
    pub fn new(wallet: &WalletState, lock: LockState) -> Self {
        Self {
            account: wallet.account.clone(),
            connected: wallet.connected,
            lock,
        }
    }

    /// The account to query for; `None` means "show nothing, query nothing".
    pub fn active_account(&self) -> Option<&Address> {
        if self.connected { self.account.as_ref() } else { None }
    }
}

/// Yields a [`SyncTrigger`] for the current state and then for every
/// distinct change, keeping only the latest value between polls.
pub struct TriggerWatcher {
    wallet: watch::Receiver<WalletState>,
    lock: watch::Receiver<LockState>,
    last: Option<SyncTrigger>,
}

impl TriggerWatcher {
    pub fn new(session: &WalletSession, lock: &TransactionLock) -> Self {
        Self {
            wallet: session.subscribe(),
            lock: lock.subscribe(),
            last: None,
        }
    }

    /// Wait for the next distinct trigger. `None` once a source is gone.
    pub async fn next(&mut self) -> Option<SyncTrigger> {
        loop {
            let trigger = self.current();
            if self.last.as_ref() != Some(&trigger) {
                self.last = Some(trigger.clone());
                return Some(trigger);
            }
            tokio::select! {
                changed = self.wallet.changed() => changed.ok()?,
                changed = self.lock.changed() => changed.ok()?,
            }
        }
    }

    fn current(&mut self) -> SyncTrigger {
        let lock = *self.lock.borrow_and_update();
        let wallet = self.wallet.borrow_and_update();
        SyncTrigger::new(&wallet, lock)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Syncing,
}

/// A view's published value together with its sync status.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub value: T,
    pub state: SyncState,
    /// Generation of the request that produced `value` (0 = initial).
    pub generation: u64,
}

/// Holds the latest applied value and rejects results from superseded
/// requests.
#[derive(Debug)]
pub struct SyncSlot<T> {
    issued: AtomicU64,
    snapshot: watch::Sender<Snapshot<T>>,
}

impl<T: Clone + Send + Sync + 'static> SyncSlot<T> {
    pub fn new(initial: T) -> Self {
        let (snapshot, _) = watch::channel(Snapshot {
            value: initial,
            state: SyncState::Idle,
            generation: 0,
        });
        Self {
            issued: AtomicU64::new(0),
            snapshot,
        }
    }

    /// Issue a new generation and mark the slot as syncing.
    pub fn begin(&self) -> u64 {
        let generation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        self.snapshot.send_if_modified(|snapshot| {
            let was_idle = snapshot.state == SyncState::Idle;
            snapshot.state = SyncState::Syncing;
            was_idle
        });
        generation
    }

    /// Apply `value` if `generation` is still the latest issued.
    pub fn complete(&self, generation: u64, value: T) -> bool {
        self.snapshot.send_if_modified(|snapshot| {
            if generation != self.issued.load(Ordering::SeqCst) {
                return false;
            }
            snapshot.value = value;
            snapshot.state = SyncState::Idle;
            snapshot.generation = generation;
            true
        })
    }

    pub fn snapshot(&self) -> Snapshot<T> {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.snapshot.subscribe()
    }

    pub fn updates(&self) -> WatchStream<Snapshot<T>> {
        WatchStream::new(self.subscribe())
    }
}

/// Shared handle type used by the views.
pub type SharedSlot<T> = Arc<SyncSlot<T>>;
