//! The wallet boundary: observable connection state and transaction signing.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;

use crate::model::Address;

/// An entry-function call to be signed and submitted by the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryFunctionPayload {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<String>,
}

impl EntryFunctionPayload {
    pub const KIND: &'static str = "entry_function_payload";

    pub fn new(function: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            kind: Self::KIND,
            function: function.into(),
            type_arguments: Vec::new(),
            arguments,
        }
    }
}

/// Receipt for a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedTransaction {
    pub hash: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignerError {
    #[error("user rejected the request")]
    UserRejected,
    #[error("ledger rejected the transaction: {0}")]
    LedgerRejected(String),
    #[error("wallet unreachable: {0}")]
    Transport(String),
}

/// Signs and submits mutating calls on behalf of the connected account.
#[async_trait]
pub trait WalletSigner: Send + Sync + 'static {
    async fn sign_and_submit(
        &self,
        payload: &EntryFunctionPayload,
    ) -> Result<SubmittedTransaction, SignerError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletReadyState {
    Installed,
    NotDetected,
    Loadable,
}

/// A wallet the connection UI may offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletDescriptor {
    pub name: String,
    pub url: String,
    pub ready_state: WalletReadyState,
}

impl WalletDescriptor {
    /// Installed wallets can be connected; the rest can only be installed.
    pub fn can_connect(&self) -> bool {
        self.ready_state == WalletReadyState::Installed
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletState {
    pub account: Option<Address>,
    pub connected: bool,
}

impl WalletState {
    /// The account to query for, if connected.
    pub fn active_account(&self) -> Option<&Address> {
        if self.connected { self.account.as_ref() } else { None }
    }
}

/// Shared, observable wallet connection state.
///
/// Cloning yields another handle to the same state.
#[derive(Debug, Clone)]
pub struct WalletSession {
    state: Arc<watch::Sender<WalletState>>,
    wallets: Arc<RwLock<Vec<WalletDescriptor>>>,
}

impl WalletSession {
    pub fn new() -> Self {
        let (state, _) = watch::channel(WalletState::default());
        Self {
            state: Arc::new(state),
            wallets: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn connect(&self, account: Address) {
        self.update(WalletState {
            account: Some(account),
            connected: true,
        });
    }

    pub fn switch_account(&self, account: Address) {
        let connected = self.state.borrow().connected;
        self.update(WalletState {
            account: Some(account),
            connected,
        });
    }

    pub fn disconnect(&self) {
        self.update(WalletState::default());
    }

    pub fn state(&self) -> WalletState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WalletState> {
        self.state.subscribe()
    }

    pub fn wallets(&self) -> Vec<WalletDescriptor> {
        self.wallets.read().map(|w| w.clone()).unwrap_or_default()
    }

    pub fn set_wallets(&self, wallets: Vec<WalletDescriptor>) {
        if let Ok(mut guard) = self.wallets.write() {
            *guard = wallets;
        }
    }

    fn update(&self, next: WalletState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}

impl Default for WalletSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    #[test]
    fn payload_serializes_with_type_tag() {
        let payload = EntryFunctionPayload::new("0x1::m::claim", vec!["0xA".into()]);
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({
                "type": "entry_function_payload",
                "function": "0x1::m::claim",
                "type_arguments": [],
                "arguments": ["0xA"],
            })
        );
    }

    #[test]
    fn session_starts_disconnected() {
        let session = WalletSession::new();
        assert_eq!(session.state(), WalletState::default());
        assert!(session.state().active_account().is_none());
    }

    #[test]
    fn connect_and_disconnect() {
        let session = WalletSession::new();
        session.connect(addr("0x1"));
        assert_eq!(session.state().active_account(), Some(&addr("0x1")));

        session.disconnect();
        assert!(!session.state().connected);
        assert!(session.state().account.is_none());
    }

    #[test]
    fn switch_account_keeps_connection_flag() {
        let session = WalletSession::new();
        session.switch_account(addr("0x2"));
        assert!(session.state().active_account().is_none());

        session.connect(addr("0x1"));
        session.switch_account(addr("0x2"));
        assert_eq!(session.state().active_account(), Some(&addr("0x2")));
    }

    #[test]
    fn unchanged_updates_do_not_notify() {
        let session = WalletSession::new();
        session.connect(addr("0x1"));
        let mut rx = session.subscribe();
        rx.borrow_and_update();

        session.connect(addr("0x1"));
        assert!(!rx.has_changed().unwrap());

        session.disconnect();
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn wallet_descriptors() {
        let session = WalletSession::new();
        session.set_wallets(vec![
            WalletDescriptor {
                name: "Petra".into(),
                url: "https://petra.app".into(),
                ready_state: WalletReadyState::Installed,
            },
            WalletDescriptor {
                name: "Martian".into(),
                url: "https://martianwallet.xyz".into(),
                ready_state: WalletReadyState::NotDetected,
            },
        ]);
        let connectable: Vec<_> = session
            .wallets()
            .into_iter()
            .filter(WalletDescriptor::can_connect)
            .map(|w| w.name)
            .collect();
        assert_eq!(connectable, vec!["Petra".to_string()]);
    }
}
