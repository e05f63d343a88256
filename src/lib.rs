pub mod amount;
pub mod app;
pub mod config;
pub mod csv;
pub mod gate;
pub mod ledger;
pub mod mapper;
pub mod model;
pub mod sync;
pub mod view;
pub mod wallet;

pub use amount::{Amount, AmountError};
pub use app::GiftDashboard;
pub use config::Config;
pub use gate::{GateError, TransactionGate, TransactionLock};
pub use ledger::{HttpLedger, LedgerQueryClient, LedgerReader};
pub use mapper::{RawGiftColumns, map_gifts};
pub use model::{Address, Direction, GiftRecord};
pub use view::{BalanceView, GiftListView};
pub use wallet::{WalletSession, WalletSigner};
