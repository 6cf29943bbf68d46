//! # Bankbot Core
//!
//! Domain types for the ledger & transfer engine: money helpers, accounts,
//! immutable transactions, the transfer-request state machine, loans, the
//! clock seam, and id generation. This crate is pure data and arithmetic;
//! persistence and orchestration live in `bankbot-persistence` and
//! `bankbot-engine`.

pub mod account;
pub mod clock;
pub mod ids;
pub mod loan;
pub mod money;
pub mod transaction;
pub mod transfer;

pub use account::{UserAccount, SYSTEM_ACCOUNT};
pub use clock::{local_time, Clock, ManualClock, SystemClock};
pub use loan::Loan;
pub use money::{fee_for, interest_on, round_minor, MINOR_UNIT};
pub use transaction::{Transaction, TransactionDetails, TransactionKind};
pub use transfer::{TransferRequest, TransferStatus};
