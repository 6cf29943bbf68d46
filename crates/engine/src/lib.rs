//! # Bankbot Engine
//!
//! The ledger & transfer engine: balances and the shared liquidity pool,
//! the transfer confirmation workflow, the daily-gift cooldown, wager
//! settlement, and loans. Every operation validates against current state,
//! mutates balances/pool and appends to the transaction log in one atomic
//! unit, and returns a typed result for the front-end to render.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bankbot_engine::{Engine, EngineConfig};
//! use bankbot_persistence::Database;
//!
//! let db = Database::init("sqlite://data/bankbot.db").await?;
//! let engine = Engine::new(&db, EngineConfig::default());
//!
//! let request = engine.transfers().propose(sender, recipient, amount).await?;
//! let settled = engine.transfers().confirm(&request.id, sender).await?;
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod gift;
pub mod ledger;
pub mod loan;
pub mod transfer;
pub mod wager;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::EngineConfig;
pub use context::ServiceContext;
pub use error::{EngineError, EngineResult};
pub use gift::{GiftClaim, GiftService};
pub use ledger::Ledger;
pub use loan::{LoanService, Repayment};
pub use transfer::{SettledTransfer, TransferService};
pub use wager::{WagerOutcome, WagerService};

use bankbot_core::Clock;
use bankbot_persistence::Database;
use std::sync::Arc;

/// Engine facade - one per process, services borrowed per call.
pub struct Engine {
    ctx: ServiceContext,
}

impl Engine {
    pub fn new(db: &Database, config: EngineConfig) -> Self {
        Self {
            ctx: ServiceContext::new(db, config),
        }
    }

    /// Engine with an injected clock and optional RNG seed (tests,
    /// deterministic replays).
    pub fn with_clock_and_seed(
        db: &Database,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
        rng_seed: Option<u64>,
    ) -> Self {
        Self {
            ctx: ServiceContext::with_clock_and_seed(db, config, clock, rng_seed),
        }
    }

    pub fn context(&self) -> &ServiceContext {
        &self.ctx
    }

    pub fn ledger(&self) -> Ledger<'_> {
        Ledger::new(&self.ctx)
    }

    pub fn transfers(&self) -> TransferService<'_> {
        TransferService::new(&self.ctx)
    }

    pub fn gifts(&self) -> GiftService<'_> {
        GiftService::new(&self.ctx)
    }

    pub fn wagers(&self) -> WagerService<'_> {
        WagerService::new(&self.ctx)
    }

    pub fn loans(&self) -> LoanService<'_> {
        LoanService::new(&self.ctx)
    }
}
