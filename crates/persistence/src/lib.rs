//! # Bankbot Persistence
//!
//! SQLite-backed store for the ledger: user balances, the write-once
//! transaction log, transfer requests, loans, and the liquidity pool with
//! its history samples.
//!
//! The store offers per-key read-modify-write through sqlx transactions;
//! the engine composes repo calls inside one transaction per mutating
//! operation so no partial commit is possible.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bankbot_persistence::{Database, UserRepo};
//!
//! let db = Database::init("sqlite://data/bankbot.db").await?;
//! let balance = UserRepo::balance(db.pool(), user_id).await?;
//! ```

pub mod error;
pub mod sqlite;

pub use error::{StoreError, StoreResult};
pub use sqlite::{
    create_pool, init_schema, LoanRepo, LoanRow, PoolRepo, PoolRow, PoolSampleRow,
    TransactionRepo, TransactionRow, TransferRepo, TransferRow, UserRepo, UserRow,
};

use sqlx::SqlitePool;

/// Database facade - owns the connection pool.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to an existing database.
    pub async fn connect(db_url: &str) -> StoreResult<Self> {
        let pool = create_pool(db_url).await?;
        Ok(Self { pool })
    }

    /// Connect and create the schema when missing. Idempotent.
    pub async fn init(db_url: &str) -> StoreResult<Self> {
        let db = Self::connect(db_url).await?;
        init_schema(&db.pool).await?;
        Ok(db)
    }

    /// Get the SQLite connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
