//! SQLite persistence module
//!
//! Repository pattern for SQLite database access.

pub mod repos;
pub mod schema;

pub use repos::{
    create_pool, init_schema, LoanRepo, PoolRepo, TransactionRepo, TransferRepo, UserRepo,
};
pub use schema::{LoanRow, PoolRow, PoolSampleRow, TransactionRow, TransferRow, UserRow};
