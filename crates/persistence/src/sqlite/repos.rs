//! Repository implementations for SQLite
//!
//! Static repo structs in the repository pattern. Every method is generic
//! over the executor so the same call works against the pool for reads and
//! against an open transaction for the engine's atomic mutations.

use crate::error::{StoreError, StoreResult};
use crate::sqlite::schema::*;
use bankbot_core::{Loan, Transaction, TransferRequest, TransferStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::{Executor, Sqlite};
use std::str::FromStr;
use std::time::Duration;

// ============================================================================
// User Repository
// ============================================================================

/// Repository for the `users` table
pub struct UserRepo;

impl UserRepo {
    /// Fetch a user row; `None` for accounts that never had a mutation.
    pub async fn get<'e, E>(exec: E, user_id: i64) -> StoreResult<Option<UserRow>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT user_id, balance, last_gift_at FROM users WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(exec)
        .await?;
        Ok(row)
    }

    /// Current balance, zero for unknown users.
    pub async fn balance<'e, E>(exec: E, user_id: i64) -> StoreResult<Decimal>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        match Self::get(exec, user_id).await? {
            Some(row) => parse_decimal(&row.balance),
            None => Ok(Decimal::ZERO),
        }
    }

    /// Write a user's balance, creating the account row on first use.
    pub async fn upsert_balance<'e, E>(exec: E, user_id: i64, balance: Decimal) -> StoreResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO users (user_id, balance) VALUES (?, ?)
            ON CONFLICT(user_id) DO UPDATE SET balance = excluded.balance
            "#,
        )
        .bind(user_id)
        .bind(balance.to_string())
        .execute(exec)
        .await?;
        Ok(())
    }

    /// Stamp the last daily-gift claim time.
    pub async fn stamp_gift<'e, E>(exec: E, user_id: i64, at: DateTime<Utc>) -> StoreResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO users (user_id, balance, last_gift_at) VALUES (?, '0', ?)
            ON CONFLICT(user_id) DO UPDATE SET last_gift_at = excluded.last_gift_at
            "#,
        )
        .bind(user_id)
        .bind(at)
        .execute(exec)
        .await?;
        Ok(())
    }

    /// Sum of all balances. Reporting only, never a correctness gate.
    pub async fn total_balance<'e, E>(exec: E) -> StoreResult<Decimal>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let balances: Vec<(String,)> = sqlx::query_as("SELECT balance FROM users")
            .fetch_all(exec)
            .await?;
        let mut total = Decimal::ZERO;
        for (balance,) in balances {
            total += parse_decimal(&balance)?;
        }
        Ok(total)
    }
}

// ============================================================================
// Transaction Repository (write-once)
// ============================================================================

/// Repository for the `transactions` table. Append and read only; the log
/// is an immutable audit trail, so no update or delete exists here.
pub struct TransactionRepo;

impl TransactionRepo {
    /// Append one immutable record.
    pub async fn append<'e, E>(exec: E, tx: &Transaction) -> StoreResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let details = serde_json::to_string(&tx.details)?;
        sqlx::query(
            r#"
            INSERT INTO transactions (id, owner_id, kind, amount, details, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&tx.id)
        .bind(tx.owner_id)
        .bind(tx.kind.as_str())
        .bind(tx.amount.to_string())
        .bind(details)
        .bind(tx.created_at)
        .execute(exec)
        .await?;
        Ok(())
    }

    /// Full history for one owner, insertion order ascending.
    pub async fn history_for<'e, E>(exec: E, owner_id: i64) -> StoreResult<Vec<Transaction>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query_as::<_, TransactionRow>(
            "SELECT seq, id, owner_id, kind, amount, details, created_at
             FROM transactions WHERE owner_id = ? ORDER BY seq ASC",
        )
        .bind(owner_id)
        .fetch_all(exec)
        .await?;
        rows.into_iter().map(|r| r.into_transaction()).collect()
    }

    pub async fn get_by_id<'e, E>(exec: E, id: &str) -> StoreResult<Transaction>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query_as::<_, TransactionRow>(
            "SELECT seq, id, owner_id, kind, amount, details, created_at
             FROM transactions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(exec)
        .await?
        .ok_or_else(|| StoreError::not_found("Transaction", id))?;
        row.into_transaction()
    }

    pub async fn count<'e, E>(exec: E) -> StoreResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transactions")
            .fetch_one(exec)
            .await?;
        Ok(row.0)
    }
}

// ============================================================================
// Transfer Repository
// ============================================================================

/// Repository for the `transfers` table
pub struct TransferRepo;

impl TransferRepo {
    pub async fn insert<'e, E>(exec: E, request: &TransferRequest) -> StoreResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO transfers (id, sender_id, recipient_id, amount, fee, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&request.id)
        .bind(request.sender_id)
        .bind(request.recipient_id)
        .bind(request.amount.to_string())
        .bind(request.fee.to_string())
        .bind(request.status.as_str())
        .bind(request.created_at)
        .execute(exec)
        .await?;
        Ok(())
    }

    pub async fn get<'e, E>(exec: E, id: &str) -> StoreResult<Option<TransferRequest>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query_as::<_, TransferRow>(
            "SELECT id, sender_id, recipient_id, amount, fee, status, created_at
             FROM transfers WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(exec)
        .await?;
        row.map(|r| r.into_request()).transpose()
    }

    /// Compare-and-set from `pending` to a terminal status.
    ///
    /// Returns `false` when the request was already terminal (or absent), so
    /// exactly one caller wins the transition.
    pub async fn close<'e, E>(exec: E, id: &str, to: TransferStatus) -> StoreResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "UPDATE transfers SET status = ? WHERE id = ? AND status = 'pending'",
        )
        .bind(to.as_str())
        .bind(id)
        .execute(exec)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

// ============================================================================
// Loan Repository
// ============================================================================

/// Repository for the `loans` table
pub struct LoanRepo;

impl LoanRepo {
    pub async fn insert<'e, E>(exec: E, loan: &Loan) -> StoreResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO loans (id, borrower_id, principal, interest, total_due, paid, issued_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&loan.id)
        .bind(loan.borrower_id)
        .bind(loan.principal.to_string())
        .bind(loan.interest.to_string())
        .bind(loan.total_due.to_string())
        .bind(loan.paid)
        .bind(loan.issued_at)
        .execute(exec)
        .await?;
        Ok(())
    }

    /// Fetch an unpaid loan owned by `borrower_id`.
    pub async fn get_unpaid<'e, E>(exec: E, id: &str, borrower_id: i64) -> StoreResult<Option<Loan>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query_as::<_, LoanRow>(
            "SELECT id, borrower_id, principal, interest, total_due, paid, issued_at
             FROM loans WHERE id = ? AND borrower_id = ? AND paid = 0",
        )
        .bind(id)
        .bind(borrower_id)
        .fetch_optional(exec)
        .await?;
        row.map(|r| r.into_loan()).transpose()
    }

    /// Compare-and-set `paid` from false to true; `false` when already paid.
    pub async fn mark_paid<'e, E>(exec: E, id: &str, borrower_id: i64) -> StoreResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "UPDATE loans SET paid = 1 WHERE id = ? AND borrower_id = ? AND paid = 0",
        )
        .bind(id)
        .bind(borrower_id)
        .execute(exec)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// All unpaid loans of one borrower, oldest first.
    pub async fn outstanding_for<'e, E>(exec: E, borrower_id: i64) -> StoreResult<Vec<Loan>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query_as::<_, LoanRow>(
            "SELECT id, borrower_id, principal, interest, total_due, paid, issued_at
             FROM loans WHERE borrower_id = ? AND paid = 0 ORDER BY issued_at ASC",
        )
        .bind(borrower_id)
        .fetch_all(exec)
        .await?;
        rows.into_iter().map(|r| r.into_loan()).collect()
    }
}

// ============================================================================
// Pool Repository
// ============================================================================

/// Repository for the singleton `pool` row and its history samples
pub struct PoolRepo;

impl PoolRepo {
    /// Current pool amount, zero before the first adjustment.
    pub async fn amount<'e, E>(exec: E) -> StoreResult<Decimal>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query_as::<_, PoolRow>("SELECT id, amount FROM pool WHERE id = 1")
            .fetch_optional(exec)
            .await?;
        match row {
            Some(row) => parse_decimal(&row.amount),
            None => Ok(Decimal::ZERO),
        }
    }

    pub async fn set_amount<'e, E>(exec: E, amount: Decimal) -> StoreResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO pool (id, amount) VALUES (1, ?)
            ON CONFLICT(id) DO UPDATE SET amount = excluded.amount
            "#,
        )
        .bind(amount.to_string())
        .execute(exec)
        .await?;
        Ok(())
    }

    /// Record one history sample; `amount_after` is the pool right after the
    /// delta was applied.
    pub async fn add_sample<'e, E>(
        exec: E,
        delta: Decimal,
        amount_after: Decimal,
        at: DateTime<Utc>,
    ) -> StoreResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            "INSERT INTO pool_history (delta, amount_after, created_at) VALUES (?, ?, ?)",
        )
        .bind(delta.to_string())
        .bind(amount_after.to_string())
        .bind(at)
        .execute(exec)
        .await?;
        Ok(())
    }

    /// Pool amount at or before `cutoff`, from the newest qualifying sample.
    pub async fn amount_at_or_before<'e, E>(
        exec: E,
        cutoff: DateTime<Utc>,
    ) -> StoreResult<Option<Decimal>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query_as::<_, PoolSampleRow>(
            "SELECT seq, delta, amount_after, created_at FROM pool_history
             WHERE created_at <= ? ORDER BY seq DESC LIMIT 1",
        )
        .bind(cutoff)
        .fetch_optional(exec)
        .await?;
        row.map(|r| parse_decimal(&r.amount_after)).transpose()
    }

    /// Most recent samples, newest first.
    pub async fn recent_samples<'e, E>(exec: E, limit: i64) -> StoreResult<Vec<PoolSampleRow>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query_as::<_, PoolSampleRow>(
            "SELECT seq, delta, amount_after, created_at FROM pool_history
             ORDER BY seq DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(exec)
        .await?;
        Ok(rows)
    }
}

// ============================================================================
// Database initialization
// ============================================================================

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    user_id      INTEGER PRIMARY KEY,
    balance      TEXT NOT NULL DEFAULT '0',
    last_gift_at TEXT
);

CREATE TABLE IF NOT EXISTS transactions (
    seq        INTEGER PRIMARY KEY AUTOINCREMENT,
    id         TEXT NOT NULL UNIQUE,
    owner_id   INTEGER NOT NULL,
    kind       TEXT NOT NULL,
    amount     TEXT NOT NULL,
    details    TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_transactions_owner ON transactions(owner_id, seq);

CREATE TABLE IF NOT EXISTS transfers (
    id           TEXT PRIMARY KEY,
    sender_id    INTEGER NOT NULL,
    recipient_id INTEGER NOT NULL,
    amount       TEXT NOT NULL,
    fee          TEXT NOT NULL,
    status       TEXT NOT NULL,
    created_at   TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_transfers_sender ON transfers(sender_id, status);

CREATE TABLE IF NOT EXISTS loans (
    id          TEXT PRIMARY KEY,
    borrower_id INTEGER NOT NULL,
    principal   TEXT NOT NULL,
    interest    TEXT NOT NULL,
    total_due   TEXT NOT NULL,
    paid        INTEGER NOT NULL DEFAULT 0,
    issued_at   TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_loans_borrower ON loans(borrower_id, paid);

CREATE TABLE IF NOT EXISTS pool (
    id     INTEGER PRIMARY KEY CHECK (id = 1),
    amount TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS pool_history (
    seq          INTEGER PRIMARY KEY AUTOINCREMENT,
    delta        TEXT NOT NULL,
    amount_after TEXT NOT NULL,
    created_at   TEXT NOT NULL
);
"#;

/// Open a connection pool, creating the database file when missing.
pub async fn create_pool(database_url: &str) -> StoreResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5));
    let pool = SqlitePool::connect_with(options).await?;
    Ok(pool)
}

/// Create all tables and indexes. Idempotent.
pub async fn init_schema(pool: &SqlitePool) -> StoreResult<()> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bankbot_core::{ids, Transaction, TransactionDetails, TransactionKind};
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    async fn test_pool() -> (TempDir, SqlitePool) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("test.db").display());
        let pool = create_pool(&url).await.unwrap();
        init_schema(&pool).await.unwrap();
        (dir, pool)
    }

    #[tokio::test]
    async fn test_user_upsert_and_balance() {
        let (_dir, pool) = test_pool().await;

        assert_eq!(UserRepo::balance(&pool, 42).await.unwrap(), Decimal::ZERO);

        UserRepo::upsert_balance(&pool, 42, dec!(12.34)).await.unwrap();
        assert_eq!(UserRepo::balance(&pool, 42).await.unwrap(), dec!(12.34));

        UserRepo::upsert_balance(&pool, 42, dec!(0.01)).await.unwrap();
        assert_eq!(UserRepo::balance(&pool, 42).await.unwrap(), dec!(0.01));
    }

    #[tokio::test]
    async fn test_stamp_gift_preserves_balance() {
        let (_dir, pool) = test_pool().await;

        UserRepo::upsert_balance(&pool, 7, dec!(5)).await.unwrap();
        UserRepo::stamp_gift(&pool, 7, Utc::now()).await.unwrap();

        let row = UserRepo::get(&pool, 7).await.unwrap().unwrap();
        assert_eq!(parse_decimal(&row.balance).unwrap(), dec!(5));
        assert!(row.last_gift_at.is_some());
    }

    #[tokio::test]
    async fn test_history_preserves_insertion_order() {
        let (_dir, pool) = test_pool().await;
        let at = Utc::now();

        for amount in [dec!(1), dec!(-2), dec!(3)] {
            let tx = Transaction::new(
                &ids::transaction_id(),
                9,
                TransactionKind::DailyGift,
                amount,
                TransactionDetails::new(),
                at,
            );
            TransactionRepo::append(&pool, &tx).await.unwrap();
        }

        let history = TransactionRepo::history_for(&pool, 9).await.unwrap();
        let amounts: Vec<_> = history.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![dec!(1), dec!(-2), dec!(3)]);
    }

    #[tokio::test]
    async fn test_transfer_close_is_exactly_once() {
        let (_dir, pool) = test_pool().await;
        let request =
            TransferRequest::new(&ids::transfer_id(), 1, 2, dec!(10), dec!(0.20), Utc::now());
        TransferRepo::insert(&pool, &request).await.unwrap();

        assert!(TransferRepo::close(&pool, &request.id, TransferStatus::Settled)
            .await
            .unwrap());
        // Second close loses the race
        assert!(!TransferRepo::close(&pool, &request.id, TransferStatus::Cancelled)
            .await
            .unwrap());

        let stored = TransferRepo::get(&pool, &request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TransferStatus::Settled);
    }

    #[tokio::test]
    async fn test_loan_mark_paid_once() {
        let (_dir, pool) = test_pool().await;
        let loan = Loan::new(&ids::loan_id(), 3, dec!(25), dec!(6.25), Utc::now());
        LoanRepo::insert(&pool, &loan).await.unwrap();

        assert!(LoanRepo::get_unpaid(&pool, &loan.id, 3).await.unwrap().is_some());
        assert!(LoanRepo::mark_paid(&pool, &loan.id, 3).await.unwrap());
        assert!(!LoanRepo::mark_paid(&pool, &loan.id, 3).await.unwrap());
        assert!(LoanRepo::get_unpaid(&pool, &loan.id, 3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pool_amount_and_history() {
        let (_dir, pool) = test_pool().await;
        let at = Utc::now();

        assert_eq!(PoolRepo::amount(&pool).await.unwrap(), Decimal::ZERO);

        PoolRepo::set_amount(&pool, dec!(10)).await.unwrap();
        PoolRepo::add_sample(&pool, dec!(10), dec!(10), at).await.unwrap();
        PoolRepo::set_amount(&pool, dec!(7)).await.unwrap();
        PoolRepo::add_sample(&pool, dec!(-3), dec!(7), at).await.unwrap();

        assert_eq!(PoolRepo::amount(&pool).await.unwrap(), dec!(7));
        assert_eq!(
            PoolRepo::amount_at_or_before(&pool, at).await.unwrap(),
            Some(dec!(7))
        );

        let samples = PoolRepo::recent_samples(&pool, 10).await.unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].delta, "-3");
    }
}
