//! Balance, history, and pool reporting commands.

use crate::db;
use crate::PoolAction;
use anyhow::Result;
use bankbot_core::local_time;
use std::path::Path;

pub async fn balance(db_path: &Path, user_id: i64) -> Result<()> {
    let engine = db::open_engine(db_path).await?;
    let balance = engine.ledger().balance_of(user_id).await?;
    println!("User {user_id}: {balance}");
    Ok(())
}

pub async fn history(db_path: &Path, user_id: i64) -> Result<()> {
    let engine = db::open_engine(db_path).await?;
    let history = engine.ledger().history_for(user_id).await?;

    if history.is_empty() {
        println!("No transactions for user {user_id}.");
        return Ok(());
    }

    for tx in history {
        let when = local_time(tx.created_at).format("%Y-%m-%d %H:%M:%S");
        let mut extra = String::new();
        if let Some(counterparty) = tx.details.counterparty {
            extra = format!(" (with {counterparty})");
        } else if let Some(loan_id) = &tx.details.loan_id {
            extra = format!(" (loan {loan_id})");
        }
        println!("{when}  {:<15} {:>12}{extra}", tx.kind.as_str(), tx.amount);
    }
    Ok(())
}

pub async fn pool(db_path: &Path, action: PoolAction) -> Result<()> {
    let engine = db::open_engine(db_path).await?;

    match action {
        PoolAction::Status => {
            let ledger = engine.ledger();
            println!("Pool liquidity:      {}", ledger.pool_amount().await?);
            println!("Total user balance:  {}", ledger.total_user_balance().await?);
            println!("Change (last hour):  {}%", ledger.pool_hourly_change().await?);
        }
        PoolAction::Fund { amount } => {
            let pool = engine.ledger().fund_pool(amount).await?;
            println!("Pool funded with {amount}; now {pool}");
        }
    }
    Ok(())
}
