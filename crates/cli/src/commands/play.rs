//! Gift and wager commands.

use crate::db;
use anyhow::Result;
use rust_decimal::Decimal;
use std::path::Path;

pub async fn gift(db_path: &Path, user_id: i64) -> Result<()> {
    let engine = db::open_engine(db_path).await?;
    let claim = engine.gifts().claim(user_id).await?;
    println!("Gift claimed: {} (balance {})", claim.amount, claim.balance);
    Ok(())
}

pub async fn wager(db_path: &Path, user_id: i64, bet: Decimal) -> Result<()> {
    let engine = db::open_engine(db_path).await?;
    let outcome = engine.wagers().play(user_id, bet).await?;

    if outcome.won {
        println!("Won! +{} (balance {})", outcome.net, outcome.balance);
    } else if outcome.capped_by_pool {
        println!(
            "Lost: the pool could not cover the payout. {} (balance {})",
            outcome.net, outcome.balance
        );
    } else {
        println!("Lost. {} (balance {})", outcome.net, outcome.balance);
    }
    Ok(())
}
