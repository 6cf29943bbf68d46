//! Bankbot CLI - ledger operations from the command line
//!
//! Usage:
//! ```bash
//! bankbot init
//! bankbot balance 1001
//! bankbot transfer propose 1001 1002 50.00
//! bankbot transfer confirm tr_abc123 --user 1001
//! bankbot gift 1001
//! bankbot wager 1001 5.00
//! bankbot loan issue 1001 25
//! bankbot pool status
//! ```
//!
//! Each subcommand maps to exactly one engine operation; this binary holds
//! no logic of its own.

use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

mod commands;
mod db;

use commands::{account, loan, play, transfer};

/// Bankbot - a chat-bank ledger & transfer engine
#[derive(Parser)]
#[command(name = "bankbot")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Database file path
    #[arg(long, default_value = "data/bankbot.db", global = true)]
    pub db: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database schema
    Init,

    /// Show a user's balance
    Balance {
        /// Numeric user id
        user_id: i64,
    },

    /// Show a user's transaction history
    History {
        /// Numeric user id
        user_id: i64,
    },

    /// Peer-to-peer transfers
    Transfer {
        #[command(subcommand)]
        action: TransferAction,
    },

    /// Claim the daily gift
    Gift {
        /// Numeric user id
        user_id: i64,
    },

    /// Play a wager
    Wager {
        /// Numeric user id
        user_id: i64,
        /// Bet amount
        bet: Decimal,
    },

    /// Loans
    Loan {
        #[command(subcommand)]
        action: LoanAction,
    },

    /// Liquidity pool
    Pool {
        #[command(subcommand)]
        action: PoolAction,
    },
}

#[derive(Subcommand)]
pub enum TransferAction {
    /// Propose a transfer from sender to recipient
    Propose {
        sender_id: i64,
        recipient_id: i64,
        amount: Decimal,
    },
    /// Confirm a pending transfer
    Confirm {
        transfer_id: String,
        /// Acting user (must be the sender)
        #[arg(long)]
        user: i64,
    },
    /// Cancel a pending transfer
    Cancel {
        transfer_id: String,
        /// Acting user (must be the sender)
        #[arg(long)]
        user: i64,
    },
    /// Show a transfer request
    Show { transfer_id: String },
}

#[derive(Subcommand)]
pub enum LoanAction {
    /// Issue a loan to a user
    Issue { user_id: i64, amount: Decimal },
    /// Repay an outstanding loan in full
    Repay {
        loan_id: String,
        #[arg(long)]
        user: i64,
    },
    /// List a user's outstanding loans
    List { user_id: i64 },
}

#[derive(Subcommand)]
pub enum PoolAction {
    /// Show pool liquidity, total user balances, and hourly change
    Status,
    /// Fund the pool (operator)
    Fund { amount: Decimal },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    // Ensure the data directory exists
    if let Some(parent) = cli.db.parent() {
        std::fs::create_dir_all(parent).ok();
    }

    match cli.command {
        Commands::Init => {
            db::init_database(&cli.db).await?;
            println!("Database initialized at {}", cli.db.display());
        }

        Commands::Balance { user_id } => {
            account::balance(&cli.db, user_id).await?;
        }

        Commands::History { user_id } => {
            account::history(&cli.db, user_id).await?;
        }

        Commands::Transfer { action } => {
            transfer::handle(&cli.db, action).await?;
        }

        Commands::Gift { user_id } => {
            play::gift(&cli.db, user_id).await?;
        }

        Commands::Wager { user_id, bet } => {
            play::wager(&cli.db, user_id, bet).await?;
        }

        Commands::Loan { action } => {
            loan::handle(&cli.db, action).await?;
        }

        Commands::Pool { action } => {
            account::pool(&cli.db, action).await?;
        }
    }

    Ok(())
}
