//! Transfer workflow commands: propose, confirm, cancel, show.

use crate::db;
use crate::TransferAction;
use anyhow::Result;
use std::path::Path;

pub async fn handle(db_path: &Path, action: TransferAction) -> Result<()> {
    let engine = db::open_engine(db_path).await?;
    let transfers = engine.transfers();

    match action {
        TransferAction::Propose {
            sender_id,
            recipient_id,
            amount,
        } => {
            let request = transfers.propose(sender_id, recipient_id, amount).await?;
            println!("Transfer proposed: {}", request.id);
            println!(
                "  {} -> {}: {} (fee {}, total {})",
                request.sender_id,
                request.recipient_id,
                request.amount,
                request.fee,
                request.total_debit()
            );
            println!("  Confirm with: bankbot transfer confirm {} --user {}", request.id, sender_id);
        }

        TransferAction::Confirm { transfer_id, user } => {
            let settled = transfers.confirm(&transfer_id, user).await?;
            println!(
                "Transfer {} settled: {} sent to {}, fee {}",
                settled.request.id,
                settled.request.amount,
                settled.request.recipient_id,
                settled.request.fee
            );
            println!("  Sender balance: {}", settled.sender_balance);
        }

        TransferAction::Cancel { transfer_id, user } => {
            let request = transfers.cancel(&transfer_id, user).await?;
            println!("Transfer {} {}", request.id, request.status);
        }

        TransferAction::Show { transfer_id } => {
            let request = transfers.get(&transfer_id).await?;
            println!("Transfer {}", request.id);
            println!("  From:   {}", request.sender_id);
            println!("  To:     {}", request.recipient_id);
            println!("  Amount: {} (fee {})", request.amount, request.fee);
            println!("  Status: {}", request.status);
        }
    }
    Ok(())
}
