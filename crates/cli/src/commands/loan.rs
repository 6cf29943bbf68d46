//! Loan commands: issue, repay, list.

use crate::db;
use crate::LoanAction;
use anyhow::Result;
use bankbot_core::local_time;
use std::path::Path;

pub async fn handle(db_path: &Path, action: LoanAction) -> Result<()> {
    let engine = db::open_engine(db_path).await?;
    let loans = engine.loans();

    match action {
        LoanAction::Issue { user_id, amount } => {
            let loan = loans.issue(user_id, amount).await?;
            println!("Loan issued: {}", loan.id);
            println!(
                "  Principal {} + interest {} = {} due",
                loan.principal, loan.interest, loan.total_due
            );
        }

        LoanAction::Repay { loan_id, user } => {
            let repayment = loans.repay(&loan_id, user).await?;
            println!(
                "Loan {} repaid: {} (balance {})",
                repayment.loan.id, repayment.loan.total_due, repayment.balance
            );
        }

        LoanAction::List { user_id } => {
            let outstanding = loans.outstanding(user_id).await?;
            if outstanding.is_empty() {
                println!("No outstanding loans for user {user_id}.");
                return Ok(());
            }
            for loan in outstanding {
                let issued = local_time(loan.issued_at).format("%Y-%m-%d %H:%M");
                println!("{}  issued {}  due {}", loan.id, issued, loan.total_due);
            }
        }
    }
    Ok(())
}
