//! Prefixed uuid-v4 identifiers for ledger records.

use uuid::Uuid;

pub fn transaction_id() -> String {
    format!("tx_{}", Uuid::new_v4().simple())
}

pub fn transfer_id() -> String {
    format!("tr_{}", Uuid::new_v4().simple())
}

pub fn loan_id() -> String {
    format!("ln_{}", Uuid::new_v4().simple())
}
