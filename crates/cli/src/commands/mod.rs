pub mod account;
pub mod loan;
pub mod play;
pub mod transfer;
