//! Transfer workflow
//!
//! propose → confirm/cancel → settle, with lazy TTL expiry. A request is
//! settled by exactly one confirm: the status transition is a
//! compare-and-set, and the whole settlement (sender debit, recipient
//! credit, pool fee, two log records, status flip) commits as one sqlx
//! transaction under the context write lock. The sender's balance is
//! re-checked inside that transaction because time passes between proposal
//! and confirmation.

use crate::context::ServiceContext;
use crate::error::{EngineError, EngineResult};
use crate::ledger::{adjust_pool_on, apply_delta_on};
use bankbot_core::{fee_for, ids, round_minor, Transaction, TransferRequest, TransferStatus};
use bankbot_persistence::{TransactionRepo, TransferRepo, UserRepo};
use rust_decimal::Decimal;
use sqlx::SqliteConnection;
use tracing::{info, warn};

/// Result of a successful confirmation.
#[derive(Debug, Clone)]
pub struct SettledTransfer {
    pub request: TransferRequest,
    /// Sender balance after the debit
    pub sender_balance: Decimal,
}

/// Transfer Workflow service.
pub struct TransferService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> TransferService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Propose a transfer. Validates the recipient, the amount, and that
    /// the sender can cover amount + fee right now; the check is repeated
    /// at settlement.
    pub async fn propose(
        &self,
        sender_id: i64,
        recipient_id: i64,
        amount: Decimal,
    ) -> EngineResult<TransferRequest> {
        if recipient_id == sender_id {
            return Err(EngineError::SelfTransfer);
        }
        let amount = round_minor(amount);
        if amount <= Decimal::ZERO {
            return Err(EngineError::InvalidAmount(format!(
                "Transfer amount must be positive: {}",
                amount
            )));
        }

        let fee = fee_for(amount, self.ctx.config().fee_rate);
        let total = amount + fee;
        let balance = UserRepo::balance(self.ctx.pool(), sender_id).await?;
        if total > balance {
            return Err(EngineError::InsufficientFunds {
                needed: total,
                available: balance,
            });
        }

        let request = TransferRequest::new(
            &ids::transfer_id(),
            sender_id,
            recipient_id,
            amount,
            fee,
            self.ctx.now(),
        );
        TransferRepo::insert(self.ctx.pool(), &request).await?;

        info!(
            transfer_id = %request.id,
            sender_id,
            recipient_id,
            amount = %amount,
            fee = %fee,
            "transfer proposed"
        );
        Ok(request)
    }

    /// Fetch a request, applying lazy expiry to stale pending ones.
    pub async fn get(&self, transfer_id: &str) -> EngineResult<TransferRequest> {
        let request = TransferRepo::get(self.ctx.pool(), transfer_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Transfer", transfer_id))?;
        self.expire_if_stale(request).await
    }

    /// Confirm and settle a pending transfer. Only the sender may confirm.
    pub async fn confirm(
        &self,
        transfer_id: &str,
        requesting_user: i64,
    ) -> EngineResult<SettledTransfer> {
        let _guard = self.ctx.lock_writes().await;
        let now = self.ctx.now();
        let mut tx = self.ctx.pool().begin().await?;

        let mut request = TransferRepo::get(&mut *tx, transfer_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Transfer", transfer_id))?;
        if request.sender_id != requesting_user {
            return Err(EngineError::Forbidden);
        }
        if request.status.is_terminal() {
            return Err(EngineError::AlreadyFinal {
                status: request.status,
            });
        }
        if request.is_expired(now, self.ctx.config().transfer_ttl) {
            TransferRepo::close(&mut *tx, transfer_id, TransferStatus::Expired).await?;
            tx.commit().await?;
            return Err(EngineError::AlreadyFinal {
                status: TransferStatus::Expired,
            });
        }

        // Re-validate inside the settlement transaction; the balance may
        // have drifted since proposal.
        let total = request.total_debit();
        let balance = UserRepo::balance(&mut *tx, request.sender_id).await?;
        if total > balance {
            TransferRepo::close(&mut *tx, transfer_id, TransferStatus::Cancelled).await?;
            tx.commit().await?;
            warn!(transfer_id, "settlement failed funds re-check; request cancelled");
            return Err(EngineError::InsufficientFunds {
                needed: total,
                available: balance,
            });
        }

        if !TransferRepo::close(&mut *tx, transfer_id, TransferStatus::Settled).await? {
            // Lost the transition race; report the terminal state we find.
            let status = TransferRepo::get(&mut *tx, transfer_id)
                .await?
                .map(|r| r.status)
                .unwrap_or(TransferStatus::Cancelled);
            return Err(EngineError::AlreadyFinal { status });
        }

        let sender_balance = self.settle_on(&mut tx, &request).await?;
        tx.commit().await?;
        request.status = TransferStatus::Settled;

        info!(
            transfer_id = %request.id,
            sender_id = request.sender_id,
            recipient_id = request.recipient_id,
            amount = %request.amount,
            "transfer settled"
        );
        Ok(SettledTransfer {
            request,
            sender_balance,
        })
    }

    /// Cancel a pending transfer. Only the sender may cancel; cancelling an
    /// already-terminal request reports `AlreadyFinal`.
    pub async fn cancel(
        &self,
        transfer_id: &str,
        requesting_user: i64,
    ) -> EngineResult<TransferRequest> {
        let _guard = self.ctx.lock_writes().await;
        let now = self.ctx.now();
        let mut tx = self.ctx.pool().begin().await?;

        let mut request = TransferRepo::get(&mut *tx, transfer_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Transfer", transfer_id))?;
        if request.sender_id != requesting_user {
            return Err(EngineError::Forbidden);
        }
        if request.status.is_terminal() {
            return Err(EngineError::AlreadyFinal {
                status: request.status,
            });
        }

        let to = if request.is_expired(now, self.ctx.config().transfer_ttl) {
            TransferStatus::Expired
        } else {
            TransferStatus::Cancelled
        };
        if !TransferRepo::close(&mut *tx, transfer_id, to).await? {
            let status = TransferRepo::get(&mut *tx, transfer_id)
                .await?
                .map(|r| r.status)
                .unwrap_or(TransferStatus::Cancelled);
            return Err(EngineError::AlreadyFinal { status });
        }
        tx.commit().await?;

        request.status = to;
        info!(transfer_id = %request.id, status = %to, "transfer closed");
        Ok(request)
    }

    /// The atomic settlement triple: debit sender, credit recipient and
    /// pool, append both log records sharing the transfer id.
    async fn settle_on(
        &self,
        conn: &mut SqliteConnection,
        request: &TransferRequest,
    ) -> EngineResult<Decimal> {
        let now = self.ctx.now();

        let sender_balance =
            apply_delta_on(conn, request.sender_id, -request.total_debit()).await?;
        apply_delta_on(conn, request.recipient_id, request.amount).await?;
        adjust_pool_on(conn, request.fee, false, now).await?;

        let out = Transaction::transfer_out(
            &ids::transaction_id(),
            request.sender_id,
            request.recipient_id,
            request.total_debit(),
            &request.id,
            now,
        );
        let incoming = Transaction::transfer_in(
            &ids::transaction_id(),
            request.recipient_id,
            request.sender_id,
            request.amount,
            &request.id,
            now,
        );
        TransactionRepo::append(&mut *conn, &out).await?;
        TransactionRepo::append(&mut *conn, &incoming).await?;

        Ok(sender_balance)
    }

    async fn expire_if_stale(&self, mut request: TransferRequest) -> EngineResult<TransferRequest> {
        if request.is_expired(self.ctx.now(), self.ctx.config().transfer_ttl) {
            TransferRepo::close(self.ctx.pool(), &request.id, TransferStatus::Expired).await?;
            request.status = TransferStatus::Expired;
        }
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Ledger;
    use crate::testutil::{test_context, test_context_manual_clock};
    use bankbot_core::TransactionKind;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_propose_validations() {
        let (_dir, ctx) = test_context().await;
        let transfers = TransferService::new(&ctx);

        assert!(matches!(
            transfers.propose(1, 1, dec!(10)).await.unwrap_err(),
            EngineError::SelfTransfer
        ));
        assert!(matches!(
            transfers.propose(1, 2, dec!(0)).await.unwrap_err(),
            EngineError::InvalidAmount(_)
        ));
        // Zero balance cannot cover amount + fee
        assert!(matches!(
            transfers.propose(1, 2, dec!(10)).await.unwrap_err(),
            EngineError::InsufficientFunds { .. }
        ));
    }

    #[tokio::test]
    async fn test_propose_confirm_settles_with_fee() {
        let (_dir, ctx) = test_context().await;
        let ledger = Ledger::new(&ctx);
        let transfers = TransferService::new(&ctx);

        ledger.apply_delta(10, dec!(100.00)).await.unwrap();

        let request = transfers.propose(10, 20, dec!(50.00)).await.unwrap();
        assert_eq!(request.fee, dec!(1.00));
        assert_eq!(request.status, TransferStatus::Pending);

        let settled = transfers.confirm(&request.id, 10).await.unwrap();
        assert_eq!(settled.sender_balance, dec!(49.00));
        assert_eq!(ledger.balance_of(10).await.unwrap(), dec!(49.00));
        assert_eq!(ledger.balance_of(20).await.unwrap(), dec!(50.00));
        assert_eq!(ledger.pool_amount().await.unwrap(), dec!(1.00));

        // Both log records share the transfer id
        let out = &ledger.history_for(10).await.unwrap()[0];
        let incoming = &ledger.history_for(20).await.unwrap()[0];
        assert_eq!(out.kind, TransactionKind::TransferOut);
        assert_eq!(out.amount, dec!(-51.00));
        assert_eq!(incoming.kind, TransactionKind::TransferIn);
        assert_eq!(incoming.amount, dec!(50.00));
        assert_eq!(out.details.transfer_id, incoming.details.transfer_id);
        assert_eq!(out.details.transfer_id.as_deref(), Some(request.id.as_str()));
    }

    #[tokio::test]
    async fn test_confirm_requires_sender() {
        let (_dir, ctx) = test_context().await;
        let ledger = Ledger::new(&ctx);
        let transfers = TransferService::new(&ctx);

        ledger.apply_delta(10, dec!(100)).await.unwrap();
        let request = transfers.propose(10, 20, dec!(10)).await.unwrap();

        assert!(matches!(
            transfers.confirm(&request.id, 20).await.unwrap_err(),
            EngineError::Forbidden
        ));
        assert!(matches!(
            transfers.confirm("tr_missing", 10).await.unwrap_err(),
            EngineError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_terminal_requests_are_idempotent() {
        let (_dir, ctx) = test_context().await;
        let ledger = Ledger::new(&ctx);
        let transfers = TransferService::new(&ctx);

        ledger.apply_delta(10, dec!(100)).await.unwrap();
        let request = transfers.propose(10, 20, dec!(10)).await.unwrap();
        transfers.confirm(&request.id, 10).await.unwrap();

        let balance_after = ledger.balance_of(10).await.unwrap();

        // Second confirm and cancel both report the terminal state
        assert!(matches!(
            transfers.confirm(&request.id, 10).await.unwrap_err(),
            EngineError::AlreadyFinal {
                status: TransferStatus::Settled
            }
        ));
        assert!(matches!(
            transfers.cancel(&request.id, 10).await.unwrap_err(),
            EngineError::AlreadyFinal {
                status: TransferStatus::Settled
            }
        ));
        // No double settlement
        assert_eq!(ledger.balance_of(10).await.unwrap(), balance_after);
    }

    #[tokio::test]
    async fn test_cancel_releases_nothing_but_closes_request() {
        let (_dir, ctx) = test_context().await;
        let ledger = Ledger::new(&ctx);
        let transfers = TransferService::new(&ctx);

        ledger.apply_delta(10, dec!(100)).await.unwrap();
        let request = transfers.propose(10, 20, dec!(10)).await.unwrap();

        let cancelled = transfers.cancel(&request.id, 10).await.unwrap();
        assert_eq!(cancelled.status, TransferStatus::Cancelled);
        // Proposal never held funds
        assert_eq!(ledger.balance_of(10).await.unwrap(), dec!(100));
    }

    #[tokio::test]
    async fn test_settlement_recheck_cancels_on_drift() {
        let (_dir, ctx) = test_context().await;
        let ledger = Ledger::new(&ctx);
        let transfers = TransferService::new(&ctx);

        ledger.apply_delta(10, dec!(100)).await.unwrap();
        let request = transfers.propose(10, 20, dec!(90)).await.unwrap();

        // Balance drifts below amount + fee between propose and confirm
        ledger.apply_delta(10, dec!(-50)).await.unwrap();

        assert!(matches!(
            transfers.confirm(&request.id, 10).await.unwrap_err(),
            EngineError::InsufficientFunds { .. }
        ));
        let stored = transfers.get(&request.id).await.unwrap();
        assert_eq!(stored.status, TransferStatus::Cancelled);
        // Nothing moved
        assert_eq!(ledger.balance_of(10).await.unwrap(), dec!(50));
        assert_eq!(ledger.balance_of(20).await.unwrap(), dec!(0));
    }

    #[tokio::test]
    async fn test_lazy_expiry() {
        let (_dir, clock, ctx) = test_context_manual_clock().await;
        let ledger = Ledger::new(&ctx);
        let transfers = TransferService::new(&ctx);

        ledger.apply_delta(10, dec!(100)).await.unwrap();
        let request = transfers.propose(10, 20, dec!(10)).await.unwrap();

        clock.advance(Duration::minutes(16));

        assert!(matches!(
            transfers.confirm(&request.id, 10).await.unwrap_err(),
            EngineError::AlreadyFinal {
                status: TransferStatus::Expired
            }
        ));
        let stored = transfers.get(&request.id).await.unwrap();
        assert_eq!(stored.status, TransferStatus::Expired);
        assert_eq!(ledger.balance_of(10).await.unwrap(), dec!(100));
    }
}
