//! Reversal repository.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use ledgerline_core::events::{LedgerEvent, LedgerEventSink, TracingEventSink};
use ledgerline_core::ledger::{LedgerError, PostingEngine, ReversalEngine, Voucher, VoucherDetail};
use ledgerline_shared::types::VoucherId;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, Set, TransactionTrait,
};
use tracing::{info, instrument, warn};

use super::convert::db_error;
use super::voucher::{insert_draft, insert_entry, load_entries, lock_voucher, post_in_txn};
use crate::entities::{sea_orm_active_enums::VoucherStatus as DbVoucherStatus, vouchers};

/// Reverses posted vouchers by posting a mirror-image voucher.
///
/// The original voucher and its entries are never modified apart from the
/// status change to `Reversed` and the link to the reversal.
#[derive(Clone)]
pub struct ReversalRepository {
    db: DatabaseConnection,
    events: Arc<dyn LedgerEventSink>,
}

impl fmt::Debug for ReversalRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReversalRepository").finish_non_exhaustive()
    }
}

impl ReversalRepository {
    /// Creates a repository that logs events through `tracing`.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_event_sink(db, Arc::new(TracingEventSink))
    }

    /// Creates a repository publishing events to `events`.
    #[must_use]
    pub fn with_event_sink(db: DatabaseConnection, events: Arc<dyn LedgerEventSink>) -> Self {
        Self { db, events }
    }

    /// Reverses a posted voucher.
    ///
    /// Creates a `Reversal` voucher whose entries swap debit and credit on
    /// the original's accounts and amounts, posts it through the regular
    /// posting checks, and marks the original `Reversed`. Everything happens
    /// in one transaction. Returns the posted reversal voucher.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The voucher does not exist (`VoucherNotFound`)
    /// - The voucher is a draft (`NotPosted`)
    /// - The voucher was already reversed (`AlreadyReversed`)
    /// - Posting the reversal fails, e.g. because an account has since
    ///   been deactivated (`InactiveAccount`)
    #[instrument(skip(self, reason))]
    pub async fn reverse_voucher(&self, voucher_id: VoucherId, reason: &str) -> Result<VoucherDetail, LedgerError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let original_model = lock_voucher(&txn, voucher_id).await?;
        let mut original = Voucher::from(original_model.clone());
        if let Err(err) = ReversalEngine::check_reversible(&original) {
            warn!(%voucher_id, error = %err, "Reversal rejected");
            return Err(err);
        }

        let original_entries = load_entries(&txn, voucher_id).await?;

        let header = ReversalEngine::reversal_header(&original, reason);
        if reversal_exists(&txn, voucher_id).await? {
            return Err(LedgerError::AlreadyReversed(voucher_id));
        }
        let draft = insert_draft(&txn, header, Some(voucher_id)).await?;
        let reversal_id = VoucherId::from_uuid(draft.id);

        let mirrored = ReversalEngine::mirror_entries(&original, &original_entries);
        for (line_no, entry) in (1..).zip(mirrored) {
            insert_entry(&txn, reversal_id, line_no, entry).await?;
        }

        let posted = match post_in_txn(&txn, draft).await {
            Ok(posted) => posted,
            Err(err) => {
                warn!(%voucher_id, error = %err, "Reversal voucher failed to post");
                return Err(err);
            }
        };

        let now = Utc::now();
        original.mark_reversed(reversal_id, now)?;

        let mut active = original_model.into_active_model();
        active.status = Set(DbVoucherStatus::Reversed);
        active.reversed_by_voucher_id = Set(Some(reversal_id.into_inner()));
        active.updated_at = Set(now);
        active.update(&txn).await.map_err(db_error)?;

        txn.commit().await.map_err(db_error)?;

        info!(
            %voucher_id,
            %reversal_id,
            original_number = %original.number,
            reversal_number = %posted.voucher.number,
            "Voucher reversed"
        );
        self.events.publish(&LedgerEvent::VoucherReversed {
            voucher_id,
            reversal_voucher_id: reversal_id,
            reversal_number: posted.voucher.number.clone(),
            accounts: PostingEngine::touched_accounts(&posted.entries),
            reason: reason.to_string(),
            timestamp: now,
        });

        Ok(posted.into_detail())
    }
}

/// Returns true if some voucher already reverses `voucher_id`.
async fn reversal_exists<C: ConnectionTrait>(conn: &C, voucher_id: VoucherId) -> Result<bool, LedgerError> {
    let count = vouchers::Entity::find()
        .filter(vouchers::Column::ReversesVoucherId.eq(voucher_id.into_inner()))
        .count(conn)
        .await
        .map_err(db_error)?;
    Ok(count > 0)
}
