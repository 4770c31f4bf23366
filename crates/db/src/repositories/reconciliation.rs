//! Reconciliation repository: statement import and matching.

use chrono::Utc;
use ledgerline_core::ledger::{LedgerError, VoucherStatus};
use ledgerline_core::reconciliation::{
    EntryCandidate, MatchMode, MatchStatus, Matcher, ReconciliationRecord, StatementLine,
};
use ledgerline_shared::types::{AccountId, LedgerEntryId, Money, ReconciliationId, VoucherId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, warn};

use super::convert::{db_error, is_unique_violation};
use crate::entities::{
    accounts, ledger_entries, reconciliation_records,
    sea_orm_active_enums::MatchStatus as DbMatchStatus, vouchers,
};

/// Reconciliation repository.
///
/// Records are never deleted. A ledger entry can be claimed by at most one
/// record at a time; the claim check runs under the record's row lock and
/// is backed by a partial unique index on `matched_entry_id`.
#[derive(Debug, Clone)]
pub struct ReconciliationRepository {
    db: DatabaseConnection,
}

impl ReconciliationRepository {
    /// Creates a new reconciliation repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Imports statement lines as `Unmatched` records, in input order.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAccount` if the account does not exist and
    /// `NonPositiveAmount` if any line amount is not positive. Nothing is
    /// imported on error.
    pub async fn import_statement_lines(
        &self,
        account_id: AccountId,
        lines: Vec<StatementLine>,
    ) -> Result<Vec<ReconciliationRecord>, LedgerError> {
        Matcher::validate_lines(&lines)?;

        let txn = self.db.begin().await.map_err(db_error)?;

        accounts::Entity::find_by_id(account_id.into_inner())
            .one(&txn)
            .await
            .map_err(db_error)?
            .ok_or(LedgerError::UnknownAccount(account_id))?;

        let now = Utc::now();
        let mut records = Vec::with_capacity(lines.len());
        for line in lines {
            let model = reconciliation_records::ActiveModel {
                id: Set(ReconciliationId::new().into_inner()),
                account_id: Set(account_id.into_inner()),
                external_ref: Set(line.external_ref),
                amount: Set(line.amount.minor_units()),
                statement_date: Set(line.statement_date),
                description: Set(line.description),
                matched_entry_id: Set(None),
                status: Set(DbMatchStatus::Unmatched),
                matched_at: Set(None),
                note: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await
            .map_err(db_error)?;
            records.push(ReconciliationRecord::from(model));
        }

        txn.commit().await.map_err(db_error)?;

        info!(%account_id, count = records.len(), "Statement lines imported");
        Ok(records)
    }

    /// Matches a statement line to a posted ledger entry of equal amount.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Either side is already claimed (`AlreadyMatched`)
    /// - The amounts differ (`AmountMismatch`)
    /// - The entry's voucher is not posted (`NotPosted`)
    /// - The entry belongs to another account (`EntryAccountMismatch`)
    pub async fn match_line(
        &self,
        reconciliation_id: ReconciliationId,
        entry_id: LedgerEntryId,
    ) -> Result<ReconciliationRecord, LedgerError> {
        self.claim(reconciliation_id, entry_id, MatchMode::Strict, None).await
    }

    /// Matches a statement line despite an amount discrepancy.
    ///
    /// Runs every `match_line` check except the amount comparison and
    /// records the match as `Disputed` with `note`.
    ///
    /// # Errors
    ///
    /// Same as [`ReconciliationRepository::match_line`], without `AmountMismatch`.
    pub async fn dispute_line(
        &self,
        reconciliation_id: ReconciliationId,
        entry_id: LedgerEntryId,
        note: impl Into<String>,
    ) -> Result<ReconciliationRecord, LedgerError> {
        self.claim(reconciliation_id, entry_id, MatchMode::Dispute, Some(note.into()))
            .await
    }

    /// Releases any claim and returns the record to `Unmatched`.
    ///
    /// Ledger entries are not touched.
    ///
    /// # Errors
    ///
    /// Returns `ReconciliationNotFound` if the record does not exist.
    pub async fn unmatch(&self, reconciliation_id: ReconciliationId) -> Result<ReconciliationRecord, LedgerError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let model = lock_record(&txn, reconciliation_id).await?;
        let mut record = ReconciliationRecord::from(model.clone());
        let released = record.matched_entry_id;
        Matcher::apply_unmatch(&mut record, Utc::now());

        let updated = save(&txn, model, &record).await?;
        txn.commit().await.map_err(db_error)?;

        info!(%reconciliation_id, released = ?released, "Statement line unmatched");
        Ok(updated)
    }

    /// Gets a record by ID.
    ///
    /// # Errors
    ///
    /// Returns `ReconciliationNotFound` if the record does not exist.
    pub async fn get_record(&self, reconciliation_id: ReconciliationId) -> Result<ReconciliationRecord, LedgerError> {
        reconciliation_records::Entity::find_by_id(reconciliation_id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_error)?
            .map(ReconciliationRecord::from)
            .ok_or(LedgerError::ReconciliationNotFound(reconciliation_id))
    }

    /// Lists an account's records in import order, optionally by status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_records(
        &self,
        account_id: AccountId,
        status: Option<MatchStatus>,
    ) -> Result<Vec<ReconciliationRecord>, LedgerError> {
        let mut query = reconciliation_records::Entity::find()
            .filter(reconciliation_records::Column::AccountId.eq(account_id.into_inner()))
            .order_by_asc(reconciliation_records::Column::Id);

        if let Some(status) = status {
            query = query.filter(reconciliation_records::Column::Status.eq(DbMatchStatus::from(status)));
        }

        let models = query.all(&self.db).await.map_err(db_error)?;
        Ok(models.into_iter().map(ReconciliationRecord::from).collect())
    }

    async fn claim(
        &self,
        reconciliation_id: ReconciliationId,
        entry_id: LedgerEntryId,
        mode: MatchMode,
        note: Option<String>,
    ) -> Result<ReconciliationRecord, LedgerError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let model = lock_record(&txn, reconciliation_id).await?;
        let mut record = ReconciliationRecord::from(model.clone());

        let candidate = load_candidate(&txn, entry_id).await?;
        let claimed_elsewhere = reconciliation_records::Entity::find()
            .filter(reconciliation_records::Column::MatchedEntryId.eq(entry_id.into_inner()))
            .filter(reconciliation_records::Column::Id.ne(reconciliation_id.into_inner()))
            .count(&txn)
            .await
            .map_err(db_error)?
            > 0;

        if let Err(err) = Matcher::check_match(&record, &candidate, claimed_elsewhere, mode) {
            warn!(%reconciliation_id, %entry_id, error = %err, "Match rejected");
            return Err(err);
        }

        Matcher::apply_match(&mut record, entry_id, mode, note, Utc::now());

        let updated = match save(&txn, model, &record).await {
            Ok(updated) => updated,
            Err(ClaimError::Taken) => {
                return Err(LedgerError::AlreadyMatched(format!(
                    "entry {entry_id} is claimed by another statement line"
                )));
            }
            Err(ClaimError::Ledger(err)) => return Err(err),
        };
        txn.commit().await.map_err(db_error)?;

        info!(%reconciliation_id, %entry_id, status = ?updated.status, "Statement line matched");
        Ok(updated)
    }
}

async fn lock_record<C: ConnectionTrait>(
    conn: &C,
    reconciliation_id: ReconciliationId,
) -> Result<reconciliation_records::Model, LedgerError> {
    reconciliation_records::Entity::find_by_id(reconciliation_id.into_inner())
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(db_error)?
        .ok_or(LedgerError::ReconciliationNotFound(reconciliation_id))
}

async fn load_candidate<C: ConnectionTrait>(
    conn: &C,
    entry_id: LedgerEntryId,
) -> Result<EntryCandidate, LedgerError> {
    let (entry, voucher) = ledger_entries::Entity::find_by_id(entry_id.into_inner())
        .find_also_related(vouchers::Entity)
        .one(conn)
        .await
        .map_err(db_error)?
        .ok_or(LedgerError::LedgerEntryNotFound(entry_id))?;
    let voucher = voucher.ok_or(LedgerError::VoucherNotFound(VoucherId::from_uuid(entry.voucher_id)))?;

    Ok(EntryCandidate {
        entry_id,
        voucher_id: VoucherId::from_uuid(voucher.id),
        account_id: AccountId::from_uuid(entry.account_id),
        amount: Money::from_minor(entry.amount),
        voucher_status: VoucherStatus::from(voucher.status),
    })
}

enum ClaimError {
    Taken,
    Ledger(LedgerError),
}

impl From<ClaimError> for LedgerError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::Taken => Self::AlreadyMatched("entry is claimed by another statement line".to_string()),
            ClaimError::Ledger(err) => err,
        }
    }
}

/// Writes the match fields of `record` back to the row.
async fn save<C: ConnectionTrait>(
    conn: &C,
    model: reconciliation_records::Model,
    record: &ReconciliationRecord,
) -> Result<ReconciliationRecord, ClaimError> {
    let mut active = model.into_active_model();
    active.matched_entry_id = Set(record.matched_entry_id.map(LedgerEntryId::into_inner));
    active.status = Set(record.status.into());
    active.matched_at = Set(record.matched_at);
    active.note = Set(record.note.clone());
    active.updated_at = Set(record.updated_at);

    match active.update(conn).await {
        Ok(model) => Ok(model.into()),
        Err(err) if is_unique_violation(&err) => Err(ClaimError::Taken),
        Err(err) => Err(ClaimError::Ledger(db_error(err))),
    }
}
