//! Voucher repository: draft editing and the posting engine.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use ledgerline_core::events::{LedgerEvent, LedgerEventSink, TracingEventSink};
use ledgerline_core::ledger::entry::validate_amount;
use ledgerline_core::ledger::{
    Account, AccountRules, EntryChanges, LedgerEntry, LedgerError, NewEntry, NewVoucher,
    PostingEngine, Voucher, VoucherDetail, VoucherFilter, VoucherTotals,
};
use ledgerline_shared::types::{AccountId, LedgerEntryId, VoucherId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    ModelTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, instrument, warn};

use super::convert::db_error;
use super::sequence::VoucherSequence;
use crate::entities::{
    accounts, ledger_entries,
    sea_orm_active_enums::{VoucherStatus as DbVoucherStatus, VoucherType as DbVoucherType},
    vouchers,
};

/// Voucher repository.
///
/// Drafts are freely editable. Posting runs every check inside a single
/// database transaction holding the voucher row lock, so concurrent posts
/// of the same voucher cannot both succeed.
#[derive(Clone)]
pub struct VoucherRepository {
    db: DatabaseConnection,
    events: Arc<dyn LedgerEventSink>,
}

impl fmt::Debug for VoucherRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoucherRepository").finish_non_exhaustive()
    }
}

impl VoucherRepository {
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

    /// Creates an empty draft voucher with the next number in its series.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    #[instrument(skip(self, input), fields(voucher_type = %input.voucher_type.as_str()))]
    pub async fn create_draft_voucher(&self, input: NewVoucher) -> Result<Voucher, LedgerError> {
        let txn = self.db.begin().await.map_err(db_error)?;
        let model = insert_draft(&txn, input, None).await?;
        txn.commit().await.map_err(db_error)?;

        info!(voucher_id = %model.id, number = %model.number, "Draft voucher created");
        Ok(model.into())
    }

    /// Appends an entry to a draft voucher.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The amount is not positive (`NonPositiveAmount`)
    /// - The voucher does not exist or is not a draft
    /// - The account is unknown or inactive
    #[instrument(skip(self, entry), fields(account_id = %entry.account_id))]
    pub async fn add_entry(&self, voucher_id: VoucherId, entry: NewEntry) -> Result<LedgerEntry, LedgerError> {
        validate_amount(entry.amount)?;

        let txn = self.db.begin().await.map_err(db_error)?;

        let voucher: Voucher = lock_voucher(&txn, voucher_id).await?.into();
        voucher.ensure_draft()?;
        ensure_postable(&txn, entry.account_id).await?;

        let line_no = next_line_no(&txn, voucher_id).await?;
        let model = insert_entry(&txn, voucher_id, line_no, entry).await?;

        txn.commit().await.map_err(db_error)?;

        info!(%voucher_id, entry_id = %model.id, line_no, "Entry added");
        Ok(model.into())
    }

    /// Changes an entry of a draft voucher.
    ///
    /// # Errors
    ///
    /// Returns `LedgerEntryNotFound`, `VoucherNotDraft`, `NonPositiveAmount`,
    /// `UnknownAccount` or `InactiveAccount`.
    pub async fn update_entry(&self, entry_id: LedgerEntryId, changes: EntryChanges) -> Result<LedgerEntry, LedgerError> {
        if let Some(amount) = changes.amount {
            validate_amount(amount)?;
        }

        let txn = self.db.begin().await.map_err(db_error)?;

        let model = find_entry(&txn, entry_id).await?;
        let voucher: Voucher = lock_voucher(&txn, VoucherId::from_uuid(model.voucher_id)).await?.into();
        voucher.ensure_draft()?;

        if changes.is_empty() {
            return Ok(model.into());
        }

        if let Some(account_id) = changes.account_id {
            ensure_postable(&txn, account_id).await?;
        }

        let mut entry = LedgerEntry::from(model.clone());
        changes.apply_to(&mut entry);

        let mut active = model.into_active_model();
        active.account_id = Set(entry.account_id.into_inner());
        active.entry_type = Set(entry.entry_type.into());
        active.amount = Set(entry.amount.minor_units());
        active.narration = Set(entry.narration);
        let updated = active.update(&txn).await.map_err(db_error)?;

        txn.commit().await.map_err(db_error)?;

        info!(%entry_id, voucher_id = %voucher.id, "Entry updated");
        Ok(updated.into())
    }

    /// Removes an entry from a draft voucher.
    ///
    /// Remaining entries keep their line numbers.
    ///
    /// # Errors
    ///
    /// Returns `LedgerEntryNotFound` or `VoucherNotDraft`.
    pub async fn remove_entry(&self, entry_id: LedgerEntryId) -> Result<(), LedgerError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let model = find_entry(&txn, entry_id).await?;
        let voucher: Voucher = lock_voucher(&txn, VoucherId::from_uuid(model.voucher_id)).await?.into();
        voucher.ensure_draft()?;

        model.delete(&txn).await.map_err(db_error)?;
        txn.commit().await.map_err(db_error)?;

        info!(%entry_id, voucher_id = %voucher.id, "Entry removed");
        Ok(())
    }

    /// Deletes a draft voucher and its entries.
    ///
    /// The voucher's number is not reused.
    ///
    /// # Errors
    ///
    /// Returns `VoucherNotFound` or `VoucherNotDraft`.
    pub async fn discard_draft(&self, voucher_id: VoucherId) -> Result<(), LedgerError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let model = lock_voucher(&txn, voucher_id).await?;
        Voucher::from(model.clone()).ensure_draft()?;

        ledger_entries::Entity::delete_many()
            .filter(ledger_entries::Column::VoucherId.eq(voucher_id.into_inner()))
            .exec(&txn)
            .await
            .map_err(db_error)?;
        let number = model.number.clone();
        model.delete(&txn).await.map_err(db_error)?;

        txn.commit().await.map_err(db_error)?;

        info!(%voucher_id, %number, "Draft voucher discarded");
        Ok(())
    }

    /// Posts a draft voucher.
    ///
    /// The voucher must be a draft with at least two entries, equal debit
    /// and credit totals, and only active accounts. On success the voucher
    /// and its entries become immutable and a `VoucherPosted` event is
    /// published after commit. On failure nothing changes.
    ///
    /// # Errors
    ///
    /// Returns `VoucherNotFound`, `VoucherNotDraft`, `InsufficientEntries`,
    /// `Unbalanced`, `UnknownAccount`, `InactiveAccount` or `AmountOverflow`.
    #[instrument(skip(self))]
    pub async fn post_voucher(&self, voucher_id: VoucherId) -> Result<VoucherDetail, LedgerError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let model = lock_voucher(&txn, voucher_id).await?;
        let posted = match post_in_txn(&txn, model).await {
            Ok(posted) => posted,
            Err(err) => {
                warn!(%voucher_id, error = %err, "Posting rejected");
                return Err(err);
            }
        };

        txn.commit().await.map_err(db_error)?;

        info!(
            %voucher_id,
            number = %posted.voucher.number,
            total = %posted.totals.debit,
            entries = posted.entries.len(),
            "Voucher posted"
        );
        self.events.publish(&posted.event());

        Ok(posted.into_detail())
    }

    /// Gets a voucher with its entries and totals.
    ///
    /// # Errors
    ///
    /// Returns `VoucherNotFound` if the voucher does not exist.
    pub async fn get_voucher(&self, voucher_id: VoucherId) -> Result<VoucherDetail, LedgerError> {
        let model = vouchers::Entity::find_by_id(voucher_id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_error)?
            .ok_or(LedgerError::VoucherNotFound(voucher_id))?;

        let entries = load_entries(&self.db, voucher_id).await?;
        let totals = PostingEngine::calculate_totals(&entries)?;

        Ok(VoucherDetail {
            voucher: model.into(),
            entries,
            total_debit: totals.debit,
            total_credit: totals.credit,
        })
    }

    /// Lists vouchers in creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_vouchers(&self, filter: VoucherFilter) -> Result<Vec<Voucher>, LedgerError> {
        let mut query = vouchers::Entity::find().order_by_asc(vouchers::Column::Id);

        if let Some(status) = filter.status {
            query = query.filter(vouchers::Column::Status.eq(DbVoucherStatus::from(status)));
        }

        if let Some(voucher_type) = filter.voucher_type {
            query = query.filter(vouchers::Column::VoucherType.eq(DbVoucherType::from(voucher_type)));
        }

        if let Some(reference) = filter.reference {
            query = query
                .filter(vouchers::Column::SourceType.eq(reference.source_type))
                .filter(vouchers::Column::SourceId.eq(reference.source_id));
        }

        let models = query.all(&self.db).await.map_err(db_error)?;
        Ok(models.into_iter().map(Voucher::from).collect())
    }
}

/// Result of posting a voucher inside a transaction.
pub(crate) struct Posted {
    pub(crate) voucher: Voucher,
    pub(crate) entries: Vec<LedgerEntry>,
    pub(crate) totals: VoucherTotals,
}

impl Posted {
    fn event(&self) -> LedgerEvent {
        LedgerEvent::VoucherPosted {
            voucher_id: self.voucher.id,
            number: self.voucher.number.clone(),
            voucher_type: self.voucher.voucher_type,
            accounts: PostingEngine::touched_accounts(&self.entries),
            total: self.totals.debit,
            timestamp: self.voucher.posted_at.unwrap_or(self.voucher.updated_at),
        }
    }

    pub(crate) fn into_detail(self) -> VoucherDetail {
        VoucherDetail {
            voucher: self.voucher,
            entries: self.entries,
            total_debit: self.totals.debit,
            total_credit: self.totals.credit,
        }
    }
}

/// Loads a voucher and locks its row until the transaction ends.
pub(crate) async fn lock_voucher<C: ConnectionTrait>(
    conn: &C,
    voucher_id: VoucherId,
) -> Result<vouchers::Model, LedgerError> {
    vouchers::Entity::find_by_id(voucher_id.into_inner())
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(db_error)?
        .ok_or(LedgerError::VoucherNotFound(voucher_id))
}

/// Inserts a draft voucher, allocating its number on `conn`.
pub(crate) async fn insert_draft<C: ConnectionTrait>(
    conn: &C,
    input: NewVoucher,
    reverses: Option<VoucherId>,
) -> Result<vouchers::Model, LedgerError> {
    let number = VoucherSequence.allocate(conn, input.voucher_type).await?;
    let now = Utc::now();
    let (source_type, source_id) = input
        .reference
        .map_or((None, None), |r| (Some(r.source_type), Some(r.source_id)));

    vouchers::ActiveModel {
        id: Set(VoucherId::new().into_inner()),
        number: Set(number),
        voucher_type: Set(input.voucher_type.into()),
        status: Set(DbVoucherStatus::Draft),
        narration: Set(input.narration),
        source_type: Set(source_type),
        source_id: Set(source_id),
        reverses_voucher_id: Set(reverses.map(VoucherId::into_inner)),
        reversed_by_voucher_id: Set(None),
        posted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await
    .map_err(db_error)
}

/// Inserts one entry at `line_no`.
pub(crate) async fn insert_entry<C: ConnectionTrait>(
    conn: &C,
    voucher_id: VoucherId,
    line_no: i32,
    entry: NewEntry,
) -> Result<ledger_entries::Model, LedgerError> {
    ledger_entries::ActiveModel {
        id: Set(LedgerEntryId::new().into_inner()),
        voucher_id: Set(voucher_id.into_inner()),
        account_id: Set(entry.account_id.into_inner()),
        entry_type: Set(entry.entry_type.into()),
        amount: Set(entry.amount.minor_units()),
        narration: Set(entry.narration),
        line_no: Set(line_no),
        created_at: Set(Utc::now()),
    }
    .insert(conn)
    .await
    .map_err(db_error)
}

/// Loads a voucher's entries in line order.
pub(crate) async fn load_entries<C: ConnectionTrait>(
    conn: &C,
    voucher_id: VoucherId,
) -> Result<Vec<LedgerEntry>, LedgerError> {
    let models = ledger_entries::Entity::find()
        .filter(ledger_entries::Column::VoucherId.eq(voucher_id.into_inner()))
        .order_by_asc(ledger_entries::Column::LineNo)
        .all(conn)
        .await
        .map_err(db_error)?;
    Ok(models.into_iter().map(LedgerEntry::from).collect())
}

/// Validates and posts a locked draft voucher on `conn`.
///
/// The caller owns the transaction and decides whether to commit.
pub(crate) async fn post_in_txn<C: ConnectionTrait>(
    conn: &C,
    model: vouchers::Model,
) -> Result<Posted, LedgerError> {
    let mut voucher = Voucher::from(model.clone());
    let entries = load_entries(conn, voucher.id).await?;

    let account_ids: Vec<_> = PostingEngine::touched_accounts(&entries)
        .into_iter()
        .map(AccountId::into_inner)
        .collect();
    let activity: HashMap<AccountId, bool> = accounts::Entity::find()
        .filter(accounts::Column::Id.is_in(account_ids))
        .all(conn)
        .await
        .map_err(db_error)?
        .into_iter()
        .map(|a| (AccountId::from_uuid(a.id), a.is_active))
        .collect();

    let totals = PostingEngine::validate_for_posting(&voucher, &entries, |id| activity.get(&id).copied())?;

    let now = Utc::now();
    voucher.mark_posted(now)?;

    let mut active = model.into_active_model();
    active.status = Set(DbVoucherStatus::Posted);
    active.posted_at = Set(Some(now));
    active.updated_at = Set(now);
    active.update(conn).await.map_err(db_error)?;

    Ok(Posted {
        voucher,
        entries,
        totals,
    })
}

async fn find_entry<C: ConnectionTrait>(
    conn: &C,
    entry_id: LedgerEntryId,
) -> Result<ledger_entries::Model, LedgerError> {
    ledger_entries::Entity::find_by_id(entry_id.into_inner())
        .one(conn)
        .await
        .map_err(db_error)?
        .ok_or(LedgerError::LedgerEntryNotFound(entry_id))
}

async fn ensure_postable<C: ConnectionTrait>(conn: &C, account_id: AccountId) -> Result<(), LedgerError> {
    let account = accounts::Entity::find_by_id(account_id.into_inner())
        .one(conn)
        .await
        .map_err(db_error)?
        .map(Account::from);
    AccountRules::validate_postable(account_id, account.as_ref())
}

async fn next_line_no<C: ConnectionTrait>(conn: &C, voucher_id: VoucherId) -> Result<i32, LedgerError> {
    let last = ledger_entries::Entity::find()
        .filter(ledger_entries::Column::VoucherId.eq(voucher_id.into_inner()))
        .order_by_desc(ledger_entries::Column::LineNo)
        .one(conn)
        .await
        .map_err(db_error)?;
    Ok(last.map_or(1, |entry| entry.line_no + 1))
}

