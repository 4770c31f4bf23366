//! Matching rules for statement lines against posted entries.

use chrono::{DateTime, Utc};
use ledgerline_shared::types::{AccountId, LedgerEntryId, Money, VoucherId};

use super::types::{MatchStatus, ReconciliationRecord, StatementLine};
use crate::ledger::entry::validate_amount;
use crate::ledger::{LedgerError, VoucherStatus};

/// What the matcher needs to know about a candidate ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryCandidate {
    /// The entry.
    pub entry_id: LedgerEntryId,
    /// Owning voucher.
    pub voucher_id: VoucherId,
    /// The entry's account.
    pub account_id: AccountId,
    /// The entry's amount.
    pub amount: Money,
    /// Status of the owning voucher.
    pub voucher_status: VoucherStatus,
}

/// How strictly a match is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Amounts must agree; the record becomes `Matched`.
    Strict,
    /// Amounts may differ; the record becomes `Disputed`.
    Dispute,
}

impl MatchMode {
    /// Status recorded on success.
    #[must_use]
    pub const fn resulting_status(self) -> MatchStatus {
        match self {
            Self::Strict => MatchStatus::Matched,
            Self::Dispute => MatchStatus::Disputed,
        }
    }
}

/// Reconciliation rules.
pub struct Matcher;

impl Matcher {
    /// Validates an imported statement.
    ///
    /// # Errors
    ///
    /// Returns `NonPositiveAmount` for the first line whose amount is not positive.
    pub fn validate_lines(lines: &[StatementLine]) -> Result<(), LedgerError> {
        lines.iter().try_for_each(|line| validate_amount(line.amount))
    }

    /// Checks whether `record` may claim `entry`.
    ///
    /// `claimed_elsewhere` is true when another record already points at the entry.
    ///
    /// # Errors
    ///
    /// - `AlreadyMatched` if either side is already claimed
    /// - `NotPosted` if the entry's voucher is still a draft
    /// - `EntryAccountMismatch` if the entry is on a different account
    /// - `AmountMismatch` in strict mode when the amounts differ
    pub fn check_match(
        record: &ReconciliationRecord,
        entry: &EntryCandidate,
        claimed_elsewhere: bool,
        mode: MatchMode,
    ) -> Result<(), LedgerError> {
        if let Some(current) = record.matched_entry_id {
            return Err(LedgerError::AlreadyMatched(format!(
                "statement line {} already claims entry {current}",
                record.external_ref
            )));
        }
        if claimed_elsewhere {
            return Err(LedgerError::AlreadyMatched(format!(
                "entry {} is claimed by another statement line",
                entry.entry_id
            )));
        }
        if !entry.voucher_status.is_posted() {
            return Err(LedgerError::NotPosted {
                voucher_id: entry.voucher_id,
                status: entry.voucher_status,
            });
        }
        if entry.account_id != record.account_id {
            return Err(LedgerError::EntryAccountMismatch {
                entry_id: entry.entry_id,
                account_id: record.account_id,
            });
        }
        if mode == MatchMode::Strict && entry.amount != record.amount {
            return Err(LedgerError::AmountMismatch {
                statement: record.amount,
                entry: entry.amount,
            });
        }
        Ok(())
    }

    /// Applies a successful match to `record`.
    pub fn apply_match(
        record: &mut ReconciliationRecord,
        entry_id: LedgerEntryId,
        mode: MatchMode,
        note: Option<String>,
        at: DateTime<Utc>,
    ) {
        record.matched_entry_id = Some(entry_id);
        record.status = mode.resulting_status();
        record.matched_at = Some(at);
        record.note = note;
        record.updated_at = at;
    }

    /// Releases any claim and returns `record` to `Unmatched`.
    pub fn apply_unmatch(record: &mut ReconciliationRecord, at: DateTime<Utc>) {
        record.matched_entry_id = None;
        record.status = MatchStatus::Unmatched;
        record.matched_at = None;
        record.note = None;
        record.updated_at = at;
    }
}
