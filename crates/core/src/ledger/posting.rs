//! Posting validation.
//!
//! The checks that guard the Draft -> Posted transition. The caller runs
//! them against entries and accounts read inside the same transaction that
//! holds the voucher row lock, so they see a consistent snapshot.

use ledgerline_shared::types::{AccountId, Money};
use serde::{Deserialize, Serialize};

use super::entry::LedgerEntry;
use super::error::LedgerError;
use super::types::EntryType;
use super::voucher::Voucher;

/// Minimum number of entries in a postable voucher.
pub const MIN_ENTRIES: usize = 2;

/// Debit and credit totals of a voucher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherTotals {
    /// Sum of debit amounts.
    pub debit: Money,
    /// Sum of credit amounts.
    pub credit: Money,
}

impl VoucherTotals {
    /// Returns true if debits equal credits exactly.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.debit == self.credit
    }
}

/// Posting engine rules.
///
/// Pure logic with no database dependencies.
pub struct PostingEngine;

impl PostingEngine {
    /// Sums debit and credit amounts independently.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow` if either sum exceeds `i64`.
    pub fn calculate_totals(entries: &[LedgerEntry]) -> Result<VoucherTotals, LedgerError> {
        let side = |side: EntryType| {
            Money::checked_sum(
                entries
                    .iter()
                    .filter(move |e| e.entry_type == side)
                    .map(|e| e.amount),
            )
            .ok_or(LedgerError::AmountOverflow)
        };

        Ok(VoucherTotals {
            debit: side(EntryType::Debit)?,
            credit: side(EntryType::Credit)?,
        })
    }

    /// Validates a voucher for posting.
    ///
    /// Checks, in order:
    /// 1. The voucher is a draft
    /// 2. At least two entries
    /// 3. Debit total equals credit total
    /// 4. Every referenced account exists and is active
    ///
    /// `account_is_active` returns `None` for an unknown account.
    ///
    /// # Errors
    ///
    /// Returns the first failing check's `LedgerError`.
    pub fn validate_for_posting<A>(
        voucher: &Voucher,
        entries: &[LedgerEntry],
        account_is_active: A,
    ) -> Result<VoucherTotals, LedgerError>
    where
        A: Fn(AccountId) -> Option<bool>,
    {
        voucher.ensure_draft()?;

        if entries.len() < MIN_ENTRIES {
            return Err(LedgerError::InsufficientEntries(entries.len()));
        }

        let totals = Self::calculate_totals(entries)?;
        if !totals.is_balanced() {
            return Err(LedgerError::Unbalanced {
                debit: totals.debit,
                credit: totals.credit,
            });
        }

        for entry in entries {
            match account_is_active(entry.account_id) {
                None => return Err(LedgerError::UnknownAccount(entry.account_id)),
                Some(false) => return Err(LedgerError::InactiveAccount(entry.account_id)),
                Some(true) => {}
            }
        }

        Ok(totals)
    }

    /// Returns the distinct accounts touched by `entries`, in first-seen order.
    #[must_use]
    pub fn touched_accounts(entries: &[LedgerEntry]) -> Vec<AccountId> {
        let mut accounts: Vec<AccountId> = Vec::with_capacity(entries.len());
        for entry in entries {
            if !accounts.contains(&entry.account_id) {
                accounts.push(entry.account_id);
            }
        }
        accounts
    }
}
