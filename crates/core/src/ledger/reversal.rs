//! Reversal of posted vouchers.
//!
//! A reversal never touches the original voucher's entries. It produces a
//! brand-new voucher whose entries swap debit and credit on the same
//! accounts and amounts, which is then posted through the normal posting
//! path so the balance check runs again.

use super::entry::{LedgerEntry, NewEntry};
use super::error::LedgerError;
use super::types::{VoucherStatus, VoucherType};
use super::voucher::{NewVoucher, Voucher};

/// Stateless service for creating reversing vouchers.
pub struct ReversalEngine;

impl ReversalEngine {
    /// Checks that `voucher` can be reversed.
    ///
    /// # Errors
    ///
    /// Returns `NotPosted` for drafts and `AlreadyReversed` if a reversal
    /// already references the voucher.
    pub fn check_reversible(voucher: &Voucher) -> Result<(), LedgerError> {
        match voucher.status {
            VoucherStatus::Draft => Err(LedgerError::NotPosted {
                voucher_id: voucher.id,
                status: voucher.status,
            }),
            VoucherStatus::Reversed => Err(LedgerError::AlreadyReversed(voucher.id)),
            VoucherStatus::Posted if voucher.reversed_by_voucher_id.is_some() => {
                Err(LedgerError::AlreadyReversed(voucher.id))
            }
            VoucherStatus::Posted => Ok(()),
        }
    }

    /// Builds the header of the reversal voucher.
    ///
    /// The reversal keeps the original's business reference and carries
    /// the narration `Reversal of <number>: <reason>`.
    #[must_use]
    pub fn reversal_header(original: &Voucher, reason: &str) -> NewVoucher {
        NewVoucher {
            voucher_type: VoucherType::Reversal,
            narration: format!("Reversal of {}: {reason}", original.number),
            reference: original.reference.clone(),
        }
    }

    /// Mirrors every entry: debits become credits and credits become debits.
    ///
    /// Accounts and amounts are preserved; line narrations are prefixed with
    /// `Reversal: `.
    #[must_use]
    pub fn mirror_entries(original: &Voucher, entries: &[LedgerEntry]) -> Vec<NewEntry> {
        entries
            .iter()
            .map(|entry| NewEntry {
                account_id: entry.account_id,
                entry_type: entry.entry_type.flipped(),
                amount: entry.amount,
                narration: Some(format!(
                    "Reversal: {}",
                    entry.narration.as_deref().unwrap_or(&original.number)
                )),
            })
            .collect()
    }
}
