//! Ledger error types for validation and state errors.
//!
//! This module defines all errors that can occur during ledger operations,
//! grouped by the component that raises them: account registry, entry
//! construction, posting, reversal, and reconciliation.

use ledgerline_shared::AppError;
use ledgerline_shared::types::{AccountId, LedgerEntryId, Money, ReconciliationId, VoucherId};
use thiserror::Error;

use super::types::VoucherStatus;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    // ========== Account Registry Errors ==========
    /// Another account already uses this code.
    #[error("Account code already exists: {0}")]
    DuplicateCode(String),

    /// Parent is unknown, inactive, or would introduce a cycle.
    #[error("Invalid parent account {parent_id}: {reason}")]
    InvalidParent {
        /// The rejected parent.
        parent_id: AccountId,
        /// Why the parent was rejected.
        reason: String,
    },

    /// Account still has active children.
    #[error("Account {0} has active child accounts")]
    HasActiveChildren(AccountId),

    // ========== Entry Construction Errors ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    UnknownAccount(AccountId),

    /// Account is inactive and cannot be used.
    #[error("Account {0} is inactive")]
    InactiveAccount(AccountId),

    /// Entry amount must be strictly positive.
    #[error("Entry amount must be positive, got {0}")]
    NonPositiveAmount(Money),

    /// Voucher is not in Draft.
    #[error("Voucher {voucher_id} is not a draft (status: {status:?})")]
    VoucherNotDraft {
        /// The voucher.
        voucher_id: VoucherId,
        /// Its current status.
        status: VoucherStatus,
    },

    /// Voucher not found.
    #[error("Voucher not found: {0}")]
    VoucherNotFound(VoucherId),

    /// Ledger entry not found.
    #[error("Ledger entry not found: {0}")]
    LedgerEntryNotFound(LedgerEntryId),

    // ========== Posting Errors ==========
    /// Voucher must have at least 2 entries.
    #[error("Voucher must have at least 2 entries, found {0}")]
    InsufficientEntries(usize),

    /// Voucher is not balanced (debits != credits).
    #[error("Voucher is not balanced. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// Total debit amount.
        debit: Money,
        /// Total credit amount.
        credit: Money,
    },

    /// A sum of amounts does not fit in 64 bits.
    #[error("Amount overflow while summing entries")]
    AmountOverflow,

    // ========== Reversal Errors ==========
    /// Voucher has not been posted.
    #[error("Voucher {voucher_id} is not posted (status: {status:?})")]
    NotPosted {
        /// The voucher.
        voucher_id: VoucherId,
        /// Its current status.
        status: VoucherStatus,
    },

    /// Voucher already has a reversal.
    #[error("Voucher {0} has already been reversed")]
    AlreadyReversed(VoucherId),

    // ========== Reconciliation Errors ==========
    /// Statement line or ledger entry is already claimed.
    #[error("Already matched: {0}")]
    AlreadyMatched(String),

    /// Statement amount differs from the entry amount.
    #[error("Amount mismatch: statement {statement}, entry {entry}")]
    AmountMismatch {
        /// Statement line amount.
        statement: Money,
        /// Ledger entry amount.
        entry: Money,
    },

    /// The ledger entry belongs to a different account than the statement.
    #[error("Ledger entry {entry_id} is not posted to account {account_id}")]
    EntryAccountMismatch {
        /// The ledger entry.
        entry_id: LedgerEntryId,
        /// The statement's account.
        account_id: AccountId,
    },

    /// Reconciliation record not found.
    #[error("Reconciliation record not found: {0}")]
    ReconciliationNotFound(ReconciliationId),

    // ========== Database Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl LedgerError {
    /// Returns the stable error code for callers and logs.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateCode(_) => "DUPLICATE_CODE",
            Self::InvalidParent { .. } => "INVALID_PARENT",
            Self::HasActiveChildren(_) => "HAS_ACTIVE_CHILDREN",
            Self::UnknownAccount(_) => "UNKNOWN_ACCOUNT",
            Self::InactiveAccount(_) => "INACTIVE_ACCOUNT",
            Self::NonPositiveAmount(_) => "NON_POSITIVE_AMOUNT",
            Self::VoucherNotDraft { .. } => "VOUCHER_NOT_DRAFT",
            Self::VoucherNotFound(_) => "VOUCHER_NOT_FOUND",
            Self::LedgerEntryNotFound(_) => "LEDGER_ENTRY_NOT_FOUND",
            Self::InsufficientEntries(_) => "INSUFFICIENT_ENTRIES",
            Self::Unbalanced { .. } => "UNBALANCED",
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
            Self::NotPosted { .. } => "NOT_POSTED",
            Self::AlreadyReversed(_) => "ALREADY_REVERSED",
            Self::AlreadyMatched(_) => "ALREADY_MATCHED",
            Self::AmountMismatch { .. } => "AMOUNT_MISMATCH",
            Self::EntryAccountMismatch { .. } => "ENTRY_ACCOUNT_MISMATCH",
            Self::ReconciliationNotFound(_) => "RECONCILIATION_NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns true if this error is retryable.
    ///
    /// Only infrastructure failures qualify. Every mutating operation
    /// re-checks state under a lock, so a retry after an ambiguous commit
    /// fails cleanly instead of applying twice.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::UnknownAccount(_)
            | LedgerError::VoucherNotFound(_)
            | LedgerError::LedgerEntryNotFound(_)
            | LedgerError::ReconciliationNotFound(_) => Self::NotFound(message),

            LedgerError::InvalidParent { .. }
            | LedgerError::NonPositiveAmount(_)
            | LedgerError::InsufficientEntries(_)
            | LedgerError::Unbalanced { .. }
            | LedgerError::AmountOverflow
            | LedgerError::AmountMismatch { .. }
            | LedgerError::EntryAccountMismatch { .. } => Self::Validation(message),

            LedgerError::HasActiveChildren(_)
            | LedgerError::InactiveAccount(_)
            | LedgerError::VoucherNotDraft { .. }
            | LedgerError::NotPosted { .. } => Self::BusinessRule(message),

            LedgerError::DuplicateCode(_)
            | LedgerError::AlreadyReversed(_)
            | LedgerError::AlreadyMatched(_) => Self::Conflict(message),

            LedgerError::Database(_) => Self::Database(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            LedgerError::InsufficientEntries(1).error_code(),
            "INSUFFICIENT_ENTRIES"
        );
        assert_eq!(
            LedgerError::Unbalanced {
                debit: Money::from_minor(500),
                credit: Money::from_minor(400),
            }
            .error_code(),
            "UNBALANCED"
        );
        assert_eq!(
            LedgerError::NonPositiveAmount(Money::ZERO).error_code(),
            "NON_POSITIVE_AMOUNT"
        );
        assert_eq!(
            LedgerError::AlreadyReversed(VoucherId::new()).error_code(),
            "ALREADY_REVERSED"
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(LedgerError::Database("connection reset".to_string()).is_retryable());
        assert!(!LedgerError::InsufficientEntries(0).is_retryable());
        assert!(!LedgerError::VoucherNotDraft {
            voucher_id: VoucherId::new(),
            status: VoucherStatus::Posted,
        }
        .is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::Unbalanced {
            debit: Money::from_minor(500),
            credit: Money::from_minor(400),
        };
        assert_eq!(err.to_string(), "Voucher is not balanced. Debit: 500, Credit: 400");

        let err = LedgerError::AmountMismatch {
            statement: Money::from_minor(500),
            entry: Money::from_minor(450),
        };
        assert_eq!(err.to_string(), "Amount mismatch: statement 500, entry 450");
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = LedgerError::VoucherNotFound(VoucherId::new()).into();
        assert_eq!(app.error_code(), "NOT_FOUND");

        let app: AppError = LedgerError::Unbalanced {
            debit: Money::from_minor(1),
            credit: Money::from_minor(2),
        }
        .into();
        assert_eq!(app.error_code(), "VALIDATION_ERROR");

        let app: AppError = LedgerError::DuplicateCode("1000-CASH".to_string()).into();
        assert_eq!(app.error_code(), "CONFLICT");

        let app: AppError = LedgerError::Database("timeout".to_string()).into();
        assert!(app.is_transient());
    }
}
