//! Ledger domain enumerations.
//!
//! This module defines the closed sets the posting engine matches on:
//! account types, entry direction, voucher types, and voucher status.

use ledgerline_shared::types::Money;
use serde::{Deserialize, Serialize};

/// Account type in the chart of accounts.
///
/// The type is informational for the hierarchy (any type may parent any
/// other) but it decides the sign convention used when reporting a balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Resources owned.
    Asset,
    /// Obligations owed.
    Liability,
    /// Owners' residual interest.
    Equity,
    /// Revenue earned.
    Income,
    /// Costs incurred.
    Expense,
}

impl AccountType {
    /// All account types, in chart-of-accounts order.
    pub const ALL: [Self; 5] = [
        Self::Asset,
        Self::Liability,
        Self::Equity,
        Self::Income,
        Self::Expense,
    ];

    /// Returns which side increases an account of this type.
    #[must_use]
    pub const fn normal_balance(self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense => NormalBalance::Debit,
            Self::Liability | Self::Equity | Self::Income => NormalBalance::Credit,
        }
    }

    /// Stable lowercase name, as stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

/// The side on which an account's balance grows.
///
/// - Asset/Expense: balance += debit - credit (debit-normal)
/// - Liability/Equity/Income: balance += credit - debit (credit-normal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalBalance {
    /// Debits increase the balance.
    Debit,
    /// Credits increase the balance.
    Credit,
}

impl NormalBalance {
    /// Converts a debit-minus-credit net figure into this convention.
    ///
    /// Returns `None` only when negating `i64::MIN`.
    #[must_use]
    pub fn from_net(self, debit_minus_credit: Money) -> Option<Money> {
        match self {
            Self::Debit => Some(debit_minus_credit),
            Self::Credit => debit_minus_credit.checked_neg(),
        }
    }
}

/// Entry type: either Debit or Credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Debit entry.
    Debit,
    /// Credit entry.
    Credit,
}

impl EntryType {
    /// Returns the opposite direction.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Debit => Self::Credit,
            Self::Credit => Self::Debit,
        }
    }
}

/// Voucher type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoucherType {
    /// General journal voucher.
    Journal,
    /// Outgoing payment.
    Payment,
    /// Incoming receipt.
    Receipt,
    /// Sales invoice posting.
    Sales,
    /// Purchase bill posting.
    Purchase,
    /// Manual adjustment.
    Adjustment,
    /// Mirror image of a previously posted voucher.
    Reversal,
}

impl VoucherType {
    /// All voucher types.
    pub const ALL: [Self; 7] = [
        Self::Journal,
        Self::Payment,
        Self::Receipt,
        Self::Sales,
        Self::Purchase,
        Self::Adjustment,
        Self::Reversal,
    ];

    /// Stable snake_case name, as stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Journal => "journal",
            Self::Payment => "payment",
            Self::Receipt => "receipt",
            Self::Sales => "sales",
            Self::Purchase => "purchase",
            Self::Adjustment => "adjustment",
            Self::Reversal => "reversal",
        }
    }
}

/// Voucher lifecycle state.
///
/// `Draft -> Posted -> Reversed`. `Reversed` annotates a posted voucher that
/// has a reversal voucher pointing at it; its entries still count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoucherStatus {
    /// Entries may be added, edited, or removed.
    Draft,
    /// Committed to the ledger (immutable).
    Posted,
    /// Posted and since reversed (immutable, terminal).
    Reversed,
}

impl VoucherStatus {
    /// Returns true if entries can still change.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns true if the voucher's entries contribute to balances.
    #[must_use]
    pub const fn is_posted(self) -> bool {
        matches!(self, Self::Posted | Self::Reversed)
    }
}
