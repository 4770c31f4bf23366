//! Ledger entry domain types.

use chrono::{DateTime, Utc};
use ledgerline_shared::types::{AccountId, LedgerEntryId, Money, VoucherId};
use serde::{Deserialize, Serialize};

use super::error::LedgerError;
use super::types::EntryType;

/// A single debit or credit line of a voucher.
///
/// Entries have no lifecycle of their own: they are editable while the
/// owning voucher is a draft and read-only forever once it posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique identifier for this entry.
    pub id: LedgerEntryId,
    /// The voucher this entry belongs to.
    pub voucher_id: VoucherId,
    /// The account affected by this entry.
    pub account_id: AccountId,
    /// Whether this is a debit or credit.
    pub entry_type: EntryType,
    /// Strictly positive amount in minor units.
    pub amount: Money,
    /// Optional description for this line item.
    pub narration: Option<String>,
    /// Position within the voucher, starting at 1.
    pub line_no: i32,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Returns the signed amount (positive for debit, negative for credit).
    #[must_use]
    pub fn signed_amount(&self) -> Money {
        signed(self.entry_type, self.amount)
    }
}

/// Debit-positive signing of an amount.
#[must_use]
pub fn signed(entry_type: EntryType, amount: Money) -> Money {
    match entry_type {
        EntryType::Debit => amount,
        EntryType::Credit => -amount,
    }
}

/// Input for adding an entry to a draft voucher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntry {
    /// Target account.
    pub account_id: AccountId,
    /// Debit or credit.
    pub entry_type: EntryType,
    /// Amount in minor units.
    pub amount: Money,
    /// Optional line narration.
    pub narration: Option<String>,
}

impl NewEntry {
    /// Creates a debit line.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: impl Into<Money>) -> Self {
        Self {
            account_id,
            entry_type: EntryType::Debit,
            amount: amount.into(),
            narration: None,
        }
    }

    /// Creates a credit line.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: impl Into<Money>) -> Self {
        Self {
            account_id,
            entry_type: EntryType::Credit,
            amount: amount.into(),
            narration: None,
        }
    }

    /// Sets the line narration.
    #[must_use]
    pub fn with_narration(mut self, narration: impl Into<String>) -> Self {
        self.narration = Some(narration.into());
        self
    }
}

/// Partial update of a draft entry. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryChanges {
    /// New target account.
    pub account_id: Option<AccountId>,
    /// New direction.
    pub entry_type: Option<EntryType>,
    /// New amount.
    pub amount: Option<Money>,
    /// New narration; `Some(None)` clears it.
    pub narration: Option<Option<String>>,
}

impl EntryChanges {
    /// Returns true if no field would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.account_id.is_none()
            && self.entry_type.is_none()
            && self.amount.is_none()
            && self.narration.is_none()
    }

    /// Applies the changes to `entry`.
    pub fn apply_to(&self, entry: &mut LedgerEntry) {
        if let Some(account_id) = self.account_id {
            entry.account_id = account_id;
        }
        if let Some(entry_type) = self.entry_type {
            entry.entry_type = entry_type;
        }
        if let Some(amount) = self.amount {
            entry.amount = amount;
        }
        if let Some(narration) = &self.narration {
            entry.narration.clone_from(narration);
        }
    }
}

/// Validates an entry amount.
///
/// # Errors
///
/// Returns `NonPositiveAmount` if the amount is zero or negative.
pub fn validate_amount(amount: Money) -> Result<(), LedgerError> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(LedgerError::NonPositiveAmount(amount))
    }
}
