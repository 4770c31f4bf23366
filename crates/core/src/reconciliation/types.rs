//! Reconciliation domain types.

use chrono::{DateTime, NaiveDate, Utc};
use ledgerline_shared::types::{AccountId, LedgerEntryId, Money, ReconciliationId};
use serde::{Deserialize, Serialize};

/// Match status of a statement line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    /// Not yet matched to a ledger entry.
    Unmatched,
    /// Matched to an entry of equal amount.
    Matched,
    /// Matched to an entry despite a discrepancy, recorded for follow-up.
    Disputed,
}

/// One line of an externally supplied statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementLine {
    /// External reference, e.g. the bank's transaction id.
    pub external_ref: String,
    /// Positive amount in minor units.
    pub amount: Money,
    /// Date on the statement.
    pub statement_date: NaiveDate,
    /// Free-text description from the statement.
    pub description: Option<String>,
}

impl StatementLine {
    /// Creates a statement line without a description.
    #[must_use]
    pub fn new(external_ref: impl Into<String>, amount: impl Into<Money>, statement_date: NaiveDate) -> Self {
        Self {
            external_ref: external_ref.into(),
            amount: amount.into(),
            statement_date,
            description: None,
        }
    }
}

/// A statement line tracked for reconciliation.
///
/// Records are never deleted; unmatching returns them to `Unmatched`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationRecord {
    /// Unique identifier.
    pub id: ReconciliationId,
    /// Account the statement belongs to.
    pub account_id: AccountId,
    /// External reference.
    pub external_ref: String,
    /// Statement amount.
    pub amount: Money,
    /// Statement date.
    pub statement_date: NaiveDate,
    /// Statement description.
    pub description: Option<String>,
    /// Claimed ledger entry, if any.
    pub matched_entry_id: Option<LedgerEntryId>,
    /// Current status.
    pub status: MatchStatus,
    /// When the current claim was made.
    pub matched_at: Option<DateTime<Utc>>,
    /// Reconciler's note on a disputed match.
    pub note: Option<String>,
    /// When the record was imported.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl ReconciliationRecord {
    /// Returns true if the record currently claims a ledger entry.
    #[must_use]
    pub fn has_claim(&self) -> bool {
        self.matched_entry_id.is_some()
    }
}
