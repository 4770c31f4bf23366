//! Voucher aggregate and its state machine.

use chrono::{DateTime, Utc};
use ledgerline_shared::types::{Money, VoucherId};
use serde::{Deserialize, Serialize};

use super::entry::LedgerEntry;
use super::error::LedgerError;
use super::types::{VoucherStatus, VoucherType};

/// Link from a voucher back to the business object that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherReference {
    /// Kind of originating object, e.g. `invoice`.
    pub source_type: String,
    /// Identifier of the originating object.
    pub source_id: String,
}

impl VoucherReference {
    /// Creates a reference.
    #[must_use]
    pub fn new(source_type: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            source_type: source_type.into(),
            source_id: source_id.into(),
        }
    }
}

/// A voucher header: one business transaction grouping balanced entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voucher {
    /// Unique identifier.
    pub id: VoucherId,
    /// Sequential number within the voucher type's series, e.g. `JV-000042`.
    pub number: String,
    /// Voucher type.
    pub voucher_type: VoucherType,
    /// Current status.
    pub status: VoucherStatus,
    /// Free-text narration.
    pub narration: String,
    /// Originating business object, when auto-posted.
    pub reference: Option<VoucherReference>,
    /// For a reversal voucher, the voucher it negates.
    pub reverses_voucher_id: Option<VoucherId>,
    /// For a reversed voucher, the reversal that negates it.
    pub reversed_by_voucher_id: Option<VoucherId>,
    /// When the voucher was posted.
    pub posted_at: Option<DateTime<Utc>>,
    /// When the voucher was created.
    pub created_at: DateTime<Utc>,
    /// When the voucher was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Voucher {
    /// Returns true if entries may still be added, changed, or removed.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        self.status.is_editable()
    }

    /// Returns true if the voucher can be reversed.
    #[must_use]
    pub fn can_reverse(&self) -> bool {
        self.status == VoucherStatus::Posted && self.reversed_by_voucher_id.is_none()
    }

    /// Fails unless the voucher is a draft.
    ///
    /// # Errors
    ///
    /// Returns `VoucherNotDraft` for posted or reversed vouchers.
    pub fn ensure_draft(&self) -> Result<(), LedgerError> {
        if self.is_editable() {
            Ok(())
        } else {
            Err(LedgerError::VoucherNotDraft {
                voucher_id: self.id,
                status: self.status,
            })
        }
    }

    /// Transitions `Draft -> Posted`.
    ///
    /// # Errors
    ///
    /// Returns `VoucherNotDraft` if the voucher already left Draft.
    pub fn mark_posted(&mut self, at: DateTime<Utc>) -> Result<(), LedgerError> {
        self.ensure_draft()?;
        self.status = VoucherStatus::Posted;
        self.posted_at = Some(at);
        self.updated_at = at;
        Ok(())
    }

    /// Transitions `Posted -> Reversed`, recording the reversal voucher.
    ///
    /// # Errors
    ///
    /// Returns `NotPosted` for drafts and `AlreadyReversed` if a reversal exists.
    pub fn mark_reversed(&mut self, reversal_id: VoucherId, at: DateTime<Utc>) -> Result<(), LedgerError> {
        super::reversal::ReversalEngine::check_reversible(self)?;
        self.status = VoucherStatus::Reversed;
        self.reversed_by_voucher_id = Some(reversal_id);
        self.updated_at = at;
        Ok(())
    }
}

/// Input for creating a draft voucher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVoucher {
    /// Voucher type.
    pub voucher_type: VoucherType,
    /// Free-text narration.
    pub narration: String,
    /// Originating business object.
    pub reference: Option<VoucherReference>,
}

impl NewVoucher {
    /// Creates a voucher input without a reference.
    #[must_use]
    pub fn new(voucher_type: VoucherType, narration: impl Into<String>) -> Self {
        Self {
            voucher_type,
            narration: narration.into(),
            reference: None,
        }
    }

    /// Attaches an originating business object.
    #[must_use]
    pub fn with_reference(mut self, reference: VoucherReference) -> Self {
        self.reference = Some(reference);
        self
    }
}

/// A voucher together with its entries and totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoucherDetail {
    /// Header.
    pub voucher: Voucher,
    /// Entries ordered by line number.
    pub entries: Vec<LedgerEntry>,
    /// Sum of debit amounts.
    pub total_debit: Money,
    /// Sum of credit amounts.
    pub total_credit: Money,
}

/// Filter for listing vouchers. `None` fields do not filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoucherFilter {
    /// Only vouchers in this status.
    pub status: Option<VoucherStatus>,
    /// Only vouchers of this type.
    pub voucher_type: Option<VoucherType>,
    /// Only vouchers produced by this business object.
    pub reference: Option<VoucherReference>,
}
