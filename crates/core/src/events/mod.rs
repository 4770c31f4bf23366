//! Domain events emitted by the ledger.
//!
//! Events are published only after the posting transaction commits. They
//! feed audit logging and downstream integrations; delivery is best-effort
//! and never affects the outcome of the operation that produced them.

mod sink;

pub use sink::{ChannelEventSink, LedgerEventSink, TracingEventSink};

use chrono::{DateTime, Utc};
use ledgerline_shared::types::{AccountId, Money, VoucherId};
use serde::{Deserialize, Serialize};

use crate::ledger::VoucherType;

/// Domain events emitted by the posting and reversal engines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A draft voucher was posted.
    VoucherPosted {
        /// The posted voucher.
        voucher_id: VoucherId,
        /// Its number.
        number: String,
        /// Its type.
        voucher_type: VoucherType,
        /// Distinct accounts touched by its entries.
        accounts: Vec<AccountId>,
        /// Debit total (equal to the credit total).
        total: Money,
        /// Posting timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A posted voucher was reversed.
    VoucherReversed {
        /// The original voucher.
        voucher_id: VoucherId,
        /// The reversal voucher.
        reversal_voucher_id: VoucherId,
        /// The reversal voucher's number.
        reversal_number: String,
        /// Distinct accounts touched.
        accounts: Vec<AccountId>,
        /// Reason given for the reversal.
        reason: String,
        /// Reversal timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl LedgerEvent {
    /// Stable event name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::VoucherPosted { .. } => "voucher_posted",
            Self::VoucherReversed { .. } => "voucher_reversed",
        }
    }

    /// The voucher the event is about.
    #[must_use]
    pub const fn voucher_id(&self) -> VoucherId {
        match self {
            Self::VoucherPosted { voucher_id, .. } | Self::VoucherReversed { voucher_id, .. } => *voucher_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_tag() {
        let event = LedgerEvent::VoucherPosted {
            voucher_id: VoucherId::new(),
            number: "JV-000001".to_string(),
            voucher_type: VoucherType::Journal,
            accounts: vec![AccountId::new(), AccountId::new()],
            total: Money::from_minor(500),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "voucher_posted");
        assert_eq!(json["total"], 500);
        assert_eq!(json["voucher_type"], "journal");
        assert_eq!(event.name(), "voucher_posted");
    }
}
