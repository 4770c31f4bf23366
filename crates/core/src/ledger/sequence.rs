//! Voucher numbering.
//!
//! Every voucher type draws from its own series. The persistence layer
//! keeps one counter row per series and increments it under a row lock in
//! the transaction that inserts the voucher.

use super::types::VoucherType;

/// Zero-padded width of the numeric part.
pub const NUMBER_WIDTH: usize = 6;

impl VoucherType {
    /// Series prefix used in voucher numbers.
    #[must_use]
    pub const fn series(self) -> &'static str {
        match self {
            Self::Journal => "JV",
            Self::Payment => "PMT",
            Self::Receipt => "RCT",
            Self::Sales => "SAL",
            Self::Purchase => "PUR",
            Self::Adjustment => "ADJ",
            Self::Reversal => "REV",
        }
    }
}

/// Formats a voucher number, e.g. `JV-000042`.
///
/// Values wider than [`NUMBER_WIDTH`] digits are printed in full.
#[must_use]
pub fn format_voucher_number(voucher_type: VoucherType, value: i64) -> String {
    format!("{}-{value:0width$}", voucher_type.series(), width = NUMBER_WIDTH)
}
