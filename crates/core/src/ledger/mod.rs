//! Double-entry bookkeeping logic.
//!
//! This module implements the core ledger functionality:
//! - Chart of accounts and hierarchy rules
//! - Vouchers, ledger entries, and the Draft/Posted/Reversed state machine
//! - Posting validation
//! - Hierarchical balance calculations and the trial balance
//! - Reversal mirroring
//! - Voucher numbering
//! - Error types for ledger operations

pub mod account;
pub mod balance;
pub mod entry;
pub mod error;
pub mod posting;
pub mod reversal;
pub mod sequence;
pub mod types;
pub mod voucher;

#[cfg(test)]
mod balance_props;
#[cfg(test)]
mod posting_props;

pub use account::{Account, AccountFilter, AccountNode, AccountRules, NewAccount};
pub use balance::{AccountStatement, BalanceTree, PostedEntry, StatementLine, TrialBalance, TrialBalanceLine};
pub use entry::{EntryChanges, LedgerEntry, NewEntry};
pub use error::LedgerError;
pub use posting::{PostingEngine, VoucherTotals};
pub use reversal::ReversalEngine;
pub use sequence::format_voucher_number;
pub use types::{AccountType, EntryType, NormalBalance, VoucherStatus, VoucherType};
pub use voucher::{NewVoucher, Voucher, VoucherDetail, VoucherFilter, VoucherReference};
