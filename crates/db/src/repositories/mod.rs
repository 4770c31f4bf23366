//! Repositories implementing the ledger operations.
//!
//! Each mutating operation runs in its own database transaction and maps
//! storage failures into `LedgerError::Database`.

pub mod account;
pub mod balance;
mod convert;
pub mod reconciliation;
pub mod reversal;
pub mod sequence;
pub mod voucher;

pub use account::AccountRepository;
pub use balance::BalanceRepository;
pub use reconciliation::ReconciliationRepository;
pub use reversal::ReversalRepository;
pub use sequence::VoucherSequence;
pub use voucher::VoucherRepository;
