//! Reconciliation of external statements against posted entries.
//!
//! Statement lines are imported as `Unmatched` records. A reconciler then
//! claims a posted ledger entry for each line, either strictly (`Matched`)
//! or through the dispute path (`Disputed`). A ledger entry can be claimed
//! by at most one record at a time.

pub mod matching;
pub mod types;

pub use matching::{EntryCandidate, MatchMode, Matcher};
pub use types::{MatchStatus, ReconciliationRecord, StatementLine};
