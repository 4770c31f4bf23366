//! Core business logic for Ledgerline.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here; the `db`
//! crate loads rows, calls into these rules, and persists the outcome inside
//! a transaction.
//!
//! # Modules
//!
//! - `ledger` - Chart of accounts, vouchers, posting, balances, reversal
//! - `reconciliation` - Matching external statement lines to posted entries
//! - `events` - Domain events emitted after a successful commit

pub mod events;
pub mod ledger;
pub mod reconciliation;
