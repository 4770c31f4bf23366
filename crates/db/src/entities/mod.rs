//! `SeaORM` entity definitions.

pub mod accounts;
pub mod ledger_entries;
pub mod reconciliation_records;
pub mod sea_orm_active_enums;
pub mod voucher_sequences;
pub mod vouchers;
