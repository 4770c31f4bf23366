//! Conversions between database models and core domain types.

use ledgerline_core::ledger::{
    self, Account, LedgerEntry, LedgerError, Voucher, VoucherReference,
};
use ledgerline_core::reconciliation::{self, ReconciliationRecord};
use ledgerline_shared::types::{AccountId, LedgerEntryId, Money, ReconciliationId, VoucherId};
use sea_orm::{DbErr, SqlErr};

use crate::entities::{
    accounts, ledger_entries, reconciliation_records, sea_orm_active_enums as db_enums, vouchers,
};

/// Maps database enums to and from their core counterparts, variant by variant.
macro_rules! enum_mapping {
    ($db:ty, $core:ty, [$($variant:ident),+ $(,)?]) => {
        impl From<$db> for $core {
            fn from(value: $db) -> Self {
                match value {
                    $(<$db>::$variant => <$core>::$variant,)+
                }
            }
        }

        impl From<$core> for $db {
            fn from(value: $core) -> Self {
                match value {
                    $(<$core>::$variant => <$db>::$variant,)+
                }
            }
        }
    };
}

enum_mapping!(
    db_enums::AccountType,
    ledger::AccountType,
    [Asset, Liability, Equity, Income, Expense]
);
enum_mapping!(
    db_enums::VoucherType,
    ledger::VoucherType,
    [Journal, Payment, Receipt, Sales, Purchase, Adjustment, Reversal]
);
enum_mapping!(db_enums::VoucherStatus, ledger::VoucherStatus, [Draft, Posted, Reversed]);
enum_mapping!(db_enums::EntryType, ledger::EntryType, [Debit, Credit]);
enum_mapping!(
    db_enums::MatchStatus,
    reconciliation::MatchStatus,
    [Unmatched, Matched, Disputed]
);

impl From<accounts::Model> for Account {
    fn from(model: accounts::Model) -> Self {
        Self {
            id: AccountId::from_uuid(model.id),
            code: model.code,
            name: model.name,
            account_type: model.account_type.into(),
            parent_id: model.parent_id.map(AccountId::from_uuid),
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<vouchers::Model> for Voucher {
    fn from(model: vouchers::Model) -> Self {
        let reference = match (model.source_type, model.source_id) {
            (Some(source_type), Some(source_id)) => Some(VoucherReference {
                source_type,
                source_id,
            }),
            _ => None,
        };

        Self {
            id: VoucherId::from_uuid(model.id),
            number: model.number,
            voucher_type: model.voucher_type.into(),
            status: model.status.into(),
            narration: model.narration,
            reference,
            reverses_voucher_id: model.reverses_voucher_id.map(VoucherId::from_uuid),
            reversed_by_voucher_id: model.reversed_by_voucher_id.map(VoucherId::from_uuid),
            posted_at: model.posted_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<ledger_entries::Model> for LedgerEntry {
    fn from(model: ledger_entries::Model) -> Self {
        Self {
            id: LedgerEntryId::from_uuid(model.id),
            voucher_id: VoucherId::from_uuid(model.voucher_id),
            account_id: AccountId::from_uuid(model.account_id),
            entry_type: model.entry_type.into(),
            amount: Money::from_minor(model.amount),
            narration: model.narration,
            line_no: model.line_no,
            created_at: model.created_at,
        }
    }
}

impl From<reconciliation_records::Model> for ReconciliationRecord {
    fn from(model: reconciliation_records::Model) -> Self {
        Self {
            id: ReconciliationId::from_uuid(model.id),
            account_id: AccountId::from_uuid(model.account_id),
            external_ref: model.external_ref,
            amount: Money::from_minor(model.amount),
            statement_date: model.statement_date,
            description: model.description,
            matched_entry_id: model.matched_entry_id.map(LedgerEntryId::from_uuid),
            status: model.status.into(),
            matched_at: model.matched_at,
            note: model.note,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Maps an infrastructure failure into the generic retryable ledger error.
pub(crate) fn db_error(err: DbErr) -> LedgerError {
    LedgerError::Database(err.to_string())
}

/// Returns true if `err` is a unique constraint violation.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_round_trip_is_total() {
        for account_type in ledger::AccountType::ALL {
            let db: db_enums::AccountType = account_type.into();
            assert_eq!(ledger::AccountType::from(db), account_type);
        }
        for voucher_type in ledger::VoucherType::ALL {
            let db: db_enums::VoucherType = voucher_type.into();
            assert_eq!(ledger::VoucherType::from(db), voucher_type);
        }
    }

    #[test]
    fn test_voucher_reference_requires_both_fields() {
        let now = chrono::Utc::now();
        let model = vouchers::Model {
            id: uuid::Uuid::now_v7(),
            number: "JV-000001".to_string(),
            voucher_type: db_enums::VoucherType::Journal,
            status: db_enums::VoucherStatus::Draft,
            narration: String::new(),
            source_type: Some("invoice".to_string()),
            source_id: None,
            reverses_voucher_id: None,
            reversed_by_voucher_id: None,
            posted_at: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(Voucher::from(model).reference, None);
    }
}
