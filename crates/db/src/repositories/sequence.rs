//! Voucher number allocation.

use ledgerline_core::ledger::{LedgerError, VoucherType, format_voucher_number};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QuerySelect, Set,
};

use super::convert::db_error;
use crate::entities::voucher_sequences;

/// Hands out voucher numbers from per-type series.
///
/// Allocation must run on the same connection or transaction that inserts
/// the voucher: the counter row stays locked until that transaction ends,
/// and a rollback returns the number.
#[derive(Debug, Clone, Copy, Default)]
pub struct VoucherSequence;

impl VoucherSequence {
    /// Allocates the next number in `voucher_type`'s series.
    ///
    /// # Errors
    ///
    /// Returns `Database` if the counter row cannot be read or written.
    pub async fn allocate<C: ConnectionTrait>(
        self,
        conn: &C,
        voucher_type: VoucherType,
    ) -> Result<String, LedgerError> {
        let series = voucher_type.series();

        let row = voucher_sequences::Entity::find_by_id(series.to_string())
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(db_error)?;

        let value = match row {
            Some(row) => {
                let value = row.next_value;
                let mut active = row.into_active_model();
                active.next_value = Set(value + 1);
                active.update(conn).await.map_err(db_error)?;
                value
            }
            None => {
                voucher_sequences::ActiveModel {
                    series: Set(series.to_string()),
                    next_value: Set(2),
                }
                .insert(conn)
                .await
                .map_err(db_error)?;
                1
            }
        };

        Ok(format_voucher_number(voucher_type, value))
    }
}
