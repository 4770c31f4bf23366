//! Balance repository: balances, trial balance and account statements.
//!
//! Balances are derived from posted entries on every call; nothing is
//! cached. Reversed vouchers still count, their reversal vouchers cancel
//! them out.

use chrono::{DateTime, Utc};
use ledgerline_core::ledger::{
    Account, AccountStatement, BalanceTree, LedgerError, PostedEntry, TrialBalance,
};
use ledgerline_shared::types::{AccountId, LedgerEntryId, Money, VoucherId};
use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use tracing::debug;

use super::convert::db_error;
use crate::entities::{accounts, ledger_entries, sea_orm_active_enums::VoucherStatus, vouchers};

/// Read-side repository for account balances.
#[derive(Debug, Clone)]
pub struct BalanceRepository {
    db: DatabaseConnection,
}

impl BalanceRepository {
    /// Creates a new balance repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Balance of an account including its active descendants, in the
    /// account's own sign convention.
    ///
    /// With `as_of`, only vouchers posted at or before that instant count.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAccount` if the account does not exist.
    pub async fn get_balance(
        &self,
        account_id: AccountId,
        as_of: Option<DateTime<Utc>>,
    ) -> Result<Money, LedgerError> {
        let tree = self.load_tree(as_of).await?;
        let balance = tree.balance(account_id)?;
        debug!(%account_id, %balance, ?as_of, "Balance computed");
        Ok(balance)
    }

    /// Trial balance over all top-level accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a sum overflows.
    pub async fn trial_balance(&self, as_of: Option<DateTime<Utc>>) -> Result<TrialBalance, LedgerError> {
        let tree = self.load_tree(as_of).await?;
        tree.trial_balance(as_of)
    }

    /// Posted entries of one account with a running balance.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAccount` if the account does not exist.
    pub async fn account_statement(
        &self,
        account_id: AccountId,
        as_of: Option<DateTime<Utc>>,
    ) -> Result<AccountStatement, LedgerError> {
        let account: Account = accounts::Entity::find_by_id(account_id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_error)?
            .ok_or(LedgerError::UnknownAccount(account_id))?
            .into();

        let entries = posted_entries(&self.db, Some(account_id)).await?;
        AccountStatement::build(&account, entries, as_of)
    }

    async fn load_tree(&self, as_of: Option<DateTime<Utc>>) -> Result<BalanceTree, LedgerError> {
        let chart: Vec<Account> = accounts::Entity::find()
            .all(&self.db)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(Account::from)
            .collect();

        let entries = posted_entries(&self.db, None).await?;

        let mut tree = BalanceTree::new(&chart);
        tree.record_all(&entries, as_of)?;
        Ok(tree)
    }
}

/// Loads entries of posted and reversed vouchers, optionally for one account.
async fn posted_entries<C: ConnectionTrait>(
    conn: &C,
    account_id: Option<AccountId>,
) -> Result<Vec<PostedEntry>, LedgerError> {
    let mut query = ledger_entries::Entity::find()
        .find_also_related(vouchers::Entity)
        .filter(vouchers::Column::Status.is_in([VoucherStatus::Posted, VoucherStatus::Reversed]))
        .order_by_asc(ledger_entries::Column::VoucherId)
        .order_by_asc(ledger_entries::Column::LineNo);

    if let Some(account_id) = account_id {
        query = query.filter(ledger_entries::Column::AccountId.eq(account_id.into_inner()));
    }

    let rows = query.all(conn).await.map_err(db_error)?;

    Ok(rows
        .into_iter()
        .filter_map(|(entry, voucher)| {
            let voucher = voucher?;
            let posted_at = voucher.posted_at?;
            Some(PostedEntry {
                entry_id: LedgerEntryId::from_uuid(entry.id),
                voucher_id: VoucherId::from_uuid(voucher.id),
                voucher_number: voucher.number,
                account_id: AccountId::from_uuid(entry.account_id),
                entry_type: entry.entry_type.into(),
                amount: Money::from_minor(entry.amount),
                narration: entry.narration,
                line_no: entry.line_no,
                posted_at,
            })
        })
        .collect())
}
