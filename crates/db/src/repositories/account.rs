//! Account repository for chart of accounts database operations.

use std::collections::HashMap;

use chrono::Utc;
use ledgerline_core::ledger::{Account, AccountFilter, AccountNode, AccountRules, LedgerError, NewAccount};
use ledgerline_shared::types::AccountId;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, warn};

use super::convert::{db_error, is_unique_violation};
use crate::entities::{accounts, sea_orm_active_enums::AccountType};

/// Account repository for the chart of accounts.
///
/// Accounts are never deleted; they are deactivated instead.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a new account.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The code is already used (`DuplicateCode`)
    /// - The parent is unknown or inactive (`InvalidParent`)
    pub async fn create_account(&self, input: NewAccount) -> Result<Account, LedgerError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let existing = accounts::Entity::find()
            .filter(accounts::Column::Code.eq(&input.code))
            .one(&txn)
            .await
            .map_err(db_error)?;
        if existing.is_some() {
            warn!(code = %input.code, "Rejected duplicate account code");
            return Err(LedgerError::DuplicateCode(input.code));
        }

        if let Some(parent_id) = input.parent_id {
            let chart = load_chart(&txn).await?;
            AccountRules::validate_parent(None, parent_id, &chart)?;
        }

        let now = Utc::now();
        let id = AccountId::new();
        let model = accounts::ActiveModel {
            id: Set(id.into_inner()),
            code: Set(input.code.clone()),
            name: Set(input.name),
            account_type: Set(input.account_type.into()),
            parent_id: Set(input.parent_id.map(AccountId::into_inner)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = match model.insert(&txn).await {
            Ok(model) => model,
            Err(err) if is_unique_violation(&err) => return Err(LedgerError::DuplicateCode(input.code)),
            Err(err) => return Err(db_error(err)),
        };

        txn.commit().await.map_err(db_error)?;

        info!(account_id = %id, code = %model.code, "Account created");
        Ok(model.into())
    }

    /// Gets an account by ID.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAccount` if the account does not exist.
    pub async fn get_account(&self, account_id: AccountId) -> Result<Account, LedgerError> {
        find_account(&self.db, account_id)
            .await?
            .map(Account::from)
            .ok_or(LedgerError::UnknownAccount(account_id))
    }

    /// Finds an account by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<Account>, LedgerError> {
        let model = accounts::Entity::find()
            .filter(accounts::Column::Code.eq(code))
            .one(&self.db)
            .await
            .map_err(db_error)?;
        Ok(model.map(Account::from))
    }

    /// Lists accounts ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_accounts(&self, filter: AccountFilter) -> Result<Vec<Account>, LedgerError> {
        let mut query = accounts::Entity::find().order_by_asc(accounts::Column::Code);

        if let Some(account_type) = filter.account_type {
            query = query.filter(accounts::Column::AccountType.eq(AccountType::from(account_type)));
        }

        if let Some(is_active) = filter.is_active {
            query = query.filter(accounts::Column::IsActive.eq(is_active));
        }

        if let Some(parent_id) = filter.parent_id {
            query = match parent_id {
                Some(pid) => query.filter(accounts::Column::ParentId.eq(pid.into_inner())),
                None => query.filter(accounts::Column::ParentId.is_null()),
            };
        }

        let models = query.all(&self.db).await.map_err(db_error)?;
        Ok(models.into_iter().map(Account::from).collect())
    }

    /// Deactivates an account.
    ///
    /// Blocked while any child account is still active; children must be
    /// deactivated first. Deactivating an inactive account is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAccount` or `HasActiveChildren`.
    pub async fn deactivate_account(&self, account_id: AccountId) -> Result<Account, LedgerError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let account = accounts::Entity::find_by_id(account_id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_error)?
            .ok_or(LedgerError::UnknownAccount(account_id))?;

        let children: Vec<Account> = accounts::Entity::find()
            .filter(accounts::Column::ParentId.eq(account_id.into_inner()))
            .all(&txn)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(Account::from)
            .collect();

        if let Err(err) = AccountRules::validate_deactivation(account_id, &children) {
            warn!(%account_id, "Deactivation blocked by active children");
            return Err(err);
        }

        let updated = set_active(&txn, account, false).await?;
        txn.commit().await.map_err(db_error)?;

        info!(%account_id, "Account deactivated");
        Ok(updated.into())
    }

    /// Reactivates an account whose parent (if any) is active.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAccount` or `InvalidParent`.
    pub async fn reactivate_account(&self, account_id: AccountId) -> Result<Account, LedgerError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let model = accounts::Entity::find_by_id(account_id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_error)?
            .ok_or(LedgerError::UnknownAccount(account_id))?;

        let parent = match model.parent_id {
            Some(parent_id) => find_account(&txn, AccountId::from_uuid(parent_id))
                .await?
                .map(Account::from),
            None => None,
        };
        AccountRules::validate_reactivation(&Account::from(model.clone()), parent.as_ref())?;

        let updated = set_active(&txn, model, true).await?;
        txn.commit().await.map_err(db_error)?;

        info!(%account_id, "Account reactivated");
        Ok(updated.into())
    }

    /// Moves an account under a new parent, or to the top level with `None`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAccount`, or `InvalidParent` if the new parent is
    /// unknown, inactive, or a descendant of the account.
    pub async fn reparent_account(
        &self,
        account_id: AccountId,
        new_parent_id: Option<AccountId>,
    ) -> Result<Account, LedgerError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let model = accounts::Entity::find_by_id(account_id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_error)?
            .ok_or(LedgerError::UnknownAccount(account_id))?;

        if let Some(parent_id) = new_parent_id {
            let chart = load_chart(&txn).await?;
            if let Err(err) = AccountRules::validate_parent(Some(account_id), parent_id, &chart) {
                warn!(%account_id, %parent_id, error = %err, "Re-parent rejected");
                return Err(err);
            }
        }

        let mut active = model.into_active_model();
        active.parent_id = Set(new_parent_id.map(AccountId::into_inner));
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await.map_err(db_error)?;

        txn.commit().await.map_err(db_error)?;

        info!(%account_id, parent_id = ?new_parent_id, "Account re-parented");
        Ok(updated.into())
    }
}

async fn find_account<C: ConnectionTrait>(
    conn: &C,
    account_id: AccountId,
) -> Result<Option<accounts::Model>, LedgerError> {
    accounts::Entity::find_by_id(account_id.into_inner())
        .one(conn)
        .await
        .map_err(db_error)
}

/// Loads the parent/active structure of the whole chart.
async fn load_chart<C: ConnectionTrait>(conn: &C) -> Result<HashMap<AccountId, AccountNode>, LedgerError> {
    let models = accounts::Entity::find().all(conn).await.map_err(db_error)?;
    Ok(models
        .into_iter()
        .map(|m| {
            (
                AccountId::from_uuid(m.id),
                AccountNode {
                    parent_id: m.parent_id.map(AccountId::from_uuid),
                    is_active: m.is_active,
                },
            )
        })
        .collect())
}

async fn set_active<C: ConnectionTrait>(
    conn: &C,
    model: accounts::Model,
    is_active: bool,
) -> Result<accounts::Model, LedgerError> {
    if model.is_active == is_active {
        return Ok(model);
    }
    let mut active = model.into_active_model();
    active.is_active = Set(is_active);
    active.updated_at = Set(Utc::now());
    active.update(conn).await.map_err(db_error)
}
