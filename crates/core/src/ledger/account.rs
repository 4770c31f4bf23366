//! Chart of accounts: account records and hierarchy rules.
//!
//! The hierarchy is a strict forest. The rules here are pure; the caller
//! loads the relevant part of the chart and persists the outcome.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use ledgerline_shared::types::AccountId;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;
use super::types::AccountType;

/// An account in the chart of accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Unique human-meaningful code, e.g. `1000-CASH`.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account type (decides the balance sign convention).
    pub account_type: AccountType,
    /// Parent account, `None` for a top-level account.
    pub parent_id: Option<AccountId>,
    /// Soft-disable flag; accounts are never deleted.
    pub is_active: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Returns true if the account has no parent.
    #[must_use]
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Input for creating an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    /// Unique code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Optional parent.
    pub parent_id: Option<AccountId>,
}

impl NewAccount {
    /// Creates a top-level account input.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            account_type,
            parent_id: None,
        }
    }

    /// Places the account under `parent_id`.
    #[must_use]
    pub fn with_parent(mut self, parent_id: AccountId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// Filter for listing accounts. `None` fields do not filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountFilter {
    /// Only accounts of this type.
    pub account_type: Option<AccountType>,
    /// Only active (`true`) or inactive (`false`) accounts.
    pub is_active: Option<bool>,
    /// Only children of this parent; `Some(None)` selects top-level accounts.
    pub parent_id: Option<Option<AccountId>>,
}

impl AccountFilter {
    /// Returns true if `account` passes the filter.
    #[must_use]
    pub fn matches(&self, account: &Account) -> bool {
        self.account_type.is_none_or(|t| account.account_type == t)
            && self.is_active.is_none_or(|a| account.is_active == a)
            && self.parent_id.is_none_or(|p| account.parent_id == p)
    }
}

/// The slice of an account that hierarchy checks need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountNode {
    /// Parent account.
    pub parent_id: Option<AccountId>,
    /// Whether the account is active.
    pub is_active: bool,
}

impl From<&Account> for AccountNode {
    fn from(account: &Account) -> Self {
        Self {
            parent_id: account.parent_id,
            is_active: account.is_active,
        }
    }
}

/// Account registry rules.
pub struct AccountRules;

impl AccountRules {
    /// Validates that `parent_id` may become the parent of `account_id`.
    ///
    /// `account_id` is `None` when creating a new account (a fresh id can
    /// never close a cycle). For a re-parent the ancestors of `parent_id`
    /// are walked and the move is rejected if `account_id` appears.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParent` if the parent is unknown, inactive, the account
    /// itself, or one of its descendants.
    pub fn validate_parent(
        account_id: Option<AccountId>,
        parent_id: AccountId,
        chart: &HashMap<AccountId, AccountNode>,
    ) -> Result<(), LedgerError> {
        let invalid = |reason: &str| LedgerError::InvalidParent {
            parent_id,
            reason: reason.to_string(),
        };

        let parent = chart.get(&parent_id).ok_or_else(|| invalid("unknown account"))?;
        if !parent.is_active {
            return Err(invalid("account is inactive"));
        }

        let Some(account_id) = account_id else {
            return Ok(());
        };

        let mut seen = HashSet::new();
        let mut cursor = Some(parent_id);
        while let Some(current) = cursor {
            if current == account_id {
                return Err(invalid("would create a cycle"));
            }
            if !seen.insert(current) {
                // Pre-existing loop that does not include `account_id`.
                break;
            }
            cursor = chart.get(&current).and_then(|node| node.parent_id);
        }

        Ok(())
    }

    /// Validates that an account may be deactivated.
    ///
    /// # Errors
    ///
    /// Returns `HasActiveChildren` if any direct child is still active.
    pub fn validate_deactivation(
        account_id: AccountId,
        children: &[Account],
    ) -> Result<(), LedgerError> {
        if children.iter().any(|child| child.is_active) {
            return Err(LedgerError::HasActiveChildren(account_id));
        }
        Ok(())
    }

    /// Validates that an account may be reactivated.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParent` if the account's parent is inactive.
    pub fn validate_reactivation(account: &Account, parent: Option<&Account>) -> Result<(), LedgerError> {
        match (account.parent_id, parent) {
            (Some(parent_id), Some(parent)) if !parent.is_active => Err(LedgerError::InvalidParent {
                parent_id,
                reason: "account is inactive".to_string(),
            }),
            (Some(parent_id), None) => Err(LedgerError::InvalidParent {
                parent_id,
                reason: "unknown account".to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Validates that an account can receive entries.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAccount` or `InactiveAccount`.
    pub fn validate_postable(account_id: AccountId, account: Option<&Account>) -> Result<(), LedgerError> {
        match account {
            None => Err(LedgerError::UnknownAccount(account_id)),
            Some(a) if !a.is_active => Err(LedgerError::InactiveAccount(account_id)),
            Some(_) => Ok(()),
        }
    }
}
