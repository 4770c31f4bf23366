//! Account balance calculations.
//!
//! Balances are derived from posted entries on every read, never stored.
//!
//! - Asset/Expense: balance = debit - credit (debit-normal)
//! - Liability/Equity/Income: balance = credit - debit (credit-normal)
//!
//! Internally every figure is kept as a debit-minus-credit net. An account's
//! rolled-up net is its own net plus the rolled-up nets of its active
//! children; the reported balance applies the account's own sign convention
//! to that rolled-up net. The trial balance total sums the own nets of every
//! account, active or not, and is zero for a self-consistent ledger.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use ledgerline_shared::types::{AccountId, LedgerEntryId, Money, VoucherId};
use serde::{Deserialize, Serialize};

use super::account::Account;
use super::entry::signed;
use super::error::LedgerError;
use super::types::{AccountType, EntryType, NormalBalance};

impl NormalBalance {
    /// Calculates the balance change for one entry in this convention.
    #[must_use]
    pub fn balance_change(self, entry_type: EntryType, amount: Money) -> Money {
        match (self, entry_type) {
            (Self::Debit, EntryType::Debit) | (Self::Credit, EntryType::Credit) => amount,
            (Self::Debit, EntryType::Credit) | (Self::Credit, EntryType::Debit) => -amount,
        }
    }
}

/// An entry of a posted (or reversed) voucher, as read for balance purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedEntry {
    /// The entry.
    pub entry_id: LedgerEntryId,
    /// Owning voucher.
    pub voucher_id: VoucherId,
    /// Owning voucher's number.
    pub voucher_number: String,
    /// Target account.
    pub account_id: AccountId,
    /// Debit or credit.
    pub entry_type: EntryType,
    /// Positive amount.
    pub amount: Money,
    /// Line narration.
    pub narration: Option<String>,
    /// Position within the voucher.
    pub line_no: i32,
    /// When the owning voucher was posted.
    pub posted_at: DateTime<Utc>,
}

impl PostedEntry {
    /// Returns true unless the owning voucher posted after `as_of`.
    #[must_use]
    pub fn is_visible_at(&self, as_of: Option<DateTime<Utc>>) -> bool {
        as_of.is_none_or(|cutoff| self.posted_at <= cutoff)
    }
}

#[derive(Debug, Clone)]
struct BalanceNode {
    code: String,
    account_type: AccountType,
    parent_id: Option<AccountId>,
    is_active: bool,
}

/// The chart of accounts with per-account posted nets.
#[derive(Debug, Clone, Default)]
pub struct BalanceTree {
    nodes: HashMap<AccountId, BalanceNode>,
    children: HashMap<AccountId, Vec<AccountId>>,
    own_net: HashMap<AccountId, Money>,
}

impl BalanceTree {
    /// Builds an empty tree over `accounts`.
    #[must_use]
    pub fn new<'a>(accounts: impl IntoIterator<Item = &'a Account>) -> Self {
        let mut tree = Self::default();
        for account in accounts {
            tree.nodes.insert(
                account.id,
                BalanceNode {
                    code: account.code.clone(),
                    account_type: account.account_type,
                    parent_id: account.parent_id,
                    is_active: account.is_active,
                },
            );
            if let Some(parent_id) = account.parent_id {
                tree.children.entry(parent_id).or_default().push(account.id);
            }
        }
        tree
    }

    /// Adds one posted entry to its account's own net.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAccount` if the account is not in the tree and
    /// `AmountOverflow` if the net leaves the `i64` range.
    pub fn record(&mut self, account_id: AccountId, entry_type: EntryType, amount: Money) -> Result<(), LedgerError> {
        if !self.nodes.contains_key(&account_id) {
            return Err(LedgerError::UnknownAccount(account_id));
        }
        let net = self.own_net.entry(account_id).or_default();
        *net = net
            .checked_add(signed(entry_type, amount))
            .ok_or(LedgerError::AmountOverflow)?;
        Ok(())
    }

    /// Records every entry visible at `as_of`.
    ///
    /// # Errors
    ///
    /// See [`BalanceTree::record`].
    pub fn record_all<'a>(
        &mut self,
        entries: impl IntoIterator<Item = &'a PostedEntry>,
        as_of: Option<DateTime<Utc>>,
    ) -> Result<(), LedgerError> {
        for entry in entries.into_iter().filter(|e| e.is_visible_at(as_of)) {
            self.record(entry.account_id, entry.entry_type, entry.amount)?;
        }
        Ok(())
    }

    /// Debit-minus-credit net of the account's own entries.
    #[must_use]
    pub fn own_net(&self, account_id: AccountId) -> Money {
        self.own_net.get(&account_id).copied().unwrap_or_default()
    }

    /// Debit-minus-credit net of the account and its active descendants.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAccount` or `AmountOverflow`.
    pub fn rolled_up_net(&self, account_id: AccountId) -> Result<Money, LedgerError> {
        if !self.nodes.contains_key(&account_id) {
            return Err(LedgerError::UnknownAccount(account_id));
        }
        self.roll_up(account_id, &mut HashSet::new())
    }

    fn roll_up(&self, account_id: AccountId, visited: &mut HashSet<AccountId>) -> Result<Money, LedgerError> {
        if !visited.insert(account_id) {
            return Ok(Money::ZERO);
        }

        let mut total = self.own_net(account_id);
        for child in self.children.get(&account_id).into_iter().flatten() {
            if !self.nodes.get(child).is_some_and(|node| node.is_active) {
                continue;
            }
            let child_net = self.roll_up(*child, visited)?;
            total = total.checked_add(child_net).ok_or(LedgerError::AmountOverflow)?;
        }
        Ok(total)
    }

    /// Balance of an account including active descendants, in its own sign convention.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAccount` or `AmountOverflow`.
    pub fn balance(&self, account_id: AccountId) -> Result<Money, LedgerError> {
        let node = self
            .nodes
            .get(&account_id)
            .ok_or(LedgerError::UnknownAccount(account_id))?;
        let net = self.roll_up(account_id, &mut HashSet::new())?;
        node.account_type
            .normal_balance()
            .from_net(net)
            .ok_or(LedgerError::AmountOverflow)
    }

    /// Trial balance over every top-level account.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow` if any sum leaves the `i64` range.
    pub fn trial_balance(&self, as_of: Option<DateTime<Utc>>) -> Result<TrialBalance, LedgerError> {
        let mut roots: Vec<(&AccountId, &BalanceNode)> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.parent_id.is_none())
            .collect();
        roots.sort_by(|a, b| a.1.code.cmp(&b.1.code));

        let mut lines = Vec::with_capacity(roots.len());
        for (id, node) in roots {
            let net = self.rolled_up_net(*id)?;
            lines.push(TrialBalanceLine {
                account_id: *id,
                code: node.code.clone(),
                account_type: node.account_type,
                is_active: node.is_active,
                balance: self.balance(*id)?,
                net,
            });
        }

        // Inactive accounts drop out of rollups but still hold posted entries.
        let total = self
            .own_net
            .values()
            .try_fold(Money::ZERO, |acc, net| acc.checked_add(*net))
            .ok_or(LedgerError::AmountOverflow)?;

        Ok(TrialBalance { as_of, lines, total })
    }
}

/// One top-level account in a trial balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceLine {
    /// Account.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account type.
    pub account_type: AccountType,
    /// Whether the account is active.
    pub is_active: bool,
    /// Balance in the account's own sign convention.
    pub balance: Money,
    /// Debit-minus-credit net.
    pub net: Money,
}

/// Trial balance across the chart of accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalance {
    /// Cutoff, if any.
    pub as_of: Option<DateTime<Utc>>,
    /// Top-level accounts ordered by code.
    pub lines: Vec<TrialBalanceLine>,
    /// Debit-minus-credit net of every account's own entries.
    pub total: Money,
}

impl TrialBalance {
    /// Returns true if total debits equal total credits.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.total.is_zero()
    }
}

/// One line of an account statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementLine {
    /// The entry.
    pub entry_id: LedgerEntryId,
    /// Owning voucher.
    pub voucher_id: VoucherId,
    /// Owning voucher's number.
    pub voucher_number: String,
    /// When the voucher was posted.
    pub posted_at: DateTime<Utc>,
    /// Debit or credit.
    pub entry_type: EntryType,
    /// Positive amount.
    pub amount: Money,
    /// Line narration.
    pub narration: Option<String>,
    /// Balance after this line, in the account's sign convention.
    pub running_balance: Money,
}

/// Posted entries of a single account with a running balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStatement {
    /// Account.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account type.
    pub account_type: AccountType,
    /// Cutoff, if any.
    pub as_of: Option<DateTime<Utc>>,
    /// Lines in posting order.
    pub lines: Vec<StatementLine>,
    /// Balance after the last line.
    pub closing_balance: Money,
}

impl AccountStatement {
    /// Builds a statement from the account's own posted entries.
    ///
    /// Entries of other accounts and entries posted after `as_of` are skipped.
    /// Descendant accounts are not included.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow` if the running balance leaves the `i64` range.
    pub fn build(
        account: &Account,
        mut entries: Vec<PostedEntry>,
        as_of: Option<DateTime<Utc>>,
    ) -> Result<Self, LedgerError> {
        entries.retain(|e| e.account_id == account.id && e.is_visible_at(as_of));
        entries.sort_by(|a, b| {
            (a.posted_at, &a.voucher_number, a.line_no).cmp(&(b.posted_at, &b.voucher_number, b.line_no))
        });

        let normal = account.account_type.normal_balance();
        let mut running = Money::ZERO;
        let mut lines = Vec::with_capacity(entries.len());
        for entry in entries {
            running = running
                .checked_add(normal.balance_change(entry.entry_type, entry.amount))
                .ok_or(LedgerError::AmountOverflow)?;
            lines.push(StatementLine {
                entry_id: entry.entry_id,
                voucher_id: entry.voucher_id,
                voucher_number: entry.voucher_number,
                posted_at: entry.posted_at,
                entry_type: entry.entry_type,
                amount: entry.amount,
                narration: entry.narration,
                running_balance: running,
            });
        }

        Ok(Self {
            account_id: account.id,
            code: account.code.clone(),
            account_type: account.account_type,
            as_of,
            lines,
            closing_balance: running,
        })
    }
}
