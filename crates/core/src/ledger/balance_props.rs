//! Property-based tests for BalanceTree.
//!
//! - Trial balance is zero for any ledger built from balanced vouchers
//! - An account's balance is its own entries plus its active children
//! - Debit-normal and credit-normal balances mirror each other

use chrono::Utc;
use ledgerline_shared::types::{AccountId, Money};
use proptest::prelude::*;

use super::account::Account;
use super::balance::BalanceTree;
use super::types::{AccountType, EntryType};

/// Strategy to generate account types.
fn account_type_strategy() -> impl Strategy<Value = AccountType> {
    prop_oneof![
        Just(AccountType::Asset),
        Just(AccountType::Liability),
        Just(AccountType::Equity),
        Just(AccountType::Income),
        Just(AccountType::Expense),
    ]
}

/// Strategy to generate a forest: each account may hang under an earlier one.
fn forest_strategy() -> impl Strategy<Value = Vec<(AccountType, Option<prop::sample::Index>, bool)>> {
    prop::collection::vec(
        (
            account_type_strategy(),
            prop::option::of(any::<prop::sample::Index>()),
            prop::bool::weighted(0.8),
        ),
        2..10,
    )
}

/// Strategy to generate simple two-line vouchers: (debit idx, credit idx, amount).
fn vouchers_strategy() -> impl Strategy<Value = Vec<(prop::sample::Index, prop::sample::Index, i64)>> {
    prop::collection::vec(
        (any::<prop::sample::Index>(), any::<prop::sample::Index>(), 1i64..1_000_000i64),
        0..20,
    )
}

fn build_accounts(shape: &[(AccountType, Option<prop::sample::Index>, bool)]) -> Vec<Account> {
    let mut accounts: Vec<Account> = Vec::with_capacity(shape.len());
    for (i, (account_type, parent, is_active)) in shape.iter().enumerate() {
        let parent_id = match parent {
            Some(index) if i > 0 => Some(accounts[index.index(i)].id),
            _ => None,
        };
        accounts.push(Account {
            id: AccountId::new(),
            code: format!("{:04}", i * 100),
            name: format!("Account {i}"),
            account_type: *account_type,
            parent_id,
            is_active: *is_active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
    }
    accounts
}

fn post_all(
    tree: &mut BalanceTree,
    accounts: &[Account],
    vouchers: &[(prop::sample::Index, prop::sample::Index, i64)],
) {
    for (debit, credit, amount) in vouchers {
        let amount = Money::from_minor(*amount);
        tree.record(accounts[debit.index(accounts.len())].id, EntryType::Debit, amount)
            .unwrap();
        tree.record(accounts[credit.index(accounts.len())].id, EntryType::Credit, amount)
            .unwrap();
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The trial balance is zero whichever accounts are inactive.
    #[test]
    fn prop_trial_balance_is_zero(
        shape in forest_strategy(),
        vouchers in vouchers_strategy(),
    ) {
        let accounts = build_accounts(&shape);
        let mut tree = BalanceTree::new(&accounts);
        post_all(&mut tree, &accounts, &vouchers);

        let trial = tree.trial_balance(None).unwrap();
        prop_assert!(trial.is_balanced(), "trial balance total was {}", trial.total);
    }

    /// rolled_up_net(A) == own_net(A) + sum of rolled_up_net over active children.
    #[test]
    fn prop_rollup_is_own_plus_active_children(
        shape in forest_strategy(),
        vouchers in vouchers_strategy(),
    ) {
        let accounts = build_accounts(&shape);
        let mut tree = BalanceTree::new(&accounts);
        post_all(&mut tree, &accounts, &vouchers);

        for account in &accounts {
            let children: Money = accounts
                .iter()
                .filter(|c| c.parent_id == Some(account.id) && c.is_active)
                .map(|c| tree.rolled_up_net(c.id).unwrap())
                .sum();
            prop_assert_eq!(
                tree.rolled_up_net(account.id).unwrap(),
                tree.own_net(account.id) + children
            );
        }
    }

    /// For same-type hierarchies, balance(A) == signed own entries + sum of child balances.
    #[test]
    fn prop_same_type_balance_recursion(
        shape in forest_strategy(),
        vouchers in vouchers_strategy(),
        account_type in account_type_strategy(),
    ) {
        let shape: Vec<_> = shape.into_iter().map(|(_, p, a)| (account_type, p, a)).collect();
        let accounts = build_accounts(&shape);
        let mut tree = BalanceTree::new(&accounts);
        post_all(&mut tree, &accounts, &vouchers);

        let normal = account_type.normal_balance();
        for account in &accounts {
            let own = normal.from_net(tree.own_net(account.id)).unwrap();
            let children: Money = accounts
                .iter()
                .filter(|c| c.parent_id == Some(account.id) && c.is_active)
                .map(|c| tree.balance(c.id).unwrap())
                .sum();
            prop_assert_eq!(tree.balance(account.id).unwrap(), own + children);
        }
    }
}
