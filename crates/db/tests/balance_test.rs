//! Balance, trial balance and statement tests.

mod common;

use std::time::Duration;

use ledgerline_core::ledger::{EntryType, NewEntry, VoucherType};
use ledgerline_db::{AccountRepository, BalanceRepository, VoucherRepository};
use ledgerline_shared::types::{AccountId, Money};

use common::{draft_with, post_simple, seed_chart, setup_db};

#[tokio::test]
async fn test_parent_balance_rolls_up_children() {
    let db = setup_db().await;
    let chart = seed_chart(&db).await;
    let vouchers = VoucherRepository::new(db.clone());
    let balances = BalanceRepository::new(db);

    post_simple(&vouchers, chart.cash.id, chart.equity.id, 1_000).await;
    post_simple(&vouchers, chart.bank.id, chart.sales.id, 250).await;
    post_simple(&vouchers, chart.expenses.id, chart.cash.id, 100).await;

    assert_eq!(balances.get_balance(chart.cash.id, None).await.unwrap(), Money::from_minor(900));
    assert_eq!(balances.get_balance(chart.bank.id, None).await.unwrap(), Money::from_minor(250));
    assert_eq!(balances.get_balance(chart.assets.id, None).await.unwrap(), Money::from_minor(1_150));
    assert_eq!(balances.get_balance(chart.income.id, None).await.unwrap(), Money::from_minor(250));
    assert_eq!(balances.get_balance(chart.equity.id, None).await.unwrap(), Money::from_minor(1_000));
    assert_eq!(balances.get_balance(chart.expenses.id, None).await.unwrap(), Money::from_minor(100));
}

#[tokio::test]
async fn test_drafts_do_not_count() {
    let db = setup_db().await;
    let chart = seed_chart(&db).await;
    let vouchers = VoucherRepository::new(db.clone());
    let balances = BalanceRepository::new(db);

    draft_with(
        &vouchers,
        VoucherType::Journal,
        "not yet",
        vec![
            NewEntry::debit(chart.cash.id, 700),
            NewEntry::credit(chart.sales.id, 700),
        ],
    )
    .await;

    assert_eq!(balances.get_balance(chart.cash.id, None).await.unwrap(), Money::ZERO);
    assert!(balances.trial_balance(None).await.unwrap().lines.iter().all(|l| l.net.is_zero()));
}

#[tokio::test]
async fn test_inactive_child_excluded_from_rollup() {
    let db = setup_db().await;
    let chart = seed_chart(&db).await;
    let accounts = AccountRepository::new(db.clone());
    let vouchers = VoucherRepository::new(db.clone());
    let balances = BalanceRepository::new(db);

    post_simple(&vouchers, chart.cash.id, chart.equity.id, 400).await;
    post_simple(&vouchers, chart.receivables.id, chart.sales.id, 300).await;
    accounts.deactivate_account(chart.receivables.id).await.unwrap();

    assert_eq!(balances.get_balance(chart.assets.id, None).await.unwrap(), Money::from_minor(400));
    // The inactive account keeps its own balance.
    assert_eq!(balances.get_balance(chart.receivables.id, None).await.unwrap(), Money::from_minor(300));
}

#[tokio::test]
async fn test_as_of_excludes_later_postings() {
    let db = setup_db().await;
    let chart = seed_chart(&db).await;
    let vouchers = VoucherRepository::new(db.clone());
    let balances = BalanceRepository::new(db);

    let first = post_simple(&vouchers, chart.cash.id, chart.sales.id, 500).await;
    let cutoff = vouchers
        .get_voucher(first.voucher.id)
        .await
        .unwrap()
        .voucher
        .posted_at
        .unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    post_simple(&vouchers, chart.cash.id, chart.sales.id, 200).await;

    assert_eq!(
        balances.get_balance(chart.cash.id, Some(cutoff)).await.unwrap(),
        Money::from_minor(500)
    );
    assert_eq!(balances.get_balance(chart.cash.id, None).await.unwrap(), Money::from_minor(700));

    let statement = balances.account_statement(chart.cash.id, Some(cutoff)).await.unwrap();
    assert_eq!(statement.lines.len(), 1);
}

#[tokio::test]
async fn test_trial_balance_nets_to_zero() {
    let db = setup_db().await;
    let chart = seed_chart(&db).await;
    let vouchers = VoucherRepository::new(db.clone());
    let balances = BalanceRepository::new(db);

    post_simple(&vouchers, chart.cash.id, chart.equity.id, 10_000).await;
    post_simple(&vouchers, chart.receivables.id, chart.sales.id, 2_500).await;
    post_simple(&vouchers, chart.expenses.id, chart.bank.id, 75).await;

    let trial = balances.trial_balance(None).await.unwrap();
    assert!(trial.is_balanced());
    let codes: Vec<_> = trial.lines.iter().map(|l| l.code.as_str()).collect();
    assert_eq!(codes, vec!["1000", "3000-EQUITY", "4000", "5000-EXPENSES"]);

    let assets = trial.lines.iter().find(|l| l.account_id == chart.assets.id).unwrap();
    assert_eq!(assets.net, Money::from_minor(12_425));
    assert_eq!(assets.balance, Money::from_minor(12_425));

    let income = trial.lines.iter().find(|l| l.account_id == chart.income.id).unwrap();
    assert_eq!(income.net, Money::from_minor(-2_500));
    assert_eq!(income.balance, Money::from_minor(2_500));
}

#[tokio::test]
async fn test_trial_balance_survives_deactivating_account_with_balance() {
    let db = setup_db().await;
    let chart = seed_chart(&db).await;
    let accounts = AccountRepository::new(db.clone());
    let vouchers = VoucherRepository::new(db.clone());
    let balances = BalanceRepository::new(db);

    post_simple(&vouchers, chart.cash.id, chart.equity.id, 1_000).await;
    post_simple(&vouchers, chart.receivables.id, chart.sales.id, 300).await;
    accounts.deactivate_account(chart.receivables.id).await.unwrap();

    let trial = balances.trial_balance(None).await.unwrap();
    assert!(trial.is_balanced(), "trial total was {}", trial.total);
    // The receivables drop out of the assets rollup but not out of the total.
    let assets = trial.lines.iter().find(|l| l.account_id == chart.assets.id).unwrap();
    assert_eq!(assets.net, Money::from_minor(1_000));
}

#[tokio::test]
async fn test_statement_running_balance() {
    let db = setup_db().await;
    let chart = seed_chart(&db).await;
    let vouchers = VoucherRepository::new(db.clone());
    let balances = BalanceRepository::new(db);

    post_simple(&vouchers, chart.cash.id, chart.equity.id, 1_000).await;
    post_simple(&vouchers, chart.expenses.id, chart.cash.id, 300).await;
    post_simple(&vouchers, chart.cash.id, chart.sales.id, 50).await;

    let statement = balances.account_statement(chart.cash.id, None).await.unwrap();
    let running: Vec<_> = statement
        .lines
        .iter()
        .map(|l| (l.entry_type, l.running_balance.minor_units()))
        .collect();
    assert_eq!(
        running,
        vec![
            (EntryType::Debit, 1_000),
            (EntryType::Credit, 700),
            (EntryType::Debit, 750),
        ]
    );
    assert_eq!(statement.closing_balance, Money::from_minor(750));
}

#[tokio::test]
async fn test_unknown_account_balance() {
    let db = setup_db().await;
    let balances = BalanceRepository::new(db);
    let ghost = AccountId::new();
    assert!(balances.get_balance(ghost, None).await.is_err());
    assert!(balances.account_statement(ghost, None).await.is_err());
}
