//! End-to-end ledger walkthrough: post, reject, reverse, deactivate, reconcile.
//!
//! Uses a flat two-account chart so every balance is easy to check by hand.

mod common;

use ledgerline_core::ledger::{
    AccountType, EntryType, LedgerError, NewEntry, NewVoucher, VoucherStatus, VoucherType,
};
use ledgerline_core::reconciliation::{MatchStatus, StatementLine};
use ledgerline_db::{
    AccountRepository, BalanceRepository, ReconciliationRepository, ReversalRepository, VoucherRepository,
};
use ledgerline_shared::types::Money;

use common::{create, date, draft_with, setup_db};

struct Ledger {
    accounts: AccountRepository,
    vouchers: VoucherRepository,
    balances: BalanceRepository,
    reversals: ReversalRepository,
    reconciliation: ReconciliationRepository,
}

async fn ledger() -> Ledger {
    let db = setup_db().await;
    Ledger {
        accounts: AccountRepository::new(db.clone()),
        vouchers: VoucherRepository::new(db.clone()),
        balances: BalanceRepository::new(db.clone()),
        reversals: ReversalRepository::new(db.clone()),
        reconciliation: ReconciliationRepository::new(db),
    }
}

#[tokio::test]
async fn test_cash_sale_posts_and_balances() {
    let l = ledger().await;
    let cash = create(&l.accounts, "1000-CASH", "Cash", AccountType::Asset, None).await;
    let sales = create(&l.accounts, "4000-SALES", "Sales", AccountType::Income, None).await;

    let id = draft_with(
        &l.vouchers,
        VoucherType::Sales,
        "Cash sale",
        vec![NewEntry::debit(cash.id, 500), NewEntry::credit(sales.id, 500)],
    )
    .await;
    let posted = l.vouchers.post_voucher(id).await.unwrap();

    assert_eq!(posted.voucher.status, VoucherStatus::Posted);
    assert!(posted.voucher.posted_at.is_some());
    assert_eq!(l.balances.get_balance(cash.id, None).await.unwrap(), Money::from_minor(500));
    assert_eq!(l.balances.get_balance(sales.id, None).await.unwrap(), Money::from_minor(500));

    let trial = l.balances.trial_balance(None).await.unwrap();
    assert_eq!(trial.total, Money::ZERO);
    assert!(trial.is_balanced());
}

#[tokio::test]
async fn test_unbalanced_voucher_stays_draft() {
    let l = ledger().await;
    let cash = create(&l.accounts, "1000-CASH", "Cash", AccountType::Asset, None).await;
    let sales = create(&l.accounts, "4000-SALES", "Sales", AccountType::Income, None).await;

    let id = draft_with(
        &l.vouchers,
        VoucherType::Sales,
        "Short credit",
        vec![NewEntry::debit(cash.id, 500), NewEntry::credit(sales.id, 400)],
    )
    .await;

    let err = l.vouchers.post_voucher(id).await.unwrap_err();
    assert_eq!(
        err,
        LedgerError::Unbalanced {
            debit: Money::from_minor(500),
            credit: Money::from_minor(400),
        }
    );

    let detail = l.vouchers.get_voucher(id).await.unwrap();
    assert_eq!(detail.voucher.status, VoucherStatus::Draft);
    assert_eq!(detail.voucher.posted_at, None);
    assert_eq!(l.balances.get_balance(cash.id, None).await.unwrap(), Money::ZERO);
}

#[tokio::test]
async fn test_reversal_mirrors_and_cannot_repeat() {
    let l = ledger().await;
    let cash = create(&l.accounts, "1000-CASH", "Cash", AccountType::Asset, None).await;
    let sales = create(&l.accounts, "4000-SALES", "Sales", AccountType::Income, None).await;

    let id = draft_with(
        &l.vouchers,
        VoucherType::Sales,
        "Cash sale",
        vec![NewEntry::debit(cash.id, 500), NewEntry::credit(sales.id, 500)],
    )
    .await;
    l.vouchers.post_voucher(id).await.unwrap();

    let reversal = l.reversals.reverse_voucher(id, "entered twice").await.unwrap();

    assert_eq!(reversal.voucher.status, VoucherStatus::Posted);
    assert_eq!(reversal.voucher.voucher_type, VoucherType::Reversal);
    assert_eq!(reversal.voucher.reverses_voucher_id, Some(id));
    let lines: Vec<_> = reversal
        .entries
        .iter()
        .map(|e| (e.account_id, e.entry_type, e.amount.minor_units()))
        .collect();
    assert_eq!(
        lines,
        vec![
            (cash.id, EntryType::Credit, 500),
            (sales.id, EntryType::Debit, 500),
        ]
    );
    assert_eq!(l.balances.get_balance(cash.id, None).await.unwrap(), Money::ZERO);
    assert_eq!(l.balances.get_balance(sales.id, None).await.unwrap(), Money::ZERO);

    let original = l.vouchers.get_voucher(id).await.unwrap();
    assert_eq!(original.voucher.status, VoucherStatus::Reversed);
    assert_eq!(original.voucher.reversed_by_voucher_id, Some(reversal.voucher.id));

    assert_eq!(
        l.reversals.reverse_voucher(id, "again").await.unwrap_err(),
        LedgerError::AlreadyReversed(id)
    );
}

#[tokio::test]
async fn test_deactivated_account_rejects_new_entries() {
    let l = ledger().await;
    let cash = create(&l.accounts, "1000-CASH", "Cash", AccountType::Asset, None).await;
    let sales = create(&l.accounts, "4000-SALES", "Sales", AccountType::Income, None).await;

    l.accounts.deactivate_account(cash.id).await.unwrap();

    let voucher = l
        .vouchers
        .create_draft_voucher(NewVoucher::new(VoucherType::Sales, "After close"))
        .await
        .unwrap();
    l.vouchers
        .add_entry(voucher.id, NewEntry::credit(sales.id, 500))
        .await
        .unwrap();

    assert_eq!(
        l.vouchers
            .add_entry(voucher.id, NewEntry::debit(cash.id, 500))
            .await
            .unwrap_err(),
        LedgerError::InactiveAccount(cash.id)
    );
}

#[tokio::test]
async fn test_statement_line_matches_once() {
    let l = ledger().await;
    let cash = create(&l.accounts, "1000-CASH", "Cash", AccountType::Asset, None).await;
    let sales = create(&l.accounts, "4000-SALES", "Sales", AccountType::Income, None).await;

    let id = draft_with(
        &l.vouchers,
        VoucherType::Sales,
        "Cash sale",
        vec![NewEntry::debit(cash.id, 500), NewEntry::credit(sales.id, 500)],
    )
    .await;
    let posted = l.vouchers.post_voucher(id).await.unwrap();
    let cash_entry = posted.entries.iter().find(|e| e.account_id == cash.id).unwrap().id;

    let records = l
        .reconciliation
        .import_statement_lines(
            cash.id,
            vec![
                StatementLine::new("BANK-0001", 500, date(2026, 3, 2)),
                StatementLine::new("BANK-0002", 500, date(2026, 3, 2)),
            ],
        )
        .await
        .unwrap();

    let matched = l.reconciliation.match_line(records[0].id, cash_entry).await.unwrap();
    assert_eq!(matched.status, MatchStatus::Matched);
    assert_eq!(matched.matched_entry_id, Some(cash_entry));

    let err = l.reconciliation.match_line(records[1].id, cash_entry).await.unwrap_err();
    assert_eq!(err.error_code(), "ALREADY_MATCHED");

    let second = l.reconciliation.get_record(records[1].id).await.unwrap();
    assert_eq!(second.status, MatchStatus::Unmatched);
}
