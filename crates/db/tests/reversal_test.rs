//! Reversal repository tests.

mod common;

use std::sync::Arc;

use ledgerline_core::events::{ChannelEventSink, LedgerEvent};
use ledgerline_core::ledger::{
    LedgerError, NewEntry, NewVoucher, VoucherReference, VoucherStatus, VoucherType,
};
use ledgerline_db::{AccountRepository, BalanceRepository, ReversalRepository, VoucherRepository};
use ledgerline_shared::types::{Money, VoucherId};

use common::{draft_with, post_simple, seed_chart, setup_db};

#[tokio::test]
async fn test_reversal_copies_reference_and_narrates() {
    let db = setup_db().await;
    let chart = seed_chart(&db).await;
    let vouchers = VoucherRepository::new(db.clone());
    let reversals = ReversalRepository::new(db);

    let draft = vouchers
        .create_draft_voucher(
            NewVoucher::new(VoucherType::Sales, "Invoice 17").with_reference(VoucherReference::new("invoice", "INV-17")),
        )
        .await
        .unwrap();
    vouchers
        .add_entry(draft.id, NewEntry::debit(chart.receivables.id, 900).with_narration("customer"))
        .await
        .unwrap();
    vouchers
        .add_entry(draft.id, NewEntry::credit(chart.sales.id, 900))
        .await
        .unwrap();
    let original = vouchers.post_voucher(draft.id).await.unwrap();

    let reversal = reversals.reverse_voucher(draft.id, "invoice cancelled").await.unwrap();

    assert_eq!(reversal.voucher.number, "REV-000001");
    assert_eq!(
        reversal.voucher.narration,
        format!("Reversal of {}: invoice cancelled", original.voucher.number)
    );
    assert_eq!(reversal.voucher.reference, original.voucher.reference);
    assert_eq!(reversal.entries[0].narration.as_deref(), Some("Reversal: customer"));
    assert_eq!(
        reversal.entries[1].narration,
        Some(format!("Reversal: {}", original.voucher.number))
    );
    assert_eq!(reversal.total_debit, Money::from_minor(900));

    // The original's entries are untouched.
    let after = vouchers.get_voucher(draft.id).await.unwrap();
    assert_eq!(after.entries, original.entries);
}

#[tokio::test]
async fn test_draft_cannot_be_reversed() {
    let db = setup_db().await;
    let chart = seed_chart(&db).await;
    let vouchers = VoucherRepository::new(db.clone());
    let reversals = ReversalRepository::new(db);

    let id = draft_with(
        &vouchers,
        VoucherType::Journal,
        "draft",
        vec![NewEntry::debit(chart.cash.id, 10), NewEntry::credit(chart.sales.id, 10)],
    )
    .await;

    assert_eq!(
        reversals.reverse_voucher(id, "no").await.unwrap_err(),
        LedgerError::NotPosted {
            voucher_id: id,
            status: VoucherStatus::Draft,
        }
    );

    let missing = VoucherId::new();
    assert_eq!(
        reversals.reverse_voucher(missing, "no").await.unwrap_err(),
        LedgerError::VoucherNotFound(missing)
    );
}

#[tokio::test]
async fn test_reversal_fails_cleanly_on_inactive_account() {
    let db = setup_db().await;
    let chart = seed_chart(&db).await;
    let accounts = AccountRepository::new(db.clone());
    let vouchers = VoucherRepository::new(db.clone());
    let reversals = ReversalRepository::new(db);

    let posted = post_simple(&vouchers, chart.expenses.id, chart.cash.id, 60).await;
    accounts.deactivate_account(chart.expenses.id).await.unwrap();

    assert_eq!(
        reversals.reverse_voucher(posted.voucher.id, "wrong").await.unwrap_err(),
        LedgerError::InactiveAccount(chart.expenses.id)
    );

    let original = vouchers.get_voucher(posted.voucher.id).await.unwrap();
    assert_eq!(original.voucher.status, VoucherStatus::Posted);
    assert_eq!(original.voucher.reversed_by_voucher_id, None);

    // Nothing from the failed attempt was kept, not even the number.
    accounts.reactivate_account(chart.expenses.id).await.unwrap();
    let reversal = reversals.reverse_voucher(posted.voucher.id, "wrong").await.unwrap();
    assert_eq!(reversal.voucher.number, "REV-000001");
}

#[tokio::test]
async fn test_reversal_of_reversal_restores_balance() {
    let db = setup_db().await;
    let chart = seed_chart(&db).await;
    let vouchers = VoucherRepository::new(db.clone());
    let reversals = ReversalRepository::new(db.clone());
    let balances = BalanceRepository::new(db);

    let posted = post_simple(&vouchers, chart.cash.id, chart.sales.id, 500).await;
    let reversal = reversals.reverse_voucher(posted.voucher.id, "mistake").await.unwrap();
    assert_eq!(balances.get_balance(chart.cash.id, None).await.unwrap(), Money::ZERO);

    reversals.reverse_voucher(reversal.voucher.id, "not a mistake").await.unwrap();
    assert_eq!(balances.get_balance(chart.cash.id, None).await.unwrap(), Money::from_minor(500));
    assert!(balances.trial_balance(None).await.unwrap().is_balanced());
}

#[tokio::test]
async fn test_reversal_publishes_both_events() {
    let db = setup_db().await;
    let chart = seed_chart(&db).await;
    let (sink, mut rx) = ChannelEventSink::new(8);
    let sink = Arc::new(sink);
    let vouchers = VoucherRepository::with_event_sink(db.clone(), sink.clone());
    let reversals = ReversalRepository::with_event_sink(db, sink);

    let posted = post_simple(&vouchers, chart.cash.id, chart.sales.id, 500).await;
    assert_eq!(rx.try_recv().unwrap().name(), "voucher_posted");

    let reversal = reversals.reverse_voucher(posted.voucher.id, "duplicate").await.unwrap();
    match rx.try_recv().unwrap() {
        LedgerEvent::VoucherReversed {
            voucher_id,
            reversal_voucher_id,
            reason,
            ..
        } => {
            assert_eq!(voucher_id, posted.voucher.id);
            assert_eq!(reversal_voucher_id, reversal.voucher.id);
            assert_eq!(reason, "duplicate");
        }
        other => panic!("unexpected event: {other:?}"),
    }
}
