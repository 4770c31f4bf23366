//! Property-based tests for PostingEngine.
//!
//! - Balanced vouchers are accepted and their totals agree
//! - Any voucher whose sides differ is rejected as unbalanced
//! - Vouchers that already left Draft are never re-validated as postable

use chrono::Utc;
use ledgerline_shared::types::{AccountId, LedgerEntryId, Money, VoucherId};
use proptest::prelude::*;

use super::entry::LedgerEntry;
use super::error::LedgerError;
use super::posting::PostingEngine;
use super::types::{EntryType, VoucherStatus, VoucherType};
use super::voucher::Voucher;

/// Strategy to generate positive amounts (1 to 10,000,000 minor units).
fn positive_amount() -> impl Strategy<Value = i64> {
    1i64..10_000_000i64
}

fn make_voucher(status: VoucherStatus) -> Voucher {
    let now = Utc::now();
    Voucher {
        id: VoucherId::new(),
        number: "JV-000001".to_string(),
        voucher_type: VoucherType::Journal,
        status,
        narration: "Property test".to_string(),
        reference: None,
        reverses_voucher_id: None,
        reversed_by_voucher_id: None,
        posted_at: None,
        created_at: now,
        updated_at: now,
    }
}

fn make_entries(voucher: &Voucher, debits: &[i64], credits: &[i64]) -> Vec<LedgerEntry> {
    let lines = debits
        .iter()
        .map(|a| (EntryType::Debit, *a))
        .chain(credits.iter().map(|a| (EntryType::Credit, *a)));

    lines
        .zip(1..)
        .map(|((entry_type, amount), line_no)| LedgerEntry {
            id: LedgerEntryId::new(),
            voucher_id: voucher.id,
            account_id: AccountId::new(),
            entry_type,
            amount: Money::from_minor(amount),
            narration: None,
            line_no,
            created_at: Utc::now(),
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Splitting one amount across several credit lines stays balanced.
    #[test]
    fn prop_split_balanced_voucher_accepted(
        credits in prop::collection::vec(positive_amount(), 1..8),
    ) {
        let voucher = make_voucher(VoucherStatus::Draft);
        let debit: i64 = credits.iter().sum();
        let entries = make_entries(&voucher, &[debit], &credits);

        let totals = PostingEngine::validate_for_posting(&voucher, &entries, |_| Some(true));
        prop_assert!(totals.is_ok(), "balanced voucher should validate");
        let totals = totals.unwrap();
        prop_assert_eq!(totals.debit, totals.credit);
        prop_assert_eq!(totals.debit, Money::from_minor(debit));
    }

    /// Any difference between the sides is rejected, whatever its size.
    #[test]
    fn prop_unbalanced_voucher_rejected(
        debits in prop::collection::vec(positive_amount(), 1..6),
        credits in prop::collection::vec(positive_amount(), 1..6),
    ) {
        let debit: i64 = debits.iter().sum();
        let credit: i64 = credits.iter().sum();
        prop_assume!(debit != credit);

        let voucher = make_voucher(VoucherStatus::Draft);
        let entries = make_entries(&voucher, &debits, &credits);

        let result = PostingEngine::validate_for_posting(&voucher, &entries, |_| Some(true));
        prop_assert_eq!(
            result,
            Err(LedgerError::Unbalanced {
                debit: Money::from_minor(debit),
                credit: Money::from_minor(credit),
            })
        );
    }

    /// Totals equal the plain sums of each side.
    #[test]
    fn prop_totals_match_side_sums(
        debits in prop::collection::vec(positive_amount(), 0..6),
        credits in prop::collection::vec(positive_amount(), 0..6),
    ) {
        let voucher = make_voucher(VoucherStatus::Draft);
        let entries = make_entries(&voucher, &debits, &credits);

        let totals = PostingEngine::calculate_totals(&entries).unwrap();
        prop_assert_eq!(totals.debit.minor_units(), debits.iter().sum::<i64>());
        prop_assert_eq!(totals.credit.minor_units(), credits.iter().sum::<i64>());
    }

    /// A voucher that is already posted or reversed never validates again.
    #[test]
    fn prop_non_draft_never_postable(
        amount in positive_amount(),
        status in prop_oneof![Just(VoucherStatus::Posted), Just(VoucherStatus::Reversed)],
    ) {
        let voucher = make_voucher(status);
        let entries = make_entries(&voucher, &[amount], &[amount]);

        let result = PostingEngine::validate_for_posting(&voucher, &entries, |_| Some(true));
        prop_assert!(
            matches!(result, Err(LedgerError::VoucherNotDraft { .. })),
            "non-draft voucher must be rejected"
        );
    }
}
