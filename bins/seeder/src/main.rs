//! Seeds a demo chart of accounts and a few postings for local development.
//!
//! Safe to run repeatedly: accounts are looked up by code and the demo
//! vouchers are only posted into an empty ledger.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::{Context, Result};
use ledgerline_core::events::ChannelEventSink;
use ledgerline_core::ledger::{
    AccountType, NewAccount, NewEntry, NewVoucher, VoucherFilter, VoucherReference, VoucherType,
};
use ledgerline_db::{AccountRepository, BalanceRepository, VoucherRepository};
use ledgerline_shared::AppConfig;
use ledgerline_shared::telemetry::init_tracing;
use ledgerline_shared::types::AccountId;
use tracing::info;

/// Demo chart: (code, name, type, parent code).
const CHART: &[(&str, &str, AccountType, Option<&str>)] = &[
    ("1000", "Assets", AccountType::Asset, None),
    ("1000-CASH", "Cash on hand", AccountType::Asset, Some("1000")),
    ("1010-BANK", "Bank", AccountType::Asset, Some("1000")),
    ("1200-AR", "Accounts receivable", AccountType::Asset, Some("1000")),
    ("2000", "Liabilities", AccountType::Liability, None),
    ("2100-AP", "Accounts payable", AccountType::Liability, Some("2000")),
    ("3000-EQUITY", "Owner's equity", AccountType::Equity, None),
    ("4000", "Income", AccountType::Income, None),
    ("4000-SALES", "Sales", AccountType::Income, Some("4000")),
    ("5000", "Expenses", AccountType::Expense, None),
    ("5100-RENT", "Rent", AccountType::Expense, Some("5000")),
];

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.logging);

    let db = ledgerline_db::connect(&config.database)
        .await
        .context("failed to connect to database")?;

    let accounts = AccountRepository::new(db.clone());
    let (sink, mut events) = ChannelEventSink::new(config.events.channel_capacity);
    let vouchers = VoucherRepository::with_event_sink(db.clone(), Arc::new(sink));
    let balances = BalanceRepository::new(db);

    for (code, name, account_type, parent) in CHART {
        if accounts.find_by_code(code).await?.is_some() {
            info!(code, "Account exists, skipping");
            continue;
        }
        let mut input = NewAccount::new(*code, *name, *account_type);
        if let Some(parent) = parent {
            input = input.with_parent(account_id(&accounts, parent).await?);
        }
        accounts.create_account(input).await?;
    }

    if vouchers.list_vouchers(VoucherFilter::default()).await?.is_empty() {
        let cash = account_id(&accounts, "1000-CASH").await?;
        let bank = account_id(&accounts, "1010-BANK").await?;
        let equity = account_id(&accounts, "3000-EQUITY").await?;
        let sales = account_id(&accounts, "4000-SALES").await?;
        let rent = account_id(&accounts, "5100-RENT").await?;

        post(
            &vouchers,
            NewVoucher::new(VoucherType::Journal, "Opening capital"),
            vec![NewEntry::debit(bank, 1_000_000), NewEntry::credit(equity, 1_000_000)],
        )
        .await?;
        post(
            &vouchers,
            NewVoucher::new(VoucherType::Sales, "Counter sale")
                .with_reference(VoucherReference::new("invoice", "INV-0001")),
            vec![NewEntry::debit(cash, 50_000), NewEntry::credit(sales, 50_000)],
        )
        .await?;
        post(
            &vouchers,
            NewVoucher::new(VoucherType::Payment, "March rent"),
            vec![NewEntry::debit(rent, 120_000), NewEntry::credit(bank, 120_000)],
        )
        .await?;
    } else {
        info!("Ledger already has vouchers, skipping demo postings");
    }

    while let Ok(event) = events.try_recv() {
        info!(event = event.name(), voucher_id = %event.voucher_id(), "Published");
    }

    let trial = balances.trial_balance(None).await?;
    for line in &trial.lines {
        info!(code = %line.code, balance = %line.balance, "Trial balance");
    }
    info!(balanced = trial.is_balanced(), "Seeding complete");

    Ok(())
}

async fn account_id(accounts: &AccountRepository, code: &str) -> Result<AccountId> {
    accounts
        .find_by_code(code)
        .await?
        .map(|account| account.id)
        .with_context(|| format!("account {code} not found"))
}

async fn post(vouchers: &VoucherRepository, header: NewVoucher, lines: Vec<NewEntry>) -> Result<()> {
    let draft = vouchers.create_draft_voucher(header).await?;
    for line in lines {
        vouchers.add_entry(draft.id, line).await?;
    }
    vouchers.post_voucher(draft.id).await?;
    Ok(())
}
