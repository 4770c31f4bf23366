//! Shared fixtures for the repository integration tests.
//!
//! Every test gets its own in-memory SQLite database migrated with the
//! production migrator. The pool is pinned to a single connection so the
//! in-memory database lives as long as the pool and transactions are
//! serialized. Tests that need transactions to overlap use
//! [`FileDb`] instead, a file-backed database shared by several
//! connections.

#![allow(dead_code)]

use std::path::PathBuf;

use chrono::NaiveDate;
use ledgerline_core::ledger::{
    Account, AccountType, NewAccount, NewEntry, NewVoucher, VoucherDetail, VoucherType,
};
use ledgerline_db::migration::{Migrator, MigratorTrait};
use ledgerline_db::{AccountRepository, VoucherRepository};
use ledgerline_shared::types::{AccountId, VoucherId};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use uuid::Uuid;

/// Opens and migrates a fresh database.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(options).await.expect("connect sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    db
}

/// A migrated file-backed database, removed again on drop.
pub struct FileDb {
    pub db: DatabaseConnection,
    dir: PathBuf,
}

impl FileDb {
    /// Opens and migrates a fresh database with a pool of `connections`.
    pub async fn open(connections: u32) -> Self {
        let dir = std::env::temp_dir().join(format!("ledgerline-test-{}", Uuid::now_v7()));
        std::fs::create_dir_all(&dir).expect("create temp dir");

        let url = format!("sqlite://{}?mode=rwc", dir.join("ledger.db").display());
        let mut options = ConnectOptions::new(url);
        options
            .max_connections(connections)
            .min_connections(connections)
            .sqlx_logging(false);

        let db = Database::connect(options).await.expect("connect sqlite file");
        Migrator::up(&db, None).await.expect("run migrations");
        Self { db, dir }
    }
}

impl Drop for FileDb {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

/// The chart used by most tests.
pub struct Chart {
    pub assets: Account,
    pub cash: Account,
    pub bank: Account,
    pub receivables: Account,
    pub equity: Account,
    pub income: Account,
    pub sales: Account,
    pub expenses: Account,
}

/// Creates a small chart: assets with cash/bank/receivables, equity,
/// income with sales, and expenses.
pub async fn seed_chart(db: &DatabaseConnection) -> Chart {
    let accounts = AccountRepository::new(db.clone());

    let assets = create(&accounts, "1000", "Assets", AccountType::Asset, None).await;
    let cash = create(&accounts, "1000-CASH", "Cash", AccountType::Asset, Some(assets.id)).await;
    let bank = create(&accounts, "1010-BANK", "Bank", AccountType::Asset, Some(assets.id)).await;
    let receivables = create(&accounts, "1200-AR", "Receivables", AccountType::Asset, Some(assets.id)).await;
    let equity = create(&accounts, "3000-EQUITY", "Owner's equity", AccountType::Equity, None).await;
    let income = create(&accounts, "4000", "Income", AccountType::Income, None).await;
    let sales = create(&accounts, "4000-SALES", "Sales", AccountType::Income, Some(income.id)).await;
    let expenses = create(&accounts, "5000-EXPENSES", "Expenses", AccountType::Expense, None).await;

    Chart {
        assets,
        cash,
        bank,
        receivables,
        equity,
        income,
        sales,
        expenses,
    }
}

pub async fn create(
    accounts: &AccountRepository,
    code: &str,
    name: &str,
    account_type: AccountType,
    parent_id: Option<AccountId>,
) -> Account {
    let mut input = NewAccount::new(code, name, account_type);
    if let Some(parent_id) = parent_id {
        input = input.with_parent(parent_id);
    }
    accounts.create_account(input).await.expect("create account")
}

/// Builds a draft voucher with the given lines.
pub async fn draft_with(
    vouchers: &VoucherRepository,
    voucher_type: VoucherType,
    narration: &str,
    lines: Vec<NewEntry>,
) -> VoucherId {
    let voucher = vouchers
        .create_draft_voucher(NewVoucher::new(voucher_type, narration))
        .await
        .expect("create draft");
    for line in lines {
        vouchers.add_entry(voucher.id, line).await.expect("add entry");
    }
    voucher.id
}

/// Builds and posts a two-line voucher debiting `debit` and crediting `credit`.
pub async fn post_simple(
    vouchers: &VoucherRepository,
    debit: AccountId,
    credit: AccountId,
    amount: i64,
) -> VoucherDetail {
    let id = draft_with(
        vouchers,
        VoucherType::Journal,
        "test posting",
        vec![NewEntry::debit(debit, amount), NewEntry::credit(credit, amount)],
    )
    .await;
    vouchers.post_voucher(id).await.expect("post voucher")
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}
