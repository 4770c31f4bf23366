//! Ledger core migration.
//!
//! Creates accounts, vouchers, ledger entries and the voucher number
//! sequences. Tables are built with the schema builder so the same
//! migration runs on Postgres and on the SQLite test database.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // PART 1: CHART OF ACCOUNTS
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .col(ColumnDef::new(Accounts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Accounts::Code).string_len(64).not_null().unique_key())
                    .col(ColumnDef::new(Accounts::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Accounts::AccountType).string_len(16).not_null())
                    .col(ColumnDef::new(Accounts::ParentId).uuid().null())
                    .col(ColumnDef::new(Accounts::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Accounts::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Accounts::UpdatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_accounts_parent")
                            .from(Accounts::Table, Accounts::ParentId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_accounts_parent")
                    .table(Accounts::Table)
                    .col(Accounts::ParentId)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // PART 2: VOUCHERS & LEDGER ENTRIES
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Vouchers::Table)
                    .col(ColumnDef::new(Vouchers::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Vouchers::Number).string_len(32).not_null().unique_key())
                    .col(ColumnDef::new(Vouchers::VoucherType).string_len(16).not_null())
                    .col(ColumnDef::new(Vouchers::Status).string_len(16).not_null())
                    .col(ColumnDef::new(Vouchers::Narration).text().not_null())
                    .col(ColumnDef::new(Vouchers::SourceType).string_len(64).null())
                    .col(ColumnDef::new(Vouchers::SourceId).string_len(128).null())
                    .col(ColumnDef::new(Vouchers::ReversesVoucherId).uuid().null())
                    .col(ColumnDef::new(Vouchers::ReversedByVoucherId).uuid().null())
                    .col(ColumnDef::new(Vouchers::PostedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Vouchers::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Vouchers::UpdatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vouchers_reverses")
                            .from(Vouchers::Table, Vouchers::ReversesVoucherId)
                            .to(Vouchers::Table, Vouchers::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one reversal per voucher.
        manager
            .create_index(
                Index::create()
                    .name("uq_vouchers_reverses")
                    .table(Vouchers::Table)
                    .col(Vouchers::ReversesVoucherId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_vouchers_source")
                    .table(Vouchers::Table)
                    .col(Vouchers::SourceType)
                    .col(Vouchers::SourceId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LedgerEntries::Table)
                    .col(ColumnDef::new(LedgerEntries::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(LedgerEntries::VoucherId).uuid().not_null())
                    .col(ColumnDef::new(LedgerEntries::AccountId).uuid().not_null())
                    .col(ColumnDef::new(LedgerEntries::EntryType).string_len(8).not_null())
                    .col(ColumnDef::new(LedgerEntries::Amount).big_integer().not_null())
                    .col(ColumnDef::new(LedgerEntries::Narration).text().null())
                    .col(ColumnDef::new(LedgerEntries::LineNo).integer().not_null())
                    .col(ColumnDef::new(LedgerEntries::CreatedAt).timestamp_with_time_zone().not_null())
                    .check(Expr::col(LedgerEntries::Amount).gt(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ledger_entries_voucher")
                            .from(LedgerEntries::Table, LedgerEntries::VoucherId)
                            .to(Vouchers::Table, Vouchers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ledger_entries_account")
                            .from(LedgerEntries::Table, LedgerEntries::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ledger_entries_voucher")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::VoucherId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ledger_entries_account")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::AccountId)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // PART 3: VOUCHER NUMBER SEQUENCES
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(VoucherSequences::Table)
                    .col(
                        ColumnDef::new(VoucherSequences::Series)
                            .string_len(8)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(VoucherSequences::NextValue)
                            .big_integer()
                            .not_null()
                            .default(1),
                    )
                    .to_owned(),
            )
            .await?;

        let db = manager.get_connection();
        db.execute_unprepared(SEED_SEQUENCES_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VoucherSequences::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LedgerEntries::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Vouchers::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}

const SEED_SEQUENCES_SQL: &str = r"
INSERT INTO voucher_sequences (series, next_value) VALUES
    ('JV', 1),
    ('PMT', 1),
    ('RCT', 1),
    ('SAL', 1),
    ('PUR', 1),
    ('ADJ', 1),
    ('REV', 1);
";

#[derive(DeriveIden)]
pub(super) enum Accounts {
    Table,
    Id,
    Code,
    Name,
    AccountType,
    ParentId,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Vouchers {
    Table,
    Id,
    Number,
    VoucherType,
    Status,
    Narration,
    SourceType,
    SourceId,
    ReversesVoucherId,
    ReversedByVoucherId,
    PostedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(super) enum LedgerEntries {
    Table,
    Id,
    VoucherId,
    AccountId,
    EntryType,
    Amount,
    Narration,
    LineNo,
    CreatedAt,
}

#[derive(DeriveIden)]
enum VoucherSequences {
    Table,
    Series,
    NextValue,
}
