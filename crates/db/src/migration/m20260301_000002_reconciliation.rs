//! Reconciliation migration.
//!
//! Creates reconciliation_records. The partial unique index on
//! `matched_entry_id` lets any number of records sit unmatched while
//! allowing at most one claim per ledger entry.

use sea_orm_migration::prelude::*;

use super::m20260301_000001_ledger::{Accounts, LedgerEntries};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ReconciliationRecords::Table)
                    .col(ColumnDef::new(ReconciliationRecords::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ReconciliationRecords::AccountId).uuid().not_null())
                    .col(ColumnDef::new(ReconciliationRecords::ExternalRef).string_len(128).not_null())
                    .col(ColumnDef::new(ReconciliationRecords::Amount).big_integer().not_null())
                    .col(ColumnDef::new(ReconciliationRecords::StatementDate).date().not_null())
                    .col(ColumnDef::new(ReconciliationRecords::Description).text().null())
                    .col(ColumnDef::new(ReconciliationRecords::MatchedEntryId).uuid().null())
                    .col(ColumnDef::new(ReconciliationRecords::Status).string_len(16).not_null())
                    .col(ColumnDef::new(ReconciliationRecords::MatchedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(ReconciliationRecords::Note).text().null())
                    .col(ColumnDef::new(ReconciliationRecords::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(ReconciliationRecords::UpdatedAt).timestamp_with_time_zone().not_null())
                    .check(Expr::col(ReconciliationRecords::Amount).gt(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reconciliation_account")
                            .from(ReconciliationRecords::Table, ReconciliationRecords::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reconciliation_entry")
                            .from(ReconciliationRecords::Table, ReconciliationRecords::MatchedEntryId)
                            .to(LedgerEntries::Table, LedgerEntries::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reconciliation_account_status")
                    .table(ReconciliationRecords::Table)
                    .col(ReconciliationRecords::AccountId)
                    .col(ReconciliationRecords::Status)
                    .to_owned(),
            )
            .await?;

        let db = manager.get_connection();
        db.execute_unprepared(CLAIM_INDEX_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(ReconciliationRecords::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}

// Valid on both Postgres and SQLite.
const CLAIM_INDEX_SQL: &str = r"
CREATE UNIQUE INDEX uq_reconciliation_matched_entry
    ON reconciliation_records (matched_entry_id)
    WHERE matched_entry_id IS NOT NULL;
";

#[derive(DeriveIden)]
enum ReconciliationRecords {
    Table,
    Id,
    AccountId,
    ExternalRef,
    Amount,
    StatementDate,
    Description,
    MatchedEntryId,
    Status,
    MatchedAt,
    Note,
    CreatedAt,
    UpdatedAt,
}
