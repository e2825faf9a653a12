use sea_orm_migration::prelude::*;

use super::m20261001_000001_create_members::Members;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(WalletTransactions::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(WalletTransactions::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(WalletTransactions::MemberId).integer().not_null())
          .col(
            ColumnDef::new(WalletTransactions::Amount)
              .text()
              .not_null(),
          )
          .col(ColumnDef::new(WalletTransactions::TxType).string().not_null())
          .col(ColumnDef::new(WalletTransactions::RebateId).integer().null())
          .col(ColumnDef::new(WalletTransactions::Description).string().null())
          .col(
            ColumnDef::new(WalletTransactions::CreatedAt)
              .date_time()
              .not_null(),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_wallet_transactions_member")
              .from(WalletTransactions::Table, WalletTransactions::MemberId)
              .to(Members::Table, Members::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_wallet_transactions_member")
          .table(WalletTransactions::Table)
          .col(WalletTransactions::MemberId)
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_wallet_transactions_rebate")
          .table(WalletTransactions::Table)
          .col(WalletTransactions::RebateId)
          .unique()
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(WalletTransactions::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum WalletTransactions {
  Table,
  Id,
  MemberId,
  Amount,
  TxType,
  RebateId,
  Description,
  CreatedAt,
}
