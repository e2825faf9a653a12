use sea_orm_migration::prelude::*;

use super::{
  m20261001_000001_create_members::Members,
  m20261001_000003_create_purchases::Purchases,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Rebates::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Rebates::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Rebates::Kind).string().not_null())
          .col(ColumnDef::new(Rebates::PurchaseId).integer().null())
          .col(ColumnDef::new(Rebates::GeneratorId).integer().not_null())
          .col(ColumnDef::new(Rebates::ReceiverId).integer().not_null())
          .col(ColumnDef::new(Rebates::Level).integer().not_null())
          .col(ColumnDef::new(Rebates::Amount).text().not_null())
          .col(ColumnDef::new(Rebates::RewardType).string().not_null())
          .col(
            ColumnDef::new(Rebates::RewardValue)
              .text()
              .not_null(),
          )
          .col(
            ColumnDef::new(Rebates::Status)
              .string()
              .not_null()
              .default("pending"),
          )
          .col(ColumnDef::new(Rebates::FailureReason).string().null())
          .col(
            ColumnDef::new(Rebates::Attempt).integer().not_null().default(0),
          )
          .col(ColumnDef::new(Rebates::RequeuedFrom).integer().null())
          .col(ColumnDef::new(Rebates::BonusPeriod).date().null())
          .col(ColumnDef::new(Rebates::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(Rebates::ClaimedAt).date_time().null())
          .col(ColumnDef::new(Rebates::ProcessedAt).date_time().null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_rebates_purchase")
              .from(Rebates::Table, Rebates::PurchaseId)
              .to(Purchases::Table, Purchases::Id)
              .on_delete(ForeignKeyAction::Restrict),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_rebates_receiver")
              .from(Rebates::Table, Rebates::ReceiverId)
              .to(Members::Table, Members::Id)
              .on_delete(ForeignKeyAction::Restrict),
          )
          .to_owned(),
      )
      .await?;

    // At most one payout per (purchase, receiver, level) and attempt.
    manager
      .create_index(
        Index::create()
          .name("idx_rebates_purchase_receiver_level")
          .table(Rebates::Table)
          .col(Rebates::PurchaseId)
          .col(Rebates::ReceiverId)
          .col(Rebates::Level)
          .col(Rebates::Attempt)
          .unique()
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_rebates_receiver_bonus_period")
          .table(Rebates::Table)
          .col(Rebates::ReceiverId)
          .col(Rebates::BonusPeriod)
          .col(Rebates::Attempt)
          .unique()
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_rebates_status")
          .table(Rebates::Table)
          .col(Rebates::Status)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Rebates::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Rebates {
  Table,
  Id,
  Kind,
  PurchaseId,
  GeneratorId,
  ReceiverId,
  Level,
  Amount,
  RewardType,
  RewardValue,
  Status,
  FailureReason,
  Attempt,
  RequeuedFrom,
  BonusPeriod,
  CreatedAt,
  ClaimedAt,
  ProcessedAt,
}
