use sea_orm_migration::prelude::*;

use super::{
  m20261001_000001_create_members::Members,
  m20261001_000002_create_products::Products,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Purchases::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Purchases::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Purchases::BuyerId).integer().not_null())
          .col(ColumnDef::new(Purchases::ProductId).integer().not_null())
          .col(ColumnDef::new(Purchases::Quantity).integer().not_null())
          .col(
            ColumnDef::new(Purchases::TotalAmount)
              .text()
              .not_null(),
          )
          .col(ColumnDef::new(Purchases::PvTotal).text().not_null())
          .col(ColumnDef::new(Purchases::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_purchases_buyer")
              .from(Purchases::Table, Purchases::BuyerId)
              .to(Members::Table, Members::Id)
              .on_delete(ForeignKeyAction::Restrict),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_purchases_product")
              .from(Purchases::Table, Purchases::ProductId)
              .to(Products::Table, Products::Id)
              .on_delete(ForeignKeyAction::Restrict),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_purchases_buyer_created")
          .table(Purchases::Table)
          .col(Purchases::BuyerId)
          .col(Purchases::CreatedAt)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Purchases::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Purchases {
  Table,
  Id,
  BuyerId,
  ProductId,
  Quantity,
  TotalAmount,
  PvTotal,
  CreatedAt,
}
