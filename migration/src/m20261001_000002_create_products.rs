use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Products::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Products::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Products::Name).string().not_null())
          .col(ColumnDef::new(Products::Price).text().not_null())
          .col(
            ColumnDef::new(Products::Pv)
              .text()
              .not_null()
              .default("0"),
          )
          .col(ColumnDef::new(Products::CreatedAt).date_time().not_null())
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(CommissionConfigs::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(CommissionConfigs::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(
            ColumnDef::new(CommissionConfigs::ProductId).integer().not_null(),
          )
          .col(ColumnDef::new(CommissionConfigs::Level).integer().not_null())
          .col(
            ColumnDef::new(CommissionConfigs::RewardType).string().not_null(),
          )
          .col(
            ColumnDef::new(CommissionConfigs::RewardValue)
              .text()
              .not_null(),
          )
          .col(ColumnDef::new(CommissionConfigs::MinRank).string().null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_commission_configs_product")
              .from(CommissionConfigs::Table, CommissionConfigs::ProductId)
              .to(Products::Table, Products::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_commission_configs_product_level")
          .table(CommissionConfigs::Table)
          .col(CommissionConfigs::ProductId)
          .col(CommissionConfigs::Level)
          .unique()
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(CommissionConfigs::Table).to_owned())
      .await?;

    manager.drop_table(Table::drop().table(Products::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Products {
  Table,
  Id,
  Name,
  Price,
  Pv,
  CreatedAt,
}

#[derive(DeriveIden)]
pub enum CommissionConfigs {
  Table,
  Id,
  ProductId,
  Level,
  RewardType,
  RewardValue,
  MinRank,
}
