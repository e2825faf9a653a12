use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(BonusTiers::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(BonusTiers::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(
            ColumnDef::new(BonusTiers::MinSales).text().not_null(),
          )
          .col(ColumnDef::new(BonusTiers::MaxSales).text().null())
          .col(ColumnDef::new(BonusTiers::RewardType).string().not_null())
          .col(
            ColumnDef::new(BonusTiers::RewardValue)
              .text()
              .not_null(),
          )
          .col(
            ColumnDef::new(BonusTiers::IsActive)
              .boolean()
              .not_null()
              .default(true),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(BonusTiers::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum BonusTiers {
  Table,
  Id,
  MinSales,
  MaxSales,
  RewardType,
  RewardValue,
  IsActive,
}
