use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(MlmConfiguration::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(MlmConfiguration::Id)
              .integer()
              .not_null()
              .primary_key(),
          )
          .col(
            ColumnDef::new(MlmConfiguration::Structure)
              .string()
              .not_null()
              .default("unilevel"),
          )
          .col(
            ColumnDef::new(MlmConfiguration::PvMode)
              .string()
              .not_null()
              .default("per_unit"),
          )
          .col(
            ColumnDef::new(MlmConfiguration::BonusEnabled)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(
            ColumnDef::new(MlmConfiguration::CutoffDay)
              .integer()
              .not_null()
              .default(1),
          )
          .col(
            ColumnDef::new(MlmConfiguration::BinaryMaxDepth)
              .integer()
              .not_null()
              .default(5),
          )
          .col(
            ColumnDef::new(MlmConfiguration::UnilevelMaxDepth)
              .integer()
              .not_null()
              .default(5),
          )
          .col(ColumnDef::new(MlmConfiguration::UpdatedAt).date_time().null())
          .to_owned(),
      )
      .await?;

    // Singleton row, read by every rebate computation.
    let db = manager.get_connection();
    db.execute_unprepared("INSERT INTO mlm_configuration (id) VALUES (1)")
      .await?;

    Ok(())
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(MlmConfiguration::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum MlmConfiguration {
  Table,
  Id,
  Structure,
  PvMode,
  BonusEnabled,
  CutoffDay,
  BinaryMaxDepth,
  UnilevelMaxDepth,
  UpdatedAt,
}
