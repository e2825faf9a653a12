use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Members::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Members::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Members::UplineId).integer().null())
          .col(
            ColumnDef::new(Members::Rank)
              .string()
              .not_null()
              .default("starter"),
          )
          .col(ColumnDef::new(Members::Slot).string().null())
          .col(
            ColumnDef::new(Members::IsActive)
              .boolean()
              .not_null()
              .default(true),
          )
          .col(
            ColumnDef::new(Members::Balance)
              .text()
              .not_null()
              .default("0"),
          )
          .col(ColumnDef::new(Members::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_members_upline")
              .from(Members::Table, Members::UplineId)
              .to(Members::Table, Members::Id)
              .on_delete(ForeignKeyAction::Restrict),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_members_upline")
          .table(Members::Table)
          .col(Members::UplineId)
          .to_owned(),
      )
      .await?;

    // Binary mode: one member per (upline, slot). Unilevel rows leave slot
    // NULL, which never collides.
    manager
      .create_index(
        Index::create()
          .name("idx_members_upline_slot")
          .table(Members::Table)
          .col(Members::UplineId)
          .col(Members::Slot)
          .unique()
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Members::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Members {
  Table,
  Id,
  UplineId,
  Rank,
  Slot,
  IsActive,
  Balance,
  CreatedAt,
}
