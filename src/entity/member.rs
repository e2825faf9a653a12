use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{money::Money, purchase, wallet_transaction};

/// Member rank, ordered from lowest to highest.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum Rank {
  #[sea_orm(string_value = "starter")]
  #[default]
  Starter,
  #[sea_orm(string_value = "bronze")]
  Bronze,
  #[sea_orm(string_value = "silver")]
  Silver,
  #[sea_orm(string_value = "gold")]
  Gold,
  #[sea_orm(string_value = "platinum")]
  Platinum,
  #[sea_orm(string_value = "diamond")]
  Diamond,
}

/// Position under the upline in binary mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum Slot {
  #[sea_orm(string_value = "left")]
  Left,
  #[sea_orm(string_value = "right")]
  Right,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "members")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub upline_id: Option<i32>,
  pub rank: Rank,
  pub slot: Option<Slot>,
  pub is_active: bool,
  pub balance: Money,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "Entity",
    from = "Column::UplineId",
    to = "Column::Id"
  )]
  Upline,
  #[sea_orm(has_many = "purchase::Entity")]
  Purchases,
  #[sea_orm(has_many = "wallet_transaction::Entity")]
  WalletTransactions,
}

impl Related<purchase::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Purchases.def()
  }
}

impl Related<wallet_transaction::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::WalletTransactions.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
