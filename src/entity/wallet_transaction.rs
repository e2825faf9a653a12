use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{member, money::Money};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum TransactionType {
  #[sea_orm(string_value = "rebate_credit")]
  #[default]
  RebateCredit,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wallet_transactions")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub member_id: i32,
  pub amount: Money,
  pub tx_type: TransactionType,
  pub rebate_id: Option<i32>,
  pub description: Option<String>,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "member::Entity",
    from = "Column::MemberId",
    to = "member::Column::Id"
  )]
  Member,
}

impl Related<member::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Member.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
