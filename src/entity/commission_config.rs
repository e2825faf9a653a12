use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{member::Rank, money::Money, product};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum RewardType {
  #[sea_orm(string_value = "percentage")]
  Percentage,
  #[sea_orm(string_value = "fixed")]
  Fixed,
}

/// One reward rule of a product, keyed by upline distance.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "commission_configs")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub product_id: i32,
  pub level: i32,
  pub reward_type: RewardType,
  pub reward_value: Money,
  pub min_rank: Option<Rank>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "product::Entity",
    from = "Column::ProductId",
    to = "product::Column::Id"
  )]
  Product,
}

impl Related<product::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Product.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
