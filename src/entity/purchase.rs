use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{member, money::Money, product};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchases")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub buyer_id: i32,
  pub product_id: i32,
  pub quantity: i32,
  pub total_amount: Money,
  pub pv_total: Money,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "member::Entity",
    from = "Column::BuyerId",
    to = "member::Column::Id"
  )]
  Buyer,
  #[sea_orm(
    belongs_to = "product::Entity",
    from = "Column::ProductId",
    to = "product::Column::Id"
  )]
  Product,
}

impl Related<member::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Buyer.def()
  }
}

impl Related<product::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Product.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
