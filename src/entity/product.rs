use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{commission_config, money::Money};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub name: String,
  pub price: Money,
  pub pv: Money,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "commission_config::Entity")]
  CommissionConfigs,
}

impl Related<commission_config::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::CommissionConfigs.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
