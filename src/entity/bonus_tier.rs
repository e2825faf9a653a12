use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{commission_config::RewardType, money::Money};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bonus_tiers")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub min_sales: Money,
  /// `None` is unbounded.
  pub max_sales: Option<Money>,
  pub reward_type: RewardType,
  pub reward_value: Money,
  pub is_active: bool,
}

impl Model {
  pub fn contains(&self, sales: Decimal) -> bool {
    self.min_sales.0 <= sales && self.max_sales.is_none_or(|max| sales <= max.0)
  }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
