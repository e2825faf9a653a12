use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const SINGLETON_ID: i32 = 1;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum Structure {
  /// At most two direct recruits per member, left and right.
  #[sea_orm(string_value = "binary")]
  Binary,
  #[sea_orm(string_value = "unilevel")]
  #[default]
  Unilevel,
}

/// How a purchase's `pv_total` is derived.
///
/// PV is recorded for reporting only. Level rebates and the performance
/// bonus are computed from the monetary `total_amount`, so this setting never
/// changes an amount paid.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum PvMode {
  /// Product PV times quantity.
  #[sea_orm(string_value = "per_unit")]
  #[default]
  PerUnit,
  /// Product PV once per purchase regardless of quantity.
  #[sea_orm(string_value = "per_order")]
  PerOrder,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mlm_configuration")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: i32,
  pub structure: Structure,
  pub pv_mode: PvMode,
  pub bonus_enabled: bool,
  pub cutoff_day: i32,
  pub binary_max_depth: i32,
  pub unilevel_max_depth: i32,
  pub updated_at: Option<DateTime>,
}

impl Model {
  /// Depth limit of the active structure mode.
  pub fn max_depth(&self) -> u32 {
    let depth = match self.structure {
      Structure::Binary => self.binary_max_depth,
      Structure::Unilevel => self.unilevel_max_depth,
    };
    depth.max(0) as u32
  }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
