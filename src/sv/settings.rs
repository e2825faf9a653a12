use serde::Deserialize;

use crate::{
  entity::{
    PvMode, Structure,
    mlm_configuration::{self, SINGLETON_ID},
  },
  prelude::*,
};

pub const MAX_DEPTH_LIMIT: i32 = 10;

/// Admin update of the configuration; absent fields keep their value.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ConfigPatch {
  pub structure: Option<Structure>,
  pub pv_mode: Option<PvMode>,
  pub bonus_enabled: Option<bool>,
  pub cutoff_day: Option<i32>,
  pub binary_max_depth: Option<i32>,
  pub unilevel_max_depth: Option<i32>,
}

pub struct Settings<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Settings<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Current configuration snapshot. Callers read it once and pass it down.
  pub async fn get(&self) -> Result<mlm_configuration::Model> {
    if let Some(config) =
      mlm_configuration::Entity::find_by_id(SINGLETON_ID).one(self.db).await?
    {
      return Ok(config);
    }

    warn!("MLM configuration row missing, restoring defaults");

    let config = mlm_configuration::ActiveModel {
      id: Set(SINGLETON_ID),
      structure: Set(Structure::Unilevel),
      pv_mode: Set(PvMode::PerUnit),
      bonus_enabled: Set(false),
      cutoff_day: Set(1),
      binary_max_depth: Set(5),
      unilevel_max_depth: Set(5),
      updated_at: Set(None),
    };

    Ok(config.insert(self.db).await?)
  }

  pub async fn update(
    &self,
    patch: ConfigPatch,
  ) -> Result<mlm_configuration::Model> {
    if let Some(day) = patch.cutoff_day
      && !(1..=31).contains(&day)
    {
      return Err(Error::InvalidArgs(format!("Cutoff day {day} is out of 1..=31")));
    }

    for depth in [patch.binary_max_depth, patch.unilevel_max_depth]
      .into_iter()
      .flatten()
    {
      if !(1..=MAX_DEPTH_LIMIT).contains(&depth) {
        return Err(Error::InvalidArgs(format!(
          "Max depth {depth} is out of 1..={MAX_DEPTH_LIMIT}"
        )));
      }
    }

    let current = self.get().await?;
    let mut config: mlm_configuration::ActiveModel = current.into();

    if let Some(structure) = patch.structure {
      config.structure = Set(structure);
    }
    if let Some(pv_mode) = patch.pv_mode {
      config.pv_mode = Set(pv_mode);
    }
    if let Some(enabled) = patch.bonus_enabled {
      config.bonus_enabled = Set(enabled);
    }
    if let Some(day) = patch.cutoff_day {
      config.cutoff_day = Set(day);
    }
    if let Some(depth) = patch.binary_max_depth {
      config.binary_max_depth = Set(depth);
    }
    if let Some(depth) = patch.unilevel_max_depth {
      config.unilevel_max_depth = Set(depth);
    }
    config.updated_at = Set(Some(Utc::now().naive_utc()));

    let updated = config.update(self.db).await?;
    info!(
      "MLM configuration updated: {:?}, depth {}, cutoff day {}",
      updated.structure,
      updated.max_depth(),
      updated.cutoff_day
    );

    Ok(updated)
  }
}
