//! Per-product, per-level reward rules and the amount arithmetic.

use std::ops::Bound::{Excluded, Unbounded};

use rust_decimal::RoundingStrategy;
use serde::{Deserialize, Serialize};

use crate::{
  entity::{Rank, RewardType, commission_config, member},
  prelude::*,
};

/// Reward rule of a level or a bonus tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Reward {
  /// Percent of the base amount, `12.5` meaning 12.5%.
  Percentage(Decimal),
  Fixed(Decimal),
}

impl Reward {
  pub fn from_parts(ty: RewardType, value: Decimal) -> Self {
    match ty {
      RewardType::Percentage => Reward::Percentage(value),
      RewardType::Fixed => Reward::Fixed(value),
    }
  }

  pub fn parts(self) -> (RewardType, Decimal) {
    match self {
      Reward::Percentage(value) => (RewardType::Percentage, value),
      Reward::Fixed(value) => (RewardType::Fixed, value),
    }
  }

  pub fn validate(self) -> Result<()> {
    match self {
      Reward::Percentage(pct) if pct < Decimal::ZERO || pct > Decimal::ONE_HUNDRED => {
        Err(Error::InvalidArgs(format!("Percentage {pct} is out of 0..=100")))
      }
      Reward::Fixed(value) if value < Decimal::ZERO => {
        Err(Error::InvalidArgs(format!("Fixed reward {value} is negative")))
      }
      _ => Ok(()),
    }
  }
}

/// Amount owed for `reward` on `base`.
///
/// Percentages round to cents, midpoint away from zero; fixed amounts are
/// returned as configured.
pub fn compute_amount(base: Decimal, reward: Reward) -> Decimal {
  match reward {
    Reward::Percentage(pct) => (base * pct / Decimal::ONE_HUNDRED)
      .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
    Reward::Fixed(value) => value,
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelRule {
  pub level: i32,
  pub reward: Reward,
  /// Receivers below this rank are skipped without ending the walk.
  #[serde(default)]
  pub min_rank: Option<Rank>,
}

impl LevelRule {
  pub fn qualifies(&self, receiver: &member::Model) -> bool {
    receiver.is_active && self.min_rank.is_none_or(|min| receiver.rank >= min)
  }
}

impl From<commission_config::Model> for LevelRule {
  fn from(row: commission_config::Model) -> Self {
    Self {
      level: row.level,
      reward: Reward::from_parts(row.reward_type, row.reward_value.0),
      min_rank: row.min_rank,
    }
  }
}

#[derive(Debug, PartialEq)]
pub enum Resolution<'t> {
  Rule(&'t LevelRule),
  /// Nothing configured at this level or above: the chain ends here.
  NotConfigured,
  /// Nothing at this level but something above it, a broken config.
  Gap { missing: i32 },
}

/// All levels of one product, loaded once per computation.
#[derive(Debug, Clone)]
pub struct CommissionTable {
  pub product_id: i32,
  rules: BTreeMap<i32, LevelRule>,
}

impl CommissionTable {
  pub fn new(product_id: i32, rules: impl IntoIterator<Item = LevelRule>) -> Self {
    let rules = rules.into_iter().map(|rule| (rule.level, rule)).collect();
    Self { product_id, rules }
  }

  pub fn resolve(&self, level: i32) -> Resolution<'_> {
    let deeper = || self.rules.range((Excluded(level), Unbounded)).next();
    match self.rules.get(&level) {
      Some(rule) => Resolution::Rule(rule),
      None if deeper().is_some() => Resolution::Gap { missing: level },
      None => Resolution::NotConfigured,
    }
  }

  pub fn rules(&self) -> impl Iterator<Item = &LevelRule> {
    self.rules.values()
  }
}

/// Checks that `rules` are unique, start at level 1 and have no holes.
pub fn validate_levels(product_id: i32, rules: &[LevelRule]) -> Result<()> {
  let mut levels: Vec<i32> = rules.iter().map(|rule| rule.level).collect();
  levels.sort_unstable();

  for (idx, level) in levels.iter().enumerate() {
    let expected = idx as i32 + 1;
    if *level < expected {
      return Err(Error::InvalidArgs(format!(
        "Level {level} is duplicated or below 1"
      )));
    }
    if *level > expected {
      return Err(Error::ConfigurationGap { product: product_id, missing: expected });
    }
  }

  rules.iter().try_for_each(|rule| rule.reward.validate())
}

pub struct Commission<'a, C> {
  db: &'a C,
}

impl<'a, C: ConnectionTrait> Commission<'a, C> {
  pub fn new(db: &'a C) -> Self {
    Self { db }
  }

  pub async fn table(&self, product_id: i32) -> Result<CommissionTable> {
    let rows = commission_config::Entity::find()
      .filter(commission_config::Column::ProductId.eq(product_id))
      .order_by_asc(commission_config::Column::Level)
      .all(self.db)
      .await?;

    Ok(CommissionTable::new(product_id, rows.into_iter().map(LevelRule::from)))
  }

  /// Rule for a single level. Prefer [`Commission::table`] inside a walk.
  pub async fn resolve(
    &self,
    product_id: i32,
    level: i32,
  ) -> Result<Option<LevelRule>> {
    if level < 1 {
      return Err(Error::InvalidArgs(format!("Level {level} is below 1")));
    }
    let table = self.table(product_id).await?;
    match table.resolve(level) {
      Resolution::Rule(rule) => Ok(Some(rule.clone())),
      Resolution::NotConfigured => Ok(None),
      Resolution::Gap { missing } => {
        Err(Error::ConfigurationGap { product: product_id, missing })
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use rust_decimal_macros::dec;

  use super::*;
  use crate::{entity::Money, sv::test_utils::test_db};

  fn rule(level: i32, reward: Reward) -> LevelRule {
    LevelRule { level, reward, min_rank: None }
  }

  #[test]
  fn test_percentage_amount() {
    assert_eq!(
      compute_amount(dec!(1000.00), Reward::Percentage(dec!(12.5))),
      dec!(125.00)
    );
  }

  #[test]
  fn test_percentage_rounds_half_up() {
    assert_eq!(
      compute_amount(dec!(999.995), Reward::Percentage(dec!(10))),
      dec!(100.00)
    );
    assert_eq!(
      compute_amount(dec!(0.05), Reward::Percentage(dec!(50))),
      dec!(0.03)
    );
  }

  #[test]
  fn test_fixed_ignores_base() {
    assert_eq!(compute_amount(dec!(2000), Reward::Fixed(dec!(50))), dec!(50));
    assert_eq!(compute_amount(dec!(1), Reward::Fixed(dec!(50))), dec!(50));
  }

  #[test]
  fn test_resolve_stops_after_prefix() {
    let table = CommissionTable::new(
      1,
      [rule(1, Reward::Fixed(dec!(5))), rule(2, Reward::Fixed(dec!(3)))],
    );

    assert!(matches!(table.resolve(1), Resolution::Rule(r) if r.level == 1));
    assert!(matches!(table.resolve(2), Resolution::Rule(r) if r.level == 2));
    assert_eq!(table.resolve(3), Resolution::NotConfigured);
  }

  #[test]
  fn test_resolve_reports_gap() {
    let table = CommissionTable::new(
      7,
      [rule(1, Reward::Fixed(dec!(5))), rule(3, Reward::Fixed(dec!(3)))],
    );

    assert_eq!(table.resolve(2), Resolution::Gap { missing: 2 });
    assert_eq!(table.resolve(4), Resolution::NotConfigured);
  }

  #[test]
  fn test_resolve_at_level_ceiling() {
    let table = CommissionTable::new(1, [rule(1, Reward::Fixed(dec!(5)))]);
    assert_eq!(table.resolve(i32::MAX), Resolution::NotConfigured);

    let top = CommissionTable::new(1, [rule(i32::MAX, Reward::Fixed(dec!(5)))]);
    assert!(matches!(top.resolve(i32::MAX), Resolution::Rule(_)));
    assert_eq!(top.resolve(1), Resolution::Gap { missing: 1 });
  }

  #[test]
  fn test_validate_levels() {
    let ok = [rule(2, Reward::Fixed(dec!(1))), rule(1, Reward::Fixed(dec!(1)))];
    assert!(validate_levels(1, &ok).is_ok());

    let gap = [rule(1, Reward::Fixed(dec!(1))), rule(3, Reward::Fixed(dec!(1)))];
    assert!(matches!(
      validate_levels(1, &gap),
      Err(Error::ConfigurationGap { product: 1, missing: 2 })
    ));

    let dup = [rule(1, Reward::Fixed(dec!(1))), rule(1, Reward::Fixed(dec!(2)))];
    assert!(matches!(validate_levels(1, &dup), Err(Error::InvalidArgs(_))));

    let late = [rule(2, Reward::Fixed(dec!(1)))];
    assert!(matches!(
      validate_levels(1, &late),
      Err(Error::ConfigurationGap { missing: 1, .. })
    ));

    let pct = [rule(1, Reward::Percentage(dec!(120)))];
    assert!(matches!(validate_levels(1, &pct), Err(Error::InvalidArgs(_))));
  }

  #[test]
  fn test_min_rank_qualification() {
    let mut receiver = member::Model {
      id: 1,
      upline_id: None,
      rank: Rank::Bronze,
      slot: None,
      is_active: true,
      balance: Money::ZERO,
      created_at: Utc::now().naive_utc(),
    };
    let gated = LevelRule {
      level: 1,
      reward: Reward::Fixed(dec!(1)),
      min_rank: Some(Rank::Silver),
    };

    assert!(!gated.qualifies(&receiver));
    receiver.rank = Rank::Gold;
    assert!(gated.qualifies(&receiver));
    receiver.is_active = false;
    assert!(!gated.qualifies(&receiver));
  }

  #[test]
  fn test_reward_serde_shape() {
    let reward: Reward =
      json::from_str(r#"{"type":"percentage","value":"12.5"}"#).unwrap();
    assert_eq!(reward, Reward::Percentage(dec!(12.5)));
  }

  #[tokio::test]
  async fn test_table_from_db() {
    let db = test_db::setup().await;
    let product = test_db::product(&db, dec!(100)).await;
    test_db::level(&db, product.id, 1, RewardType::Fixed, dec!(50)).await;
    test_db::level(&db, product.id, 2, RewardType::Percentage, dec!(5)).await;

    let commission = Commission::new(&db);
    let table = commission.table(product.id).await.unwrap();
    assert_eq!(table.rules().count(), 2);

    let level2 = commission.resolve(product.id, 2).await.unwrap().unwrap();
    assert_eq!(level2.reward, Reward::Percentage(dec!(5)));
    assert!(commission.resolve(product.id, 3).await.unwrap().is_none());
    assert!(commission.resolve(product.id, i32::MAX).await.unwrap().is_none());
    for level in [0, -1, i32::MIN] {
      assert!(matches!(
        commission.resolve(product.id, level).await,
        Err(Error::InvalidArgs(_))
      ));
    }
  }
}
