//! Monthly performance bonus.
//!
//! Independent of the per-purchase walk: each member's own sales over the
//! cutoff period are matched against the bonus tiers, and the result is
//! emitted as a pending bonus rebate for the processor.

use sea_orm::sea_query::OnConflict;

use crate::{
  entity::{
    Money, RebateKind, RebateStatus, bonus_tier, mlm_configuration, rebate,
  },
  prelude::*,
  sv::{
    Purchase, Settings,
    commission::{Reward, compute_amount},
  },
};

/// Cutoff date of `day` in the given month, clamped to the month's length.
pub fn cutoff_in_month(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
  let first = NaiveDate::from_ymd_opt(year, month, 1)?;
  let next_month = first.checked_add_months(chrono::Months::new(1))?;
  let last = next_month.pred_opt()?.day();
  NaiveDate::from_ymd_opt(year, month, day.clamp(1, last))
}

/// Half-open `[start, end)` window of purchases settled at `cutoff`: from the
/// day after the previous month's cutoff through the cutoff day itself.
pub fn period(cutoff: NaiveDate, cutoff_day: u32) -> Option<(DateTime, DateTime)> {
  let prev_month = cutoff.checked_sub_months(chrono::Months::new(1))?;
  let prev =
    cutoff_in_month(prev_month.year(), prev_month.month(), cutoff_day)?;

  let start = prev.succ_opt()?.and_hms_opt(0, 0, 0)?;
  let end = cutoff.succ_opt()?.and_hms_opt(0, 0, 0)?;
  Some((start, end))
}

/// First cutoff on or after `today`. Its bonus is due the next midnight.
pub fn next_cutoff(today: NaiveDate, cutoff_day: u32) -> Option<NaiveDate> {
  let this_month = cutoff_in_month(today.year(), today.month(), cutoff_day)?;
  if this_month >= today {
    return Some(this_month);
  }

  let next = today.with_day(1)?.checked_add_months(chrono::Months::new(1))?;
  cutoff_in_month(next.year(), next.month(), cutoff_day)
}

/// Last cutoff strictly before `today`, i.e. the most recent one already due.
pub fn previous_cutoff(today: NaiveDate, cutoff_day: u32) -> Option<NaiveDate> {
  let this_month = cutoff_in_month(today.year(), today.month(), cutoff_day)?;
  if this_month < today {
    return Some(this_month);
  }

  let prev = today.with_day(1)?.checked_sub_months(chrono::Months::new(1))?;
  cutoff_in_month(prev.year(), prev.month(), cutoff_day)
}

/// Highest-`min_sales` active tier containing `total`.
pub fn select_tier(
  tiers: &[bonus_tier::Model],
  total: Decimal,
) -> Option<&bonus_tier::Model> {
  tiers
    .iter()
    .filter(|tier| tier.is_active && tier.contains(total))
    .max_by_key(|tier| tier.min_sales)
}

fn overlaps(
  min: Decimal,
  max: Option<Decimal>,
  other: &bonus_tier::Model,
) -> bool {
  let below_other_max =
    other.max_sales.is_none_or(|other_max| min <= other_max.0);
  let above_other_min = max.is_none_or(|max| other.min_sales.0 <= max);
  below_other_max && above_other_min
}

pub struct Bonus<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Bonus<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// All tiers, lowest minimum first.
  pub async fn tiers(&self) -> Result<Vec<bonus_tier::Model>> {
    // Text columns sort lexically, so order by value here.
    let mut tiers = bonus_tier::Entity::find().all(self.db).await?;
    tiers.sort_by_key(|tier| (tier.min_sales, tier.id));
    Ok(tiers)
  }

  /// Add an active tier. Active tiers may not overlap.
  pub async fn add_tier(
    &self,
    min_sales: Decimal,
    max_sales: Option<Decimal>,
    reward: Reward,
  ) -> Result<bonus_tier::Model> {
    reward.validate()?;
    if min_sales < Decimal::ZERO {
      return Err(Error::InvalidArgs("Tier minimum must not be negative".into()));
    }
    if let Some(max) = max_sales
      && max < min_sales
    {
      return Err(Error::InvalidArgs(format!(
        "Tier maximum {max} is below minimum {min_sales}"
      )));
    }

    self.ensure_no_overlap(min_sales, max_sales, None).await?;

    let (reward_type, reward_value) = reward.parts();
    let tier = bonus_tier::ActiveModel {
      id: NotSet,
      min_sales: Set(min_sales.into()),
      max_sales: Set(max_sales.map(Money::from)),
      reward_type: Set(reward_type),
      reward_value: Set(reward_value.into()),
      is_active: Set(true),
    };

    Ok(tier.insert(self.db).await?)
  }

  pub async fn set_tier_active(&self, tier_id: i32, active: bool) -> Result<()> {
    let tier = bonus_tier::Entity::find_by_id(tier_id)
      .one(self.db)
      .await?
      .ok_or(Error::TierNotFound)?;

    if active {
      self
        .ensure_no_overlap(tier.min_sales.0, tier.max_sales.map(Decimal::from), Some(tier.id)).await?;
    }

    bonus_tier::ActiveModel { is_active: Set(active), ..tier.into() }
      .update(self.db)
      .await?;

    Ok(())
  }

  async fn ensure_no_overlap(
    &self,
    min: Decimal,
    max: Option<Decimal>,
    except: Option<i32>,
  ) -> Result<()> {
    let clash = self.tiers().await?.into_iter().find(|tier| {
      tier.is_active && Some(tier.id) != except && overlaps(min, max, tier)
    });

    match clash {
      Some(tier) => Err(Error::InvalidArgs(format!(
        "Tier overlaps active tier {} starting at {}",
        tier.id, tier.min_sales
      ))),
      None => Ok(()),
    }
  }

  /// Evaluate the bonus period ending at `cutoff` with current settings.
  pub async fn evaluate(&self, cutoff: NaiveDate) -> Result<Vec<rebate::Model>> {
    let config = Settings::new(self.db).get().await?;
    self.evaluate_with(&config, cutoff).await
  }

  /// Emit one pending bonus per member whose period sales reach a tier.
  /// Evaluating the same cutoff again creates nothing new.
  pub async fn evaluate_with(
    &self,
    config: &mlm_configuration::Model,
    cutoff: NaiveDate,
  ) -> Result<Vec<rebate::Model>> {
    if !config.bonus_enabled {
      debug!("Performance bonus disabled, skipping cutoff {}", cutoff);
      return Ok(vec![]);
    }

    let (start, end) = period(cutoff, config.cutoff_day as u32).ok_or_else(|| {
      Error::InvalidArgs(format!("No bonus period for cutoff {cutoff}"))
    })?;

    let tiers: Vec<bonus_tier::Model> =
      self.tiers().await?.into_iter().filter(|tier| tier.is_active).collect();
    if tiers.is_empty() {
      return Ok(vec![]);
    }

    let mut sales: BTreeMap<i32, Decimal> = BTreeMap::new();
    for purchase in Purchase::new(self.db).between(start, end).await? {
      *sales.entry(purchase.buyer_id).or_default() += purchase.total_amount.0;
    }

    let txn = self.db.begin().await?;
    let now = Utc::now().naive_utc();
    let mut created = Vec::new();

    for (member_id, total) in sales {
      let Some(tier) = select_tier(&tiers, total) else {
        continue;
      };

      let reward = Reward::from_parts(tier.reward_type, tier.reward_value.0);
      let amount = compute_amount(total, reward);
      if amount <= Decimal::ZERO {
        continue;
      }

      let row = rebate::ActiveModel {
        id: NotSet,
        kind: Set(RebateKind::Bonus),
        purchase_id: Set(None),
        generator_id: Set(member_id),
        receiver_id: Set(member_id),
        level: Set(0),
        amount: Set(amount.into()),
        reward_type: Set(tier.reward_type),
        reward_value: Set(tier.reward_value),
        status: Set(RebateStatus::Pending),
        failure_reason: Set(None),
        attempt: Set(0),
        requeued_from: Set(None),
        bonus_period: Set(Some(cutoff)),
        created_at: Set(now),
        claimed_at: Set(None),
        processed_at: Set(None),
      };

      let inserted = rebate::Entity::insert(row)
        .on_conflict(
          OnConflict::columns([
            rebate::Column::ReceiverId,
            rebate::Column::BonusPeriod,
            rebate::Column::Attempt,
          ])
          .do_nothing()
          .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

      if inserted == 0 {
        continue;
      }

      let row = rebate::Entity::find()
        .filter(rebate::Column::ReceiverId.eq(member_id))
        .filter(rebate::Column::BonusPeriod.eq(cutoff))
        .filter(rebate::Column::Attempt.eq(0))
        .one(&txn)
        .await?
        .ok_or_else(|| Error::Internal("inserted bonus vanished".into()))?;
      created.push(row);
    }

    txn.commit().await?;

    info!(
      "Performance bonus for cutoff {}: {} member(s) qualified",
      cutoff,
      created.len()
    );
    Ok(created)
  }
}
