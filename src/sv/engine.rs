//! Per-purchase rebate computation.
//!
//! Walks the buyer's upline level by level and writes one pending rebate per
//! qualifying receiver. The walk ends at the first unconfigured level, at the
//! depth limit, or at the root; receivers that do not qualify are skipped
//! without ending it.

use sea_orm::sea_query::OnConflict;

use crate::{
  entity::{RebateKind, RebateStatus, mlm_configuration, purchase, rebate},
  prelude::*,
  sv::{
    Settings,
    commission::{Commission, Resolution, compute_amount},
    tree::Tree,
  },
};

pub struct Engine<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Engine<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Compute rebates for a purchase with the current configuration.
  pub async fn compute(&self, purchase_id: i32) -> Result<Vec<rebate::Model>> {
    let config = Settings::new(self.db).get().await?;
    self.compute_with(&config, purchase_id).await
  }

  /// Compute rebates for a purchase under `config`.
  ///
  /// Returns only rows created by this call: running it again for the same
  /// purchase returns an empty list and pays nothing twice. All rows of one
  /// purchase are written in a single transaction.
  pub async fn compute_with(
    &self,
    config: &mlm_configuration::Model,
    purchase_id: i32,
  ) -> Result<Vec<rebate::Model>> {
    let txn = self.db.begin().await?;

    let purchase = purchase::Entity::find_by_id(purchase_id)
      .one(&txn)
      .await?
      .ok_or(Error::PurchaseNotFound)?;

    let table = Commission::new(&txn).table(purchase.product_id).await?;
    let chain = Tree::new(&txn, config.structure)
      .upline_chain(purchase.buyer_id, config.max_depth())
      .await?;

    let now = Utc::now().naive_utc();
    let mut created = Vec::new();

    for (idx, receiver) in chain.iter().enumerate() {
      let level = idx as i32 + 1;

      let rule = match table.resolve(level) {
        Resolution::Rule(rule) => rule,
        Resolution::NotConfigured => {
          debug!("Purchase {}: no commission past level {}", purchase.id, level - 1);
          break;
        }
        Resolution::Gap { missing } => {
          warn!(
            "Product {} has no commission at level {} but pays deeper levels, \
             stopping walk for purchase {}",
            purchase.product_id, missing, purchase.id
          );
          break;
        }
      };

      if !rule.qualifies(receiver) {
        debug!(
          "Purchase {}: member {} does not qualify for level {}",
          purchase.id, receiver.id, level
        );
        continue;
      }

      let amount = compute_amount(purchase.total_amount.0, rule.reward);
      if amount <= Decimal::ZERO {
        continue;
      }

      let (reward_type, reward_value) = rule.reward.parts();
      let row = rebate::ActiveModel {
        id: NotSet,
        kind: Set(RebateKind::Level),
        purchase_id: Set(Some(purchase.id)),
        generator_id: Set(purchase.buyer_id),
        receiver_id: Set(receiver.id),
        level: Set(level),
        amount: Set(amount.into()),
        reward_type: Set(reward_type),
        reward_value: Set(reward_value.into()),
        status: Set(RebateStatus::Pending),
        failure_reason: Set(None),
        attempt: Set(0),
        requeued_from: Set(None),
        bonus_period: Set(None),
        created_at: Set(now),
        claimed_at: Set(None),
        processed_at: Set(None),
      };

      let inserted = rebate::Entity::insert(row)
        .on_conflict(
          OnConflict::columns([
            rebate::Column::PurchaseId,
            rebate::Column::ReceiverId,
            rebate::Column::Level,
            rebate::Column::Attempt,
          ])
          .do_nothing()
          .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

      if inserted == 0 {
        debug!(
          "Purchase {}: level {} rebate for member {} already exists",
          purchase.id, level, receiver.id
        );
        continue;
      }

      let row = rebate::Entity::find()
        .filter(rebate::Column::PurchaseId.eq(purchase.id))
        .filter(rebate::Column::ReceiverId.eq(receiver.id))
        .filter(rebate::Column::Level.eq(level))
        .filter(rebate::Column::Attempt.eq(0))
        .one(&txn)
        .await?
        .ok_or_else(|| Error::Internal("inserted rebate vanished".into()))?;
      created.push(row);
    }

    txn.commit().await?;

    if !created.is_empty() {
      info!(
        "Purchase {}: {} rebate(s) pending over {} upline member(s)",
        purchase.id,
        created.len(),
        chain.len()
      );
    }

    Ok(created)
  }

  pub async fn by_purchase(&self, purchase_id: i32) -> Result<Vec<rebate::Model>> {
    Ok(
      rebate::Entity::find()
        .filter(rebate::Column::PurchaseId.eq(purchase_id))
        .order_by_asc(rebate::Column::Level)
        .order_by_asc(rebate::Column::Attempt)
        .all(self.db)
        .await?,
    )
  }
}

#[cfg(test)]
mod tests {
  use rust_decimal_macros::dec;

  use super::*;
  use crate::{
    entity::{Rank, RewardType, Structure},
    sv::{
      Catalog, Processor, Purchase, Wallet,
      commission::{LevelRule, Reward},
      settings::ConfigPatch,
      test_utils::test_db,
    },
  };

  /// Linear upline of `len` members, returned root first.
  async fn line(db: &DatabaseConnection, len: usize) -> Vec<i32> {
    let mut ids = Vec::new();
    let mut upline = None;
    for _ in 0..len {
      let member = test_db::member(db, upline).await;
      upline = Some(member.id);
      ids.push(member.id);
    }
    ids
  }

  async fn buy(db: &DatabaseConnection, buyer: i32, product: i32) -> i32 {
    Purchase::new(db).record(buyer, product, 1).await.unwrap().id
  }

  #[tokio::test]
  async fn test_end_to_end_scenario() {
    let db = test_db::setup().await;
    let ids = line(&db, 3).await;
    let (a, b, c) = (ids[0], ids[1], ids[2]);

    let catalog = Catalog::new(&db);
    let product =
      catalog.create_product("Starter kit", dec!(2000), dec!(100)).await.unwrap();
    catalog
      .set_levels(
        product.id,
        vec![
          LevelRule { level: 1, reward: Reward::Fixed(dec!(50)), min_rank: None },
          LevelRule {
            level: 2,
            reward: Reward::Percentage(dec!(5)),
            min_rank: None,
          },
        ],
      )
      .await
      .unwrap();

    let purchase = buy(&db, c, product.id).await;
    let rebates = Engine::new(&db).compute(purchase).await.unwrap();

    assert_eq!(rebates.len(), 2);
    assert_eq!(
      (rebates[0].generator_id, rebates[0].receiver_id, rebates[0].level),
      (c, b, 1)
    );
    assert_eq!(rebates[0].amount, dec!(50));
    assert_eq!(
      (rebates[1].generator_id, rebates[1].receiver_id, rebates[1].level),
      (c, a, 2)
    );
    assert_eq!(rebates[1].amount, dec!(100));
    assert!(rebates.iter().all(|r| r.status == RebateStatus::Pending));

    let wallet = Wallet::new(&db);
    let summary =
      Processor::new(&db, &wallet).process_pending(None).await.unwrap();
    assert_eq!(summary.processed, 2);

    let stored = Engine::new(&db).by_purchase(purchase).await.unwrap();
    assert!(stored.iter().all(|r| r.status == RebateStatus::Processed));
    assert_eq!(wallet.balance(b).await.unwrap(), dec!(50));
    assert_eq!(wallet.balance(a).await.unwrap(), dec!(100));
    assert_eq!(wallet.balance(c).await.unwrap(), Decimal::ZERO);
  }

  #[tokio::test]
  async fn test_compute_is_idempotent() {
    let db = test_db::setup().await;
    let ids = line(&db, 3).await;
    let product = test_db::product(&db, dec!(100)).await;
    test_db::level(&db, product.id, 1, RewardType::Fixed, dec!(5)).await;
    test_db::level(&db, product.id, 2, RewardType::Fixed, dec!(3)).await;

    let purchase = buy(&db, ids[2], product.id).await;
    let engine = Engine::new(&db);

    assert_eq!(engine.compute(purchase).await.unwrap().len(), 2);
    assert!(engine.compute(purchase).await.unwrap().is_empty());
    assert_eq!(engine.by_purchase(purchase).await.unwrap().len(), 2);
  }

  #[tokio::test]
  async fn test_root_buyer_earns_nobody() {
    let db = test_db::setup().await;
    let root = test_db::member(&db, None).await;
    let product = test_db::product(&db, dec!(100)).await;
    test_db::level(&db, product.id, 1, RewardType::Fixed, dec!(5)).await;

    let purchase = buy(&db, root.id, product.id).await;
    assert!(Engine::new(&db).compute(purchase).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_depth_bound() {
    let db = test_db::setup().await;
    let ids = line(&db, 8).await;
    let product = test_db::product(&db, dec!(100)).await;
    for level in 1..=7 {
      test_db::level(&db, product.id, level, RewardType::Fixed, dec!(1)).await;
    }
    Settings::new(&db)
      .update(ConfigPatch { unilevel_max_depth: Some(3), ..Default::default() })
      .await
      .unwrap();

    let purchase = buy(&db, ids[7], product.id).await;
    let rebates = Engine::new(&db).compute(purchase).await.unwrap();

    assert_eq!(rebates.len(), 3);
    assert!(rebates.iter().all(|r| r.level <= 3));
  }

  #[tokio::test]
  async fn test_depth_follows_structure_mode() {
    let db = test_db::setup().await;
    let ids = line(&db, 5).await;
    let product = test_db::product(&db, dec!(100)).await;
    for level in 1..=4 {
      test_db::level(&db, product.id, level, RewardType::Fixed, dec!(1)).await;
    }
    let config = Settings::new(&db)
      .update(ConfigPatch {
        structure: Some(Structure::Binary),
        binary_max_depth: Some(2),
        unilevel_max_depth: Some(10),
        ..Default::default()
      })
      .await
      .unwrap();

    let purchase = buy(&db, ids[4], product.id).await;
    let rebates = Engine::new(&db).compute_with(&config, purchase).await.unwrap();

    assert_eq!(rebates.len(), 2);
  }

  #[tokio::test]
  async fn test_contiguity_termination() {
    let db = test_db::setup().await;
    let ids = line(&db, 4).await;
    let product = test_db::product(&db, dec!(100)).await;
    test_db::level(&db, product.id, 1, RewardType::Fixed, dec!(5)).await;
    test_db::level(&db, product.id, 2, RewardType::Fixed, dec!(3)).await;

    let purchase = buy(&db, ids[3], product.id).await;
    let rebates = Engine::new(&db).compute(purchase).await.unwrap();

    let levels: Vec<i32> = rebates.iter().map(|r| r.level).collect();
    assert_eq!(levels, vec![1, 2]);
  }

  #[tokio::test]
  async fn test_gap_stops_walk() {
    let db = test_db::setup().await;
    let ids = line(&db, 4).await;
    let product = test_db::product(&db, dec!(100)).await;
    test_db::level(&db, product.id, 1, RewardType::Fixed, dec!(5)).await;
    test_db::level(&db, product.id, 3, RewardType::Fixed, dec!(3)).await;

    let purchase = buy(&db, ids[3], product.id).await;
    let rebates = Engine::new(&db).compute(purchase).await.unwrap();

    assert_eq!(rebates.len(), 1);
    assert_eq!(rebates[0].level, 1);
  }

  #[tokio::test]
  async fn test_rank_skip_continues_walk() {
    let db = test_db::setup().await;
    let top = test_db::ranked(&db, None, Rank::Gold).await;
    let mid = test_db::ranked(&db, Some(top.id), Rank::Starter).await;
    let near = test_db::ranked(&db, Some(mid.id), Rank::Gold).await;
    let buyer = test_db::member(&db, Some(near.id)).await;

    let catalog = Catalog::new(&db);
    let product = catalog.create_product("Pack", dec!(100), dec!(1)).await.unwrap();
    let gated = |level| LevelRule {
      level,
      reward: Reward::Fixed(dec!(4)),
      min_rank: Some(Rank::Silver),
    };
    catalog.set_levels(product.id, vec![gated(1), gated(2), gated(3)]).await.unwrap();

    let purchase = buy(&db, buyer.id, product.id).await;
    let rebates = Engine::new(&db).compute(purchase).await.unwrap();

    let paid: Vec<(i32, i32)> =
      rebates.iter().map(|r| (r.level, r.receiver_id)).collect();
    assert_eq!(paid, vec![(1, near.id), (3, top.id)]);
  }

  #[tokio::test]
  async fn test_quantity_is_summed_into_basis() {
    let db = test_db::setup().await;
    let ids = line(&db, 2).await;
    let product = test_db::product(&db, dec!(100)).await;
    test_db::level(&db, product.id, 1, RewardType::Percentage, dec!(10)).await;

    let purchase =
      Purchase::new(&db).record(ids[1], product.id, 3).await.unwrap();
    let rebates = Engine::new(&db).compute(purchase.id).await.unwrap();

    assert_eq!(rebates[0].amount, dec!(30));
  }

  #[tokio::test]
  async fn test_cycle_aborts_without_rows() {
    use crate::entity::member;

    let db = test_db::setup().await;
    let ids = line(&db, 3).await;
    let product = test_db::product(&db, dec!(100)).await;
    for level in 1..=5 {
      test_db::level(&db, product.id, level, RewardType::Fixed, dec!(1)).await;
    }
    let purchase = buy(&db, ids[2], product.id).await;

    let root = member::Entity::find_by_id(ids[0]).one(&db).await.unwrap().unwrap();
    member::ActiveModel { upline_id: Set(Some(ids[2])), ..root.into() }
      .update(&db)
      .await
      .unwrap();

    let result = Engine::new(&db).compute(purchase).await;
    assert!(matches!(result, Err(Error::CycleDetected(_))));
    assert!(Engine::new(&db).by_purchase(purchase).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_failed_insert_rolls_back_earlier_levels() {
    let db = test_db::setup().await;
    let ids = line(&db, 3).await;
    let product = test_db::product(&db, dec!(100)).await;
    test_db::level(&db, product.id, 1, RewardType::Fixed, dec!(5)).await;
    test_db::level(&db, product.id, 2, RewardType::Fixed, dec!(3)).await;
    let purchase = buy(&db, ids[2], product.id).await;

    db.execute_unprepared(
      "CREATE TRIGGER reject_level_two BEFORE INSERT ON rebates \
       WHEN NEW.level = 2 BEGIN SELECT RAISE(ABORT, 'level two rejected'); END",
    )
    .await
    .unwrap();

    let engine = Engine::new(&db);
    assert!(matches!(engine.compute(purchase).await, Err(Error::Db(_))));
    assert!(engine.by_purchase(purchase).await.unwrap().is_empty());

    db.execute_unprepared("DROP TRIGGER reject_level_two").await.unwrap();
    assert_eq!(engine.compute(purchase).await.unwrap().len(), 2);
  }
}
