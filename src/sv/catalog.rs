use crate::{
  entity::{commission_config, product},
  prelude::*,
  sv::commission::{LevelRule, validate_levels},
};

pub struct Catalog<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Catalog<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn create_product(
    &self,
    name: &str,
    price: Decimal,
    pv: Decimal,
  ) -> Result<product::Model> {
    if price < Decimal::ZERO || pv < Decimal::ZERO {
      return Err(Error::InvalidArgs("Price and PV must not be negative".into()));
    }

    let product = product::ActiveModel {
      id: NotSet,
      name: Set(name.to_string()),
      price: Set(price.into()),
      pv: Set(pv.into()),
      created_at: Set(Utc::now().naive_utc()),
    };

    Ok(product.insert(self.db).await?)
  }

  pub async fn product(&self, product_id: i32) -> Result<product::Model> {
    product::Entity::find_by_id(product_id)
      .one(self.db)
      .await?
      .ok_or(Error::ProductNotFound)
  }

  /// Replace all commission levels of a product.
  ///
  /// Levels must run 1..=N without holes; a gap is rejected here so the
  /// engine never has to guess whether a short chain was intended.
  pub async fn set_levels(
    &self,
    product_id: i32,
    rules: Vec<LevelRule>,
  ) -> Result<Vec<commission_config::Model>> {
    validate_levels(product_id, &rules)?;

    let txn = self.db.begin().await?;

    product::Entity::find_by_id(product_id)
      .one(&txn)
      .await?
      .ok_or(Error::ProductNotFound)?;

    commission_config::Entity::delete_many()
      .filter(commission_config::Column::ProductId.eq(product_id))
      .exec(&txn)
      .await?;

    let mut rows = Vec::with_capacity(rules.len());
    for rule in rules {
      let (reward_type, reward_value) = rule.reward.parts();
      let row = commission_config::ActiveModel {
        id: NotSet,
        product_id: Set(product_id),
        level: Set(rule.level),
        reward_type: Set(reward_type),
        reward_value: Set(reward_value.into()),
        min_rank: Set(rule.min_rank),
      }
      .insert(&txn)
      .await?;
      rows.push(row);
    }

    txn.commit().await?;

    rows.sort_by_key(|row| row.level);
    info!("Product {} now pays {} level(s)", product_id, rows.len());
    Ok(rows)
  }
}

#[cfg(test)]
mod tests {
  use rust_decimal_macros::dec;

  use super::*;
  use crate::{
    entity::{Rank, RewardType},
    sv::{commission::Reward, test_utils::test_db},
  };

  #[tokio::test]
  async fn test_set_levels_replaces() {
    let db = test_db::setup().await;
    let sv = Catalog::new(&db);
    let product = sv.create_product("Kit", dec!(100), dec!(20)).await.unwrap();

    sv.set_levels(
      product.id,
      vec![
        LevelRule { level: 1, reward: Reward::Fixed(dec!(5)), min_rank: None },
        LevelRule {
          level: 2,
          reward: Reward::Percentage(dec!(2.5)),
          min_rank: Some(Rank::Silver),
        },
      ],
    )
    .await
    .unwrap();

    let rows = sv
      .set_levels(
        product.id,
        vec![LevelRule {
          level: 1,
          reward: Reward::Percentage(dec!(10)),
          min_rank: None,
        }],
      )
      .await
      .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].reward_type, RewardType::Percentage);
    assert_eq!(rows[0].reward_value, dec!(10));
  }

  #[tokio::test]
  async fn test_set_levels_rejects_gap() {
    let db = test_db::setup().await;
    let sv = Catalog::new(&db);
    let product = sv.create_product("Kit", dec!(100), dec!(20)).await.unwrap();

    let result = sv
      .set_levels(
        product.id,
        vec![
          LevelRule { level: 1, reward: Reward::Fixed(dec!(5)), min_rank: None },
          LevelRule { level: 3, reward: Reward::Fixed(dec!(5)), min_rank: None },
        ],
      )
      .await;

    assert!(matches!(result, Err(Error::ConfigurationGap { missing: 2, .. })));
    let stored = commission_config::Entity::find().count(&db).await.unwrap();
    assert_eq!(stored, 0);
  }

  #[tokio::test]
  async fn test_unknown_product() {
    let db = test_db::setup().await;
    let result = Catalog::new(&db).set_levels(99, vec![]).await;
    assert!(matches!(result, Err(Error::ProductNotFound)));
  }
}
