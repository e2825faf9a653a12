//! Shared test utilities for database setup

#[cfg(test)]
pub mod test_db {
  use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, NotSet, Set};

  use crate::{
    entity::{Money, Rank, RewardType, Slot, commission_config, member, product},
    prelude::{Decimal, MigratorTrait, Utc},
  };

  /// Creates an in-memory SQLite database migrated to the latest schema
  pub async fn setup() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    db
  }

  pub async fn member(
    db: &DatabaseConnection,
    upline_id: Option<i32>,
  ) -> member::Model {
    insert_member(db, upline_id, None, Rank::Starter).await
  }

  pub async fn ranked(
    db: &DatabaseConnection,
    upline_id: Option<i32>,
    rank: Rank,
  ) -> member::Model {
    insert_member(db, upline_id, None, rank).await
  }

  pub async fn slotted(
    db: &DatabaseConnection,
    upline_id: i32,
    slot: Slot,
  ) -> member::Model {
    insert_member(db, Some(upline_id), Some(slot), Rank::Starter).await
  }

  async fn insert_member(
    db: &DatabaseConnection,
    upline_id: Option<i32>,
    slot: Option<Slot>,
    rank: Rank,
  ) -> member::Model {
    member::ActiveModel {
      id: NotSet,
      upline_id: Set(upline_id),
      rank: Set(rank),
      slot: Set(slot),
      is_active: Set(true),
      balance: Set(Money::ZERO),
      created_at: Set(Utc::now().naive_utc()),
    }
    .insert(db)
    .await
    .unwrap()
  }

  pub async fn product(db: &DatabaseConnection, price: Decimal) -> product::Model {
    product::ActiveModel {
      id: NotSet,
      name: Set("Test product".into()),
      price: Set(price.into()),
      pv: Set(Decimal::from(10).into()),
      created_at: Set(Utc::now().naive_utc()),
    }
    .insert(db)
    .await
    .unwrap()
  }

  /// Inserts a raw commission row, bypassing level validation.
  pub async fn level(
    db: &DatabaseConnection,
    product_id: i32,
    level: i32,
    reward_type: RewardType,
    reward_value: Decimal,
  ) -> commission_config::Model {
    commission_config::ActiveModel {
      id: NotSet,
      product_id: Set(product_id),
      level: Set(level),
      reward_type: Set(reward_type),
      reward_value: Set(reward_value.into()),
      min_rank: Set(None),
    }
    .insert(db)
    .await
    .unwrap()
  }
}
