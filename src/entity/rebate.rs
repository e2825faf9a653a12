use std::fmt;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{commission_config::RewardType, member, money::Money, purchase};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum RebateKind {
  /// Per-level commission produced by a purchase.
  #[sea_orm(string_value = "level")]
  Level,
  /// Monthly performance bonus, always level 0.
  #[sea_orm(string_value = "bonus")]
  Bonus,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum RebateStatus {
  #[sea_orm(string_value = "pending")]
  #[default]
  Pending,
  /// Claimed by a processor, wallet credit in flight.
  #[sea_orm(string_value = "processing")]
  Processing,
  #[sea_orm(string_value = "processed")]
  Processed,
  #[sea_orm(string_value = "failed")]
  Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
  Claim,
  Credited,
  CreditFailed,
}

impl RebateStatus {
  /// Returns the next status, or `None` if `event` is illegal in `self`.
  ///
  /// `Processed` and `Failed` are terminal: a failed rebate is retried by
  /// creating a new pending row, never by moving this one back.
  pub fn transition(self, event: StatusEvent) -> Option<RebateStatus> {
    use RebateStatus::*;
    use StatusEvent::*;

    match (self, event) {
      (Pending, Claim) => Some(Processing),
      (Processing, Credited) => Some(Processed),
      (Processing, CreditFailed) => Some(Failed),
      _ => None,
    }
  }
}

impl fmt::Display for RebateStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      RebateStatus::Pending => "pending",
      RebateStatus::Processing => "processing",
      RebateStatus::Processed => "processed",
      RebateStatus::Failed => "failed",
    };
    f.write_str(s)
  }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rebates")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub kind: RebateKind,
  pub purchase_id: Option<i32>,
  pub generator_id: i32,
  pub receiver_id: i32,
  pub level: i32,
  pub amount: Money,
  pub reward_type: RewardType,
  pub reward_value: Money,
  pub status: RebateStatus,
  pub failure_reason: Option<String>,
  pub attempt: i32,
  pub requeued_from: Option<i32>,
  pub bonus_period: Option<Date>,
  pub created_at: DateTime,
  /// Set when a processor claims the row; a stale stamp marks a stalled claim.
  pub claimed_at: Option<DateTime>,
  pub processed_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "purchase::Entity",
    from = "Column::PurchaseId",
    to = "purchase::Column::Id"
  )]
  Purchase,
  #[sea_orm(
    belongs_to = "member::Entity",
    from = "Column::ReceiverId",
    to = "member::Column::Id"
  )]
  Receiver,
}

impl Related<purchase::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Purchase.def()
  }
}

impl Related<member::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Receiver.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
