//! Moves rebates through their lifecycle and credits the wallet ledger.
//!
//! Every row is claimed with a conditional update before the ledger is
//! touched, so concurrent processors never credit the same rebate twice.

use async_trait::async_trait;
use sea_orm::{Condition, DbErr, sea_query::Expr};
use serde::Serialize;

use crate::{
  entity::{RebateStatus, StatusEvent, rebate},
  prelude::*,
};

#[derive(Debug, thiserror::Error)]
pub enum CreditError {
  #[error("ledger unavailable: {0}")]
  Unavailable(String),
  #[error("ledger storage error: {0}")]
  Storage(#[from] DbErr),
  #[error("account {0} is missing or frozen")]
  InvalidAccount(i32),
  #[error("invalid credit amount {0}")]
  InvalidAmount(Decimal),
}

/// Wallet ledger the processor pays into.
#[async_trait]
pub trait Ledger: Send + Sync {
  /// Credit `amount` to `member_id` on behalf of rebate `rebate_id`.
  ///
  /// Must be idempotent per `rebate_id`: stalled claims are settled again.
  async fn credit(
    &self,
    member_id: i32,
    amount: Decimal,
    rebate_id: i32,
  ) -> Result<(), CreditError>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProcessSummary {
  pub processed: u64,
  pub failed: u64,
  /// Rows another processor claimed first.
  pub skipped: u64,
}

enum Outcome {
  Processed,
  Failed,
  Skipped,
}

pub struct Processor<'a> {
  db: &'a DatabaseConnection,
  ledger: &'a dyn Ledger,
}

impl<'a> Processor<'a> {
  pub fn new(db: &'a DatabaseConnection, ledger: &'a dyn Ledger) -> Self {
    Self { db, ledger }
  }

  /// Process pending rebates, oldest first, at most `batch_size` of them.
  ///
  /// Only `pending` rows are ever touched, so re-running after a crash or a
  /// duplicated cron trigger is safe.
  pub async fn process_pending(
    &self,
    batch_size: Option<u64>,
  ) -> Result<ProcessSummary> {
    let mut query = rebate::Entity::find()
      .filter(rebate::Column::Status.eq(RebateStatus::Pending))
      .order_by_asc(rebate::Column::Id);
    if let Some(limit) = batch_size {
      query = query.limit(limit);
    }

    let pending = query.all(self.db).await?;
    let mut summary = ProcessSummary::default();

    for row in pending {
      let id = row.id;
      match self.process_one(row).await {
        Ok(Outcome::Processed) => summary.processed += 1,
        Ok(Outcome::Failed) => summary.failed += 1,
        Ok(Outcome::Skipped) => summary.skipped += 1,
        Err(err) => {
          error!("Rebate {} left unfinished: {}", id, err);
          summary.skipped += 1;
        }
      }
    }

    if summary != ProcessSummary::default() {
      info!(
        "Rebate batch done: {} processed, {} failed, {} skipped",
        summary.processed, summary.failed, summary.skipped
      );
    }

    Ok(summary)
  }

  async fn process_one(&self, row: rebate::Model) -> Result<Outcome> {
    if !self.advance(row.id, RebateStatus::Pending, StatusEvent::Claim, None).await? {
      debug!("Rebate {} claimed elsewhere", row.id);
      return Ok(Outcome::Skipped);
    }
    self.settle(&row).await
  }

  /// Finish rebates stuck in `processing` whose claim is older than
  /// `stale_after`, e.g. after a crash between claim and credit.
  ///
  /// The ledger may already hold the credit, so this relies on
  /// [`Ledger::credit`] being idempotent per rebate.
  pub async fn recover_stalled(
    &self,
    stale_after: Duration,
  ) -> Result<ProcessSummary> {
    let stale_after = chrono::Duration::from_std(stale_after)
      .map_err(|err| Error::InvalidArgs(format!("claim timeout: {err}")))?;
    let cutoff = Utc::now().naive_utc() - stale_after;

    let stalled = rebate::Entity::find()
      .filter(rebate::Column::Status.eq(RebateStatus::Processing))
      .filter(
        Condition::any()
          .add(rebate::Column::ClaimedAt.is_null())
          .add(rebate::Column::ClaimedAt.lt(cutoff)),
      )
      .order_by_asc(rebate::Column::Id)
      .all(self.db)
      .await?;

    let mut summary = ProcessSummary::default();
    for row in stalled {
      let id = row.id;
      let outcome = match self.reclaim(&row).await {
        Ok(true) => self.settle(&row).await,
        Ok(false) => Ok(Outcome::Skipped),
        Err(err) => Err(err),
      };
      match outcome {
        Ok(Outcome::Processed) => summary.processed += 1,
        Ok(Outcome::Failed) => summary.failed += 1,
        Ok(Outcome::Skipped) => summary.skipped += 1,
        Err(err) => {
          error!("Stalled rebate {} left unfinished: {}", id, err);
          summary.skipped += 1;
        }
      }
    }

    if summary != ProcessSummary::default() {
      warn!(
        "Recovered stalled rebates: {} processed, {} failed, {} skipped",
        summary.processed, summary.failed, summary.skipped
      );
    }

    Ok(summary)
  }

  /// Take over a stalled claim by swapping its stamp. Fails if another
  /// processor recovered or settled the row in the meantime.
  async fn reclaim(&self, row: &rebate::Model) -> Result<bool> {
    let mut update = rebate::Entity::update_many()
      .col_expr(rebate::Column::ClaimedAt, Expr::value(Utc::now().naive_utc()))
      .filter(rebate::Column::Id.eq(row.id))
      .filter(rebate::Column::Status.eq(RebateStatus::Processing));
    update = match row.claimed_at {
      Some(at) => update.filter(rebate::Column::ClaimedAt.eq(at)),
      None => update.filter(rebate::Column::ClaimedAt.is_null()),
    };
    Ok(update.exec(self.db).await?.rows_affected == 1)
  }

  /// Credit a claimed row and record the result.
  async fn settle(&self, row: &rebate::Model) -> Result<Outcome> {
    match self.ledger.credit(row.receiver_id, row.amount.0, row.id).await {
      Ok(()) => {
        self
          .advance(row.id, RebateStatus::Processing, StatusEvent::Credited, None)
          .await?;
        debug!(
          "Rebate {} credited {} to member {}",
          row.id, row.amount, row.receiver_id
        );
        Ok(Outcome::Processed)
      }
      Err(err) => {
        warn!("Rebate {} credit failed: {}", row.id, err);
        self
          .advance(
            row.id,
            RebateStatus::Processing,
            StatusEvent::CreditFailed,
            Some(err.to_string()),
          )
          .await?;
        Ok(Outcome::Failed)
      }
    }
  }

  /// Apply `event` to rebate `id` if it is still in `from`.
  /// Returns whether this call performed the transition.
  async fn advance(
    &self,
    id: i32,
    from: RebateStatus,
    event: StatusEvent,
    reason: Option<String>,
  ) -> Result<bool> {
    let to = from
      .transition(event)
      .ok_or(Error::InvalidTransition { from, event })?;

    let now = Utc::now().naive_utc();
    let mut update = rebate::Entity::update_many()
      .col_expr(rebate::Column::Status, Expr::value(to))
      .filter(rebate::Column::Id.eq(id))
      .filter(rebate::Column::Status.eq(from));

    match to {
      RebateStatus::Processing => {
        update = update.col_expr(rebate::Column::ClaimedAt, Expr::value(now));
      }
      RebateStatus::Processed => {
        update = update.col_expr(rebate::Column::ProcessedAt, Expr::value(now));
      }
      _ => {}
    }
    if let Some(reason) = reason {
      update = update.col_expr(rebate::Column::FailureReason, Expr::value(reason));
    }

    Ok(update.exec(self.db).await?.rows_affected == 1)
  }

  /// Retry a failed rebate as a fresh pending row. The failed row stays as
  /// it is for the audit trail.
  pub async fn requeue(&self, failed_id: i32) -> Result<rebate::Model> {
    let txn = self.db.begin().await?;

    let failed = rebate::Entity::find_by_id(failed_id)
      .one(&txn)
      .await?
      .ok_or(Error::RebateNotFound)?;

    if failed.status != RebateStatus::Failed {
      return Err(Error::InvalidArgs(format!(
        "Rebate {} is {}, only failed rebates can be requeued",
        failed_id, failed.status
      )));
    }

    let already = rebate::Entity::find()
      .filter(rebate::Column::RequeuedFrom.eq(failed_id))
      .one(&txn)
      .await?;
    if already.is_some() {
      return Err(Error::AlreadyRequeued(failed_id));
    }

    let fresh = rebate::ActiveModel {
      id: NotSet,
      kind: Set(failed.kind),
      purchase_id: Set(failed.purchase_id),
      generator_id: Set(failed.generator_id),
      receiver_id: Set(failed.receiver_id),
      level: Set(failed.level),
      amount: Set(failed.amount),
      reward_type: Set(failed.reward_type),
      reward_value: Set(failed.reward_value),
      status: Set(RebateStatus::Pending),
      failure_reason: Set(None),
      attempt: Set(failed.attempt + 1),
      requeued_from: Set(Some(failed.id)),
      bonus_period: Set(failed.bonus_period),
      created_at: Set(Utc::now().naive_utc()),
      claimed_at: Set(None),
      processed_at: Set(None),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!("Rebate {} requeued as {}", failed_id, fresh.id);
    Ok(fresh)
  }
}
