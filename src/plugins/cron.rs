use anyhow::Context;
use async_trait::async_trait;

use crate::{plugins::Plugin, prelude::*, state::AppState, sv::bonus};

/// Periodic run of the rebate processor over pending rows.
pub struct Payout;

#[async_trait]
impl Plugin for Payout {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let every = app.config.payout_interval;
    if every.is_zero() {
      info!("Scheduled payouts disabled via config (0 interval)");
      return Ok(());
    }

    info!(
      "Payout service started (interval: {}, batch: {})",
      humantime::format_duration(every),
      app.config.payout_batch_size
    );

    tokio::spawn(async move {
      let mut interval = tokio::time::interval(every);
      loop {
        interval.tick().await;

        let sv = app.sv();
        let processor = sv.processor();
        if let Err(err) = processor.recover_stalled(app.config.claim_timeout).await {
          error!("Stalled rebate recovery failed: {}", err);
        }

        let batch = Some(app.config.payout_batch_size);
        match processor.process_pending(batch).await {
          Ok(summary) if summary.processed + summary.failed > 0 => {
            info!(
              "Payout run: {} processed, {} failed, {} skipped",
              summary.processed, summary.failed, summary.skipped
            );
          }
          Ok(_) => debug!("Payout run: nothing pending"),
          Err(err) => error!("Payout run failed: {}", err),
        }
      }
    });

    Ok(())
  }
}

/// Evaluates performance bonuses the day after each monthly cutoff.
pub struct MonthlyBonus;

#[async_trait]
impl Plugin for MonthlyBonus {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    if !app.config.bonus_schedule {
      info!("Scheduled bonus evaluation disabled via config");
      return Ok(());
    }

    tokio::spawn(async move {
      if let Err(err) = catch_up(&app).await {
        error!("Bonus catch-up failed: {}", err);
      }
      loop {
        if let Err(err) = evaluate_next(&app).await {
          error!("Monthly bonus run failed: {}", err);
          tokio::time::sleep(Duration::from_secs(3600)).await;
        }
      }
    });

    Ok(())
  }
}

/// Evaluate the most recent past cutoff, in case the process was down when
/// it came due. Cutoffs already evaluated emit nothing.
async fn catch_up(app: &AppState) -> anyhow::Result<()> {
  let config = app.sv().settings.get().await?;
  let today = Utc::now().date_naive();
  let cutoff = bonus::previous_cutoff(today, config.cutoff_day as u32)
    .context("No previous cutoff date")?;

  let bonuses = app.sv().bonus.evaluate_with(&config, cutoff).await?;
  if !bonuses.is_empty() {
    warn!("Caught up {} bonus rebate(s) for cutoff {}", bonuses.len(), cutoff);
  }
  Ok(())
}

/// Sleep until the next cutoff has fully passed, then evaluate it.
async fn evaluate_next(app: &AppState) -> anyhow::Result<()> {
  let config = app.sv().settings.get().await?;
  let now = Utc::now().naive_utc();

  let cutoff = bonus::next_cutoff(now.date(), config.cutoff_day as u32)
    .context("No upcoming cutoff date")?;
  let due = cutoff
    .succ_opt()
    .and_then(|day| day.and_hms_opt(0, 0, 0))
    .context("Cutoff date overflow")?;

  let sleep = (due - now).to_std().unwrap_or(Duration::ZERO);
  info!(
    "Next bonus evaluation for cutoff {} in {} hours",
    cutoff,
    sleep.as_secs() / 3600
  );
  tokio::time::sleep(sleep).await;

  // Settings may have changed while sleeping.
  let config = app.sv().settings.get().await?;
  let bonuses = app.sv().bonus.evaluate_with(&config, cutoff).await?;
  info!("Emitted {} bonus rebate(s) for cutoff {}", bonuses.len(), cutoff);

  Ok(())
}
