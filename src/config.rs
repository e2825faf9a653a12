use std::env;

use anyhow::Context;

use crate::prelude::*;

/// Process settings read from the environment at startup.
///
/// Business rules live in the `mlm_configuration` table instead, so an admin
/// can change them without a restart.
#[derive(Debug, Clone)]
pub struct Config {
  pub database_url: String,
  pub port: u16,
  /// HMAC key for `X-Signature` on `/api` requests.
  pub server_secret: String,
  /// Zero disables the scheduled payout run.
  pub payout_interval: Duration,
  pub payout_batch_size: u64,
  /// Age after which a `processing` rebate counts as abandoned.
  pub claim_timeout: Duration,
  pub bonus_schedule: bool,
}

impl Config {
  pub fn from_env() -> anyhow::Result<Self> {
    let database_url = env::var("DATABASE_URL")
      .unwrap_or_else(|_| "sqlite:rebates.db?mode=rwc".into());
    let server_secret =
      env::var("SERVER_SECRET").context("SERVER_SECRET not set")?;

    let port = env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(3000);

    let payout_interval = match env::var("PAYOUT_INTERVAL") {
      Ok(raw) => humantime::parse_duration(&raw)
        .with_context(|| format!("Invalid PAYOUT_INTERVAL '{raw}'"))?,
      Err(_) => Duration::from_secs(15 * 60),
    };

    let payout_batch_size = env::var("PAYOUT_BATCH_SIZE")
      .ok()
      .and_then(|s| s.parse().ok())
      .unwrap_or(500);

    let claim_timeout = match env::var("CLAIM_TIMEOUT") {
      Ok(raw) => humantime::parse_duration(&raw)
        .with_context(|| format!("Invalid CLAIM_TIMEOUT '{raw}'"))?,
      Err(_) => Duration::from_secs(10 * 60),
    };

    let bonus_schedule = env::var("BONUS_SCHEDULE")
      .map(|s| !matches!(s.trim(), "0" | "false" | "off"))
      .unwrap_or(true);

    Ok(Self {
      database_url,
      port,
      server_secret,
      payout_interval,
      payout_batch_size,
      claim_timeout,
      bonus_schedule,
    })
  }
}
