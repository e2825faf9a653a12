use axum::{
  Json,
  extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::{
  entity::{
    Rank, Slot, bonus_tier, commission_config, member, mlm_configuration,
    product, purchase, rebate, wallet_transaction,
  },
  prelude::*,
  state::AppState,
  sv::{
    Tree,
    commission::{Commission, LevelRule, Reward},
    processor::ProcessSummary,
    settings::ConfigPatch,
    tree::Child,
  },
};

type App = State<Arc<AppState>>;

#[derive(Serialize)]
pub struct Health {
  status: &'static str,
  version: &'static str,
}

pub async fn health() -> Json<Health> {
  Json(Health { status: "ok", version: env!("CARGO_PKG_VERSION") })
}

#[derive(Deserialize)]
pub struct RegisterReq {
  pub upline_id: Option<i32>,
  pub slot: Option<Slot>,
}

pub async fn register_member(
  State(app): App,
  Json(req): Json<RegisterReq>,
) -> Result<Json<member::Model>> {
  let member = app.sv().member.register(req.upline_id, req.slot).await?;
  Ok(Json(member))
}

pub async fn upline(
  State(app): App,
  Path(member_id): Path<i32>,
) -> Result<Json<Vec<member::Model>>> {
  let config = app.sv().settings.get().await?;
  let chain = Tree::new(&app.db, config.structure)
    .upline_chain(member_id, config.max_depth())
    .await?;
  Ok(Json(chain))
}

pub async fn children(
  State(app): App,
  Path(member_id): Path<i32>,
) -> Result<Json<Vec<Child>>> {
  let sv = app.sv();
  sv.member.by_id(member_id).await?.ok_or(Error::MemberNotFound)?;

  let config = sv.settings.get().await?;
  let children =
    Tree::new(&app.db, config.structure).direct_children(member_id).await?;
  Ok(Json(children))
}

#[derive(Serialize)]
pub struct MemberStats {
  count: u64,
}

pub async fn member_stats(State(app): App) -> Result<Json<MemberStats>> {
  Ok(Json(MemberStats { count: app.sv().member.count().await? }))
}

#[derive(Deserialize)]
pub struct RankReq {
  pub rank: Rank,
}

pub async fn set_rank(
  State(app): App,
  Path(member_id): Path<i32>,
  Json(req): Json<RankReq>,
) -> Result<Json<member::Model>> {
  let sv = app.sv();
  sv.member.set_rank(member_id, req.rank).await?;
  Ok(Json(sv.member.by_id(member_id).await?.ok_or(Error::MemberNotFound)?))
}

#[derive(Deserialize)]
pub struct ActiveReq {
  pub active: bool,
}

pub async fn set_active(
  State(app): App,
  Path(member_id): Path<i32>,
  Json(req): Json<ActiveReq>,
) -> Result<Json<member::Model>> {
  let sv = app.sv();
  sv.member.set_active(member_id, req.active).await?;
  Ok(Json(sv.member.by_id(member_id).await?.ok_or(Error::MemberNotFound)?))
}

#[derive(Serialize)]
pub struct WalletView {
  balance: Decimal,
  transactions: Vec<wallet_transaction::Model>,
}

pub async fn wallet(
  State(app): App,
  Path(member_id): Path<i32>,
) -> Result<Json<WalletView>> {
  let sv = app.sv();
  let balance = sv.wallet.balance(member_id).await?;
  let transactions = sv.wallet.transactions(member_id, 50).await?;
  Ok(Json(WalletView { balance, transactions }))
}

#[derive(Deserialize)]
pub struct ProductReq {
  pub name: String,
  pub price: Decimal,
  pub pv: Decimal,
}

pub async fn create_product(
  State(app): App,
  Json(req): Json<ProductReq>,
) -> Result<Json<product::Model>> {
  let product =
    app.sv().catalog.create_product(&req.name, req.price, req.pv).await?;
  Ok(Json(product))
}

pub async fn set_commission(
  State(app): App,
  Path(product_id): Path<i32>,
  Json(rules): Json<Vec<LevelRule>>,
) -> Result<Json<Vec<commission_config::Model>>> {
  Ok(Json(app.sv().catalog.set_levels(product_id, rules).await?))
}

pub async fn commission(
  State(app): App,
  Path(product_id): Path<i32>,
) -> Result<Json<Vec<LevelRule>>> {
  app.sv().catalog.product(product_id).await?;
  let table = Commission::new(&app.db).table(product_id).await?;
  Ok(Json(table.rules().cloned().collect()))
}

pub async fn commission_level(
  State(app): App,
  Path((product_id, level)): Path<(i32, i32)>,
) -> Result<Json<Option<LevelRule>>> {
  app.sv().catalog.product(product_id).await?;
  Ok(Json(Commission::new(&app.db).resolve(product_id, level).await?))
}

#[derive(Deserialize)]
pub struct PurchaseReq {
  pub buyer_id: i32,
  pub product_id: i32,
  #[serde(default = "one")]
  pub quantity: i32,
}

fn one() -> i32 {
  1
}

#[derive(Serialize)]
pub struct PurchaseView {
  purchase: purchase::Model,
  rebates: Vec<rebate::Model>,
}

/// Record a completed purchase and emit its pending rebates.
pub async fn record_purchase(
  State(app): App,
  Json(req): Json<PurchaseReq>,
) -> Result<Json<PurchaseView>> {
  let sv = app.sv();
  let purchase =
    sv.purchase.record(req.buyer_id, req.product_id, req.quantity).await?;
  let rebates = sv.engine.compute(purchase.id).await?;
  Ok(Json(PurchaseView { purchase, rebates }))
}

/// Re-run the computation; only rebates missing so far are created.
pub async fn compute_rebates(
  State(app): App,
  Path(purchase_id): Path<i32>,
) -> Result<Json<Vec<rebate::Model>>> {
  Ok(Json(app.sv().engine.compute(purchase_id).await?))
}

pub async fn purchase_rebates(
  State(app): App,
  Path(purchase_id): Path<i32>,
) -> Result<Json<Vec<rebate::Model>>> {
  let sv = app.sv();
  sv.purchase.by_id(purchase_id).await?;
  Ok(Json(sv.engine.by_purchase(purchase_id).await?))
}

#[derive(Default, Deserialize)]
pub struct ProcessReq {
  pub batch_size: Option<u64>,
}

pub async fn process_rebates(
  State(app): App,
  body: Option<Json<ProcessReq>>,
) -> Result<Json<ProcessSummary>> {
  let Json(req) = body.unwrap_or_default();
  let batch_size = req.batch_size.unwrap_or(app.config.payout_batch_size);
  Ok(Json(app.sv().processor().process_pending(Some(batch_size)).await?))
}

#[derive(Default, Deserialize)]
pub struct RecoverReq {
  /// Claim age in seconds; defaults to the configured claim timeout.
  pub stale_after_secs: Option<u64>,
}

pub async fn recover_rebates(
  State(app): App,
  body: Option<Json<RecoverReq>>,
) -> Result<Json<ProcessSummary>> {
  let Json(req) = body.unwrap_or_default();
  let stale_after = req
    .stale_after_secs
    .map(Duration::from_secs)
    .unwrap_or(app.config.claim_timeout);
  Ok(Json(app.sv().processor().recover_stalled(stale_after).await?))
}

pub async fn requeue_rebate(
  State(app): App,
  Path(rebate_id): Path<i32>,
) -> Result<Json<rebate::Model>> {
  Ok(Json(app.sv().processor().requeue(rebate_id).await?))
}

pub async fn tiers(State(app): App) -> Result<Json<Vec<bonus_tier::Model>>> {
  Ok(Json(app.sv().bonus.tiers().await?))
}

#[derive(Deserialize)]
pub struct TierReq {
  pub min_sales: Decimal,
  pub max_sales: Option<Decimal>,
  pub reward: Reward,
}

pub async fn add_tier(
  State(app): App,
  Json(req): Json<TierReq>,
) -> Result<Json<bonus_tier::Model>> {
  let tier =
    app.sv().bonus.add_tier(req.min_sales, req.max_sales, req.reward).await?;
  Ok(Json(tier))
}

pub async fn set_tier_active(
  State(app): App,
  Path(tier_id): Path<i32>,
  Json(req): Json<ActiveReq>,
) -> Result<Json<Vec<bonus_tier::Model>>> {
  let sv = app.sv();
  sv.bonus.set_tier_active(tier_id, req.active).await?;
  Ok(Json(sv.bonus.tiers().await?))
}

#[derive(Deserialize)]
pub struct EvaluateReq {
  pub cutoff: NaiveDate,
}

pub async fn evaluate_bonuses(
  State(app): App,
  Json(req): Json<EvaluateReq>,
) -> Result<Json<Vec<rebate::Model>>> {
  Ok(Json(app.sv().bonus.evaluate(req.cutoff).await?))
}

pub async fn config(State(app): App) -> Result<Json<mlm_configuration::Model>> {
  Ok(Json(app.sv().settings.get().await?))
}

pub async fn update_config(
  State(app): App,
  Json(patch): Json<ConfigPatch>,
) -> Result<Json<mlm_configuration::Model>> {
  Ok(Json(app.sv().settings.update(patch).await?))
}
