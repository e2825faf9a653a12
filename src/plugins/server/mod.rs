mod auth;
mod handlers;

use std::net::SocketAddr;

use anyhow::Context;
use async_trait::async_trait;
use axum::{
  Router, middleware,
  routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

use crate::{prelude::*, state::AppState};

pub struct Plugin;

fn api(app: Arc<AppState>) -> Router<Arc<AppState>> {
  Router::new()
    .route(
      "/members",
      get(handlers::member_stats).post(handlers::register_member),
    )
    .route("/members/{id}/upline", get(handlers::upline))
    .route("/members/{id}/children", get(handlers::children))
    .route("/members/{id}/rank", put(handlers::set_rank))
    .route("/members/{id}/active", put(handlers::set_active))
    .route("/members/{id}/wallet", get(handlers::wallet))
    .route("/products", post(handlers::create_product))
    .route(
      "/products/{id}/commission",
      get(handlers::commission).put(handlers::set_commission),
    )
    .route(
      "/products/{id}/commission/{level}",
      get(handlers::commission_level),
    )
    .route("/purchases", post(handlers::record_purchase))
    .route(
      "/purchases/{id}/rebates",
      get(handlers::purchase_rebates).post(handlers::compute_rebates),
    )
    .route("/rebates/process", post(handlers::process_rebates))
    .route("/rebates/recover", post(handlers::recover_rebates))
    .route("/rebates/{id}/requeue", post(handlers::requeue_rebate))
    .route("/bonuses/tiers", get(handlers::tiers).post(handlers::add_tier))
    .route("/bonuses/tiers/{id}/active", put(handlers::set_tier_active))
    .route("/bonuses/evaluate", post(handlers::evaluate_bonuses))
    .route("/config", get(handlers::config).put(handlers::update_config))
    .layer(middleware::from_fn_with_state(app, auth::require_signature))
}

#[async_trait]
impl super::Plugin for Plugin {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let governor_conf = Arc::new(
      GovernorConfigBuilder::default()
        .per_second(2)
        .burst_size(100)
        .finish()
        .context("Failed to build rate limiter config")?,
    );

    let governor_limiter = governor_conf.limiter().clone();

    tokio::spawn(async move {
      loop {
        tokio::time::sleep(Duration::from_secs(60)).await;
        governor_limiter.retain_recent();
      }
    });

    let router = Router::new()
      .route("/health", get(handlers::health))
      .nest("/api", api(app.clone()))
      .layer(
        ServiceBuilder::new()
          .layer(TraceLayer::new_for_http())
          .layer(GovernorLayer::new(governor_conf))
          .layer(
            CorsLayer::new()
              .allow_origin(Any)
              .allow_methods(Any)
              .allow_headers(Any),
          ),
      )
      .with_state(app.clone())
      .into_make_service_with_connect_info::<SocketAddr>();

    let addr = SocketAddr::from(([0, 0, 0, 0], app.config.port));
    let listener = tokio::net::TcpListener::bind(addr)
      .await
      .with_context(|| format!("Failed to bind {addr}"))?;

    info!("HTTP server listening on {addr}");

    tokio::spawn(async move {
      if let Err(err) = axum::serve(listener, router).await {
        error!("HTTP server stopped: {err}");
      }
    });

    Ok(())
  }
}
