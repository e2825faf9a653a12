use sea_orm::DbErr;

use crate::entity::{RebateStatus, StatusEvent};

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("database error: {0}")]
  Db(#[from] DbErr),

  #[error("member not found")]
  MemberNotFound,
  #[error("product not found")]
  ProductNotFound,
  #[error("purchase not found")]
  PurchaseNotFound,
  #[error("rebate not found")]
  RebateNotFound,
  #[error("bonus tier not found")]
  TierNotFound,

  /// The upline walk revisited a member. Data corruption, never retried.
  #[error("cycle detected in upline chain at member {0}")]
  CycleDetected(i32),
  #[error("commission levels of product {product} skip level {missing}")]
  ConfigurationGap { product: i32, missing: i32 },
  #[error("illegal rebate transition: {from} on {event:?}")]
  InvalidTransition { from: RebateStatus, event: StatusEvent },
  #[error("rebate {0} was already requeued")]
  AlreadyRequeued(i32),
  #[error("member {0} has no free binary slot")]
  UplineFull(i32),
  #[error("slot already taken under member {0}")]
  SlotTaken(i32),

  #[error("invalid arguments: {0}")]
  InvalidArgs(String),
  #[error("unauthorized")]
  Unauthorized,
  #[error("internal error: {0}")]
  Internal(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl axum::response::IntoResponse for Error {
  fn into_response(self) -> axum::response::Response {
    use axum::http::StatusCode;

    let status = match &self {
      Error::MemberNotFound
      | Error::ProductNotFound
      | Error::PurchaseNotFound
      | Error::RebateNotFound
      | Error::TierNotFound => StatusCode::NOT_FOUND,
      Error::InvalidArgs(_) | Error::ConfigurationGap { .. } => {
        StatusCode::BAD_REQUEST
      }
      Error::InvalidTransition { .. }
      | Error::AlreadyRequeued(_)
      | Error::UplineFull(_)
      | Error::SlotTaken(_) => StatusCode::CONFLICT,
      Error::Unauthorized => StatusCode::UNAUTHORIZED,
      Error::CycleDetected(_) => StatusCode::UNPROCESSABLE_ENTITY,
      Error::Db(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
      tracing::error!("Request failed: {self}");
      "internal server error".to_string()
    } else {
      self.to_string()
    };

    (status, axum::Json(json::json!({ "error": message }))).into_response()
  }
}
