pub mod bonus_tier;
pub mod commission_config;
pub mod member;
pub mod mlm_configuration;
pub mod money;
pub mod product;
pub mod purchase;
pub mod rebate;
pub mod wallet_transaction;

pub use commission_config::RewardType;
pub use member::{Rank, Slot};
pub use mlm_configuration::{PvMode, Structure};
pub use money::Money;
pub use rebate::{RebateKind, RebateStatus, StatusEvent};
pub use wallet_transaction::TransactionType;
