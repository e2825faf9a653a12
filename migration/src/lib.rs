pub use sea_orm_migration::prelude::*;

mod m20261001_000001_create_members;
mod m20261001_000002_create_products;
mod m20261001_000003_create_purchases;
mod m20261001_000004_create_rebates;
mod m20261001_000005_create_bonus_tiers;
mod m20261001_000006_create_mlm_configuration;
mod m20261001_000007_create_wallet_transactions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
      Box::new(m20261001_000001_create_members::Migration),
      Box::new(m20261001_000002_create_products::Migration),
      Box::new(m20261001_000003_create_purchases::Migration),
      Box::new(m20261001_000004_create_rebates::Migration),
      Box::new(m20261001_000005_create_bonus_tiers::Migration),
      Box::new(m20261001_000006_create_mlm_configuration::Migration),
      Box::new(m20261001_000007_create_wallet_transactions::Migration),
    ]
  }
}
