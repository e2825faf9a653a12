use crate::{config::Config, prelude::*, sv};

pub struct AppState {
  pub db: DatabaseConnection,
  pub config: Config,
}

impl AppState {
  pub async fn new(config: Config) -> anyhow::Result<Self> {
    let db = Database::connect(&config.database_url).await?;
    Migrator::up(&db, None).await?;

    Ok(Self { db, config })
  }

  pub fn sv(&self) -> Services<'_> {
    Services::new(&self.db)
  }
}

pub struct Services<'a> {
  db: &'a DatabaseConnection,
  pub member: sv::Member<'a>,
  pub catalog: sv::Catalog<'a>,
  pub purchase: sv::Purchase<'a>,
  pub engine: sv::Engine<'a>,
  pub bonus: sv::Bonus<'a>,
  pub settings: sv::Settings<'a>,
  pub wallet: sv::Wallet<'a>,
}

impl<'a> Services<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self {
      db,
      member: sv::Member::new(db),
      catalog: sv::Catalog::new(db),
      purchase: sv::Purchase::new(db),
      engine: sv::Engine::new(db),
      bonus: sv::Bonus::new(db),
      settings: sv::Settings::new(db),
      wallet: sv::Wallet::new(db),
    }
  }

  /// Rebate processor crediting the built-in wallet ledger.
  pub fn processor(&self) -> sv::Processor<'_> {
    sv::Processor::new(self.db, &self.wallet)
  }
}
