use crate::{
  entity::{PvMode, member, product, purchase},
  prelude::*,
  sv::Settings,
};

pub struct Purchase<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Purchase<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Record a completed purchase. The total is the whole basis for rebates:
  /// quantity is folded in here, never applied per unit later.
  pub async fn record(
    &self,
    buyer_id: i32,
    product_id: i32,
    quantity: i32,
  ) -> Result<purchase::Model> {
    if quantity <= 0 {
      return Err(Error::InvalidArgs("Quantity must be positive".into()));
    }

    let config = Settings::new(self.db).get().await?;

    member::Entity::find_by_id(buyer_id)
      .one(self.db)
      .await?
      .ok_or(Error::MemberNotFound)?;
    let product = product::Entity::find_by_id(product_id)
      .one(self.db)
      .await?
      .ok_or(Error::ProductNotFound)?;

    let units = Decimal::from(quantity);
    let pv_total = match config.pv_mode {
      PvMode::PerUnit => product.pv.0 * units,
      PvMode::PerOrder => product.pv.0,
    };

    let purchase = purchase::ActiveModel {
      id: NotSet,
      buyer_id: Set(buyer_id),
      product_id: Set(product_id),
      quantity: Set(quantity),
      total_amount: Set((product.price.0 * units).into()),
      pv_total: Set(pv_total.into()),
      created_at: Set(Utc::now().naive_utc()),
    }
    .insert(self.db)
    .await?;

    info!(
      "Purchase {} recorded: member {} bought {}x product {} for {}",
      purchase.id, buyer_id, quantity, product_id, purchase.total_amount
    );
    Ok(purchase)
  }

  pub async fn by_id(&self, purchase_id: i32) -> Result<purchase::Model> {
    purchase::Entity::find_by_id(purchase_id)
      .one(self.db)
      .await?
      .ok_or(Error::PurchaseNotFound)
  }

  /// Purchases made in `[from, until)`, oldest first.
  pub async fn between(
    &self,
    from: DateTime,
    until: DateTime,
  ) -> Result<Vec<purchase::Model>> {
    Ok(
      purchase::Entity::find()
        .filter(purchase::Column::CreatedAt.gte(from))
        .filter(purchase::Column::CreatedAt.lt(until))
        .order_by_asc(purchase::Column::CreatedAt)
        .all(self.db)
        .await?,
    )
  }
}
