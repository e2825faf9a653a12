use async_trait::async_trait;

use crate::{
  entity::{TransactionType, member, wallet_transaction},
  prelude::*,
  sv::processor::{CreditError, Ledger},
};

/// Wallet ledger backed by the members table.
///
/// Every credit writes an audit row keyed by the rebate id, so a rebate can
/// never be credited twice even if the processor retries.
pub struct Wallet<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Wallet<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn balance(&self, member_id: i32) -> Result<Decimal> {
    let member = member::Entity::find_by_id(member_id)
      .one(self.db)
      .await?
      .ok_or(Error::MemberNotFound)?;
    Ok(member.balance.0)
  }

  pub async fn transactions(
    &self,
    member_id: i32,
    limit: u64,
  ) -> Result<Vec<wallet_transaction::Model>> {
    Ok(
      wallet_transaction::Entity::find()
        .filter(wallet_transaction::Column::MemberId.eq(member_id))
        .order_by_desc(wallet_transaction::Column::CreatedAt)
        .limit(limit)
        .all(self.db)
        .await?,
    )
  }

  async fn credit_rebate(
    &self,
    member_id: i32,
    amount: Decimal,
    rebate_id: i32,
  ) -> Result<Decimal, CreditError> {
    if amount <= Decimal::ZERO {
      return Err(CreditError::InvalidAmount(amount));
    }

    let txn = self
      .db
      .begin()
      .await
      .map_err(|err| CreditError::Unavailable(err.to_string()))?;

    let existing = wallet_transaction::Entity::find()
      .filter(wallet_transaction::Column::RebateId.eq(rebate_id))
      .one(&txn)
      .await?;
    if existing.is_some() {
      debug!("Rebate {} already credited, skipping", rebate_id);
      let member = member::Entity::find_by_id(member_id).one(&txn).await?;
      return Ok(member.map(|m| m.balance.0).unwrap_or_default());
    }

    let member = member::Entity::find_by_id(member_id)
      .one(&txn)
      .await?
      .ok_or(CreditError::InvalidAccount(member_id))?;

    if !member.is_active {
      return Err(CreditError::InvalidAccount(member_id));
    }

    let new_balance = member.balance.0 + amount;

    member::ActiveModel { balance: Set(new_balance.into()), ..member.into() }
      .update(&txn)
      .await?;

    wallet_transaction::ActiveModel {
      id: NotSet,
      member_id: Set(member_id),
      amount: Set(amount.into()),
      tx_type: Set(TransactionType::RebateCredit),
      rebate_id: Set(Some(rebate_id)),
      description: Set(Some(format!("Rebate #{rebate_id}"))),
      created_at: Set(Utc::now().naive_utc()),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(new_balance)
  }
}

#[async_trait]
impl Ledger for Wallet<'_> {
  async fn credit(
    &self,
    member_id: i32,
    amount: Decimal,
    rebate_id: i32,
  ) -> Result<(), CreditError> {
    self.credit_rebate(member_id, amount, rebate_id).await.map(|_| ())
  }
}

#[cfg(test)]
mod tests {
  use rust_decimal_macros::dec;

  use super::*;
  use crate::sv::{Member, test_utils::test_db};

  #[tokio::test]
  async fn test_credit_updates_balance() {
    let db = test_db::setup().await;
    let member = test_db::member(&db, None).await;
    let wallet = Wallet::new(&db);

    wallet.credit(member.id, dec!(12.50), 1).await.unwrap();
    wallet.credit(member.id, dec!(7.50), 2).await.unwrap();

    assert_eq!(wallet.balance(member.id).await.unwrap(), dec!(20));
    let txs = wallet.transactions(member.id, 10).await.unwrap();
    assert_eq!(txs.len(), 2);
    assert!(txs.iter().all(|tx| tx.tx_type == TransactionType::RebateCredit));
  }

  #[tokio::test]
  async fn test_credit_is_idempotent_per_rebate() {
    let db = test_db::setup().await;
    let member = test_db::member(&db, None).await;
    let wallet = Wallet::new(&db);

    wallet.credit(member.id, dec!(10), 7).await.unwrap();
    wallet.credit(member.id, dec!(10), 7).await.unwrap();

    assert_eq!(wallet.balance(member.id).await.unwrap(), dec!(10));
  }

  #[tokio::test]
  async fn test_invalid_account() {
    let db = test_db::setup().await;
    let member = test_db::member(&db, None).await;
    Member::new(&db).set_active(member.id, false).await.unwrap();
    let wallet = Wallet::new(&db);

    assert!(matches!(
      wallet.credit(member.id, dec!(1), 1).await,
      Err(CreditError::InvalidAccount(_))
    ));
    assert!(matches!(
      wallet.credit(999, dec!(1), 2).await,
      Err(CreditError::InvalidAccount(999))
    ));
  }

  #[tokio::test]
  async fn test_rejects_non_positive() {
    let db = test_db::setup().await;
    let member = test_db::member(&db, None).await;

    assert!(matches!(
      Wallet::new(&db).credit(member.id, Decimal::ZERO, 1).await,
      Err(CreditError::InvalidAmount(_))
    ));
  }

  #[tokio::test]
  async fn test_large_amounts_stay_exact() {
    let db = test_db::setup().await;
    let member = test_db::member(&db, None).await;
    let wallet = Wallet::new(&db);

    wallet.credit(member.id, dec!(99999999999999999.99), 1).await.unwrap();

    assert_eq!(
      wallet.balance(member.id).await.unwrap(),
      dec!(99999999999999999.99)
    );
    let txs = wallet.transactions(member.id, 1).await.unwrap();
    assert_eq!(txs[0].amount, dec!(99999999999999999.99));
  }
}
