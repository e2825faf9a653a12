use crate::{
  entity::{Money, Rank, Slot, Structure, member},
  prelude::*,
  sv::{Settings, tree::Tree},
};

pub struct Member<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Member<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Register a member under `upline_id`. The upline is fixed from here on.
  ///
  /// In binary mode `slot` picks the position, otherwise the first free one
  /// is taken. Unilevel members carry no slot.
  pub async fn register(
    &self,
    upline_id: Option<i32>,
    slot: Option<Slot>,
  ) -> Result<member::Model> {
    let config = Settings::new(self.db).get().await?;
    let txn = self.db.begin().await?;

    let slot = match upline_id {
      None => None,
      Some(upline_id) => {
        member::Entity::find_by_id(upline_id)
          .one(&txn)
          .await?
          .ok_or(Error::MemberNotFound)?;

        match config.structure {
          Structure::Unilevel => None,
          Structure::Binary => {
            let free = Tree::new(&txn, Structure::Binary)
              .free_slot(upline_id)
              .await?
              .ok_or(Error::UplineFull(upline_id))?;

            match slot {
              None => Some(free),
              Some(wanted) => {
                let taken = Tree::new(&txn, Structure::Binary)
                  .direct_children(upline_id)
                  .await?
                  .iter()
                  .any(|child| child.slot == Some(wanted));
                if taken {
                  return Err(Error::SlotTaken(upline_id));
                }
                Some(wanted)
              }
            }
          }
        }
      }
    };

    let member = member::ActiveModel {
      id: NotSet,
      upline_id: Set(upline_id),
      rank: Set(Rank::Starter),
      slot: Set(slot),
      is_active: Set(true),
      balance: Set(Money::ZERO),
      created_at: Set(Utc::now().naive_utc()),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    debug!(
      "Registered member {} under {:?} ({:?})",
      member.id, member.upline_id, member.slot
    );
    Ok(member)
  }

  pub async fn by_id(&self, member_id: i32) -> Result<Option<member::Model>> {
    Ok(member::Entity::find_by_id(member_id).one(self.db).await?)
  }

  pub async fn set_rank(&self, member_id: i32, rank: Rank) -> Result<()> {
    let member = member::Entity::find_by_id(member_id)
      .one(self.db)
      .await?
      .ok_or(Error::MemberNotFound)?;

    member::ActiveModel { rank: Set(rank), ..member.into() }
      .update(self.db)
      .await?;

    Ok(())
  }

  /// Inactive members stop receiving rebates; their downline keeps paying up.
  pub async fn set_active(&self, member_id: i32, active: bool) -> Result<()> {
    let member = member::Entity::find_by_id(member_id)
      .one(self.db)
      .await?
      .ok_or(Error::MemberNotFound)?;

    member::ActiveModel { is_active: Set(active), ..member.into() }
      .update(self.db)
      .await?;

    Ok(())
  }

  pub async fn count(&self) -> Result<u64> {
    Ok(member::Entity::find().count(self.db).await?)
  }
}
