//! Read-only view over the sponsor (upline) graph.
//!
//! Members reference their upline by id, so every hop is a keyed lookup and
//! the walk carries a visited set instead of trusting the data to be acyclic.

use serde::Serialize;

use crate::{
  entity::{Slot, Structure, member},
  prelude::*,
};

pub struct Tree<'a, C> {
  db: &'a C,
  structure: Structure,
}

#[derive(Debug, Clone, Serialize)]
pub struct Child {
  pub slot: Option<Slot>,
  pub member: member::Model,
}

impl<'a, C: ConnectionTrait> Tree<'a, C> {
  pub fn new(db: &'a C, structure: Structure) -> Self {
    Self { db, structure }
  }

  /// Upline of `member_id`, nearest first, at most `max_depth` members long.
  pub async fn upline_chain(
    &self,
    member_id: i32,
    max_depth: u32,
  ) -> Result<Vec<member::Model>> {
    let start = member::Entity::find_by_id(member_id)
      .one(self.db)
      .await?
      .ok_or(Error::MemberNotFound)?;

    let mut visited = HashSet::from([start.id]);
    let mut chain = Vec::new();
    let mut next = start.upline_id;

    while let Some(id) = next
      && chain.len() < max_depth as usize
    {
      if !visited.insert(id) {
        error!("Upline cycle through member {} (walk from {})", id, member_id);
        return Err(Error::CycleDetected(id));
      }

      let upline = member::Entity::find_by_id(id)
        .one(self.db)
        .await?
        .ok_or(Error::MemberNotFound)?;

      next = upline.upline_id;
      chain.push(upline);
    }

    Ok(chain)
  }

  /// Direct recruits of `member_id`.
  ///
  /// Binary mode only reports slotted members, left before right.
  pub async fn direct_children(&self, member_id: i32) -> Result<Vec<Child>> {
    let members = member::Entity::find()
      .filter(member::Column::UplineId.eq(member_id))
      .order_by_asc(member::Column::Id)
      .all(self.db)
      .await?;

    let mut children: Vec<Child> = members
      .into_iter()
      .map(|member| Child { slot: member.slot, member })
      .collect();

    if self.structure == Structure::Binary {
      children.retain(|child| child.slot.is_some());
      children.sort_by_key(|child| child.slot);
      children.truncate(2);
    }

    Ok(children)
  }

  /// First unoccupied binary slot under `upline_id`.
  pub async fn free_slot(&self, upline_id: i32) -> Result<Option<Slot>> {
    let taken: Vec<Slot> = self
      .direct_children(upline_id)
      .await?
      .into_iter()
      .filter_map(|child| child.slot)
      .collect();

    Ok([Slot::Left, Slot::Right].into_iter().find(|slot| !taken.contains(slot)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::test_utils::test_db;

  #[tokio::test]
  async fn test_upline_chain_nearest_first() {
    let db = test_db::setup().await;
    let a = test_db::member(&db, None).await;
    let b = test_db::member(&db, Some(a.id)).await;
    let c = test_db::member(&db, Some(b.id)).await;

    let chain =
      Tree::new(&db, Structure::Unilevel).upline_chain(c.id, 5).await.unwrap();
    let ids: Vec<i32> = chain.iter().map(|m| m.id).collect();

    assert_eq!(ids, vec![b.id, a.id]);
  }

  #[tokio::test]
  async fn test_upline_chain_respects_depth() {
    let db = test_db::setup().await;
    let a = test_db::member(&db, None).await;
    let b = test_db::member(&db, Some(a.id)).await;
    let c = test_db::member(&db, Some(b.id)).await;

    let tree = Tree::new(&db, Structure::Unilevel);

    assert_eq!(tree.upline_chain(c.id, 1).await.unwrap().len(), 1);
    assert!(tree.upline_chain(c.id, 0).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_root_has_empty_chain() {
    let db = test_db::setup().await;
    let root = test_db::member(&db, None).await;

    let chain = Tree::new(&db, Structure::Unilevel)
      .upline_chain(root.id, 10)
      .await
      .unwrap();
    assert!(chain.is_empty());
  }

  #[tokio::test]
  async fn test_cycle_is_reported() {
    let db = test_db::setup().await;
    let a = test_db::member(&db, None).await;
    let b = test_db::member(&db, Some(a.id)).await;
    let c = test_db::member(&db, Some(b.id)).await;

    // Corrupt the graph: a -> c -> b -> a
    member::ActiveModel { upline_id: Set(Some(c.id)), ..a.into() }
      .update(&db)
      .await
      .unwrap();

    let result =
      Tree::new(&db, Structure::Unilevel).upline_chain(c.id, 10).await;
    assert!(matches!(result, Err(Error::CycleDetected(id)) if id == c.id));
  }

  #[tokio::test]
  async fn test_binary_children_are_slotted() {
    let db = test_db::setup().await;
    let root = test_db::member(&db, None).await;
    let right = test_db::slotted(&db, root.id, Slot::Right).await;
    let left = test_db::slotted(&db, root.id, Slot::Left).await;

    let tree = Tree::new(&db, Structure::Binary);
    let children = tree.direct_children(root.id).await.unwrap();

    assert_eq!(children.len(), 2);
    assert_eq!(children[0].slot, Some(Slot::Left));
    assert_eq!(children[0].member.id, left.id);
    assert_eq!(children[1].member.id, right.id);
    assert_eq!(tree.free_slot(root.id).await.unwrap(), None);
  }

  #[tokio::test]
  async fn test_unilevel_children_unbounded() {
    let db = test_db::setup().await;
    let root = test_db::member(&db, None).await;
    for _ in 0..4 {
      test_db::member(&db, Some(root.id)).await;
    }

    let children = Tree::new(&db, Structure::Unilevel)
      .direct_children(root.id)
      .await
      .unwrap();
    assert_eq!(children.len(), 4);
    assert!(children.iter().all(|child| child.slot.is_none()));
  }
}
