//! MemoryStore - In-process OrganizationStore
//!
//! Keeps every organization in a `BTreeMap` behind a `tokio::sync::RwLock`.
//! Integrity rules mirror the SQLite schema (UNIQUE code, parent foreign key,
//! `ON DELETE RESTRICT`) and report failures as
//! `DatabaseError::ConstraintViolation` so callers see the same errors from
//! either backend.
//!
//! Traversal is an explicit breadth-first fixed point: expand the frontier,
//! skip anything already visited, stop when a round adds nothing. Each
//! closure is computed under a single read guard, which gives it the same
//! snapshot semantics as one SQL statement.

use crate::db::organization_store::OrganizationStore;
use crate::db::DatabaseError;
use crate::models::{
    DeleteResult, NewOrganization, Organization, OrganizationUpdate, TraversalDirection,
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct MemoryState {
    next_id: i64,
    organizations: BTreeMap<i64, Organization>,
}

impl MemoryState {
    fn code_taken(&self, code: &str, except: Option<i64>) -> bool {
        self.organizations
            .values()
            .any(|o| o.code == code && Some(o.id) != except)
    }

    fn check_parent(&self, parent_id: Option<i64>) -> Result<(), DatabaseError> {
        match parent_id {
            Some(pid) if !self.organizations.contains_key(&pid) => {
                Err(DatabaseError::constraint_violation(format!(
                    "FOREIGN KEY constraint failed: parent {} does not exist",
                    pid
                )))
            }
            _ => Ok(()),
        }
    }

    fn upward_closure(&self, id: i64) -> Vec<Organization> {
        let mut visited = HashSet::new();
        let mut result = Vec::new();
        let mut current = self.organizations.get(&id);

        while let Some(org) = current {
            if !visited.insert(org.id) {
                break;
            }
            result.push(org.clone());
            current = org.parent_id.and_then(|pid| self.organizations.get(&pid));
        }

        result
    }

    fn downward_closure(&self, id: i64) -> Vec<Organization> {
        let Some(start) = self.organizations.get(&id) else {
            return Vec::new();
        };

        let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
        for org in self.organizations.values() {
            if let Some(pid) = org.parent_id {
                children.entry(pid).or_default().push(org.id);
            }
        }

        let mut visited = HashSet::from([start.id]);
        let mut result = vec![start.clone()];
        let mut frontier = VecDeque::from([start.id]);

        while let Some(current) = frontier.pop_front() {
            for child in children.get(&current).into_iter().flatten() {
                if visited.insert(*child) {
                    if let Some(org) = self.organizations.get(child) {
                        result.push(org.clone());
                    }
                    frontier.push_back(*child);
                }
            }
        }

        result
    }
}

/// In-memory OrganizationStore
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrganizationStore for MemoryStore {
    async fn create_organization(&self, new: NewOrganization) -> Result<Organization> {
        let mut state = self.state.write().await;

        if state.code_taken(&new.code, None) {
            return Err(DatabaseError::constraint_violation(format!(
                "UNIQUE constraint failed: organizations.code ({})",
                new.code
            ))
            .into());
        }
        state.check_parent(new.parent_id)?;

        state.next_id += 1;
        let now = Utc::now();
        let organization = Organization {
            id: state.next_id,
            name: new.name,
            code: new.code,
            parent_id: new.parent_id,
            created_at: now,
            modified_at: now,
        };
        state
            .organizations
            .insert(organization.id, organization.clone());

        Ok(organization)
    }

    async fn get_organization(&self, id: i64) -> Result<Option<Organization>> {
        Ok(self.state.read().await.organizations.get(&id).cloned())
    }

    async fn get_organization_by_code(&self, code: &str) -> Result<Option<Organization>> {
        Ok(self
            .state
            .read()
            .await
            .organizations
            .values()
            .find(|o| o.code == code)
            .cloned())
    }

    async fn update_organization(
        &self,
        id: i64,
        update: OrganizationUpdate,
    ) -> Result<Organization> {
        let mut state = self.state.write().await;

        let current = state
            .organizations
            .get(&id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Organization not found: {}", id))?;
        let merged = update.apply_to(&current);

        if state.code_taken(&merged.code, Some(id)) {
            return Err(DatabaseError::constraint_violation(format!(
                "UNIQUE constraint failed: organizations.code ({})",
                merged.code
            ))
            .into());
        }
        state.check_parent(merged.parent_id)?;

        let updated = Organization {
            name: merged.name,
            code: merged.code,
            parent_id: merged.parent_id,
            modified_at: Utc::now(),
            ..current
        };
        state.organizations.insert(id, updated.clone());

        Ok(updated)
    }

    async fn delete_organization(&self, id: i64) -> Result<DeleteResult> {
        let mut state = self.state.write().await;

        if state
            .organizations
            .values()
            .any(|o| o.parent_id == Some(id) && o.id != id)
        {
            return Err(DatabaseError::constraint_violation(format!(
                "FOREIGN KEY constraint failed: organization {} is still a parent",
                id
            ))
            .into());
        }

        Ok(DeleteResult {
            existed: state.organizations.remove(&id).is_some(),
        })
    }

    async fn list_organizations(&self) -> Result<Vec<Organization>> {
        let mut organizations: Vec<Organization> = self
            .state
            .read()
            .await
            .organizations
            .values()
            .cloned()
            .collect();
        organizations.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(organizations)
    }

    async fn count_children(&self, id: i64) -> Result<u64> {
        Ok(self
            .state
            .read()
            .await
            .organizations
            .values()
            .filter(|o| o.parent_id == Some(id))
            .count() as u64)
    }

    async fn tree_closure(
        &self,
        id: i64,
        direction: TraversalDirection,
    ) -> Result<Vec<Organization>> {
        let state = self.state.read().await;
        Ok(match direction {
            TraversalDirection::Upward => state.upward_closure(id),
            TraversalDirection::Downward => state.downward_closure(id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(orgs: &[Organization]) -> Vec<i64> {
        let mut ids: Vec<i64> = orgs.iter().map(|o| o.id).collect();
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn test_ids_are_assigned_sequentially() -> Result<()> {
        let store = MemoryStore::new();
        let a = store.create_organization(NewOrganization::new("A", "A")).await?;
        let b = store.create_organization(NewOrganization::new("B", "B")).await?;
        assert_eq!((a.id, b.id), (1, 2));
        Ok(())
    }

    #[tokio::test]
    async fn test_integrity_rules_match_sqlite() -> Result<()> {
        let store = MemoryStore::new();
        let root = store
            .create_organization(NewOrganization::new("Root", "ROOT"))
            .await?;
        store
            .create_organization(NewOrganization::new("Child", "CHILD").with_parent(root.id))
            .await?;

        for err in [
            store
                .create_organization(NewOrganization::new("Dup", "ROOT"))
                .await
                .unwrap_err(),
            store
                .create_organization(NewOrganization::new("Orphan", "ORPHAN").with_parent(77))
                .await
                .unwrap_err(),
            store.delete_organization(root.id).await.unwrap_err(),
        ] {
            let db_err = err.downcast_ref::<DatabaseError>().unwrap();
            assert!(db_err.is_constraint_violation(), "got {:?}", db_err);
        }

        Ok(())
    }

    #[test]
    fn test_update_unknown_id_fails() {
        let store = MemoryStore::new();
        tokio_test::assert_err!(tokio_test::block_on(
            store.update_organization(1, OrganizationUpdate::new().with_name("x"))
        ));
        tokio_test::assert_ok!(tokio_test::block_on(store.delete_organization(1)));
    }

    #[tokio::test]
    async fn test_self_parent_does_not_block_delete() -> Result<()> {
        let store = MemoryStore::new();
        let a = store.create_organization(NewOrganization::new("A", "A")).await?;
        store
            .update_organization(a.id, OrganizationUpdate::new().with_parent_id(Some(a.id)))
            .await?;

        assert!(store.delete_organization(a.id).await?.existed);
        Ok(())
    }

    #[tokio::test]
    async fn test_breadth_first_closure_handles_cycles() -> Result<()> {
        let store = MemoryStore::new();
        let a = store.create_organization(NewOrganization::new("A", "A")).await?;
        let b = store
            .create_organization(NewOrganization::new("B", "B").with_parent(a.id))
            .await?;
        let c = store
            .create_organization(NewOrganization::new("C", "C").with_parent(b.id))
            .await?;
        store
            .update_organization(a.id, OrganizationUpdate::new().with_parent_id(Some(c.id)))
            .await?;

        let up = store.tree_closure(b.id, TraversalDirection::Upward).await?;
        assert_eq!(ids(&up), vec![a.id, b.id, c.id]);

        let down = store.tree_closure(c.id, TraversalDirection::Downward).await?;
        assert_eq!(ids(&down), vec![a.id, b.id, c.id]);

        Ok(())
    }
}
