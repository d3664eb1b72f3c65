//! Organization Service - CRUD Operations
//!
//! This module provides the business logic layer for organization writes and
//! reads:
//!
//! - CRUD operations (create, get, list, update, replace, delete)
//! - Integrity checks with descriptive errors (unique code, existing parent,
//!   no deletion of referenced parents)
//!
//! The checks run before the write so callers get a precise message; the
//! store enforces the same rules again, which covers races between
//! concurrent writers. Either path ends in `IntegrityViolation`.
//!
//! # Cycles
//!
//! Re-parenting a node under one of its own descendants is allowed. It is
//! logged at `warn` level; traversal stays cycle-safe.

use crate::db::OrganizationStore;
use crate::models::{
    NewOrganization, Organization, OrganizationUpdate, TraversalDirection,
};
use crate::services::error::OrganizationServiceError;
use crate::services::tree_query::TreeQueryEngine;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// CRUD service over an injected store handle
#[derive(Clone)]
pub struct OrganizationService {
    store: Arc<dyn OrganizationStore>,
    tree: TreeQueryEngine,
}

impl OrganizationService {
    pub fn new(store: Arc<dyn OrganizationStore>) -> Self {
        Self {
            tree: TreeQueryEngine::new(store.clone()),
            store,
        }
    }

    /// Traversal engine sharing this service's store
    pub fn tree(&self) -> &TreeQueryEngine {
        &self.tree
    }

    /// Create a new organization
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` for blank or oversized fields
    /// - `IntegrityViolation` for a duplicate code or unknown parent
    #[instrument(skip(self), fields(code = %new.code))]
    pub async fn create(
        &self,
        new: NewOrganization,
    ) -> Result<Organization, OrganizationServiceError> {
        new.validate()?;
        self.ensure_code_available(&new.code, None).await?;
        self.ensure_parent_exists(new.parent_id).await?;

        let created = self
            .store
            .create_organization(new)
            .await
            .map_err(OrganizationServiceError::from_store)?;

        info!(id = created.id, "organization created");
        Ok(created)
    }

    /// Fetch one organization, `NotFound` if absent
    pub async fn get(&self, id: i64) -> Result<Organization, OrganizationServiceError> {
        self.store
            .get_organization(id)
            .await
            .map_err(OrganizationServiceError::from_store)?
            .ok_or_else(|| OrganizationServiceError::not_found(id))
    }

    /// Whether an organization with this id exists
    pub async fn exists(&self, id: i64) -> Result<bool, OrganizationServiceError> {
        Ok(self
            .store
            .get_organization(id)
            .await
            .map_err(OrganizationServiceError::from_store)?
            .is_some())
    }

    /// All organizations ordered by name
    pub async fn list(&self) -> Result<Vec<Organization>, OrganizationServiceError> {
        self.store
            .list_organizations()
            .await
            .map_err(OrganizationServiceError::from_store)
    }

    /// Apply a partial update
    ///
    /// # Errors
    ///
    /// - `NotFound` if `id` does not exist
    /// - `ValidationFailed` for blank or oversized changed fields
    /// - `IntegrityViolation` for a code used by another organization or an
    ///   unknown parent
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: i64,
        update: OrganizationUpdate,
    ) -> Result<Organization, OrganizationServiceError> {
        update.validate()?;
        let current = self.get(id).await?;

        if let Some(code) = &update.code {
            if *code != current.code {
                self.ensure_code_available(code, Some(id)).await?;
            }
        }

        if let Some(new_parent) = update.parent_id {
            self.ensure_parent_exists(new_parent).await?;
            if let Some(parent_id) = new_parent {
                self.warn_if_cycle(id, parent_id).await?;
            }
        }

        let updated = self
            .store
            .update_organization(id, update)
            .await
            .map_err(OrganizationServiceError::from_store)?;

        info!(id, "organization updated");
        Ok(updated)
    }

    /// Replace every writable field (PUT semantics)
    pub async fn replace(
        &self,
        id: i64,
        replacement: NewOrganization,
    ) -> Result<Organization, OrganizationServiceError> {
        replacement.validate()?;
        self.update(id, replacement.into()).await
    }

    /// Delete an organization
    ///
    /// # Errors
    ///
    /// - `NotFound` if `id` does not exist
    /// - `IntegrityViolation` if another organization still has it as parent
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), OrganizationServiceError> {
        self.get(id).await?;

        let children = self
            .store
            .count_children(id)
            .await
            .map_err(OrganizationServiceError::from_store)?;
        let has_other_children = children > 1 || (children == 1 && !self.is_self_parent(id).await?);
        if has_other_children {
            return Err(OrganizationServiceError::integrity_violation(format!(
                "Organization {} is the parent of {} organization(s) and cannot be deleted",
                id, children
            )));
        }

        let result = self
            .store
            .delete_organization(id)
            .await
            .map_err(OrganizationServiceError::from_store)?;

        if !result.existed {
            return Err(OrganizationServiceError::not_found(id));
        }

        info!(id, "organization deleted");
        Ok(())
    }

    async fn is_self_parent(&self, id: i64) -> Result<bool, OrganizationServiceError> {
        Ok(self.get(id).await?.parent_id == Some(id))
    }

    async fn ensure_code_available(
        &self,
        code: &str,
        except: Option<i64>,
    ) -> Result<(), OrganizationServiceError> {
        let existing = self
            .store
            .get_organization_by_code(code)
            .await
            .map_err(OrganizationServiceError::from_store)?;

        match existing {
            Some(org) if Some(org.id) != except => {
                Err(OrganizationServiceError::integrity_violation(format!(
                    "Organization code '{}' is already used by organization {}",
                    code, org.id
                )))
            }
            _ => Ok(()),
        }
    }

    async fn ensure_parent_exists(
        &self,
        parent_id: Option<i64>,
    ) -> Result<(), OrganizationServiceError> {
        match parent_id {
            Some(pid) if !self.exists(pid).await? => Err(
                OrganizationServiceError::integrity_violation(format!(
                    "Parent organization {} does not exist",
                    pid
                )),
            ),
            _ => Ok(()),
        }
    }

    /// Log when `parent_id` lies in the subtree of `id` (the update will form a cycle)
    async fn warn_if_cycle(&self, id: i64, parent_id: i64) -> Result<(), OrganizationServiceError> {
        let subtree = self
            .tree
            .closure(id, TraversalDirection::Downward)
            .await?;
        if subtree.iter().any(|o| o.id == parent_id) {
            warn!(
                id,
                parent_id, "re-parenting forms a cycle in the organization hierarchy"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn service() -> OrganizationService {
        OrganizationService::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let svc = service();
        let err = svc
            .create(NewOrganization::new("", "CODE"))
            .await
            .unwrap_err();
        assert!(matches!(err, OrganizationServiceError::ValidationFailed(_)));
    }

    #[tokio::test]
    async fn test_update_keeping_own_code_is_allowed() {
        let svc = service();
        let org = svc.create(NewOrganization::new("A", "A")).await.unwrap();

        let updated = svc
            .update(org.id, OrganizationUpdate::new().with_code("A").with_name("A2"))
            .await
            .unwrap();
        assert_eq!(updated.name, "A2");
    }

    #[tokio::test]
    async fn test_update_unknown_is_not_found() {
        let svc = service();
        let err = svc
            .update(9, OrganizationUpdate::new().with_name("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, OrganizationServiceError::NotFound { id: 9 }));
    }

    #[tokio::test]
    async fn test_cycle_forming_update_is_allowed() {
        let svc = service();
        let a = svc.create(NewOrganization::new("A", "A")).await.unwrap();
        let b = svc
            .create(NewOrganization::new("B", "B").with_parent(a.id))
            .await
            .unwrap();

        let updated = svc
            .update(a.id, OrganizationUpdate::new().with_parent_id(Some(b.id)))
            .await
            .unwrap();
        assert_eq!(updated.parent_id, Some(b.id));
    }

    #[tokio::test]
    async fn test_delete_self_parented_node() {
        let svc = service();
        let a = svc.create(NewOrganization::new("A", "A")).await.unwrap();
        svc.update(a.id, OrganizationUpdate::new().with_parent_id(Some(a.id)))
            .await
            .unwrap();

        svc.delete(a.id).await.unwrap();
        assert!(!svc.exists(a.id).await.unwrap());
    }
}
