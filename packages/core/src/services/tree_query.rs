//! Tree Query Engine
//!
//! Computes ancestor and descendant closures over the organization forest.
//!
//! Every traversal is delegated to [`OrganizationStore::tree_closure`], which
//! evaluates the whole closure in one read (a recursive CTE for SQLite, a
//! breadth-first fixed point for the in-memory store). Nothing here loops over
//! levels or recurses, so depth is unbounded.
//!
//! # Closure Semantics
//!
//! - `descendants(id)` / `ancestors(id)` include `id` itself
//! - `strict_descendants(id)` / `strict_ancestors(id)` exclude it and are
//!   ordered by `name` for presentation
//! - An unknown id yields an empty result, never an error
//!
//! # Resource Risk
//!
//! Work is proportional to the size of the closure. A very deep hierarchy is
//! traversed in full. Cycles are tolerated: a node already in the result is
//! never expanded again, so traversal terminates.

use crate::db::OrganizationStore;
use crate::models::{Organization, TraversalDirection};
use crate::services::error::OrganizationServiceError;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Read-only traversal over an injected store handle
///
/// Holds no state besides the store; clones are cheap and independent.
#[derive(Clone)]
pub struct TreeQueryEngine {
    store: Arc<dyn OrganizationStore>,
}

impl TreeQueryEngine {
    pub fn new(store: Arc<dyn OrganizationStore>) -> Self {
        Self { store }
    }

    /// Inclusive closure of `id` in `direction`, as full records
    ///
    /// The returned vector is a set: no duplicates, unspecified order.
    #[instrument(skip(self))]
    pub async fn closure(
        &self,
        id: i64,
        direction: TraversalDirection,
    ) -> Result<Vec<Organization>, OrganizationServiceError> {
        let organizations = self
            .store
            .tree_closure(id, direction)
            .await
            .map_err(OrganizationServiceError::from_store)?;

        debug!(size = organizations.len(), "closure computed");

        Ok(organizations)
    }

    /// Ids of `root_id` and every organization below it
    pub async fn descendants(&self, root_id: i64) -> Result<BTreeSet<i64>, OrganizationServiceError> {
        Ok(Self::ids(
            &self.closure(root_id, TraversalDirection::Downward).await?,
        ))
    }

    /// Ids of `node_id` and every organization above it
    pub async fn ancestors(&self, node_id: i64) -> Result<BTreeSet<i64>, OrganizationServiceError> {
        Ok(Self::ids(
            &self.closure(node_id, TraversalDirection::Upward).await?,
        ))
    }

    /// Everything below `root_id`, excluding it, ordered by name
    pub async fn strict_descendants(
        &self,
        root_id: i64,
    ) -> Result<Vec<Organization>, OrganizationServiceError> {
        self.strict(root_id, TraversalDirection::Downward).await
    }

    /// Everything above `node_id`, excluding it, ordered by name
    pub async fn strict_ancestors(
        &self,
        node_id: i64,
    ) -> Result<Vec<Organization>, OrganizationServiceError> {
        self.strict(node_id, TraversalDirection::Upward).await
    }

    async fn strict(
        &self,
        id: i64,
        direction: TraversalDirection,
    ) -> Result<Vec<Organization>, OrganizationServiceError> {
        let mut organizations: Vec<Organization> = self
            .closure(id, direction)
            .await?
            .into_iter()
            .filter(|o| o.id != id)
            .collect();
        sort_by_name(&mut organizations);
        Ok(organizations)
    }

    fn ids(organizations: &[Organization]) -> BTreeSet<i64> {
        organizations.iter().map(|o| o.id).collect()
    }
}

/// Presentation order: name ascending, id as tie-break
pub fn sort_by_name(organizations: &mut [Organization]) {
    organizations.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{NewOrganization, OrganizationUpdate};

    async fn scenario() -> (TreeQueryEngine, Arc<MemoryStore>, [i64; 3]) {
        let store = Arc::new(MemoryStore::new());
        let root = store
            .create_organization(NewOrganization::new("Root", "ROOT"))
            .await
            .unwrap();
        let div = store
            .create_organization(NewOrganization::new("Div", "DIV").with_parent(root.id))
            .await
            .unwrap();
        let team = store
            .create_organization(NewOrganization::new("Team", "TEAM").with_parent(div.id))
            .await
            .unwrap();

        (
            TreeQueryEngine::new(store.clone()),
            store,
            [root.id, div.id, team.id],
        )
    }

    #[tokio::test]
    async fn test_closures_include_start_node() {
        let (engine, _store, [root, div, team]) = scenario().await;

        assert_eq!(
            engine.descendants(root).await.unwrap(),
            BTreeSet::from([root, div, team])
        );
        assert_eq!(
            engine.ancestors(team).await.unwrap(),
            BTreeSet::from([root, div, team])
        );
    }

    #[tokio::test]
    async fn test_strict_results_exclude_start_node() {
        let (engine, _store, [root, div, team]) = scenario().await;

        let ancestors: Vec<i64> = engine
            .strict_ancestors(team)
            .await
            .unwrap()
            .iter()
            .map(|o| o.id)
            .collect();
        // Ordered by name: "Div" < "Root"
        assert_eq!(ancestors, vec![div, root]);

        let descendants: Vec<i64> = engine
            .strict_descendants(root)
            .await
            .unwrap()
            .iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(descendants, vec![div, team]);

        assert!(engine.strict_ancestors(root).await.unwrap().is_empty());
        assert!(engine.strict_descendants(team).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_id_is_empty_not_error() {
        let (engine, _store, _) = scenario().await;

        assert!(engine.descendants(404).await.unwrap().is_empty());
        assert!(engine.ancestors(404).await.unwrap().is_empty());
        assert!(engine.strict_descendants(404).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_self_loop_terminates() {
        let (engine, store, [root, div, team]) = scenario().await;
        store
            .update_organization(root, OrganizationUpdate::new().with_parent_id(Some(root)))
            .await
            .unwrap();

        assert_eq!(
            engine.ancestors(team).await.unwrap(),
            BTreeSet::from([root, div, team])
        );
        assert_eq!(
            engine.strict_descendants(root).await.unwrap().len(),
            2,
            "root must not list itself even though it is its own parent"
        );
    }

    /// Store whose every traversal fails with a chained error
    struct UnavailableStore;

    #[async_trait::async_trait]
    impl OrganizationStore for UnavailableStore {
        async fn create_organization(&self, _: NewOrganization) -> anyhow::Result<Organization> {
            unimplemented!()
        }
        async fn get_organization(&self, _: i64) -> anyhow::Result<Option<Organization>> {
            Ok(None)
        }
        async fn get_organization_by_code(&self, _: &str) -> anyhow::Result<Option<Organization>> {
            Ok(None)
        }
        async fn update_organization(
            &self,
            _: i64,
            _: OrganizationUpdate,
        ) -> anyhow::Result<Organization> {
            unimplemented!()
        }
        async fn delete_organization(&self, _: i64) -> anyhow::Result<crate::models::DeleteResult> {
            unimplemented!()
        }
        async fn list_organizations(&self) -> anyhow::Result<Vec<Organization>> {
            Ok(Vec::new())
        }
        async fn count_children(&self, _: i64) -> anyhow::Result<u64> {
            Ok(0)
        }
        async fn tree_closure(
            &self,
            _: i64,
            _: TraversalDirection,
        ) -> anyhow::Result<Vec<Organization>> {
            use anyhow::Context;
            Err(anyhow::anyhow!("database is locked")).context("Failed to compute closure")
        }
    }

    #[tokio::test]
    async fn test_store_failure_maps_like_other_service_errors() {
        let engine = TreeQueryEngine::new(Arc::new(UnavailableStore));

        let err = engine.strict_descendants(1).await.unwrap_err();
        let expected = OrganizationServiceError::from_store(
            anyhow::anyhow!("database is locked").context("Failed to compute closure"),
        );
        assert_eq!(err.to_string(), expected.to_string());
        match err {
            OrganizationServiceError::QueryFailed(msg) => {
                assert!(msg.contains("Failed to compute closure"));
                assert!(msg.contains("database is locked"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_sort_by_name_breaks_ties_by_id() {
        use chrono::Utc;

        let make = |id: i64, name: &str| Organization {
            id,
            name: name.to_string(),
            code: format!("C{}", id),
            parent_id: None,
            created_at: Utc::now(),
            modified_at: Utc::now(),
        };
        let mut orgs = vec![make(3, "B"), make(2, "A"), make(1, "B")];
        sort_by_name(&mut orgs);

        let ids: Vec<i64> = orgs.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }
}
