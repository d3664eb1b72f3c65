//! TursoStore - OrganizationStore Implementation for Turso/libsql Backend
//!
//! TursoStore wraps `DatabaseService` and delegates every operation to its
//! `db_*` methods. The only logic here is libsql::Row to Organization
//! conversion and stitching partial updates onto the current row.
//!
//! Traversals run as a single recursive CTE statement, so each closure is
//! read from one SQLite snapshot.

use crate::db::organization_store::OrganizationStore;
use crate::db::{DatabaseService, DbOrganizationParams, DbOrganizationPatch};
use crate::models::{
    DeleteResult, NewOrganization, Organization, OrganizationUpdate, TraversalDirection,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use libsql::Row;
use std::sync::Arc;

/// TursoStore implements OrganizationStore for the libsql backend
pub struct TursoStore {
    db: Arc<DatabaseService>,
}

impl TursoStore {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    /// Parse timestamp from database - handles both SQLite and RFC3339 formats
    ///
    /// SQLite CURRENT_TIMESTAMP returns: "YYYY-MM-DD HH:MM:SS"
    fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return Ok(naive.and_utc());
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }

        Err(anyhow::anyhow!(
            "Unable to parse timestamp '{}' as SQLite or RFC3339 format",
            s
        ))
    }

    /// Convert libsql::Row to Organization
    ///
    /// Expected columns (in order): id, name, code, parent_id, created_at, modified_at
    fn row_to_organization(row: &Row) -> Result<Organization> {
        let id: i64 = row.get(0).context("Failed to get id")?;
        let name: String = row.get(1).context("Failed to get name")?;
        let code: String = row.get(2).context("Failed to get code")?;
        let parent_id: Option<i64> = row.get(3).context("Failed to get parent_id")?;
        let created_at_str: String = row.get(4).context("Failed to get created_at")?;
        let modified_at_str: String = row.get(5).context("Failed to get modified_at")?;

        Ok(Organization {
            id,
            name,
            code,
            parent_id,
            created_at: Self::parse_timestamp(&created_at_str)
                .context("Failed to parse created_at")?,
            modified_at: Self::parse_timestamp(&modified_at_str)
                .context("Failed to parse modified_at")?,
        })
    }

    async fn collect_rows(mut rows: libsql::Rows) -> Result<Vec<Organization>> {
        let mut organizations = Vec::new();
        while let Some(row) = rows.next().await.context("Failed to fetch row")? {
            organizations.push(Self::row_to_organization(&row)?);
        }
        Ok(organizations)
    }
}

#[async_trait]
impl OrganizationStore for TursoStore {
    async fn create_organization(&self, new: NewOrganization) -> Result<Organization> {
        let id = self
            .db
            .db_create_organization(DbOrganizationParams {
                name: &new.name,
                code: &new.code,
                parent_id: new.parent_id,
            })
            .await
            .context("Failed to create organization")?;

        self.get_organization(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Organization {} not found after creation", id))
    }

    async fn get_organization(&self, id: i64) -> Result<Option<Organization>> {
        match self
            .db
            .db_get_organization(id)
            .await
            .context("Failed to get organization")?
        {
            Some(row) => Ok(Some(Self::row_to_organization(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_organization_by_code(&self, code: &str) -> Result<Option<Organization>> {
        match self
            .db
            .db_get_organization_by_code(code)
            .await
            .context("Failed to get organization by code")?
        {
            Some(row) => Ok(Some(Self::row_to_organization(&row)?)),
            None => Ok(None),
        }
    }

    async fn update_organization(
        &self,
        id: i64,
        update: OrganizationUpdate,
    ) -> Result<Organization> {
        let rows_affected = self
            .db
            .db_patch_organization(
                id,
                DbOrganizationPatch {
                    name: update.name.as_deref(),
                    code: update.code.as_deref(),
                    parent_id: update.parent_id,
                },
            )
            .await
            .context("Failed to update organization")?;

        if rows_affected == 0 {
            anyhow::bail!("Organization not found: {}", id);
        }

        self.get_organization(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Organization {} not found after update", id))
    }

    async fn delete_organization(&self, id: i64) -> Result<DeleteResult> {
        let rows_affected = self
            .db
            .db_delete_organization(id)
            .await
            .context("Failed to delete organization")?;

        Ok(DeleteResult {
            existed: rows_affected > 0,
        })
    }

    async fn list_organizations(&self) -> Result<Vec<Organization>> {
        let rows = self
            .db
            .db_list_organizations()
            .await
            .context("Failed to list organizations")?;

        Self::collect_rows(rows).await
    }

    async fn count_children(&self, id: i64) -> Result<u64> {
        Ok(self
            .db
            .db_count_children(id)
            .await
            .context("Failed to count children")?)
    }

    async fn tree_closure(
        &self,
        id: i64,
        direction: TraversalDirection,
    ) -> Result<Vec<Organization>> {
        let rows = self
            .db
            .db_tree_closure(id, direction)
            .await
            .with_context(|| format!("Failed to compute {:?} closure of {}", direction, id))?;

        Self::collect_rows(rows).await
    }

    async fn close(&self) -> Result<()> {
        self.db
            .db_close()
            .await
            .context("Failed to close database")?;
        Ok(())
    }
}
