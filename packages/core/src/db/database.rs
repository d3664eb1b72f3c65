//! Database Connection Management
//!
//! This module provides the database connection, schema initialization and
//! the raw SQL operations for the `organizations` table using libsql/Turso.
//!
//! # Architecture
//!
//! - **Path-agnostic**: Accepts any valid PathBuf
//! - **WAL mode**: Write-Ahead Logging so traversal reads never block writers
//! - **Foreign keys**: Enabled on every connection (parent protection relies on it)
//! - **Recursive CTEs**: Ancestor and descendant closures run as one statement
//!
//! # Database Connection Patterns
//!
//! **ALWAYS use `connect_with_timeout()` in async functions.** It sets the
//! 5-second busy timeout and turns on foreign key enforcement, which SQLite
//! tracks per connection.
//!
//! ```no_run
//! # use orgunits_core::db::DatabaseService;
//! # use std::path::PathBuf;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db_service = DatabaseService::new(PathBuf::from("./data/orgunits.db")).await?;
//! let conn = db_service.connect_with_timeout().await?;
//! # Ok(())
//! # }
//! ```

use crate::db::error::DatabaseError;
use crate::models::TraversalDirection;
use libsql::{Builder, Database};
use std::path::PathBuf;
use std::sync::Arc;

/// Column list shared by every query that returns full organization rows
pub(crate) const ORGANIZATION_COLUMNS: &str =
    "id, name, code, parent_id, created_at, modified_at";

/// Downward closure: the start row plus every row whose parent is already in
/// the set. UNION (not UNION ALL) drops rows that are already present, so a
/// cycle stops expanding once every member has been seen.
const DESCENDANTS_SQL: &str = "\
WITH RECURSIVE subtree(id) AS (
    SELECT id FROM organizations WHERE id = ?
    UNION
    SELECT o.id
    FROM organizations o
    JOIN subtree s ON o.parent_id = s.id
)
SELECT o.id, o.name, o.code, o.parent_id, o.created_at, o.modified_at
FROM organizations o
JOIN subtree s ON s.id = o.id";

/// Upward closure: the start row plus the parent of every row in the set.
const ANCESTORS_SQL: &str = "\
WITH RECURSIVE lineage(id) AS (
    SELECT id FROM organizations WHERE id = ?
    UNION
    SELECT o.parent_id
    FROM organizations o
    JOIN lineage l ON o.id = l.id
    WHERE o.parent_id IS NOT NULL
)
SELECT o.id, o.name, o.code, o.parent_id, o.created_at, o.modified_at
FROM organizations o
JOIN lineage l ON l.id = o.id";

/// Database service for managing the libsql connection and schema
///
/// # Examples
///
/// ```no_run
/// use orgunits_core::db::DatabaseService;
/// use std::path::PathBuf;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let db_service = DatabaseService::new(PathBuf::from("/path/to/orgunits.db")).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseService {
    /// libsql database handle (wrapped in Arc for sharing)
    pub db: Arc<Database>,

    /// Path to the database file
    pub db_path: PathBuf,
}

/// Parameters for organization insertion and full update
pub struct DbOrganizationParams<'a> {
    pub name: &'a str,
    pub code: &'a str,
    pub parent_id: Option<i64>,
}

/// Parameters for a partial update; `None` leaves the column untouched
///
/// `parent_id` uses the double-Option convention: `Some(None)` detaches.
#[derive(Default)]
pub struct DbOrganizationPatch<'a> {
    pub name: Option<&'a str>,
    pub code: Option<&'a str>,
    pub parent_id: Option<Option<i64>>,
}

impl DatabaseService {
    /// Create a new DatabaseService with the specified database path
    ///
    /// This will:
    /// 1. Ensure the parent directory exists (create if needed)
    /// 2. Open/create the database file
    /// 3. Initialize the schema (CREATE TABLE IF NOT EXISTS)
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the directory cannot be created, the
    /// connection fails, or schema initialization fails.
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        let is_new_database = !db_path.exists();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::PermissionDenied {
                        DatabaseError::permission_denied(db_path.clone())
                    } else {
                        DatabaseError::DirectoryCreationFailed(e)
                    }
                })?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
        };

        service.initialize_schema(is_new_database).await?;

        tracing::info!(path = %service.db_path.display(), "database ready");

        Ok(service)
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements return rows, so we must use query() instead of execute().
    async fn execute_pragma(
        &self,
        conn: &libsql::Connection,
        pragma: &str,
    ) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Initialize database schema and configuration
    ///
    /// Idempotent: safe to call against an existing database.
    ///
    /// # Schema
    ///
    /// - `organizations` table with a self-referential `parent_id`
    ///   (`ON DELETE RESTRICT`) and a UNIQUE `code`
    /// - Indexes on `parent_id` (child lookups in the recursive step) and `name`
    async fn initialize_schema(&self, is_new_database: bool) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS organizations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                code TEXT NOT NULL UNIQUE,
                parent_id INTEGER,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                modified_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                -- A referenced parent can never be removed out from under its children
                FOREIGN KEY (parent_id) REFERENCES organizations(id) ON DELETE RESTRICT
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!(
                "Failed to create organizations table: {}",
                e
            ))
        })?;

        self.create_core_indexes(&conn).await?;

        if is_new_database {
            self.execute_pragma(&conn, "PRAGMA wal_checkpoint(TRUNCATE)")
                .await?;
        }

        Ok(())
    }

    async fn create_core_indexes(&self, conn: &libsql::Connection) -> Result<(), DatabaseError> {
        // Index on parent_id (recursive step of the descendant closure)
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_organizations_parent ON organizations(parent_id)",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!(
                "Failed to create index 'idx_organizations_parent': {}",
                e
            ))
        })?;

        // Index on name (default list ordering)
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_organizations_name ON organizations(name)",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!(
                "Failed to create index 'idx_organizations_name': {}",
                e
            ))
        })?;

        Ok(())
    }

    /// Get a raw connection to the database
    ///
    /// **WARNING**: Foreign keys and busy timeout are NOT configured on this
    /// connection. Use `connect_with_timeout()` for anything that writes.
    pub fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        self.db.connect().map_err(DatabaseError::LibsqlError)
    }

    /// Get an async connection with busy timeout and foreign keys configured
    ///
    /// **RECOMMENDED** for all async call sites.
    pub async fn connect_with_timeout(&self) -> Result<libsql::Connection, DatabaseError> {
        let conn = self.connect()?;

        self.execute_pragma(&conn, "PRAGMA busy_timeout = 5000")
            .await?;
        self.execute_pragma(&conn, "PRAGMA foreign_keys = ON")
            .await?;

        Ok(conn)
    }

    //
    // ORGANIZATION STORE OPERATIONS
    // Raw SQL wrapped by the OrganizationStore implementation in turso_store.rs.
    //

    /// Insert an organization and return its generated id
    ///
    /// UNIQUE(code) and the parent foreign key are enforced by SQLite; their
    /// failures come back as `DatabaseError::ConstraintViolation`.
    pub async fn db_create_organization(
        &self,
        params: DbOrganizationParams<'_>,
    ) -> Result<i64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute(
            "INSERT INTO organizations (name, code, parent_id) VALUES (?, ?, ?)",
            (params.name, params.code, params.parent_id),
        )
        .await
        .map_err(|e| DatabaseError::from_write("Failed to insert organization", e))?;

        Ok(conn.last_insert_rowid())
    }

    /// Fetch one organization row by id
    ///
    /// * `Ok(Some(row))` - found
    /// * `Ok(None)` - no such id
    pub async fn db_get_organization(&self, id: i64) -> Result<Option<libsql::Row>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM organizations WHERE id = ?",
                ORGANIZATION_COLUMNS
            ))
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!(
                    "Failed to prepare get_organization query: {}",
                    e
                ))
            })?;

        let mut rows = stmt.query([id]).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute get_organization query: {}", e))
        })?;

        rows.next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))
    }

    /// Fetch one organization row by its unique code
    pub async fn db_get_organization_by_code(
        &self,
        code: &str,
    ) -> Result<Option<libsql::Row>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM organizations WHERE code = ?",
                ORGANIZATION_COLUMNS
            ))
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!(
                    "Failed to prepare get_organization_by_code query: {}",
                    e
                ))
            })?;

        let mut rows = stmt.query([code]).await.map_err(|e| {
            DatabaseError::sql_execution(format!(
                "Failed to execute get_organization_by_code query: {}",
                e
            ))
        })?;

        rows.next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))
    }

    /// Overwrite name, code and parent of an organization
    ///
    /// Returns the number of rows affected (0 = no such id).
    pub async fn db_update_organization(
        &self,
        id: i64,
        params: DbOrganizationParams<'_>,
    ) -> Result<u64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute(
            "UPDATE organizations
             SET name = ?, code = ?, parent_id = ?, modified_at = CURRENT_TIMESTAMP
             WHERE id = ?",
            (params.name, params.code, params.parent_id, id),
        )
        .await
        .map_err(|e| DatabaseError::from_write("Failed to update organization", e))
    }

    /// Apply a partial update in a single statement
    ///
    /// Unchanged columns are taken from the row as it is when the write lock
    /// is held, so concurrent patches to different fields never overwrite
    /// each other. Returns the number of rows affected (0 = no such id).
    pub async fn db_patch_organization(
        &self,
        id: i64,
        patch: DbOrganizationPatch<'_>,
    ) -> Result<u64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute(
            "UPDATE organizations
             SET name = COALESCE(?1, name),
                 code = COALESCE(?2, code),
                 parent_id = CASE WHEN ?3 THEN ?4 ELSE parent_id END,
                 modified_at = CURRENT_TIMESTAMP
             WHERE id = ?5",
            (
                patch.name,
                patch.code,
                patch.parent_id.is_some() as i64,
                patch.parent_id.flatten(),
                id,
            ),
        )
        .await
        .map_err(|e| DatabaseError::from_write("Failed to patch organization", e))
    }

    /// Delete an organization by id
    ///
    /// Returns rows affected (0 = didn't exist). Deleting a node that is still
    /// somebody's parent fails with a FOREIGN KEY constraint violation. A
    /// self reference does not count.
    pub async fn db_delete_organization(&self, id: i64) -> Result<u64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;
        let tx = conn.transaction().await?;

        tx.execute(
            "UPDATE organizations SET parent_id = NULL WHERE id = ?1 AND parent_id = ?1",
            [id],
        )
        .await
        .map_err(|e| DatabaseError::from_write("Failed to clear self reference", e))?;

        let deleted = match tx
            .execute("DELETE FROM organizations WHERE id = ?", [id])
            .await
        {
            Ok(deleted) => deleted,
            Err(e) => {
                tx.rollback().await?;
                return Err(DatabaseError::from_write("Failed to delete organization", e));
            }
        };

        tx.commit().await?;
        Ok(deleted)
    }

    /// All organizations ordered by name (ties broken by id)
    pub async fn db_list_organizations(&self) -> Result<libsql::Rows, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM organizations ORDER BY name ASC, id ASC",
                ORGANIZATION_COLUMNS
            ))
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!(
                    "Failed to prepare list_organizations query: {}",
                    e
                ))
            })?;

        stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!(
                "Failed to execute list_organizations query: {}",
                e
            ))
        })
    }

    /// Number of direct children of `id`
    pub async fn db_count_children(&self, id: i64) -> Result<u64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut rows = conn
            .query(
                "SELECT COUNT(*) FROM organizations WHERE parent_id = ?",
                [id],
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to count children: {}", e))
            })?;

        let count: i64 = match rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
        {
            Some(row) => row.get(0)?,
            None => 0,
        };

        Ok(count.max(0) as u64)
    }

    /// Inclusive closure of `id` in `direction`, as full rows, in one statement
    ///
    /// An unknown `id` produces no rows. Row order is unspecified.
    pub async fn db_tree_closure(
        &self,
        id: i64,
        direction: TraversalDirection,
    ) -> Result<libsql::Rows, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let sql = match direction {
            TraversalDirection::Upward => ANCESTORS_SQL,
            TraversalDirection::Downward => DESCENDANTS_SQL,
        };

        let mut stmt = conn.prepare(sql).await.map_err(|e| {
            DatabaseError::sql_execution(format!(
                "Failed to prepare {:?} closure query: {}",
                direction, e
            ))
        })?;

        stmt.query([id]).await.map_err(|e| {
            DatabaseError::sql_execution(format!(
                "Failed to execute {:?} closure query: {}",
                direction, e
            ))
        })
    }

    /// Checkpoint the WAL so all writes are flushed before shutdown
    pub async fn db_close(&self) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;
        self.execute_pragma(&conn, "PRAGMA wal_checkpoint(TRUNCATE)")
            .await?;
        Ok(())
    }
}
