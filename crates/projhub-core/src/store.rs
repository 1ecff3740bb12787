//! SQLite persistence
//!
//! Repository traits for identities, projects and tasks, plus the sqlx-backed
//! [`SqliteStore`] that implements all of them. The schema is created
//! idempotently when the store connects.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::str::FromStr;

use crate::config::DatabaseConfig;
use crate::{
    MemberRole, NewProject, NewTask, Project, ProjectChanges, ProjectMember, ProjhubError, Result,
    Task, TaskChanges, TaskPriority, TaskStatus, User,
};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS projects (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        description TEXT,
        github_repo TEXT,
        created_at TEXT NOT NULL,
        owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS project_members (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        role TEXT NOT NULL DEFAULT 'member',
        UNIQUE (project_id, user_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT,
        status TEXT NOT NULL DEFAULT 'todo',
        priority TEXT NOT NULL DEFAULT 'medium',
        project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        assignee_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_project_members_user ON project_members(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project_id)",
];

// ============================================================================
// Repository traits
// ============================================================================

/// Identity persistence
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new identity. Fails with `AlreadyExists` on a taken username.
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User>;

    /// Exact, case-sensitive username lookup
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Remove an identity; returns false when no row matched
    async fn delete_user(&self, id: i64) -> Result<bool>;
}

/// Project and membership persistence
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Create a project and record the owner as an admin member
    async fn create_project(&self, owner_id: i64, project: &NewProject) -> Result<Project>;

    async fn get_project(&self, id: i64) -> Result<Option<Project>>;

    /// Projects the user owns or is a member of, each listed once
    async fn list_projects_for_user(&self, user_id: i64) -> Result<Vec<Project>>;

    async fn update_project(&self, id: i64, changes: &ProjectChanges) -> Result<Option<Project>>;

    async fn delete_project(&self, id: i64) -> Result<bool>;

    async fn list_members(&self, project_id: i64) -> Result<Vec<ProjectMember>>;
}

/// Task persistence
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Create a task. Fails with `NotFound` when the project does not exist.
    async fn create_task(&self, project_id: i64, task: &NewTask) -> Result<Task>;

    async fn get_task(&self, id: i64) -> Result<Option<Task>>;

    async fn list_tasks_for_project(&self, project_id: i64) -> Result<Vec<Task>>;

    async fn update_task(&self, id: i64, changes: &TaskChanges) -> Result<Option<Task>>;

    async fn delete_task(&self, id: i64) -> Result<bool>;
}

/// Everything the HTTP layer needs from storage
#[async_trait]
pub trait Store: UserRepository + ProjectRepository + TaskRepository {
    /// Cheap round trip used by readiness checks
    async fn ping(&self) -> Result<()>;
}

// ============================================================================
// Rows
// ============================================================================

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ProjectRow {
    id: i64,
    name: String,
    description: Option<String>,
    github_repo: Option<String>,
    owner_id: i64,
    created_at: DateTime<Utc>,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Project {
            id: row.id,
            name: row.name,
            description: row.description,
            github_repo: row.github_repo,
            owner_id: row.owner_id,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct MemberRow {
    id: i64,
    project_id: i64,
    user_id: i64,
    role: String,
}

impl TryFrom<MemberRow> for ProjectMember {
    type Error = ProjhubError;

    fn try_from(row: MemberRow) -> Result<Self> {
        Ok(ProjectMember {
            id: row.id,
            project_id: row.project_id,
            user_id: row.user_id,
            role: MemberRole::from_str(&row.role)
                .map_err(|e| ProjhubError::DatabaseError(e.to_string()))?,
        })
    }
}

#[derive(Debug, FromRow)]
struct TaskRow {
    id: i64,
    title: String,
    description: Option<String>,
    status: String,
    priority: String,
    project_id: i64,
    assignee_id: Option<i64>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = ProjhubError;

    fn try_from(row: TaskRow) -> Result<Self> {
        // A row written by another tool may hold values outside the enum
        let status: TaskStatus = row
            .status
            .parse()
            .map_err(|e: ProjhubError| ProjhubError::DatabaseError(e.to_string()))?;
        let priority: TaskPriority = row
            .priority
            .parse()
            .map_err(|e: ProjhubError| ProjhubError::DatabaseError(e.to_string()))?;

        Ok(Task {
            id: row.id,
            title: row.title,
            description: row.description,
            status,
            priority,
            project_id: row.project_id,
            assignee_id: row.assignee_id,
            created_at: row.created_at,
        })
    }
}

const USER_COLUMNS: &str = "id, username, password_hash, created_at";
const PROJECT_COLUMNS: &str = "id, name, description, github_repo, owner_id, created_at";
const TASK_COLUMNS: &str =
    "id, title, description, status, priority, project_id, assignee_id, created_at";

fn database_error(action: &str, err: sqlx::Error) -> ProjhubError {
    ProjhubError::DatabaseError(format!("{action}: {err}"))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

// ============================================================================
// SqliteStore
// ============================================================================

/// SQLite store shared by all request handlers
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open the configured database, creating the file and schema if needed
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| ProjhubError::ConfigError(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(|e| database_error("SQLite connection failed", e))?;

        let store = Self::from_pool(pool);
        store.init_schema().await?;
        Ok(store)
    }

    /// Private in-memory database, used by tests and local experiments.
    ///
    /// Every SQLite memory connection is its own database, so the pool is
    /// pinned to a single connection that never expires.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| ProjhubError::ConfigError(e.to_string()))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| database_error("SQLite connection failed", e))?;

        let store = Self::from_pool(pool);
        store.init_schema().await?;
        Ok(store)
    }

    /// Create from an existing pool
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create tables and indexes that do not exist yet
    pub async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| database_error("Failed to create schema", e))?;
        }
        tracing::debug!("database schema ready");
        Ok(())
    }
}

#[async_trait]
impl UserRepository for SqliteStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User> {
        if self.find_user_by_username(username).await?.is_some() {
            return Err(ProjhubError::AlreadyExists(format!("user {username}")));
        }

        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, created_at) VALUES (?, ?, ?)",
        )
        .bind(username)
        .bind(password_hash)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // Two registrations can pass the lookup above concurrently
            if is_unique_violation(&e) {
                ProjhubError::AlreadyExists(format!("user {username}"))
            } else {
                database_error("Failed to create user", e)
            }
        })?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at,
        })
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("Failed to fetch user", e))?;

        Ok(row.map(User::from))
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("Failed to fetch user", e))?;

        Ok(row.map(User::from))
    }

    async fn delete_user(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| database_error("Failed to delete user", e))?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ProjectRepository for SqliteStore {
    async fn create_project(&self, owner_id: i64, project: &NewProject) -> Result<Project> {
        let created_at = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| database_error("Failed to begin transaction", e))?;

        let result = sqlx::query(
            "INSERT INTO projects (name, description, github_repo, created_at, owner_id) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.github_repo)
        .bind(created_at)
        .bind(owner_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                ProjhubError::NotFound(format!("user {owner_id}"))
            } else {
                database_error("Failed to create project", e)
            }
        })?;
        let project_id = result.last_insert_rowid();

        sqlx::query("INSERT INTO project_members (project_id, user_id, role) VALUES (?, ?, ?)")
            .bind(project_id)
            .bind(owner_id)
            .bind(MemberRole::Admin.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| database_error("Failed to add project member", e))?;

        tx.commit()
            .await
            .map_err(|e| database_error("Failed to commit project", e))?;

        Ok(Project {
            id: project_id,
            name: project.name.clone(),
            description: project.description.clone(),
            github_repo: project.github_repo.clone(),
            owner_id,
            created_at,
        })
    }

    async fn get_project(&self, id: i64) -> Result<Option<Project>> {
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("Failed to fetch project", e))?;

        Ok(row.map(Project::from))
    }

    async fn list_projects_for_user(&self, user_id: i64) -> Result<Vec<Project>> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT DISTINCT p.id, p.name, p.description, p.github_repo, p.owner_id, p.created_at
            FROM projects p
            LEFT JOIN project_members m ON m.project_id = p.id
            WHERE p.owner_id = ? OR m.user_id = ?
            ORDER BY p.id
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("Failed to list projects", e))?;

        Ok(rows.into_iter().map(Project::from).collect())
    }

    async fn update_project(&self, id: i64, changes: &ProjectChanges) -> Result<Option<Project>> {
        let result = sqlx::query(
            r#"
            UPDATE projects
            SET name = COALESCE(?, name),
                description = CASE WHEN ? THEN ? ELSE description END,
                github_repo = CASE WHEN ? THEN ? ELSE github_repo END
            WHERE id = ?
            "#,
        )
        .bind(&changes.name)
        .bind(changes.description.is_some())
        .bind(changes.description.clone().flatten())
        .bind(changes.github_repo.is_some())
        .bind(changes.github_repo.clone().flatten())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| database_error("Failed to update project", e))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_project(id).await
    }

    async fn delete_project(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| database_error("Failed to delete project", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_members(&self, project_id: i64) -> Result<Vec<ProjectMember>> {
        let rows = sqlx::query_as::<_, MemberRow>(
            "SELECT id, project_id, user_id, role FROM project_members WHERE project_id = ? ORDER BY id",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("Failed to list project members", e))?;

        rows.into_iter().map(ProjectMember::try_from).collect()
    }
}

#[async_trait]
impl TaskRepository for SqliteStore {
    async fn create_task(&self, project_id: i64, task: &NewTask) -> Result<Task> {
        if self.get_project(project_id).await?.is_none() {
            return Err(ProjhubError::NotFound(format!("Project {project_id}")));
        }

        let created_at = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO tasks (title, description, status, priority, project_id, assignee_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(project_id)
        .bind(task.assignee_id)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                ProjhubError::ValidationError("assignee does not exist".to_string())
            } else {
                database_error("Failed to create task", e)
            }
        })?;

        Ok(Task {
            id: result.last_insert_rowid(),
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            priority: task.priority,
            project_id,
            assignee_id: task.assignee_id,
            created_at,
        })
    }

    async fn get_task(&self, id: i64) -> Result<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("Failed to fetch task", e))?;

        row.map(Task::try_from).transpose()
    }

    async fn list_tasks_for_project(&self, project_id: i64) -> Result<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE project_id = ? ORDER BY id"
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("Failed to list tasks", e))?;

        rows.into_iter().map(Task::try_from).collect()
    }

    async fn update_task(&self, id: i64, changes: &TaskChanges) -> Result<Option<Task>> {
        let (set_assignee, assignee) = match changes.assignee_id {
            Some(value) => (true, value),
            None => (false, None),
        };

        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET title = COALESCE(?, title),
                description = COALESCE(?, description),
                status = COALESCE(?, status),
                priority = COALESCE(?, priority),
                assignee_id = CASE WHEN ? THEN ? ELSE assignee_id END
            WHERE id = ?
            "#,
        )
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(changes.status.map(|s| s.as_str()))
        .bind(changes.priority.map(|p| p.as_str()))
        .bind(set_assignee)
        .bind(assignee)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                ProjhubError::ValidationError("assignee does not exist".to_string())
            } else {
                database_error("Failed to update task", e)
            }
        })?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_task(id).await
    }

    async fn delete_task(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| database_error("Failed to delete task", e))?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| database_error("Database ping failed", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_user(username: &str) -> (SqliteStore, User) {
        let store = SqliteStore::in_memory().await.unwrap();
        let user = store.create_user(username, "digest").await.unwrap();
        (store, user)
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let (store, user) = store_with_user("alice").await;

        let by_name = store.find_user_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, user.id);
        assert_eq!(by_name.password_hash, "digest");

        let by_id = store.find_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "alice");

        assert!(store.find_user_by_id(user.id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let (store, _) = store_with_user("alice").await;

        let result = store.create_user("alice", "other").await;
        assert!(matches!(result, Err(ProjhubError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_username_is_case_sensitive() {
        let (store, _) = store_with_user("alice").await;

        assert!(store.create_user("Alice", "digest").await.is_ok());
        assert!(store.find_user_by_username("ALICE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_project_adds_admin_membership() {
        let (store, user) = store_with_user("owner").await;

        let project = store
            .create_project(
                user.id,
                &NewProject {
                    name: "Tracker".to_string(),
                    description: Some("Internal".to_string()),
                    github_repo: Some("rust-lang/rust".to_string()),
                },
            )
            .await
            .unwrap();

        let members = store.list_members(project.id).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].user_id, user.id);
        assert_eq!(members[0].role, MemberRole::Admin);

        // Owned and member at once must still be listed a single time
        let listed = store.list_projects_for_user(user.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Tracker");
    }

    #[tokio::test]
    async fn test_projects_not_visible_to_other_users() {
        let (store, owner) = store_with_user("owner").await;
        let other = store.create_user("other", "digest").await.unwrap();

        store
            .create_project(
                owner.id,
                &NewProject {
                    name: "Private".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(store.list_projects_for_user(other.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_project_keeps_unset_fields() {
        let (store, user) = store_with_user("owner").await;
        let project = store
            .create_project(
                user.id,
                &NewProject {
                    name: "Before".to_string(),
                    description: Some("kept".to_string()),
                    github_repo: None,
                },
            )
            .await
            .unwrap();

        let updated = store
            .update_project(
                project.id,
                &ProjectChanges {
                    name: Some("After".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.name, "After");
        assert_eq!(updated.description.as_deref(), Some("kept"));
        assert!(store
            .update_project(9999, &ProjectChanges::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_project_clears_optional_fields() {
        let (store, user) = store_with_user("owner").await;
        let project = store
            .create_project(
                user.id,
                &NewProject {
                    name: "Apollo".to_string(),
                    description: Some("Moon".to_string()),
                    github_repo: Some("nasa/apollo".to_string()),
                },
            )
            .await
            .unwrap();

        let updated = store
            .update_project(
                project.id,
                &ProjectChanges {
                    description: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.name, "Apollo");
        assert_eq!(updated.description, None);
        assert_eq!(updated.github_repo.as_deref(), Some("nasa/apollo"));

        let updated = store
            .update_project(
                project.id,
                &ProjectChanges {
                    description: Some(Some("Back".to_string())),
                    github_repo: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.description.as_deref(), Some("Back"));
        assert_eq!(updated.github_repo, None);
    }

    #[tokio::test]
    async fn test_task_lifecycle() {
        let (store, user) = store_with_user("owner").await;
        let project = store
            .create_project(
                user.id,
                &NewProject {
                    name: "P".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let task = store
            .create_task(
                project.id,
                &NewTask {
                    title: "Write docs".to_string(),
                    assignee_id: Some(user.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, TaskPriority::Medium);

        let updated = store
            .update_task(
                task.id,
                &TaskChanges {
                    status: Some(TaskStatus::Done),
                    assignee_id: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, TaskStatus::Done);
        assert_eq!(updated.title, "Write docs");
        assert_eq!(updated.assignee_id, None);

        let tasks = store.list_tasks_for_project(project.id).await.unwrap();
        assert_eq!(tasks.len(), 1);

        assert!(store.delete_task(task.id).await.unwrap());
        assert!(!store.delete_task(task.id).await.unwrap());
        assert!(store.get_task(task.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_task_for_missing_project() {
        let store = SqliteStore::in_memory().await.unwrap();

        let result = store
            .create_task(
                42,
                &NewTask {
                    title: "Orphan".to_string(),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(ProjhubError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_project_cascades_tasks() {
        let (store, user) = store_with_user("owner").await;
        let project = store
            .create_project(
                user.id,
                &NewProject {
                    name: "P".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let task = store
            .create_task(
                project.id,
                &NewTask {
                    title: "T".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(store.delete_project(project.id).await.unwrap());
        assert!(store.get_task(task.id).await.unwrap().is_none());
        assert!(store.list_members(project.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_user() {
        let (store, user) = store_with_user("gone").await;

        assert!(store.delete_user(user.id).await.unwrap());
        assert!(store.find_user_by_id(user.id).await.unwrap().is_none());
        assert!(!store.delete_user(user.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_ping() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.ping().await.unwrap();
    }
}
