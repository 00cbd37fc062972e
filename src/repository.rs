use crate::error::RepositoryError;
use crate::models::{Category, CategoryPayload, CategoryRecord};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Repository Trait
///
/// Contract of the catalog store. Handlers only see this trait, so the Postgres store
/// and the in-memory store are interchangeable (and mockable in tests).
///
/// Store rules shared by every implementation:
/// - `id` and `created_at` are assigned here and never change.
/// - `parent_id` must name an existing category other than the category itself or one
///   of its descendants.
/// - Deleting a category detaches its children (`parent_id` becomes null).
#[async_trait]
pub trait Repository: Send + Sync {
    /// All categories, ordered by id.
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;
    async fn get_category(&self, id: i64) -> Result<Option<Category>, RepositoryError>;
    async fn create_category(&self, req: CategoryPayload) -> Result<Category, RepositoryError>;
    async fn update_category(
        &self,
        id: i64,
        req: CategoryPayload,
    ) -> Result<Category, RepositoryError>;
    /// Returns false when no category had this id.
    async fn delete_category(&self, id: i64) -> Result<bool, RepositoryError>;
}

/// RepositoryState
///
/// Shared handle to the catalog store held in the application state.
pub type RepositoryState = Arc<dyn Repository>;

const SELECT_COLUMNS: &str = "SELECT id, name, image, parent_id, created_at FROM categories";

/// PostgresRepository
///
/// `Repository` backed by the `categories` table.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded migrations in `migrations/`.
    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn exists(&self, id: i64) -> Result<bool, RepositoryError> {
        let found: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(found)
    }

    /// Rejects a parent that does not exist or that would close a cycle through `child`.
    async fn check_parent(&self, child: Option<i64>, parent: Option<i64>) -> Result<(), RepositoryError> {
        let Some(parent_id) = parent else {
            return Ok(());
        };
        if !self.exists(parent_id).await? {
            return Err(RepositoryError::InvalidParent(format!(
                "Parent category {} does not exist",
                parent_id
            )));
        }
        if let Some(child_id) = child {
            // Walks up from the proposed parent; meeting the child means a cycle.
            let cyclic: bool = sqlx::query_scalar(
                r#"WITH RECURSIVE ancestors AS (
                    SELECT id, parent_id FROM categories WHERE id = $1
                    UNION
                    SELECT c.id, c.parent_id FROM categories c
                    JOIN ancestors a ON c.id = a.parent_id
                )
                SELECT EXISTS(SELECT 1 FROM ancestors WHERE id = $2)"#,
            )
            .bind(parent_id)
            .bind(child_id)
            .fetch_one(&self.pool)
            .await?;
            if cyclic {
                return Err(RepositoryError::InvalidParent(format!(
                    "Category {} cannot be nested under {}",
                    child_id, parent_id
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRecord>(&format!("{} ORDER BY id", SELECT_COLUMNS))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn get_category(&self, id: i64) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRecord>(&format!("{} WHERE id = $1", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Category::from))
    }

    async fn create_category(&self, req: CategoryPayload) -> Result<Category, RepositoryError> {
        self.check_parent(None, req.parent_id).await?;
        let row = sqlx::query_as::<_, CategoryRecord>(
            "INSERT INTO categories (name, image, parent_id) VALUES ($1, $2, $3) \
             RETURNING id, name, image, parent_id, created_at",
        )
        .bind(&req.name)
        .bind(&req.image)
        .bind(req.parent_id)
        .fetch_one(&self.pool)
        .await?;
        tracing::info!(category_id = row.id, "category created");
        Ok(row.into())
    }

    async fn update_category(
        &self,
        id: i64,
        req: CategoryPayload,
    ) -> Result<Category, RepositoryError> {
        if !self.exists(id).await? {
            return Err(RepositoryError::NotFound(id));
        }
        self.check_parent(Some(id), req.parent_id).await?;
        let row = sqlx::query_as::<_, CategoryRecord>(
            "UPDATE categories SET name = $1, image = $2, parent_id = $3 WHERE id = $4 \
             RETURNING id, name, image, parent_id, created_at",
        )
        .bind(&req.name)
        .bind(&req.image)
        .bind(req.parent_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Category::from).ok_or(RepositoryError::NotFound(id))
    }

    async fn delete_category(&self, id: i64) -> Result<bool, RepositoryError> {
        // Children are detached by the ON DELETE SET NULL foreign key.
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// InMemoryRepository
///
/// `Repository` kept in process memory. Used for local runs without `DATABASE_URL` and
/// as a faithful store in tests.
#[derive(Default)]
pub struct InMemoryRepository {
    inner: RwLock<MemoryStore>,
}

#[derive(Default)]
struct MemoryStore {
    next_id: i64,
    rows: BTreeMap<i64, CategoryRecord>,
}

impl MemoryStore {
    fn check_parent(&self, child: Option<i64>, parent: Option<i64>) -> Result<(), RepositoryError> {
        let Some(parent_id) = parent else {
            return Ok(());
        };
        if !self.rows.contains_key(&parent_id) {
            return Err(RepositoryError::InvalidParent(format!(
                "Parent category {} does not exist",
                parent_id
            )));
        }
        let Some(child_id) = child else {
            return Ok(());
        };
        let mut cursor = Some(parent_id);
        // Bounded by the row count so a corrupted chain cannot loop forever.
        for _ in 0..=self.rows.len() {
            match cursor {
                Some(id) if id == child_id => {
                    return Err(RepositoryError::InvalidParent(format!(
                        "Category {} cannot be nested under {}",
                        child_id, parent_id
                    )));
                }
                Some(id) => cursor = self.rows.get(&id).and_then(|row| row.parent_id),
                None => break,
            }
        }
        Ok(())
    }
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store pre-populated with `categories`. Ids are assigned from 1 in order.
    pub fn with_categories(categories: Vec<CategoryPayload>) -> Self {
        let mut store = MemoryStore::default();
        for payload in categories {
            store.next_id += 1;
            let id = store.next_id;
            store.rows.insert(
                id,
                CategoryRecord {
                    id,
                    name: payload.name,
                    image: payload.image,
                    parent_id: payload.parent_id,
                    created_at: Utc::now(),
                },
            );
        }
        Self {
            inner: RwLock::new(store),
        }
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let store = self.inner.read().await;
        Ok(store.rows.values().cloned().map(Category::from).collect())
    }

    async fn get_category(&self, id: i64) -> Result<Option<Category>, RepositoryError> {
        let store = self.inner.read().await;
        Ok(store.rows.get(&id).cloned().map(Category::from))
    }

    async fn create_category(&self, req: CategoryPayload) -> Result<Category, RepositoryError> {
        let mut store = self.inner.write().await;
        store.check_parent(None, req.parent_id)?;
        store.next_id += 1;
        let record = CategoryRecord {
            id: store.next_id,
            name: req.name,
            image: req.image,
            parent_id: req.parent_id,
            created_at: Utc::now(),
        };
        store.rows.insert(record.id, record.clone());
        Ok(record.into())
    }

    async fn update_category(
        &self,
        id: i64,
        req: CategoryPayload,
    ) -> Result<Category, RepositoryError> {
        let mut store = self.inner.write().await;
        if !store.rows.contains_key(&id) {
            return Err(RepositoryError::NotFound(id));
        }
        store.check_parent(Some(id), req.parent_id)?;
        let row = store
            .rows
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound(id))?;
        row.name = req.name;
        row.image = req.image;
        row.parent_id = req.parent_id;
        Ok(row.clone().into())
    }

    async fn delete_category(&self, id: i64) -> Result<bool, RepositoryError> {
        let mut store = self.inner.write().await;
        if store.rows.remove(&id).is_none() {
            return Ok(false);
        }
        for row in store.rows.values_mut() {
            if row.parent_id == Some(id) {
                row.parent_id = None;
            }
        }
        Ok(true)
    }
}
