use serde_json::Value;
use std::collections::HashSet;
use std::future::Future;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::{
    error::DirectoryError,
    gateway::GatewayState,
    models::{Category, DeleteOutcome},
};

/// decode_categories
///
/// Validates a `GET /api/categories` body: it must be a JSON array whose every element
/// has the Category shape. Any mismatch is a `DirectoryError::Decode`.
pub fn decode_categories(body: Value) -> Result<Vec<Category>, DirectoryError> {
    let Value::Array(items) = body else {
        return Err(DirectoryError::Decode(format!(
            "expected a JSON array of categories, got {}",
            json_kind(&body)
        )));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<Category>(item)
                .map_err(|e| DirectoryError::Decode(format!("category at index {}: {}", index, e)))
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// CategoryDirectory
///
/// Client-side copy of the category collection. The collection always equals the last
/// successful fetch minus every id the server acknowledged deleting.
///
/// Requests race freely against each other. A delete prunes the collection as it stands
/// when its response arrives, so concurrent successful deletes compose in any order.
/// Acknowledged ids are remembered, so a list response that was already in flight
/// cannot bring them back. Once the scope token is cancelled no response is applied
/// anymore.
pub struct CategoryDirectory {
    gateway: GatewayState,
    entries: RwLock<Collection>,
    last_error: RwLock<Option<DirectoryError>>,
    scope: CancellationToken,
}

#[derive(Default)]
struct Collection {
    categories: Vec<Category>,
    // Ids the server acknowledged deleting during this directory's lifetime.
    deleted: HashSet<i64>,
}

impl CategoryDirectory {
    pub fn new(gateway: GatewayState, scope: CancellationToken) -> Self {
        Self {
            gateway,
            entries: RwLock::new(Collection::default()),
            last_error: RwLock::new(None),
            scope,
        }
    }

    /// Current collection, in fetch order.
    pub async fn snapshot(&self) -> Vec<Category> {
        self.entries.read().await.categories.clone()
    }

    /// The most recent failure, cleared by the next successful load or delete.
    pub async fn last_error(&self) -> Option<DirectoryError> {
        self.last_error.read().await.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.scope.is_cancelled()
    }

    async fn scoped<T>(
        &self,
        request: impl Future<Output = Result<T, DirectoryError>>,
    ) -> Result<T, DirectoryError> {
        tokio::select! {
            biased;
            _ = self.scope.cancelled() => Err(DirectoryError::Cancelled),
            result = request => result,
        }
    }

    async fn record(&self, error: &DirectoryError) {
        *self.last_error.write().await = Some(error.clone());
    }

    /// load_all
    ///
    /// Fetches the whole collection and replaces the local copy, leaving out ids the
    /// server already acknowledged deleting. Failures fail closed:
    /// the collection is emptied and the error is recorded and returned.
    pub async fn load_all(&self) -> Result<usize, DirectoryError> {
        let fetched = self.scoped(self.gateway.list_categories()).await;
        let decoded = match fetched {
            Err(DirectoryError::Cancelled) => return Err(DirectoryError::Cancelled),
            other => other.and_then(decode_categories),
        };

        let mut entries = self.entries.write().await;
        if self.scope.is_cancelled() {
            return Err(DirectoryError::Cancelled);
        }

        match decoded {
            Ok(mut categories) => {
                categories.retain(|category| !entries.deleted.contains(&category.id));
                let count = categories.len();
                entries.categories = categories;
                drop(entries);
                *self.last_error.write().await = None;
                tracing::debug!(count, "category directory loaded");
                Ok(count)
            }
            Err(e) => {
                entries.categories.clear();
                drop(entries);
                tracing::warn!("loading categories failed: {}", e);
                self.record(&e).await;
                Err(e)
            }
        }
    }

    /// delete
    ///
    /// Asks the server to delete `id`. The entry is removed only after the server
    /// acknowledges; any failure leaves the collection untouched. Never retried.
    pub async fn delete(&self, id: i64) -> Result<(), DirectoryError> {
        let outcome = self
            .scoped(self.gateway.delete_category(id))
            .await
            .map(|body| DeleteOutcome::from_body(&body));

        match outcome {
            Ok(DeleteOutcome::Deleted) => {
                let mut entries = self.entries.write().await;
                if self.scope.is_cancelled() {
                    return Err(DirectoryError::Cancelled);
                }
                entries.categories.retain(|category| category.id != id);
                entries.deleted.insert(id);
                drop(entries);
                *self.last_error.write().await = None;
                tracing::info!(category_id = id, "category deleted");
                Ok(())
            }
            Ok(DeleteOutcome::Rejected(message)) => {
                tracing::error!(category_id = id, "delete rejected: {}", message);
                let error = DirectoryError::Server(message);
                self.record(&error).await;
                Err(error)
            }
            Err(DirectoryError::Cancelled) => Err(DirectoryError::Cancelled),
            Err(e) => {
                tracing::error!(category_id = id, "delete request failed: {}", e);
                self.record(&e).await;
                Err(e)
            }
        }
    }
}
