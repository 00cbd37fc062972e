use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Catalog Schemas ---

/// Category
///
/// A catalog category as it travels over the wire (`GET /api/categories`).
/// `created_at` is carried as an opaque timestamp string: the admin surface only displays it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Category {
    pub id: i64,
    pub name: String,
    // URI of the stored image asset. Ownership lives in object storage.
    pub image: String,
    // Self-referential link to the parent category.
    pub parent_id: Option<i64>,
    pub created_at: String,
}

/// CategoryRecord
///
/// Raw row of the `categories` table. Converted into `Category` before leaving the server.
#[derive(Debug, Clone, FromRow)]
pub struct CategoryRecord {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub parent_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<CategoryRecord> for Category {
    fn from(record: CategoryRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            image: record.image,
            parent_id: record.parent_id,
            created_at: record.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

// --- Request Payloads ---

/// CategoryPayload
///
/// Body for `POST /api/categories/new` and `POST /api/categories/edit/{id}`.
/// Edits replace every mutable field; `id` and `created_at` are never client-supplied.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CategoryPayload {
    #[schema(example = "Shoes")]
    pub name: String,
    #[schema(example = "https://cdn.example.com/categories/shoes.png")]
    pub image: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

impl CategoryPayload {
    /// Trims the name and rejects blank fields before the payload reaches the store.
    pub fn normalized(self) -> Result<Self, String> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err("Category name must not be empty".to_string());
        }
        let image = self.image.trim().to_string();
        if image.is_empty() {
            return Err("Category image must not be empty".to_string());
        }
        Ok(Self {
            name,
            image,
            parent_id: self.parent_id,
        })
    }
}

/// ImageUploadRequest
///
/// Input for requesting a short-lived upload URL for a category image.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct ImageUploadRequest {
    #[schema(example = "shoes.png")]
    pub filename: String,
    #[schema(example = "image/png")]
    pub file_type: String,
}

/// ImageUploadResponse
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct ImageUploadResponse {
    /// Time-limited URL for the PUT request.
    pub upload_url: String,
    /// Object key to store in `Category::image` once the upload completes.
    pub resource_key: String,
}

// --- Responses ---

/// DeletedResponse
///
/// Success body of `POST /api/categories/delete/{id}`. Carries no `error` field.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct DeletedResponse {
    pub deleted: i64,
}

/// ErrorBody
///
/// Shape of every failure body on the API: an object with an `error` field.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct ErrorBody {
    pub error: String,
}

/// DeleteOutcome
///
/// Client-side reading of a delete response. The server signals failure only through
/// an `error` field; `null`, `false`, `0` and `""` count as no error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Rejected(String),
}

impl DeleteOutcome {
    pub fn from_body(body: &serde_json::Value) -> Self {
        use serde_json::Value;

        match body.get("error") {
            None | Some(Value::Null) | Some(Value::Bool(false)) => DeleteOutcome::Deleted,
            Some(Value::Number(n)) if n.as_f64() == Some(0.0) => DeleteOutcome::Deleted,
            Some(Value::String(message)) if message.is_empty() => DeleteOutcome::Deleted,
            Some(Value::String(message)) => DeleteOutcome::Rejected(message.clone()),
            Some(other) => DeleteOutcome::Rejected(other.to_string()),
        }
    }
}

// --- Identity ---

/// SessionUser
///
/// The "current user" as reported by the identity provider (`GET /auth/v1/user`).
/// Only the fields the session guard needs are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SessionUser {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub confirmed_at: Option<String>,
}

impl SessionUser {
    /// A confirmed user has both an email and a confirmation timestamp.
    pub fn is_confirmed(&self) -> bool {
        let present = |field: &Option<String>| field.as_deref().is_some_and(|v| !v.is_empty());
        present(&self.email) && present(&self.confirmed_at)
    }
}
