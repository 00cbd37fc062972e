use std::env;

/// AppConfig
///
/// Holds the service's entire configuration state. Loaded once at startup and shared
/// read-only through the application state (pulled into handlers via `FromRef`).
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Postgres connection string. `None` in local runs selects the in-memory catalog store.
    pub db_url: Option<String>,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Base URL of the Supabase project (identity provider and storage gateway).
    pub supabase_url: String,
    // Public anon key sent as the `apikey` header to the identity provider.
    pub supabase_anon_key: String,
    // S3-compatible storage endpoint URL (MinIO in local, Supabase Storage in prod).
    pub s3_endpoint: String,
    pub s3_region: String,
    pub s3_key: String,
    pub s3_secret: String,
    // Bucket holding category image assets.
    pub s3_bucket: String,
    // Runtime environment marker.
    pub env: Env,
    // Secret used to validate incoming Supabase access tokens.
    pub jwt_secret: String,
}

/// Env
///
/// Runtime context. Switches between local development conveniences (in-memory store,
/// MinIO, pretty logs) and production infrastructure (Postgres, Supabase, JSON logs).
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe, non-panicking values for test scaffolding.
    fn default() -> Self {
        Self {
            db_url: None,
            bind_addr: "127.0.0.1:3000".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            s3_endpoint: "http://localhost:9000".to_string(),
            s3_region: "us-east-1".to_string(),
            s3_key: "admin".to_string(),
            s3_secret: "password".to_string(),
            s3_bucket: "catalog-test".to_string(),
            env: Env::Local,
            jwt_secret: "super-secure-test-secret-value-local".to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// Panics in `Env::Production` when a required secret is missing, so the service
    /// never starts with an incomplete configuration.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        match env {
            Env::Local => Self {
                env: Env::Local,
                db_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
                bind_addr,
                supabase_url: env::var("SUPABASE_URL")
                    .unwrap_or_else(|_| "http://localhost:54321".to_string()),
                supabase_anon_key: env::var("SUPABASE_ANON_KEY").unwrap_or_default(),
                // Local storage (MinIO) uses known default credentials.
                s3_endpoint: "http://localhost:9000".to_string(),
                s3_region: "us-east-1".to_string(),
                s3_key: "admin".to_string(),
                s3_secret: "password".to_string(),
                s3_bucket: "catalog-images".to_string(),
                jwt_secret: env::var("SUPABASE_JWT_SECRET")
                    .unwrap_or_else(|_| "super-secure-test-secret-value-local".to_string()),
            },
            Env::Production => {
                let supabase_url =
                    env::var("SUPABASE_URL").expect("FATAL: SUPABASE_URL required in prod");
                // Supabase exposes its S3-compatible gateway under the project URL.
                let s3_endpoint = format!("{}/storage/v1/s3", supabase_url);

                Self {
                    env: Env::Production,
                    db_url: Some(
                        env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in prod"),
                    ),
                    bind_addr,
                    supabase_anon_key: env::var("SUPABASE_ANON_KEY")
                        .expect("FATAL: SUPABASE_ANON_KEY required in prod"),
                    supabase_url,
                    s3_endpoint,
                    s3_region: "stub".to_string(),
                    s3_key: env::var("S3_ACCESS_KEY")
                        .expect("FATAL: S3_ACCESS_KEY required in prod"),
                    s3_secret: env::var("S3_SECRET_KEY")
                        .expect("FATAL: S3_SECRET_KEY required in prod"),
                    s3_bucket: env::var("S3_BUCKET_NAME")
                        .unwrap_or_else(|_| "catalog-images".to_string()),
                    jwt_secret: env::var("SUPABASE_JWT_SECRET")
                        .expect("FATAL: SUPABASE_JWT_SECRET must be set in production."),
                }
            }
        }
    }
}
