//! Database module - AppState and database operations
//!
//! Split into submodules per domain:
//! - `pengguna` - user accounts
//! - `profil` - profiles (with a read-through cache)
//! - `template` - letter templates
//! - `surat` - submissions, transitions and the activity log
//! - `pengaturan` - village settings singleton

mod pengaturan;
mod pengguna;
mod profil;
mod surat;
mod template;

use dotenvy::dotenv;
use moka::future::Cache;
use sqlx::PgPool;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Fixed id of the settings singleton row. Upserting against this constant
/// closes the find-then-upsert race.
pub const PENGATURAN_DESA_ID: Uuid = Uuid::nil();

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub http_client: reqwest::Client,
    pub storage: Arc<dyn crate::storage::ObjectStorage + Send + Sync>,
    pub profil_cache: Cache<Uuid, crate::profil::Profil>,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenv().ok();
        let supabase_config =
            crate::storage::SupabaseConfig::from_env().map_err(anyhow::Error::msg)?;
        Self::new_with_config(supabase_config).await
    }

    pub async fn new_with_config(
        supabase_config: crate::storage::SupabaseConfig,
    ) -> anyhow::Result<Self> {
        dotenv().ok();
        let database_url = env::var("DATABASE_URL")?;

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(100)
            .min_connections(10)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(900))
            .max_lifetime(Duration::from_secs(1800))
            .connect(&database_url)
            .await?;

        let http_client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(900))
            .user_agent("desa-surat-server/0.3")
            .build()?;

        let storage = Arc::new(crate::storage::SupabaseStorage::new(
            supabase_config,
            http_client.clone(),
        ));

        Ok(Self::assemble(pool, http_client, storage))
    }

    pub fn new_with_pool_and_storage(
        pool: PgPool,
        storage: Arc<dyn crate::storage::ObjectStorage + Send + Sync>,
    ) -> Self {
        let http_client = reqwest::Client::new();
        Self::assemble(pool, http_client, storage)
    }

    fn assemble(
        pool: PgPool,
        http_client: reqwest::Client,
        storage: Arc<dyn crate::storage::ObjectStorage + Send + Sync>,
    ) -> Self {
        let profil_cache = Cache::builder()
            .time_to_live(Duration::from_secs(10 * 60))
            .max_capacity(1000)
            .build();

        AppState {
            pool,
            http_client,
            storage,
            profil_cache,
        }
    }
}
