use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::db::create_pool;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db_pool: Option<PgPool>,
}

impl AppState {
    pub fn build(config: AppConfig) -> Result<Self, sqlx::Error> {
        let db_pool = create_pool(&config)?;
        if db_pool.is_none() {
            tracing::warn!("SUPABASE_DB_URL / DATABASE_URL not set; database routes will fail");
        }
        Ok(Self {
            config: Arc::new(config),
            db_pool,
        })
    }
}
