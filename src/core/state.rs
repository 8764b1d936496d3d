//! 共享运行时状态

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::info;

use crate::auth::JwtService;
use crate::core::config::Config;
use crate::db;
use crate::services::ImageStore;
use crate::utils::{AppError, AppResult};

/// 每个请求 handler 都能拿到的共享状态
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub pool: SqlitePool,
    pub jwt_service: Arc<JwtService>,
    pub images: ImageStore,
}

impl ServerState {
    /// 建目录、连数据库、生成默认图片，失败直接让启动失败
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        config
            .ensure_work_dir_structure()
            .map_err(|e| AppError::internal(format!("failed to create work dir: {e}")))?;

        let pool = db::connect(&config.database_path).await?;
        info!("database ready at {}", config.database_path.display());

        let images = ImageStore::new(config.uploads_dir());
        images.ensure_defaults().await?;

        let jwt_service = Arc::new(JwtService::new(&config.jwt));

        Ok(Self {
            config: config.clone(),
            pool,
            jwt_service,
            images,
        })
    }
}
