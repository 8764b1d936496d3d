//! Server configuration
//!
//! All settings come from environment variables with sensible
//! development defaults. Production deployments must provide
//! `JWT_SECRET` explicitly.

use std::path::{Path, PathBuf};

use crate::auth::jwt::JwtConfig;
use crate::utils::AppResult;

const DEFAULT_WORK_DIR: &str = "/var/lib/ramen-road";
const DEFAULT_HTTP_PORT: u16 = 3000;
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录（数据库、上传文件、日志都在这里）
    pub work_dir: PathBuf,
    /// HTTP listen port
    pub http_port: u16,
    /// SQLite database file path
    pub database_path: PathBuf,
    /// Allowed CORS origin for the web frontend
    pub cors_origin: String,
    /// `development` or `production`
    pub environment: String,
    /// Token signing configuration
    pub jwt: JwtConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        let environment =
            std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let work_dir = std::env::var("WORK_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_WORK_DIR));

        let http_port = std::env::var("HTTP_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_HTTP_PORT);

        let database_path = std::env::var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| work_dir.join("database").join("ramen.db"));

        let cors_origin =
            std::env::var("CORS_ORIGIN").unwrap_or_else(|_| DEFAULT_CORS_ORIGIN.to_string());

        let jwt = JwtConfig::from_env(environment == "production")?;

        Ok(Self {
            work_dir,
            http_port,
            database_path,
            cors_origin,
            environment,
            jwt,
        })
    }

    /// Build a config rooted at an explicit work dir, for tests
    pub fn with_overrides(work_dir: impl Into<PathBuf>, http_port: u16) -> Self {
        let work_dir = work_dir.into();
        Self {
            database_path: work_dir.join("database").join("ramen.db"),
            work_dir,
            http_port,
            cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
            environment: "development".to_string(),
            jwt: JwtConfig::for_testing(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.work_dir.join("uploads")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.work_dir.join("logs")
    }

    /// Create the work dir layout if missing
    ///
    /// ```text
    /// work_dir/
    /// ├── database/
    /// ├── uploads/
    /// └── logs/
    /// ```
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.work_dir)?;
        if let Some(parent) = self.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::create_dir_all(self.uploads_dir())?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }

    pub fn database_url(&self) -> String {
        format!("sqlite:{}", self.database_path.display())
    }

    pub fn http_addr(&self) -> String {
        format!("0.0.0.0:{}", self.http_port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::with_overrides(Path::new(DEFAULT_WORK_DIR), DEFAULT_HTTP_PORT)
    }
}
