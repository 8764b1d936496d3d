//! 仓库层
//!
//! 所有 SQL 集中在这里。函数返回 [`RepoError`]，handler 层根据
//! 上下文转换为 HTTP 错误（同一个 Duplicate 在不同接口可能是不同文案）。

pub mod member;
pub mod planned;
pub mod restaurant;
pub mod schedule;

use crate::utils::AppError;

/// `IN (?, ?, ...)` 占位符拼接
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// 仓库层错误
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("duplicate: {0}")]
    Duplicate(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("database: {0}")]
    Database(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

impl From<sqlx::Error> for RepoError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e
            && db_err.is_unique_violation()
        {
            return RepoError::Duplicate(db_err.message().to_string());
        }
        RepoError::Database(e.to_string())
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound(msg) => AppError::not_found(msg),
            RepoError::Duplicate(msg) => AppError::conflict(msg),
            RepoError::Validation(msg) => AppError::validation(msg),
            RepoError::Database(msg) => AppError::database(msg),
        }
    }
}
