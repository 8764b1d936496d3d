//! 统一结果类型

use super::error::AppError;

/// 应用结果类型别名
pub type AppResult<T> = Result<T, AppError>;
