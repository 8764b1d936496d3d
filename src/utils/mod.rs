//! 通用工具模块

pub mod error;
pub mod ids;
pub mod logger;
pub mod result;
pub mod time;
pub mod validation;

pub use error::AppError;
pub use result::AppResult;
