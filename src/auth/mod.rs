//! 认证模块
//!
//! - [`jwt`] - 令牌签发与校验
//! - [`extractor`] - 请求级身份提取

pub mod extractor;
pub mod jwt;

pub use extractor::CurrentUser;
pub use jwt::{JwtConfig, JwtService};
