//! 时间解析与格式化
//!
//! 约定：
//! - 访问日期使用 `YYYY-MM-DD` 字符串，不携带时区
//! - 时间戳使用 Unix 毫秒，传输层使用 RFC 3339

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use super::error::AppError;
use super::result::AppResult;

/// 解析 `YYYY-MM-DD` 日期
pub fn parse_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        AppError::validation(format!("invalid date '{value}', expected YYYY-MM-DD"))
    })
}

/// 解析 RFC 3339 时间戳为 Unix 毫秒
pub fn parse_rfc3339_millis(value: &str) -> AppResult<i64> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.timestamp_millis())
        .map_err(|_| {
            AppError::validation(format!("invalid timestamp '{value}', expected RFC 3339"))
        })
}

/// Unix 毫秒转 RFC 3339（UTC，毫秒精度）
pub fn format_millis_rfc3339(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}
