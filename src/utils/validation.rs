//! 输入验证
//!
//! 请求体字段的统一校验规则。所有函数返回 [`AppError::Validation`]，
//! 由上层转换为 400 响应。

use super::error::AppError;
use super::result::AppResult;

pub const MAX_NAME_LEN: usize = 200;
pub const MAX_LOCATION_LEN: usize = 300;
pub const MAX_NOTE_LEN: usize = 500;
pub const MAX_EMAIL_LEN: usize = 254;
pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_PASSWORD_LEN: usize = 128;
pub const MAX_URL_LEN: usize = 2048;
pub const MAX_TAG_LEN: usize = 50;
pub const MAX_TAGS: usize = 20;

/// 必填文本：非空白且长度受限
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> AppResult<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{field} cannot be empty")));
    }
    if trimmed.chars().count() > max_len {
        return Err(AppError::validation(format!(
            "{field} exceeds {max_len} characters"
        )));
    }
    Ok(())
}

/// 可选文本：存在时长度受限（允许空串）
pub fn validate_optional_text(value: Option<&str>, field: &str, max_len: usize) -> AppResult<()> {
    if let Some(text) = value
        && text.chars().count() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} exceeds {max_len} characters"
        )));
    }
    Ok(())
}

/// 评分必须落在 0.0 ~ 5.0 区间（NaN 一律拒绝）
pub fn validate_rating(rating: f64) -> AppResult<()> {
    if !(0.0..=5.0).contains(&rating) {
        return Err(AppError::validation(
            "rating must be between 0.0 and 5.0".to_string(),
        ));
    }
    Ok(())
}

/// 邮箱格式：仅做最小限度检查，真实性由登录流程验证
pub fn validate_email(email: &str) -> AppResult<()> {
    let trimmed = email.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_EMAIL_LEN {
        return Err(AppError::validation("invalid email address".to_string()));
    }
    let Some(at) = trimmed.find('@') else {
        return Err(AppError::validation("invalid email address".to_string()));
    };
    if at == 0 || at == trimmed.len() - 1 {
        return Err(AppError::validation("invalid email address".to_string()));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> AppResult<()> {
    let len = password.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        return Err(AppError::validation(format!(
            "password must be {MIN_PASSWORD_LEN} to {MAX_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_tags(tags: &[String]) -> AppResult<()> {
    if tags.len() > MAX_TAGS {
        return Err(AppError::validation(format!("at most {MAX_TAGS} tags")));
    }
    for tag in tags {
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            return Err(AppError::validation("tags cannot be empty".to_string()));
        }
        if trimmed.chars().count() > MAX_TAG_LEN {
            return Err(AppError::validation(format!(
                "tag exceeds {MAX_TAG_LEN} characters"
            )));
        }
    }
    Ok(())
}
