//! 成员数据模型

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::Serialize;
use sqlx::FromRow;

use crate::utils::{AppError, AppResult};

/// 完整成员行（含密码哈希，不对外序列化）
#[derive(Debug, Clone, FromRow)]
pub struct Member {
    pub id: i64,
    pub name: String,
    pub nickname: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub image_url: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Member {
    /// Argon2id 哈希，盐随机生成
    pub fn hash_password(password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::internal(format!("password hashing failed: {e}")))
    }

    pub fn verify_password(&self, password: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(&self.password_hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    pub fn profile(&self) -> MemberProfile {
        MemberProfile {
            id: self.id,
            name: self.name.clone(),
            nickname: self.nickname.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
            image_url: self.image_url.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// 对外公开的成员信息
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MemberProfile {
    pub id: i64,
    pub name: String,
    pub nickname: String,
    pub email: String,
    pub role: String,
    pub image_url: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// 嵌入其它资源的成员引用
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MemberRef {
    pub id: i64,
    pub name: String,
    pub nickname: String,
    pub image_url: String,
}

/// 注册写入数据
#[derive(Debug, Clone)]
pub struct NewMember {
    pub name: String,
    pub nickname: String,
    pub email: String,
    pub password_hash: String,
    pub image_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member_with_hash(hash: String) -> Member {
        Member {
            id: 1,
            name: "yuki".to_string(),
            nickname: "".to_string(),
            email: "yuki@example.com".to_string(),
            password_hash: hash,
            role: "user".to_string(),
            image_url: "/uploads/default-profile.jpg".to_string(),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_password_round_trip() {
        let hash = Member::hash_password("ramen-secret").unwrap();
        let member = member_with_hash(hash);
        assert!(member.verify_password("ramen-secret"));
        assert!(!member.verify_password("wrong"));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = Member::hash_password("same-input").unwrap();
        let b = Member::hash_password("same-input").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_corrupt_hash_never_verifies() {
        let member = member_with_hash("not-a-phc-string".to_string());
        assert!(!member.verify_password("anything"));
    }
}
