//! 成员仓库

use std::collections::HashMap;

use sqlx::SqlitePool;

use crate::db::models::member::{Member, MemberProfile, MemberRef, NewMember};
use crate::utils::ids::{now_millis, snowflake_id};

use super::{RepoError, RepoResult, placeholders};

const MEMBER_SELECT: &str = "SELECT id, name, nickname, email, password_hash, role, image_url, \
     created_at, updated_at FROM member";

const PROFILE_SELECT: &str =
    "SELECT id, name, nickname, email, role, image_url, created_at, updated_at FROM member";

// ── Queries ──────────────────────────────────────────────────────────

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<MemberProfile>> {
    let profiles = sqlx::query_as::<_, MemberProfile>(&format!("{PROFILE_SELECT} ORDER BY name"))
        .fetch_all(pool)
        .await?;
    Ok(profiles)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Member>> {
    let member = sqlx::query_as::<_, Member>(&format!("{MEMBER_SELECT} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(member)
}

pub async fn find_profile(pool: &SqlitePool, id: i64) -> RepoResult<Option<MemberProfile>> {
    let profile = sqlx::query_as::<_, MemberProfile>(&format!("{PROFILE_SELECT} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(profile)
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> RepoResult<Option<Member>> {
    let member = sqlx::query_as::<_, Member>(&format!("{MEMBER_SELECT} WHERE email = ?"))
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(member)
}

/// 按登录名精确查找（登录名是成员的规范标识）
pub async fn find_by_name(pool: &SqlitePool, name: &str) -> RepoResult<Option<Member>> {
    let member = sqlx::query_as::<_, Member>(&format!("{MEMBER_SELECT} WHERE name = ?"))
        .bind(name)
        .fetch_optional(pool)
        .await?;
    Ok(member)
}

/// 批量取成员引用，供其它仓库组装嵌套视图
pub(crate) async fn find_refs(
    pool: &SqlitePool,
    ids: &[i64],
) -> RepoResult<HashMap<i64, MemberRef>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let sql = format!(
        "SELECT id, name, nickname, image_url FROM member WHERE id IN ({})",
        placeholders(ids.len())
    );
    let mut query = sqlx::query_as::<_, MemberRef>(&sql);
    for id in ids {
        query = query.bind(id);
    }
    let refs = query.fetch_all(pool).await?;
    Ok(refs.into_iter().map(|m| (m.id, m)).collect())
}

// ── Mutations ────────────────────────────────────────────────────────

/// 注册新成员，角色固定为 `user`
///
/// 登录名或邮箱重复时返回 [`RepoError::Duplicate`]。
pub async fn create(pool: &SqlitePool, data: NewMember) -> RepoResult<MemberProfile> {
    let id = snowflake_id();
    let now = now_millis();

    sqlx::query(
        "INSERT INTO member (id, name, nickname, email, password_hash, role, image_url, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, 'user', ?, ?, ?)",
    )
    .bind(id)
    .bind(&data.name)
    .bind(&data.nickname)
    .bind(&data.email)
    .bind(&data.password_hash)
    .bind(&data.image_url)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find_profile(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("member missing after insert".to_string()))
}

/// 修改昵称/头像，None 保持原值
pub async fn update_profile(
    pool: &SqlitePool,
    id: i64,
    nickname: Option<&str>,
    image_url: Option<&str>,
) -> RepoResult<MemberProfile> {
    let rows = sqlx::query(
        "UPDATE member SET nickname = COALESCE(?, nickname), \
         image_url = COALESCE(?, image_url), updated_at = ? WHERE id = ?",
    )
    .bind(nickname)
    .bind(image_url)
    .bind(now_millis())
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("member {id}")));
    }

    find_profile(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("member {id}")))
}

/// 注销成员
///
/// 第一阶段在一个事务里拆掉所有引用（历史评分保留，成员引用置空），
/// 第二阶段单独删除成员行。外键约束保证顺序不能颠倒。
pub async fn delete_cascading(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE visit_participant SET member_id = NULL WHERE member_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE restaurant SET created_by = NULL WHERE created_by = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE planned_restaurant SET recommended_by = NULL WHERE recommended_by = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE schedule SET organizer_id = NULL WHERE organizer_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM schedule_participant WHERE member_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    // 留下的匿名评分继续计入均分，这里不触发重算
    let rows = sqlx::query("DELETE FROM member WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("member {id}")));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::testing::memory_pool;

    pub(crate) async fn seed_member(pool: &SqlitePool, name: &str, email: &str) -> MemberProfile {
        create(
            pool,
            NewMember {
                name: name.to_string(),
                nickname: String::new(),
                email: email.to_string(),
                password_hash: "$argon2id$test".to_string(),
                image_url: "/uploads/default-profile.jpg".to_string(),
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let pool = memory_pool().await;
        let profile = seed_member(&pool, "yuki", "yuki@example.com").await;

        assert_eq!(profile.role, "user");
        assert_eq!(profile.image_url, "/uploads/default-profile.jpg");

        let by_email = find_by_email(&pool, "yuki@example.com").await.unwrap();
        assert_eq!(by_email.unwrap().id, profile.id);

        let by_name = find_by_name(&pool, "yuki").await.unwrap();
        assert_eq!(by_name.unwrap().id, profile.id);

        assert!(find_by_name(&pool, "nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_and_email() {
        let pool = memory_pool().await;
        seed_member(&pool, "yuki", "yuki@example.com").await;

        let same_name = create(
            &pool,
            NewMember {
                name: "yuki".to_string(),
                nickname: String::new(),
                email: "other@example.com".to_string(),
                password_hash: "x".to_string(),
                image_url: "/uploads/default-profile.jpg".to_string(),
            },
        )
        .await;
        assert!(matches!(same_name, Err(RepoError::Duplicate(_))));

        let same_email = create(
            &pool,
            NewMember {
                name: "mei".to_string(),
                nickname: String::new(),
                email: "yuki@example.com".to_string(),
                password_hash: "x".to_string(),
                image_url: "/uploads/default-profile.jpg".to_string(),
            },
        )
        .await;
        assert!(matches!(same_email, Err(RepoError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_update_profile_keeps_unset_fields() {
        let pool = memory_pool().await;
        let profile = seed_member(&pool, "yuki", "yuki@example.com").await;

        let updated = update_profile(&pool, profile.id, Some("ゆき"), None)
            .await
            .unwrap();
        assert_eq!(updated.nickname, "ゆき");
        assert_eq!(updated.image_url, profile.image_url);

        let updated = update_profile(&pool, profile.id, None, Some("/uploads/abc.jpg"))
            .await
            .unwrap();
        assert_eq!(updated.nickname, "ゆき");
        assert_eq!(updated.image_url, "/uploads/abc.jpg");
    }

    #[tokio::test]
    async fn test_delete_then_gone() {
        let pool = memory_pool().await;
        let profile = seed_member(&pool, "yuki", "yuki@example.com").await;

        delete_cascading(&pool, profile.id).await.unwrap();
        assert!(find_by_id(&pool, profile.id).await.unwrap().is_none());

        let again = delete_cascading(&pool, profile.id).await;
        assert!(matches!(again, Err(RepoError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_find_all_sorted_by_name() {
        let pool = memory_pool().await;
        seed_member(&pool, "yuki", "yuki@example.com").await;
        seed_member(&pool, "akira", "akira@example.com").await;

        let all = find_all(&pool).await.unwrap();
        let names: Vec<_> = all.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["akira", "yuki"]);
    }
}
