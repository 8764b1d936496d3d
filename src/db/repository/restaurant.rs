//! 餐厅与访问记录仓库
//!
//! 写入路径的约定：
//! - 回访按 (name, location) 精确匹配，只有名字相同视为另开新店，
//!   撞上 name 唯一索引时由约束报冲突
//! - 访问序号 = 已有访问数 + 1，只增不改
//! - 评分变更后全量重算访问均分和餐厅总均分（对所有非空评分求平均）

use std::collections::HashMap;

use sqlx::types::Json;
use sqlx::{SqlitePool, Transaction};

use crate::db::models::member::MemberRef;
use crate::db::models::restaurant::{
    ParticipantRow, RecordVisitData, RestaurantDetail, RestaurantMetadataChanges, RestaurantRow,
    VisitMemberView, VisitRow, VisitView,
};
use crate::ratings;
use crate::utils::ids::{now_millis, snowflake_id};

use super::{RepoError, RepoResult, member, placeholders};

const RESTAURANT_SELECT: &str = "SELECT id, name, location, banner_image_url, rating_average, \
     tags, last_visited_date, created_by, created_at, updated_at FROM restaurant";

const VISIT_SELECT: &str =
    "SELECT restaurant_id, visit_count, visit_date, rating_average FROM visit";

const PARTICIPANT_SELECT: &str =
    "SELECT vp.restaurant_id, vp.visit_count, vp.position, vp.member_id, vp.rating, vp.review, \
     m.name AS member_name, m.nickname AS member_nickname, m.image_url AS member_image_url \
     FROM visit_participant vp LEFT JOIN member m ON m.id = vp.member_id";

// ── Queries ──────────────────────────────────────────────────────────

pub async fn find_row(pool: &SqlitePool, id: i64) -> RepoResult<Option<RestaurantRow>> {
    let row = sqlx::query_as::<_, RestaurantRow>(&format!("{RESTAURANT_SELECT} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_visit(
    pool: &SqlitePool,
    restaurant_id: i64,
    visit_count: i64,
) -> RepoResult<Option<VisitRow>> {
    let row = sqlx::query_as::<_, VisitRow>(&format!(
        "{VISIT_SELECT} WHERE restaurant_id = ? AND visit_count = ?"
    ))
    .bind(restaurant_id)
    .bind(visit_count)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// 成员是否在该次访问的参与者名单里
pub async fn find_participant_position(
    pool: &SqlitePool,
    restaurant_id: i64,
    visit_count: i64,
    member_id: i64,
) -> RepoResult<Option<i64>> {
    let position = sqlx::query_scalar::<_, i64>(
        "SELECT position FROM visit_participant \
         WHERE restaurant_id = ? AND visit_count = ? AND member_id = ?",
    )
    .bind(restaurant_id)
    .bind(visit_count)
    .bind(member_id)
    .fetch_optional(pool)
    .await?;
    Ok(position)
}

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<RestaurantDetail>> {
    let restaurants =
        sqlx::query_as::<_, RestaurantRow>(&format!("{RESTAURANT_SELECT} ORDER BY name"))
            .fetch_all(pool)
            .await?;

    let visits =
        sqlx::query_as::<_, VisitRow>(&format!("{VISIT_SELECT} ORDER BY restaurant_id, visit_count"))
            .fetch_all(pool)
            .await?;

    let participants = sqlx::query_as::<_, ParticipantRow>(&format!(
        "{PARTICIPANT_SELECT} ORDER BY vp.restaurant_id, vp.visit_count, vp.position"
    ))
    .fetch_all(pool)
    .await?;

    let mut creator_ids: Vec<i64> = restaurants.iter().filter_map(|r| r.created_by).collect();
    creator_ids.sort_unstable();
    creator_ids.dedup();
    let creators = member::find_refs(pool, &creator_ids).await?;

    Ok(assemble(restaurants, visits, participants, creators))
}

pub async fn find_detail(pool: &SqlitePool, id: i64) -> RepoResult<Option<RestaurantDetail>> {
    let Some(row) = find_row(pool, id).await? else {
        return Ok(None);
    };

    let visits = sqlx::query_as::<_, VisitRow>(&format!(
        "{VISIT_SELECT} WHERE restaurant_id = ? ORDER BY visit_count"
    ))
    .bind(id)
    .fetch_all(pool)
    .await?;

    let participants = sqlx::query_as::<_, ParticipantRow>(&format!(
        "{PARTICIPANT_SELECT} WHERE vp.restaurant_id = ? ORDER BY vp.visit_count, vp.position"
    ))
    .bind(id)
    .fetch_all(pool)
    .await?;

    let creator_ids: Vec<i64> = row.created_by.into_iter().collect();
    let creators = member::find_refs(pool, &creator_ids).await?;

    Ok(assemble(vec![row], visits, participants, creators).pop())
}

fn assemble(
    restaurants: Vec<RestaurantRow>,
    visits: Vec<VisitRow>,
    participants: Vec<ParticipantRow>,
    creators: HashMap<i64, MemberRef>,
) -> Vec<RestaurantDetail> {
    let mut members_by_visit: HashMap<(i64, i64), Vec<VisitMemberView>> = HashMap::new();
    for p in participants {
        let member = p.member_ref();
        members_by_visit
            .entry((p.restaurant_id, p.visit_count))
            .or_default()
            .push(VisitMemberView {
                member,
                rating: p.rating,
                review_text: p.review,
            });
    }

    let mut visits_by_restaurant: HashMap<i64, Vec<VisitView>> = HashMap::new();
    for v in visits {
        let members = members_by_visit
            .remove(&(v.restaurant_id, v.visit_count))
            .unwrap_or_default();
        visits_by_restaurant
            .entry(v.restaurant_id)
            .or_default()
            .push(VisitView {
                visit_count: v.visit_count,
                visit_date: v.visit_date,
                rating_average: v.rating_average,
                members,
            });
    }

    restaurants
        .into_iter()
        .map(|r| RestaurantDetail {
            id: r.id,
            name: r.name,
            location: r.location,
            banner_image_url: r.banner_image_url,
            rating_average: r.rating_average,
            tags: r.tags.0,
            last_visited_date: r.last_visited_date,
            created_by: r.created_by.and_then(|id| creators.get(&id).cloned()),
            visits: visits_by_restaurant.remove(&r.id).unwrap_or_default(),
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
        .collect()
}

// ── Visit recording ──────────────────────────────────────────────────

/// 成员名解析为 id，整单校验：有一个不认识就拒绝整个请求
async fn resolve_member_ids(pool: &SqlitePool, names: &[String]) -> RepoResult<Vec<i64>> {
    let sql = format!(
        "SELECT id, name FROM member WHERE name IN ({})",
        placeholders(names.len())
    );
    let mut query = sqlx::query_as::<_, (i64, String)>(&sql);
    for name in names {
        query = query.bind(name);
    }
    let rows = query.fetch_all(pool).await?;

    let by_name: HashMap<&str, i64> = rows.iter().map(|(id, n)| (n.as_str(), *id)).collect();

    let missing: Vec<&str> = names
        .iter()
        .map(String::as_str)
        .filter(|n| !by_name.contains_key(n))
        .collect();
    if !missing.is_empty() {
        return Err(RepoError::Validation(format!(
            "unknown members: {}",
            missing.join(", ")
        )));
    }

    Ok(names.iter().map(|n| by_name[n.as_str()]).collect())
}

/// 记录一次访问
///
/// (name, location) 已存在则追加访问，否则建店并写入首次访问。
/// 返回的 bool 表示是否新建了餐厅。
pub async fn record_visit(
    pool: &SqlitePool,
    acting_member_id: i64,
    data: RecordVisitData,
) -> RepoResult<(RestaurantDetail, bool)> {
    // 名单去重，保留首次出现的顺序
    let mut names: Vec<String> = Vec::new();
    for raw in &data.member_names {
        let name = raw.trim().to_string();
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    if names.is_empty() {
        return Err(RepoError::Validation("members cannot be empty".to_string()));
    }

    let member_ids = resolve_member_ids(pool, &names).await?;

    let existing = sqlx::query_as::<_, RestaurantRow>(&format!(
        "{RESTAURANT_SELECT} WHERE name = ? AND location = ?"
    ))
    .bind(&data.name)
    .bind(&data.location)
    .fetch_optional(pool)
    .await?;

    let (restaurant_id, created) = match existing {
        Some(row) => {
            append_visit(pool, row.id, &data, &member_ids).await?;
            (row.id, false)
        }
        None => {
            let id = create_with_first_visit(pool, acting_member_id, &data, &member_ids).await?;
            (id, true)
        }
    };

    let detail = find_detail(pool, restaurant_id)
        .await?
        .ok_or_else(|| RepoError::Database("restaurant missing after write".to_string()))?;
    Ok((detail, created))
}

async fn append_visit(
    pool: &SqlitePool,
    restaurant_id: i64,
    data: &RecordVisitData,
    member_ids: &[i64],
) -> RepoResult<()> {
    let mut tx = pool.begin().await?;

    let previous: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM visit WHERE restaurant_id = ?")
        .bind(restaurant_id)
        .fetch_one(&mut *tx)
        .await?;
    let seq = previous + 1;

    sqlx::query(
        "INSERT INTO visit (restaurant_id, visit_count, visit_date, rating_average) \
         VALUES (?, ?, ?, 0)",
    )
    .bind(restaurant_id)
    .bind(seq)
    .bind(&data.visit_date)
    .execute(&mut *tx)
    .await?;

    insert_participants(&mut tx, restaurant_id, seq, member_ids).await?;

    sqlx::query(
        "UPDATE restaurant SET tags = ?, last_visited_date = ?, \
         banner_image_url = COALESCE(?, banner_image_url), updated_at = ? WHERE id = ?",
    )
    .bind(Json(&data.tags))
    .bind(&data.visit_date)
    .bind(data.banner_image_url.as_deref())
    .bind(now_millis())
    .bind(restaurant_id)
    .execute(&mut *tx)
    .await?;

    recompute_averages(&mut tx, restaurant_id).await?;

    tx.commit().await?;
    Ok(())
}

async fn create_with_first_visit(
    pool: &SqlitePool,
    acting_member_id: i64,
    data: &RecordVisitData,
    member_ids: &[i64],
) -> RepoResult<i64> {
    let id = snowflake_id();
    let now = now_millis();
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO restaurant (id, name, location, banner_image_url, rating_average, tags, \
         last_visited_date, created_by, created_at, updated_at) \
         VALUES (?, ?, ?, COALESCE(?, '/uploads/default-banner.jpg'), 0, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(&data.name)
    .bind(&data.location)
    .bind(data.banner_image_url.as_deref())
    .bind(Json(&data.tags))
    .bind(&data.visit_date)
    .bind(acting_member_id)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO visit (restaurant_id, visit_count, visit_date, rating_average) \
         VALUES (?, 1, ?, 0)",
    )
    .bind(id)
    .bind(&data.visit_date)
    .execute(&mut *tx)
    .await?;

    insert_participants(&mut tx, id, 1, member_ids).await?;

    tx.commit().await?;
    Ok(id)
}

/// 参与者初始无评分，评论为空串
async fn insert_participants(
    tx: &mut Transaction<'_, sqlx::Sqlite>,
    restaurant_id: i64,
    visit_count: i64,
    member_ids: &[i64],
) -> RepoResult<()> {
    for (idx, member_id) in member_ids.iter().enumerate() {
        sqlx::query(
            "INSERT INTO visit_participant (restaurant_id, visit_count, position, member_id, rating, review) \
             VALUES (?, ?, ?, ?, NULL, '')",
        )
        .bind(restaurant_id)
        .bind(visit_count)
        .bind((idx + 1) as i64)
        .bind(member_id)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

// ── Ratings ──────────────────────────────────────────────────────────

/// 写入评分并重算均分
///
/// review 为 None 时保留原评论，传空串可以清空。
pub async fn set_rating(
    pool: &SqlitePool,
    restaurant_id: i64,
    visit_count: i64,
    member_id: i64,
    rating: f64,
    review: Option<&str>,
) -> RepoResult<()> {
    let mut tx = pool.begin().await?;

    let rows = sqlx::query(
        "UPDATE visit_participant SET rating = ?, review = COALESCE(?, review) \
         WHERE restaurant_id = ? AND visit_count = ? AND member_id = ?",
    )
    .bind(rating)
    .bind(review)
    .bind(restaurant_id)
    .bind(visit_count)
    .bind(member_id)
    .execute(&mut *tx)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "participant {member_id} in visit {visit_count}"
        )));
    }

    recompute_averages(&mut tx, restaurant_id).await?;

    sqlx::query("UPDATE restaurant SET updated_at = ? WHERE id = ?")
        .bind(now_millis())
        .bind(restaurant_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// 全量重算：每次访问的均分 + 餐厅对所有评分的总均分
async fn recompute_averages(
    tx: &mut Transaction<'_, sqlx::Sqlite>,
    restaurant_id: i64,
) -> RepoResult<()> {
    let rows: Vec<(i64, Option<f64>)> = sqlx::query_as(
        "SELECT visit_count, rating FROM visit_participant WHERE restaurant_id = ?",
    )
    .bind(restaurant_id)
    .fetch_all(&mut **tx)
    .await?;

    let mut by_visit: HashMap<i64, Vec<Option<f64>>> = HashMap::new();
    for (visit_count, rating) in &rows {
        by_visit.entry(*visit_count).or_default().push(*rating);
    }

    for (visit_count, ratings_of_visit) in by_visit {
        sqlx::query("UPDATE visit SET rating_average = ? WHERE restaurant_id = ? AND visit_count = ?")
            .bind(ratings::average(ratings_of_visit))
            .bind(restaurant_id)
            .bind(visit_count)
            .execute(&mut **tx)
            .await?;
    }

    let overall = ratings::average(rows.into_iter().map(|(_, rating)| rating));
    sqlx::query("UPDATE restaurant SET rating_average = ? WHERE id = ?")
        .bind(overall)
        .bind(restaurant_id)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

// ── Metadata / removal ──────────────────────────────────────────────

/// 元数据修改，None 字段保持原值；created_by 永不改动
pub async fn update_metadata(
    pool: &SqlitePool,
    id: i64,
    changes: RestaurantMetadataChanges,
) -> RepoResult<RestaurantDetail> {
    let rows = sqlx::query(
        "UPDATE restaurant SET name = COALESCE(?, name), location = COALESCE(?, location), \
         tags = COALESCE(?, tags), banner_image_url = COALESCE(?, banner_image_url), \
         updated_at = ? WHERE id = ?",
    )
    .bind(changes.name)
    .bind(changes.location)
    .bind(changes.tags.map(Json))
    .bind(changes.banner_image_url)
    .bind(now_millis())
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("restaurant {id}")));
    }

    find_detail(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("restaurant {id}")))
}

/// 删除餐厅，访问和评分随外键级联清掉
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let rows = sqlx::query("DELETE FROM restaurant WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("restaurant {id}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::member::{self, tests::seed_member};
    use crate::db::testing::memory_pool;

    fn visit_data(name: &str, location: &str, members: &[&str]) -> RecordVisitData {
        RecordVisitData {
            name: name.to_string(),
            location: location.to_string(),
            visit_date: "2025-06-01".to_string(),
            member_names: members.iter().map(|m| m.to_string()).collect(),
            tags: vec!["豚骨".to_string()],
            banner_image_url: None,
        }
    }

    #[tokio::test]
    async fn test_first_visit_creates_restaurant() {
        let pool = memory_pool().await;
        let yuki = seed_member(&pool, "yuki", "yuki@example.com").await;

        let (detail, created) = record_visit(
            &pool,
            yuki.id,
            visit_data("一蘭", "福岡市中央区", &["yuki"]),
        )
        .await
        .unwrap();

        assert!(created);
        assert_eq!(detail.name, "一蘭");
        assert_eq!(detail.rating_average, 0.0);
        assert_eq!(detail.last_visited_date, "2025-06-01");
        assert_eq!(detail.tags, vec!["豚骨"]);
        assert_eq!(detail.created_by.as_ref().unwrap().id, yuki.id);

        assert_eq!(detail.visits.len(), 1);
        let visit = &detail.visits[0];
        assert_eq!(visit.visit_count, 1);
        assert_eq!(visit.rating_average, 0.0);
        assert_eq!(visit.members.len(), 1);
        assert_eq!(visit.members[0].rating, None);
        assert_eq!(visit.members[0].member.as_ref().unwrap().name, "yuki");
    }

    #[tokio::test]
    async fn test_unknown_member_rejects_whole_visit() {
        let pool = memory_pool().await;
        let yuki = seed_member(&pool, "yuki", "yuki@example.com").await;

        let result = record_visit(
            &pool,
            yuki.id,
            visit_data("一蘭", "福岡市中央区", &["yuki", "ghost"]),
        )
        .await;

        match result {
            Err(RepoError::Validation(msg)) => assert!(msg.contains("ghost")),
            other => panic!("expected validation error, got {other:?}"),
        }
        // nothing was written
        assert!(find_all(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_revisit_appends_and_overwrites_metadata() {
        let pool = memory_pool().await;
        let yuki = seed_member(&pool, "yuki", "yuki@example.com").await;
        let mei = seed_member(&pool, "mei", "mei@example.com").await;
        let _ = mei;

        let (_, created) = record_visit(
            &pool,
            yuki.id,
            visit_data("一蘭", "福岡市中央区", &["yuki"]),
        )
        .await
        .unwrap();
        assert!(created);

        let mut second = visit_data("一蘭", "福岡市中央区", &["yuki", "mei"]);
        second.visit_date = "2025-07-15".to_string();
        second.tags = vec!["替え玉".to_string()];

        let (detail, created) = record_visit(&pool, yuki.id, second).await.unwrap();
        assert!(!created);
        assert_eq!(detail.visits.len(), 2);
        assert_eq!(detail.visits[1].visit_count, 2);
        assert_eq!(detail.visits[1].visit_date, "2025-07-15");
        assert_eq!(detail.visits[1].members.len(), 2);
        assert_eq!(detail.tags, vec!["替え玉"]);
        assert_eq!(detail.last_visited_date, "2025-07-15");
    }

    #[tokio::test]
    async fn test_same_name_elsewhere_hits_unique_name() {
        let pool = memory_pool().await;
        let yuki = seed_member(&pool, "yuki", "yuki@example.com").await;

        record_visit(&pool, yuki.id, visit_data("一蘭", "福岡", &["yuki"]))
            .await
            .unwrap();

        let clash = record_visit(&pool, yuki.id, visit_data("一蘭", "大阪", &["yuki"])).await;
        assert!(matches!(clash, Err(RepoError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_duplicate_member_names_collapse() {
        let pool = memory_pool().await;
        let yuki = seed_member(&pool, "yuki", "yuki@example.com").await;

        let (detail, _) = record_visit(
            &pool,
            yuki.id,
            visit_data("一蘭", "福岡", &["yuki", "yuki", " yuki "]),
        )
        .await
        .unwrap();
        assert_eq!(detail.visits[0].members.len(), 1);
    }

    #[tokio::test]
    async fn test_rating_flow_recomputes_flat_mean() {
        let pool = memory_pool().await;
        let yuki = seed_member(&pool, "yuki", "yuki@example.com").await;
        let mei = seed_member(&pool, "mei", "mei@example.com").await;

        let (detail, _) = record_visit(
            &pool,
            yuki.id,
            visit_data("一蘭", "福岡", &["yuki", "mei"]),
        )
        .await
        .unwrap();
        let rid = detail.id;

        set_rating(&pool, rid, 1, yuki.id, 4.0, None).await.unwrap();
        let detail = find_detail(&pool, rid).await.unwrap().unwrap();
        assert_eq!(detail.visits[0].rating_average, 4.0);
        assert_eq!(detail.rating_average, 4.0);

        set_rating(&pool, rid, 1, mei.id, 2.0, Some("しょっぱい"))
            .await
            .unwrap();
        let detail = find_detail(&pool, rid).await.unwrap().unwrap();
        assert_eq!(detail.visits[0].rating_average, 3.0);
        assert_eq!(detail.rating_average, 3.0);

        // a fresh unrated visit leaves the overall mean untouched
        let mut second = visit_data("一蘭", "福岡", &["yuki", "mei"]);
        second.visit_date = "2025-07-15".to_string();
        record_visit(&pool, yuki.id, second).await.unwrap();
        let detail = find_detail(&pool, rid).await.unwrap().unwrap();
        assert_eq!(detail.rating_average, 3.0);
        assert_eq!(detail.visits[1].rating_average, 0.0);

        // overall is flat across visits: (4 + 2 + 4) / 3
        set_rating(&pool, rid, 2, yuki.id, 4.0, None).await.unwrap();
        let detail = find_detail(&pool, rid).await.unwrap().unwrap();
        assert!((detail.rating_average - 10.0 / 3.0).abs() < 1e-9);
        assert_eq!(detail.visits[0].rating_average, 3.0);
        assert_eq!(detail.visits[1].rating_average, 4.0);
    }

    #[tokio::test]
    async fn test_rerating_overwrites() {
        let pool = memory_pool().await;
        let yuki = seed_member(&pool, "yuki", "yuki@example.com").await;

        let (detail, _) = record_visit(&pool, yuki.id, visit_data("一蘭", "福岡", &["yuki"]))
            .await
            .unwrap();

        set_rating(&pool, detail.id, 1, yuki.id, 4.0, Some("うまい"))
            .await
            .unwrap();
        set_rating(&pool, detail.id, 1, yuki.id, 2.0, None).await.unwrap();

        let detail = find_detail(&pool, detail.id).await.unwrap().unwrap();
        assert_eq!(detail.rating_average, 2.0);
        // review untouched when the update carries no text
        assert_eq!(detail.visits[0].members[0].review_text, "うまい");
    }

    #[tokio::test]
    async fn test_rating_unknown_participant() {
        let pool = memory_pool().await;
        let yuki = seed_member(&pool, "yuki", "yuki@example.com").await;
        let mei = seed_member(&pool, "mei", "mei@example.com").await;

        let (detail, _) = record_visit(&pool, yuki.id, visit_data("一蘭", "福岡", &["yuki"]))
            .await
            .unwrap();

        let result = set_rating(&pool, detail.id, 1, mei.id, 3.0, None).await;
        assert!(matches!(result, Err(RepoError::NotFound(_))));

        assert_eq!(
            find_participant_position(&pool, detail.id, 1, yuki.id)
                .await
                .unwrap(),
            Some(1)
        );
        assert_eq!(
            find_participant_position(&pool, detail.id, 1, mei.id)
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_update_metadata_partial() {
        let pool = memory_pool().await;
        let yuki = seed_member(&pool, "yuki", "yuki@example.com").await;

        let (detail, _) = record_visit(&pool, yuki.id, visit_data("一蘭", "福岡", &["yuki"]))
            .await
            .unwrap();

        let updated = update_metadata(
            &pool,
            detail.id,
            RestaurantMetadataChanges {
                name: Some("一蘭 本店".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.name, "一蘭 本店");
        assert_eq!(updated.location, detail.location);
        assert_eq!(updated.tags, detail.tags);
        // creator never changes on metadata edits
        assert_eq!(updated.created_by.as_ref().unwrap().id, yuki.id);
    }

    #[tokio::test]
    async fn test_rename_onto_existing_name_conflicts() {
        let pool = memory_pool().await;
        let yuki = seed_member(&pool, "yuki", "yuki@example.com").await;

        record_visit(&pool, yuki.id, visit_data("一蘭", "福岡", &["yuki"]))
            .await
            .unwrap();
        let (other, _) = record_visit(&pool, yuki.id, visit_data("一風堂", "福岡", &["yuki"]))
            .await
            .unwrap();

        let clash = update_metadata(
            &pool,
            other.id,
            RestaurantMetadataChanges {
                name: Some("一蘭".to_string()),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(clash, Err(RepoError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_delete_cascades_visits() {
        let pool = memory_pool().await;
        let yuki = seed_member(&pool, "yuki", "yuki@example.com").await;

        let (detail, _) = record_visit(&pool, yuki.id, visit_data("一蘭", "福岡", &["yuki"]))
            .await
            .unwrap();

        delete(&pool, detail.id).await.unwrap();
        assert!(find_detail(&pool, detail.id).await.unwrap().is_none());

        let visits: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM visit")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(visits, 0);

        let again = delete(&pool, detail.id).await;
        assert!(matches!(again, Err(RepoError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_member_removal_keeps_ratings_counting() {
        let pool = memory_pool().await;
        let yuki = seed_member(&pool, "yuki", "yuki@example.com").await;
        let mei = seed_member(&pool, "mei", "mei@example.com").await;

        let (detail, _) = record_visit(
            &pool,
            yuki.id,
            visit_data("一蘭", "福岡", &["yuki", "mei"]),
        )
        .await
        .unwrap();
        set_rating(&pool, detail.id, 1, yuki.id, 4.0, None).await.unwrap();
        set_rating(&pool, detail.id, 1, mei.id, 2.0, None).await.unwrap();

        member::delete_cascading(&pool, mei.id).await.unwrap();

        let detail = find_detail(&pool, detail.id).await.unwrap().unwrap();
        // the orphaned rating still counts, only the identity is gone
        assert_eq!(detail.rating_average, 3.0);
        let orphan = detail.visits[0]
            .members
            .iter()
            .find(|m| m.member.is_none())
            .unwrap();
        assert_eq!(orphan.rating, Some(2.0));
    }

    #[tokio::test]
    async fn test_creator_removal_clears_ownership() {
        let pool = memory_pool().await;
        let yuki = seed_member(&pool, "yuki", "yuki@example.com").await;
        let mei = seed_member(&pool, "mei", "mei@example.com").await;

        let (detail, _) = record_visit(
            &pool,
            yuki.id,
            visit_data("一蘭", "福岡", &["yuki", "mei"]),
        )
        .await
        .unwrap();

        member::delete_cascading(&pool, yuki.id).await.unwrap();

        let detail = find_detail(&pool, detail.id).await.unwrap().unwrap();
        assert!(detail.created_by.is_none());
    }
}
