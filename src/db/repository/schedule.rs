//! 聚餐日程仓库
//!
//! 日程挂在计划项下面，计划项删除时级联清掉。
//! 组织者创建日程时自动成为参与者。

use std::collections::HashMap;

use sqlx::{FromRow, SqlitePool};

use crate::db::models::member::MemberRef;
use crate::db::models::planned::{PlannedRestaurantView, PlannedRow};
use crate::db::models::schedule::{NewSchedule, ScheduleRow, ScheduleView};
use crate::utils::ids::{now_millis, snowflake_id};
use crate::utils::time::format_millis_rfc3339;

use super::planned::PLANNED_SELECT;
use super::{RepoError, RepoResult, member, placeholders};

const SCHEDULE_SELECT: &str = "SELECT id, planned_restaurant_id, title, organizer_id, starts_at, \
     special_notes, created_at, updated_at FROM schedule";

#[derive(Debug, FromRow)]
struct ParticipantJoinRow {
    schedule_id: i64,
    id: i64,
    name: String,
    nickname: String,
    image_url: String,
}

// ── Queries ──────────────────────────────────────────────────────────

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<ScheduleView>> {
    let rows = sqlx::query_as::<_, ScheduleRow>(&format!("{SCHEDULE_SELECT} ORDER BY starts_at"))
        .fetch_all(pool)
        .await?;
    assemble(pool, rows).await
}

pub async fn find_detail(pool: &SqlitePool, id: i64) -> RepoResult<Option<ScheduleView>> {
    let row = sqlx::query_as::<_, ScheduleRow>(&format!("{SCHEDULE_SELECT} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    let Some(row) = row else {
        return Ok(None);
    };
    Ok(assemble(pool, vec![row]).await?.pop())
}

async fn assemble(pool: &SqlitePool, rows: Vec<ScheduleRow>) -> RepoResult<Vec<ScheduleView>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let mut planned_ids: Vec<i64> = rows.iter().map(|r| r.planned_restaurant_id).collect();
    planned_ids.sort_unstable();
    planned_ids.dedup();

    let sql = format!(
        "{PLANNED_SELECT} WHERE p.id IN ({})",
        placeholders(planned_ids.len())
    );
    let mut planned_query = sqlx::query_as::<_, PlannedRow>(&sql);
    for id in &planned_ids {
        planned_query = planned_query.bind(id);
    }
    let planned: HashMap<i64, PlannedRestaurantView> = planned_query
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|p| (p.id, p.into_view()))
        .collect();

    let mut organizer_ids: Vec<i64> = rows.iter().filter_map(|r| r.organizer_id).collect();
    organizer_ids.sort_unstable();
    organizer_ids.dedup();
    let organizers = member::find_refs(pool, &organizer_ids).await?;

    let schedule_ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let sql = format!(
        "SELECT sp.schedule_id, m.id, m.name, m.nickname, m.image_url \
         FROM schedule_participant sp JOIN member m ON m.id = sp.member_id \
         WHERE sp.schedule_id IN ({}) ORDER BY sp.joined_at",
        placeholders(schedule_ids.len())
    );
    let mut participant_query = sqlx::query_as::<_, ParticipantJoinRow>(&sql);
    for id in &schedule_ids {
        participant_query = participant_query.bind(id);
    }
    let mut participants: HashMap<i64, Vec<MemberRef>> = HashMap::new();
    for p in participant_query.fetch_all(pool).await? {
        participants.entry(p.schedule_id).or_default().push(MemberRef {
            id: p.id,
            name: p.name,
            nickname: p.nickname,
            image_url: p.image_url,
        });
    }

    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(planned_view) = planned.get(&row.planned_restaurant_id).cloned() else {
            // 外键保证计划项存在，走到这里说明并发删除正在进行
            continue;
        };
        views.push(ScheduleView {
            id: row.id,
            title: row.title,
            planned_restaurant: planned_view,
            organizer: row.organizer_id.and_then(|id| organizers.get(&id).cloned()),
            starts_at: format_millis_rfc3339(row.starts_at),
            special_notes: row.special_notes,
            participants: participants.remove(&row.id).unwrap_or_default(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        });
    }
    Ok(views)
}

// ── Mutations ────────────────────────────────────────────────────────

/// 创建日程并把组织者写进参与者名单
pub async fn create(
    pool: &SqlitePool,
    organizer_id: i64,
    data: NewSchedule,
) -> RepoResult<ScheduleView> {
    let id = snowflake_id();
    let now = now_millis();
    let mut tx = pool.begin().await?;

    let planned_exists: Option<i64> =
        sqlx::query_scalar("SELECT id FROM planned_restaurant WHERE id = ?")
            .bind(data.planned_ramen_id)
            .fetch_optional(&mut *tx)
            .await?;
    if planned_exists.is_none() {
        return Err(RepoError::NotFound(format!(
            "planned restaurant {}",
            data.planned_ramen_id
        )));
    }

    sqlx::query(
        "INSERT INTO schedule (id, planned_restaurant_id, title, organizer_id, starts_at, \
         special_notes, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(data.planned_ramen_id)
    .bind(&data.title)
    .bind(organizer_id)
    .bind(data.starts_at_millis)
    .bind(&data.special_notes)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO schedule_participant (schedule_id, member_id, joined_at) VALUES (?, ?, ?)",
    )
    .bind(id)
    .bind(organizer_id)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    find_detail(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("schedule missing after insert".to_string()))
}

/// 报名参加，重复报名报冲突
pub async fn join(pool: &SqlitePool, schedule_id: i64, member_id: i64) -> RepoResult<()> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM schedule WHERE id = ?")
        .bind(schedule_id)
        .fetch_optional(pool)
        .await?;
    if exists.is_none() {
        return Err(RepoError::NotFound(format!("schedule {schedule_id}")));
    }

    sqlx::query(
        "INSERT INTO schedule_participant (schedule_id, member_id, joined_at) VALUES (?, ?, ?)",
    )
    .bind(schedule_id)
    .bind(member_id)
    .bind(now_millis())
    .execute(pool)
    .await?;
    Ok(())
}

/// 退出报名，本来就不在名单里算请求错误
pub async fn leave(pool: &SqlitePool, schedule_id: i64, member_id: i64) -> RepoResult<()> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM schedule WHERE id = ?")
        .bind(schedule_id)
        .fetch_optional(pool)
        .await?;
    if exists.is_none() {
        return Err(RepoError::NotFound(format!("schedule {schedule_id}")));
    }

    let rows = sqlx::query(
        "DELETE FROM schedule_participant WHERE schedule_id = ? AND member_id = ?",
    )
    .bind(schedule_id)
    .bind(member_id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::Validation(
            "not a participant of this schedule".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::planned::NewPlannedRestaurant;
    use crate::db::repository::member::tests::seed_member;
    use crate::db::repository::planned;
    use crate::db::testing::memory_pool;

    async fn seed_planned(pool: &SqlitePool, recommender: i64) -> i64 {
        planned::create(
            pool,
            recommender,
            NewPlannedRestaurant {
                name: "二郎".to_string(),
                location: "東京".to_string(),
                banner_image_url: None,
                recommendation_comment: String::new(),
            },
        )
        .await
        .unwrap()
        .id
    }

    fn schedule_data(planned_id: i64, starts_at_millis: i64) -> NewSchedule {
        NewSchedule {
            planned_ramen_id: planned_id,
            title: "金曜ラーメン部".to_string(),
            starts_at_millis,
            special_notes: "18時集合".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_auto_joins_organizer() {
        let pool = memory_pool().await;
        let yuki = seed_member(&pool, "yuki", "yuki@example.com").await;
        let planned_id = seed_planned(&pool, yuki.id).await;

        let view = create(&pool, yuki.id, schedule_data(planned_id, 1_750_000_000_000))
            .await
            .unwrap();

        assert_eq!(view.title, "金曜ラーメン部");
        assert_eq!(view.planned_restaurant.id, planned_id);
        assert_eq!(view.organizer.as_ref().unwrap().id, yuki.id);
        assert_eq!(view.participants.len(), 1);
        assert_eq!(view.participants[0].id, yuki.id);
        assert!(view.starts_at.starts_with("2025-"));
    }

    #[tokio::test]
    async fn test_create_requires_planned_entry() {
        let pool = memory_pool().await;
        let yuki = seed_member(&pool, "yuki", "yuki@example.com").await;

        let result = create(&pool, yuki.id, schedule_data(999, 0)).await;
        assert!(matches!(result, Err(RepoError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_join_and_leave() {
        let pool = memory_pool().await;
        let yuki = seed_member(&pool, "yuki", "yuki@example.com").await;
        let mei = seed_member(&pool, "mei", "mei@example.com").await;
        let planned_id = seed_planned(&pool, yuki.id).await;
        let view = create(&pool, yuki.id, schedule_data(planned_id, 0)).await.unwrap();

        join(&pool, view.id, mei.id).await.unwrap();
        let detail = find_detail(&pool, view.id).await.unwrap().unwrap();
        assert_eq!(detail.participants.len(), 2);

        let twice = join(&pool, view.id, mei.id).await;
        assert!(matches!(twice, Err(RepoError::Duplicate(_))));

        leave(&pool, view.id, mei.id).await.unwrap();
        let detail = find_detail(&pool, view.id).await.unwrap().unwrap();
        assert_eq!(detail.participants.len(), 1);

        let not_in = leave(&pool, view.id, mei.id).await;
        assert!(matches!(not_in, Err(RepoError::Validation(_))));
    }

    #[tokio::test]
    async fn test_join_missing_schedule() {
        let pool = memory_pool().await;
        let yuki = seed_member(&pool, "yuki", "yuki@example.com").await;

        let result = join(&pool, 12345, yuki.id).await;
        assert!(matches!(result, Err(RepoError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_planned_removal_cascades_schedules() {
        let pool = memory_pool().await;
        let yuki = seed_member(&pool, "yuki", "yuki@example.com").await;
        let planned_id = seed_planned(&pool, yuki.id).await;
        let view = create(&pool, yuki.id, schedule_data(planned_id, 0)).await.unwrap();

        planned::delete(&pool, planned_id).await.unwrap();

        assert!(find_detail(&pool, view.id).await.unwrap().is_none());
        let participants: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schedule_participant")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(participants, 0);
    }

    #[tokio::test]
    async fn test_organizer_removal_keeps_schedule() {
        let pool = memory_pool().await;
        let yuki = seed_member(&pool, "yuki", "yuki@example.com").await;
        let mei = seed_member(&pool, "mei", "mei@example.com").await;
        let planned_id = seed_planned(&pool, mei.id).await;
        let view = create(&pool, yuki.id, schedule_data(planned_id, 0)).await.unwrap();
        join(&pool, view.id, mei.id).await.unwrap();

        crate::db::repository::member::delete_cascading(&pool, yuki.id)
            .await
            .unwrap();

        let detail = find_detail(&pool, view.id).await.unwrap().unwrap();
        assert!(detail.organizer.is_none());
        assert_eq!(detail.participants.len(), 1);
        assert_eq!(detail.participants[0].id, mei.id);
    }

    #[tokio::test]
    async fn test_list_sorted_by_start() {
        let pool = memory_pool().await;
        let yuki = seed_member(&pool, "yuki", "yuki@example.com").await;
        let planned_id = seed_planned(&pool, yuki.id).await;

        let mut later = schedule_data(planned_id, 2_000_000_000_000);
        later.title = "later".to_string();
        create(&pool, yuki.id, later).await.unwrap();

        let mut sooner = schedule_data(planned_id, 1_000_000_000_000);
        sooner.title = "sooner".to_string();
        create(&pool, yuki.id, sooner).await.unwrap();

        let all = find_all(&pool).await.unwrap();
        let titles: Vec<_> = all.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["sooner", "later"]);
    }
}
