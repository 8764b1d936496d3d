//! 计划清单仓库
//!
//! 计划项按 (name, location) 去重，同名不同地址允许并存，
//! 正式访问过后由调用方决定是否移除计划项。

use sqlx::SqlitePool;

use crate::db::models::planned::{NewPlannedRestaurant, PlannedRestaurantView, PlannedRow};
use crate::utils::ids::{now_millis, snowflake_id};

use super::{RepoError, RepoResult};

pub(super) const PLANNED_SELECT: &str = "SELECT p.id, p.name, p.location, p.banner_image_url, \
     p.recommendation_comment, p.recommended_by, p.created_at, \
     m.name AS member_name, m.nickname AS member_nickname, m.image_url AS member_image_url \
     FROM planned_restaurant p LEFT JOIN member m ON m.id = p.recommended_by";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<PlannedRestaurantView>> {
    let rows = sqlx::query_as::<_, PlannedRow>(&format!("{PLANNED_SELECT} ORDER BY p.created_at DESC"))
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(PlannedRow::into_view).collect())
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<PlannedRestaurantView>> {
    let row = sqlx::query_as::<_, PlannedRow>(&format!("{PLANNED_SELECT} WHERE p.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(PlannedRow::into_view))
}

/// 推荐一家想去的店
pub async fn create(
    pool: &SqlitePool,
    recommended_by: i64,
    data: NewPlannedRestaurant,
) -> RepoResult<PlannedRestaurantView> {
    let id = snowflake_id();

    sqlx::query(
        "INSERT INTO planned_restaurant (id, name, location, banner_image_url, \
         recommendation_comment, recommended_by, created_at) \
         VALUES (?, ?, ?, COALESCE(?, '/uploads/default-banner.jpg'), ?, ?, ?)",
    )
    .bind(id)
    .bind(&data.name)
    .bind(&data.location)
    .bind(data.banner_image_url.as_deref())
    .bind(&data.recommendation_comment)
    .bind(recommended_by)
    .bind(now_millis())
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("planned entry missing after insert".to_string()))
}

/// 移除计划项，关联日程随外键级联删除
///
/// 并发删除时先到的赢，后到的拿到 NotFound。
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let rows = sqlx::query("DELETE FROM planned_restaurant WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("planned restaurant {id}")));
    }
    Ok(())
}
