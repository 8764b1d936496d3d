//! 聚餐日程数据模型

use serde::Serialize;
use sqlx::FromRow;

use super::member::MemberRef;
use super::planned::PlannedRestaurantView;

/// `schedule` 表行
#[derive(Debug, Clone, FromRow)]
pub struct ScheduleRow {
    pub id: i64,
    pub planned_restaurant_id: i64,
    pub title: String,
    pub organizer_id: Option<i64>,
    pub starts_at: i64,
    pub special_notes: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// 日程视图，带目标餐厅和参与者列表
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleView {
    pub id: i64,
    pub title: String,
    pub planned_restaurant: PlannedRestaurantView,
    /// 组织者已注销时为 null
    pub organizer: Option<MemberRef>,
    /// RFC 3339 UTC
    pub starts_at: String,
    pub special_notes: String,
    pub participants: Vec<MemberRef>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// 新建日程的写入数据
#[derive(Debug, Clone)]
pub struct NewSchedule {
    pub planned_ramen_id: i64,
    pub title: String,
    pub starts_at_millis: i64,
    pub special_notes: String,
}
