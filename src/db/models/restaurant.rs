//! 餐厅与访问记录数据模型
//!
//! 行结构与表一一对应；视图结构是 API 返回形状，由仓库层组装。

use serde::Serialize;
use sqlx::FromRow;
use sqlx::types::Json;

use super::member::MemberRef;

/// `restaurant` 表行
#[derive(Debug, Clone, FromRow)]
pub struct RestaurantRow {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub banner_image_url: String,
    pub rating_average: f64,
    pub tags: Json<Vec<String>>,
    pub last_visited_date: String,
    pub created_by: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// `visit` 表行
#[derive(Debug, Clone, FromRow)]
pub struct VisitRow {
    pub restaurant_id: i64,
    pub visit_count: i64,
    pub visit_date: String,
    pub rating_average: f64,
}

/// 参与者行，连同成员信息一起查出（成员已注销则为 NULL）
#[derive(Debug, Clone, FromRow)]
pub struct ParticipantRow {
    pub restaurant_id: i64,
    pub visit_count: i64,
    pub position: i64,
    pub member_id: Option<i64>,
    pub rating: Option<f64>,
    pub review: String,
    pub member_name: Option<String>,
    pub member_nickname: Option<String>,
    pub member_image_url: Option<String>,
}

impl ParticipantRow {
    /// 组装成员引用，注销成员返回 None
    pub fn member_ref(&self) -> Option<MemberRef> {
        match (self.member_id, &self.member_name) {
            (Some(id), Some(name)) => Some(MemberRef {
                id,
                name: name.clone(),
                nickname: self.member_nickname.clone().unwrap_or_default(),
                image_url: self.member_image_url.clone().unwrap_or_default(),
            }),
            _ => None,
        }
    }
}

/// 单个参与者的评分视图
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitMemberView {
    /// 注销成员的评分保留，成员字段为 null
    pub member: Option<MemberRef>,
    pub rating: Option<f64>,
    pub review_text: String,
}

/// 单次访问视图
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitView {
    pub visit_count: i64,
    pub visit_date: String,
    pub rating_average: f64,
    pub members: Vec<VisitMemberView>,
}

/// 餐厅完整视图，带全部访问历史
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantDetail {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub banner_image_url: String,
    pub rating_average: f64,
    pub tags: Vec<String>,
    pub last_visited_date: String,
    pub created_by: Option<MemberRef>,
    pub visits: Vec<VisitView>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// 记录访问的写入数据（成员名在仓库层解析为 id）
#[derive(Debug, Clone)]
pub struct RecordVisitData {
    pub name: String,
    pub location: String,
    pub visit_date: String,
    pub member_names: Vec<String>,
    pub tags: Vec<String>,
    pub banner_image_url: Option<String>,
}

/// 元数据修改，None 表示保持原值
#[derive(Debug, Clone, Default)]
pub struct RestaurantMetadataChanges {
    pub name: Option<String>,
    pub location: Option<String>,
    pub tags: Option<Vec<String>>,
    pub banner_image_url: Option<String>,
}

impl RestaurantMetadataChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.location.is_none()
            && self.tags.is_none()
            && self.banner_image_url.is_none()
    }
}
