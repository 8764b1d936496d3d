//! 计划清单数据模型

use serde::Serialize;
use sqlx::FromRow;

use super::member::MemberRef;

/// `planned_restaurant` 行，连同推荐人信息一起查出
#[derive(Debug, Clone, FromRow)]
pub struct PlannedRow {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub banner_image_url: String,
    pub recommendation_comment: String,
    pub recommended_by: Option<i64>,
    pub created_at: i64,
    pub member_name: Option<String>,
    pub member_nickname: Option<String>,
    pub member_image_url: Option<String>,
}

impl PlannedRow {
    pub fn into_view(self) -> PlannedRestaurantView {
        let recommended_by = match (self.recommended_by, self.member_name) {
            (Some(id), Some(name)) => Some(MemberRef {
                id,
                name,
                nickname: self.member_nickname.unwrap_or_default(),
                image_url: self.member_image_url.unwrap_or_default(),
            }),
            _ => None,
        };
        PlannedRestaurantView {
            id: self.id,
            name: self.name,
            location: self.location,
            banner_image_url: self.banner_image_url,
            recommendation_comment: self.recommendation_comment,
            recommended_by,
            created_at: self.created_at,
        }
    }
}

/// 计划中的餐厅视图
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedRestaurantView {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub banner_image_url: String,
    pub recommendation_comment: String,
    /// 推荐人已注销时为 null
    pub recommended_by: Option<MemberRef>,
    pub created_at: i64,
}

/// 新建计划的写入数据
#[derive(Debug, Clone)]
pub struct NewPlannedRestaurant {
    pub name: String,
    pub location: String,
    pub banner_image_url: Option<String>,
    pub recommendation_comment: String,
}
