//! 访问记录接口处理逻辑
//!
//! 核心规则：
//! - 同名同地址再次提交算回访，只有名字相同按撞名冲突处理
//! - 评分只能本人打，管理员不例外
//! - 删除和改元数据要么是管理员要么是上报人

use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::StatusCode;
use axum::{Json, extract::rejection::JsonRejection};
use serde::Deserialize;
use tracing::info;

use crate::api::forms::{self, FormData};
use crate::auth::CurrentUser;
use crate::core::state::ServerState;
use crate::db::models::restaurant::{
    RecordVisitData, RestaurantDetail, RestaurantMetadataChanges,
};
use crate::db::repository::{RepoError, member, restaurant};
use crate::utils::validation::{MAX_LOCATION_LEN, MAX_NAME_LEN, MAX_NOTE_LEN};
use crate::utils::{AppError, AppResult, time, validation};

/// 访问名单里的一个成员，按登录名引用
#[derive(Debug, Deserialize)]
pub struct ParticipantName {
    pub name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VisitRequest {
    name: String,
    location: String,
    visit_date: String,
    members: Vec<ParticipantName>,
    #[serde(default)]
    tags: Vec<String>,
}

struct VisitPayload {
    name: String,
    location: String,
    visit_date: String,
    members: Vec<ParticipantName>,
    tags: Vec<String>,
    banner: Option<(String, Vec<u8>)>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RatingUpdate {
    rating: f64,
    #[serde(default)]
    review_text: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct MetadataRequest {
    name: Option<String>,
    location: Option<String>,
    tags: Option<Vec<String>>,
    banner_image_url: Option<String>,
}

struct MetadataPayload {
    changes: MetadataRequest,
    banner: Option<(String, Vec<u8>)>,
}

// ── Reads ───────────────────────────────────────────────────────────

pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<RestaurantDetail>>> {
    Ok(Json(restaurant::find_all(&state.pool).await?))
}

pub async fn get_one(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<RestaurantDetail>> {
    let detail = restaurant::find_detail(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("restaurant {id}")))?;
    Ok(Json(detail))
}

// ── Visit recording ─────────────────────────────────────────────────

/// 记录一次访问；新店 201，回访 200
pub async fn record_visit(
    State(state): State<ServerState>,
    user: CurrentUser,
    req: Request,
) -> AppResult<(StatusCode, Json<RestaurantDetail>)> {
    let payload = parse_visit(req).await?;

    validation::validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validation::validate_required_text(&payload.location, "location", MAX_LOCATION_LEN)?;
    time::parse_date(&payload.visit_date)?;
    if payload.members.is_empty() {
        return Err(AppError::validation("members cannot be empty"));
    }
    validation::validate_tags(&payload.tags)?;

    let banner_image_url = match payload.banner {
        Some((filename, data)) => Some(state.images.store(&filename, &data).await?.url),
        None => None,
    };

    let data = RecordVisitData {
        name: payload.name.trim().to_string(),
        location: payload.location.trim().to_string(),
        visit_date: payload.visit_date.trim().to_string(),
        member_names: payload.members.into_iter().map(|m| m.name).collect(),
        tags: payload.tags,
        banner_image_url,
    };

    let (detail, created) = restaurant::record_visit(&state.pool, user.id, data)
        .await
        .map_err(|e| match e {
            RepoError::Duplicate(_) => AppError::conflict(
                "a restaurant with this name already exists at a different location",
            ),
            other => other.into(),
        })?;

    info!(
        restaurant = %detail.name,
        visits = detail.visits.len(),
        created,
        "visit recorded"
    );

    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(detail)))
}

async fn parse_visit(req: Request) -> AppResult<VisitPayload> {
    if forms::is_multipart(&req) {
        let multipart = Multipart::from_request(req, &())
            .await
            .map_err(|e| AppError::validation(e.to_string()))?;
        let form = FormData::collect(multipart).await?;
        return Ok(VisitPayload {
            name: form.required_text("name")?.to_string(),
            location: form.required_text("location")?.to_string(),
            visit_date: form.required_text("visitDate")?.to_string(),
            members: form.json_field("members")?.unwrap_or_default(),
            tags: form.json_field("tags")?.unwrap_or_default(),
            banner: form
                .file("banner")
                .map(|f| (f.filename.clone(), f.data.clone())),
        });
    }

    let Json(body): Json<VisitRequest> = Json::from_request(req, &())
        .await
        .map_err(|e: JsonRejection| AppError::validation(e.to_string()))?;
    Ok(VisitPayload {
        name: body.name,
        location: body.location,
        visit_date: body.visit_date,
        members: body.members,
        tags: body.tags,
        banner: None,
    })
}

// ── Ratings ─────────────────────────────────────────────────────────

/// 给某次访问里的自己打分
///
/// 检查顺序固定：评分范围、餐厅、访问、成员名、参与名单、本人。
pub async fn rate(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path((restaurant_id, visit_count, member_name)): Path<(i64, i64, String)>,
    Json(body): Json<RatingUpdate>,
) -> AppResult<Json<RestaurantDetail>> {
    validation::validate_rating(body.rating)?;
    validation::validate_optional_text(body.review_text.as_deref(), "reviewText", MAX_NOTE_LEN)?;

    restaurant::find_row(&state.pool, restaurant_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("restaurant {restaurant_id}")))?;

    restaurant::find_visit(&state.pool, restaurant_id, visit_count)
        .await?
        .ok_or_else(|| AppError::not_found(format!("visit {visit_count}")))?;

    let target = member::find_by_name(&state.pool, &member_name)
        .await?
        .ok_or_else(|| AppError::not_found(format!("member '{member_name}'")))?;

    restaurant::find_participant_position(&state.pool, restaurant_id, visit_count, target.id)
        .await?
        .ok_or_else(|| {
            AppError::not_found(format!("'{member_name}' did not join visit {visit_count}"))
        })?;

    if target.id != user.id {
        return Err(AppError::forbidden("members can only rate for themselves"));
    }

    restaurant::set_rating(
        &state.pool,
        restaurant_id,
        visit_count,
        target.id,
        body.rating,
        body.review_text.as_deref(),
    )
    .await?;

    let detail = restaurant::find_detail(&state.pool, restaurant_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("restaurant {restaurant_id}")))?;
    Ok(Json(detail))
}

// ── Metadata / removal ──────────────────────────────────────────────

pub async fn update_metadata(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    req: Request,
) -> AppResult<Json<RestaurantDetail>> {
    let row = restaurant::find_row(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("restaurant {id}")))?;

    ensure_owner_or_admin(
        &user,
        row.created_by,
        "only the reporter or an admin can edit this restaurant",
    )?;

    let payload = parse_metadata(req).await?;
    if let Some(name) = payload.changes.name.as_deref() {
        validation::validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    if let Some(location) = payload.changes.location.as_deref() {
        validation::validate_required_text(location, "location", MAX_LOCATION_LEN)?;
    }
    if let Some(tags) = &payload.changes.tags {
        validation::validate_tags(tags)?;
    }

    let banner_image_url = match payload.banner {
        Some((filename, data)) => Some(state.images.store(&filename, &data).await?.url),
        None => payload.changes.banner_image_url,
    };

    let changes = RestaurantMetadataChanges {
        name: payload.changes.name,
        location: payload.changes.location,
        tags: payload.changes.tags,
        banner_image_url,
    };

    if changes.is_empty() {
        let detail = restaurant::find_detail(&state.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("restaurant {id}")))?;
        return Ok(Json(detail));
    }

    let detail = restaurant::update_metadata(&state.pool, id, changes)
        .await
        .map_err(|e| match e {
            RepoError::Duplicate(_) => {
                AppError::conflict("another restaurant already uses this name")
            }
            other => other.into(),
        })?;
    Ok(Json(detail))
}

async fn parse_metadata(req: Request) -> AppResult<MetadataPayload> {
    if forms::is_multipart(&req) {
        let multipart = Multipart::from_request(req, &())
            .await
            .map_err(|e| AppError::validation(e.to_string()))?;
        let form = FormData::collect(multipart).await?;
        return Ok(MetadataPayload {
            changes: MetadataRequest {
                name: form.text("name").map(str::to_string),
                location: form.text("location").map(str::to_string),
                tags: form.json_field("tags")?,
                banner_image_url: None,
            },
            banner: form
                .file("banner")
                .map(|f| (f.filename.clone(), f.data.clone())),
        });
    }

    let Json(changes): Json<MetadataRequest> = Json::from_request(req, &())
        .await
        .map_err(|e: JsonRejection| AppError::validation(e.to_string()))?;
    Ok(MetadataPayload {
        changes,
        banner: None,
    })
}

pub async fn remove(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let row = restaurant::find_row(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("restaurant {id}")))?;

    ensure_owner_or_admin(
        &user,
        row.created_by,
        "only the reporter or an admin can remove this restaurant",
    )?;

    restaurant::delete(&state.pool, id).await?;
    info!(restaurant_id = id, removed_by = user.id, "restaurant removed");
    Ok(Json(true))
}

/// 管理员或上报人；创建者已注销的记录只有管理员能动
fn ensure_owner_or_admin(
    user: &CurrentUser,
    created_by: Option<i64>,
    denied: &str,
) -> AppResult<()> {
    if user.is_admin() || created_by == Some(user.id) {
        return Ok(());
    }
    Err(AppError::forbidden(denied))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, role: &str) -> CurrentUser {
        CurrentUser {
            id,
            name: "x".to_string(),
            role: role.to_string(),
        }
    }

    #[test]
    fn test_owner_or_admin_rules() {
        assert!(ensure_owner_or_admin(&user(1, "user"), Some(1), "no").is_ok());
        assert!(ensure_owner_or_admin(&user(2, "user"), Some(1), "no").is_err());
        assert!(ensure_owner_or_admin(&user(2, "admin"), Some(1), "no").is_ok());
        // ownerless records are admin-only
        assert!(ensure_owner_or_admin(&user(1, "user"), None, "no").is_err());
        assert!(ensure_owner_or_admin(&user(1, "admin"), None, "no").is_ok());
    }
}
