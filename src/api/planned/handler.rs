//! 计划清单接口处理逻辑
//!
//! 移除走先到先得：两个人同时删，后到的拿 404。

use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::StatusCode;
use axum::{Json, extract::rejection::JsonRejection};
use serde::Deserialize;
use tracing::info;

use crate::api::forms::{self, FormData};
use crate::auth::CurrentUser;
use crate::core::state::ServerState;
use crate::db::models::planned::{NewPlannedRestaurant, PlannedRestaurantView};
use crate::db::repository::{RepoError, planned};
use crate::utils::validation::{MAX_LOCATION_LEN, MAX_NAME_LEN, MAX_NOTE_LEN};
use crate::utils::{AppError, AppResult, validation};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlannedCreateRequest {
    name: String,
    location: String,
    #[serde(default)]
    recommendation_comment: Option<String>,
}

struct PlannedCreatePayload {
    name: String,
    location: String,
    recommendation_comment: Option<String>,
    banner: Option<(String, Vec<u8>)>,
}

pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<PlannedRestaurantView>>> {
    Ok(Json(planned::find_all(&state.pool).await?))
}

pub async fn get_one(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<PlannedRestaurantView>> {
    let view = planned::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("planned restaurant {id}")))?;
    Ok(Json(view))
}

pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    req: Request,
) -> AppResult<(StatusCode, Json<PlannedRestaurantView>)> {
    let payload = parse_create(req).await?;

    validation::validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validation::validate_required_text(&payload.location, "location", MAX_LOCATION_LEN)?;
    validation::validate_optional_text(
        payload.recommendation_comment.as_deref(),
        "recommendationComment",
        MAX_NOTE_LEN,
    )?;

    let banner_image_url = match payload.banner {
        Some((filename, data)) => Some(state.images.store(&filename, &data).await?.url),
        None => None,
    };

    let view = planned::create(
        &state.pool,
        user.id,
        NewPlannedRestaurant {
            name: payload.name.trim().to_string(),
            location: payload.location.trim().to_string(),
            banner_image_url,
            recommendation_comment: payload
                .recommendation_comment
                .unwrap_or_default()
                .trim()
                .to_string(),
        },
    )
    .await
    .map_err(|e| match e {
        RepoError::Duplicate(_) => {
            AppError::conflict("this restaurant is already on the planned list")
        }
        other => other.into(),
    })?;

    info!(planned = %view.name, recommended_by = user.id, "planned restaurant added");
    Ok((StatusCode::CREATED, Json(view)))
}

async fn parse_create(req: Request) -> AppResult<PlannedCreatePayload> {
    if forms::is_multipart(&req) {
        let multipart = Multipart::from_request(req, &())
            .await
            .map_err(|e| AppError::validation(e.to_string()))?;
        let form = FormData::collect(multipart).await?;
        return Ok(PlannedCreatePayload {
            name: form.required_text("name")?.to_string(),
            location: form.required_text("location")?.to_string(),
            recommendation_comment: form.text("recommendationComment").map(str::to_string),
            banner: form
                .file("banner")
                .map(|f| (f.filename.clone(), f.data.clone())),
        });
    }

    let Json(body): Json<PlannedCreateRequest> = Json::from_request(req, &())
        .await
        .map_err(|e: JsonRejection| AppError::validation(e.to_string()))?;
    Ok(PlannedCreatePayload {
        name: body.name,
        location: body.location,
        recommendation_comment: body.recommendation_comment,
        banner: None,
    })
}

pub async fn remove(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let view = planned::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("planned restaurant {id}")))?;

    let is_recommender = view
        .recommended_by
        .as_ref()
        .is_some_and(|m| m.id == user.id);
    if !user.is_admin() && !is_recommender {
        return Err(AppError::forbidden(
            "only the recommender or an admin can remove a planned restaurant",
        ));
    }

    // 上面的读取和这里的删除之间没有锁，输掉竞态的一方拿 404
    planned::delete(&state.pool, id).await?;
    info!(planned_id = id, removed_by = user.id, "planned restaurant removed");
    Ok(Json(true))
}
