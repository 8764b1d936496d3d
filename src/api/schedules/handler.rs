//! 聚餐日程接口处理逻辑

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use tracing::info;

use crate::auth::CurrentUser;
use crate::core::state::ServerState;
use crate::db::models::schedule::{NewSchedule, ScheduleView};
use crate::db::repository::{RepoError, schedule};
use crate::utils::validation::{MAX_NAME_LEN, MAX_NOTE_LEN};
use crate::utils::{AppError, AppResult, time, validation};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ScheduleCreateRequest {
    planned_ramen_id: i64,
    title: String,
    /// RFC 3339
    starts_at: String,
    #[serde(default)]
    special_notes: Option<String>,
}

pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<ScheduleView>>> {
    Ok(Json(schedule::find_all(&state.pool).await?))
}

pub async fn get_one(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ScheduleView>> {
    let view = schedule::find_detail(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("schedule {id}")))?;
    Ok(Json(view))
}

pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(body): Json<ScheduleCreateRequest>,
) -> AppResult<(StatusCode, Json<ScheduleView>)> {
    validation::validate_required_text(&body.title, "title", MAX_NAME_LEN)?;
    validation::validate_optional_text(
        body.special_notes.as_deref(),
        "specialNotes",
        MAX_NOTE_LEN,
    )?;
    let starts_at_millis = time::parse_rfc3339_millis(&body.starts_at)?;

    let view = schedule::create(
        &state.pool,
        user.id,
        NewSchedule {
            planned_ramen_id: body.planned_ramen_id,
            title: body.title.trim().to_string(),
            starts_at_millis,
            special_notes: body.special_notes.unwrap_or_default().trim().to_string(),
        },
    )
    .await?;

    info!(schedule = %view.title, organizer = user.id, "schedule created");
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn join(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ScheduleView>> {
    schedule::join(&state.pool, id, user.id)
        .await
        .map_err(|e| match e {
            RepoError::Duplicate(_) => AppError::conflict("already joined this schedule"),
            other => other.into(),
        })?;

    let view = schedule::find_detail(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("schedule {id}")))?;
    Ok(Json(view))
}

pub async fn leave(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ScheduleView>> {
    schedule::leave(&state.pool, id, user.id).await?;

    let view = schedule::find_detail(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("schedule {id}")))?;
    Ok(Json(view))
}
