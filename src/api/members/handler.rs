//! 成员接口处理逻辑
//!
//! 资料修改和注销都只能本人操作，管理员也不能代别人注销。

use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::{Json, extract::rejection::JsonRejection};
use serde::Deserialize;
use tracing::info;

use crate::api::forms::{self, FormData};
use crate::auth::CurrentUser;
use crate::core::state::ServerState;
use crate::db::models::member::MemberProfile;
use crate::db::repository::member;
use crate::utils::{AppError, AppResult, validation};

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ProfileUpdateRequest {
    nickname: Option<String>,
    image_url: Option<String>,
}

struct ProfileUpdatePayload {
    nickname: Option<String>,
    image_url: Option<String>,
    image: Option<(String, Vec<u8>)>,
}

pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<MemberProfile>>> {
    Ok(Json(member::find_all(&state.pool).await?))
}

pub async fn get_one(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<MemberProfile>> {
    let profile = member::find_profile(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("member {id}")))?;
    Ok(Json(profile))
}

pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    req: Request,
) -> AppResult<Json<MemberProfile>> {
    if user.id != id {
        return Err(AppError::forbidden("you can only edit your own profile"));
    }

    let payload = parse_update(req).await?;
    validation::validate_optional_text(
        payload.nickname.as_deref(),
        "nickname",
        validation::MAX_NAME_LEN,
    )?;
    validation::validate_optional_text(
        payload.image_url.as_deref(),
        "imageUrl",
        validation::MAX_URL_LEN,
    )?;

    let image_url = match payload.image {
        Some((filename, data)) => Some(state.images.store(&filename, &data).await?.url),
        None => payload.image_url,
    };

    let profile = member::update_profile(
        &state.pool,
        id,
        payload.nickname.as_deref(),
        image_url.as_deref(),
    )
    .await?;
    Ok(Json(profile))
}

async fn parse_update(req: Request) -> AppResult<ProfileUpdatePayload> {
    if forms::is_multipart(&req) {
        let multipart = Multipart::from_request(req, &())
            .await
            .map_err(|e| AppError::validation(e.to_string()))?;
        let form = FormData::collect(multipart).await?;
        return Ok(ProfileUpdatePayload {
            nickname: form.text("nickname").map(str::to_string),
            image_url: None,
            image: form
                .file("profileImage")
                .map(|f| (f.filename.clone(), f.data.clone())),
        });
    }

    let Json(body): Json<ProfileUpdateRequest> = Json::from_request(req, &())
        .await
        .map_err(|e: JsonRejection| AppError::validation(e.to_string()))?;
    Ok(ProfileUpdatePayload {
        nickname: body.nickname,
        image_url: body.image_url,
        image: None,
    })
}

pub async fn remove(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    if user.id != id {
        return Err(AppError::forbidden("members can only remove themselves"));
    }

    member::delete_cascading(&state.pool, id).await?;
    info!(target: "security", member_id = id, "member account removed");
    Ok(Json(true))
}
