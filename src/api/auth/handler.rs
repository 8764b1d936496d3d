//! 认证接口
//!
//! 注册支持 JSON 和 multipart（带头像）两种请求体。
//! 登录固定响应时长，失败一律返回同一句话，不区分账号不存在和密码错误。

use std::time::{Duration, Instant};

use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::StatusCode;
use axum::{Json, extract::rejection::JsonRejection};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::forms::{self, FormData};
use crate::auth::CurrentUser;
use crate::core::state::ServerState;
use crate::db::models::member::{Member, MemberProfile, NewMember};
use crate::db::repository::{RepoError, member};
use crate::services::images;
use crate::utils::{AppError, AppResult, validation};

/// 登录接口的固定响应时长
const AUTH_FIXED_DELAY_MS: u64 = 500;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    name: String,
    email: String,
    password: String,
    #[serde(default)]
    nickname: Option<String>,
}

struct RegisterPayload {
    name: String,
    email: String,
    password: String,
    nickname: Option<String>,
    image: Option<(String, Vec<u8>)>,
}

#[derive(Deserialize)]
pub(super) struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct LoginResponse {
    token: String,
    member: MemberProfile,
}

pub async fn register(
    State(state): State<ServerState>,
    req: Request,
) -> AppResult<(StatusCode, Json<MemberProfile>)> {
    let payload = parse_register(req).await?;

    validation::validate_required_text(&payload.name, "name", validation::MAX_NAME_LEN)?;
    validation::validate_email(&payload.email)?;
    validation::validate_password(&payload.password)?;
    validation::validate_optional_text(
        payload.nickname.as_deref(),
        "nickname",
        validation::MAX_NAME_LEN,
    )?;

    let image_url = match payload.image {
        Some((filename, data)) => state.images.store(&filename, &data).await?.url,
        None => images::DEFAULT_PROFILE_URL.to_string(),
    };

    let password_hash = Member::hash_password(&payload.password)?;

    let profile = member::create(
        &state.pool,
        NewMember {
            name: payload.name.trim().to_string(),
            nickname: payload.nickname.unwrap_or_default().trim().to_string(),
            email: payload.email.trim().to_lowercase(),
            password_hash,
            image_url,
        },
    )
    .await
    .map_err(|e| match e {
        RepoError::Duplicate(_) => AppError::conflict("name or email already registered"),
        other => other.into(),
    })?;

    info!(target: "security", member = %profile.name, "member registered");
    Ok((StatusCode::CREATED, Json(profile)))
}

async fn parse_register(req: Request) -> AppResult<RegisterPayload> {
    if forms::is_multipart(&req) {
        let multipart = Multipart::from_request(req, &())
            .await
            .map_err(|e| AppError::validation(e.to_string()))?;
        let form = FormData::collect(multipart).await?;
        return Ok(RegisterPayload {
            name: form.required_text("name")?.to_string(),
            email: form.required_text("email")?.to_string(),
            password: form.required_text("password")?.to_string(),
            nickname: form.text("nickname").map(str::to_string),
            image: form
                .file("profileImage")
                .map(|f| (f.filename.clone(), f.data.clone())),
        });
    }

    let Json(body): Json<RegisterRequest> = Json::from_request(req, &())
        .await
        .map_err(|e: JsonRejection| AppError::validation(e.to_string()))?;
    Ok(RegisterPayload {
        name: body.name,
        email: body.email,
        password: body.password,
        nickname: body.nickname,
        image: None,
    })
}

pub async fn login(
    State(state): State<ServerState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let started = Instant::now();
    let result = try_login(&state, &body).await;

    // 固定耗时，堵住用响应时间探测账号是否存在的口子
    if let Some(remaining) = Duration::from_millis(AUTH_FIXED_DELAY_MS).checked_sub(started.elapsed())
    {
        tokio::time::sleep(remaining).await;
    }
    result
}

async fn try_login(state: &ServerState, body: &LoginRequest) -> AppResult<Json<LoginResponse>> {
    let email = body.email.trim().to_lowercase();

    let Some(found) = member::find_by_email(&state.pool, &email).await? else {
        warn!(target: "security", %email, "login attempt for unknown email");
        return Err(AppError::invalid_credentials());
    };

    if !found.verify_password(&body.password) {
        warn!(target: "security", %email, "failed login attempt");
        return Err(AppError::invalid_credentials());
    }

    let token = state
        .jwt_service
        .issue(found.id, &found.name, &found.role)
        .map_err(|e| AppError::internal(e.to_string()))?;

    info!(target: "security", member = %found.name, "member logged in");
    Ok(Json(LoginResponse {
        token,
        member: found.profile(),
    }))
}

pub async fn me(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<MemberProfile>> {
    let profile = member::find_profile(&state.pool, user.id)
        .await?
        .ok_or_else(|| AppError::not_found("member no longer exists"))?;
    Ok(Json(profile))
}
