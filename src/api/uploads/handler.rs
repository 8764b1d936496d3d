//! 图片上传与访问处理逻辑

use axum::extract::{Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::info;

use crate::api::forms::FormData;
use crate::auth::CurrentUser;
use crate::core::state::ServerState;
use crate::utils::{AppError, AppResult};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UploadResponse {
    filename: String,
    url: String,
    size: u64,
    format: &'static str,
}

/// 上传一张图片，字段名 `file`
pub async fn upload(
    State(state): State<ServerState>,
    user: CurrentUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<UploadResponse>)> {
    let form = FormData::collect(multipart).await?;
    let part = form
        .file("file")
        .ok_or_else(|| AppError::validation("missing file field 'file'"))?;

    let stored = state.images.store(&part.filename, &part.data).await?;
    info!(uploaded_by = user.id, file = %stored.filename, "image uploaded");

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            filename: stored.filename,
            url: stored.url,
            size: stored.size,
            // 存储前统一转码
            format: "jpeg",
        }),
    ))
}

/// 读取已上传的图片
pub async fn serve(
    State(state): State<ServerState>,
    Path(filename): Path<String>,
) -> AppResult<Response> {
    let bytes = state.images.read(&filename).await?;
    let mime = mime_guess::from_path(&filename).first_or_octet_stream();
    Ok(([(header::CONTENT_TYPE, mime.as_ref())], bytes).into_response())
}
