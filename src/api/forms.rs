//! multipart 表单收集
//!
//! 带图片的接口同时接受 JSON 和 multipart 两种请求体。
//! multipart 里的结构化字段（members、tags）按 JSON 文本解析。

use std::collections::HashMap;

use axum::extract::{Multipart, Request};
use axum::http::header;
use serde::de::DeserializeOwned;

use crate::utils::{AppError, AppResult};

/// 请求体是不是 multipart
pub fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

/// 一个文件分部
pub struct FilePart {
    pub field: String,
    pub filename: String,
    pub data: Vec<u8>,
}

/// 读完整个 multipart 后的字段集合
#[derive(Default)]
pub struct FormData {
    pub fields: HashMap<String, String>,
    pub files: Vec<FilePart>,
}

impl FormData {
    pub async fn collect(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = FormData::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name() {
                Some(filename) => {
                    let filename = filename.to_string();
                    let data = field.bytes().await?.to_vec();
                    form.files.push(FilePart {
                        field: name,
                        filename,
                        data,
                    });
                }
                None => {
                    let value = field.text().await?;
                    form.fields.insert(name, value);
                }
            }
        }
        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn required_text(&self, name: &str) -> AppResult<&str> {
        self.text(name)
            .ok_or_else(|| AppError::validation(format!("missing field '{name}'")))
    }

    /// JSON 编码的文本字段，缺席时返回 None
    pub fn json_field<T: DeserializeOwned>(&self, name: &str) -> AppResult<Option<T>> {
        match self.text(name) {
            None => Ok(None),
            Some(raw) => serde_json::from_str(raw).map(Some).map_err(|e| {
                AppError::validation(format!("field '{name}' is not valid JSON: {e}"))
            }),
        }
    }

    pub fn file(&self, field: &str) -> Option<&FilePart> {
        self.files.iter().find(|f| f.field == field)
    }
}
