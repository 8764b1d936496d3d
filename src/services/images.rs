//! 图片存储
//!
//! 上传一律重新编码成 JPEG 再落盘，文件名取内容哈希，
//! 同一张图只存一份。重新编码顺带剥掉原图的元数据。

use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use sha2::{Digest, Sha256};

use crate::utils::{AppError, AppResult};

/// 上传大小上限 5MB
pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

pub const DEFAULT_BANNER_URL: &str = "/uploads/default-banner.jpg";
pub const DEFAULT_PROFILE_URL: &str = "/uploads/default-profile.jpg";

const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];
const JPEG_QUALITY: u8 = 85;

/// 存储结果
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub filename: String,
    pub url: String,
    pub size: u64,
}

/// 本地图片仓库，挂在上传目录上
#[derive(Debug, Clone)]
pub struct ImageStore {
    uploads_dir: PathBuf,
}

impl ImageStore {
    pub fn new(uploads_dir: PathBuf) -> Self {
        Self { uploads_dir }
    }

    /// 校验、转码并写入图片，返回可访问的 URL
    pub async fn store(&self, original_name: &str, data: &[u8]) -> AppResult<StoredImage> {
        if data.is_empty() {
            return Err(AppError::validation("empty file"));
        }
        if data.len() > MAX_FILE_SIZE {
            return Err(AppError::validation(format!(
                "file exceeds {MAX_FILE_SIZE} bytes"
            )));
        }

        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(AppError::validation(
                "unsupported image type, expected png/jpg/jpeg/webp",
            ));
        }

        let decoded = image::load_from_memory(data)
            .map_err(|e| AppError::validation(format!("unreadable image: {e}")))?;

        let mut jpeg = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY);
        decoded
            .to_rgb8()
            .write_with_encoder(encoder)
            .map_err(|e| AppError::internal(format!("jpeg encode failed: {e}")))?;

        let hash = hex::encode(Sha256::digest(&jpeg));
        let filename = format!("{hash}.jpg");
        let path = self.uploads_dir.join(&filename);

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tokio::fs::write(&path, &jpeg)
                .await
                .map_err(|e| AppError::internal(format!("failed to write image: {e}")))?;
        }

        Ok(StoredImage {
            url: format!("/uploads/{filename}"),
            size: jpeg.len() as u64,
            filename,
        })
    }

    /// 读取已存图片，文件名里不允许任何路径成分
    pub async fn read(&self, filename: &str) -> AppResult<Vec<u8>> {
        if filename.is_empty()
            || filename.contains("..")
            || filename.contains('/')
            || filename.contains('\\')
        {
            return Err(AppError::validation("invalid filename"));
        }

        let path = self.uploads_dir.join(filename);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::not_found(format!("upload '{filename}'")))
            }
            Err(e) => Err(AppError::internal(e.to_string())),
        }
    }

    /// 默认占位图不存在时生成纯色 JPEG
    pub async fn ensure_defaults(&self) -> AppResult<()> {
        self.ensure_placeholder("default-banner.jpg", [214, 108, 58], 640, 360)
            .await?;
        self.ensure_placeholder("default-profile.jpg", [120, 120, 128], 256, 256)
            .await?;
        Ok(())
    }

    async fn ensure_placeholder(
        &self,
        filename: &str,
        rgb: [u8; 3],
        width: u32,
        height: u32,
    ) -> AppResult<()> {
        let path = self.uploads_dir.join(filename);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        let img = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
        let mut jpeg = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY);
        img.write_with_encoder(encoder)
            .map_err(|e| AppError::internal(format!("placeholder encode failed: {e}")))?;

        tokio::fs::write(&path, &jpeg)
            .await
            .map_err(|e| AppError::internal(e.to_string()))?;
        Ok(())
    }
}
