//! 上传图片的对象存储

use std::path::PathBuf;

use async_trait::async_trait;

use crate::translation::error::{TranslationError, TranslationResult};

/// 对象存储：保存上传内容并返回可访问的 URL
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, bytes: &[u8], content_type: &str) -> TranslationResult<String>;
}

/// 写入本地目录的对象存储
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// 以内容哈希命名，同一张图片只保存一份
    fn file_name(bytes: &[u8], content_type: &str) -> String {
        let digest = blake3::hash(bytes).to_hex();
        format!("{}.{}", &digest.as_str()[..32], extension_for(content_type))
    }
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type.trim().to_lowercase().as_str() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "bin",
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn upload(&self, bytes: &[u8], content_type: &str) -> TranslationResult<String> {
        if bytes.is_empty() {
            return Err(TranslationError::InvalidInput("empty upload".to_string()));
        }

        tokio::fs::create_dir_all(&self.root).await?;

        let file_name = Self::file_name(bytes, content_type);
        let path = self.root.join(&file_name);
        tokio::fs::write(&path, bytes).await?;

        tracing::debug!(path = %path.display(), size = bytes.len(), "图片已保存");
        Ok(format!("{}/{}", self.public_base_url, file_name))
    }
}
