//! 图片翻译
//!
//! 上传 → 识别文字 → 检测 → 决定目标语言 → 翻译。图片的存储地址通过
//! [`ImageContext`] 显式传给后续每一步，不依赖任何线程局部状态。

use std::time::Instant;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use super::service::{annotation, CompletedTranslation, TranslationService};
use crate::translation::backend::prompts;
use crate::translation::error::TranslationResult;
use crate::translation::pipeline::resolve_target;
use crate::translation::storage::TranslationKind;

pub const NO_TEXT_RECOGNIZED_MESSAGE: &str = "No text could be recognized in the image.";

/// 用户上传的图片
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// 一次图片翻译请求的上下文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageContext {
    /// 对象存储返回的地址；未配置存储或上传失败时为 `None`
    pub image_url: Option<String>,
    /// 内联图片内容，供无法访问 `image_url` 的服务商使用
    pub data_url: String,
}

impl ImageContext {
    pub fn new(upload: &ImageUpload, image_url: Option<String>) -> Self {
        Self {
            image_url,
            data_url: format!(
                "data:{};base64,{}",
                upload.content_type,
                STANDARD.encode(&upload.bytes)
            ),
        }
    }

    /// 发给服务商的图片引用
    pub fn image_ref(&self) -> &str {
        &self.data_url
    }
}

/// 文字识别引擎
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image: &ImageContext) -> TranslationResult<String>;
}

impl TranslationService {
    /// 处理一张图片，返回回复文本
    pub async fn handle_image(&self, user_id: &str, upload: ImageUpload) -> String {
        let started = Instant::now();
        self.stats.inc_requests();

        if !self.config.image_translation_enabled {
            return "Image translation is disabled.".to_string();
        }
        if upload.bytes.is_empty() {
            return "The image is empty.".to_string();
        }
        if upload.bytes.len() > self.config.max_image_bytes {
            return format!(
                "The image is too large (limit {} KB).",
                self.config.max_image_bytes / 1024
            );
        }

        let profile = self.load_profile(user_id).await;
        let backend = self.selector.select_for_user(&profile);
        if self.ocr.is_none() {
            if let Err(e) = backend.ensure_available() {
                return self.failure_reply(&e);
            }
        }

        let context = ImageContext::new(&upload, self.store_image(&upload).await);

        let recognized = match &self.ocr {
            Some(ocr) => ocr.recognize(&context).await,
            None => {
                backend
                    .describe_image(prompts::IMAGE_TEXT_PROMPT, context.image_ref())
                    .await
            }
        };
        let recognized = match recognized {
            Ok(text) => text.trim().to_string(),
            Err(e) => return self.failure_reply(&e),
        };
        if recognized.is_empty() {
            return NO_TEXT_RECOGNIZED_MESSAGE.to_string();
        }

        let detected = self.detector.detect(&recognized).await;
        let resolved = match resolve_target(&detected, None, &profile, &self.settings.snapshot()) {
            Ok(resolved) => resolved,
            Err(e) => return self.failure_reply(&e),
        };

        if let Err(e) = backend.ensure_available() {
            return self.failure_reply(&e);
        }

        let result = match self
            .translate_cached(&backend, &recognized, &resolved.target_language_code)
            .await
        {
            Ok(result) => result,
            Err(e) => return self.failure_reply(&e),
        };

        tracing::info!(
            user_id = %profile.user_id,
            provider = backend.provider_id(),
            target = %resolved.target_language_code,
            image_url = ?context.image_url,
            "图片翻译完成"
        );

        let reply = format!(
            "[Recognized text]\n{}\n\n[Translation]\n{}{}",
            recognized,
            result.text,
            annotation(&resolved)
        );

        self.complete(
            profile,
            CompletedTranslation {
                source_text: &recognized,
                resolved: &resolved,
                backend: &backend,
                result: &result,
                kind: TranslationKind::Image,
                image_url: context.image_url.clone(),
                started,
            },
        )
        .await;
        self.stats.add_processing_time(started.elapsed());
        reply
    }

    /// 上传到对象存储，失败只记录日志
    async fn store_image(&self, upload: &ImageUpload) -> Option<String> {
        let store = self.objects.as_ref()?;
        match store.upload(&upload.bytes, &upload.content_type).await {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!("图片上传失败: {}", e);
                None
            }
        }
    }
}
