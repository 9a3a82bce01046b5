//! AI 后端模块
//!
//! 两家 AI 服务商通过同一个 [`AiBackend`] 能力接口暴露：翻译、自由文本生成
//! （用于语言检测）、图片描述以及身份信息。编排器和选择器只依赖这个接口。

pub mod gemini;
pub mod openai;
pub mod selector;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::language::registry;

pub use gemini::GeminiBackend;
pub use openai::OpenAiBackend;
pub use selector::{AiBackendSelector, BackendHandle};

/// 终端替身后端上报的服务商标识
pub const UNAVAILABLE_PROVIDER_ID: &str = "unavailable";

/// 终端替身后端上报的模型名称
pub const UNAVAILABLE_MODEL_NAME: &str = "none";

/// 所有后端都不可用时返回给用户的固定消息
pub const SERVICE_UNAVAILABLE_MESSAGE: &str =
    "Translation service is not configured. Please check the API key settings.";

/// 已知的 AI 服务商
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    OpenAi,
    Gemini,
}

impl ProviderId {
    /// 故障转移顺序中的全部服务商
    pub const ALL: [ProviderId; 2] = [ProviderId::OpenAi, ProviderId::Gemini];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "openai",
            ProviderId::Gemini => "gemini",
        }
    }

    /// 另一个已知服务商
    pub fn other(&self) -> ProviderId {
        match self {
            ProviderId::OpenAi => ProviderId::Gemini,
            ProviderId::Gemini => ProviderId::OpenAi,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "OpenAI",
            ProviderId::Gemini => "Google Gemini",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = TranslationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "gpt" | "chatgpt" => Ok(ProviderId::OpenAi),
            "gemini" | "google" => Ok(ProviderId::Gemini),
            other => Err(TranslationError::InvalidInput(format!(
                "unknown AI provider '{}'",
                other
            ))),
        }
    }
}

/// 发往后端的一次请求
#[derive(Debug, Clone, Copy)]
pub enum BackendRequest<'a> {
    /// 将文本翻译成目标语言
    Translate {
        text: &'a str,
        target_language: &'a str,
    },
    /// 按提示词生成自由文本
    Generate { prompt: &'a str },
    /// 按提示词描述图片，`image_ref` 为 URL 或 data URL
    DescribeImage {
        prompt: &'a str,
        image_ref: &'a str,
    },
}

/// AI 后端能力接口
///
/// 实现方在服务商调用失败时返回 `Err`，由编排器统一转成用户可见的回复。
#[async_trait]
pub trait AiBackend: Send + Sync {
    /// 服务商标识
    fn provider_id(&self) -> &str;

    /// 服务商默认模型
    fn default_model(&self) -> &str;

    /// 是否可用（启动时由凭据决定）
    fn is_available(&self) -> bool {
        true
    }

    /// 使用指定模型执行请求
    async fn execute(&self, model: &str, request: BackendRequest<'_>) -> TranslationResult<String>;
}

/// 终端替身：没有任何可用后端时使用
#[derive(Debug, Default)]
pub struct UnavailableBackend;

#[async_trait]
impl AiBackend for UnavailableBackend {
    fn provider_id(&self) -> &str {
        UNAVAILABLE_PROVIDER_ID
    }

    fn default_model(&self) -> &str {
        UNAVAILABLE_MODEL_NAME
    }

    fn is_available(&self) -> bool {
        false
    }

    async fn execute(&self, _model: &str, _request: BackendRequest<'_>) -> TranslationResult<String> {
        Ok(SERVICE_UNAVAILABLE_MESSAGE.to_string())
    }
}

/// 选择器返回的后端句柄，携带实际生效的模型名称
#[derive(Clone)]
pub struct SelectedBackend {
    backend: Arc<dyn AiBackend>,
    model: String,
}

impl SelectedBackend {
    pub fn new(backend: Arc<dyn AiBackend>) -> Self {
        let model = backend.default_model().to_string();
        Self { backend, model }
    }

    /// 覆盖后续调用使用的模型
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn provider_id(&self) -> &str {
        self.backend.provider_id()
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    /// 替身后端返回 [`TranslationError::BackendUnavailable`]
    pub fn ensure_available(&self) -> TranslationResult<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(TranslationError::BackendUnavailable)
        }
    }

    pub async fn translate_text(&self, text: &str, target_language: &str) -> TranslationResult<String> {
        self.backend
            .execute(
                &self.model,
                BackendRequest::Translate {
                    text,
                    target_language,
                },
            )
            .await
    }

    pub async fn generate_text(&self, prompt: &str) -> TranslationResult<String> {
        self.backend
            .execute(&self.model, BackendRequest::Generate { prompt })
            .await
    }

    pub async fn describe_image(&self, prompt: &str, image_ref: &str) -> TranslationResult<String> {
        self.backend
            .execute(&self.model, BackendRequest::DescribeImage { prompt, image_ref })
            .await
    }
}

impl fmt::Debug for SelectedBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedBackend")
            .field("provider", &self.provider_id())
            .field("model", &self.model)
            .field("available", &self.is_available())
            .finish()
    }
}

/// 服务商共用的提示词
pub mod prompts {
    use super::registry;

    /// 翻译系统提示词
    pub fn translation_instruction(target_language: &str) -> String {
        format!(
            "You are a professional translator. Translate the user's text into {}. \
             Return only the translation without any explanation or extra content.",
            registry::english_name(target_language)
        )
    }

    /// 单条消息形式的翻译提示词（不支持 system 角色的服务商使用）
    pub fn translation_prompt(text: &str, target_language: &str) -> String {
        format!(
            "Translate the following text into {}. \
             Return only the translation without any explanation or extra content:\n\n{}",
            registry::english_name(target_language),
            text
        )
    }

    /// 语言检测提示词
    pub fn detection_prompt(text: &str) -> String {
        format!(
            "Detect the language of the following text. Reply with its ISO 639-1 code only \
             (for example zh, ja, en, ko) and nothing else.\n\n{}",
            text
        )
    }

    /// 图片文字识别提示词
    pub const IMAGE_TEXT_PROMPT: &str = "Extract all text in this image. Return only the text \
        itself without any description or explanation.";
}

/// 截断过长的服务商错误内容，避免把整个 HTML 错误页塞进回复
pub(crate) fn truncate_body(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        body.to_string()
    } else {
        let head: String = body.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_id_parsing() {
        assert_eq!("openai".parse::<ProviderId>().ok(), Some(ProviderId::OpenAi));
        assert_eq!(" Gemini ".parse::<ProviderId>().ok(), Some(ProviderId::Gemini));
        assert!("claude".parse::<ProviderId>().is_err());
        assert_eq!(ProviderId::OpenAi.other(), ProviderId::Gemini);
    }

    #[test]
    fn test_provider_id_serde() {
        let json = serde_json::to_string(&ProviderId::OpenAi).unwrap();
        assert_eq!(json, "\"openai\"");
    }

    #[tokio::test]
    async fn test_unavailable_backend_reports_sentinel() {
        let handle = SelectedBackend::new(Arc::new(UnavailableBackend));
        assert!(!handle.is_available());
        assert_eq!(handle.provider_id(), UNAVAILABLE_PROVIDER_ID);
        assert_eq!(handle.model_name(), UNAVAILABLE_MODEL_NAME);

        let reply = handle.translate_text("hello", "ja").await.unwrap();
        assert_eq!(reply, SERVICE_UNAVAILABLE_MESSAGE);

        assert!(matches!(
            handle.ensure_available(),
            Err(TranslationError::BackendUnavailable)
        ));
    }

    #[test]
    fn test_prompts_use_english_names() {
        assert!(prompts::translation_instruction("ja").contains("Japanese"));
        assert!(prompts::detection_prompt("hola").ends_with("hola"));
    }

    #[test]
    fn test_truncate_body() {
        assert_eq!(truncate_body("short", 10), "short");
        assert_eq!(truncate_body("abcdefghij", 3), "abc...");
    }
}
