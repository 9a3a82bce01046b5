//! OpenAI 兼容的 Chat Completions 后端

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{prompts, truncate_body, AiBackend, BackendRequest, ProviderId};
use crate::translation::config::ProviderConfig;
use crate::translation::error::{TranslationError, TranslationResult};

const TEMPERATURE: f64 = 0.3;

/// OpenAI 后端
#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
    model: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl OpenAiBackend {
    /// 根据服务商配置创建后端，要求已配置 API Key
    pub fn new(config: &ProviderConfig) -> TranslationResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| TranslationError::ConfigError("未配置 OpenAI API Key".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TranslationError::ConfigError(format!("创建 HTTP 客户端失败: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            api_url: config.api_url.clone(),
            model: config.model.clone(),
        })
    }

    fn build_messages(request: BackendRequest<'_>) -> Value {
        match request {
            BackendRequest::Translate {
                text,
                target_language,
            } => json!([
                { "role": "system", "content": prompts::translation_instruction(target_language) },
                { "role": "user", "content": text },
            ]),
            BackendRequest::Generate { prompt } => json!([
                { "role": "user", "content": prompt },
            ]),
            BackendRequest::DescribeImage { prompt, image_ref } => json!([
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": prompt },
                        { "type": "image_url", "image_url": { "url": image_ref } },
                    ],
                },
            ]),
        }
    }
}

#[async_trait]
impl AiBackend for OpenAiBackend {
    fn provider_id(&self) -> &str {
        ProviderId::OpenAi.as_str()
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn execute(&self, model: &str, request: BackendRequest<'_>) -> TranslationResult<String> {
        let body = json!({
            "model": model,
            "messages": Self::build_messages(request),
            "temperature": TEMPERATURE,
        });

        tracing::debug!(model, "调用 OpenAI Chat Completions");

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TranslationError::ProviderError(format!(
                "OpenAI API error: {} - {}",
                status,
                truncate_body(&body, 200)
            )));
        }

        let chat: ChatResponse = response.json().await?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| TranslationError::ProviderError("OpenAI returned no content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_api_key() {
        let config = ProviderConfig::defaults_for(ProviderId::OpenAi);
        assert!(OpenAiBackend::new(&config).is_err());

        let mut config = config;
        config.api_key = Some("sk-test".to_string());
        let backend = OpenAiBackend::new(&config).unwrap();
        assert_eq!(backend.provider_id(), "openai");
        assert_eq!(backend.default_model(), "gpt-4o");
    }

    #[test]
    fn test_translate_messages_carry_system_prompt() {
        let messages = OpenAiBackend::build_messages(BackendRequest::Translate {
            text: "你好",
            target_language: "ja",
        });
        assert_eq!(messages[0]["role"], "system");
        assert!(messages[0]["content"].as_str().unwrap().contains("Japanese"));
        assert_eq!(messages[1]["content"], "你好");
    }

    #[test]
    fn test_image_messages_embed_url() {
        let messages = OpenAiBackend::build_messages(BackendRequest::DescribeImage {
            prompt: "read it",
            image_ref: "https://cdn.example.com/a.png",
        });
        assert_eq!(
            messages[0]["content"][1]["image_url"]["url"],
            "https://cdn.example.com/a.png"
        );
    }
}
