//! Google Gemini generateContent 后端

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{prompts, truncate_body, AiBackend, BackendRequest, ProviderId};
use crate::translation::config::ProviderConfig;
use crate::translation::error::{TranslationError, TranslationResult};

const TEMPERATURE: f64 = 0.3;

/// 非 data URL 图片的默认 MIME 类型
const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Gemini 后端
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
    model: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiBackend {
    /// 根据服务商配置创建后端，要求已配置 API Key
    pub fn new(config: &ProviderConfig) -> TranslationResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| TranslationError::ConfigError("未配置 Gemini API Key".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TranslationError::ConfigError(format!("创建 HTTP 客户端失败: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/{}:generateContent", self.api_url, model)
    }

    fn build_parts(request: BackendRequest<'_>) -> Value {
        match request {
            BackendRequest::Translate {
                text,
                target_language,
            } => json!([{ "text": prompts::translation_prompt(text, target_language) }]),
            BackendRequest::Generate { prompt } => json!([{ "text": prompt }]),
            BackendRequest::DescribeImage { prompt, image_ref } => {
                let image = match split_data_url(image_ref) {
                    Some((mime_type, data)) => json!({
                        "inline_data": { "mime_type": mime_type, "data": data }
                    }),
                    None => json!({
                        "file_data": { "mime_type": DEFAULT_IMAGE_MIME, "file_uri": image_ref }
                    }),
                };
                json!([{ "text": prompt }, image])
            }
        }
    }
}

/// 拆分 `data:<mime>;base64,<data>` 形式的 URL
fn split_data_url(image_ref: &str) -> Option<(&str, &str)> {
    let rest = image_ref.strip_prefix("data:")?;
    let (header, data) = rest.split_once(',')?;
    let mime_type = header.strip_suffix(";base64")?;
    Some((mime_type, data))
}

#[async_trait]
impl AiBackend for GeminiBackend {
    fn provider_id(&self) -> &str {
        ProviderId::Gemini.as_str()
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn execute(&self, model: &str, request: BackendRequest<'_>) -> TranslationResult<String> {
        let body = json!({
            "contents": [{ "parts": Self::build_parts(request) }],
            "generationConfig": { "temperature": TEMPERATURE },
        });

        tracing::debug!(model, "调用 Gemini generateContent");

        let response = self
            .client
            .post(self.endpoint(model))
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TranslationError::ProviderError(format!(
                "Gemini API error: {} - {}",
                status,
                truncate_body(&body, 200)
            )));
        }

        let generated: GenerateResponse = response.json().await?;

        let text = generated
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let text = text.trim();
        if text.is_empty() {
            return Err(TranslationError::ProviderError(
                "Gemini returned no content".to_string(),
            ));
        }
        Ok(text.to_string())
    }
}
