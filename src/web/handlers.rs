//! API 处理器
//!
//! 消息接口总是以 200 返回一条回复文本；只有请求本身无法解析时才返回 4xx。

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Json};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::translation::{HealthLevel, HealthStatus, ImageUpload};
use crate::web::types::{AppState, ImageRequest, MessageRequest, ReplyResponse, StatsResponse};

type ApiError = (StatusCode, Json<serde_json::Value>);

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message.into() })),
    )
}

/// 处理文本消息
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<ReplyResponse>, ApiError> {
    if request.user_id.trim().is_empty() {
        return Err(bad_request("user_id is required"));
    }

    let reply = state.service.handle_text(&request.user_id, &request.text).await;
    Ok(Json(ReplyResponse { reply }))
}

/// 处理图片消息
pub async fn post_image(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ImageRequest>,
) -> Result<Json<ReplyResponse>, ApiError> {
    if request.user_id.trim().is_empty() {
        return Err(bad_request("user_id is required"));
    }

    let (data_url_type, payload) = split_data_url(&request.image_base64);
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| bad_request(format!("invalid base64 image: {}", e)))?;

    let content_type = request
        .content_type
        .or(data_url_type)
        .unwrap_or_else(|| "image/jpeg".to_string());

    let reply = state
        .service
        .handle_image(&request.user_id, ImageUpload { bytes, content_type })
        .await;
    Ok(Json(ReplyResponse { reply }))
}

/// 拆出 `data:<type>;base64,` 前缀
fn split_data_url(value: &str) -> (Option<String>, &str) {
    let Some(rest) = value.strip_prefix("data:") else {
        return (None, value);
    };
    match rest.split_once(";base64,") {
        Some((content_type, payload)) if !content_type.is_empty() => {
            (Some(content_type.to_string()), payload)
        }
        Some((_, payload)) => (None, payload),
        None => (None, value),
    }
}

/// 健康检查
///
/// 没有可用后端时返回 503，响应体仍然是完整的健康报告。
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthStatus>) {
    let health = state.service.get_health();
    let status = match health.overall {
        HealthLevel::Healthy => StatusCode::OK,
        HealthLevel::Degraded | HealthLevel::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(health))
}

/// 运行统计
pub async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let cache = state.service.cache_stats();
    Json(StatsResponse {
        service: state.service.get_stats().snapshot(),
        cache_hit_rate: cache.hit_rate(),
        cache,
    })
}
