//! Web 路由定义

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::web::{handlers::*, types::AppState};

/// 图片请求体除 base64 内容外的余量：JSON 字段与 data URL 前缀
const IMAGE_BODY_HEADROOM: usize = 64 * 1024;

/// 图片接口的请求体上限
///
/// base64 把内容放大到 4/3，略超图片上限的请求仍能进入处理器并得到"图片过大"的回复。
pub fn image_body_limit(max_image_bytes: usize) -> usize {
    max_image_bytes
        .div_ceil(3)
        .saturating_mul(4)
        .saturating_add(IMAGE_BODY_HEADROOM)
}

/// 创建 API 路由
pub fn create_routes(max_image_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        // 消息入口
        .route("/api/v1/messages", post(post_message))
        .route(
            "/api/v1/images",
            post(post_image).layer(DefaultBodyLimit::max(image_body_limit(max_image_bytes))),
        )
        // 运维
        .route("/api/v1/health", get(health))
        .route("/api/v1/stats", get(stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_body_limit_covers_base64_expansion() {
        let max = 10 * 1024 * 1024;
        let limit = image_body_limit(max);
        assert!(limit >= max / 3 * 4 + 1024);
        assert!(limit > 2 * 1024 * 1024);
        assert_eq!(image_body_limit(0), IMAGE_BODY_HEADROOM);
    }
}
