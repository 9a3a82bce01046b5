//! HTTP 接口测试
//!
//! 在随机端口上启动路由器，通过 reqwest 发送真实请求

#![cfg(feature = "web")]

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::StatusCode;

use line_translator::translation::{ProviderId, TranslationConfig};
use line_translator::web::{create_router, AppState, ReplyResponse, WebConfig};

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{test_config, CountingBackend, TestEnvironment};

/// 启动服务器，返回基础地址和后端替身
async fn spawn_server(config: TranslationConfig) -> (String, Arc<CountingBackend>) {
    let TestEnvironment {
        service, openai, ..
    } = TestEnvironment::with(
        config,
        CountingBackend::new(ProviderId::OpenAi).reading_images_as("Good morning"),
    );

    let router = create_router(Arc::new(AppState { service }), &WebConfig::default());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://{}", address), openai)
}

async fn post_image(base_url: &str, bytes: &[u8]) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{}/api/v1/images", base_url))
        .json(&serde_json::json!({
            "user_id": "u1",
            "image_base64": STANDARD.encode(bytes),
            "content_type": "image/png",
        }))
        .send()
        .await
        .unwrap()
}

/// 超过框架默认请求体上限、但在图片上限之内的图片照常处理
#[tokio::test]
async fn test_large_image_within_limit_gets_reply() {
    let config = test_config();
    assert!(config.max_image_bytes > 3 * 1024 * 1024);
    let (base_url, openai) = spawn_server(config).await;

    let response = post_image(&base_url, &vec![7u8; 3 * 1024 * 1024]).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: ReplyResponse = response.json().await.unwrap();
    assert!(
        body.reply.starts_with("[Recognized text]\nGood morning"),
        "{}",
        body.reply
    );
    assert_eq!(openai.translations(), 1);
}

/// 略超图片上限时由处理器回复，而不是被请求体上限拦截
#[tokio::test]
async fn test_image_over_limit_gets_json_reply() {
    let config = TranslationConfig {
        max_image_bytes: 3 * 1024 * 1024,
        ..test_config()
    };
    let (base_url, openai) = spawn_server(config).await;

    let response = post_image(&base_url, &vec![7u8; 3 * 1024 * 1024 + 1024]).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: ReplyResponse = response.json().await.unwrap();
    assert_eq!(body.reply, "The image is too large (limit 3072 KB).");
    assert_eq!(openai.total_calls(), 0);
}

#[tokio::test]
async fn test_message_endpoint() {
    let (base_url, _) = spawn_server(test_config()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/v1/messages", base_url))
        .json(&serde_json::json!({ "user_id": "u1", "text": "翻譯成日文 你好" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: ReplyResponse = response.json().await.unwrap();
    assert!(body.reply.starts_with("[ja] 你好"));

    let response = client
        .post(format!("{}/api/v1/messages", base_url))
        .json(&serde_json::json!({ "user_id": " ", "text": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
