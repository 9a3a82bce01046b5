//! Web 服务器模块
//!
//! 把翻译服务暴露成 HTTP 接口，供聊天平台的 webhook 适配层调用。

pub mod config;
pub mod handlers;
pub mod routes;
pub mod types;

pub use config::*;
pub use routes::*;
pub use types::*;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::translation::{TranslationError, TranslationResult, TranslationService};

/// 过期缓存的清理间隔
const CACHE_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Web 服务器
pub struct WebServer {
    config: WebConfig,
    state: Arc<AppState>,
}

impl WebServer {
    /// 创建新的 Web 服务器
    pub fn new(config: WebConfig, service: TranslationService) -> Self {
        Self {
            config,
            state: Arc::new(AppState { service }),
        }
    }

    /// 启动 Web 服务器
    pub async fn start(&self) -> TranslationResult<()> {
        let app = create_router(self.state.clone(), &self.config);

        let state = self.state.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CACHE_CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                let removed = state.service.cleanup_cache();
                if removed > 0 {
                    tracing::debug!(removed, "清理过期缓存");
                }
            }
        });

        let address = self.config.listen_address();
        let listener = tokio::net::TcpListener::bind(&address)
            .await
            .map_err(|e| TranslationError::NetworkError(format!("绑定地址 {} 失败: {}", address, e)))?;

        tracing::info!(address = %address, "Web 服务器启动");

        axum::serve(listener, app)
            .await
            .map_err(|e| TranslationError::NetworkError(format!("服务器错误: {}", e)))?;

        Ok(())
    }
}

/// 创建路由器
pub fn create_router(app_state: Arc<AppState>, config: &WebConfig) -> Router {
    let max_image_bytes = app_state.service.config().max_image_bytes;
    create_routes(max_image_bytes)
        .with_state(app_state)
        .nest_service("/uploads", ServeDir::new(&config.upload_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
