//! Web 模块的数据类型定义

use serde::{Deserialize, Serialize};

use crate::translation::storage::CacheStats;
use crate::translation::{ServiceStatsSnapshot, TranslationService};

/// 应用状态
pub struct AppState {
    pub service: TranslationService,
}

/// 文本消息请求
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub user_id: String,
    pub text: String,
}

/// 图片消息请求
#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    pub user_id: String,
    /// base64 编码的图片内容，可以带 `data:<type>;base64,` 前缀
    pub image_base64: String,
    pub content_type: Option<String>,
}

/// 回复
#[derive(Debug, Serialize, Deserialize)]
pub struct ReplyResponse {
    pub reply: String,
}

/// 统计响应
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub service: ServiceStatsSnapshot,
    pub cache: CacheStats,
    pub cache_hit_rate: f64,
}
