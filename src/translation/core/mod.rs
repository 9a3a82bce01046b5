//! 翻译系统核心模块
//!
//! 把解析、检测、目标语言决策、后端选择和缓存串成一次完整的请求处理。
//!
//! - **服务层** (`service.rs`): 文本消息的编排、统计和健康检查
//! - **命令** (`commands.rs`): `/` 开头的偏好与管理命令
//! - **图片** (`image.rs`): 图片文字识别与翻译
//!
//! ```text
//! TranslationService (service.rs)
//!     ├── parse_instruction (pipeline/command.rs)
//!     ├── LanguageDetector (language/detector.rs)
//!     ├── resolve_target (pipeline/resolver.rs)
//!     ├── AiBackendSelector (backend/selector.rs)
//!     ├── ResultCache (storage/cache.rs)
//!     └── ProfileStore / UsageRecorder / ObjectStore (storage/)
//! ```

pub mod commands;
pub mod image;
pub mod service;

/// 统一翻译服务 - 主要的对外接口
pub use service::{TranslationService, TranslationServiceBuilder};

/// 服务运行统计信息
pub use service::{ServiceStats, ServiceStatsSnapshot};

/// 健康检查
pub use service::{HealthLevel, HealthStatus};

pub use image::{ImageContext, ImageUpload, OcrEngine};
