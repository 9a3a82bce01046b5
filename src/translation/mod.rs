//! 翻译模块
//!
//! 对话式翻译助手的核心：把用户发来的一段文本或一张图片变成一条纯文本回复。
//!
//! - **language**: 语言代码注册表与融合语言检测
//! - **pipeline**: 指令解析与目标语言决策
//! - **backend**: AI 服务商接口、实现与故障转移选择器
//! - **storage**: 结果缓存、用户资料、使用记录、图片存储
//! - **core**: 请求编排、偏好命令、图片翻译
//! - **config**: 静态配置与运行期可变设置
//! - **error**: 错误处理
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use line_translator::translation::{TranslationConfig, TranslationService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = TranslationService::new(TranslationConfig::default())?;
//! let reply = service.handle_text("U123", "翻譯成日文 你好").await;
//! println!("{}", reply);
//! # Ok(())
//! # }
//! ```

// ============================================================================
// 子模块声明
// ============================================================================

/// AI 后端 - 统一能力接口、两家服务商实现与选择器
pub mod backend;

/// 配置管理模块 - 静态配置、配置文件加载与运行期设置
pub mod config;

/// 核心模块 - 请求编排、命令与图片翻译
pub mod core;

/// 错误处理模块 - 统一的错误类型和处理机制
pub mod error;

/// 语言模块 - 注册表与检测器
pub mod language;

/// 文本处理管道模块 - 指令解析与目标语言决策
pub mod pipeline;

/// 存储管理模块 - 缓存和持久化存储
pub mod storage;

// ============================================================================
// 核心API导出
// ============================================================================

pub use core::{
    HealthLevel, HealthStatus, ImageUpload, ServiceStats, ServiceStatsSnapshot, TranslationService,
    TranslationServiceBuilder,
};

pub use config::{constants, ConfigManager, RuntimeSettings, TranslationConfig};

pub use error::{ErrorCategory, ErrorSeverity, TranslationError, TranslationResult};

pub use backend::{AiBackend, AiBackendSelector, BackendHandle, ProviderId};

pub use storage::{CacheStats, ProfileStore, UsageRecorder, UserProfile};

/// 检查翻译配置文件是否存在
pub fn config_file_exists() -> bool {
    config::config_file_exists()
}

/// 加载配置（`.env`、配置文件、环境变量）并创建使用内存存储的翻译服务
pub fn create_service_from_env() -> TranslationResult<TranslationService> {
    let config = ConfigManager::new()?.into_config();
    TranslationService::new(config)
}
