//! # Line Translator
//!
//! 对话式翻译机器人的核心库：解析用户指令、融合多种信号检测语言、
//! 按偏好与默认值决定目标语言，并在多个 AI 服务商之间自动故障转移。
//!
//! ## 模块组织
//!
//! - `env` - 类型化的环境变量
//! - `translation` - 翻译核心
//! - `web` - HTTP 服务（可选，`web` 特性）

pub mod env;
pub mod translation;
#[cfg(feature = "web")]
pub mod web;

// Re-export commonly used items for convenience
pub use translation::{TranslationConfig, TranslationError, TranslationResult, TranslationService};
