//! 翻译模块统一错误处理
//!
//! 提供结构化错误类型和错误处理机制。所有错误最终都会在请求编排器中
//! 被转换为发给用户的纯文本回复，不会向上传播为进程级故障。

use std::fmt;

use thiserror::Error;

/// 翻译错误类型
#[derive(Error, Debug, Clone)]
pub enum TranslationError {
    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 网络错误
    #[error("网络错误: {0}")]
    NetworkError(String),

    /// 输入验证错误
    #[error("输入无效: {0}")]
    InvalidInput(String),

    /// 不支持的语言
    #[error("不支持的语言: {0}")]
    UnsupportedLanguage(String),

    /// 解析错误
    #[error("解析错误: {0}")]
    ParseError(String),

    /// AI 服务返回的错误
    #[error("AI 服务错误: {0}")]
    ProviderError(String),

    /// 没有任何可用的 AI 后端
    #[error("没有可用的 AI 服务")]
    BackendUnavailable,

    /// 持久化存储错误
    #[error("存储错误: {0}")]
    StorageError(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    SerializationError(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl TranslationError {
    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TranslationError::ConfigError(_) => ErrorSeverity::Critical,
            TranslationError::NetworkError(_) => ErrorSeverity::Warning,
            TranslationError::InvalidInput(_) => ErrorSeverity::Info,
            TranslationError::UnsupportedLanguage(_) => ErrorSeverity::Info,
            TranslationError::ParseError(_) => ErrorSeverity::Error,
            TranslationError::ProviderError(_) => ErrorSeverity::Error,
            TranslationError::BackendUnavailable => ErrorSeverity::Critical,
            TranslationError::StorageError(_) => ErrorSeverity::Warning,
            TranslationError::SerializationError(_) => ErrorSeverity::Error,
            TranslationError::InternalError(_) => ErrorSeverity::Critical,
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            TranslationError::ConfigError(_) => ErrorCategory::Configuration,
            TranslationError::NetworkError(_) => ErrorCategory::Network,
            TranslationError::InvalidInput(_) => ErrorCategory::Input,
            TranslationError::UnsupportedLanguage(_) => ErrorCategory::Input,
            TranslationError::ParseError(_) => ErrorCategory::Parsing,
            TranslationError::ProviderError(_) => ErrorCategory::Service,
            TranslationError::BackendUnavailable => ErrorCategory::Service,
            TranslationError::StorageError(_) => ErrorCategory::Storage,
            TranslationError::SerializationError(_) => ErrorCategory::Serialization,
            TranslationError::InternalError(_) => ErrorCategory::Internal,
        }
    }

    /// 创建带上下文的错误
    pub fn with_context<T: fmt::Display>(mut self, context: T) -> Self {
        match &mut self {
            TranslationError::ConfigError(ref mut msg)
            | TranslationError::NetworkError(ref mut msg)
            | TranslationError::InvalidInput(ref mut msg)
            | TranslationError::UnsupportedLanguage(ref mut msg)
            | TranslationError::ParseError(ref mut msg)
            | TranslationError::ProviderError(ref mut msg)
            | TranslationError::StorageError(ref mut msg)
            | TranslationError::SerializationError(ref mut msg)
            | TranslationError::InternalError(ref mut msg) => {
                *msg = format!("{} (上下文: {})", msg, context);
            }
            TranslationError::BackendUnavailable => {}
        }

        self
    }

    /// 面向用户的简短原因，不带中文分类前缀
    pub fn reason(&self) -> String {
        match self {
            TranslationError::ConfigError(msg)
            | TranslationError::NetworkError(msg)
            | TranslationError::InvalidInput(msg)
            | TranslationError::UnsupportedLanguage(msg)
            | TranslationError::ParseError(msg)
            | TranslationError::ProviderError(msg)
            | TranslationError::StorageError(msg)
            | TranslationError::SerializationError(msg)
            | TranslationError::InternalError(msg) => msg.clone(),
            TranslationError::BackendUnavailable => "no AI backend is available".to_string(),
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Input,
    Parsing,
    Service,
    Storage,
    Serialization,
    Internal,
}

/// 标准错误转换
impl From<std::io::Error> for TranslationError {
    fn from(error: std::io::Error) -> Self {
        TranslationError::StorageError(format!("IO错误: {}", error))
    }
}

impl From<serde_json::Error> for TranslationError {
    fn from(error: serde_json::Error) -> Self {
        TranslationError::SerializationError(format!("JSON序列化错误: {}", error))
    }
}

impl From<toml::de::Error> for TranslationError {
    fn from(error: toml::de::Error) -> Self {
        TranslationError::ParseError(format!("TOML解析错误: {}", error))
    }
}

impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            TranslationError::SerializationError(format!("响应解析失败: {}", error))
        } else {
            TranslationError::NetworkError(error.to_string())
        }
    }
}

#[cfg(feature = "web")]
impl From<mongodb::error::Error> for TranslationError {
    fn from(error: mongodb::error::Error) -> Self {
        TranslationError::StorageError(format!("MongoDB错误: {}", error))
    }
}

/// 错误结果类型别名
pub type TranslationResult<T> = Result<T, TranslationError>;

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 按严重程度记录错误，不改变控制流
    pub fn log_error(error: &TranslationError) {
        match error.severity() {
            ErrorSeverity::Info => tracing::info!("翻译信息: {}", error),
            ErrorSeverity::Warning => tracing::warn!("翻译警告: {}", error),
            ErrorSeverity::Error => tracing::error!("翻译错误: {}", error),
            ErrorSeverity::Critical => tracing::error!("翻译严重错误: {}", error),
        }
    }

    /// 创建网络错误
    pub fn network_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::NetworkError(msg.to_string())
    }

    /// 创建配置错误
    pub fn config_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::ConfigError(msg.to_string())
    }

    /// 创建 AI 服务错误
    pub fn provider_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::ProviderError(msg.to_string())
    }

    /// 创建存储错误
    pub fn storage_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::StorageError(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_and_category() {
        let err = TranslationError::UnsupportedLanguage("xx".to_string());
        assert_eq!(err.severity(), ErrorSeverity::Info);
        assert_eq!(err.category(), ErrorCategory::Input);

        assert_eq!(
            TranslationError::BackendUnavailable.severity(),
            ErrorSeverity::Critical
        );
    }

    #[test]
    fn test_with_context_keeps_variant() {
        let err = helpers::provider_error("HTTP 500").with_context("openai");
        match err {
            TranslationError::ProviderError(msg) => {
                assert!(msg.contains("HTTP 500"));
                assert!(msg.contains("openai"));
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_reason_strips_prefix() {
        let err = helpers::network_error("connection refused");
        assert_eq!(err.reason(), "connection refused");
        assert!(err.to_string().starts_with("网络错误"));
    }
}
