//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量访问。每个变量是一个实现了 [`EnvVar`] 的
//! 单元结构体，按用途分组在子模块中。

use std::env;
use std::fmt;
use std::time::Duration;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    /// 仅在变量被显式设置时解析，未设置返回 `None`
    ///
    /// 配置覆盖使用这个方法，避免默认值覆盖配置文件中的取值。
    fn get_if_set() -> Option<EnvResult<T>> {
        match env::var(Self::NAME) {
            Ok(value) if !value.trim().is_empty() => Some(Self::parse(&value)),
            _ => None,
        }
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "LINE_TRANSLATOR_LOG_LEVEL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!("Invalid log level '{}'. Use: trace, debug, info, warn, error", value),
                }),
            }
        }
    }

    /// 管理员用户 ID 列表
    pub struct AdminUserIds;
    impl EnvVar<Vec<String>> for AdminUserIds {
        const NAME: &'static str = "LINE_TRANSLATOR_ADMIN_USER_IDS";
        const DEFAULT: Option<Vec<String>> = None;
        const DESCRIPTION: &'static str = "User ids allowed to run /admin commands (comma-separated)";

        fn parse(value: &str) -> EnvResult<Vec<String>> {
            Ok(parse_list(value))
        }
    }
}

/// 翻译相关环境变量
pub mod translation {
    use super::*;

    /// 中文来源的系统默认目标语言
    pub struct DefaultTargetForChinese;
    impl EnvVar<String> for DefaultTargetForChinese {
        const NAME: &'static str = "LINE_TRANSLATOR_DEFAULT_TARGET_ZH";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Default target language when the source is Chinese";

        fn parse(value: &str) -> EnvResult<String> {
            parse_non_empty(value, Self::NAME)
        }
    }

    /// 其他来源的系统默认目标语言
    pub struct DefaultTargetForOthers;
    impl EnvVar<String> for DefaultTargetForOthers {
        const NAME: &'static str = "LINE_TRANSLATOR_DEFAULT_TARGET_OTHERS";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Default target language when the source is not Chinese";

        fn parse(value: &str) -> EnvResult<String> {
            parse_non_empty(value, Self::NAME)
        }
    }

    /// 默认 AI 服务商
    pub struct DefaultProvider;
    impl EnvVar<String> for DefaultProvider {
        const NAME: &'static str = "LINE_TRANSLATOR_DEFAULT_PROVIDER";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Default AI provider: openai or gemini";

        fn parse(value: &str) -> EnvResult<String> {
            match value.trim().to_lowercase().as_str() {
                provider @ ("openai" | "gemini") => Ok(provider.to_string()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!("Invalid provider '{}'. Use: openai, gemini", value),
                }),
            }
        }
    }

    /// 中文规范变体
    pub struct CanonicalChinese;
    impl EnvVar<String> for CanonicalChinese {
        const NAME: &'static str = "LINE_TRANSLATOR_CANONICAL_CHINESE";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Chinese variant all detected Chinese collapses to (zh, zh-TW, zh-CN)";

        fn parse(value: &str) -> EnvResult<String> {
            let value = value.trim();
            if !value.to_lowercase().starts_with("zh") {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!("'{}' is not a Chinese variant", value),
                });
            }
            Ok(value.to_string())
        }
    }

    /// AI 语言检测开关
    pub struct AiDetectionEnabled;
    impl EnvVar<bool> for AiDetectionEnabled {
        const NAME: &'static str = "LINE_TRANSLATOR_AI_DETECTION";
        const DEFAULT: Option<bool> = Some(true);
        const DESCRIPTION: &'static str = "Ask the AI backend to detect the source language first";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }

    /// 图片翻译开关
    pub struct ImageTranslationEnabled;
    impl EnvVar<bool> for ImageTranslationEnabled {
        const NAME: &'static str = "LINE_TRANSLATOR_IMAGE_ENABLED";
        const DEFAULT: Option<bool> = Some(true);
        const DESCRIPTION: &'static str = "Enable text recognition and translation for images";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }
}

/// OpenAI 相关环境变量
pub mod openai {
    use super::*;

    pub struct ApiKey;
    impl EnvVar<String> for ApiKey {
        const NAME: &'static str = "OPENAI_API_KEY";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "OpenAI API key; the provider is unavailable without it";

        fn parse(value: &str) -> EnvResult<String> {
            parse_non_empty(value, Self::NAME)
        }
    }

    pub struct ModelName;
    impl EnvVar<String> for ModelName {
        const NAME: &'static str = "OPENAI_MODEL_NAME";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Default OpenAI model";

        fn parse(value: &str) -> EnvResult<String> {
            parse_non_empty(value, Self::NAME)
        }
    }

    pub struct ApiUrl;
    impl EnvVar<String> for ApiUrl {
        const NAME: &'static str = "OPENAI_API_URL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Chat completions endpoint";

        fn parse(value: &str) -> EnvResult<String> {
            parse_url(value, Self::NAME)
        }
    }

    pub struct AvailableModels;
    impl EnvVar<Vec<String>> for AvailableModels {
        const NAME: &'static str = "OPENAI_AVAILABLE_MODELS";
        const DEFAULT: Option<Vec<String>> = None;
        const DESCRIPTION: &'static str = "Models users may pick with /setmodel (comma-separated)";

        fn parse(value: &str) -> EnvResult<Vec<String>> {
            Ok(parse_list(value))
        }
    }
}

/// Gemini 相关环境变量
pub mod gemini {
    use super::*;

    pub struct ApiKey;
    impl EnvVar<String> for ApiKey {
        const NAME: &'static str = "GEMINI_API_KEY";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Gemini API key; the provider is unavailable without it";

        fn parse(value: &str) -> EnvResult<String> {
            parse_non_empty(value, Self::NAME)
        }
    }

    pub struct ModelName;
    impl EnvVar<String> for ModelName {
        const NAME: &'static str = "GEMINI_MODEL_NAME";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Default Gemini model";

        fn parse(value: &str) -> EnvResult<String> {
            parse_non_empty(value, Self::NAME)
        }
    }

    pub struct ApiUrl;
    impl EnvVar<String> for ApiUrl {
        const NAME: &'static str = "GEMINI_API_URL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Base URL of the generateContent models endpoint";

        fn parse(value: &str) -> EnvResult<String> {
            parse_url(value, Self::NAME)
        }
    }

    pub struct AvailableModels;
    impl EnvVar<Vec<String>> for AvailableModels {
        const NAME: &'static str = "GEMINI_AVAILABLE_MODELS";
        const DEFAULT: Option<Vec<String>> = None;
        const DESCRIPTION: &'static str = "Models users may pick with /setmodel (comma-separated)";

        fn parse(value: &str) -> EnvResult<Vec<String>> {
            Ok(parse_list(value))
        }
    }
}

/// 缓存相关环境变量
pub mod cache {
    use super::*;

    /// 缓存启用状态
    pub struct Enabled;
    impl EnvVar<bool> for Enabled {
        const NAME: &'static str = "LINE_TRANSLATOR_CACHE_ENABLED";
        const DEFAULT: Option<bool> = Some(true);
        const DESCRIPTION: &'static str = "Enable the translation result cache";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }

    /// 缓存TTL
    pub struct Ttl;
    impl EnvVar<Duration> for Ttl {
        const NAME: &'static str = "LINE_TRANSLATOR_CACHE_TTL";
        const DEFAULT: Option<Duration> = Some(Duration::from_secs(3600));
        const DESCRIPTION: &'static str = "Cache TTL in seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            let seconds: u64 = value.trim().parse().map_err(|_| EnvError {
                variable: Self::NAME.to_string(),
                message: "Must be a valid number of seconds".to_string(),
            })?;

            if seconds == 0 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "TTL must be greater than 0".to_string(),
                });
            }

            if seconds > 86400 * 7 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "TTL too long (maximum 7 days)".to_string(),
                });
            }

            Ok(Duration::from_secs(seconds))
        }
    }

    /// 缓存最大条目数
    pub struct MaxEntries;
    impl EnvVar<usize> for MaxEntries {
        const NAME: &'static str = "LINE_TRANSLATOR_CACHE_MAX_ENTRIES";
        const DEFAULT: Option<usize> = Some(10_000);
        const DESCRIPTION: &'static str = "Maximum number of cached translations";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 10_000_000)
        }
    }
}

/// Web服务器相关环境变量
pub mod web {
    use super::*;

    /// 绑定地址
    pub struct BindAddress;
    impl EnvVar<String> for BindAddress {
        const NAME: &'static str = "LINE_TRANSLATOR_BIND_ADDRESS";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Web server bind address";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("127.0.0.1".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            parse_non_empty(value, Self::NAME)
        }
    }

    /// 端口
    pub struct Port;
    impl EnvVar<u16> for Port {
        const NAME: &'static str = "LINE_TRANSLATOR_PORT";
        const DEFAULT: Option<u16> = Some(7080);
        const DESCRIPTION: &'static str = "Web server port";

        fn parse(value: &str) -> EnvResult<u16> {
            match value.trim().parse::<u16>() {
                Ok(port) if port > 0 => Ok(port),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Must be a valid port number (1-65535)".to_string(),
                }),
            }
        }
    }

    /// 上传图片的保存目录
    pub struct UploadDir;
    impl EnvVar<String> for UploadDir {
        const NAME: &'static str = "LINE_TRANSLATOR_UPLOAD_DIR";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Directory for uploaded images";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("uploads".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            parse_non_empty(value, Self::NAME)
        }
    }

    /// 上传图片对外可访问的基础 URL
    pub struct PublicBaseUrl;
    impl EnvVar<String> for PublicBaseUrl {
        const NAME: &'static str = "LINE_TRANSLATOR_PUBLIC_BASE_URL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Public base URL under which uploaded images are served";

        fn parse(value: &str) -> EnvResult<String> {
            parse_url(value, Self::NAME)
        }
    }
}

/// MongoDB相关环境变量
pub mod mongodb {
    use super::*;

    /// MongoDB连接字符串，未设置时使用内存存储
    pub struct ConnectionString;
    impl EnvVar<String> for ConnectionString {
        const NAME: &'static str = "MONGODB_URL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "MongoDB connection string; profiles stay in memory when unset";

        fn parse(value: &str) -> EnvResult<String> {
            let url = value.trim();
            if !url.starts_with("mongodb://") && !url.starts_with("mongodb+srv://") {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Must start with mongodb:// or mongodb+srv://".to_string(),
                });
            }
            Ok(url.to_string())
        }
    }

    /// 数据库名称
    pub struct DatabaseName;
    impl EnvVar<String> for DatabaseName {
        const NAME: &'static str = "MONGODB_DATABASE";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "MongoDB database name";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("line_translator".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            parse_non_empty(value, Self::NAME)
        }
    }
}

/// 辅助函数
fn parse_bool(value: &str, var_name: &str) -> EnvResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enabled" => Ok(true),
        "false" | "0" | "no" | "off" | "disabled" => Ok(false),
        _ => Err(EnvError {
            variable: var_name.to_string(),
            message: format!(
                "Invalid boolean value '{}'. Use: true/false, 1/0, yes/no, on/off, enabled/disabled",
                value
            ),
        }),
    }
}

fn parse_non_empty(value: &str, var_name: &str) -> EnvResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: "Value cannot be empty".to_string(),
        });
    }
    Ok(value.to_string())
}

fn parse_url(value: &str, var_name: &str) -> EnvResult<String> {
    let value = parse_non_empty(value, var_name)?;
    if !value.starts_with("http://") && !value.starts_with("https://") {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("'{}' is not an http(s) URL", value),
        });
    }
    Ok(value.trim_end_matches('/').to_string())
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_positive_usize(value: &str, var_name: &str, min: usize, max: usize) -> EnvResult<usize> {
    let num: usize = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive number".to_string(),
    })?;

    if num < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", num, min),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

/// 列出所有已知环境变量及说明
pub fn describe_all() -> Vec<(&'static str, &'static str)> {
    vec![
        (core::LogLevel::NAME, core::LogLevel::DESCRIPTION),
        (core::AdminUserIds::NAME, core::AdminUserIds::DESCRIPTION),
        (translation::DefaultTargetForChinese::NAME, translation::DefaultTargetForChinese::DESCRIPTION),
        (translation::DefaultTargetForOthers::NAME, translation::DefaultTargetForOthers::DESCRIPTION),
        (translation::DefaultProvider::NAME, translation::DefaultProvider::DESCRIPTION),
        (translation::CanonicalChinese::NAME, translation::CanonicalChinese::DESCRIPTION),
        (translation::AiDetectionEnabled::NAME, translation::AiDetectionEnabled::DESCRIPTION),
        (translation::ImageTranslationEnabled::NAME, translation::ImageTranslationEnabled::DESCRIPTION),
        (openai::ApiKey::NAME, openai::ApiKey::DESCRIPTION),
        (openai::ModelName::NAME, openai::ModelName::DESCRIPTION),
        (openai::ApiUrl::NAME, openai::ApiUrl::DESCRIPTION),
        (openai::AvailableModels::NAME, openai::AvailableModels::DESCRIPTION),
        (gemini::ApiKey::NAME, gemini::ApiKey::DESCRIPTION),
        (gemini::ModelName::NAME, gemini::ModelName::DESCRIPTION),
        (gemini::ApiUrl::NAME, gemini::ApiUrl::DESCRIPTION),
        (gemini::AvailableModels::NAME, gemini::AvailableModels::DESCRIPTION),
        (cache::Enabled::NAME, cache::Enabled::DESCRIPTION),
        (cache::Ttl::NAME, cache::Ttl::DESCRIPTION),
        (cache::MaxEntries::NAME, cache::MaxEntries::DESCRIPTION),
        (web::BindAddress::NAME, web::BindAddress::DESCRIPTION),
        (web::Port::NAME, web::Port::DESCRIPTION),
        (web::UploadDir::NAME, web::UploadDir::DESCRIPTION),
        (web::PublicBaseUrl::NAME, web::PublicBaseUrl::DESCRIPTION),
        (mongodb::ConnectionString::NAME, mongodb::ConnectionString::DESCRIPTION),
        (mongodb::DatabaseName::NAME, mongodb::DatabaseName::DESCRIPTION),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("Yes", "X").ok(), Some(true));
        assert_eq!(parse_bool("off", "X").ok(), Some(false));
        assert!(parse_bool("maybe", "X").is_err());
    }

    #[test]
    fn test_parsers_validate_values() {
        assert!(translation::DefaultProvider::parse("Gemini").is_ok());
        assert!(translation::DefaultProvider::parse("claude").is_err());
        assert!(translation::CanonicalChinese::parse("zh-TW").is_ok());
        assert!(translation::CanonicalChinese::parse("ja").is_err());
        assert!(mongodb::ConnectionString::parse("postgres://x").is_err());
        assert!(cache::Ttl::parse("0").is_err());
        assert_eq!(
            openai::ApiUrl::parse("https://api.example.com/v1/").ok().as_deref(),
            Some("https://api.example.com/v1")
        );
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            openai::AvailableModels::parse("gpt-4o, gpt-4o-mini,,").unwrap(),
            vec!["gpt-4o".to_string(), "gpt-4o-mini".to_string()]
        );
    }

    #[test]
    fn test_describe_all_has_unique_names() {
        let names: std::collections::HashSet<_> = describe_all().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names.len(), describe_all().len());
    }
}
