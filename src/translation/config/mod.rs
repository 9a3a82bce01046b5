//! 翻译配置管理模块
//!
//! 静态配置来自配置文件、`.env` 与环境变量；运行期可被管理员修改的
//! 默认值放在 [`RuntimeSettings`] 中。

pub mod manager;
pub mod runtime;

// 重新导出主要类型
pub use manager::{ConfigManager, ProviderConfig, TranslationConfig};
pub use runtime::{LanguageDefaults, RuntimeSettings};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 语言默认值
    pub const DEFAULT_TARGET_FOR_CHINESE: &str = "en";
    pub const DEFAULT_TARGET_FOR_OTHERS: &str = "zh-TW";
    pub const DEFAULT_CANONICAL_CHINESE: &str = "zh";

    // 语言检测
    pub const HAN_RATIO_THRESHOLD: f64 = 0.3;
    pub const MAX_AI_DETECTION_CHARS: usize = 10;

    // 用户资料
    pub const RECENT_LANGUAGES_CAP: usize = 5;

    // 指令词汇
    pub const INSTRUCTION_KEYWORDS: &[&str] = &["翻譯成", "翻译成"];
    pub const QUICK_TRANSLATE_PREFIXES: &[&str] = &["快速翻譯:", "快速翻譯：", "快速翻译:", "快速翻译："];

    // 服务商默认值
    pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
    pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o";
    pub const OPENAI_MODELS: &[&str] = &["gpt-4o", "gpt-4o-mini", "gpt-4-turbo"];
    pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
    pub const GEMINI_DEFAULT_MODEL: &str = "gemini-1.5-pro";
    pub const GEMINI_MODELS: &[&str] = &["gemini-1.5-pro", "gemini-1.5-flash"];
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

    // 缓存设置
    pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600); // 1小时
    pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 10_000;

    // 图片
    pub const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "line-translator.toml",
        "config.toml",
        ".line-translator.toml",
        "~/.config/line-translator/config.toml",
        "/etc/line-translator/config.toml",
    ];

    // .env 文件搜索顺序
    pub const ENV_FILES: &[&str] = &[".env.local", ".env"];
}

/// 是否存在任一默认位置的配置文件
pub fn config_file_exists() -> bool {
    constants::CONFIG_PATHS
        .iter()
        .any(|path| std::path::Path::new(shellexpand::tilde(path).as_ref()).exists())
}
