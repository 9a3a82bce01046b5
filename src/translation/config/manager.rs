//! 配置管理器
//!
//! 提供统一的配置接口：`.env` 文件、配置文件（TOML/JSON）、环境变量覆盖和默认值，
//! 最后统一校验。

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::translation::backend::ProviderId;
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::language::registry;

/// 单个 AI 服务商的配置
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API Key，缺失时该服务商在启动时被标记为不可用
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    /// 用户可通过 /setmodel 选择的模型
    pub available_models: Vec<String>,
    pub timeout_secs: u64,
}

impl ProviderConfig {
    /// 指定服务商的默认配置（无 API Key）
    pub fn defaults_for(provider: ProviderId) -> Self {
        let mut config = Self::default();
        config.fill_defaults(provider);
        config
    }

    /// 为空的字段补上服务商默认值
    pub fn fill_defaults(&mut self, provider: ProviderId) {
        let (url, model, models) = match provider {
            ProviderId::OpenAi => (
                constants::OPENAI_API_URL,
                constants::OPENAI_DEFAULT_MODEL,
                constants::OPENAI_MODELS,
            ),
            ProviderId::Gemini => (
                constants::GEMINI_API_URL,
                constants::GEMINI_DEFAULT_MODEL,
                constants::GEMINI_MODELS,
            ),
        };

        if self.api_url.trim().is_empty() {
            self.api_url = url.to_string();
        }
        if self.model.trim().is_empty() {
            self.model = model.to_string();
        }
        if self.available_models.is_empty() {
            self.available_models = models.iter().map(|m| m.to_string()).collect();
        }
        if !self.available_models.contains(&self.model) {
            self.available_models.insert(0, self.model.clone());
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = constants::DEFAULT_REQUEST_TIMEOUT_SECS;
        }
    }

    /// 是否配置了凭据
    pub fn has_credentials(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}

/// 翻译配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslationConfig {
    // 语言默认值
    pub default_target_for_chinese: String,
    pub default_target_for_others: String,
    pub canonical_chinese: String,
    pub default_provider: ProviderId,

    // 语言检测
    pub ai_detection_enabled: bool,
    /// 检测使用的服务商，未设置时使用默认服务商
    pub detection_provider: Option<ProviderId>,

    // 缓存配置
    pub cache_enabled: bool,
    pub cache_ttl_secs: u64,
    pub cache_max_entries: usize,

    // 图片翻译
    pub image_translation_enabled: bool,
    pub max_image_bytes: usize,

    // 管理员
    pub admin_user_ids: Vec<String>,

    // 服务商（TOML 中的表需放在最后）
    pub openai: ProviderConfig,
    pub gemini: ProviderConfig,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            default_target_for_chinese: constants::DEFAULT_TARGET_FOR_CHINESE.to_string(),
            default_target_for_others: constants::DEFAULT_TARGET_FOR_OTHERS.to_string(),
            canonical_chinese: constants::DEFAULT_CANONICAL_CHINESE.to_string(),
            default_provider: ProviderId::OpenAi,

            ai_detection_enabled: true,
            detection_provider: None,

            openai: ProviderConfig::defaults_for(ProviderId::OpenAi),
            gemini: ProviderConfig::defaults_for(ProviderId::Gemini),

            cache_enabled: true,
            cache_ttl_secs: constants::DEFAULT_CACHE_TTL.as_secs(),
            cache_max_entries: constants::DEFAULT_CACHE_MAX_ENTRIES,

            image_translation_enabled: true,
            max_image_bytes: constants::DEFAULT_MAX_IMAGE_BYTES,

            admin_user_ids: Vec::new(),
        }
    }
}

impl TranslationConfig {
    /// 指定服务商的配置
    pub fn provider(&self, provider: ProviderId) -> &ProviderConfig {
        match provider {
            ProviderId::OpenAi => &self.openai,
            ProviderId::Gemini => &self.gemini,
        }
    }

    /// 为各服务商补齐默认值，并把语言名称规范化为代码
    pub fn normalize(&mut self) {
        self.openai.fill_defaults(ProviderId::OpenAi);
        self.gemini.fill_defaults(ProviderId::Gemini);
        self.default_target_for_chinese = registry::to_language_code(&self.default_target_for_chinese);
        self.default_target_for_others = registry::to_language_code(&self.default_target_for_others);
        self.canonical_chinese = registry::to_language_code(&self.canonical_chinese);
    }

    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        for (field, value) in [
            ("default_target_for_chinese", &self.default_target_for_chinese),
            ("default_target_for_others", &self.default_target_for_others),
        ] {
            if value.trim().is_empty() {
                return Err(TranslationError::ConfigError(format!("{} 不能为空", field)));
            }
            if !registry::is_supported(value) {
                return Err(TranslationError::ConfigError(format!(
                    "{} 不是受支持的语言: {}",
                    field, value
                )));
            }
        }

        if !registry::is_chinese_family(&self.canonical_chinese) {
            return Err(TranslationError::ConfigError(format!(
                "canonical_chinese 必须是中文变体: {}",
                self.canonical_chinese
            )));
        }

        if self.cache_enabled && self.cache_max_entries == 0 {
            return Err(TranslationError::ConfigError("启用缓存时缓存大小不能为0".to_string()));
        }

        if self.cache_enabled && self.cache_ttl_secs == 0 {
            return Err(TranslationError::ConfigError("启用缓存时TTL不能为0".to_string()));
        }

        if self.image_translation_enabled && self.max_image_bytes == 0 {
            return Err(TranslationError::ConfigError("图片大小上限不能为0".to_string()));
        }

        Ok(())
    }

    /// 应用环境变量覆盖
    pub fn apply_env_overrides(&mut self) {
        use crate::env::{cache, core, gemini, openai, translation, EnvResult, EnvVar};

        fn apply<T>(result: Option<EnvResult<T>>, target: &mut T) {
            match result {
                Some(Ok(value)) => *target = value,
                Some(Err(e)) => tracing::warn!("忽略无效的环境变量: {}", e),
                None => {}
            }
        }

        // 翻译相关环境变量
        apply(
            translation::DefaultTargetForChinese::get_if_set(),
            &mut self.default_target_for_chinese,
        );
        apply(
            translation::DefaultTargetForOthers::get_if_set(),
            &mut self.default_target_for_others,
        );
        apply(translation::CanonicalChinese::get_if_set(), &mut self.canonical_chinese);
        apply(translation::AiDetectionEnabled::get_if_set(), &mut self.ai_detection_enabled);
        apply(
            translation::ImageTranslationEnabled::get_if_set(),
            &mut self.image_translation_enabled,
        );

        match translation::DefaultProvider::get_if_set() {
            Some(Ok(provider)) => match provider.parse() {
                Ok(provider) => self.default_provider = provider,
                Err(e) => tracing::warn!("忽略无效的默认服务商: {}", e),
            },
            Some(Err(e)) => tracing::warn!("忽略无效的环境变量: {}", e),
            None => {}
        }

        // 服务商相关环境变量
        if let Some(key) = openai::ApiKey::get_if_set().and_then(Result::ok) {
            self.openai.api_key = Some(key);
        }
        apply(openai::ModelName::get_if_set(), &mut self.openai.model);
        apply(openai::ApiUrl::get_if_set(), &mut self.openai.api_url);
        apply(openai::AvailableModels::get_if_set(), &mut self.openai.available_models);

        if let Some(key) = gemini::ApiKey::get_if_set().and_then(Result::ok) {
            self.gemini.api_key = Some(key);
        }
        apply(gemini::ModelName::get_if_set(), &mut self.gemini.model);
        apply(gemini::ApiUrl::get_if_set(), &mut self.gemini.api_url);
        apply(gemini::AvailableModels::get_if_set(), &mut self.gemini.available_models);

        // 缓存相关环境变量
        apply(cache::Enabled::get_if_set(), &mut self.cache_enabled);
        apply(cache::MaxEntries::get_if_set(), &mut self.cache_max_entries);
        match cache::Ttl::get_if_set() {
            Some(Ok(ttl)) => self.cache_ttl_secs = ttl.as_secs(),
            Some(Err(e)) => tracing::warn!("忽略无效的环境变量: {}", e),
            None => {}
        }

        apply(core::AdminUserIds::get_if_set(), &mut self.admin_user_ids);
    }

    /// 转换为Duration类型
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// 用户是否为管理员
    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admin_user_ids.iter().any(|id| id == user_id)
    }
}

/// 配置管理器
pub struct ConfigManager {
    config: TranslationConfig,
    source: Option<String>,
}

impl ConfigManager {
    /// 按默认搜索路径加载配置
    pub fn new() -> TranslationResult<Self> {
        Self::load_dotenv();

        let mut source = None;
        let mut config = TranslationConfig::default();
        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                config = Self::load_from_file(&expanded_path)?;
                source = Some(expanded_path.into_owned());
                break;
            }
        }

        if source.is_none() {
            tracing::info!("未找到配置文件，使用默认配置");
        }

        Self::finish(config, source)
    }

    /// 从指定文件加载配置（仍然应用环境变量覆盖）
    pub fn from_path(path: &str) -> TranslationResult<Self> {
        Self::load_dotenv();
        let expanded_path = shellexpand::tilde(path).into_owned();
        let config = Self::load_from_file(&expanded_path)?;
        Self::finish(config, Some(expanded_path))
    }

    fn finish(mut config: TranslationConfig, source: Option<String>) -> TranslationResult<Self> {
        config.apply_env_overrides();
        config.normalize();
        config.validate()?;
        Ok(Self { config, source })
    }

    /// 获取配置
    pub fn get_config(&self) -> &TranslationConfig {
        &self.config
    }

    /// 取出配置
    pub fn into_config(self) -> TranslationConfig {
        self.config
    }

    /// 实际使用的配置文件路径
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// 从指定文件加载配置
    pub fn load_from_file(path: &str) -> TranslationResult<TranslationConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TranslationError::ConfigError(format!("读取配置文件失败: {}", e)))?;

        if path.ends_with(".toml") {
            toml::from_str(&content)
                .map_err(|e| TranslationError::ConfigError(format!("解析TOML配置失败: {}", e)))
        } else {
            serde_json::from_str(&content)
                .map_err(|e| TranslationError::ConfigError(format!("解析JSON配置失败: {}", e)))
        }
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        for env_file in constants::ENV_FILES {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> TranslationResult<()> {
        let config = TranslationConfig::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| TranslationError::ConfigError(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TranslationError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = TranslationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.openai.model, "gpt-4o");
        assert_eq!(config.gemini.model, "gemini-1.5-pro");
        assert!(!config.openai.has_credentials());
    }

    #[test]
    fn test_validate_rejects_unknown_default() {
        let mut config = TranslationConfig::default();
        config.default_target_for_others = "klingon".to_string();
        assert!(matches!(config.validate(), Err(TranslationError::ConfigError(_))));

        let mut config = TranslationConfig::default();
        config.canonical_chinese = "ja".to_string();
        assert!(config.validate().is_err());

        let mut config = TranslationConfig::default();
        config.cache_max_entries = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_normalize_maps_names_to_codes() {
        let mut config = TranslationConfig::default();
        config.default_target_for_chinese = "日文".to_string();
        config.gemini.model = String::new();
        config.normalize();
        assert_eq!(config.default_target_for_chinese, "ja");
        assert_eq!(config.gemini.model, "gemini-1.5-pro");
    }

    #[test]
    fn test_fill_defaults_keeps_custom_model_selectable() {
        let mut provider = ProviderConfig {
            model: "gpt-4.1".to_string(),
            ..Default::default()
        };
        provider.fill_defaults(ProviderId::OpenAi);
        assert_eq!(provider.available_models[0], "gpt-4.1");
        assert_eq!(provider.timeout_secs, constants::DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: TranslationConfig = toml::from_str(
            r#"
            default_provider = "gemini"
            admin_user_ids = ["U1"]

            [openai]
            model = "gpt-4o-mini"
            "#,
        )
        .unwrap();
        assert_eq!(config.default_provider, ProviderId::Gemini);
        assert!(config.is_admin("U1"));
        assert_eq!(config.openai.model, "gpt-4o-mini");
        assert_eq!(config.default_target_for_others, "zh-TW");
    }
}
