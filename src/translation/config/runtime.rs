//! 运行期可变的默认设置
//!
//! 管理员命令通过带校验的 setter 修改，解析器和后端选择器通过访问器读取。

use std::sync::{PoisonError, RwLock};

use serde::Serialize;

use super::{constants, TranslationConfig};
use crate::translation::backend::ProviderId;
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::language::registry;

/// 一份默认值快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageDefaults {
    pub default_for_chinese: String,
    pub default_for_others: String,
    pub default_provider: ProviderId,
}

impl Default for LanguageDefaults {
    fn default() -> Self {
        Self {
            default_for_chinese: constants::DEFAULT_TARGET_FOR_CHINESE.to_string(),
            default_for_others: constants::DEFAULT_TARGET_FOR_OTHERS.to_string(),
            default_provider: ProviderId::OpenAi,
        }
    }
}

/// 读多写少的共享设置
#[derive(Debug)]
pub struct RuntimeSettings {
    inner: RwLock<LanguageDefaults>,
}

impl RuntimeSettings {
    pub fn new(defaults: LanguageDefaults) -> Self {
        Self {
            inner: RwLock::new(defaults),
        }
    }

    pub fn from_config(config: &TranslationConfig) -> Self {
        Self::new(LanguageDefaults {
            default_for_chinese: config.default_target_for_chinese.clone(),
            default_for_others: config.default_target_for_others.clone(),
            default_provider: config.default_provider,
        })
    }

    /// 当前默认值的拷贝
    pub fn snapshot(&self) -> LanguageDefaults {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn default_for_chinese(&self) -> String {
        self.snapshot().default_for_chinese
    }

    pub fn default_for_others(&self) -> String {
        self.snapshot().default_for_others
    }

    pub fn default_provider(&self) -> ProviderId {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .default_provider
    }

    /// 设置中文来源的默认目标语言，返回规范化后的代码
    pub fn set_default_for_chinese(&self, language: &str) -> TranslationResult<String> {
        let code = Self::validated_code(language)?;
        self.write(|defaults| defaults.default_for_chinese = code.clone());
        tracing::info!(target_language = %code, "中文来源默认目标语言已更新");
        Ok(code)
    }

    /// 设置其他来源的默认目标语言，返回规范化后的代码
    pub fn set_default_for_others(&self, language: &str) -> TranslationResult<String> {
        let code = Self::validated_code(language)?;
        self.write(|defaults| defaults.default_for_others = code.clone());
        tracing::info!(target_language = %code, "其他来源默认目标语言已更新");
        Ok(code)
    }

    pub fn set_default_provider(&self, provider: ProviderId) {
        self.write(|defaults| defaults.default_provider = provider);
        tracing::info!(%provider, "默认 AI 服务商已更新");
    }

    fn write(&self, update: impl FnOnce(&mut LanguageDefaults)) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        update(&mut guard);
    }

    fn validated_code(language: &str) -> TranslationResult<String> {
        if !registry::is_supported(language) {
            return Err(TranslationError::UnsupportedLanguage(language.trim().to_string()));
        }
        Ok(registry::to_language_code(language))
    }
}
