//! 融合语言检测器
//!
//! 按顺序尝试三种信号，第一个给出结果的即返回：
//!
//! 1. AI 检测：让模型只回答语言代码，清洗后使用
//! 2. 汉字比例：汉字码点占比超过阈值即判为中文
//! 3. n-gram 统计检测（`whatlang`）
//!
//! 所有中文变体都在这里统一规范化为配置的中文变体，解析器之后的环节不再重复判断。

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use whatlang::Lang;

use super::registry::{self, UNKNOWN_LANGUAGE};
use crate::translation::backend::{prompts, AiBackendSelector, ProviderId};
use crate::translation::config::{constants, TranslationConfig};

/// 检测器配置
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    pub ai_detection_enabled: bool,
    pub canonical_chinese: String,
    /// AI 检测使用的服务商，`None` 表示使用默认服务商
    pub provider: Option<ProviderId>,
    pub han_ratio_threshold: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            ai_detection_enabled: true,
            canonical_chinese: constants::DEFAULT_CANONICAL_CHINESE.to_string(),
            provider: None,
            han_ratio_threshold: constants::HAN_RATIO_THRESHOLD,
        }
    }
}

impl From<&TranslationConfig> for DetectionConfig {
    fn from(config: &TranslationConfig) -> Self {
        Self {
            ai_detection_enabled: config.ai_detection_enabled,
            canonical_chinese: config.canonical_chinese.clone(),
            provider: config.detection_provider,
            han_ratio_threshold: constants::HAN_RATIO_THRESHOLD,
        }
    }
}

/// 融合语言检测器
pub struct LanguageDetector {
    config: DetectionConfig,
    selector: Arc<AiBackendSelector>,
    ngram: whatlang::Detector,
}

impl LanguageDetector {
    pub fn new(config: DetectionConfig, selector: Arc<AiBackendSelector>) -> Self {
        Self {
            config,
            selector,
            ngram: whatlang::Detector::new(),
        }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// 检测文本语言，永不失败；所有信号都失败时返回 `unknown`
    pub async fn detect(&self, text: &str) -> String {
        let text = text.trim();
        if text.is_empty() {
            return UNKNOWN_LANGUAGE.to_string();
        }

        if let Some(code) = self.detect_with_ai(text).await {
            tracing::debug!(language = %code, "AI 语言检测完成");
            return code;
        }

        self.detect_offline(text)
    }

    /// 只使用本地信号（汉字比例与 n-gram）检测，不调用 AI
    pub fn detect_offline(&self, text: &str) -> String {
        let text = text.trim();
        if text.is_empty() {
            return UNKNOWN_LANGUAGE.to_string();
        }

        if han_ratio(text) > self.config.han_ratio_threshold {
            return self.config.canonical_chinese.clone();
        }

        self.detect_ngram(text)
    }

    /// 把任何中文变体折叠为配置的规范变体
    pub fn canonicalize(&self, code: &str) -> String {
        if registry::is_chinese_family(code) {
            self.config.canonical_chinese.clone()
        } else {
            code.to_string()
        }
    }

    async fn detect_with_ai(&self, text: &str) -> Option<String> {
        if !self.config.ai_detection_enabled {
            return None;
        }

        let backend = self.selector.select(self.config.provider);
        if !backend.is_available() {
            return None;
        }

        let response = match backend.generate_text(&prompts::detection_prompt(text)).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(provider = backend.provider_id(), "AI 语言检测失败: {}", e);
                return None;
            }
        };

        let sanitized = sanitize_ai_response(&response)?;
        Some(self.canonicalize(&registry::to_language_code(&sanitized)))
    }

    fn detect_ngram(&self, text: &str) -> String {
        match self.ngram.detect_lang(text) {
            Some(Lang::Cmn) => self.config.canonical_chinese.clone(),
            Some(lang) => lang_to_code(lang).unwrap_or(UNKNOWN_LANGUAGE).to_string(),
            None => UNKNOWN_LANGUAGE.to_string(),
        }
    }
}

/// 清洗模型返回的语言代码
///
/// 去除首尾空白，只取第一行的前若干字符，只保留 ASCII 字母和连字符并转小写。
/// 结果为空或为 `unknown` 时返回 `None`。
pub fn sanitize_ai_response(response: &str) -> Option<String> {
    let first_line = response.trim().lines().next().unwrap_or_default();
    let code: String = first_line
        .chars()
        .take(constants::MAX_AI_DETECTION_CHARS)
        .filter(|c| c.is_ascii_alphabetic() || *c == '-')
        .collect::<String>()
        .to_lowercase();

    if code.is_empty() || code == UNKNOWN_LANGUAGE {
        None
    } else {
        Some(code)
    }
}

/// 汉字码点占全部码点的比例
pub fn han_ratio(text: &str) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }

    let han = HAN_CHARACTER.find_iter(text).count();
    han as f64 / total as f64
}

/// Unicode Han 文字：统一表意文字各扩展区、部首、々 和 〇
static HAN_CHARACTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{Han}").unwrap());

fn lang_to_code(lang: Lang) -> Option<&'static str> {
    let code = match lang {
        Lang::Eng => "en",
        Lang::Jpn => "ja",
        Lang::Kor => "ko",
        Lang::Fra => "fr",
        Lang::Deu => "de",
        Lang::Spa => "es",
        Lang::Por => "pt",
        Lang::Ita => "it",
        Lang::Rus => "ru",
        Lang::Ara => "ar",
        Lang::Tha => "th",
        Lang::Vie => "vi",
        Lang::Ind => "id",
        Lang::Nld => "nl",
        Lang::Ell => "el",
        Lang::Pol => "pl",
        Lang::Tur => "tr",
        Lang::Ces => "cs",
        Lang::Swe => "sv",
        Lang::Dan => "da",
        Lang::Fin => "fi",
        Lang::Hin => "hi",
        Lang::Ukr => "uk",
        Lang::Heb => "he",
        Lang::Hun => "hu",
        Lang::Nob => "nb",
        Lang::Tgl => "tl",
        _ => return None,
    };
    Some(code)
}
