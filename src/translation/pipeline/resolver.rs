//! 目标语言解析
//!
//! 按「明确指定 → 用户偏好 → 系统默认」的顺序决定目标语言，
//! 并保证不会返回与来源同一语系的语言（中文变体视为同一语系），
//! 除非所有候选都与来源同族。

use crate::translation::config::LanguageDefaults;
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::language::registry;
use crate::translation::storage::profile::UserProfile;

/// 解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub target_language_code: String,
    pub detected_source_language_code: String,
}

/// 决定目标语言
///
/// `detected_source` 应当已由检测器规范化。明确指定的语言必须在注册表中，
/// 否则返回 [`TranslationError::UnsupportedLanguage`]。
pub fn resolve_target(
    detected_source: &str,
    explicit_target: Option<&str>,
    profile: &UserProfile,
    defaults: &LanguageDefaults,
) -> TranslationResult<ResolvedTarget> {
    let target_language_code = match explicit_target {
        Some(explicit) => {
            if !registry::is_supported(explicit) {
                return Err(TranslationError::UnsupportedLanguage(explicit.trim().to_string()));
            }
            registry::to_language_code(explicit)
        }
        None => resolve_implicit(detected_source, profile, defaults),
    };

    Ok(ResolvedTarget {
        target_language_code,
        detected_source_language_code: detected_source.to_string(),
    })
}

fn resolve_implicit(detected_source: &str, profile: &UserProfile, defaults: &LanguageDefaults) -> String {
    let candidates: [Option<&str>; 3] = if registry::is_chinese_family(detected_source) {
        [
            profile.preferred_chinese_target_language.as_deref(),
            Some(defaults.default_for_chinese.as_str()),
            Some(defaults.default_for_others.as_str()),
        ]
    } else {
        [
            profile.preferred_target_language.as_deref(),
            Some(defaults.default_for_others.as_str()),
            Some(defaults.default_for_chinese.as_str()),
        ]
    };

    let mut candidates = candidates
        .into_iter()
        .flatten()
        .filter(|code| registry::is_supported(code))
        .map(registry::to_language_code);

    // 全部同族时退回该来源对应的系统默认值
    let fallback = if registry::is_chinese_family(detected_source) {
        defaults.default_for_chinese.clone()
    } else {
        defaults.default_for_others.clone()
    };

    candidates
        .find(|code| !registry::same_family(code, detected_source))
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::backend::ProviderId;
    use crate::translation::language::UNKNOWN_LANGUAGE;

    fn defaults() -> LanguageDefaults {
        LanguageDefaults {
            default_for_chinese: "en".to_string(),
            default_for_others: "zh-TW".to_string(),
            default_provider: ProviderId::OpenAi,
        }
    }

    fn target(source: &str, explicit: Option<&str>, profile: &UserProfile) -> String {
        resolve_target(source, explicit, profile, &defaults())
            .unwrap()
            .target_language_code
    }

    #[test]
    fn test_explicit_target_wins() {
        let profile = UserProfile::new("u1");
        assert_eq!(target("zh", Some("ja"), &profile), "ja");
        assert_eq!(target("zh", Some("日文"), &profile), "ja");
        assert_eq!(target("en", Some("en"), &profile), "en");
    }

    #[test]
    fn test_unknown_explicit_target_is_rejected() {
        let profile = UserProfile::new("u1");
        let err = resolve_target("zh", Some("klingon"), &profile, &defaults()).unwrap_err();
        assert!(matches!(err, TranslationError::UnsupportedLanguage(name) if name == "klingon"));
    }

    #[test]
    fn test_chinese_source() {
        let mut profile = UserProfile::new("u1");
        assert_eq!(target("zh", None, &profile), "en");

        profile.preferred_chinese_target_language = Some("vi".to_string());
        assert_eq!(target("zh", None, &profile), "vi");

        // 中文偏好不会导致中文到中文
        profile.preferred_chinese_target_language = Some("zh-CN".to_string());
        assert_eq!(target("zh", None, &profile), "en");
    }

    #[test]
    fn test_other_source() {
        let mut profile = UserProfile::new("u1");
        assert_eq!(target("en", None, &profile), "zh-TW");

        profile.preferred_target_language = Some("ja".to_string());
        assert_eq!(target("en", None, &profile), "ja");

        // 偏好与来源同族时退回系统默认
        assert_eq!(target("ja", None, &profile), "zh-TW");
    }

    #[test]
    fn test_never_returns_source_family() {
        let profile = UserProfile::new("u1");
        let defaults = LanguageDefaults {
            default_for_chinese: "zh-TW".to_string(),
            default_for_others: "en".to_string(),
            default_provider: ProviderId::OpenAi,
        };
        let resolved = resolve_target("zh", None, &profile, &defaults).unwrap();
        assert_eq!(resolved.target_language_code, "en");

        let resolved = resolve_target("en", None, &profile, &defaults).unwrap();
        assert_eq!(resolved.target_language_code, "zh-TW");
    }

    #[test]
    fn test_all_candidates_same_family_falls_back() {
        let profile = UserProfile::new("u1");
        let defaults = LanguageDefaults {
            default_for_chinese: "zh-TW".to_string(),
            default_for_others: "zh-CN".to_string(),
            default_provider: ProviderId::OpenAi,
        };
        let resolved = resolve_target("zh", None, &profile, &defaults).unwrap();
        assert_eq!(resolved.target_language_code, "zh-TW");
    }

    #[test]
    fn test_unknown_source_uses_others_branch() {
        let profile = UserProfile::new("u1");
        let resolved = resolve_target(UNKNOWN_LANGUAGE, None, &profile, &defaults()).unwrap();
        assert_eq!(resolved.target_language_code, "zh-TW");
        assert_eq!(resolved.detected_source_language_code, UNKNOWN_LANGUAGE);
    }
}
