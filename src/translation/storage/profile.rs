//! 用户资料与资料存储接口

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::translation::backend::ProviderId;
use crate::translation::config::constants::RECENT_LANGUAGES_CAP;
use crate::translation::error::TranslationResult;

/// 翻译类型，用于累计计数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationKind {
    Text,
    Image,
}

/// 用户资料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub preferred_target_language: Option<String>,
    /// 仅在来源为中文时使用
    #[serde(default)]
    pub preferred_chinese_target_language: Option<String>,
    #[serde(default)]
    pub preferred_provider: Option<ProviderId>,
    /// 服务商标识 -> 模型名称
    #[serde(default)]
    pub preferred_models: BTreeMap<String, String>,
    /// 最近使用的目标语言，最新在前
    #[serde(default)]
    pub recent_languages: Vec<String>,
    pub first_interaction_at: DateTime<Utc>,
    pub last_interaction_at: DateTime<Utc>,
    #[serde(default)]
    pub total_translations: u64,
    #[serde(default)]
    pub text_translations: u64,
    #[serde(default)]
    pub image_translations: u64,
}

impl UserProfile {
    /// 首次接触时的默认资料
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            display_name: None,
            preferred_target_language: None,
            preferred_chinese_target_language: None,
            preferred_provider: None,
            preferred_models: BTreeMap::new(),
            recent_languages: Vec::new(),
            first_interaction_at: now,
            last_interaction_at: now,
            total_translations: 0,
            text_translations: 0,
            image_translations: 0,
        }
    }

    pub fn touch(&mut self) {
        self.last_interaction_at = Utc::now();
    }

    pub fn preferred_model(&self, provider: ProviderId) -> Option<&str> {
        self.preferred_models.get(provider.as_str()).map(String::as_str)
    }

    pub fn set_preferred_model(&mut self, provider: ProviderId, model: impl Into<String>) {
        self.preferred_models
            .insert(provider.as_str().to_string(), model.into());
    }

    /// 把目标语言移到最近列表的最前面，最多保留 5 个
    pub fn add_recent_language(&mut self, code: &str) {
        self.recent_languages
            .retain(|existing| !existing.eq_ignore_ascii_case(code));
        self.recent_languages.insert(0, code.to_string());
        self.recent_languages.truncate(RECENT_LANGUAGES_CAP);
    }

    /// 一次成功翻译后的记账
    pub fn record_translation(&mut self, kind: TranslationKind, target_language: &str) {
        self.touch();
        self.total_translations += 1;
        match kind {
            TranslationKind::Text => self.text_translations += 1,
            TranslationKind::Image => self.image_translations += 1,
        }
        self.add_recent_language(target_language);
    }
}

/// 用户资料存储
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_by_user_id(&self, user_id: &str) -> TranslationResult<Option<UserProfile>>;

    async fn save(&self, profile: UserProfile) -> TranslationResult<UserProfile>;
}

/// 内存中的资料存储，未配置 MongoDB 时使用
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    profiles: DashMap<String, UserProfile>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn find_by_user_id(&self, user_id: &str) -> TranslationResult<Option<UserProfile>> {
        Ok(self.profiles.get(user_id).map(|entry| entry.value().clone()))
    }

    async fn save(&self, profile: UserProfile) -> TranslationResult<UserProfile> {
        self.profiles.insert(profile.user_id.clone(), profile.clone());
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_languages_bounded_and_deduplicated() {
        let mut profile = UserProfile::new("U1");
        for code in ["en", "ja", "ko", "fr", "de", "es"] {
            profile.add_recent_language(code);
        }
        assert_eq!(profile.recent_languages, vec!["es", "de", "fr", "ko", "ja"]);

        profile.add_recent_language("fr");
        assert_eq!(profile.recent_languages, vec!["fr", "es", "de", "ko", "ja"]);
    }

    #[test]
    fn test_record_translation_counters() {
        let mut profile = UserProfile::new("U1");
        profile.record_translation(TranslationKind::Text, "ja");
        profile.record_translation(TranslationKind::Image, "en");
        assert_eq!(profile.total_translations, 2);
        assert_eq!(profile.text_translations, 1);
        assert_eq!(profile.image_translations, 1);
        assert_eq!(profile.recent_languages, vec!["en", "ja"]);
        assert!(profile.last_interaction_at >= profile.first_interaction_at);
    }

    #[test]
    fn test_profile_json_roundtrip_keeps_model_map() {
        let mut profile = UserProfile::new("U1");
        profile.preferred_provider = Some(ProviderId::Gemini);
        profile.set_preferred_model(ProviderId::Gemini, "gemini-1.5-flash");
        let json = serde_json::to_string(&profile).unwrap();
        assert!(json.contains("\"gemini\""));
        let back: UserProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back.preferred_model(ProviderId::Gemini), Some("gemini-1.5-flash"));
    }

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemoryProfileStore::new();
        assert!(store.find_by_user_id("U1").await.unwrap().is_none());
        store.save(UserProfile::new("U1")).await.unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.find_by_user_id("U1").await.unwrap().is_some());
    }
}
