//! 翻译请求编排
//!
//! 每条消息的处理顺序：
//!
//! ```text
//! 读取/创建用户资料 → 解析指令 → 检测来源语言 → 决定目标语言
//!     → 选择后端 → 查缓存或翻译 → 写使用记录、更新用户资料 → 回复
//! ```
//!
//! 所有错误都在这里转成纯文本回复；持久化失败只记录日志，不影响回复。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;

use super::image::OcrEngine;
use crate::translation::backend::selector::build_handles;
use crate::translation::backend::{
    AiBackendSelector, BackendHandle, ProviderId, SelectedBackend, SERVICE_UNAVAILABLE_MESSAGE,
};
use crate::translation::config::{RuntimeSettings, TranslationConfig};
use crate::translation::error::{helpers, TranslationError, TranslationResult};
use crate::translation::language::{registry, DetectionConfig, LanguageDetector};
use crate::translation::pipeline::{parse_instruction, resolve_target, ResolvedTarget};
use crate::translation::storage::{
    CacheConfig, CacheStats, CachedTranslation, InMemoryProfileStore, InMemoryUsageRecorder,
    ObjectStore, ProfileStore, ResultCache, TranslationKind, TranslationRecord, UsageRecorder,
    UserProfile,
};

/// 统一的翻译服务
///
/// 所有字段都可以在多个请求之间共享；请求之间唯一的共享可变状态是
/// 结果缓存、运行期默认设置和统计计数器。
pub struct TranslationService {
    pub(super) config: Arc<TranslationConfig>,
    pub(super) settings: Arc<RuntimeSettings>,
    pub(super) selector: Arc<AiBackendSelector>,
    pub(super) detector: LanguageDetector,
    pub(super) cache: ResultCache,
    pub(super) profiles: Arc<dyn ProfileStore>,
    pub(super) usage: Arc<dyn UsageRecorder>,
    pub(super) objects: Option<Arc<dyn ObjectStore>>,
    pub(super) ocr: Option<Arc<dyn OcrEngine>>,
    pub(super) stats: ServiceStats,
}

/// 翻译服务构建器
pub struct TranslationServiceBuilder {
    config: TranslationConfig,
    handles: Option<Vec<BackendHandle>>,
    profiles: Option<Arc<dyn ProfileStore>>,
    usage: Option<Arc<dyn UsageRecorder>>,
    objects: Option<Arc<dyn ObjectStore>>,
    ocr: Option<Arc<dyn OcrEngine>>,
}

impl TranslationServiceBuilder {
    /// 使用给定的后端句柄，而不是根据配置中的凭据构建
    pub fn backends(mut self, handles: Vec<BackendHandle>) -> Self {
        self.handles = Some(handles);
        self
    }

    pub fn profile_store(mut self, store: Arc<dyn ProfileStore>) -> Self {
        self.profiles = Some(store);
        self
    }

    pub fn usage_recorder(mut self, recorder: Arc<dyn UsageRecorder>) -> Self {
        self.usage = Some(recorder);
        self
    }

    pub fn object_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.objects = Some(store);
        self
    }

    pub fn ocr_engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.ocr = Some(engine);
        self
    }

    pub fn build(self) -> TranslationResult<TranslationService> {
        let mut config = self.config;
        config.normalize();
        config.validate()?;

        let settings = Arc::new(RuntimeSettings::from_config(&config));
        let handles = self.handles.unwrap_or_else(|| build_handles(&config));
        let selector = Arc::new(AiBackendSelector::new(handles, settings.clone()));
        let detector = LanguageDetector::new(DetectionConfig::from(&config), selector.clone());
        let cache = ResultCache::new(CacheConfig::from(&config));

        tracing::info!(
            default_provider = %settings.default_provider(),
            cache_enabled = config.cache_enabled,
            "翻译服务初始化完成"
        );

        Ok(TranslationService {
            config: Arc::new(config),
            settings,
            selector,
            detector,
            cache,
            profiles: self
                .profiles
                .unwrap_or_else(|| Arc::new(InMemoryProfileStore::new())),
            usage: self
                .usage
                .unwrap_or_else(|| Arc::new(InMemoryUsageRecorder::new())),
            objects: self.objects,
            ocr: self.ocr,
            stats: ServiceStats::default(),
        })
    }
}

/// 一次成功翻译需要落盘的内容
pub(super) struct CompletedTranslation<'a> {
    pub source_text: &'a str,
    pub resolved: &'a ResolvedTarget,
    pub backend: &'a SelectedBackend,
    pub result: &'a CachedTranslation,
    pub kind: TranslationKind,
    pub image_url: Option<String>,
    pub started: Instant,
}

impl TranslationService {
    pub fn builder(config: TranslationConfig) -> TranslationServiceBuilder {
        TranslationServiceBuilder {
            config,
            handles: None,
            profiles: None,
            usage: None,
            objects: None,
            ocr: None,
        }
    }

    /// 按配置中的凭据构建后端，使用内存存储
    pub fn new(config: TranslationConfig) -> TranslationResult<Self> {
        Self::builder(config).build()
    }

    /// 处理一条文本消息，返回回复文本
    pub async fn handle_text(&self, user_id: &str, text: &str) -> String {
        let started = Instant::now();
        self.stats.inc_requests();

        let text = text.trim();
        let profile = self.load_profile(user_id).await;

        if text.starts_with('/') {
            self.stats.inc_commands();
            return self.handle_command(profile, text).await;
        }

        let reply = self.translate_message(profile, text, started).await;
        self.stats.add_processing_time(started.elapsed());
        reply
    }

    async fn translate_message(&self, profile: UserProfile, text: &str, started: Instant) -> String {
        let instruction = match parse_instruction(text) {
            Ok(instruction) => instruction,
            Err(e) => {
                self.stats.inc_parse_errors();
                tracing::debug!(user_id = %profile.user_id, "指令解析失败: {}", e);
                return e.reason();
            }
        };

        // 明确指定目标时只需要本地检测结果来做标注
        let detected = match instruction.explicit_target_language {
            Some(_) => self.detector.detect_offline(&instruction.source_text),
            None => self.detector.detect(&instruction.source_text).await,
        };

        let resolved = match resolve_target(
            &detected,
            instruction.explicit_target_language.as_deref(),
            &profile,
            &self.settings.snapshot(),
        ) {
            Ok(resolved) => resolved,
            Err(e) => return self.failure_reply(&e),
        };

        let backend = self.selector.select_for_user(&profile);
        if let Err(e) = backend.ensure_available() {
            return self.failure_reply(&e);
        }

        let result = match self
            .translate_cached(&backend, &instruction.source_text, &resolved.target_language_code)
            .await
        {
            Ok(result) => result,
            Err(e) => return self.failure_reply(&e),
        };

        tracing::info!(
            user_id = %profile.user_id,
            provider = backend.provider_id(),
            source = %resolved.detected_source_language_code,
            target = %resolved.target_language_code,
            cache_hit = result.cache_hit,
            quick = instruction.is_quick_translate,
            "翻译完成"
        );

        let reply = format!("{}{}", result.text, annotation(&resolved));
        self.complete(
            profile,
            CompletedTranslation {
                source_text: &instruction.source_text,
                resolved: &resolved,
                backend: &backend,
                result: &result,
                kind: TranslationKind::Text,
                image_url: None,
                started,
            },
        )
        .await;
        reply
    }

    /// 查缓存，未命中时调用后端翻译
    pub(super) async fn translate_cached(
        &self,
        backend: &SelectedBackend,
        text: &str,
        target_language: &str,
    ) -> TranslationResult<CachedTranslation> {
        let result = self
            .cache
            .get_or_compute(text, target_language, backend.provider_id(), || {
                backend.translate_text(text, target_language)
            })
            .await?;

        if result.cache_hit {
            self.stats.inc_cache_hits();
        } else {
            self.stats.inc_cache_misses();
        }
        self.stats.inc_translations_completed();
        Ok(result)
    }

    /// 把错误转成用户可见的回复
    pub(super) fn failure_reply(&self, error: &TranslationError) -> String {
        match error {
            TranslationError::UnsupportedLanguage(name) => format!("Unsupported language: {}", name),
            TranslationError::ParseError(message) => message.clone(),
            TranslationError::BackendUnavailable => {
                tracing::warn!("没有可用的 AI 后端");
                SERVICE_UNAVAILABLE_MESSAGE.to_string()
            }
            other => {
                self.stats.inc_backend_failures();
                helpers::log_error(other);
                format!("translation failed: {}", other.reason())
            }
        }
    }

    /// 读取用户资料；首次接触时创建并保存默认资料
    pub(super) async fn load_profile(&self, user_id: &str) -> UserProfile {
        match self.profiles.find_by_user_id(user_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                tracing::info!(user_id, "首次接触，创建用户资料");
                let profile = UserProfile::new(user_id);
                self.save_profile(profile.clone()).await;
                profile
            }
            Err(e) => {
                tracing::warn!(user_id, "读取用户资料失败，使用默认资料: {}", e);
                UserProfile::new(user_id)
            }
        }
    }

    /// 保存用户资料，失败只记录日志
    pub(super) async fn save_profile(&self, profile: UserProfile) {
        let user_id = profile.user_id.clone();
        if let Err(e) = self.profiles.save(profile).await {
            tracing::warn!(user_id = %user_id, "保存用户资料失败: {}", e);
        }
    }

    /// 写使用记录并更新用户资料，失败只记录日志
    pub(super) async fn complete(&self, mut profile: UserProfile, done: CompletedTranslation<'_>) {
        let record = TranslationRecord {
            user_id: profile.user_id.clone(),
            source_text: done.source_text.to_string(),
            source_language: done.resolved.detected_source_language_code.clone(),
            target_language: done.resolved.target_language_code.clone(),
            translated_text: done.result.text.clone(),
            provider: done.backend.provider_id().to_string(),
            model_name: done.backend.model_name().to_string(),
            created_at: Utc::now(),
            processing_time_ms: done.started.elapsed().as_millis() as u64,
            is_image_translation: done.kind == TranslationKind::Image,
            image_url: done.image_url,
            cache_hit: done.result.cache_hit,
        };

        profile.record_translation(done.kind, &done.resolved.target_language_code);
        let user_id = profile.user_id.clone();

        let (recorded, saved) = futures::join!(self.usage.record(record), self.profiles.save(profile));
        if let Err(e) = recorded {
            tracing::warn!(user_id = %user_id, "写入使用记录失败: {}", e);
        }
        if let Err(e) = saved {
            tracing::warn!(user_id = %user_id, "保存用户资料失败: {}", e);
        }
    }

    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    pub fn settings(&self) -> &Arc<RuntimeSettings> {
        &self.settings
    }

    pub fn selector(&self) -> &Arc<AiBackendSelector> {
        &self.selector
    }

    pub fn get_stats(&self) -> &ServiceStats {
        &self.stats
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.get_stats()
    }

    /// 清理过期缓存，返回清理数量
    pub fn cleanup_cache(&self) -> usize {
        self.cache.cleanup_expired()
    }

    /// 获取服务健康状态
    ///
    /// 至少一个后端可用即为健康，否则为降级（仍能回复固定提示）。
    pub fn get_health(&self) -> HealthStatus {
        let mut components = HashMap::new();

        for provider in ProviderId::ALL {
            let level = if self.selector.is_available(provider) {
                HealthLevel::Healthy
            } else {
                HealthLevel::Unhealthy
            };
            components.insert(provider.as_str().to_string(), level);
        }

        let cache_level = if self.cache.is_enabled() {
            HealthLevel::Healthy
        } else {
            HealthLevel::Degraded
        };
        components.insert("cache".to_string(), cache_level);

        let overall = if self.selector.any_available() {
            HealthLevel::Healthy
        } else {
            HealthLevel::Degraded
        };

        HealthStatus {
            overall,
            components,
        }
    }
}

/// 回复末尾的语言标注
pub fn annotation(resolved: &ResolvedTarget) -> String {
    format!(
        "\n\n[detected: {} | target: {}]",
        registry::english_name(&resolved.detected_source_language_code),
        registry::english_name(&resolved.target_language_code)
    )
}

/// 翻译服务统计信息（线程安全版本）
#[derive(Debug, Default)]
pub struct ServiceStats {
    /// 收到的消息数量（含命令）
    pub requests: AtomicU64,
    pub commands_handled: AtomicU64,
    /// 完成的翻译数量，包括缓存命中
    pub translations_completed: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    pub parse_errors: AtomicU64,
    /// 后端调用或其他内部失败
    pub backend_failures: AtomicU64,
    /// 总处理时间，以微秒为单位存储
    pub processing_time: AtomicU64,
}

impl ServiceStats {
    pub fn inc_requests(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_commands(&self) {
        self.commands_handled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_translations_completed(&self) {
        self.translations_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cache_hits(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cache_misses(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_parse_errors(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_backend_failures(&self) {
        self.backend_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_processing_time(&self, duration: Duration) {
        self.processing_time
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    /// 获取统计数据的快照
    pub fn snapshot(&self) -> ServiceStatsSnapshot {
        ServiceStatsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            commands_handled: self.commands_handled.load(Ordering::Relaxed),
            translations_completed: self.translations_completed.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            backend_failures: self.backend_failures.load(Ordering::Relaxed),
            processing_time_ms: self.processing_time.load(Ordering::Relaxed) / 1000,
        }
    }
}

/// 翻译服务统计数据的不可变快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceStatsSnapshot {
    pub requests: u64,
    pub commands_handled: u64,
    pub translations_completed: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub parse_errors: u64,
    pub backend_failures: u64,
    pub processing_time_ms: u64,
}

/// 翻译服务的健康状态报告
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// 整体健康级别
    pub overall: HealthLevel,

    /// 各组件的健康状态映射，键是组件名称（如 "openai"、"cache"）
    pub components: HashMap<String, HealthLevel>,
}

/// 健康状态级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthLevel {
    /// 健康状态 - 组件运行正常
    Healthy,

    /// 降级状态 - 组件功能受限但仍可用
    Degraded,

    /// 不健康状态 - 组件无法正常工作
    Unhealthy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotation_uses_english_names() {
        let resolved = ResolvedTarget {
            target_language_code: "ja".to_string(),
            detected_source_language_code: "zh".to_string(),
        };
        assert_eq!(annotation(&resolved), "\n\n[detected: Chinese | target: Japanese]");

        let resolved = ResolvedTarget {
            target_language_code: "zh-TW".to_string(),
            detected_source_language_code: "unknown".to_string(),
        };
        assert_eq!(
            annotation(&resolved),
            "\n\n[detected: Unknown | target: Traditional Chinese]"
        );
    }

    #[test]
    fn test_stats_snapshot() {
        let stats = ServiceStats::default();
        stats.inc_requests();
        stats.inc_cache_hits();
        stats.add_processing_time(Duration::from_millis(5));
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.requests, 1);
        assert_eq!(snapshot.cache_hits, 1);
        assert_eq!(snapshot.processing_time_ms, 5);
    }

    #[tokio::test]
    async fn test_health_without_credentials_is_degraded() {
        let service = TranslationService::builder(TranslationConfig::default())
            .backends(vec![
                BackendHandle::unavailable(ProviderId::OpenAi, Vec::new()),
                BackendHandle::unavailable(ProviderId::Gemini, Vec::new()),
            ])
            .build()
            .unwrap();

        let health = service.get_health();
        assert_eq!(health.overall, HealthLevel::Degraded);
        assert_eq!(health.components["openai"], HealthLevel::Unhealthy);

        let reply = service.handle_text("u1", "Hello").await;
        assert_eq!(reply, SERVICE_UNAVAILABLE_MESSAGE);
        // 没有后端不算作服务商调用失败
        assert_eq!(service.get_stats().snapshot().backend_failures, 0);
    }
}
