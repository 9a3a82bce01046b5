// 集成测试公共模块
//
// 提供可计数的后端替身、会失败的存储和服务构建辅助

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use line_translator::translation::backend::BackendRequest;
use line_translator::translation::storage::{
    InMemoryProfileStore, InMemoryUsageRecorder, TranslationRecord,
};
use line_translator::translation::{
    AiBackend, BackendHandle, ProfileStore, ProviderId, TranslationConfig, TranslationError,
    TranslationResult, TranslationService, UsageRecorder, UserProfile,
};

/// 记录调用次数的后端替身
///
/// 翻译请求返回 `[<target>] <text>`；生成请求（语言检测）返回预设答案。
pub struct CountingBackend {
    provider: ProviderId,
    detection_answer: String,
    image_text: String,
    fail_translations: bool,
    pub translate_calls: AtomicUsize,
    pub generate_calls: AtomicUsize,
    pub describe_calls: AtomicUsize,
}

impl CountingBackend {
    pub fn new(provider: ProviderId) -> Self {
        Self {
            provider,
            detection_answer: "unknown".to_string(),
            image_text: String::new(),
            fail_translations: false,
            translate_calls: AtomicUsize::new(0),
            generate_calls: AtomicUsize::new(0),
            describe_calls: AtomicUsize::new(0),
        }
    }

    pub fn detecting(mut self, answer: &str) -> Self {
        self.detection_answer = answer.to_string();
        self
    }

    pub fn reading_images_as(mut self, text: &str) -> Self {
        self.image_text = text.to_string();
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_translations = true;
        self
    }

    pub fn translations(&self) -> usize {
        self.translate_calls.load(Ordering::SeqCst)
    }

    pub fn detections(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    /// 所有类型的服务商调用
    pub fn total_calls(&self) -> usize {
        self.translations() + self.detections() + self.describe_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AiBackend for CountingBackend {
    fn provider_id(&self) -> &str {
        self.provider.as_str()
    }

    fn default_model(&self) -> &str {
        "test-model"
    }

    async fn execute(&self, _model: &str, request: BackendRequest<'_>) -> TranslationResult<String> {
        match request {
            BackendRequest::Translate {
                text,
                target_language,
            } => {
                self.translate_calls.fetch_add(1, Ordering::SeqCst);
                if self.fail_translations {
                    return Err(TranslationError::NetworkError("connection reset".to_string()));
                }
                Ok(format!("[{}] {}", target_language, text))
            }
            BackendRequest::Generate { .. } => {
                self.generate_calls.fetch_add(1, Ordering::SeqCst);
                Ok(self.detection_answer.clone())
            }
            BackendRequest::DescribeImage { .. } => {
                self.describe_calls.fetch_add(1, Ordering::SeqCst);
                Ok(self.image_text.clone())
            }
        }
    }
}

/// 读写都失败的存储
#[derive(Debug, Default)]
pub struct FailingStore;

#[async_trait]
impl ProfileStore for FailingStore {
    async fn find_by_user_id(&self, _user_id: &str) -> TranslationResult<Option<UserProfile>> {
        Err(TranslationError::StorageError("database offline".to_string()))
    }

    async fn save(&self, _profile: UserProfile) -> TranslationResult<UserProfile> {
        Err(TranslationError::StorageError("database offline".to_string()))
    }
}

#[async_trait]
impl UsageRecorder for FailingStore {
    async fn record(&self, _record: TranslationRecord) -> TranslationResult<()> {
        Err(TranslationError::StorageError("database offline".to_string()))
    }
}

/// 测试环境：服务加上可观察的替身与存储
pub struct TestEnvironment {
    pub service: TranslationService,
    pub openai: Arc<CountingBackend>,
    pub profiles: Arc<InMemoryProfileStore>,
    pub usage: Arc<InMemoryUsageRecorder>,
}

/// 只开启 OpenAI 替身、关闭 AI 检测的配置
pub fn test_config() -> TranslationConfig {
    TranslationConfig {
        ai_detection_enabled: false,
        ..TranslationConfig::default()
    }
}

pub fn models() -> Vec<String> {
    vec!["test-model".to_string(), "test-model-fast".to_string()]
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self::with(test_config(), CountingBackend::new(ProviderId::OpenAi))
    }

    /// OpenAI 使用给定替身，Gemini 不可用
    pub fn with(config: TranslationConfig, openai: CountingBackend) -> Self {
        let openai = Arc::new(openai);
        let profiles = Arc::new(InMemoryProfileStore::new());
        let usage = Arc::new(InMemoryUsageRecorder::new());

        let service = TranslationService::builder(config)
            .backends(vec![
                BackendHandle::new(ProviderId::OpenAi, openai.clone(), models()),
                BackendHandle::unavailable(ProviderId::Gemini, models()),
            ])
            .profile_store(profiles.clone())
            .usage_recorder(usage.clone())
            .build()
            .expect("service should build");

        Self {
            service,
            openai,
            profiles,
            usage,
        }
    }

    pub async fn profile(&self, user_id: &str) -> UserProfile {
        self.profiles
            .find_by_user_id(user_id)
            .await
            .unwrap()
            .expect("profile should exist")
    }

    pub async fn save_profile(&self, profile: UserProfile) {
        self.profiles.save(profile).await.unwrap();
    }
}
