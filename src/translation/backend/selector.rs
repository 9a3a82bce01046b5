//! AI 后端选择器
//!
//! 持有启动时构建的后端句柄，按固定的故障转移顺序返回可用后端：
//! 请求的服务商 → 默认服务商 → 另一个服务商 → 终端替身。
//! 可用性只在启动时根据凭据计算一次，请求期间只读不改。

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{AiBackend, GeminiBackend, OpenAiBackend, ProviderId, SelectedBackend, UnavailableBackend};
use crate::translation::config::{RuntimeSettings, TranslationConfig};
use crate::translation::storage::profile::UserProfile;

/// 启动时确定的后端句柄
#[derive(Clone)]
pub struct BackendHandle {
    provider: ProviderId,
    backend: Option<Arc<dyn AiBackend>>,
    available: bool,
    available_models: Vec<String>,
}

impl BackendHandle {
    /// 已配置的后端
    pub fn new(provider: ProviderId, backend: Arc<dyn AiBackend>, available_models: Vec<String>) -> Self {
        let available = backend.is_available();
        Self {
            provider,
            backend: Some(backend),
            available,
            available_models,
        }
    }

    /// 缺少凭据的服务商
    pub fn unavailable(provider: ProviderId, available_models: Vec<String>) -> Self {
        Self {
            provider,
            backend: None,
            available: false,
            available_models,
        }
    }

    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// 默认模型，未配置时为 `None`
    pub fn model_name(&self) -> Option<&str> {
        self.backend.as_ref().map(|backend| backend.default_model())
    }

    pub fn available_models(&self) -> &[String] {
        &self.available_models
    }

    pub fn supports_model(&self, model: &str) -> bool {
        self.available_models.iter().any(|m| m == model)
    }

    fn selected(&self) -> Option<SelectedBackend> {
        if !self.available {
            return None;
        }
        self.backend.clone().map(SelectedBackend::new)
    }
}

impl std::fmt::Debug for BackendHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendHandle")
            .field("provider", &self.provider)
            .field("model", &self.model_name())
            .field("available", &self.available)
            .field("available_models", &self.available_models)
            .finish()
    }
}

/// 根据配置中的凭据构建句柄
pub fn build_handles(config: &TranslationConfig) -> Vec<BackendHandle> {
    ProviderId::ALL
        .iter()
        .map(|&provider| {
            let provider_config = config.provider(provider);
            let models = provider_config.available_models.clone();

            if !provider_config.has_credentials() {
                tracing::warn!(%provider, "未配置 API Key，该服务商不可用");
                return BackendHandle::unavailable(provider, models);
            }

            let backend: Result<Arc<dyn AiBackend>, _> = match provider {
                ProviderId::OpenAi => {
                    OpenAiBackend::new(provider_config).map(|b| Arc::new(b) as Arc<dyn AiBackend>)
                }
                ProviderId::Gemini => {
                    GeminiBackend::new(provider_config).map(|b| Arc::new(b) as Arc<dyn AiBackend>)
                }
            };

            match backend {
                Ok(backend) => {
                    tracing::info!(%provider, model = backend.default_model(), "AI 服务已配置");
                    BackendHandle::new(provider, backend, models)
                }
                Err(e) => {
                    tracing::error!(%provider, "AI 服务初始化失败: {}", e);
                    BackendHandle::unavailable(provider, models)
                }
            }
        })
        .collect()
}

/// 后端选择器
pub struct AiBackendSelector {
    handles: BTreeMap<ProviderId, BackendHandle>,
    settings: Arc<RuntimeSettings>,
    fallback: Arc<dyn AiBackend>,
}

impl AiBackendSelector {
    /// 创建选择器
    ///
    /// 默认服务商不可用而另一个可用时，运行期默认值会切换到可用的那个。
    pub fn new(handles: Vec<BackendHandle>, settings: Arc<RuntimeSettings>) -> Self {
        let handles: BTreeMap<_, _> = handles
            .into_iter()
            .map(|handle| (handle.provider(), handle))
            .collect();

        let selector = Self {
            handles,
            settings,
            fallback: Arc::new(UnavailableBackend),
        };

        let default = selector.settings.default_provider();
        let other = default.other();
        if !selector.is_available(default) && selector.is_available(other) {
            tracing::warn!(from = %default, to = %other, "默认 AI 服务不可用，切换默认服务商");
            selector.settings.set_default_provider(other);
        }

        if !selector.any_available() {
            tracing::error!("所有 AI 服务都未正确配置，翻译请求将返回提示信息");
        }

        selector
    }

    pub fn handle(&self, provider: ProviderId) -> Option<&BackendHandle> {
        self.handles.get(&provider)
    }

    pub fn handles(&self) -> impl Iterator<Item = &BackendHandle> {
        self.handles.values()
    }

    pub fn is_available(&self, provider: ProviderId) -> bool {
        self.handles
            .get(&provider)
            .is_some_and(BackendHandle::is_available)
    }

    pub fn any_available(&self) -> bool {
        self.handles.values().any(BackendHandle::is_available)
    }

    pub fn settings(&self) -> &Arc<RuntimeSettings> {
        &self.settings
    }

    /// 按故障转移顺序找到第一个可用句柄
    fn choose(&self, requested: Option<ProviderId>) -> Option<&BackendHandle> {
        let default = self.settings.default_provider();
        requested
            .into_iter()
            .chain([default, default.other()])
            .find_map(|provider| self.handles.get(&provider).filter(|h| h.is_available()))
    }

    /// 选择后端，永远返回一个句柄（最坏情况下是终端替身）
    pub fn select(&self, requested: Option<ProviderId>) -> SelectedBackend {
        match self.choose(requested).and_then(BackendHandle::selected) {
            Some(selected) => {
                if let Some(requested) = requested {
                    if selected.provider_id() != requested.as_str() {
                        tracing::debug!(
                            %requested,
                            actual = selected.provider_id(),
                            "请求的 AI 服务不可用，已故障转移"
                        );
                    }
                }
                selected
            }
            None => SelectedBackend::new(self.fallback.clone()),
        }
    }

    /// 为指定用户选择后端，并应用用户偏好的模型
    pub fn select_for_user(&self, profile: &UserProfile) -> SelectedBackend {
        let Some(handle) = self.choose(profile.preferred_provider) else {
            return SelectedBackend::new(self.fallback.clone());
        };
        let Some(selected) = handle.selected() else {
            return SelectedBackend::new(self.fallback.clone());
        };

        match profile.preferred_model(handle.provider()) {
            Some(model) if handle.supports_model(model) => selected.with_model(model),
            Some(model) => {
                tracing::debug!(
                    provider = %handle.provider(),
                    model,
                    "用户偏好的模型不在可用列表中，使用默认模型"
                );
                selected
            }
            None => selected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::backend::{BackendRequest, UNAVAILABLE_PROVIDER_ID};
    use crate::translation::config::TranslationConfig;
    use crate::translation::error::TranslationResult;
    use async_trait::async_trait;

    struct EchoBackend(ProviderId);

    #[async_trait]
    impl AiBackend for EchoBackend {
        fn provider_id(&self) -> &str {
            self.0.as_str()
        }

        fn default_model(&self) -> &str {
            "default-model"
        }

        async fn execute(&self, model: &str, _request: BackendRequest<'_>) -> TranslationResult<String> {
            Ok(model.to_string())
        }
    }

    fn handle(provider: ProviderId, available: bool) -> BackendHandle {
        let models = vec!["default-model".to_string(), "fast-model".to_string()];
        if available {
            BackendHandle::new(provider, Arc::new(EchoBackend(provider)), models)
        } else {
            BackendHandle::unavailable(provider, models)
        }
    }

    fn selector(openai: bool, gemini: bool) -> AiBackendSelector {
        let settings = Arc::new(RuntimeSettings::from_config(&TranslationConfig::default()));
        AiBackendSelector::new(
            vec![handle(ProviderId::OpenAi, openai), handle(ProviderId::Gemini, gemini)],
            settings,
        )
    }

    #[test]
    fn test_requested_provider_wins_when_available() {
        let selector = selector(true, true);
        assert_eq!(selector.select(Some(ProviderId::Gemini)).provider_id(), "gemini");
        assert_eq!(selector.select(None).provider_id(), "openai");
    }

    #[test]
    fn test_failover_to_other_provider() {
        let selector = selector(false, true);
        for _ in 0..3 {
            assert_eq!(selector.select(Some(ProviderId::OpenAi)).provider_id(), "gemini");
        }
        // 启动时默认服务商切换到可用的那个
        assert_eq!(selector.settings().default_provider(), ProviderId::Gemini);
    }

    #[test]
    fn test_terminal_stand_in() {
        let selector = selector(false, false);
        let selected = selector.select(Some(ProviderId::OpenAi));
        assert!(!selected.is_available());
        assert_eq!(selected.provider_id(), UNAVAILABLE_PROVIDER_ID);
        assert!(!selector.any_available());
    }

    #[tokio::test]
    async fn test_user_model_override() {
        let selector = selector(true, true);
        let mut profile = UserProfile::new("U1");
        profile.set_preferred_model(ProviderId::OpenAi, "fast-model");
        let selected = selector.select_for_user(&profile);
        assert_eq!(selected.model_name(), "fast-model");
        assert_eq!(selected.generate_text("x").await.unwrap(), "fast-model");

        profile.set_preferred_model(ProviderId::OpenAi, "not-listed");
        assert_eq!(selector.select_for_user(&profile).model_name(), "default-model");
    }

    #[test]
    fn test_override_only_applies_to_chosen_provider() {
        let selector = selector(false, true);
        let mut profile = UserProfile::new("U1");
        profile.preferred_provider = Some(ProviderId::OpenAi);
        profile.set_preferred_model(ProviderId::OpenAi, "fast-model");
        let selected = selector.select_for_user(&profile);
        assert_eq!(selected.provider_id(), "gemini");
        assert_eq!(selected.model_name(), "default-model");
    }
}
