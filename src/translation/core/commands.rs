//! 偏好设置命令
//!
//! 以 `/` 开头的消息不做翻译，而是查看或修改用户偏好；
//! `/admin` 开头的命令修改全局运行期默认值，只对配置中的管理员开放。

use std::fmt::Write as _;

use super::service::TranslationService;
use crate::translation::backend::ProviderId;
use crate::translation::error::TranslationError;
use crate::translation::language::registry;
use crate::translation::storage::UserProfile;

pub const ADMIN_ONLY_MESSAGE: &str = "This command is restricted to administrators.";

const HELP_TEXT: &str = "\
Send any text and it will be translated automatically.

Instructions:
  翻譯成<language> <text>    translate into a specific language
  <text> + new line + 翻譯成<language>
  快速翻譯:<code> <text>      e.g. 快速翻譯:en 你好

Commands:
  /status            show your settings
  /lang              list supported languages
  /setlang <lang>    set your preferred target language (/setlang clear to reset)
  /c2lang <lang>     set the target language for Chinese text (/c2lang clear to reset)
  /models            list AI providers and models
  /setai <provider>  choose the AI provider (openai, gemini)
  /setmodel <model>  choose the model of your current provider
  /help              show this message";

impl TranslationService {
    /// 处理一条命令消息
    pub(super) async fn handle_command(&self, profile: UserProfile, text: &str) -> String {
        let mut parts = text.split_whitespace();
        let command = parts.next().unwrap_or_default().to_lowercase();
        let args: Vec<&str> = parts.collect();

        tracing::debug!(user_id = %profile.user_id, command = %command, "处理命令");

        match command.as_str() {
            "/help" | "/start" => HELP_TEXT.to_string(),
            "/status" => self.status_text(&profile),
            "/lang" | "/languages" => languages_text(),
            "/models" => self.models_text(),
            "/setlang" => self.set_preferred_target(profile, &args, false).await,
            "/c2lang" => self.set_preferred_target(profile, &args, true).await,
            "/setai" => self.set_provider(profile, &args).await,
            "/setmodel" => self.set_model(profile, &args).await,
            "/admin" => self.admin_command(&profile, &args),
            other => format!("Unknown command: {}. Send /help for the list of commands.", other),
        }
    }

    fn status_text(&self, profile: &UserProfile) -> String {
        let backend = self.selector.select_for_user(profile);
        let mut text = String::new();

        let _ = writeln!(text, "User: {}", profile.user_id);
        let _ = writeln!(
            text,
            "Preferred target: {}",
            describe_language(profile.preferred_target_language.as_deref())
        );
        let _ = writeln!(
            text,
            "Target for Chinese text: {}",
            describe_language(profile.preferred_chinese_target_language.as_deref())
        );
        let _ = writeln!(
            text,
            "AI provider: {} ({})",
            backend.provider_id(),
            backend.model_name()
        );
        let _ = writeln!(
            text,
            "Translations: {} (text {}, image {})",
            profile.total_translations, profile.text_translations, profile.image_translations
        );
        let recent = if profile.recent_languages.is_empty() {
            "none".to_string()
        } else {
            profile.recent_languages.join(", ")
        };
        let _ = write!(text, "Recent languages: {}", recent);
        text
    }

    fn models_text(&self) -> String {
        let default = self.settings.default_provider();
        let mut text = String::from("AI providers:");

        for handle in self.selector.handles() {
            let provider = handle.provider();
            let _ = write!(
                text,
                "\n{} ({}){}: {}",
                provider.display_name(),
                provider,
                if provider == default { " [default]" } else { "" },
                if handle.is_available() { "available" } else { "unavailable" }
            );
            if !handle.available_models().is_empty() {
                let _ = write!(text, "\n  models: {}", handle.available_models().join(", "));
            }
        }
        text
    }

    async fn set_preferred_target(&self, mut profile: UserProfile, args: &[&str], for_chinese: bool) -> String {
        let command = if for_chinese { "/c2lang" } else { "/setlang" };
        let Some(language) = joined(args) else {
            return format!("Usage: {} <language>  (or {} clear)", command, command);
        };

        let slot = if for_chinese {
            &mut profile.preferred_chinese_target_language
        } else {
            &mut profile.preferred_target_language
        };

        let reply = if language.eq_ignore_ascii_case("clear") {
            *slot = None;
            "Preference cleared; system defaults will be used.".to_string()
        } else if !registry::is_supported(&language) {
            return format!("Unsupported language: {}", language);
        } else {
            let code = registry::to_language_code(&language);
            if for_chinese && registry::is_chinese_family(&code) {
                return "The target for Chinese text cannot be a Chinese variant.".to_string();
            }
            let reply = format!(
                "{} set to {} ({}).",
                if for_chinese { "Target for Chinese text" } else { "Preferred target language" },
                registry::english_name(&code),
                code
            );
            *slot = Some(code);
            reply
        };

        profile.touch();
        self.save_profile(profile).await;
        reply
    }

    async fn set_provider(&self, mut profile: UserProfile, args: &[&str]) -> String {
        let Some(name) = args.first() else {
            return "Usage: /setai <openai|gemini>".to_string();
        };
        let provider: ProviderId = match name.parse() {
            Ok(provider) => provider,
            Err(_) => return format!("Unknown AI provider: {}. Available: openai, gemini", name),
        };

        profile.preferred_provider = Some(provider);
        profile.touch();
        self.save_profile(profile).await;

        if self.selector.is_available(provider) {
            format!("AI provider set to {}.", provider.display_name())
        } else {
            format!(
                "AI provider set to {}, but it is currently unavailable; another provider will be used.",
                provider.display_name()
            )
        }
    }

    async fn set_model(&self, mut profile: UserProfile, args: &[&str]) -> String {
        let Some(model) = args.first() else {
            return "Usage: /setmodel <model>".to_string();
        };

        let backend = self.selector.select_for_user(&profile);
        let Ok(provider) = backend.provider_id().parse::<ProviderId>() else {
            return crate::translation::backend::SERVICE_UNAVAILABLE_MESSAGE.to_string();
        };
        let Some(handle) = self.selector.handle(provider) else {
            return crate::translation::backend::SERVICE_UNAVAILABLE_MESSAGE.to_string();
        };

        if !handle.supports_model(model) {
            return format!(
                "Model {} is not available for {}. Available models: {}",
                model,
                provider.display_name(),
                handle.available_models().join(", ")
            );
        }

        profile.set_preferred_model(provider, *model);
        profile.touch();
        self.save_profile(profile).await;
        format!("{} model set to {}.", provider.display_name(), model)
    }

    fn admin_command(&self, profile: &UserProfile, args: &[&str]) -> String {
        if !self.config.is_admin(&profile.user_id) {
            tracing::warn!(user_id = %profile.user_id, "非管理员尝试执行管理命令");
            return ADMIN_ONLY_MESSAGE.to_string();
        }

        let subcommand = args.first().map(|s| s.to_lowercase()).unwrap_or_default();
        let value = joined(&args[args.len().min(1)..]);

        match (subcommand.as_str(), value) {
            ("config", _) => {
                let defaults = self.settings.snapshot();
                format!(
                    "Default target for Chinese text: {}\nDefault target for other text: {}\nDefault AI provider: {}\nAvailable providers: {}",
                    defaults.default_for_chinese,
                    defaults.default_for_others,
                    defaults.default_provider,
                    self.selector
                        .handles()
                        .filter(|h| h.is_available())
                        .map(|h| h.provider().as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
            ("setlang-zh", Some(language)) => match self.settings.set_default_for_chinese(&language) {
                Ok(code) => format!("Default target for Chinese text set to {}.", code),
                Err(e) => admin_error(&e),
            },
            ("setlang-other", Some(language)) => match self.settings.set_default_for_others(&language) {
                Ok(code) => format!("Default target for other text set to {}.", code),
                Err(e) => admin_error(&e),
            },
            ("setai", Some(name)) => match name.parse::<ProviderId>() {
                Ok(provider) if self.selector.is_available(provider) => {
                    self.settings.set_default_provider(provider);
                    format!("Default AI provider set to {}.", provider.display_name())
                }
                Ok(provider) => format!("{} is not available.", provider.display_name()),
                Err(_) => format!("Unknown AI provider: {}", name),
            },
            _ => "Usage: /admin config | setlang-zh <lang> | setlang-other <lang> | setai <provider>"
                .to_string(),
        }
    }
}

fn joined(args: &[&str]) -> Option<String> {
    let value = args.join(" ");
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn describe_language(code: Option<&str>) -> String {
    match code {
        Some(code) => format!("{} ({})", registry::english_name(code), code),
        None => "system default".to_string(),
    }
}

fn admin_error(error: &TranslationError) -> String {
    match error {
        TranslationError::UnsupportedLanguage(name) => format!("Unsupported language: {}", name),
        other => other.reason(),
    }
}

fn languages_text() -> String {
    let mut text = String::from("Supported languages:");
    for info in registry::supported_languages() {
        let _ = write!(text, "\n{} - {} ({})", info.code, info.english_name, info.chinese_name);
    }
    text
}
