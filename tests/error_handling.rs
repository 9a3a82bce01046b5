//! 错误处理集成测试
//!
//! 所有失败都应该变成一条回复，而不是向上传播

use line_translator::translation::error::{ErrorCategory, ErrorSeverity};
use line_translator::translation::{ConfigManager, ProviderId, TranslationConfig, TranslationError};

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{test_config, CountingBackend, TestEnvironment};

#[test]
fn test_error_classification() {
    let cases = vec![
        (
            TranslationError::ConfigError("bad".to_string()),
            ErrorSeverity::Critical,
            ErrorCategory::Configuration,
        ),
        (
            TranslationError::NetworkError("timeout".to_string()),
            ErrorSeverity::Warning,
            ErrorCategory::Network,
        ),
        (
            TranslationError::StorageError("offline".to_string()),
            ErrorSeverity::Warning,
            ErrorCategory::Storage,
        ),
    ];

    for (error, severity, category) in cases {
        assert_eq!(error.severity(), severity, "{:?}", error);
        assert_eq!(error.category(), category, "{:?}", error);
    }
}

#[test]
fn test_reason_strips_category_prefix() {
    let error = TranslationError::ProviderError("HTTP 429: rate limited".to_string());
    assert_eq!(error.reason(), "HTTP 429: rate limited");
    assert!(error.to_string().contains("HTTP 429"));
}

#[tokio::test]
async fn test_empty_and_whitespace_messages() {
    let env = TestEnvironment::new();

    for text in ["", "   ", "\n\n"] {
        let reply = env.service.handle_text("u1", text).await;
        assert_eq!(reply, "Please enter the text to translate.");
    }
    assert_eq!(env.openai.total_calls(), 0);
}

#[tokio::test]
async fn test_malformed_instructions_are_corrected() {
    let env = TestEnvironment::new();

    let cases = [
        ("翻譯成", "Please specify a target language after \"翻譯成\"."),
        ("你好\n翻譯成日文", ""),
        ("翻譯成英文\n", "Please enter the text to translate after \"翻譯成英文\"."),
        ("快速翻譯:en", "Usage: 快速翻譯:<language code> <text>\nExample: 快速翻譯:en 你好"),
    ];

    for (input, expected) in cases {
        let reply = env.service.handle_text("u1", input).await;
        if expected.is_empty() {
            assert!(reply.starts_with("[ja] 你好"), "{}", reply);
        } else {
            assert_eq!(reply, expected, "input: {:?}", input);
        }
    }
}

#[tokio::test]
async fn test_unknown_command() {
    let env = TestEnvironment::new();

    let reply = env.service.handle_text("u1", "/frobnicate").await;
    assert_eq!(reply, "Unknown command: /frobnicate. Send /help for the list of commands.");

    let reply = env.service.handle_text("u1", "/setai claude").await;
    assert_eq!(reply, "Unknown AI provider: claude. Available: openai, gemini");

    let reply = env.service.handle_text("u1", "/setmodel gpt-99").await;
    assert!(reply.starts_with("Model gpt-99 is not available for OpenAI."));
}

#[tokio::test]
async fn test_oversized_image_is_rejected() {
    let config = TranslationConfig {
        max_image_bytes: 4,
        ..test_config()
    };
    let env = TestEnvironment::with(config, CountingBackend::new(ProviderId::OpenAi));

    let reply = env
        .service
        .handle_image(
            "u1",
            line_translator::translation::ImageUpload {
                bytes: vec![0; 16],
                content_type: "image/png".to_string(),
            },
        )
        .await;

    assert!(reply.starts_with("The image is too large"));
    assert_eq!(env.openai.total_calls(), 0);
}

#[test]
fn test_invalid_config_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();

    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "default_target_for_others = [").unwrap();
    assert!(ConfigManager::from_path(path.to_str().unwrap()).is_err());

    let path = dir.path().join("unsupported.toml");
    std::fs::write(&path, "default_target_for_others = \"klingon\"\n").unwrap();
    assert!(matches!(
        ConfigManager::from_path(path.to_str().unwrap()),
        Err(TranslationError::ConfigError(_))
    ));
}

#[test]
fn test_config_file_is_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("line-translator.toml");
    std::fs::write(
        &path,
        r#"
default_target_for_chinese = "日文"
cache_max_entries = 50

[gemini]
model = "gemini-1.5-flash"
"#,
    )
    .unwrap();

    let manager = ConfigManager::from_path(path.to_str().unwrap()).unwrap();
    let config = manager.get_config();
    assert_eq!(config.default_target_for_chinese, "ja");
    assert_eq!(config.cache_max_entries, 50);
    assert_eq!(config.gemini.model, "gemini-1.5-flash");
    // 未设置的字段使用默认值
    assert_eq!(config.openai.model, "gpt-4o");
    assert_eq!(manager.source(), path.to_str());
}
