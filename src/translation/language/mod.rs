//! 语言代码注册表与语言检测

pub mod detector;
pub mod registry;

pub use detector::{DetectionConfig, LanguageDetector};
pub use registry::{LanguageInfo, UNKNOWN_LANGUAGE};
