//! 存储管理模块
//!
//! 翻译结果缓存、用户资料、使用记录和上传图片的存储。

pub mod cache;
#[cfg(feature = "web")]
pub mod mongo;
pub mod object;
pub mod profile;
pub mod usage;

pub use cache::{CacheConfig, CacheKey, CacheStats, CachedTranslation, ResultCache};
pub use object::{LocalObjectStore, ObjectStore};
pub use profile::{InMemoryProfileStore, ProfileStore, TranslationKind, UserProfile};
pub use usage::{InMemoryUsageRecorder, TranslationRecord, UsageRecorder};
