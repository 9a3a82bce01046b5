//! 翻译结果缓存
//!
//! 以（规范化文本, 目标语言, 服务商）为键记忆翻译结果，带 TTL 与容量上限。
//! 底层是分片的 `DashMap`，锁只在单个分片上短暂持有，从不跨越 `await`，
//! 因此读者不会被淘汰操作阻塞，未命中时的等待时间只取决于 `compute` 本身。

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::translation::config::{constants, TranslationConfig};
use crate::translation::error::TranslationResult;

// ============================================================================
// 核心类型
// ============================================================================

/// 缓存键：三元组的 blake3 摘要
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// 文本去除首尾空白，语言代码与服务商不区分大小写
    pub fn new(text: &str, target_language: &str, provider_id: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(text.trim().as_bytes());
        hasher.update(&[0]);
        hasher.update(target_language.trim().to_lowercase().as_bytes());
        hasher.update(&[0]);
        hasher.update(provider_id.trim().to_lowercase().as_bytes());
        Self(hasher.finalize().to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 缓存条目
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub translated_text: String,
    pub created_at: Instant,
    pub access_count: u64,
    pub last_accessed: Instant,
}

/// 缓存配置
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_entries: usize,
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: constants::DEFAULT_CACHE_MAX_ENTRIES,
            ttl: constants::DEFAULT_CACHE_TTL,
        }
    }
}

impl From<&TranslationConfig> for CacheConfig {
    fn from(config: &TranslationConfig) -> Self {
        Self {
            enabled: config.cache_enabled,
            max_entries: config.cache_max_entries,
            ttl: config.cache_ttl(),
        }
    }
}

/// 缓存统计信息
#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct CacheStats {
    pub total_requests: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub total_entries: usize,
    pub evictions: u64,
}

impl CacheStats {
    /// 命中率（0.0 - 1.0）
    pub fn hit_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.total_requests as f64
        }
    }
}

/// 一次查询的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedTranslation {
    pub text: String,
    pub cache_hit: bool,
}

#[derive(Debug, Default)]
struct Counters {
    requests: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

/// 翻译结果缓存
#[derive(Debug)]
pub struct ResultCache {
    entries: DashMap<CacheKey, CacheEntry>,
    config: CacheConfig,
    counters: Counters,
}

// ============================================================================
// 实现
// ============================================================================

impl CacheEntry {
    fn new(translated_text: String) -> Self {
        let now = Instant::now();
        Self {
            translated_text,
            created_at: now,
            access_count: 0,
            last_accessed: now,
        }
    }

    /// 更新访问信息
    fn access(&mut self) {
        self.access_count += 1;
        self.last_accessed = Instant::now();
    }

    /// 检查条目是否过期
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }
}

impl ResultCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
            counters: Counters::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// 查找未过期的条目，过期条目顺便删除
    pub fn get(&self, key: &CacheKey) -> Option<String> {
        self.counters.requests.fetch_add(1, Ordering::Relaxed);

        let expired = match self.entries.get_mut(key) {
            Some(mut entry) => {
                if entry.is_expired(self.config.ttl) {
                    true
                } else {
                    entry.access();
                    self.counters.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(entry.translated_text.clone());
                }
            }
            None => false,
        };

        if expired {
            self.entries.remove(key);
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// 写入条目，超出容量时淘汰其他条目
    ///
    /// 写入后再检查容量，并发写入也不会让缓存停留在上限之上。
    pub fn insert(&self, key: CacheKey, translated_text: String) {
        self.entries.insert(key.clone(), CacheEntry::new(translated_text));
        while self.entries.len() > self.config.max_entries {
            if !self.make_room(&key) {
                break;
            }
        }
    }

    /// 查找或计算
    ///
    /// 命中时不调用 `compute`；未命中时调用一次并只缓存成功结果。
    /// 并发的首次请求可能各自调用 `compute`，后写入者覆盖先写入者。
    pub async fn get_or_compute<F, Fut>(
        &self,
        text: &str,
        target_language: &str,
        provider_id: &str,
        compute: F,
    ) -> TranslationResult<CachedTranslation>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = TranslationResult<String>>,
    {
        if !self.config.enabled {
            return Ok(CachedTranslation {
                text: compute().await?,
                cache_hit: false,
            });
        }

        let key = CacheKey::new(text, target_language, provider_id);
        if let Some(text) = self.get(&key) {
            tracing::debug!(key = key.as_str(), "翻译缓存命中");
            return Ok(CachedTranslation {
                text,
                cache_hit: true,
            });
        }

        let translated = compute().await?;
        self.insert(key, translated.clone());
        Ok(CachedTranslation {
            text: translated,
            cache_hit: false,
        })
    }

    /// 清理过期条目，返回清理数量
    pub fn cleanup_expired(&self) -> usize {
        let before = self.entries.len();
        let ttl = self.config.ttl;
        self.entries.retain(|_, entry| !entry.is_expired(ttl));
        let removed = before.saturating_sub(self.entries.len());
        self.counters
            .evictions
            .fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    /// 先清过期条目，没有过期条目时淘汰最久未访问的条目（`keep` 除外）
    ///
    /// 没有可淘汰的条目时返回 false。
    fn make_room(&self, keep: &CacheKey) -> bool {
        if self.cleanup_expired() > 0 {
            return true;
        }

        let victim = self
            .entries
            .iter()
            .filter(|entry| entry.key() != keep)
            .min_by_key(|entry| entry.value().last_accessed)
            .map(|entry| entry.key().clone());

        let Some(key) = victim else {
            return false;
        };
        if self.entries.remove(&key).is_some() {
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
        }
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 清空缓存
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// 获取统计信息
    pub fn get_stats(&self) -> CacheStats {
        CacheStats {
            total_requests: self.counters.requests.load(Ordering::Relaxed),
            cache_hits: self.counters.hits.load(Ordering::Relaxed),
            cache_misses: self.counters.misses.load(Ordering::Relaxed),
            total_entries: self.entries.len(),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
        }
    }
}
