//! 翻译使用记录

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::translation::error::TranslationResult;

/// 一次完成的翻译
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationRecord {
    pub user_id: String,
    pub source_text: String,
    pub source_language: String,
    pub target_language: String,
    pub translated_text: String,
    pub provider: String,
    pub model_name: String,
    pub created_at: DateTime<Utc>,
    pub processing_time_ms: u64,
    pub is_image_translation: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub cache_hit: bool,
}

/// 使用记录的写入端
#[async_trait]
pub trait UsageRecorder: Send + Sync {
    async fn record(&self, record: TranslationRecord) -> TranslationResult<()>;
}

/// 内存中的使用记录
#[derive(Debug, Default)]
pub struct InMemoryUsageRecorder {
    records: Mutex<Vec<TranslationRecord>>,
}

impl InMemoryUsageRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 全部记录的拷贝，按写入顺序
    pub fn records(&self) -> Vec<TranslationRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UsageRecorder for InMemoryUsageRecorder {
    async fn record(&self, record: TranslationRecord) -> TranslationResult<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
        Ok(())
    }
}
