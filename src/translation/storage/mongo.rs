//! MongoDB 持久化
//!
//! 用户资料按 `user_id` upsert 到 `user_profiles`，使用记录追加到 `translation_records`。

use async_trait::async_trait;
use bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};

use super::profile::{ProfileStore, UserProfile};
use super::usage::{TranslationRecord, UsageRecorder};
use crate::translation::error::{TranslationError, TranslationResult};
use crate::web::config::MongoConfig;

const PROFILES_COLLECTION: &str = "user_profiles";
const RECORDS_COLLECTION: &str = "translation_records";

/// 连接数据库
pub async fn connect(config: &MongoConfig) -> TranslationResult<Database> {
    let client = Client::with_uri_str(&config.connection_string)
        .await
        .map_err(|e| TranslationError::StorageError(format!("连接MongoDB失败: {}", e)))?;
    let db = client.database(&config.database_name);

    db.run_command(doc! { "ping": 1 })
        .await
        .map_err(|e| TranslationError::StorageError(format!("MongoDB不可达: {}", e)))?;

    tracing::info!(database = %config.database_name, "MongoDB 连接成功");
    Ok(db)
}

/// 基于 MongoDB 的用户资料存储
#[derive(Debug, Clone)]
pub struct MongoProfileStore {
    collection: Collection<UserProfile>,
}

impl MongoProfileStore {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection::<UserProfile>(PROFILES_COLLECTION),
        }
    }

    /// 创建 `user_id` 唯一索引
    pub async fn create_indexes(&self) -> TranslationResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "user_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("user_id_unique".to_string())
                    .build(),
            )
            .build();

        self.collection
            .create_index(index)
            .await
            .map_err(|e| TranslationError::StorageError(format!("创建索引失败: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MongoProfileStore {
    async fn find_by_user_id(&self, user_id: &str) -> TranslationResult<Option<UserProfile>> {
        Ok(self
            .collection
            .find_one(doc! { "user_id": user_id })
            .await?)
    }

    async fn save(&self, profile: UserProfile) -> TranslationResult<UserProfile> {
        self.collection
            .replace_one(doc! { "user_id": profile.user_id.as_str() }, &profile)
            .upsert(true)
            .await?;
        Ok(profile)
    }
}

/// 基于 MongoDB 的使用记录
#[derive(Debug, Clone)]
pub struct MongoUsageRecorder {
    collection: Collection<TranslationRecord>,
}

impl MongoUsageRecorder {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection::<TranslationRecord>(RECORDS_COLLECTION),
        }
    }

    /// 按用户和时间倒序建索引
    pub async fn create_indexes(&self) -> TranslationResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("user_created_desc".to_string())
                    .build(),
            )
            .build();

        self.collection
            .create_index(index)
            .await
            .map_err(|e| TranslationError::StorageError(format!("创建索引失败: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl UsageRecorder for MongoUsageRecorder {
    async fn record(&self, record: TranslationRecord) -> TranslationResult<()> {
        self.collection.insert_one(record).await?;
        Ok(())
    }
}
