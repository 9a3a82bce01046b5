//! Web 服务器主程序入口

#[cfg(feature = "web")]
use std::sync::Arc;

#[cfg(feature = "web")]
use clap::Parser;

#[cfg(feature = "web")]
use line_translator::env::{self, EnvVar};
#[cfg(feature = "web")]
use line_translator::translation::storage::mongo::{self, MongoProfileStore, MongoUsageRecorder};
#[cfg(feature = "web")]
use line_translator::translation::storage::LocalObjectStore;
#[cfg(feature = "web")]
use line_translator::translation::{ConfigManager, TranslationService, TranslationServiceBuilder};
#[cfg(feature = "web")]
use line_translator::web::{MongoConfig, WebConfig, WebServer};

/// Line Translator Web Server
#[cfg(feature = "web")]
#[derive(Parser, Debug)]
#[command(name = "line-translator-web", version, about)]
struct Args {
    /// Bind address (overrides LINE_TRANSLATOR_BIND_ADDRESS)
    #[arg(short, long)]
    bind: Option<String>,

    /// Port number (overrides LINE_TRANSLATOR_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Translation config file (TOML or JSON)
    #[arg(short, long)]
    config: Option<String>,

    /// List supported environment variables and exit
    #[arg(long)]
    list_env: bool,
}

#[cfg(feature = "web")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.list_env {
        for (name, description) in env::describe_all() {
            println!("{:<40} {}", name, description);
        }
        return Ok(());
    }

    init_logging();

    let manager = match args.config {
        Some(ref path) => ConfigManager::from_path(path)?,
        None => ConfigManager::new()?,
    };
    let translation_config = manager.into_config();

    let mut web_config = WebConfig::from_env()?;
    if let Some(bind) = args.bind {
        web_config.bind_addr = bind;
    }
    if let Some(port) = args.port {
        web_config.port = port;
    }
    web_config.validate()?;

    tokio::fs::create_dir_all(&web_config.upload_dir).await?;

    let mut builder = TranslationService::builder(translation_config).object_store(Arc::new(
        LocalObjectStore::new(&web_config.upload_dir, web_config.uploads_base_url()),
    ));
    if let Some(ref mongo_config) = web_config.mongo_config {
        builder = attach_mongo(builder, mongo_config).await;
    }
    let service = builder.build()?;

    let server = WebServer::new(web_config, service);
    server.start().await?;

    Ok(())
}

#[cfg(feature = "web")]
fn init_logging() {
    let level = env::core::LogLevel::get().unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// 连接 MongoDB 并挂上持久化存储；失败时保留内存存储继续运行
#[cfg(feature = "web")]
async fn attach_mongo(
    builder: TranslationServiceBuilder,
    config: &MongoConfig,
) -> TranslationServiceBuilder {
    let db = match mongo::connect(config).await {
        Ok(db) => db,
        Err(e) => {
            tracing::warn!("MongoDB 不可用，用户资料和使用记录将只保存在内存中: {}", e);
            return builder;
        }
    };

    let profiles = MongoProfileStore::new(&db);
    let records = MongoUsageRecorder::new(&db);
    if let Err(e) = profiles.create_indexes().await {
        tracing::warn!("创建用户资料索引失败: {}", e);
    }
    if let Err(e) = records.create_indexes().await {
        tracing::warn!("创建使用记录索引失败: {}", e);
    }

    builder
        .profile_store(Arc::new(profiles))
        .usage_recorder(Arc::new(records))
}

#[cfg(not(feature = "web"))]
fn main() {
    eprintln!("Error: Web feature not enabled. Please compile with --features web");
    std::process::exit(1);
}
