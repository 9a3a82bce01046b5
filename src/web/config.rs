//! Web 服务器配置
//!
//! 使用类型安全的环境变量系统进行配置管理

use crate::env::{EnvError, EnvResult, EnvVar};

/// MongoDB 配置
#[derive(Debug, Clone)]
pub struct MongoConfig {
    /// MongoDB 连接字符串
    pub connection_string: String,
    /// 数据库名称
    pub database_name: String,
}

impl MongoConfig {
    /// 从环境变量创建配置
    ///
    /// 未设置 `MONGODB_URL` 时返回 `None`，用户资料和使用记录留在内存中。
    pub fn from_env() -> EnvResult<Option<Self>> {
        use crate::env::mongodb;

        let connection_string = match mongodb::ConnectionString::get_if_set() {
            Some(value) => value?,
            None => return Ok(None),
        };

        Ok(Some(Self {
            connection_string,
            database_name: mongodb::DatabaseName::get()?,
        }))
    }

    /// 验证配置
    pub fn validate(&self) -> EnvResult<()> {
        use crate::env::mongodb;

        if self.connection_string.is_empty() {
            return Err(EnvError {
                variable: mongodb::ConnectionString::NAME.to_string(),
                message: "Connection string cannot be empty".to_string(),
            });
        }

        if self.database_name.is_empty() {
            return Err(EnvError {
                variable: mongodb::DatabaseName::NAME.to_string(),
                message: "Database name cannot be empty".to_string(),
            });
        }

        Ok(())
    }
}

/// Web 服务器配置
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// 绑定地址
    pub bind_addr: String,
    /// 端口
    pub port: u16,
    /// 上传图片的保存目录，同时以 `/uploads` 对外提供
    pub upload_dir: String,
    /// 上传图片的对外基础 URL；未设置时由监听地址推出
    pub public_base_url: Option<String>,
    /// MongoDB 配置
    pub mongo_config: Option<MongoConfig>,
}

impl WebConfig {
    /// 从环境变量创建配置
    pub fn from_env() -> EnvResult<Self> {
        use crate::env::web;

        let public_base_url = web::PublicBaseUrl::get_if_set().transpose()?;

        Ok(Self {
            bind_addr: web::BindAddress::get()?,
            port: web::Port::get()?,
            upload_dir: web::UploadDir::get()?,
            public_base_url,
            mongo_config: MongoConfig::from_env()?,
        })
    }

    /// 验证配置
    pub fn validate(&self) -> EnvResult<()> {
        use crate::env::web;

        if self.bind_addr.is_empty() {
            return Err(EnvError {
                variable: web::BindAddress::NAME.to_string(),
                message: "Bind address cannot be empty".to_string(),
            });
        }

        if self.port == 0 {
            return Err(EnvError {
                variable: web::Port::NAME.to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if self.upload_dir.trim().is_empty() {
            return Err(EnvError {
                variable: web::UploadDir::NAME.to_string(),
                message: "Upload directory cannot be empty".to_string(),
            });
        }

        if let Some(ref mongo_config) = self.mongo_config {
            mongo_config.validate()?;
        }

        Ok(())
    }

    /// 获取完整的监听地址
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// 上传图片的对外基础 URL
    pub fn uploads_base_url(&self) -> String {
        match self.public_base_url {
            Some(ref url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}/uploads", self.listen_address()),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self::from_env().unwrap_or_else(|e| {
            tracing::warn!("从环境变量加载 Web 配置失败: {}，使用默认值", e);
            Self {
                bind_addr: "127.0.0.1".to_string(),
                port: 7080,
                upload_dir: "uploads".to_string(),
                public_base_url: None,
                mongo_config: None,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WebConfig {
        WebConfig {
            bind_addr: "0.0.0.0".to_string(),
            port: 8080,
            upload_dir: "uploads".to_string(),
            public_base_url: None,
            mongo_config: None,
        }
    }

    #[test]
    fn test_listen_and_upload_addresses() {
        let mut config = config();
        assert_eq!(config.listen_address(), "0.0.0.0:8080");
        assert_eq!(config.uploads_base_url(), "http://0.0.0.0:8080/uploads");

        config.public_base_url = Some("https://cdn.example.com/images/".to_string());
        assert_eq!(config.uploads_base_url(), "https://cdn.example.com/images");
    }

    #[test]
    fn test_validate() {
        assert!(config().validate().is_ok());

        let mut bad = config();
        bad.port = 0;
        assert!(bad.validate().is_err());

        let mut bad = config();
        bad.mongo_config = Some(MongoConfig {
            connection_string: "mongodb://localhost:27017".to_string(),
            database_name: String::new(),
        });
        assert!(bad.validate().is_err());
    }
}
