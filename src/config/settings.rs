// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// 应用程序配置设置
///
/// 包含服务器、数据库、Scrapyd 节点、认证、调度器和分页等所有配置项
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// 数据库配置
    pub database: DatabaseSettings,
    /// Scrapyd 节点配置
    pub scrapyd: ScrapydSettings,
    /// 基本认证配置
    pub auth: AuthSettings,
    /// 调度器配置
    pub scheduler: SchedulerSettings,
    /// 分页配置
    pub page: PageSettings,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
    /// 调试模式
    pub debug: bool,
}

/// 数据库配置设置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
}

/// Scrapyd 节点配置设置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScrapydSettings {
    /// 节点列表，格式为 `[user:pass@][scheme://]host[:port][#group]`
    pub servers: Vec<String>,
    /// 普通 API 调用超时时间（秒）
    pub timeout_secs: u64,
    /// daemonstatus 探测超时时间（秒）
    pub status_timeout_secs: u64,
    /// 作业同步间隔（秒），0 表示关闭后台同步
    pub poll_interval_secs: u64,
}

/// 基本认证配置设置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthSettings {
    /// 是否启用 HTTP Basic 认证
    pub enabled: bool,
    pub username: String,
    pub password: String,
}

/// 调度器配置设置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerSettings {
    /// 是否在启动时运行调度器
    pub enabled: bool,
    /// 调度循环的检查间隔（毫秒）
    pub tick_millis: u64,
}

/// 分页配置设置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PageSettings {
    pub jobs_per_page: u64,
    pub tasks_per_page: u64,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次加载默认值、`config/default`、`config/{APP_ENVIRONMENT}` 和
    /// `SCRAPYDASH__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("SCRAPYDASH")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("scrapyd.servers")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// 仅使用内置默认值构建配置
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::builder()?.build()?.try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            // Start with default settings
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("server.debug", false)?
            // Default DB settings
            .set_default("database.url", "sqlite://scrapydash.db?mode=rwc")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            // Default Scrapyd settings
            .set_default("scrapyd.servers", vec!["127.0.0.1:6800"])?
            .set_default("scrapyd.timeout_secs", 30)?
            .set_default("scrapyd.status_timeout_secs", 10)?
            .set_default("scrapyd.poll_interval_secs", 300)?
            // Default auth settings
            .set_default("auth.enabled", false)?
            .set_default("auth.username", "")?
            .set_default("auth.password", "")?
            // Default scheduler settings
            .set_default("scheduler.enabled", true)?
            .set_default("scheduler.tick_millis", 1000)?
            // Default page settings
            .set_default("page.jobs_per_page", 100)?
            .set_default("page.tasks_per_page", 100)
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
