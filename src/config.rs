//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置，并允许环境变量覆盖

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::services::stock::common::{is_usable_api_key, ALPHA_VANTAGE_API};

/// API Key 环境变量
pub const API_KEY_ENV: &str = "ALPHA_VANTAGE_API_KEY";

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
}

/// 行情 API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Alpha Vantage API Key（为空或为 "demo" 时使用模拟数据）
    #[serde(default)]
    pub api_key: String,
    /// 行情接口地址
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// 单次请求最多尝试次数
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// 重试退避基数（毫秒）
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 持久化配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// 自选股文件所在目录
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// API 配置
    #[serde(default)]
    pub api: ApiConfig,
    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
    /// 持久化配置
    #[serde(default)]
    pub storage: StorageConfig,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_base_url() -> String { ALPHA_VANTAGE_API.to_string() }
fn default_timeout() -> u64 { 30 }
fn default_connect_timeout() -> u64 { 10 }
fn default_max_retries() -> u32 { 3 }
fn default_retry_delay() -> u64 { 1000 }
fn default_log_level() -> String { "info".to_string() }
fn default_data_dir() -> PathBuf { PathBuf::from("data") }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay(),
        }
    }
}

impl ApiConfig {
    /// 是否配置了可用的 API Key
    pub fn has_api_key(&self) -> bool {
        is_usable_api_key(&self.api_key)
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// 配置加载提示
#[derive(Debug, Clone, PartialEq)]
pub enum LoadNote {
    /// 从文件加载成功
    Loaded(PathBuf),
    /// 文件存在但无法读取或解析
    FileFailed { path: PathBuf, error: String },
    /// 未找到可用的配置文件
    Defaults,
    /// PORT 环境变量不是有效端口
    InvalidPort(String),
}

impl LoadNote {
    /// 按严重程度写入日志
    pub fn log(&self) {
        match self {
            LoadNote::Loaded(path) => log::info!("从 {} 加载配置成功", path.display()),
            LoadNote::FileFailed { path, error } => {
                log::warn!("加载配置文件 {} 失败，已跳过: {}", path.display(), error)
            }
            LoadNote::Defaults => log::info!("使用默认配置"),
            LoadNote::InvalidPort(port) => log::warn!("PORT 环境变量无效: {}", port),
        }
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置，优先从文件，失败则使用默认值，最后应用环境变量覆盖
    ///
    /// 加载过程中的提示随配置一起返回，由调用方在日志系统初始化后输出
    pub fn load() -> (Self, Vec<LoadNote>) {
        let mut notes = Vec::new();
        let mut config = Self::load_from(&["config.json", "config/config.json"], &mut notes);
        config.apply_env_overrides(|name| std::env::var(name).ok(), &mut notes);
        (config, notes)
    }

    /// 依次尝试候选路径，第一个可解析的文件生效
    pub fn load_from<P: AsRef<Path>>(paths: &[P], notes: &mut Vec<LoadNote>) -> Self {
        for path in paths {
            let path = path.as_ref();
            if !path.exists() {
                continue;
            }
            match Self::from_file(path) {
                Ok(config) => {
                    notes.push(LoadNote::Loaded(path.to_path_buf()));
                    return config;
                }
                Err(e) => notes.push(LoadNote::FileFailed {
                    path: path.to_path_buf(),
                    error: e.to_string(),
                }),
            }
        }

        notes.push(LoadNote::Defaults);
        Self::default()
    }

    /// 应用环境变量覆盖
    ///
    /// 支持 ALPHA_VANTAGE_API_KEY、HOST、PORT、WATCHLIST_DIR、RUST_LOG
    pub fn apply_env_overrides<F>(&mut self, lookup: F, notes: &mut Vec<LoadNote>)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV) {
            self.api.api_key = key;
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => notes.push(LoadNote::InvalidPort(port)),
            }
        }
        if let Some(dir) = lookup("WATCHLIST_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(level) = lookup("RUST_LOG") {
            self.log.level = level;
        }
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
