use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumMessage};

use crate::errors::{ReferralError, Result};
use crate::profile::ReportPeriod;

/// 归因写入策略
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Default,
    EnumIter,
    AsRefStr,
    EnumMessage,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttributionPolicy {
    #[default]
    #[strum(message = "Every resolution overwrites the stored attribution")]
    LastTouch,
    #[strum(message = "The first stored attribution is kept; only campaign id upgrades apply")]
    FirstTouch,
}

impl std::fmt::Display for AttributionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl std::str::FromStr for AttributionPolicy {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "last_touch" => Ok(Self::LastTouch),
            "first_touch" => Ok(Self::FirstTouch),
            _ => Err(format!(
                "Invalid attribution policy: '{}'. Valid: last_touch, first_touch",
                s
            )),
        }
    }
}

/// 归因存储后端类型
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, EnumIter, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttributionBackendKind {
    #[default]
    Memory,
    File,
}

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 包含：
/// - server: 监听地址、端口、对外 origin
/// - backend: 分析后端地址、超时、缓存
/// - attribution: 归因存储与策略
/// - cabinet: cabinet 视图参数
/// - routes: 路由前缀
/// - logging: 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub attribution: AttributionConfig,
    #[serde(default)]
    pub cabinet: CabinetConfig,
    #[serde(default)]
    pub routes: RoutesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > TOML 文件 > 默认值
    /// ENV 前缀：RL，分隔符：__
    /// 示例：RL__SERVER__PORT=9999
    pub fn load(path: Option<&str>) -> Result<Self> {
        use config::{Config, Environment, File};

        let path = path.unwrap_or(DEFAULT_CONFIG_PATH);

        let settings = Config::builder()
            // 1. 从 TOML 文件加载（可选）
            .add_source(File::with_name(path).required(false))
            // 2. 从环境变量覆盖，前缀 RL，分隔符 __
            .add_source(
                Environment::with_prefix("RL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: StaticConfig = settings.try_deserialize()?;
        if std::path::Path::new(path).exists() {
            eprintln!("[INFO] Configuration loaded from: {}", path);
        }
        config.validate()?;
        Ok(config)
    }

    /// 启动前校验
    pub fn validate(&self) -> Result<()> {
        if self.cabinet.leads_page_size == 0 {
            return Err(ReferralError::config("cabinet.leads_page_size must be > 0"));
        }
        url::Url::parse(&self.server.origin).map_err(|e| {
            ReferralError::config(format!("server.origin '{}' is invalid: {}", self.server.origin, e))
        })?;
        if self.attribution.backend == AttributionBackendKind::File
            && self.attribution.file_path.trim().is_empty()
        {
            return Err(ReferralError::config(
                "attribution.file_path is required for the file backend",
            ));
        }
        if !self.routes.health_prefix.starts_with('/') {
            return Err(ReferralError::config("routes.health_prefix must start with '/'"));
        }
        Ok(())
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
    /// 对外可见的 origin，用于把相对推荐链接补全为绝对链接
    #[serde(default = "default_origin")]
    pub origin: String,
}

/// 分析后端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub base_url: String,
    #[serde(default = "default_backend_timeout")]
    pub timeout_secs: u64,
    /// 0 表示不缓存
    #[serde(default = "default_backend_cache_ttl")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_backend_cache_capacity")]
    pub cache_capacity: u64,
}

/// 归因存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionConfig {
    #[serde(default)]
    pub backend: AttributionBackendKind,
    #[serde(default = "default_attribution_file")]
    pub file_path: String,
    /// 内存后端的 TTL，0 表示永不过期
    #[serde(default)]
    pub ttl_secs: u64,
    #[serde(default = "default_attribution_capacity")]
    pub max_capacity: u64,
    #[serde(default)]
    pub policy: AttributionPolicy,
}

/// Cabinet 视图配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CabinetConfig {
    #[serde(default = "default_leads_page_size")]
    pub leads_page_size: usize,
    #[serde(default)]
    pub default_period: ReportPeriod,
    #[serde(default = "default_qr_output_dir")]
    pub qr_output_dir: String,
}

/// 路由配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutesConfig {
    #[serde(default = "default_health_prefix")]
    pub health_prefix: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

// ============================================================
// Default value functions for static config
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_origin() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_backend_url() -> String {
    "http://127.0.0.1:8000/api".to_string()
}

fn default_backend_timeout() -> u64 {
    5
}

fn default_backend_cache_ttl() -> u64 {
    30
}

fn default_backend_cache_capacity() -> u64 {
    10_000
}

fn default_attribution_file() -> String {
    "attribution.json".to_string()
}

fn default_attribution_capacity() -> u64 {
    100_000
}

fn default_leads_page_size() -> usize {
    20
}

fn default_qr_output_dir() -> String {
    "qr".to_string()
}

fn default_health_prefix() -> String {
    "/health".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
            origin: default_origin(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            timeout_secs: default_backend_timeout(),
            cache_ttl_secs: default_backend_cache_ttl(),
            cache_capacity: default_backend_cache_capacity(),
        }
    }
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            backend: AttributionBackendKind::default(),
            file_path: default_attribution_file(),
            ttl_secs: 0,
            max_capacity: default_attribution_capacity(),
            policy: AttributionPolicy::default(),
        }
    }
}

impl Default for CabinetConfig {
    fn default() -> Self {
        Self {
            leads_page_size: default_leads_page_size(),
            default_period: ReportPeriod::default(),
            qr_output_dir: default_qr_output_dir(),
        }
    }
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            health_prefix: default_health_prefix(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}
