//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置，敏感信息和端口可由环境变量覆盖

use anyhow::{anyhow, Context};
use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// 健康检查服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口（环境变量 PORT 优先）
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Telegram 推送配置
///
/// bot_token 与 chat_id 任一为空时使用本地控制台输出
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub chat_id: String,
    /// Bot API 地址
    #[serde(default = "default_telegram_base")]
    pub api_base: String,
    /// 请求超时时间（秒）
    #[serde(default = "default_telegram_timeout")]
    pub timeout_secs: u64,
}

/// 行情数据配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// 使用模拟行情（不访问网络）
    #[serde(default)]
    pub synthetic: bool,
    /// Yahoo Finance 地址
    #[serde(default = "default_market_base")]
    pub api_base: String,
    /// 单个指数请求超时时间（秒）
    #[serde(default = "default_market_timeout")]
    pub timeout_secs: u64,
}

/// 洞察生成配置
///
/// 未设置 API Key 时使用规则引擎
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightConfig {
    #[serde(default)]
    pub anthropic_api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_anthropic_base")]
    pub api_base: String,
    #[serde(default = "default_insight_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

/// 定时任务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// 每日执行时间（HH:MM，本地时区）
    #[serde(default = "default_run_time")]
    pub time: String,
    /// IANA 时区名称
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// 检查间隔（秒）
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
}

/// 行情快照导出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// 是否导出原始快照
    #[serde(default)]
    pub dump_snapshot: bool,
    /// 导出目录
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub market: MarketConfig,
    #[serde(default)]
    pub insight: InsightConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub log: LogConfig,
    /// 配置来源文件，使用默认配置时为 None
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_telegram_base() -> String { "https://api.telegram.org".to_string() }
fn default_telegram_timeout() -> u64 { 10 }
fn default_market_base() -> String { "https://query1.finance.yahoo.com".to_string() }
fn default_market_timeout() -> u64 { 10 }
fn default_model() -> String { "claude-3-5-sonnet-latest".to_string() }
fn default_anthropic_base() -> String { "https://api.anthropic.com".to_string() }
fn default_insight_timeout() -> u64 { 30 }
fn default_max_tokens() -> u32 { 1024 }
fn default_run_time() -> String { "07:00".to_string() }
fn default_timezone() -> String { "Asia/Seoul".to_string() }
fn default_check_interval() -> u64 { 60 }
fn default_output_dir() -> PathBuf { PathBuf::from(".") }
fn default_log_level() -> String { "info".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            api_base: default_telegram_base(),
            timeout_secs: default_telegram_timeout(),
        }
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            synthetic: false,
            api_base: default_market_base(),
            timeout_secs: default_market_timeout(),
        }
    }
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            anthropic_api_key: String::new(),
            model: default_model(),
            api_base: default_anthropic_base(),
            timeout_secs: default_insight_timeout(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            time: default_run_time(),
            timezone: default_timezone(),
            check_interval_secs: default_check_interval(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dump_snapshot: false,
            dir: default_output_dir(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl TelegramConfig {
    /// 凭据是否完整
    pub fn is_configured(&self) -> bool {
        !self.bot_token.is_empty() && !self.chat_id.is_empty()
    }
}

impl InsightConfig {
    pub fn is_configured(&self) -> bool {
        !self.anthropic_api_key.is_empty()
    }
}

impl ScheduleConfig {
    /// 解析每日执行时间
    pub fn run_time(&self) -> anyhow::Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.time, "%H:%M")
            .with_context(|| format!("无效的执行时间: {}", self.time))
    }

    /// 解析时区
    pub fn tz(&self) -> anyhow::Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow!("无效的时区 {}: {}", self.timezone, e))
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let mut config: AppConfig = serde_json::from_str(&content)?;
        config.source = Some(path.as_ref().to_path_buf());
        Ok(config)
    }

    /// 加载配置
    ///
    /// 指定路径时必须加载成功；否则依次尝试默认路径，失败则使用默认值。
    /// 最后应用环境变量覆盖。
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)
                .with_context(|| format!("加载配置文件 {} 失败", path.display()))?,
            None => Self::load_default_paths(),
        };

        config.apply_env(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn load_default_paths() -> Self {
        let config_paths = ["config.json", "config/config.json"];

        for path in config_paths {
            if Path::new(path).exists() {
                match Self::from_file(path) {
                    Ok(config) => return config,
                    Err(e) => {
                        eprintln!("加载配置文件 {} 失败: {}", path, e);
                    }
                }
            }
        }

        Self::default()
    }

    /// 用环境变量覆盖凭据与端口
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = non_empty("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = token;
        }
        if let Some(chat_id) = non_empty("TELEGRAM_CHAT_ID") {
            self.telegram.chat_id = chat_id;
        }
        if let Some(key) = non_empty("ANTHROPIC_API_KEY") {
            self.insight.anthropic_api_key = key;
        }
        if let Some(port) = non_empty("PORT").and_then(|p| p.trim().parse().ok()) {
            self.server.port = port;
        }
    }

    /// 启动前校验时间与时区
    pub fn validate(&self) -> anyhow::Result<()> {
        self.schedule.run_time()?;
        self.schedule.tz()?;
        Ok(())
    }

    /// 获取健康检查服务绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
