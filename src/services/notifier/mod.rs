//! 简报推送
//!
//! - Telegram：配置了 Bot Token 与 Chat ID 时使用
//! - 控制台：未配置凭据时使用，不访问网络

mod console;
mod telegram;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::TelegramConfig;
use crate::models::{BotIdentity, DeliveryOutcome};

pub use console::{ConsoleChannel, CONSOLE_MESSAGE_ID};
pub use telegram::TelegramChannel;

/// 推送通道
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// 发送一条消息，失败以结果返回而非错误
    async fn send(&self, text: &str) -> DeliveryOutcome;

    /// 连接检查
    async fn check_connection(&self) -> Result<BotIdentity>;

    /// 日志中使用的名称
    fn name(&self) -> &'static str;
}

/// 按配置选择推送通道
pub fn from_config(config: &TelegramConfig) -> Result<Box<dyn DeliveryChannel>> {
    if config.is_configured() {
        Ok(Box::new(TelegramChannel::new(config)?))
    } else {
        log::warn!("未设置 TELEGRAM_BOT_TOKEN / TELEGRAM_CHAT_ID，简报仅输出到控制台");
        Ok(Box::new(ConsoleChannel::stdout()))
    }
}
