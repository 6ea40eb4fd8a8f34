//! Telegram Bot API 推送
//!
//! - POST /bot<token>/sendMessage：发送简报（Markdown，关闭链接预览）
//! - GET /bot<token>/getMe：连接检查
//!
//! 单次请求，不重试。请求 URL 含 Bot Token，reqwest 错误一律去掉 URL 后再返回

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::DeliveryChannel;
use crate::config::TelegramConfig;
use crate::models::{
    BotIdentity, BotUser, DeliveryOutcome, SendMessageRequest, SentMessage, TelegramResponse,
};

/// 连接检查超时时间（秒）
const CHECK_TIMEOUT_SECS: u64 = 5;
const PARSE_MODE: &str = "Markdown";

/// Telegram 推送通道
pub struct TelegramChannel {
    client: Client,
    /// https://api.telegram.org/bot<token>
    bot_url: String,
    chat_id: String,
}

impl TelegramChannel {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("创建 HTTP 客户端失败")?;

        Ok(Self {
            client,
            bot_url: format!(
                "{}/bot{}",
                config.api_base.trim_end_matches('/'),
                config.bot_token
            ),
            chat_id: config.chat_id.clone(),
        })
    }

    async fn post_message(&self, text: &str) -> Result<TelegramResponse<SentMessage>> {
        let body = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
            parse_mode: PARSE_MODE,
            disable_web_page_preview: true,
        };

        let response = self
            .client
            .post(format!("{}/sendMessage", self.bot_url))
            .json(&body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        // 错误状态码同样携带 {ok:false, description}，统一按响应体解析
        let status = response.status();
        response
            .json::<TelegramResponse<SentMessage>>()
            .await
            .map_err(|e| anyhow!("HTTP {}: {}", status, e.without_url()))
    }
}

/// 将 sendMessage 响应映射为推送结果
fn outcome_from_response(response: TelegramResponse<SentMessage>) -> DeliveryOutcome {
    if response.ok {
        DeliveryOutcome::sent(response.result.map(|m| m.message_id))
    } else {
        DeliveryOutcome::failed(
            response
                .description
                .unwrap_or_else(|| "Unknown error".to_string()),
        )
    }
}

#[async_trait]
impl DeliveryChannel for TelegramChannel {
    async fn send(&self, text: &str) -> DeliveryOutcome {
        match self.post_message(text).await {
            Ok(response) => outcome_from_response(response),
            Err(e) => DeliveryOutcome::failed(format!("{:#}", e)),
        }
    }

    async fn check_connection(&self) -> Result<BotIdentity> {
        let response: TelegramResponse<BotUser> = self
            .client
            .get(format!("{}/getMe", self.bot_url))
            .timeout(Duration::from_secs(CHECK_TIMEOUT_SECS))
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("连接 Telegram 失败")?
            .json()
            .await
            .map_err(reqwest::Error::without_url)
            .context("解析 getMe 响应失败")?;

        if !response.ok {
            return Err(anyhow!(
                "Bot 连接失败: {}",
                response.description.unwrap_or_else(|| "Unknown error".to_string())
            ));
        }

        let user = response
            .result
            .ok_or_else(|| anyhow!("getMe 响应缺少 result"))?;
        Ok(BotIdentity {
            first_name: user.first_name,
            username: user.username.unwrap_or_default(),
        })
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}
