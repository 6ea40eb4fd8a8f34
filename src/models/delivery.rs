//! 消息推送模型
//!
//! 推送结果以及 Telegram Bot API 的请求/响应结构

use serde::{Deserialize, Serialize};

/// 一次推送的结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub success: bool,
    pub message_id: Option<i64>,
    pub error: Option<String>,
}

impl DeliveryOutcome {
    pub fn sent(message_id: Option<i64>) -> Self {
        Self {
            success: true,
            message_id,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(error.into()),
        }
    }
}

/// Bot 身份信息（连接检查）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotIdentity {
    pub first_name: String,
    pub username: String,
}

/// sendMessage 请求体
#[derive(Debug, Serialize)]
pub struct SendMessageRequest<'a> {
    pub chat_id: &'a str,
    pub text: &'a str,
    pub parse_mode: &'a str,
    pub disable_web_page_preview: bool,
}

/// Telegram 统一响应格式
#[derive(Debug, Deserialize)]
pub struct TelegramResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

/// sendMessage 返回的消息
#[derive(Debug, Deserialize)]
pub struct SentMessage {
    pub message_id: i64,
}

/// getMe 返回的 Bot 用户
#[derive(Debug, Deserialize)]
pub struct BotUser {
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}
