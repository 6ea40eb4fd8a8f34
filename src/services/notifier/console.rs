//! 控制台推送
//!
//! 未配置 Telegram 凭据时使用：只写入本地输出，固定返回成功

use anyhow::Result;
use async_trait::async_trait;
use std::io::{self, Write};
use std::sync::Mutex;

use super::DeliveryChannel;
use crate::models::{BotIdentity, DeliveryOutcome};

/// 控制台推送返回的固定消息 ID
pub const CONSOLE_MESSAGE_ID: i64 = 999_999;

const FRAME: &str = "======================================================================";

/// 控制台推送通道
pub struct ConsoleChannel<W: Write + Send = io::Stdout> {
    sink: Mutex<W>,
}

impl ConsoleChannel<io::Stdout> {
    pub fn stdout() -> Self {
        Self::with_sink(io::stdout())
    }
}

impl<W: Write + Send> ConsoleChannel<W> {
    pub fn with_sink(sink: W) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    /// 取回输出目标
    pub fn into_sink(self) -> W {
        self.sink.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    fn write_framed(&self, text: &str) -> io::Result<()> {
        let mut sink = self.sink.lock().unwrap_or_else(|e| e.into_inner());
        writeln!(sink, "{}", FRAME)?;
        writeln!(sink, "📱 [LOCAL] Telegram 메시지 발송 시뮬레이션")?;
        writeln!(sink, "{}", FRAME)?;
        writeln!(sink, "{}", text)?;
        writeln!(sink, "{}", FRAME)?;
        sink.flush()
    }
}

#[async_trait]
impl<W: Write + Send> DeliveryChannel for ConsoleChannel<W> {
    async fn send(&self, text: &str) -> DeliveryOutcome {
        if let Err(e) = self.write_framed(text) {
            log::warn!("控制台输出失败: {}", e);
        }
        log::info!("本地模式：简报已输出到控制台（{} 字符）", text.chars().count());
        DeliveryOutcome::sent(Some(CONSOLE_MESSAGE_ID))
    }

    async fn check_connection(&self) -> Result<BotIdentity> {
        Ok(BotIdentity {
            first_name: "Console".to_string(),
            username: "local".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_console_send_always_succeeds() {
        let channel = ConsoleChannel::with_sink(Vec::new());
        let outcome = channel.send("📊 **테스트** (+2.30%)").await;

        assert!(outcome.success);
        assert_eq!(outcome.message_id, Some(CONSOLE_MESSAGE_ID));
        assert!(outcome.error.is_none());

        let written = String::from_utf8(channel.into_sink()).unwrap();
        assert!(written.contains("📊 **테스트** (+2.30%)"));
        assert!(written.starts_with(FRAME));
    }

    #[tokio::test]
    async fn test_console_send_succeeds_even_if_sink_fails() {
        let outcome = ConsoleChannel::with_sink(BrokenSink).send("text").await;
        assert!(outcome.success);
        assert_eq!(outcome.message_id, Some(CONSOLE_MESSAGE_ID));
    }

    #[tokio::test]
    async fn test_console_check_connection() {
        let identity = ConsoleChannel::with_sink(Vec::new()).check_connection().await.unwrap();
        assert_eq!(identity.username, "local");
    }
}
