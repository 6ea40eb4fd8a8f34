//! 每日洞察生成
//!
//! 默认使用规则引擎；配置了 Anthropic API Key 时改用模型生成，
//! 模型调用失败自动回退到规则引擎

mod claude;
mod rules;

use async_trait::async_trait;

use crate::config::InsightConfig;
use crate::models::{InsightResult, KoreaImpactResult, MarketSnapshot};

pub use claude::ClaudeInsight;
pub use rules::{RuleBasedInsight, MAX_ACTION_ITEMS, MAX_KEY_POINTS};

/// 洞察生成器
#[async_trait]
pub trait InsightGenerator: Send + Sync {
    /// 根据行情快照与韩国影响分析生成洞察，不返回错误
    async fn generate(&self, snapshot: &MarketSnapshot, korea: &KoreaImpactResult)
        -> InsightResult;

    /// 日志中使用的名称
    fn name(&self) -> &'static str;
}

/// 按配置选择洞察生成器
pub fn from_config(config: &InsightConfig) -> anyhow::Result<Box<dyn InsightGenerator>> {
    if config.is_configured() {
        Ok(Box::new(ClaudeInsight::new(config)?))
    } else {
        Ok(Box::new(RuleBasedInsight::new()))
    }
}
