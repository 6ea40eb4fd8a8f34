//! 美股行情采集
//!
//! 两种数据源实现同一接口，启动时按配置选择：
//! - Yahoo Finance：真实收盘数据
//! - 模拟行情：不访问网络，用于测试和无数据源环境

mod synthetic;
mod yahoo;

use async_trait::async_trait;

use crate::config::{MarketConfig, ScheduleConfig};
use crate::models::MarketSnapshot;

pub use synthetic::SyntheticMarketSource;
pub use yahoo::YahooFinanceSource;

/// 行情数据源
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// 采集一次行情快照
    ///
    /// 单个指数失败只将该条目标记为缺失，不影响整体
    async fn collect(&self) -> MarketSnapshot;

    /// 日志中使用的名称
    fn name(&self) -> &'static str;
}

/// 按配置选择数据源
pub fn from_config(
    market: &MarketConfig,
    schedule: &ScheduleConfig,
) -> anyhow::Result<Box<dyn MarketDataSource>> {
    if market.synthetic {
        Ok(Box::new(SyntheticMarketSource::new(schedule.tz()?)))
    } else {
        Ok(Box::new(YahooFinanceSource::new(market)?))
    }
}
