//! Yahoo Finance 行情接口实现
//!
//! 对接 chart API，取最近两个交易日收盘价计算涨跌幅
//! GET /v8/finance/chart/<ticker>?range=5d&interval=1d

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use chrono_tz::America::New_York;
use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::MarketDataSource;
use crate::config::MarketConfig;
use crate::models::{IndexName, IndexQuote, MarketSnapshot};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Yahoo Finance 数据源
pub struct YahooFinanceSource {
    /// HTTP 客户端（带超时）
    client: Client,
    /// 接口地址
    api_base: String,
}

impl YahooFinanceSource {
    pub fn new(config: &MarketConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .context("创建 HTTP 客户端失败")?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    /// 获取单个指数最新行情
    pub async fn fetch_quote(&self, name: IndexName) -> Result<IndexQuote> {
        let url = format!(
            "{}/v8/finance/chart/{}",
            self.api_base,
            name.ticker().replace('^', "%5E")
        );
        log::debug!("请求指数行情 {} URL: {}", name, url);

        let response = self
            .client
            .get(&url)
            .query(&[("range", "5d"), ("interval", "1d")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("获取 {} 行情失败: {}", name, response.status()));
        }

        let text = response.text().await?;
        parse_chart(name, &text)
    }
}

#[async_trait]
impl MarketDataSource for YahooFinanceSource {
    async fn collect(&self) -> MarketSnapshot {
        let results = join_all(IndexName::ALL.iter().map(|&name| self.fetch_quote(name))).await;

        let mut snapshot = MarketSnapshot::new();
        for (name, result) in IndexName::ALL.into_iter().zip(results) {
            match result {
                Ok(quote) => snapshot.insert(quote),
                Err(e) => {
                    log::warn!("获取 {} 行情失败: {:#}", name, e);
                    snapshot.mark_unavailable(name);
                }
            }
        }
        snapshot
    }

    fn name(&self) -> &'static str {
        "yahoo"
    }
}

/// 解析 chart 响应，取最后两个有效收盘价
fn parse_chart(name: IndexName, data: &str) -> Result<IndexQuote> {
    let envelope: ChartEnvelope =
        serde_json::from_str(data).map_err(|e| anyhow!("解析JSON失败: {}", e))?;

    if let Some(error) = envelope.chart.error {
        return Err(anyhow!("接口返回错误: {}", error.description));
    }

    let result = envelope
        .chart
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.swap_remove(0)) })
        .ok_or_else(|| anyhow!("{} 无行情数据", name))?;

    let closes = result
        .indicators
        .quote
        .first()
        .map(|q| q.close.as_slice())
        .unwrap_or_default();

    let points: Vec<(i64, f64)> = result
        .timestamp
        .iter()
        .zip(closes)
        .filter_map(|(&ts, close)| close.map(|c| (ts, c)))
        .collect();

    let [.., (_, previous), (latest_ts, latest)] = points.as_slice() else {
        return Err(anyhow!("{} 收盘数据不足两个交易日", name));
    };

    Ok(IndexQuote::from_closes(name, *latest, *previous, trading_date(*latest_ts)?))
}

/// 时间戳转换为纽约交易日
fn trading_date(timestamp: i64) -> Result<NaiveDate> {
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .map(|t| t.with_timezone(&New_York).date_naive())
        .ok_or_else(|| anyhow!("无效的时间戳: {}", timestamp))
}
