//! 美股指数行情模型
//!
//! 定义指数标识、单个指数的收盘行情以及一次采集周期的行情快照

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 跟踪的美股指数
///
/// 声明顺序即报告中的展示顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IndexName {
    /// 标普 500（大盘）
    #[serde(rename = "S&P 500")]
    Sp500,
    /// 纳斯达克综合指数（科技）
    #[serde(rename = "NASDAQ")]
    Nasdaq,
    /// 道琼斯工业指数（工业）
    #[serde(rename = "DOW")]
    Dow,
    /// 波动率指数
    #[serde(rename = "VIX")]
    Vix,
}

impl IndexName {
    /// 全部指数，按展示顺序
    pub const ALL: [IndexName; 4] = [
        IndexName::Sp500,
        IndexName::Nasdaq,
        IndexName::Dow,
        IndexName::Vix,
    ];

    /// 报告中使用的名称
    pub fn display_name(&self) -> &'static str {
        match self {
            IndexName::Sp500 => "S&P 500",
            IndexName::Nasdaq => "NASDAQ",
            IndexName::Dow => "DOW",
            IndexName::Vix => "VIX",
        }
    }

    /// Yahoo Finance 代码
    pub fn ticker(&self) -> &'static str {
        match self {
            IndexName::Sp500 => "^GSPC",
            IndexName::Nasdaq => "^IXIC",
            IndexName::Dow => "^DJI",
            IndexName::Vix => "^VIX",
        }
    }
}

impl fmt::Display for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// 单个指数的最新收盘行情
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexQuote {
    /// 指数
    pub name: IndexName,
    /// 最新收盘价（保留两位小数）
    pub price: f64,
    /// 较前一交易日涨跌幅（百分比，保留两位小数）
    pub change_pct: f64,
    /// 最新收盘日期
    pub date: NaiveDate,
}

impl IndexQuote {
    /// 由最近两个收盘价构造行情
    pub fn from_closes(name: IndexName, latest: f64, previous: f64, date: NaiveDate) -> Self {
        let change_pct = if previous != 0.0 {
            (latest - previous) / previous * 100.0
        } else {
            0.0
        };

        Self {
            name,
            price: round2(latest),
            change_pct: round2(change_pct),
            date,
        }
    }
}

/// 一次采集周期的行情快照
///
/// 值为 `None` 表示该指数抓取失败，下游按缺失处理
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketSnapshot {
    quotes: BTreeMap<IndexName, Option<IndexQuote>>,
}

impl MarketSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录成功抓取的行情
    pub fn insert(&mut self, quote: IndexQuote) {
        self.quotes.insert(quote.name, Some(quote));
    }

    /// 记录抓取失败的指数
    pub fn mark_unavailable(&mut self, name: IndexName) {
        self.quotes.insert(name, None);
    }

    /// 获取指数行情，缺失或失败时返回 None
    pub fn get(&self, name: IndexName) -> Option<&IndexQuote> {
        self.quotes.get(&name).and_then(|q| q.as_ref())
    }

    /// 指数涨跌幅
    pub fn change_pct(&self, name: IndexName) -> Option<f64> {
        self.get(name).map(|q| q.change_pct)
    }

    /// 指数价格
    pub fn price(&self, name: IndexName) -> Option<f64> {
        self.get(name).map(|q| q.price)
    }

    /// 快照中完全没有任何指数条目
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// 按展示顺序遍历全部条目（含失败条目）
    pub fn entries(&self) -> impl Iterator<Item = (IndexName, Option<&IndexQuote>)> {
        self.quotes.iter().map(|(name, quote)| (*name, quote.as_ref()))
    }

    /// 按展示顺序遍历成功抓取的行情
    pub fn available(&self) -> impl Iterator<Item = &IndexQuote> {
        self.quotes.values().filter_map(|q| q.as_ref())
    }
}

impl FromIterator<IndexQuote> for MarketSnapshot {
    fn from_iter<I: IntoIterator<Item = IndexQuote>>(iter: I) -> Self {
        let mut snapshot = MarketSnapshot::new();
        for quote in iter {
            snapshot.insert(quote);
        }
        snapshot
    }
}

/// 四舍五入到两位小数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
