//! 分析结果模型
//!
//! 包括：
//! - 美股市场情绪
//! - 韩国板块映射规则及影响评分
//! - 每日洞察

use serde::{Deserialize, Serialize};

use super::market::IndexName;

// ==================== 市场情绪 ====================

/// 美股整体情绪标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketMood {
    /// 强势
    Bullish,
    /// 弱势
    Bearish,
    /// 科技股弱势
    TechWeakness,
    /// 震荡
    Mixed,
    /// 数据不足
    DataInsufficient,
}

impl MarketMood {
    /// 报告中使用的标签
    pub fn label(&self) -> &'static str {
        match self {
            MarketMood::Bullish => "강세",
            MarketMood::Bearish => "약세",
            MarketMood::TechWeakness => "기술주 약세",
            MarketMood::Mixed => "혼조",
            MarketMood::DataInsufficient => "데이터 부족",
        }
    }
}

/// 情绪分类结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub mood: MarketMood,
    /// 指数走势说明
    pub analysis: String,
    /// VIX 说明，数据不足时为空
    pub vix_analysis: String,
}

// ==================== 板块映射 ====================

/// 板块成分股
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRule {
    pub name: String,
    /// 韩国交易所代码
    pub code: String,
    /// 板块内权重，取值 (0, 1]
    pub weight: f64,
}

/// 美股指数 → 韩国板块的静态映射规则
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorRule {
    pub sector_key: String,
    /// 板块展示名称
    pub display_name: String,
    pub stocks: Vec<StockRule>,
    /// 触发指数
    pub trigger: IndexName,
    /// 触发阈值（涨跌幅绝对值，百分比）
    pub threshold_pct: f64,
    pub keywords: Vec<String>,
}

/// 影响方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Positive,
    Negative,
    Neutral,
}

impl Direction {
    /// 由涨跌幅得到方向，零按下跌处理
    pub fn from_change(change_pct: f64) -> Self {
        if change_pct > 0.0 {
            Direction::Positive
        } else {
            Direction::Negative
        }
    }

    /// 报告中的颜色标记
    pub fn marker(&self) -> &'static str {
        match self {
            Direction::Positive => "🟢",
            Direction::Negative => "🔴",
            Direction::Neutral => "⚪",
        }
    }
}

/// 单个板块在本周期的影响评分
#[derive(Debug, Clone, PartialEq)]
pub struct SectorImpact<'a> {
    pub rule: &'a SectorRule,
    /// |涨跌幅| / 阈值
    pub impact_score: f64,
    pub direction: Direction,
    pub change_pct: f64,
}

/// 韩国市场整体影响判断
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactSentiment {
    Positive,
    Negative,
    Neutral,
    Unknown,
}

impl ImpactSentiment {
    pub fn label(&self) -> &'static str {
        match self {
            ImpactSentiment::Positive => "긍정적",
            ImpactSentiment::Negative => "부정적",
            ImpactSentiment::Neutral => "중립",
            ImpactSentiment::Unknown => "알 수 없음",
        }
    }
}

impl From<Direction> for ImpactSentiment {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Positive => ImpactSentiment::Positive,
            Direction::Negative => ImpactSentiment::Negative,
            Direction::Neutral => ImpactSentiment::Neutral,
        }
    }
}

/// 关注个股
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopStock {
    pub name: String,
    pub code: String,
    /// 所属板块展示名称
    pub sector: String,
    /// 板块评分 × 个股权重
    pub impact_score: f64,
    pub direction: Direction,
}

/// 韩国市场影响分析结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KoreaImpactResult {
    pub sentiment: ImpactSentiment,
    /// 主要受影响板块，数据不足时为 None
    pub primary_sector: Option<String>,
    /// 最多 3 只
    pub top_stocks: Vec<TopStock>,
    pub analysis: String,
    /// 触发指数，无明确触发时为 None
    pub trigger_index: Option<IndexName>,
    pub trigger_change_pct: f64,
}

// ==================== 每日洞察 ====================

/// 每日洞察
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightResult {
    /// 核心观点
    pub insight: String,
    /// 要点，最多 3 条
    pub key_points: Vec<String>,
    /// 风险提示
    pub risk_note: String,
    /// 操作建议，最多 2 条，低波动时追加 1 条
    pub action_items: Vec<String>,
}
