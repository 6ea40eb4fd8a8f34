//! 韩国市场影响分析
//!
//! 将美股指数变动映射到固定的韩国板块/个股表并打分
//!
//! ## 流程
//! - 逐条检查板块规则，触发指数涨跌幅绝对值达到阈值即入选
//! - 按影响分降序排序（稳定排序，同分保持规则表顺序）
//! - 取前两个板块的成分股，按 板块分 × 权重 排序选出前三

use crate::models::{
    Direction, ImpactSentiment, IndexName, KoreaImpactResult, MarketSnapshot, SectorImpact,
    SectorRule, StockRule, TopStock,
};

/// 变动幅度达到此值描述为"急剧"
pub const SHARP_MOVE_PCT: f64 = 2.5;
/// 变动幅度达到此值描述为"强劲"
pub const STRONG_MOVE_PCT: f64 = 1.5;
/// 参与选股的板块数
pub const RANKED_SECTORS: usize = 2;
/// 关注个股数量上限
pub const TOP_STOCKS: usize = 3;
/// 分析文本中附带的关键词数
const ANALYSIS_KEYWORDS: usize = 2;

/// 韩国市场影响分析器
///
/// 规则表在启动时构建，之后只读
#[derive(Debug, Clone)]
pub struct KoreaImpactMapper {
    rules: Vec<SectorRule>,
}

impl KoreaImpactMapper {
    pub fn new(rules: Vec<SectorRule>) -> Self {
        Self { rules }
    }

    /// 使用参考板块表
    pub fn with_reference_rules() -> Self {
        Self::new(reference_rules())
    }

    /// 分析美股行情对韩国市场的影响
    pub fn analyze(&self, snapshot: &MarketSnapshot) -> KoreaImpactResult {
        if snapshot.is_empty() {
            return empty_analysis();
        }

        let impacts = self.score_sectors(snapshot);
        let Some(primary) = impacts.first() else {
            return neutral_analysis();
        };

        let top_stocks = select_top_stocks(&impacts[..impacts.len().min(RANKED_SECTORS)]);

        KoreaImpactResult {
            sentiment: primary.direction.into(),
            primary_sector: Some(primary.rule.display_name.clone()),
            top_stocks,
            analysis: describe_impact(primary),
            trigger_index: Some(primary.rule.trigger),
            trigger_change_pct: primary.change_pct,
        }
    }

    /// 计算达到阈值的板块影响分，按分数降序
    ///
    /// 触发指数缺失的规则直接跳过，不按零变动处理
    pub fn score_sectors(&self, snapshot: &MarketSnapshot) -> Vec<SectorImpact<'_>> {
        let mut impacts: Vec<SectorImpact<'_>> = self
            .rules
            .iter()
            .filter_map(|rule| {
                let change_pct = snapshot.change_pct(rule.trigger)?;
                if change_pct.abs() < rule.threshold_pct {
                    return None;
                }
                Some(SectorImpact {
                    rule,
                    impact_score: change_pct.abs() / rule.threshold_pct,
                    direction: Direction::from_change(change_pct),
                    change_pct,
                })
            })
            .collect();

        impacts.sort_by(|a, b| b.impact_score.total_cmp(&a.impact_score));
        impacts
    }
}

impl Default for KoreaImpactMapper {
    fn default() -> Self {
        Self::with_reference_rules()
    }
}

/// 展开板块成分股，按有效分稳定排序后取前三
fn select_top_stocks(sectors: &[SectorImpact<'_>]) -> Vec<TopStock> {
    let mut stocks: Vec<TopStock> = sectors
        .iter()
        .flat_map(|sector| {
            sector.rule.stocks.iter().map(move |stock| TopStock {
                name: stock.name.clone(),
                code: stock.code.clone(),
                sector: sector.rule.display_name.clone(),
                impact_score: sector.impact_score * stock.weight,
                direction: sector.direction,
            })
        })
        .collect();

    stocks.sort_by(|a, b| b.impact_score.total_cmp(&a.impact_score));
    stocks.truncate(TOP_STOCKS);
    stocks
}

/// 变动强度描述
pub fn intensity_word(change_pct: f64) -> &'static str {
    let magnitude = change_pct.abs();
    if magnitude >= SHARP_MOVE_PCT {
        "급격한"
    } else if magnitude >= STRONG_MOVE_PCT {
        "강한"
    } else {
        "완만한"
    }
}

fn describe_impact(primary: &SectorImpact<'_>) -> String {
    let change = primary.change_pct;
    let (direction, outlook) = if change > 0.0 {
        ("상승", "상승이")
    } else {
        ("하락", "압박이")
    };

    let mut analysis = format!(
        "{}의 {} {}({:+.2}%)으로 국내 {} 섹터 {} 예상됩니다.",
        primary.rule.trigger,
        intensity_word(change),
        direction,
        change,
        primary.rule.display_name,
        outlook
    );

    let keywords: Vec<&str> = primary
        .rule
        .keywords
        .iter()
        .take(ANALYSIS_KEYWORDS)
        .map(String::as_str)
        .collect();
    if !keywords.is_empty() {
        analysis.push_str(&format!(" ({} 관련주 주목)", keywords.join(", ")));
    }

    analysis
}

/// 没有任何板块达到阈值时的固定结果
fn neutral_analysis() -> KoreaImpactResult {
    let neutral = |name: &str, code: &str, sector: &str| TopStock {
        name: name.to_string(),
        code: code.to_string(),
        sector: sector.to_string(),
        impact_score: 0.0,
        direction: Direction::Neutral,
    };

    KoreaImpactResult {
        sentiment: ImpactSentiment::Neutral,
        primary_sector: Some("전 섹터".to_string()),
        top_stocks: vec![
            neutral("삼성전자", "005930", "반도체"),
            neutral("SK하이닉스", "000660", "반도체"),
            neutral("현대차", "005380", "자동차"),
        ],
        analysis: "미국 시장이 혼조세를 보이며 국내 시장도 관망세가 예상됩니다.".to_string(),
        trigger_index: None,
        trigger_change_pct: 0.0,
    }
}

/// 快照为空时的结果
fn empty_analysis() -> KoreaImpactResult {
    KoreaImpactResult {
        sentiment: ImpactSentiment::Unknown,
        primary_sector: None,
        top_stocks: Vec::new(),
        analysis: "미국 시장 데이터가 부족하여 분석이 어렵습니다.".to_string(),
        trigger_index: None,
        trigger_change_pct: 0.0,
    }
}

// ==================== 参考板块表 ====================

fn stock(name: &str, code: &str, weight: f64) -> StockRule {
    StockRule {
        name: name.to_string(),
        code: code.to_string(),
        weight,
    }
}

fn sector(
    key: &str,
    name: &str,
    stocks: Vec<StockRule>,
    trigger: IndexName,
    threshold_pct: f64,
    keywords: &[&str],
) -> SectorRule {
    SectorRule {
        sector_key: key.to_string(),
        display_name: name.to_string(),
        stocks,
        trigger,
        threshold_pct,
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
}

/// 参考板块映射表
pub fn reference_rules() -> Vec<SectorRule> {
    vec![
        sector(
            "tech_semiconductor",
            "반도체",
            vec![
                stock("삼성전자", "005930", 1.0),
                stock("SK하이닉스", "000660", 0.9),
            ],
            IndexName::Nasdaq,
            1.0,
            &["반도체", "AI", "메모리", "칩"],
        ),
        sector(
            "tech_platform",
            "IT플랫폼",
            vec![
                stock("네이버", "035420", 1.0),
                stock("카카오", "035720", 0.8),
            ],
            IndexName::Nasdaq,
            1.5,
            &["빅테크", "플랫폼", "AI"],
        ),
        sector(
            "energy",
            "에너지",
            vec![
                stock("SK이노베이션", "096770", 1.0),
                stock("S-Oil", "010950", 0.9),
                stock("한국전력", "015760", 0.7),
            ],
            IndexName::Sp500,
            1.2,
            &["유가", "에너지", "전력"],
        ),
        sector(
            "auto",
            "자동차",
            vec![
                stock("현대차", "005380", 1.0),
                stock("기아", "000270", 0.9),
                stock("LG에너지솔루션", "373220", 0.85),
            ],
            IndexName::Dow,
            1.0,
            &["전기차", "EV", "배터리"],
        ),
        sector(
            "steel_chemical",
            "철강/화학",
            vec![
                stock("POSCO홀딩스", "005490", 1.0),
                stock("LG화학", "051910", 0.9),
            ],
            IndexName::Dow,
            1.2,
            &["원자재", "철강", "화학"],
        ),
    ]
}
