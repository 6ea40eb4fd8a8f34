//! 规则引擎洞察
//!
//! 不依赖外部模型，根据固定阈值生成观点、要点、风险提示与操作建议

use async_trait::async_trait;

use super::InsightGenerator;
use crate::models::{IndexName, InsightResult, KoreaImpactResult, MarketSnapshot};

/// 平均涨跌幅高于此值为强势，低于其相反数为弱势
pub const TONE_THRESHOLD_PCT: f64 = 1.5;
/// 平均涨幅高于此值提示过热
pub const OVERHEAT_PCT: f64 = 2.0;
/// 平均涨跌幅绝对值高于此值提示急变后回调
pub const SPIKE_PCT: f64 = 2.5;
/// VIX 高于此值提示波动风险
pub const VIX_CAUTION_LEVEL: f64 = 20.0;
/// VIX 高于此值建议防御
pub const VIX_DEFENSIVE_LEVEL: f64 = 25.0;
/// VIX 低于此值视为低波动
pub const VIX_CALM_LEVEL: f64 = 15.0;

pub const MAX_KEY_POINTS: usize = 3;
pub const MAX_ACTION_ITEMS: usize = 2;

/// 市场基调
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketTone {
    Strong,
    Weak,
    Mixed,
}

impl MarketTone {
    pub fn from_average(avg_change: f64) -> Self {
        if avg_change > TONE_THRESHOLD_PCT {
            MarketTone::Strong
        } else if avg_change < -TONE_THRESHOLD_PCT {
            MarketTone::Weak
        } else {
            MarketTone::Mixed
        }
    }

    fn label(&self) -> &'static str {
        match self {
            MarketTone::Strong => "강세",
            MarketTone::Weak => "약세",
            MarketTone::Mixed => "혼조",
        }
    }
}

/// 规则引擎洞察生成器
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedInsight;

impl RuleBasedInsight {
    pub fn new() -> Self {
        Self
    }

    /// 同步生成洞察
    pub fn build(&self, snapshot: &MarketSnapshot, korea: &KoreaImpactResult) -> InsightResult {
        let tech = snapshot.change_pct(IndexName::Nasdaq).unwrap_or(0.0);
        let broad = snapshot.change_pct(IndexName::Sp500).unwrap_or(0.0);
        let vix = snapshot.price(IndexName::Vix).unwrap_or(0.0);
        let avg_change = (tech + broad) / 2.0;
        let tone = MarketTone::from_average(avg_change);

        InsightResult {
            insight: summary(tone, korea, vix),
            key_points: key_points(tech, broad, avg_change, vix, korea),
            risk_note: risk_note(avg_change, vix).to_string(),
            action_items: action_items(tone, vix),
        }
    }
}

#[async_trait]
impl InsightGenerator for RuleBasedInsight {
    async fn generate(
        &self,
        snapshot: &MarketSnapshot,
        korea: &KoreaImpactResult,
    ) -> InsightResult {
        self.build(snapshot, korea)
    }

    fn name(&self) -> &'static str {
        "rules"
    }
}

fn summary(tone: MarketTone, korea: &KoreaImpactResult, vix: f64) -> String {
    let mut insight = format!("미국 증시 {} 흐름 속에서 ", tone.label());

    if let Some(sector) = &korea.primary_sector {
        insight.push_str(&format!("국내 {} 섹터가 주목받고 있습니다. ", sector));
    }

    insight.push_str(if vix > VIX_CAUTION_LEVEL {
        "다만 변동성이 높아 단기 조정 가능성에 유의해야 합니다."
    } else if vix < VIX_CALM_LEVEL {
        "변동성이 낮아 상대적으로 안정적인 흐름이 예상됩니다."
    } else {
        "변동성은 보통 수준으로 추세 지속 여부를 지켜봐야 합니다."
    });

    insight
}

fn rise_or_fall(change: f64) -> &'static str {
    if change > 0.0 {
        "상승"
    } else {
        "하락"
    }
}

fn key_points(
    tech: f64,
    broad: f64,
    avg_change: f64,
    vix: f64,
    korea: &KoreaImpactResult,
) -> Vec<String> {
    let mut points = Vec::with_capacity(MAX_KEY_POINTS);

    if tech.abs() > broad.abs() {
        points.push(format!("기술주 중심의 {} 장세", rise_or_fall(tech)));
    } else {
        points.push(format!("시장 전반적인 {} 흐름", rise_or_fall(broad)));
    }

    if let Some(top) = korea.top_stocks.first() {
        points.push(format!("국내 {} 등 연관주 수혜 예상", top.name));
    }

    points.push(
        if vix > VIX_DEFENSIVE_LEVEL {
            "공포지수 급등으로 방어적 포지션 고려 필요"
        } else if avg_change > OVERHEAT_PCT {
            "강한 상승이나 과열 여부 점검 필요"
        } else {
            "점진적 흐름으로 추세 추종 전략 유효"
        }
        .to_string(),
    );

    points.truncate(MAX_KEY_POINTS);
    points
}

fn risk_note(avg_change: f64, vix: f64) -> &'static str {
    if vix > VIX_CAUTION_LEVEL {
        "⚠️ 변동성 확대 구간으로 손절매 기준 설정 권장"
    } else if avg_change.abs() > SPIKE_PCT {
        "⚠️ 급격한 변동 후 조정 가능성 대비 필요"
    } else {
        "💡 안정적 흐름이나 돌발 변수 모니터링 지속"
    }
}

fn action_items(tone: MarketTone, vix: f64) -> Vec<String> {
    let pair: [&str; MAX_ACTION_ITEMS] = match tone {
        MarketTone::Strong => [
            "상승 모멘텀 활용: 관련주 분할 매수 고려",
            "익절 타이밍 사전 설정으로 이익 실현 준비",
        ],
        MarketTone::Weak => [
            "방어적 포지션: 현금 비중 확대 검토",
            "저가 매수 기회: 관심 종목 리스트 점검",
        ],
        MarketTone::Mixed => [
            "관망: 뚜렷한 방향성 나올 때까지 대기",
            "분할 매매: 리스크 분산하며 포지션 조절",
        ],
    };

    let mut items: Vec<String> = pair.iter().map(|s| s.to_string()).collect();
    if vix < VIX_CALM_LEVEL {
        items.push("저변동성 활용: 중장기 포지션 구축 적기".to_string());
    }
    items
}
