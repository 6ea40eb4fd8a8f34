//! 美股市场情绪判断
//!
//! 根据标普 500、纳斯达克涨跌幅及 VIX 水平给出粗粒度情绪标签

use crate::models::{IndexName, MarketMood, MarketSnapshot, SentimentResult};

/// 两大指数同向变动的判定阈值（百分比）
pub const TREND_THRESHOLD_PCT: f64 = 1.0;
/// 科技股单独走弱的判定阈值（百分比）
pub const TECH_SELLOFF_PCT: f64 = -2.0;
/// VIX 高于此值视为恐慌
pub const VIX_ANXIETY_LEVEL: f64 = 25.0;
/// VIX 低于此值视为平稳
pub const VIX_STABLE_LEVEL: f64 = 15.0;

/// 判断市场情绪
///
/// 标普 500 或纳斯达克缺失时返回 `DataInsufficient`，不会报错
pub fn classify(snapshot: &MarketSnapshot) -> SentimentResult {
    let (broad, tech) = match (
        snapshot.change_pct(IndexName::Sp500),
        snapshot.change_pct(IndexName::Nasdaq),
    ) {
        (Some(broad), Some(tech)) => (broad, tech),
        _ => {
            return SentimentResult {
                mood: MarketMood::DataInsufficient,
                analysis: "시장 데이터를 수집할 수 없습니다.".to_string(),
                vix_analysis: String::new(),
            }
        }
    };
    let vix = snapshot.price(IndexName::Vix).unwrap_or(0.0);

    let mood = classify_mood(broad, tech);
    let analysis = match mood {
        MarketMood::Bullish => "주요 지수가 모두 강한 상승세를 보이고 있습니다.",
        MarketMood::Bearish => "주요 지수가 모두 하락세를 나타내고 있습니다.",
        MarketMood::TechWeakness => {
            "나스닥이 상대적으로 큰 하락을 보이며 기술주 중심으로 매도세가 나타났습니다."
        }
        _ => "시장이 방향성 없이 혼조세를 보이고 있습니다.",
    };

    SentimentResult {
        mood,
        analysis: analysis.to_string(),
        vix_analysis: describe_vix(vix).to_string(),
    }
}

/// 按顺序匹配规则，先命中者生效
fn classify_mood(broad: f64, tech: f64) -> MarketMood {
    if broad > TREND_THRESHOLD_PCT && tech > TREND_THRESHOLD_PCT {
        MarketMood::Bullish
    } else if broad < -TREND_THRESHOLD_PCT && tech < -TREND_THRESHOLD_PCT {
        MarketMood::Bearish
    } else if tech < TECH_SELLOFF_PCT && broad > -TREND_THRESHOLD_PCT {
        MarketMood::TechWeakness
    } else {
        MarketMood::Mixed
    }
}

fn describe_vix(vix: f64) -> &'static str {
    if vix > VIX_ANXIETY_LEVEL {
        "공포지수(VIX)가 높아 시장 불안감이 큽니다."
    } else if vix < VIX_STABLE_LEVEL {
        "공포지수(VIX)가 낮아 시장이 안정적입니다."
    } else {
        "공포지수(VIX)는 보통 수준입니다."
    }
}
