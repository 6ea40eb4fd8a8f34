//! 每日简报排版
//!
//! 将行情、情绪、洞察和韩国影响分析拼接为 Telegram Markdown 文本。
//! 除标题外的每个部分都可缺省；韩国影响为 unknown 时整段省略。

use chrono::NaiveDate;

use crate::models::{
    ImpactSentiment, InsightResult, KoreaImpactResult, MarketSnapshot, SentimentResult,
};

const DIVIDER: &str = "━━━━━━━━━━━━━━━━━━━━━━";

/// 排版输入
#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    pub snapshot: &'a MarketSnapshot,
    pub sentiment: Option<&'a SentimentResult>,
    pub insight: Option<&'a InsightResult>,
    pub korea: Option<&'a KoreaImpactResult>,
}

/// 生成简报文本
pub fn format_report(date: NaiveDate, input: &ReportInput<'_>) -> String {
    let mut report = format!(
        "📊 **마무리 경제 브리핑** | {}\n",
        date.format("%Y년 %m월 %d일")
    );

    report.push_str(&market_section(input.snapshot));
    if let Some(sentiment) = input.sentiment {
        report.push_str(&sentiment_section(sentiment));
    }
    if let Some(insight) = input.insight {
        report.push_str(&insight_section(insight));
    }
    if let Some(korea) = input.korea {
        report.push_str(&korea_section(korea));
    }

    report
}

fn section_header(title: &str) -> String {
    format!("\n{}\n{}\n{}\n\n", DIVIDER, title, DIVIDER)
}

fn market_section(snapshot: &MarketSnapshot) -> String {
    let mut section = section_header("🇺🇸 **미국 시장 동향**");

    let mut any = false;
    for quote in snapshot.available() {
        let marker = if quote.change_pct < 0.0 { "🔴" } else { "🟢" };
        section.push_str(&format!(
            "{} **{}**: {} ({:+.2}%)\n",
            marker,
            quote.name,
            format_price(quote.price),
            quote.change_pct
        ));
        any = true;
    }
    if !any {
        section.push_str("데이터를 가져오지 못했습니다.\n");
    }

    section
}

fn sentiment_section(sentiment: &SentimentResult) -> String {
    let mut section = section_header("📈 **시장 분석**");
    section.push_str(&format!("**종합 심리**: {}\n", sentiment.mood.label()));
    section.push_str(&sentiment.analysis);
    section.push('\n');
    if !sentiment.vix_analysis.is_empty() {
        section.push_str(&sentiment.vix_analysis);
        section.push('\n');
    }
    section
}

fn insight_section(insight: &InsightResult) -> String {
    let mut section = section_header("💡 **Today's Insight**");
    section.push_str(&format!("{}\n", insight.insight));

    if !insight.key_points.is_empty() {
        section.push_str("\n**📌 주요 포인트**\n");
        for (i, point) in insight.key_points.iter().enumerate() {
            section.push_str(&format!("{}. {}\n", i + 1, point));
        }
    }

    if !insight.risk_note.is_empty() {
        section.push_str(&format!("\n**⚡ 주의사항**\n{}\n", insight.risk_note));
    }

    if !insight.action_items.is_empty() {
        section.push_str("\n**🎯 투자 시사점**\n");
        for item in &insight.action_items {
            section.push_str(&format!("• {}\n", item));
        }
    }

    section
}

fn korea_section(korea: &KoreaImpactResult) -> String {
    if korea.sentiment == ImpactSentiment::Unknown {
        return String::new();
    }

    let mut section = section_header("🇰🇷 **한국 시장 영향 예측**");
    section.push_str(&format!("**전망**: {}\n", korea.sentiment.label()));
    section.push_str(&format!("{}\n", korea.analysis));

    if !korea.top_stocks.is_empty() {
        section.push_str("\n📌 **주목 관련주 TOP 3**\n");
        for (i, stock) in korea.top_stocks.iter().enumerate() {
            section.push_str(&format!(
                "{}. {} **{}** ({})\n",
                i + 1,
                stock.direction.marker(),
                stock.name,
                stock.sector
            ));
        }
    }

    section.push_str(&format!("\n{}\n", DIVIDER));
    section
}

/// 千分位、两位小数
pub fn format_price(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IndexName, IndexQuote};
    use crate::services::insight::RuleBasedInsight;
    use crate::services::korea_impact::KoreaImpactMapper;
    use crate::services::sentiment;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 24).unwrap()
    }

    fn reference_snapshot() -> MarketSnapshot {
        let day = NaiveDate::from_ymd_opt(2025, 10, 23).unwrap();
        [
            (IndexName::Sp500, 5800.0, 1.2),
            (IndexName::Nasdaq, 18500.0, 2.3),
            (IndexName::Dow, 43000.0, 0.8),
            (IndexName::Vix, 14.5, -5.0),
        ]
        .into_iter()
        .map(|(name, price, change_pct)| IndexQuote { name, price, change_pct, date: day })
        .collect()
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(5800.0), "5,800.00");
        assert_eq!(format_price(18315.2), "18,315.20");
        assert_eq!(format_price(1234567.891), "1,234,567.89");
        assert_eq!(format_price(14.5), "14.50");
        assert_eq!(format_price(-1234.5), "-1,234.50");
        assert_eq!(format_price(999.999), "1,000.00");
    }

    #[test]
    fn test_full_report() {
        let snapshot = reference_snapshot();
        let sentiment = sentiment::classify(&snapshot);
        let korea = KoreaImpactMapper::default().analyze(&snapshot);
        let insight = RuleBasedInsight::new().build(&snapshot, &korea);

        let report = format_report(
            date(),
            &ReportInput {
                snapshot: &snapshot,
                sentiment: Some(&sentiment),
                insight: Some(&insight),
                korea: Some(&korea),
            },
        );

        assert!(report.starts_with("📊 **마무리 경제 브리핑** | 2025년 10월 24일"));
        assert!(report.contains("🟢 **S&P 500**: 5,800.00 (+1.20%)"));
        assert!(report.contains("🟢 **NASDAQ**: 18,500.00 (+2.30%)"));
        assert!(report.contains("🟢 **DOW**: 43,000.00 (+0.80%)"));
        assert!(report.contains("🔴 **VIX**: 14.50 (-5.00%)"));
        assert!(report.contains("**종합 심리**: 강세"));
        assert!(report.contains("1. 기술주 중심의 상승 장세"));
        assert!(report.contains("• 저변동성 활용: 중장기 포지션 구축 적기"));
        assert!(report.contains("🇰🇷 **한국 시장 영향 예측**"));
        assert!(report.contains("1. 🟢 **삼성전자** (반도체)"));
        assert!(report.contains("3. 🟢 **네이버** (IT플랫폼)"));

        // 顺序：行情 → 情绪 → 洞察 → 韩国
        let pos = |needle: &str| report.find(needle).unwrap();
        assert!(pos("미국 시장 동향") < pos("시장 분석"));
        assert!(pos("시장 분석") < pos("Today's Insight"));
        assert!(pos("Today's Insight") < pos("한국 시장 영향 예측"));
    }

    #[test]
    fn test_every_present_index_has_signed_percent() {
        let day = NaiveDate::from_ymd_opt(2025, 10, 23).unwrap();
        let mut snapshot = MarketSnapshot::new();
        snapshot.insert(IndexQuote { name: IndexName::Nasdaq, price: 18000.0, change_pct: 2.3, date: day });
        snapshot.insert(IndexQuote { name: IndexName::Dow, price: 42000.0, change_pct: -0.05, date: day });
        snapshot.insert(IndexQuote { name: IndexName::Vix, price: 16.0, change_pct: 0.0, date: day });
        snapshot.mark_unavailable(IndexName::Sp500);

        let report = format_report(
            date(),
            &ReportInput { snapshot: &snapshot, sentiment: None, insight: None, korea: None },
        );

        assert!(report.contains("**NASDAQ**: 18,000.00 (+2.30%)"));
        assert!(report.contains("🔴 **DOW**: 42,000.00 (-0.05%)"));
        assert!(report.contains("🟢 **VIX**: 16.00 (+0.00%)"));
        assert!(!report.contains("S&P 500"));
        assert!(!report.contains("시장 분석"));
        assert!(!report.contains("Today's Insight"));
    }

    #[test]
    fn test_unknown_korea_block_is_omitted() {
        let snapshot = MarketSnapshot::new();
        let korea = KoreaImpactMapper::default().analyze(&snapshot);
        let sentiment = sentiment::classify(&snapshot);

        let report = format_report(
            date(),
            &ReportInput {
                snapshot: &snapshot,
                sentiment: Some(&sentiment),
                insight: None,
                korea: Some(&korea),
            },
        );

        assert!(!report.contains("한국 시장 영향 예측"));
        assert!(report.contains("데이터를 가져오지 못했습니다."));
        assert!(report.contains("**종합 심리**: 데이터 부족"));
    }

    #[test]
    fn test_neutral_korea_block_uses_neutral_marker() {
        let day = NaiveDate::from_ymd_opt(2025, 10, 23).unwrap();
        let snapshot: MarketSnapshot = [IndexQuote { name: IndexName::Sp500, price: 5800.0, change_pct: 0.1, date: day }]
            .into_iter()
            .collect();
        let korea = KoreaImpactMapper::default().analyze(&snapshot);

        let report = format_report(
            date(),
            &ReportInput { snapshot: &snapshot, sentiment: None, insight: None, korea: Some(&korea) },
        );

        assert!(report.contains("**전망**: 중립"));
        assert!(report.contains("1. ⚪ **삼성전자** (반도체)"));
        assert!(report.contains("3. ⚪ **현대차** (자동차)"));
    }
}
