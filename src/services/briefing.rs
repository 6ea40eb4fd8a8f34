//! 每日简报流水线
//!
//! 行情快照 → 情绪判断 / 韩国影响分析 → 洞察 → 排版 → 推送

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

use super::archive::SnapshotArchive;
use super::insight::{self, InsightGenerator};
use super::korea_impact::KoreaImpactMapper;
use super::market::{self, MarketDataSource};
use super::notifier::{self, DeliveryChannel};
use super::report::{format_report, ReportInput};
use super::sentiment;
use crate::config::AppConfig;
use crate::models::{
    DeliveryOutcome, InsightResult, KoreaImpactResult, MarketSnapshot, SentimentResult,
};

/// 一次运行的产出
#[derive(Debug, Clone)]
pub struct BriefingOutcome {
    pub snapshot: MarketSnapshot,
    pub sentiment: SentimentResult,
    pub korea: KoreaImpactResult,
    pub insight: InsightResult,
    pub report: String,
    pub delivery: DeliveryOutcome,
}

/// 简报流水线
///
/// 各组件在启动时按配置装配，之后只读
pub struct BriefingPipeline {
    source: Box<dyn MarketDataSource>,
    mapper: KoreaImpactMapper,
    insight: Box<dyn InsightGenerator>,
    channel: Box<dyn DeliveryChannel>,
    archive: Option<SnapshotArchive>,
    tz: Tz,
}

impl BriefingPipeline {
    pub fn new(
        source: Box<dyn MarketDataSource>,
        mapper: KoreaImpactMapper,
        insight: Box<dyn InsightGenerator>,
        channel: Box<dyn DeliveryChannel>,
        tz: Tz,
    ) -> Self {
        Self {
            source,
            mapper,
            insight,
            channel,
            archive: None,
            tz,
        }
    }

    pub fn with_archive(mut self, archive: SnapshotArchive) -> Self {
        self.archive = Some(archive);
        self
    }

    /// 按配置装配流水线
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let source = market::from_config(&config.market, &config.schedule)?;
        let insight = insight::from_config(&config.insight)?;
        let channel = notifier::from_config(&config.telegram)?;

        log::info!(
            "流水线组件: 行情={}, 洞察={}, 推送={}",
            source.name(),
            insight.name(),
            channel.name()
        );

        let mut pipeline = Self::new(
            source,
            KoreaImpactMapper::with_reference_rules(),
            insight,
            channel,
            config.schedule.tz()?,
        );
        if config.output.dump_snapshot {
            pipeline = pipeline.with_archive(SnapshotArchive::new(&config.output.dir));
        }
        Ok(pipeline)
    }

    #[cfg(test)]
    pub fn channel(&self) -> &dyn DeliveryChannel {
        self.channel.as_ref()
    }

    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }

    /// 执行一次完整流程
    ///
    /// 推送失败体现在 `delivery` 中，不作为错误返回
    pub async fn run_cycle(&self) -> Result<BriefingOutcome> {
        log::info!("🚀 开始生成每日简报");
        let today = self.today();

        let snapshot = self.source.collect().await;
        log::info!(
            "行情采集完成: {}/{} 个指数可用",
            snapshot.available().count(),
            snapshot.entries().count()
        );

        let sentiment = sentiment::classify(&snapshot);
        let korea = self.mapper.analyze(&snapshot);
        let insight = self.insight.generate(&snapshot, &korea).await;
        log::debug!(
            "情绪={:?}, 韩国影响={:?}, 主要板块={:?}",
            sentiment.mood,
            korea.sentiment,
            korea.primary_sector
        );

        let report = format_report(
            today,
            &ReportInput {
                snapshot: &snapshot,
                sentiment: Some(&sentiment),
                insight: Some(&insight),
                korea: Some(&korea),
            },
        );

        let delivery = self.channel.send(&report).await;
        if delivery.success {
            log::info!("✅ 简报推送成功 (消息 ID: {:?})", delivery.message_id);
        } else {
            log::error!(
                "❌ 简报推送失败: {}",
                delivery.error.as_deref().unwrap_or("Unknown")
            );
        }

        if let Some(archive) = &self.archive {
            let path = archive.write(today, &snapshot)?;
            log::info!("行情快照已导出: {}", path.display());
        }

        Ok(BriefingOutcome {
            snapshot,
            sentiment,
            korea,
            insight,
            report,
            delivery,
        })
    }

    /// 执行一次并记录错误，不向上传播
    pub async fn run_cycle_logged(&self) -> Option<BriefingOutcome> {
        match self.run_cycle().await {
            Ok(outcome) => {
                log::info!("每日简报流程结束");
                Some(outcome)
            }
            Err(e) => {
                log::error!("每日简报执行出错: {:#}", e);
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{BotIdentity, ImpactSentiment, IndexName, IndexQuote, MarketMood};
    use crate::services::insight::RuleBasedInsight;
    use crate::services::notifier::{ConsoleChannel, CONSOLE_MESSAGE_ID};
    use async_trait::async_trait;
    use chrono_tz::Asia::Seoul;
    use std::sync::{Arc, Mutex};
    use wiremock::matchers::any;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// 固定快照数据源
    pub(crate) struct FixedSource(pub MarketSnapshot);

    #[async_trait]
    impl MarketDataSource for FixedSource {
        async fn collect(&self) -> MarketSnapshot {
            self.0.clone()
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    /// 记录发送内容的推送通道
    #[derive(Clone, Default)]
    pub(crate) struct RecordingChannel {
        pub sent: Arc<Mutex<Vec<String>>>,
        pub fail_with: Option<String>,
    }

    #[async_trait]
    impl DeliveryChannel for RecordingChannel {
        async fn send(&self, text: &str) -> DeliveryOutcome {
            self.sent.lock().unwrap().push(text.to_string());
            match &self.fail_with {
                Some(error) => DeliveryOutcome::failed(error.clone()),
                None => DeliveryOutcome::sent(Some(1)),
            }
        }

        async fn check_connection(&self) -> Result<BotIdentity> {
            Ok(BotIdentity {
                first_name: "rec".to_string(),
                username: "rec".to_string(),
            })
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    pub(crate) fn reference_snapshot() -> MarketSnapshot {
        let date = NaiveDate::from_ymd_opt(2025, 10, 23).unwrap();
        [
            (IndexName::Sp500, 5800.0, 1.2),
            (IndexName::Nasdaq, 18500.0, 2.3),
            (IndexName::Dow, 43000.0, 0.8),
            (IndexName::Vix, 14.5, -5.0),
        ]
        .into_iter()
        .map(|(name, price, change_pct)| IndexQuote { name, price, change_pct, date })
        .collect()
    }

    fn pipeline(snapshot: MarketSnapshot, channel: Box<dyn DeliveryChannel>) -> BriefingPipeline {
        BriefingPipeline::new(
            Box::new(FixedSource(snapshot)),
            KoreaImpactMapper::with_reference_rules(),
            Box::new(RuleBasedInsight::new()),
            channel,
            Seoul,
        )
    }

    #[tokio::test]
    async fn test_reference_scenario_end_to_end() {
        let channel = RecordingChannel::default();
        let sent = channel.sent.clone();

        let outcome = pipeline(reference_snapshot(), Box::new(channel))
            .run_cycle()
            .await
            .unwrap();

        // 两大指数均 > 1.0，按第一条规则为强势
        assert_eq!(outcome.sentiment.mood, MarketMood::Bullish);
        assert_eq!(outcome.korea.sentiment, ImpactSentiment::Positive);
        assert_eq!(outcome.korea.primary_sector.as_deref(), Some("반도체"));
        assert_eq!(outcome.korea.trigger_index, Some(IndexName::Nasdaq));
        let names: Vec<&str> = outcome.korea.top_stocks.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["삼성전자", "SK하이닉스", "네이버"]);
        assert_eq!(outcome.insight.action_items.len(), 3);
        assert_eq!(outcome.insight.risk_note, "💡 안정적 흐름이나 돌발 변수 모니터링 지속");
        assert!(outcome.delivery.success);

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], outcome.report);
        assert!(sent[0].contains("(+2.30%)"));
    }

    #[tokio::test]
    async fn test_delivery_failure_is_an_outcome_not_an_error() {
        let channel = RecordingChannel {
            fail_with: Some("Bad Request: chat not found".to_string()),
            ..Default::default()
        };

        let outcome = pipeline(reference_snapshot(), Box::new(channel))
            .run_cycle()
            .await
            .unwrap();
        assert!(!outcome.delivery.success);
        assert_eq!(outcome.delivery.error.as_deref(), Some("Bad Request: chat not found"));
    }

    #[tokio::test]
    async fn test_partial_snapshot_still_produces_report() {
        let mut snapshot = MarketSnapshot::new();
        for name in IndexName::ALL {
            snapshot.mark_unavailable(name);
        }

        let outcome = pipeline(snapshot, Box::new(RecordingChannel::default()))
            .run_cycle()
            .await
            .unwrap();
        assert_eq!(outcome.sentiment.mood, MarketMood::DataInsufficient);
        assert_eq!(outcome.korea.sentiment, ImpactSentiment::Neutral);
        assert!(outcome.report.contains("데이터를 가져오지 못했습니다."));
    }

    #[tokio::test]
    async fn test_console_channel_output() {
        let outcome = pipeline(reference_snapshot(), Box::new(ConsoleChannel::with_sink(Vec::new())))
            .run_cycle()
            .await
            .unwrap();
        assert!(outcome.delivery.success);
        assert_eq!(outcome.delivery.message_id, Some(CONSOLE_MESSAGE_ID));
    }

    #[tokio::test]
    async fn test_no_credentials_means_no_network_calls() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        // 所有接口地址都指向 mock，凭据留空
        let mut config = AppConfig::default();
        config.market.synthetic = true;
        config.market.api_base = server.uri();
        config.telegram.api_base = server.uri();
        config.insight.api_base = server.uri();

        let pipeline = BriefingPipeline::from_config(&config).unwrap();
        assert_eq!(pipeline.channel().name(), "console");

        let outcome = pipeline.run_cycle().await.unwrap();
        assert!(outcome.delivery.success);
        assert_eq!(outcome.delivery.message_id, Some(CONSOLE_MESSAGE_ID));

        server.verify().await;
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_archive_written_after_delivery() {
        let tmp = tempfile::tempdir().unwrap();
        let channel = RecordingChannel::default();
        let sent = channel.sent.clone();
        let pipeline = pipeline(reference_snapshot(), Box::new(channel))
            .with_archive(SnapshotArchive::new(tmp.path()));

        pipeline.run_cycle().await.unwrap();

        let files: Vec<_> = std::fs::read_dir(tmp.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
        assert_eq!(sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_archive_failure_after_delivery() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocked");
        std::fs::write(&blocker, "file, not a dir").unwrap();

        let channel = RecordingChannel::default();
        let sent = channel.sent.clone();
        let pipeline = pipeline(reference_snapshot(), Box::new(channel))
            .with_archive(SnapshotArchive::new(&blocker));

        assert!(pipeline.run_cycle().await.is_err());
        assert!(pipeline.run_cycle_logged().await.is_none());
        // 推送已在导出前完成
        assert_eq!(sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_from_config_without_credentials_uses_console() {
        let mut config = AppConfig::default();
        config.market.synthetic = true;

        let pipeline = BriefingPipeline::from_config(&config).unwrap();
        assert_eq!(pipeline.channel().name(), "console");
        assert_eq!(pipeline.source.name(), "synthetic");
        assert_eq!(pipeline.insight.name(), "rules");
    }
}
