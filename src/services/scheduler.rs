//! 定时调度
//!
//! 每天在配置的本地时间触发一次简报流水线。
//! 同一时刻只允许一个流程在执行，重叠的触发直接丢弃。

use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use super::briefing::BriefingPipeline;
use crate::config::ScheduleConfig;

/// 每日固定时间
#[derive(Debug, Clone, Copy)]
pub struct DailySchedule {
    run_at: NaiveTime,
    tz: Tz,
}

impl DailySchedule {
    pub fn new(run_at: NaiveTime, tz: Tz) -> Self {
        Self { run_at, tz }
    }

    pub fn from_config(config: &ScheduleConfig) -> Result<Self> {
        Ok(Self::new(config.run_time()?, config.tz()?))
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// 严格晚于 `now` 的下一次执行时间
    ///
    /// 夏令时跳过的时刻顺延一小时，重复的时刻取较早的一次
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let mut date = now.with_timezone(&self.tz).date_naive();
        loop {
            let local = date.and_time(self.run_at);
            let candidate = self
                .tz
                .from_local_datetime(&local)
                .earliest()
                .or_else(|| {
                    self.tz
                        .from_local_datetime(&(local + ChronoDuration::hours(1)))
                        .earliest()
                });

            if let Some(at) = candidate.map(|t| t.with_timezone(&Utc)) {
                if at > now {
                    return at;
                }
            }
            date = match date.succ_opt() {
                Some(next) => next,
                None => return now + ChronoDuration::days(1),
            };
        }
    }
}

/// 执行中标记
#[derive(Debug, Default)]
pub struct CycleGuard {
    running: AtomicBool,
}

/// 持有期间视为流程执行中，释放时清除标记
#[derive(Debug)]
pub struct CycleToken {
    guard: Arc<CycleGuard>,
}

impl CycleGuard {
    pub fn try_acquire(self: &Arc<Self>) -> Option<CycleToken> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CycleToken {
                guard: Arc::clone(self),
            })
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Drop for CycleToken {
    fn drop(&mut self) {
        self.guard.running.store(false, Ordering::Release);
    }
}

/// 简报调度器
pub struct Scheduler {
    pipeline: Arc<BriefingPipeline>,
    schedule: DailySchedule,
    check_interval: Duration,
    guard: Arc<CycleGuard>,
}

impl Scheduler {
    pub fn new(pipeline: Arc<BriefingPipeline>, schedule: DailySchedule, check_interval: Duration) -> Self {
        Self {
            pipeline,
            schedule,
            check_interval,
            guard: Arc::new(CycleGuard::default()),
        }
    }

    pub fn from_config(pipeline: Arc<BriefingPipeline>, config: &ScheduleConfig) -> Result<Self> {
        Ok(Self::new(
            pipeline,
            DailySchedule::from_config(config)?,
            Duration::from_secs(config.check_interval_secs.max(1)),
        ))
    }

    /// 在后台启动一次流程
    ///
    /// 已有流程在执行时丢弃本次触发并返回 None
    pub fn trigger(&self) -> Option<JoinHandle<()>> {
        let Some(token) = self.guard.try_acquire() else {
            log::warn!("上一次简报仍在执行，跳过本次触发");
            return None;
        };

        let pipeline = Arc::clone(&self.pipeline);
        Some(tokio::spawn(async move {
            let _token = token;
            let cycle = tokio::spawn(async move {
                pipeline.run_cycle_logged().await;
            });
            if let Err(e) = cycle.await {
                log::error!("简报任务异常退出: {}", e);
            }
        }))
    }

    /// 调度主循环，`shutdown` 完成后退出
    ///
    /// 执行中的流程不等待
    pub async fn run<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let tz = self.schedule.tz();
        let mut next = self.schedule.next_after(Utc::now());
        log::info!("⏰ 调度器启动，下次执行时间: {}", next.with_timezone(&tz));

        tokio::pin!(shutdown);
        loop {
            let now = Utc::now();
            if now >= next {
                self.trigger();
                next = self.schedule.next_after(now);
                log::info!("📅 下次执行时间: {}", next.with_timezone(&tz));
            }

            let until_next = (next - now).to_std().unwrap_or_default();
            tokio::select! {
                _ = &mut shutdown => {
                    log::info!("⏹️ 调度器已停止");
                    break;
                }
                _ = tokio::time::sleep(until_next.min(self.check_interval)) => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MarketSnapshot;
    use crate::services::briefing::tests::{reference_snapshot, RecordingChannel};
    use crate::services::insight::RuleBasedInsight;
    use crate::services::korea_impact::KoreaImpactMapper;
    use crate::services::market::MarketDataSource;
    use async_trait::async_trait;
    use chrono_tz::America::New_York;
    use chrono_tz::Asia::Seoul;
    use std::sync::atomic::AtomicUsize;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn seven_am_seoul() -> DailySchedule {
        DailySchedule::new(NaiveTime::from_hms_opt(7, 0, 0).unwrap(), Seoul)
    }

    #[test]
    fn test_next_after_same_day() {
        // 首尔 06:00
        let next = seven_am_seoul().next_after(utc("2025-10-23T21:00:00Z"));
        assert_eq!(next, utc("2025-10-23T22:00:00Z"));
    }

    #[test]
    fn test_next_after_is_strictly_later() {
        let next = seven_am_seoul().next_after(utc("2025-10-23T22:00:00Z"));
        assert_eq!(next, utc("2025-10-24T22:00:00Z"));

        let next = seven_am_seoul().next_after(utc("2025-10-23T23:30:00Z"));
        assert_eq!(next, utc("2025-10-24T22:00:00Z"));
    }

    #[test]
    fn test_next_after_dst_gap() {
        // 纽约 2025-03-09 02:30 不存在，顺延到 03:30 EDT
        let schedule = DailySchedule::new(NaiveTime::from_hms_opt(2, 30, 0).unwrap(), New_York);
        let next = schedule.next_after(utc("2025-03-09T05:00:00Z"));
        assert_eq!(next, utc("2025-03-09T07:30:00Z"));
    }

    #[test]
    fn test_next_after_dst_overlap() {
        // 纽约 2025-11-02 01:30 出现两次，取 EDT
        let schedule = DailySchedule::new(NaiveTime::from_hms_opt(1, 30, 0).unwrap(), New_York);
        let next = schedule.next_after(utc("2025-11-02T04:00:00Z"));
        assert_eq!(next, utc("2025-11-02T05:30:00Z"));
    }

    #[test]
    fn test_cycle_guard() {
        let guard = Arc::new(CycleGuard::default());
        let token = guard.try_acquire().unwrap();
        assert!(guard.is_running());
        assert!(guard.try_acquire().is_none());

        drop(token);
        assert!(!guard.is_running());
        assert!(guard.try_acquire().is_some());
    }

    struct SlowSource {
        calls: Arc<AtomicUsize>,
        delay: Duration,
    }

    #[async_trait]
    impl MarketDataSource for SlowSource {
        async fn collect(&self) -> MarketSnapshot {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            reference_snapshot()
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    fn scheduler(calls: Arc<AtomicUsize>, channel: RecordingChannel) -> Scheduler {
        let pipeline = BriefingPipeline::new(
            Box::new(SlowSource {
                calls,
                delay: Duration::from_millis(200),
            }),
            KoreaImpactMapper::with_reference_rules(),
            Box::new(RuleBasedInsight::new()),
            Box::new(channel),
            Seoul,
        );
        Scheduler::new(Arc::new(pipeline), seven_am_seoul(), Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_overlapping_trigger_is_dropped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let channel = RecordingChannel::default();
        let sent = channel.sent.clone();
        let scheduler = scheduler(calls.clone(), channel);

        let first = scheduler.trigger().expect("first trigger runs");
        assert!(scheduler.trigger().is_none());

        first.await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(sent.lock().unwrap().len(), 1);

        // 上一次结束后可再次触发
        scheduler.trigger().expect("guard released").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let calls = Arc::new(AtomicUsize::new(0));
        let scheduler = scheduler(calls.clone(), RecordingChannel::default());

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            scheduler.run(tokio::time::sleep(Duration::from_millis(50))),
        )
        .await;

        assert!(result.unwrap().is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
