//! 模拟行情
//!
//! 在参考价位附近随机生成收盘价与涨跌幅，结构与真实数据一致

use async_trait::async_trait;
use chrono::{Duration, Utc};
use chrono_tz::Tz;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::MarketDataSource;
use crate::models::{round2, IndexName, IndexQuote, MarketSnapshot};

/// 模拟参数：参考价、价格扰动幅度、涨跌幅范围
struct SyntheticProfile {
    base_price: f64,
    price_jitter: f64,
    change_range: f64,
}

fn profile(name: IndexName) -> SyntheticProfile {
    let (base_price, price_jitter, change_range) = match name {
        IndexName::Sp500 => (5732.45, 50.0, 2.0),
        IndexName::Nasdaq => (18315.20, 100.0, 2.5),
        IndexName::Dow => (42863.00, 300.0, 1.5),
        IndexName::Vix => (17.5, 3.0, 10.0),
    };
    SyntheticProfile {
        base_price,
        price_jitter,
        change_range,
    }
}

/// 模拟行情数据源
pub struct SyntheticMarketSource {
    tz: Tz,
    /// 固定种子，测试时使用
    seed: Option<u64>,
}

impl SyntheticMarketSource {
    pub fn new(tz: Tz) -> Self {
        Self { tz, seed: None }
    }

    #[cfg(test)]
    pub fn with_seed(tz: Tz, seed: u64) -> Self {
        Self {
            tz,
            seed: Some(seed),
        }
    }

    fn generate<R: Rng>(&self, rng: &mut R) -> MarketSnapshot {
        let date = (Utc::now().with_timezone(&self.tz) - Duration::days(1)).date_naive();

        IndexName::ALL
            .into_iter()
            .map(|name| {
                let p = profile(name);
                IndexQuote {
                    name,
                    price: round2(p.base_price + rng.gen_range(-p.price_jitter..=p.price_jitter)),
                    change_pct: round2(rng.gen_range(-p.change_range..=p.change_range)),
                    date,
                }
            })
            .collect()
    }
}

#[async_trait]
impl MarketDataSource for SyntheticMarketSource {
    async fn collect(&self) -> MarketSnapshot {
        match self.seed {
            Some(seed) => self.generate(&mut StdRng::seed_from_u64(seed)),
            None => self.generate(&mut StdRng::from_entropy()),
        }
    }

    fn name(&self) -> &'static str {
        "synthetic"
    }
}
