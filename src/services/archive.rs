//! 行情快照导出
//!
//! 按运行日期写出 market_data_YYYYMMDD.json，仅供离线查看

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

use crate::models::MarketSnapshot;

#[derive(Debug, Clone)]
pub struct SnapshotArchive {
    dir: PathBuf,
}

impl SnapshotArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("market_data_{}.json", date.format("%Y%m%d")))
    }

    /// 写出快照，同日重复运行时覆盖
    pub fn write(&self, date: NaiveDate, snapshot: &MarketSnapshot) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("创建导出目录 {} 失败", self.dir.display()))?;

        let path = self.path_for(date);
        let content = serde_json::to_string_pretty(snapshot)?;
        fs::write(&path, content).with_context(|| format!("写入 {} 失败", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IndexName, IndexQuote};

    #[test]
    fn test_write_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = SnapshotArchive::new(tmp.path().join("out"));
        let date = NaiveDate::from_ymd_opt(2025, 10, 24).unwrap();

        let mut snapshot = MarketSnapshot::new();
        snapshot.insert(IndexQuote {
            name: IndexName::Nasdaq,
            price: 18500.0,
            change_pct: 2.3,
            date: NaiveDate::from_ymd_opt(2025, 10, 23).unwrap(),
        });
        snapshot.mark_unavailable(IndexName::Dow);

        let path = archive.write(date, &snapshot).unwrap();
        assert!(path.ends_with("market_data_20251024.json"));

        let content = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["NASDAQ"]["price"], 18500.0);
        assert_eq!(value["NASDAQ"]["name"], "NASDAQ");
        assert!(value["DOW"].is_null());

        let restored: MarketSnapshot = serde_json::from_str(&content).unwrap();
        assert_eq!(restored, snapshot);
    }
}
