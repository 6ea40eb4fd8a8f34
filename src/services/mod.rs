//! 业务逻辑服务模块
//! 
//! 封装行情采集、分析、排版与推送逻辑

pub mod archive;       // 行情快照导出
pub mod briefing;      // 简报流水线
pub mod insight;       // 投资洞察
pub mod korea_impact;  // 韩国市场影响
pub mod market;        // 行情数据源
pub mod notifier;      // 推送通道
pub mod report;        // 简报排版
pub mod scheduler;     // 定时调度
pub mod sentiment;     // 市场情绪
