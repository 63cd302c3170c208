//! 外部数据源
//!
//! ## 数据来源
//! - Yahoo Finance 图表 API：指数日K线（主）、波动率指数
//! - Stooq：指数日K线 CSV（备用）
//! - JPX：衍生品建玉 Excel
//!
//! 每类数据源都是一个 trait，便于在测试中替换成固定数据

#![allow(async_fn_in_trait)]

use anyhow::Result;

use crate::models::{RawBar, RawValue, Sheet};

mod jpx;
mod stooq;
mod yahoo;

pub use jpx::JpxOpenInterestSource;
pub use stooq::StooqCsvSource;
pub use yahoo::YahooChartSource;

/// 日K线数据源
pub trait PriceSource {
    /// 数据源名称，写入状态报告
    fn name(&self) -> &str;

    /// 获取原始日K线（按时间顺序，未清洗）
    async fn fetch_history(&self) -> Result<Vec<RawBar>>;
}

/// 波动率指数数据源
pub trait VolatilitySource {
    fn name(&self) -> &str;

    /// 获取按时间顺序排列的原始读数
    async fn fetch_readings(&self) -> Result<Vec<RawValue>>;
}

/// 建玉表格数据源
pub trait OpenInterestSource {
    fn name(&self) -> &str;

    /// 定位并下载建玉表格，返回第一个工作表
    async fn fetch_sheet(&self) -> Result<Sheet>;
}
