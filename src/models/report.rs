//! 报表数据
//!
//! 一次运行收集到的全部数据，只用于渲染，不做持久化

use super::{Acquired, OpenInterestSnapshot, PredictedRanges, PriceSnapshot, StrikeLadder};

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub price: Acquired<PriceSnapshot>,
    pub volatility: Acquired<f64>,
    pub ranges: PredictedRanges,
    pub open_interest: Acquired<OpenInterestSnapshot>,
    pub ladder: StrikeLadder,
    /// 建玉表格中的限月列标题
    pub tenor_label: String,
}

/// 渲染后的两个 HTML 片段
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedReport {
    /// 价格、涨跌、波动率和预测区间
    pub headline: String,
    /// 建玉表和行权价阶梯
    pub detail: String,
}
