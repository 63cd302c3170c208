//! 预测价格区间
//!
//! 按时间平方根法则把年化波动率（百分比）换算成价格区间：
//! 一年按 250 个交易日、52 周计算

use crate::models::{PredictedRanges, RangeEstimate};

pub const TRADING_DAYS_PER_YEAR: f64 = 250.0;
pub const WEEKS_PER_YEAR: f64 = 52.0;

/// 计算日内和周内预测区间
///
/// 波动率为负或不是有限数时，先替换为默认值；这里不做取整
pub fn estimate_ranges(price: f64, volatility: f64, default_volatility: f64) -> PredictedRanges {
    let vol = if volatility.is_finite() && volatility >= 0.0 {
        volatility
    } else {
        log::warn!("⚠️ 波动率 {} 无效，按 {} 计算", volatility, default_volatility);
        default_volatility
    };

    PredictedRanges {
        daily: band(price, price * (vol / 100.0) / TRADING_DAYS_PER_YEAR.sqrt()),
        weekly: band(price, price * (vol / 100.0) / WEEKS_PER_YEAR.sqrt()),
    }
}

fn band(price: f64, range: f64) -> RangeEstimate {
    RangeEstimate {
        range,
        lower: price - range,
        upper: price + range,
    }
}
