//! 行情数据模型
//!
//! 定义指数价格序列、预测区间和行权价阶梯等数据结构

use chrono::NaiveDate;
use serde::Serialize;

/// 未经清洗的原始单元格值
///
/// 可以来自 JSON、CSV 或 Excel，类型在读取前未知
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Text(String),
    Number(f64),
    Blank,
}

impl RawValue {
    pub fn is_blank(&self) -> bool {
        match self {
            RawValue::Blank => true,
            RawValue::Text(s) => s.trim().is_empty(),
            RawValue::Number(_) => false,
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<Option<f64>> for RawValue {
    fn from(v: Option<f64>) -> Self {
        match v {
            Some(f) => RawValue::Number(f),
            None => RawValue::Blank,
        }
    }
}

/// 数据源返回的原始日K线
#[derive(Debug, Clone)]
pub struct RawBar {
    /// 日期（YYYY-MM-DD）
    pub date: String,
    pub open: RawValue,
    pub high: RawValue,
    pub low: RawValue,
    pub close: RawValue,
}

/// 清洗后的日K线
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// 日K线序列
///
/// 按日期严格递增，没有重复日期，所有价格都是有限数
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// 排序并去重，同一日期保留最后出现的一条
    pub fn from_bars(mut bars: Vec<PriceBar>) -> Self {
        bars.retain(|b| {
            b.open.is_finite() && b.high.is_finite() && b.low.is_finite() && b.close.is_finite()
        });
        // 稳定排序保证同一日期内的原始顺序
        bars.sort_by_key(|b| b.date);
        let mut deduped: Vec<PriceBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => deduped.push(bar),
            }
        }
        Self { bars: deduped }
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// 最近 n 条
    pub fn tail(&self, n: usize) -> &[PriceBar] {
        let start = self.bars.len().saturating_sub(n);
        &self.bars[start..]
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn latest_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }

    /// 前一交易日收盘价，只有一条数据时等于最新收盘价
    pub fn previous_close(&self) -> Option<f64> {
        match self.bars.len() {
            0 => None,
            1 => self.latest_close(),
            n => Some(self.bars[n - 2].close),
        }
    }
}

/// 涨跌
///
/// 金额和百分比都由两个收盘价直接计算，单位明确，不根据数值大小猜测
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceChange {
    /// 涨跌额（日元）
    pub amount: f64,
    /// 涨跌幅（百分比）
    pub percent: f64,
}

/// 指数价格快照
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSnapshot {
    pub series: PriceSeries,
    /// 最新收盘价
    pub current: f64,
    /// 前一交易日收盘价
    pub previous: f64,
}

impl PriceSnapshot {
    /// 用序列最后两条收盘价构建快照，序列为空时返回 None
    pub fn from_series(series: PriceSeries) -> Option<Self> {
        let current = series.latest_close()?;
        let previous = series.previous_close()?;
        Some(Self {
            series,
            current,
            previous,
        })
    }

    /// 所有数据源都失败时的默认快照，涨跌为零
    pub fn defaulted(price: f64) -> Self {
        Self {
            series: PriceSeries::default(),
            current: price,
            previous: price,
        }
    }

    pub fn change(&self) -> PriceChange {
        let amount = self.current - self.previous;
        let percent = if self.previous != 0.0 {
            amount / self.previous * 100.0
        } else {
            0.0
        };
        PriceChange { amount, percent }
    }
}

/// 单个周期的预测区间
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RangeEstimate {
    /// 预测波动幅度（单边）
    pub range: f64,
    pub lower: f64,
    pub upper: f64,
}

/// 日内和周内预测区间
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictedRanges {
    pub daily: RangeEstimate,
    pub weekly: RangeEstimate,
}

/// 行权价阶梯中的一档
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrikeLevel {
    pub strike: i64,
    /// 是否为平值档（仅用于显示强调）
    pub is_atm: bool,
    /// 看跌期权建玉（目前始终为占位符）
    pub put_open_interest: String,
    /// 看涨期权建玉（目前始终为占位符）
    pub call_open_interest: String,
}

/// 以平值为中心的行权价阶梯，从高到低排列
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrikeLadder {
    pub atm: i64,
    pub levels: Vec<StrikeLevel>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(date: &str, close: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            open: close,
            high: close,
            low: close,
            close,
        }
    }

    #[test]
    fn series_is_sorted_and_deduplicated() {
        let series = PriceSeries::from_bars(vec![
            bar("2024-03-05", 3.0),
            bar("2024-03-01", 1.0),
            bar("2024-03-04", 2.0),
            bar("2024-03-05", 4.0),
        ]);
        let dates: Vec<String> = series.bars().iter().map(|b| b.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-03-01", "2024-03-04", "2024-03-05"]);
        assert_eq!(series.latest_close(), Some(4.0));
        assert_eq!(series.previous_close(), Some(2.0));
    }

    #[test]
    fn non_finite_bars_are_dropped() {
        let mut broken = bar("2024-03-02", 1.0);
        broken.high = f64::NAN;
        let series = PriceSeries::from_bars(vec![bar("2024-03-01", 1.0), broken]);
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn single_bar_has_zero_change() {
        let series = PriceSeries::from_bars(vec![bar("2024-03-01", 39000.0)]);
        let snapshot = PriceSnapshot::from_series(series).unwrap();
        assert_eq!(snapshot.previous, 39000.0);
        assert_eq!(snapshot.change().amount, 0.0);
    }

    #[test]
    fn empty_series_has_no_snapshot() {
        assert!(PriceSnapshot::from_series(PriceSeries::default()).is_none());
    }

    #[test]
    fn change_carries_amount_and_percent() {
        let series = PriceSeries::from_bars(vec![bar("2024-03-01", 40000.0), bar("2024-03-04", 40400.0)]);
        let change = PriceSnapshot::from_series(series).unwrap().change();
        assert_eq!(change.amount, 400.0);
        assert!((change.percent - 1.0).abs() < 1e-12);
    }

    #[test]
    fn tail_is_bounded_by_length() {
        let series = PriceSeries::from_bars(vec![bar("2024-03-01", 1.0), bar("2024-03-04", 2.0)]);
        assert_eq!(series.tail(100).len(), 2);
        assert_eq!(series.tail(1)[0].close, 2.0);
    }
}
