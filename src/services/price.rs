//! 指数价格获取
//!
//! 主数据源失败时切换一次备用数据源，两者都失败则使用默认价格

use anyhow::{anyhow, Result};

use super::common::parse_date;
use super::sanitize::sanitize_present;
use super::sources::PriceSource;
use crate::models::{Acquired, PriceBar, PriceSeries, PriceSnapshot, RawBar};

/// 获取指数日K线
///
/// 网络错误、空结果、格式错误都视为失败；清洗后为空同样视为失败
pub async fn fetch_price_history<P, F>(
    primary: &P,
    fallback: &F,
    default_price: f64,
) -> Acquired<PriceSnapshot>
where
    P: PriceSource,
    F: PriceSource,
{
    let primary_err = match load_snapshot(primary).await {
        Ok(snapshot) => return Acquired::fresh(snapshot, primary.name()),
        Err(e) => {
            log::warn!("⚠️ 主数据源 {} 获取失败: {:#}", primary.name(), e);
            e
        }
    };

    let fallback_err = match load_snapshot(fallback).await {
        Ok(snapshot) => {
            return Acquired::fallback(
                snapshot,
                fallback.name(),
                format!("{}: {:#}", primary.name(), primary_err),
            )
        }
        Err(e) => {
            log::warn!("⚠️ 备用数据源 {} 获取失败: {:#}", fallback.name(), e);
            e
        }
    };

    log::warn!("⚠️ 所有价格数据源失败，使用默认价格 {}", default_price);
    Acquired::defaulted(
        PriceSnapshot::defaulted(default_price),
        format!(
            "{}: {:#}; {}: {:#}",
            primary.name(),
            primary_err,
            fallback.name(),
            fallback_err
        ),
    )
}

async fn load_snapshot<S: PriceSource>(source: &S) -> Result<PriceSnapshot> {
    let raw = source.fetch_history().await?;
    if raw.is_empty() {
        return Err(anyhow!("数据源返回 0 行"));
    }
    let total = raw.len();
    let series = clean_bars(raw);
    if series.len() < total {
        log::debug!("{} 丢弃 {} 行无效数据", source.name(), total - series.len());
    }
    PriceSnapshot::from_series(series).ok_or_else(|| anyhow!("清洗后没有有效数据"))
}

/// 清洗原始K线
///
/// 每个价格列都经过数值清洗，任一列缺失（或日期无法解析）的行整行丢弃
pub fn clean_bars(raw: Vec<RawBar>) -> PriceSeries {
    let bars = raw
        .iter()
        .filter_map(|r| {
            Some(PriceBar {
                date: parse_date(&r.date)?,
                open: sanitize_present(&r.open)?,
                high: sanitize_present(&r.high)?,
                low: sanitize_present(&r.low)?,
                close: sanitize_present(&r.close)?,
            })
        })
        .collect();
    PriceSeries::from_bars(bars)
}
