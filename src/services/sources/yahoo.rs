//! Yahoo Finance 图表 API
//!
//! 返回 JSON，时间戳和 OHLC 分列存放，缺失值为 null

use anyhow::{anyhow, Context, Result};
use chrono::TimeZone;
use chrono_tz::Tz;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::{PriceSource, VolatilitySource};
use crate::models::{RawBar, RawValue};

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    exchange_timezone_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// 图表 API 数据源
pub struct YahooChartSource {
    client: Client,
    base_url: String,
    symbol: String,
    range: String,
    interval: String,
}

impl YahooChartSource {
    pub fn new(client: Client, base_url: &str, symbol: &str, range: &str, interval: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            symbol: symbol.to_string(),
            range: range.to_string(),
            interval: interval.to_string(),
        }
    }

    fn url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).context("图表 API 地址无效")?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("图表 API 地址不能追加路径"))?
            .pop_if_empty()
            .push(&self.symbol);
        url.query_pairs_mut()
            .append_pair("range", &self.range)
            .append_pair("interval", &self.interval);
        Ok(url)
    }

    async fn fetch_bars(&self) -> Result<Vec<RawBar>> {
        let url = self.url()?;
        log::info!("📡 请求图表数据 URL: {}", url);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("获取图表数据失败: {}", response.status()));
        }

        let text = response.text().await?;
        let bars = parse_chart_bars(&text)?;
        log::info!("📈 {} 解析到 {} 条K线数据", self.symbol, bars.len());
        Ok(bars)
    }
}

impl PriceSource for YahooChartSource {
    fn name(&self) -> &str {
        "yahoo-chart"
    }

    async fn fetch_history(&self) -> Result<Vec<RawBar>> {
        self.fetch_bars().await
    }
}

impl VolatilitySource for YahooChartSource {
    fn name(&self) -> &str {
        "yahoo-chart"
    }

    async fn fetch_readings(&self) -> Result<Vec<RawValue>> {
        let bars = self.fetch_bars().await?;
        Ok(bars.into_iter().map(|b| b.close).collect())
    }
}

/// 解析图表 API 的 JSON 响应
///
/// 时间戳按交易所时区换算成交易日；各列长度不一致时按最短的截取
pub fn parse_chart_bars(json: &str) -> Result<Vec<RawBar>> {
    let response: ChartResponse =
        serde_json::from_str(json).map_err(|e| anyhow!("解析JSON失败: {}", e))?;

    if let Some(err) = response.chart.error.filter(|e| !e.is_null()) {
        return Err(anyhow!("图表 API 返回错误: {}", err));
    }

    let result = response
        .chart
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
        .ok_or_else(|| anyhow!("图表 API 没有返回数据"))?;

    let tz: Tz = result
        .meta
        .as_ref()
        .and_then(|m| m.exchange_timezone_name.as_deref())
        .and_then(|name| name.parse().ok())
        .unwrap_or(chrono_tz::Asia::Tokyo);

    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        let date = match tz.timestamp_opt(*ts, 0).single() {
            Some(dt) => dt.date_naive().format("%Y-%m-%d").to_string(),
            None => continue,
        };
        let column = |values: &Vec<Option<f64>>| RawValue::from(values.get(i).copied().flatten());
        bars.push(RawBar {
            date,
            open: column(&quote.open),
            high: column(&quote.high),
            low: column(&quote.low),
            close: column(&quote.close),
        });
    }

    Ok(bars)
}
