//! Stooq 日K线 CSV（备用数据源）
//!
//! 表头为 Date,Open,High,Low,Close,Volume；没有数据时返回纯文本 "No data"

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use url::Url;

use super::PriceSource;
use crate::models::{get_tokyo_time, RawBar, RawValue};
use crate::services::common::lookback_start;

/// CSV 下载数据源
pub struct StooqCsvSource {
    client: Client,
    base_url: String,
    symbol: String,
    range: String,
    interval: String,
}

impl StooqCsvSource {
    pub fn new(client: Client, base_url: &str, symbol: &str, range: &str, interval: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            symbol: symbol.to_string(),
            range: range.to_string(),
            interval: interval.to_string(),
        }
    }

    /// 1d/1wk/1mo 对应 d/w/m
    fn interval_code(&self) -> &'static str {
        match self.interval.as_str() {
            "1wk" | "w" => "w",
            "1mo" | "m" => "m",
            _ => "d",
        }
    }

    fn url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).context("CSV 数据源地址无效")?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("s", &self.symbol)
                .append_pair("i", self.interval_code());
            let today = get_tokyo_time().date_naive();
            if let Some(start) = lookback_start(today, &self.range) {
                query
                    .append_pair("d1", &start.format("%Y%m%d").to_string())
                    .append_pair("d2", &today.format("%Y%m%d").to_string());
            }
        }
        Ok(url)
    }
}

impl PriceSource for StooqCsvSource {
    fn name(&self) -> &str {
        "stooq-csv"
    }

    async fn fetch_history(&self) -> Result<Vec<RawBar>> {
        let url = self.url()?;
        log::info!("📡 请求备用K线数据 URL: {}", url);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("获取CSV数据失败: {}", response.status()));
        }

        let text = response.text().await?;
        let bars = parse_csv_bars(&text)?;
        log::info!("📈 {} 解析到 {} 条K线数据", self.symbol, bars.len());
        Ok(bars)
    }
}

/// 解析日K线 CSV，按表头名称定位列
pub fn parse_csv_bars(text: &str) -> Result<Vec<RawBar>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let find = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| anyhow!("CSV 缺少 {} 列", name))
    };
    let date_idx = find("Date")?;
    let open_idx = find("Open")?;
    let high_idx = find("High")?;
    let low_idx = find("Low")?;
    let close_idx = find("Close")?;

    let mut bars = Vec::new();
    for record in reader.records() {
        let record = record?;
        let field = |idx: usize| -> RawValue {
            match record.get(idx) {
                Some(s) if !s.is_empty() => RawValue::from(s),
                _ => RawValue::Blank,
            }
        };
        bars.push(RawBar {
            date: record.get(date_idx).unwrap_or_default().to_string(),
            open: field(open_idx),
            high: field(high_idx),
            low: field(low_idx),
            close: field(close_idx),
        });
    }

    Ok(bars)
}
