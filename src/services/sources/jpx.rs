//! JPX 衍生品建玉数据
//!
//! 先在成交量页面中查找建玉 Excel 的链接，再下载并读取第一个工作表

use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto_from_rs, Reader};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use scraper::{Html, Selector};
use std::io::Cursor;
use url::Url;

use super::OpenInterestSource;
use crate::models::{RawValue, Sheet};
use crate::services::common::decode_html;

/// 建玉 Excel 数据源
pub struct JpxOpenInterestSource {
    client: Client,
    index_url: String,
    link_contains: String,
    link_suffix: String,
}

impl JpxOpenInterestSource {
    pub fn new(client: Client, index_url: &str, link_contains: &str, link_suffix: &str) -> Self {
        Self {
            client,
            index_url: index_url.to_string(),
            link_contains: link_contains.to_string(),
            link_suffix: link_suffix.to_string(),
        }
    }
}

impl OpenInterestSource for JpxOpenInterestSource {
    fn name(&self) -> &str {
        "jpx-open-interest"
    }

    async fn fetch_sheet(&self) -> Result<Sheet> {
        let index_url = Url::parse(&self.index_url).context("建玉页面地址无效")?;
        log::info!("📡 请求建玉页面 URL: {}", index_url);

        let response = self.client.get(index_url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("获取建玉页面失败: {}", response.status()));
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;
        let html = decode_html(&bytes, content_type.as_deref());

        let link = find_spreadsheet_link(&html, &index_url, &self.link_contains, &self.link_suffix)?;
        log::info!("📡 下载建玉表格 URL: {}", link);

        let response = self.client.get(link).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("下载建玉表格失败: {}", response.status()));
        }
        let bytes = response.bytes().await?;
        let sheet = parse_workbook(&bytes)?;

        log::info!("📊 建玉表格读取完成，共 {} 行", sheet.rows().count());
        Ok(sheet)
    }
}

/// 查找第一个 href 包含指定子串并以指定扩展名结尾的链接
///
/// 相对链接按页面地址解析成绝对地址
pub fn find_spreadsheet_link(html: &str, base: &Url, contains: &str, suffix: &str) -> Result<Url> {
    let document = Html::parse_document(html);
    let link_selector = Selector::parse("a[href]").unwrap();

    let href = document
        .select(&link_selector)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .find(|href| href.contains(contains) && href.ends_with(suffix))
        .ok_or_else(|| anyhow!("页面中没有找到建玉表格链接 (*{}*{})", contains, suffix))?;

    base.join(href)
        .map_err(|e| anyhow!("建玉表格链接无效 {}: {}", href, e))
}

/// 读取工作簿的第一个工作表，不假设表头
pub fn parse_workbook(bytes: &[u8]) -> Result<Sheet> {
    let cursor = Cursor::new(bytes);
    let mut workbook =
        open_workbook_auto_from_rs(cursor).map_err(|e| anyhow!("打开Excel文件失败: {}", e))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let first_sheet = sheet_names
        .first()
        .ok_or_else(|| anyhow!("Excel文件没有工作表"))?;

    let range = workbook
        .worksheet_range(first_sheet)
        .map_err(|e| anyhow!("读取工作表失败: {}", e))?;

    let origin = range.start().unwrap_or((0, 0));
    let rows: Vec<Vec<RawValue>> = range
        .rows()
        .map(|row| row.iter().map(cell_to_raw).collect())
        .collect();

    Ok(Sheet::new(origin, rows))
}

fn cell_to_raw(cell: &calamine::Data) -> RawValue {
    match cell {
        calamine::Data::String(s) => RawValue::Text(s.clone()),
        calamine::Data::Float(f) => RawValue::Number(*f),
        calamine::Data::Int(i) => RawValue::Number(*i as f64),
        calamine::Data::Bool(b) => RawValue::Text(b.to_string()),
        calamine::Data::DateTime(dt) => RawValue::Text(format!("{}", dt)),
        calamine::Data::DateTimeIso(s) | calamine::Data::DurationIso(s) => RawValue::Text(s.clone()),
        #[allow(unreachable_patterns)]
        _ => RawValue::Blank,
    }
}
