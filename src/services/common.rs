//! 公共常量和辅助函数

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;

use crate::config::ApiConfig;

/// 根据配置创建 HTTP 客户端
///
/// 所有请求共用同一个客户端：统一超时，统一浏览器 User-Agent
pub fn build_client(api: &ApiConfig) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&api.user_agent).context("User-Agent 含有非法字符")?,
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ja,en;q=0.8"));

    let client = Client::builder()
        .default_headers(headers)
        .timeout(std::time::Duration::from_secs(api.timeout_secs))
        .connect_timeout(std::time::Duration::from_secs(api.connect_timeout_secs))
        .gzip(true)
        .cookie_store(true)
        .build()?;
    Ok(client)
}

/// 按页面声明的字符集解码 HTML
///
/// 优先使用 Content-Type 头中的 charset，其次是 meta 标签，默认 UTF-8
pub fn decode_html(bytes: &[u8], content_type: Option<&str>) -> String {
    let charset_re = Regex::new(r#"(?i)charset\s*=\s*["']?([A-Za-z0-9_\-]+)"#).unwrap();

    let from_header = content_type
        .and_then(|ct| charset_re.captures(ct))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    let from_meta = || {
        let head_len = bytes.len().min(4096);
        let head = String::from_utf8_lossy(&bytes[..head_len]);
        charset_re
            .captures(&head)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    };

    let encoding = from_header
        .or_else(from_meta)
        .and_then(|label| encoding_rs::Encoding::for_label(label.as_bytes()))
        .unwrap_or(encoding_rs::UTF_8);

    encoding.decode(bytes).0.into_owned()
}

/// 把回看区间（5d、6mo、1y、2y）换算成天数
pub fn lookback_days(range: &str) -> Option<i64> {
    let re = Regex::new(r"^(\d+)(d|wk|mo|y)$").unwrap();
    let caps = re.captures(range.trim())?;
    let n: i64 = caps.get(1)?.as_str().parse().ok()?;
    let days = match caps.get(2)?.as_str() {
        "d" => n,
        "wk" => n.checked_mul(7)?,
        "mo" => n.checked_mul(31)?,
        "y" => n.checked_mul(366)?,
        _ => return None,
    };
    Some(days)
}

/// 回看区间的起始日期，超出日期范围时返回 None
pub fn lookback_start(today: NaiveDate, range: &str) -> Option<NaiveDate> {
    let days = Duration::try_days(lookback_days(range)?)?;
    today.checked_sub_signed(days)
}

/// 解析 YYYY-MM-DD 或 YYYY/MM/DD 格式的日期
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y/%m/%d"))
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y%m%d"))
        .ok()
}
