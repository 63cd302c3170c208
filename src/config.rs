//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置，所有字段都有默认值

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// HTTP 请求配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// 浏览器 User-Agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// 指数价格数据源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceConfig {
    /// 主数据源（图表 JSON API）地址
    #[serde(default = "default_chart_url")]
    pub primary_url: String,
    /// 主数据源中的指数代码
    #[serde(default = "default_primary_symbol")]
    pub primary_symbol: String,
    /// 备用数据源（CSV 下载）地址
    #[serde(default = "default_csv_url")]
    pub fallback_url: String,
    /// 备用数据源中的指数代码
    #[serde(default = "default_fallback_symbol")]
    pub fallback_symbol: String,
    /// 回看区间，如 2y、6mo
    #[serde(default = "default_price_range")]
    pub range: String,
    /// 采样间隔，如 1d
    #[serde(default = "default_interval")]
    pub interval: String,
    /// 所有数据源都失败时使用的价格
    #[serde(default = "default_price")]
    pub default_price: f64,
}

/// 波动率指数配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolatilityConfig {
    #[serde(default = "default_chart_url")]
    pub url: String,
    #[serde(default = "default_vi_symbol")]
    pub symbol: String,
    #[serde(default = "default_vi_range")]
    pub range: String,
    /// 无法获取时使用的波动率（百分比）
    #[serde(default = "default_volatility")]
    pub default_value: f64,
}

/// 单个建玉单元格的位置
///
/// 行列号从 0 开始，是对交易所表格布局的外部约定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellSpec {
    /// 报表中的键，如 large_all
    pub key: String,
    pub row: u32,
    pub col: u32,
    /// 按行标签搜索时使用的子串（为空则只按坐标读取）
    #[serde(default)]
    pub label: Option<String>,
}

impl CellSpec {
    fn new(key: &str, row: u32, col: u32) -> Self {
        Self {
            key: key.to_string(),
            row,
            col,
            label: None,
        }
    }
}

/// 建玉数据配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenInterestConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// 交易所衍生品成交量页面
    #[serde(default = "default_jpx_url")]
    pub index_url: String,
    /// 链接中必须包含的子串
    #[serde(default = "default_link_contains")]
    pub link_contains: String,
    /// 链接必须以此扩展名结尾
    #[serde(default = "default_link_suffix")]
    pub link_suffix: String,
    /// 获取失败时每个键统一显示的占位符
    #[serde(default = "default_failed_placeholder")]
    pub failed_placeholder: String,
    /// 表格中的限月列标题，如 3月限
    #[serde(default = "default_tenor_label")]
    pub tenor_label: String,
    #[serde(default = "default_cells")]
    pub cells: Vec<CellSpec>,
}

/// 行权价阶梯配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LadderConfig {
    #[serde(default = "default_ladder_step")]
    pub step: i64,
    /// ATM 上下各延伸的宽度
    #[serde(default = "default_ladder_width")]
    pub width: i64,
}

/// 图表配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_chart_path")]
    pub path: String,
    #[serde(default = "default_chart_title")]
    pub title: String,
    /// K线图显示的最近行数
    #[serde(default = "default_candle_rows")]
    pub candle_rows: usize,
    /// 折线图（降级）显示的最近行数
    #[serde(default = "default_line_rows")]
    pub line_rows: usize,
    #[serde(default = "default_ma_periods")]
    pub moving_averages: Vec<usize>,
    /// gnuplot 可执行文件
    #[serde(default = "default_gnuplot")]
    pub gnuplot: String,
}

/// 输出文件配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_headline_path")]
    pub headline_path: String,
    #[serde(default = "default_detail_path")]
    pub detail_path: String,
    #[serde(default = "default_status_path")]
    pub status_path: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub price: PriceConfig,
    #[serde(default)]
    pub volatility: VolatilityConfig,
    #[serde(default)]
    pub open_interest: OpenInterestConfig,
    #[serde(default)]
    pub ladder: LadderConfig,
    #[serde(default)]
    pub chart: ChartConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub log: LogConfig,
}

// 默认值函数
fn default_true() -> bool { true }
fn default_timeout() -> u64 { 15 }
fn default_connect_timeout() -> u64 { 10 }
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}
fn default_chart_url() -> String { "https://query1.finance.yahoo.com/v8/finance/chart".to_string() }
fn default_primary_symbol() -> String { "^N225".to_string() }
fn default_csv_url() -> String { "https://stooq.com/q/d/l/".to_string() }
fn default_fallback_symbol() -> String { "^nkx".to_string() }
fn default_price_range() -> String { "2y".to_string() }
fn default_interval() -> String { "1d".to_string() }
fn default_price() -> f64 { 38000.0 }
fn default_vi_symbol() -> String { "^JNIV".to_string() }
fn default_vi_range() -> String { "5d".to_string() }
fn default_volatility() -> f64 { 20.0 }
fn default_jpx_url() -> String {
    "https://www.jpx.co.jp/markets/derivatives/trading-volume/index.html".to_string()
}
fn default_link_contains() -> String { "open_interest".to_string() }
fn default_link_suffix() -> String { ".xlsx".to_string() }
fn default_failed_placeholder() -> String { "取得失敗".to_string() }
fn default_tenor_label() -> String { "3月限".to_string() }
fn default_cells() -> Vec<CellSpec> {
    vec![
        CellSpec::new("large_all", 48, 4),
        CellSpec::new("large_mar", 29, 4),
        CellSpec::new("mini_all", 51, 11),
        CellSpec::new("mini_mar", 35, 11),
        CellSpec::new("topix_all", 62, 4),
        CellSpec::new("topix_mar", 49, 4),
    ]
}
fn default_ladder_step() -> i64 { 500 }
fn default_ladder_width() -> i64 { 5000 }
fn default_chart_path() -> String { "nikkei_chart.png".to_string() }
fn default_chart_title() -> String { "Nikkei 225 & MA".to_string() }
fn default_candle_rows() -> usize { 100 }
fn default_line_rows() -> usize { 50 }
fn default_ma_periods() -> Vec<usize> { vec![5, 25, 75] }
fn default_gnuplot() -> String { "gnuplot".to_string() }
fn default_headline_path() -> String { "info.html".to_string() }
fn default_detail_path() -> String { "details_info.html".to_string() }
fn default_status_path() -> String { "status.json".to_string() }
fn default_log_level() -> String { "info".to_string() }

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            primary_url: default_chart_url(),
            primary_symbol: default_primary_symbol(),
            fallback_url: default_csv_url(),
            fallback_symbol: default_fallback_symbol(),
            range: default_price_range(),
            interval: default_interval(),
            default_price: default_price(),
        }
    }
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        Self {
            url: default_chart_url(),
            symbol: default_vi_symbol(),
            range: default_vi_range(),
            default_value: default_volatility(),
        }
    }
}

impl Default for OpenInterestConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            index_url: default_jpx_url(),
            link_contains: default_link_contains(),
            link_suffix: default_link_suffix(),
            failed_placeholder: default_failed_placeholder(),
            tenor_label: default_tenor_label(),
            cells: default_cells(),
        }
    }
}

impl Default for LadderConfig {
    fn default() -> Self {
        Self {
            step: default_ladder_step(),
            width: default_ladder_width(),
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_chart_path(),
            title: default_chart_title(),
            candle_rows: default_candle_rows(),
            line_rows: default_line_rows(),
            moving_averages: default_ma_periods(),
            gnuplot: default_gnuplot(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            headline_path: default_headline_path(),
            detail_path: default_detail_path(),
            status_path: default_status_path(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// 配置文件的查找顺序
pub const CONFIG_PATHS: [&str; 2] = ["config.json", "config/config.json"];

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置，优先从文件，失败则使用默认值
    ///
    /// 日志系统需要先知道日志级别，所以这里不直接打日志，
    /// 而是把加载过程的说明一并返回，由调用方在初始化日志后输出
    pub fn load() -> (Self, Vec<String>) {
        let mut messages = Vec::new();

        for path in CONFIG_PATHS {
            if Path::new(path).exists() {
                match Self::from_file(path) {
                    Ok(config) => {
                        messages.push(format!("从 {} 加载配置成功", path));
                        return (config, messages);
                    }
                    Err(e) => {
                        messages.push(format!("加载配置文件 {} 失败: {}", path, e));
                    }
                }
            }
        }

        messages.push("使用默认配置".to_string());
        (Self::default(), messages)
    }
}
