//! 流程编排
//!
//! 获取 → 清洗 → 计算 → 渲染，按顺序执行，不保留跨次运行的状态

use anyhow::Result;

use super::chart::render_chart_blocking;
use super::common::build_client;
use super::ladder::build_strike_ladder;
use super::open_interest::fetch_open_interest;
use super::output::write_atomic;
use super::price::fetch_price_history;
use super::range::estimate_ranges;
use super::render::render_report;
use super::sources::{
    JpxOpenInterestSource, OpenInterestSource, PriceSource, StooqCsvSource, VolatilitySource,
    YahooChartSource,
};
use super::volatility::fetch_volatility;
use crate::config::AppConfig;
use crate::models::{RenderedReport, Report, RunStatus};

/// 一次完整运行所需的配置和数据源
pub struct Pipeline<P, F, V, O> {
    config: AppConfig,
    primary: P,
    fallback: F,
    volatility: V,
    open_interest: O,
}

/// 使用真实 HTTP 数据源的流程
pub type HttpPipeline =
    Pipeline<YahooChartSource, StooqCsvSource, YahooChartSource, JpxOpenInterestSource>;

impl HttpPipeline {
    /// 按配置创建所有数据源，共用同一个 HTTP 客户端
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let client = build_client(&config.api)?;
        let price = &config.price;
        let primary = YahooChartSource::new(
            client.clone(),
            &price.primary_url,
            &price.primary_symbol,
            &price.range,
            &price.interval,
        );
        let fallback = StooqCsvSource::new(
            client.clone(),
            &price.fallback_url,
            &price.fallback_symbol,
            &price.range,
            &price.interval,
        );
        let vol = &config.volatility;
        let volatility = YahooChartSource::new(client.clone(), &vol.url, &vol.symbol, &vol.range, "1d");
        let oi = &config.open_interest;
        let open_interest =
            JpxOpenInterestSource::new(client, &oi.index_url, &oi.link_contains, &oi.link_suffix);

        Ok(Pipeline::new(config, primary, fallback, volatility, open_interest))
    }
}

impl<P, F, V, O> Pipeline<P, F, V, O>
where
    P: PriceSource,
    F: PriceSource,
    V: VolatilitySource,
    O: OpenInterestSource,
{
    pub fn new(config: AppConfig, primary: P, fallback: F, volatility: V, open_interest: O) -> Self {
        Self {
            config,
            primary,
            fallback,
            volatility,
            open_interest,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// 依次获取各项数据并计算派生值
    ///
    /// 各组件失败时已自行替换为默认值，这里不会失败
    pub async fn collect(&self) -> Report {
        let price = fetch_price_history(
            &self.primary,
            &self.fallback,
            self.config.price.default_price,
        )
        .await;

        let volatility =
            fetch_volatility(&self.volatility, self.config.volatility.default_value).await;

        let open_interest = fetch_open_interest(&self.open_interest, &self.config.open_interest).await;

        let current = price.value.current;
        let ranges = estimate_ranges(
            current,
            volatility.value,
            self.config.volatility.default_value,
        );
        let ladder = build_strike_ladder(current, self.config.ladder.step, self.config.ladder.width);

        Report {
            price,
            volatility,
            ranges,
            open_interest,
            ladder,
            tenor_label: self.config.open_interest.tenor_label.clone(),
        }
    }

    /// 完整运行：收集、绘图、渲染并写出所有文件
    ///
    /// 只有输出文件写入失败才返回错误
    pub async fn run(&self) -> Result<RunStatus> {
        let report = self.collect().await;
        let chart =
            render_chart_blocking(report.price.value.series.clone(), self.config.chart.clone())
                .await;
        let rendered = render_report(&report);

        self.write_fragments(&rendered)?;

        let status = RunStatus::new(vec![
            report.price.component("price"),
            report.volatility.component("volatility"),
            report.open_interest.component("open_interest"),
            chart.component("chart"),
        ]);
        let json = serde_json::to_string_pretty(&status)?;
        write_atomic(&self.config.output.status_path, json.as_bytes())?;

        Ok(status)
    }

    fn write_fragments(&self, rendered: &RenderedReport) -> Result<()> {
        write_atomic(&self.config.output.headline_path, rendered.headline.as_bytes())?;
        write_atomic(&self.config.output.detail_path, rendered.detail.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DataStatus, RawBar, RawValue, Sheet};
    use crate::services::price::tests::{raw_bar, FailingSource, FixedSource};
    use anyhow::anyhow;
    use std::fs;
    use std::path::{Path, PathBuf};

    struct NoVolatility;

    impl VolatilitySource for NoVolatility {
        fn name(&self) -> &str {
            "no-volatility"
        }

        async fn fetch_readings(&self) -> Result<Vec<RawValue>> {
            Err(anyhow!("dns error"))
        }
    }

    struct NoSheet;

    impl OpenInterestSource for NoSheet {
        fn name(&self) -> &str {
            "no-sheet"
        }

        async fn fetch_sheet(&self) -> Result<Sheet> {
            Err(anyhow!("timed out"))
        }
    }

    fn test_config(dir: &Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.chart.enabled = false;
        config.output.headline_path = dir.join("info.html").display().to_string();
        config.output.detail_path = dir.join("details_info.html").display().to_string();
        config.output.status_path = dir.join("status.json").display().to_string();
        config
    }

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("market-snapshot-{}-{}", name, std::process::id()))
    }

    #[tokio::test]
    async fn all_sources_failing_renders_defaults() {
        let dir = temp_dir("defaults");
        let pipeline = Pipeline::new(test_config(&dir), FailingSource, FailingSource, NoVolatility, NoSheet);

        let status = pipeline.run().await.unwrap();
        assert!(!status.success);
        assert!(status
            .components
            .iter()
            .filter(|c| c.component != "chart")
            .all(|c| matches!(c.status, DataStatus::Defaulted { .. })));

        let headline = fs::read_to_string(dir.join("info.html")).unwrap();
        assert!(headline.contains("38,000円"));
        assert!(headline.contains("<b>日経VI:</b> 20.00"));
        assert!(headline.contains("+0円"));

        let detail = fs::read_to_string(dir.join("details_info.html")).unwrap();
        assert_eq!(detail.matches("<td>取得失敗</td>").count(), 6);
        assert!(detail.contains("ATM: 38,000"));

        let status_json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.join("status.json")).unwrap()).unwrap();
        assert_eq!(status_json["success"], false);
        assert_eq!(status_json["components"][0]["state"], "defaulted");

        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn chart_failure_still_writes_fragments() {
        let dir = temp_dir("chart");
        let mut config = test_config(&dir);
        config.chart.enabled = true;
        config.chart.path = dir.join("chart.png").display().to_string();
        config.chart.gnuplot = "definitely-not-a-gnuplot-binary".to_string();
        let bars = vec![
            raw_bar("2024-03-01", "39910.8"),
            raw_bar("2024-03-04", "40109.2"),
        ];
        let pipeline = Pipeline::new(config, FixedSource(bars), FailingSource, NoVolatility, NoSheet);

        let status = pipeline.run().await.unwrap();
        let chart = status.components.iter().find(|c| c.component == "chart").unwrap();
        assert!(matches!(chart.status, DataStatus::Defaulted { .. }));
        assert!(dir.join("info.html").exists());
        assert!(dir.join("details_info.html").exists());
        assert!(!dir.join("chart.png").exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn identical_inputs_give_identical_fragments() {
        let dir = temp_dir("idempotent");
        let bars: Vec<RawBar> = vec![
            raw_bar("2024-03-01", "39,910.8"),
            raw_bar("2024-03-04", "40,109.2"),
        ];
        let pipeline = Pipeline::new(
            test_config(&dir),
            FixedSource(bars),
            FailingSource,
            NoVolatility,
            NoSheet,
        );

        pipeline.run().await.unwrap();
        let headline_1 = fs::read(dir.join("info.html")).unwrap();
        let detail_1 = fs::read(dir.join("details_info.html")).unwrap();

        pipeline.run().await.unwrap();
        let headline_2 = fs::read(dir.join("info.html")).unwrap();
        let detail_2 = fs::read(dir.join("details_info.html")).unwrap();

        assert_eq!(headline_1, headline_2);
        assert_eq!(detail_1, detail_2);
        assert!(String::from_utf8(headline_1).unwrap().contains("40,109円"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn collect_derives_ranges_and_ladder_from_current_price() {
        let dir = temp_dir("collect");
        let pipeline = Pipeline::new(
            test_config(&dir),
            FailingSource,
            FixedSource(vec![raw_bar("2024-03-01", "38100"), raw_bar("2024-03-04", "38250")]),
            NoVolatility,
            NoSheet,
        );

        let report = pipeline.collect().await;
        assert!(matches!(report.price.status, DataStatus::Fallback { .. }));
        assert_eq!(report.price.value.current, 38250.0);
        assert_eq!(report.ladder.atm, 38500);
        assert_eq!(report.ladder.levels.len(), 21);
        assert_eq!(report.ranges, estimate_ranges(38250.0, 20.0, 20.0));
    }
}
