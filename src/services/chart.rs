//! 走势图生成
//!
//! 把K线和移动平均写入数据文件，再通过 stdin 把脚本交给 gnuplot 绘制。
//! K线图失败时退回收盘价折线图；图表失败不影响其他输出

use anyhow::{anyhow, Context, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::ChartConfig;
use crate::models::{Acquired, PriceBar, PriceSeries};

/// 移动平均线颜色，依次对应配置中的周期
const MA_COLORS: [&str; 4] = ["#2ca02c", "#ff7f0e", "#17becf", "#9467bd"];

/// 简单移动平均，数据不足一个周期的位置为 None
pub fn moving_average(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for (i, v) in values.iter().enumerate() {
        sum += v;
        if i >= period {
            sum -= values[i - period];
        }
        if i + 1 >= period {
            out.push(Some(sum / period as f64));
        } else {
            out.push(None);
        }
    }
    out
}

/// 在阻塞线程池中生成走势图，gnuplot 进程不会占用异步运行时
pub async fn render_chart_blocking(series: PriceSeries, config: ChartConfig) -> Acquired<()> {
    match tokio::task::spawn_blocking(move || render_chart(&series, &config)).await {
        Ok(result) => result,
        Err(e) => {
            log::warn!("⚠️ 走势图任务异常结束: {}", e);
            Acquired::defaulted((), format!("chart task failed: {}", e))
        }
    }
}

/// 生成走势图
pub fn render_chart(series: &PriceSeries, config: &ChartConfig) -> Acquired<()> {
    if !config.enabled {
        return Acquired::disabled(());
    }
    if series.is_empty() {
        log::warn!("⚠️ 没有价格数据，跳过走势图");
        return Acquired::defaulted((), "没有价格数据");
    }

    let candle_err = match render_candles(series, config) {
        Ok(()) => {
            log::info!("🖼️ 成功生成K线图 {}", config.path);
            return Acquired::fresh((), "candlestick");
        }
        Err(e) => {
            log::warn!("⚠️ K线图生成失败: {:#}，改用折线图", e);
            e
        }
    };

    match render_line(series, config) {
        Ok(()) => {
            log::info!("🖼️ 成功生成折线图 {}", config.path);
            Acquired::fallback((), "line", format!("{:#}", candle_err))
        }
        Err(e) => {
            log::warn!("⚠️ 折线图生成失败: {:#}", e);
            Acquired::defaulted((), format!("candlestick: {:#}; line: {:#}", candle_err, e))
        }
    }
}

fn render_candles(series: &PriceSeries, config: &ChartConfig) -> Result<()> {
    let closes = series.closes();
    let averages: Vec<Vec<Option<f64>>> = config
        .moving_averages
        .iter()
        .map(|p| moving_average(&closes, *p))
        .collect();

    let rows = config.candle_rows.min(series.len());
    let start = series.len() - rows;
    let dat_path = sibling(&config.path, "candle.dat");
    write_data(&dat_path, &series.bars()[start..], |i, line| {
        for ma in &averages {
            match ma[start + i] {
                Some(v) => line.push_str(&format!(" {:.4}", v)),
                None => line.push_str(" ?"),
            }
        }
    })?;

    let dat = dat_path.display().to_string();
    let mut plots = vec![
        format!("'{}' using 1:($5>=$2?$2:1/0):4:3:5 with candlesticks lc rgb 'red' notitle", dat),
        format!("'{}' using 1:($5<$2?$2:1/0):4:3:5 with candlesticks lc rgb 'blue' notitle", dat),
    ];
    for (i, period) in config.moving_averages.iter().enumerate() {
        plots.push(format!(
            "'{}' using 1:{} with lines lw 1.5 lc rgb '{}' title 'MA{}'",
            dat,
            6 + i,
            MA_COLORS[i % MA_COLORS.len()],
            period
        ));
    }

    let script = format!(
        "set boxwidth 51840 absolute\nset style fill solid border -1\nset key top left\nplot {}\n",
        plots.join(", \\\n     ")
    );
    let result = plot(config, &script);
    let _ = fs::remove_file(&dat_path);
    result
}

fn render_line(series: &PriceSeries, config: &ChartConfig) -> Result<()> {
    let rows = config.line_rows.min(series.len());
    let dat_path = sibling(&config.path, "line.dat");
    write_data(&dat_path, series.tail(rows), |_, _| {})?;

    let script = format!(
        "set key off\nplot '{}' using 1:5 with lines lw 2 lc rgb '#1f77b4'\n",
        dat_path.display()
    );
    let result = plot(config, &script);
    let _ = fs::remove_file(&dat_path);
    result
}

/// 写入数据文件：日期 开 高 低 收 [附加列]
fn write_data<F>(path: &Path, bars: &[PriceBar], mut extra: F) -> Result<()>
where
    F: FnMut(usize, &mut String),
{
    let file = File::create(path)
        .with_context(|| format!("创建数据文件 {} 失败", path.display()))?;
    let mut writer = BufWriter::new(file);
    for (i, bar) in bars.iter().enumerate() {
        let mut line = format!(
            "{} {} {} {} {}",
            bar.date.format("%Y-%m-%d"),
            bar.open,
            bar.high,
            bar.low,
            bar.close
        );
        extra(i, &mut line);
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;
    Ok(())
}

/// 公共的终端和坐标轴设置，先输出到临时文件，成功后再改名
fn plot(config: &ChartConfig, body: &str) -> Result<()> {
    let tmp_path = sibling(&config.path, "tmp");
    let script = format!(
        r#"set terminal png size 1200,800
set output '{output}'
set title '{title}'
set ylabel 'Price (JPY)'
set xdata time
set timefmt '%Y-%m-%d'
set format x '%m/%d'
set grid linetype 0
set datafile missing '?'
{body}"#,
        output = tmp_path.display(),
        title = config.title.replace('\'', ""),
        body = body
    );

    run_gnuplot(&config.gnuplot, &script)?;

    let produced = fs::metadata(&tmp_path).map(|m| m.len() > 0).unwrap_or(false);
    if !produced {
        let _ = fs::remove_file(&tmp_path);
        return Err(anyhow!("gnuplot 没有生成图片"));
    }
    fs::rename(&tmp_path, &config.path)
        .with_context(|| format!("重命名图片到 {} 失败", config.path))?;
    Ok(())
}

fn run_gnuplot(program: &str, script: &str) -> Result<()> {
    let mut cmd = Command::new(program)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::inherit())
        .spawn()
        .with_context(|| format!("无法启动 {}", program))?;
    let stdin = cmd.stdin.as_mut().context("无法打开 gnuplot 的 stdin")?;
    stdin
        .write_all(script.as_bytes())
        .context("写入 gnuplot 脚本失败")?;
    let status = cmd.wait().context("等待 gnuplot 进程失败")?;
    if !status.success() {
        return Err(anyhow!("gnuplot 退出状态: {}", status));
    }
    Ok(())
}

/// 与图片同目录的辅助文件路径，如 nikkei_chart.png.tmp
fn sibling(path: &str, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{}.{}", path, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series(n: usize) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        PriceSeries::from_bars(
            (0..n)
                .map(|i| {
                    let close = 38000.0 + i as f64 * 10.0;
                    PriceBar {
                        date: start + chrono::Duration::days(i as i64),
                        open: close - 5.0,
                        high: close + 20.0,
                        low: close - 20.0,
                        close,
                    }
                })
                .collect(),
        )
    }

    #[test]
    fn moving_average_needs_full_window() {
        let ma = moving_average(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(ma, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
        assert_eq!(moving_average(&[1.0, 2.0], 5), vec![None, None]);
        assert_eq!(moving_average(&[1.0], 0), vec![None]);
    }

    #[test]
    fn disabled_chart_is_skipped() {
        let config = ChartConfig {
            enabled: false,
            ..ChartConfig::default()
        };
        let result = render_chart(&series(10), &config);
        assert_eq!(result.status, crate::models::DataStatus::Disabled);
    }

    #[test]
    fn missing_gnuplot_degrades_without_output() {
        let dir = std::env::temp_dir().join(format!("market-snapshot-chart-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("chart.png");
        let config = ChartConfig {
            path: path.display().to_string(),
            gnuplot: "definitely-not-a-gnuplot-binary".to_string(),
            ..ChartConfig::default()
        };
        let result = render_chart(&series(30), &config);
        assert!(matches!(result.status, crate::models::DataStatus::Defaulted { .. }));
        assert!(!path.exists());
        assert!(!sibling(&config.path, "candle.dat").exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn data_file_has_one_line_per_bar() {
        let dir = std::env::temp_dir().join(format!("market-snapshot-dat-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bars.dat");
        let s = series(3);
        write_data(&path, s.bars(), |i, line| line.push_str(&format!(" {}", i))).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "2024-01-01 37995 38020 37980 38000 0");
        let _ = fs::remove_dir_all(&dir);
    }
}
