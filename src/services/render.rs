//! 报表渲染
//!
//! 纯格式化函数，不会失败；上游缺失的值都已由各组件替换为默认值

use std::fmt::Write;

use crate::models::{RenderedReport, Report};

/// 先物建玉表的行：显示名、全体键、限月键
const FUTURES_ROWS: [(&str, &str, &str); 3] = [
    ("日経225(ラージ)", "large_all", "large_mar"),
    ("日経225 mini", "mini_all", "mini_mar"),
    ("TOPIX", "topix_all", "topix_mar"),
];

/// 带千位分隔符的定点格式
///
/// 非有限数显示为 "-"；四舍五入后为零的负数不带负号
pub fn format_number(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }

    let rounded = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match rounded.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rounded.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let is_zero = rounded.chars().all(|c| c == '0' || c == '.');
    let mut out = String::new();
    if value < 0.0 && !is_zero {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// 总是带符号的格式，用于涨跌
pub fn format_signed(value: f64, decimals: usize) -> String {
    let formatted = format_number(value, decimals);
    if formatted.starts_with('-') {
        formatted
    } else {
        format!("+{}", formatted)
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// 渲染两个片段
pub fn render_report(report: &Report) -> RenderedReport {
    RenderedReport {
        headline: render_headline(report),
        detail: render_detail(report),
    }
}

/// 头部片段：当前价格、前日比、波动率、日内与周内预测区间
pub fn render_headline(report: &Report) -> String {
    let price = &report.price.value;
    let change = price.change();
    // 上涨或持平为红色，下跌为蓝色
    let color = if price.current >= price.previous { "red" } else { "blue" };
    let daily = &report.ranges.daily;
    let weekly = &report.ranges.weekly;

    format!(
        r#"
<div class='analysis-box' style='background:#f8faff; padding:20px; border-radius:10px;'>
    <h2 style='color:#2c3e50; font-size:2.5em; margin:0;'>{current}円</h2>
    <p style='font-size:1.4em; margin-top:5px;'>前日比: <span style='color:{color}'>{amount}円 ({percent}%)</span></p>
    <hr style='border:0; border-top:1px solid #eee;'>
    <p><b>日経VI:</b> {vol}</p>
    <p><b>本日の予測レンジ:</b> {d_lower} ～ {d_upper}円</p>
    <p><b>週間予測レンジ:</b> {w_lower} ～ {w_upper}円</p>
</div>
"#,
        current = format_number(price.current, 0),
        color = color,
        amount = format_signed(change.amount, 0),
        percent = format_signed(change.percent, 2),
        vol = format_number(report.volatility.value, 2),
        d_lower = format_number(daily.lower, 0),
        d_upper = format_number(daily.upper, 0),
        w_lower = format_number(weekly.lower, 0),
        w_upper = format_number(weekly.upper, 0),
    )
}

/// 明细片段：先物建玉表和期权行权价阶梯
pub fn render_detail(report: &Report) -> String {
    let oi = &report.open_interest.value;
    let mut html = String::new();

    html.push_str("\n<div class='analysis-box'>\n");
    html.push_str("    <h3>■ 先物建玉状況</h3>\n");
    html.push_str("    <table style='width:100%; border-collapse: collapse; text-align:center;'>\n");
    let _ = writeln!(
        html,
        "        <tr style='background:#eee;'><th>銘柄</th><th>全体</th><th>{}</th></tr>",
        escape_html(&report.tenor_label)
    );
    for (label, all_key, month_key) in FUTURES_ROWS {
        let _ = writeln!(
            html,
            "        <tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            label,
            escape_html(oi.get(all_key)),
            escape_html(oi.get(month_key))
        );
    }
    html.push_str("    </table>\n");

    let _ = writeln!(
        html,
        "    <h3>■ オプション建玉 (ATM: {})</h3>",
        format_number(report.ladder.atm as f64, 0)
    );
    html.push_str("    <table style='width:100%; border-collapse: collapse; text-align:center;'>\n");
    html.push_str(
        "        <tr style='background:#eee;'><th>プット建玉</th><th>権利行使価格</th><th>コール建玉</th></tr>\n",
    );
    for level in &report.ladder.levels {
        let style = if level.is_atm {
            " style='background:#fff3cd; font-weight:bold;'"
        } else {
            ""
        };
        let _ = writeln!(
            html,
            "        <tr{}><td>{}</td><td>{}</td><td>{}</td></tr>",
            style,
            escape_html(&level.put_open_interest),
            format_number(level.strike as f64, 0),
            escape_html(&level.call_open_interest)
        );
    }
    html.push_str("    </table>\n");
    html.push_str("</div>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Acquired, OpenInterestSnapshot, PriceSnapshot, OPEN_INTEREST_KEYS};
    use crate::services::{ladder::build_strike_ladder, range::estimate_ranges};

    fn report(current: f64, previous: f64) -> Report {
        let price = PriceSnapshot {
            current,
            previous,
            ..PriceSnapshot::defaulted(current)
        };
        Report {
            ranges: estimate_ranges(current, 20.0, 20.0),
            ladder: build_strike_ladder(current, 500, 5000),
            price: Acquired::fresh(price, "test"),
            volatility: Acquired::fresh(20.0, "test"),
            open_interest: Acquired::fresh(
                OpenInterestSnapshot::uniform(OPEN_INTEREST_KEYS, "12,345"),
                "test",
            ),
            tenor_label: "3月限".to_string(),
        }
    }

    #[test]
    fn formats_thousands_and_decimals() {
        assert_eq!(format_number(38000.0, 0), "38,000");
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(999.6, 0), "1,000");
        assert_eq!(format_number(-1234.0, 0), "-1,234");
        assert_eq!(format_number(20.0, 2), "20.00");
        assert_eq!(format_number(0.0, 0), "0");
        assert_eq!(format_number(-0.2, 0), "0");
        assert_eq!(format_number(f64::NAN, 0), "-");
    }

    #[test]
    fn signed_format_always_has_sign() {
        assert_eq!(format_signed(250.4, 0), "+250");
        assert_eq!(format_signed(-1250.0, 0), "-1,250");
        assert_eq!(format_signed(0.0, 2), "+0.00");
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html("<b>&'\""), "&lt;b&gt;&amp;&#39;&quot;");
    }

    #[test]
    fn headline_shows_price_change_and_ranges() {
        let html = render_headline(&report(39500.0, 39000.0));
        assert!(html.contains("39,500円"));
        assert!(html.contains("<span style='color:red'>+500円 (+1.28%)</span>"));
        assert!(html.contains("<b>日経VI:</b> 20.00"));
        assert!(html.contains("本日の予測レンジ:</b> 39,000 ～ 40,000円"));
        assert!(html.contains("週間予測レンジ:</b> 38,404 ～ 40,596円"));
    }

    #[test]
    fn falling_price_is_blue() {
        let html = render_headline(&report(38000.0, 38400.0));
        assert!(html.contains("<span style='color:blue'>-400円 (-1.04%)</span>"));
    }

    #[test]
    fn detail_contains_open_interest_and_ladder() {
        let html = render_detail(&report(38250.0, 38250.0));
        assert_eq!(html.matches("12,345").count(), 6);
        assert!(html.contains("<th>3月限</th>"));
        assert!(html.contains("ATM: 38,500"));
        assert!(html.contains(
            "<tr style='background:#fff3cd; font-weight:bold;'><td>-</td><td>38,500</td><td>-</td></tr>"
        ));
        assert_eq!(html.matches("<td>-</td>").count(), 42);
    }
}
