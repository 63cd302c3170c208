//! 数值清洗
//!
//! 把任意单元格值转换成浮点数。无法解析的值一律返回 0.0，
//! 调用方把 0.0 视为“缺失”，并按业务使用默认值

use crate::models::RawValue;

/// 清洗单元格值
///
/// 只保留数字、小数点和开头的负号；剩余部分无法解析、
/// 输入为空或结果不是有限数时返回 0.0
pub fn sanitize(raw: &RawValue) -> f64 {
    match raw {
        RawValue::Number(f) if f.is_finite() => *f,
        RawValue::Number(_) | RawValue::Blank => 0.0,
        RawValue::Text(s) => sanitize_str(s),
    }
}

pub fn sanitize_str(s: &str) -> f64 {
    let mut cleaned = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_digit() || c == '.' {
            cleaned.push(c);
        } else if c == '-' && cleaned.is_empty() {
            cleaned.push(c);
        }
    }

    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// 清洗后为 0.0 则视为缺失
pub fn sanitize_present(raw: &RawValue) -> Option<f64> {
    let v = sanitize(raw);
    if v == 0.0 {
        None
    } else {
        Some(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_separators_and_currency() {
        assert_eq!(sanitize_str("38,000円"), 38000.0);
        assert_eq!(sanitize_str("¥ 1,234.5"), 1234.5);
        assert_eq!(sanitize_str("  52,310 "), 52310.0);
    }

    #[test]
    fn keeps_only_leading_minus() {
        assert_eq!(sanitize_str("-1,250"), -1250.0);
        assert_eq!(sanitize_str("△-3"), -3.0);
        assert_eq!(sanitize_str("12-5"), 125.0);
    }

    #[test]
    fn unparseable_becomes_zero() {
        assert_eq!(sanitize_str("1.2.3"), 0.0);
        assert_eq!(sanitize_str("取得失敗"), 0.0);
        assert_eq!(sanitize_str("-"), 0.0);
        assert_eq!(sanitize_str(""), 0.0);
    }

    #[test]
    fn blank_and_non_finite_become_zero() {
        assert_eq!(sanitize(&RawValue::Blank), 0.0);
        assert_eq!(sanitize(&RawValue::Number(f64::NAN)), 0.0);
        assert_eq!(sanitize(&RawValue::Number(f64::INFINITY)), 0.0);
        assert_eq!(sanitize(&RawValue::Number(21.37)), 21.37);
    }

    #[test]
    fn zero_is_treated_as_absent() {
        assert_eq!(sanitize_present(&RawValue::from("0")), None);
        assert_eq!(sanitize_present(&RawValue::from("19.8")), Some(19.8));
    }
}
