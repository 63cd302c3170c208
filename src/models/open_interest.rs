//! 建玉数据模型

use serde::Serialize;
use std::collections::BTreeMap;

use super::RawValue;

/// 报表固定使用的建玉键
pub const OPEN_INTEREST_KEYS: [&str; 6] = [
    "large_all",
    "large_mar",
    "mini_all",
    "mini_mar",
    "topix_all",
    "topix_mar",
];

/// 未填充
pub const PLACEHOLDER_UNSET: &str = "-";

/// 建玉快照：键到显示字符串的映射
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenInterestSnapshot {
    values: BTreeMap<String, String>,
}

impl OpenInterestSnapshot {
    /// 所有键都设置为同一个占位符
    pub fn uniform<'a, I>(keys: I, placeholder: &str) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self {
            values: keys
                .into_iter()
                .map(|k| (k.to_string(), placeholder.to_string()))
                .collect(),
        }
    }

    pub fn from_values(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }

    /// 未知的键显示为 "-"
    pub fn get(&self, key: &str) -> &str {
        self.values
            .get(key)
            .map(String::as_str)
            .unwrap_or(PLACEHOLDER_UNSET)
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }
}

/// 无表头的工作表
///
/// 单元格按 0 起始的绝对坐标寻址；calamine 的区域可能不从 A1 开始，
/// 所以记录区域左上角的偏移
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    origin: (u32, u32),
    rows: Vec<Vec<RawValue>>,
}

impl Sheet {
    pub fn new(origin: (u32, u32), rows: Vec<Vec<RawValue>>) -> Self {
        Self { origin, rows }
    }

    /// 按绝对坐标读取，越界返回 None
    pub fn cell(&self, row: u32, col: u32) -> Option<&RawValue> {
        let r = row.checked_sub(self.origin.0)? as usize;
        let c = col.checked_sub(self.origin.1)? as usize;
        self.rows.get(r)?.get(c)
    }

    /// 遍历每一行，附带绝对行号
    pub fn rows(&self) -> impl Iterator<Item = (u32, &[RawValue])> {
        let origin_row = self.origin.0;
        self.rows
            .iter()
            .enumerate()
            .map(move |(i, row)| (origin_row + i as u32, row.as_slice()))
    }

    /// 区域的左上角列号
    pub fn origin_col(&self) -> u32 {
        self.origin.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_snapshot_fills_every_key() {
        let snapshot = OpenInterestSnapshot::uniform(OPEN_INTEREST_KEYS, "取得失敗");
        for key in OPEN_INTEREST_KEYS {
            assert_eq!(snapshot.get(key), "取得失敗");
        }
        assert_eq!(snapshot.get("unknown"), PLACEHOLDER_UNSET);
    }

    #[test]
    fn sheet_cells_use_absolute_positions() {
        let sheet = Sheet::new(
            (2, 1),
            vec![vec![RawValue::from("a"), RawValue::Number(1.0)]],
        );
        assert_eq!(sheet.cell(2, 2), Some(&RawValue::Number(1.0)));
        assert_eq!(sheet.cell(0, 0), None);
        assert_eq!(sheet.cell(3, 1), None);
        let rows: Vec<u32> = sheet.rows().map(|(i, _)| i).collect();
        assert_eq!(rows, vec![2]);
    }
}
