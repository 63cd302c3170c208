//! 先物建玉提取
//!
//! 按配置的坐标读取单元格；配置了行标签的键，同时按标签搜索一遍：
//! - 坐标为空或越界时使用标签搜索的结果
//! - 两者都有值但不一致时，保留坐标结果并记录分歧
//!
//! 任一键两种方式都取不到值，整张快照统一使用失败占位符

use anyhow::{anyhow, Result};
use std::collections::BTreeMap;

use super::render::format_number;
use super::sources::OpenInterestSource;
use crate::config::{CellSpec, OpenInterestConfig};
use crate::models::{Acquired, OpenInterestSnapshot, RawValue, Sheet, OPEN_INTEREST_KEYS, PLACEHOLDER_UNSET};

/// 提取结果
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub snapshot: OpenInterestSnapshot,
    /// 通过标签搜索补上的键
    pub label_keys: Vec<String>,
    /// 坐标与标签结果不一致的说明
    pub divergences: Vec<String>,
}

/// 获取先物建玉快照，失败不会中断流程
pub async fn fetch_open_interest<O: OpenInterestSource>(
    source: &O,
    config: &OpenInterestConfig,
) -> Acquired<OpenInterestSnapshot> {
    if !config.enabled {
        return Acquired::disabled(OpenInterestSnapshot::uniform(
            snapshot_keys(&config.cells),
            PLACEHOLDER_UNSET,
        ));
    }

    let failed = |reason: String| {
        log::warn!("⚠️ 建玉数据获取失败: {}", reason);
        Acquired::defaulted(
            OpenInterestSnapshot::uniform(snapshot_keys(&config.cells), &config.failed_placeholder),
            reason,
        )
    };

    let sheet = match source.fetch_sheet().await {
        Ok(sheet) => sheet,
        Err(e) => return failed(format!("{}: {:#}", source.name(), e)),
    };

    match extract_snapshot(&sheet, &config.cells) {
        Ok(extraction) => {
            log::info!("📊 建玉数据提取完成，共 {} 项", extraction.snapshot.values().len());
            let acquired = if extraction.label_keys.is_empty() {
                Acquired::fresh(extraction.snapshot, source.name())
            } else {
                Acquired::fallback(
                    extraction.snapshot,
                    "label-search",
                    format!("坐标为空，按标签取值: {}", extraction.label_keys.join(", ")),
                )
            };
            acquired.with_notes(extraction.divergences)
        }
        Err(e) => failed(format!("{}: {:#}", source.name(), e)),
    }
}

/// 从工作表中提取所有配置的键
pub fn extract_snapshot(sheet: &Sheet, cells: &[CellSpec]) -> Result<Extraction> {
    if cells.is_empty() {
        return Err(anyhow!("没有配置建玉单元格"));
    }

    let mut values = BTreeMap::new();
    let mut label_keys = Vec::new();
    let mut divergences = Vec::new();

    for spec in cells {
        let by_coord = sheet.cell(spec.row, spec.col).and_then(cell_display);
        let by_label = spec
            .label
            .as_deref()
            .and_then(|label| search_by_label(sheet, label, spec.col))
            .and_then(cell_display);

        let value = match (by_coord, by_label) {
            (Some(coord), Some(label)) => {
                if coord != label {
                    log::warn!(
                        "⚠️ {} 坐标({}, {})取值 {} 与标签取值 {} 不一致",
                        spec.key,
                        spec.row,
                        spec.col,
                        coord,
                        label
                    );
                    divergences.push(format!(
                        "{}: 坐标({}, {})={} 标签={}",
                        spec.key, spec.row, spec.col, coord, label
                    ));
                }
                coord
            }
            (Some(coord), None) => coord,
            (None, Some(label)) => {
                log::info!("{} 坐标为空，按标签取值 {}", spec.key, label);
                label_keys.push(spec.key.clone());
                label
            }
            (None, None) => {
                return Err(anyhow!(
                    "{} 的单元格({}, {})为空或越界",
                    spec.key,
                    spec.row,
                    spec.col
                ))
            }
        };

        values.insert(spec.key.clone(), value);
    }

    Ok(Extraction {
        snapshot: OpenInterestSnapshot::from_values(values),
        label_keys,
        divergences,
    })
}

/// 查找第一行包含标签的行，返回该行指定列的值
fn search_by_label<'a>(sheet: &'a Sheet, label: &str, col: u32) -> Option<&'a RawValue> {
    let origin_col = sheet.origin_col();
    sheet
        .rows()
        .find(|(_, row)| {
            row.iter()
                .any(|cell| matches!(cell, RawValue::Text(s) if s.contains(label)))
        })
        .and_then(|(_, row)| row.get(col.checked_sub(origin_col)? as usize))
}

/// 单元格的显示字符串
///
/// 数字按千位分隔格式化；文本只有整体是数字（可带符号或 △）时才格式化，
/// 其余文本原样保留
fn cell_display(cell: &RawValue) -> Option<String> {
    if cell.is_blank() {
        return None;
    }
    match cell {
        RawValue::Number(f) if !f.is_finite() => None,
        RawValue::Number(f) => Some(format_number(*f, 0)),
        RawValue::Text(s) => Some(match numeric_text(s) {
            Some(v) => format_number(v, 0),
            None => s.trim().to_string(),
        }),
        RawValue::Blank => None,
    }
}

/// 纯数字文本的数值：可选的 +、-、△、▲ 前缀，之后只有数字、千位逗号和小数点
///
/// △ 和 ▲ 表示负数
fn numeric_text(s: &str) -> Option<f64> {
    let s = s.trim();
    let first = s.chars().next()?;
    let rest = &s[first.len_utf8()..];
    let (negative, body) = match first {
        '-' | '△' | '▲' => (true, rest),
        '+' => (false, rest),
        _ => (false, s),
    };
    let body = body.trim_start();
    if !body.chars().any(|c| c.is_ascii_digit())
        || !body.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '.')
    {
        return None;
    }
    let value: f64 = body.replace(',', "").parse().ok()?;
    Some(if negative { -value } else { value })
}

/// 快照包含报表固定键和配置中的键
fn snapshot_keys(cells: &[CellSpec]) -> Vec<&str> {
    let mut keys: Vec<&str> = OPEN_INTEREST_KEYS.to_vec();
    for spec in cells {
        if !keys.contains(&spec.key.as_str()) {
            keys.push(spec.key.as_str());
        }
    }
    keys
}
