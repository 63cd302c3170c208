//! 运行状态模型
//!
//! 每个组件都返回值和状态，状态汇总后写入 status.json，
//! 用来区分“降级但可用”和“数据正常”

use chrono::Utc;
use chrono_tz::Asia::Tokyo;
use serde::Serialize;

/// 获取东京时间（UTC+9）
pub fn get_tokyo_time() -> chrono::DateTime<chrono_tz::Tz> {
    Utc::now().with_timezone(&Tokyo)
}

/// 单个组件的数据状态
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DataStatus {
    /// 主数据源获取成功
    Fresh { source: String },
    /// 使用了备用数据源或备用策略
    Fallback { source: String, reason: String },
    /// 全部失败，使用内置默认值
    Defaulted { reason: String },
    /// 配置中关闭
    Disabled,
}

impl DataStatus {
    pub fn is_fresh(&self) -> bool {
        matches!(self, DataStatus::Fresh { .. })
    }
}

/// 组件的输出：值 + 状态 + 附加说明
#[derive(Debug, Clone, PartialEq)]
pub struct Acquired<T> {
    pub value: T,
    pub status: DataStatus,
    /// 例如两种提取策略结果不一致的说明
    pub notes: Vec<String>,
}

impl<T> Acquired<T> {
    pub fn fresh(value: T, source: impl Into<String>) -> Self {
        Self {
            value,
            status: DataStatus::Fresh {
                source: source.into(),
            },
            notes: Vec::new(),
        }
    }

    pub fn fallback(value: T, source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            value,
            status: DataStatus::Fallback {
                source: source.into(),
                reason: reason.into(),
            },
            notes: Vec::new(),
        }
    }

    pub fn defaulted(value: T, reason: impl Into<String>) -> Self {
        Self {
            value,
            status: DataStatus::Defaulted {
                reason: reason.into(),
            },
            notes: Vec::new(),
        }
    }

    pub fn disabled(value: T) -> Self {
        Self {
            value,
            status: DataStatus::Disabled,
            notes: Vec::new(),
        }
    }

    pub fn with_notes(mut self, notes: Vec<String>) -> Self {
        self.notes.extend(notes);
        self
    }

    /// 取出状态部分，用于汇总
    pub fn component(&self, name: &str) -> ComponentStatus {
        ComponentStatus {
            component: name.to_string(),
            status: self.status.clone(),
            notes: self.notes.clone(),
        }
    }
}

/// status.json 中的单个组件条目
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentStatus {
    pub component: String,
    #[serde(flatten)]
    pub status: DataStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

/// 一次运行的状态汇总
///
/// - success: 所有组件都是最新数据
/// - message: 概要说明
/// - timestamp: 生成时间（东京时间）
/// - components: 各组件状态
#[derive(Debug, Serialize)]
pub struct RunStatus {
    pub success: bool,
    pub message: String,
    pub timestamp: String,
    pub components: Vec<ComponentStatus>,
}

impl RunStatus {
    pub fn new(components: Vec<ComponentStatus>) -> Self {
        let degraded: Vec<&str> = components
            .iter()
            .filter(|c| !c.status.is_fresh() && c.status != DataStatus::Disabled)
            .map(|c| c.component.as_str())
            .collect();
        let message = if degraded.is_empty() {
            "Success".to_string()
        } else {
            format!("Degraded: {}", degraded.join(", "))
        };
        Self {
            success: degraded.is_empty(),
            message,
            timestamp: get_tokyo_time().to_rfc3339(),
            components,
        }
    }
}
