//! 波动率指数获取

use super::sanitize::sanitize_present;
use super::sources::VolatilitySource;
use crate::models::{Acquired, RawValue};

/// 获取最新的波动率读数
///
/// 获取失败、结果为空或读数为 0 时使用默认值，调用方总能拿到可用的数值
pub async fn fetch_volatility<V: VolatilitySource>(source: &V, default_value: f64) -> Acquired<f64> {
    match source.fetch_readings().await {
        Ok(readings) => match latest_reading(&readings) {
            Some(v) => {
                log::info!("📊 波动率读数: {:.2}", v);
                Acquired::fresh(v, source.name())
            }
            None => {
                log::warn!("⚠️ {} 没有有效的波动率读数，使用默认值 {}", source.name(), default_value);
                Acquired::defaulted(default_value, format!("{}: 没有有效读数", source.name()))
            }
        },
        Err(e) => {
            log::warn!("⚠️ 获取波动率失败: {:#}，使用默认值 {}", e, default_value);
            Acquired::defaulted(default_value, format!("{}: {:#}", source.name(), e))
        }
    }
}

/// 最后一个有效的正读数
pub fn latest_reading(readings: &[RawValue]) -> Option<f64> {
    readings
        .iter()
        .rev()
        .filter_map(sanitize_present)
        .find(|v| *v > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DataStatus;
    use anyhow::{anyhow, Result};

    struct Readings(Result<Vec<RawValue>, String>);

    impl VolatilitySource for Readings {
        fn name(&self) -> &str {
            "readings"
        }

        async fn fetch_readings(&self) -> Result<Vec<RawValue>> {
            self.0.clone().map_err(|e| anyhow!(e))
        }
    }

    #[test]
    fn skips_trailing_gaps() {
        let readings = vec![
            RawValue::Number(21.5),
            RawValue::Number(22.75),
            RawValue::Blank,
        ];
        assert_eq!(latest_reading(&readings), Some(22.75));
        assert_eq!(latest_reading(&[]), None);
    }

    #[tokio::test]
    async fn fresh_reading_is_used() {
        let source = Readings(Ok(vec![RawValue::from("23.10")]));
        let result = fetch_volatility(&source, 20.0).await;
        assert_eq!(result.value, 23.1);
        assert!(result.status.is_fresh());
    }

    #[tokio::test]
    async fn zero_reading_is_replaced_by_default() {
        let source = Readings(Ok(vec![RawValue::Number(0.0)]));
        let result = fetch_volatility(&source, 20.0).await;
        assert_eq!(result.value, 20.0);
        assert!(matches!(result.status, DataStatus::Defaulted { .. }));
    }

    #[tokio::test]
    async fn failure_is_replaced_by_default() {
        let source = Readings(Err("timeout".to_string()));
        let result = fetch_volatility(&source, 20.0).await;
        assert_eq!(result.value, 20.0);
        assert!(matches!(result.status, DataStatus::Defaulted { ref reason } if reason.contains("timeout")));
    }
}
