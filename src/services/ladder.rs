//! 期权行权价阶梯

use crate::models::{StrikeLadder, StrikeLevel, PLACEHOLDER_UNSET};

/// 以最接近的行权价为中心生成阶梯，从高到低排列
///
/// step=500、width=5000 时共 21 档；各档的建玉目前只有占位符
pub fn build_strike_ladder(price: f64, step: i64, width: i64) -> StrikeLadder {
    let step = step.max(1);
    let atm = if price.is_finite() {
        ((price / step as f64).round() as i64) * step
    } else {
        0
    };
    let levels_each_side = width.max(0) / step;

    let levels = (-levels_each_side..=levels_each_side)
        .rev()
        .map(|i| {
            let strike = atm + i * step;
            StrikeLevel {
                strike,
                is_atm: strike == atm,
                put_open_interest: PLACEHOLDER_UNSET.to_string(),
                call_open_interest: PLACEHOLDER_UNSET.to_string(),
            }
        })
        .collect();

    StrikeLadder { atm, levels }
}
