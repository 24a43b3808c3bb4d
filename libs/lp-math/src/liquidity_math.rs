use crate::full_math::{mul_div, to_u128};
use crate::sqrt_price_math::{get_amount0_delta, get_amount1_delta};
use crate::tick_math::get_sqrt_ratio_at_tick;
use lp_types::{LpError, LpResult, TickRange, Q96, U256, U512};

fn sorted(a: U256, b: U256) -> (U256, U256) {
    if a > b {
        (b, a)
    } else {
        (a, b)
    }
}

/// Maximum liquidity a position can take without spending more than
/// `amount0` / `amount1`
///
/// Below the range only token0 binds, above it only token1 binds, inside
/// it both bind and the smaller liquidity wins. `full_precision` selects the
/// single-division token0 formula; the other keeps the intermediate
/// `sqrt_a * sqrt_b / Q96` rounding. Both round down.
pub fn max_liquidity_for_amounts(
    sqrt_ratio_x96: U256,
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    amount0: U256,
    amount1: U256,
    full_precision: bool,
) -> LpResult<u128> {
    let (sqrt_ratio_lower, sqrt_ratio_upper) = sorted(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    if sqrt_ratio_lower == sqrt_ratio_upper {
        return Err(LpError::DivisionByZero);
    }

    let liquidity = if sqrt_ratio_x96 <= sqrt_ratio_lower {
        // Current price below range - all token0
        get_liquidity_for_amount0(sqrt_ratio_lower, sqrt_ratio_upper, amount0, full_precision)?
    } else if sqrt_ratio_x96 < sqrt_ratio_upper {
        // Current price in range - both tokens
        let liquidity0 =
            get_liquidity_for_amount0(sqrt_ratio_x96, sqrt_ratio_upper, amount0, full_precision)?;
        let liquidity1 = get_liquidity_for_amount1(sqrt_ratio_lower, sqrt_ratio_x96, amount1)?;
        liquidity0.min(liquidity1)
    } else {
        // Current price above range - all token1
        get_liquidity_for_amount1(sqrt_ratio_lower, sqrt_ratio_upper, amount1)?
    };

    to_u128(liquidity)
}

/// Calculate liquidity from amount0
/// L = amount0 * sqrt_pa * sqrt_pb / (sqrt_pb - sqrt_pa)
pub fn get_liquidity_for_amount0(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    amount0: U256,
    full_precision: bool,
) -> LpResult<U256> {
    let (sqrt_ratio_lower, sqrt_ratio_upper) = sorted(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    let width = sqrt_ratio_upper - sqrt_ratio_lower;

    if full_precision {
        let numerator = amount0
            .full_mul(sqrt_ratio_lower)
            .checked_mul(U512::from(sqrt_ratio_upper))
            .ok_or(LpError::ArithmeticOverflow)?;
        let denominator = Q96.full_mul(width);
        if denominator.is_zero() {
            return Err(LpError::DivisionByZero);
        }
        U256::try_from(numerator / denominator).map_err(|_| LpError::ArithmeticOverflow)
    } else {
        let intermediate = mul_div(sqrt_ratio_lower, sqrt_ratio_upper, Q96)?;
        mul_div(amount0, intermediate, width)
    }
}

/// Calculate liquidity from amount1
/// L = amount1 / (sqrt_pb - sqrt_pa)
pub fn get_liquidity_for_amount1(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    amount1: U256,
) -> LpResult<U256> {
    let (sqrt_ratio_lower, sqrt_ratio_upper) = sorted(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    mul_div(amount1, Q96, sqrt_ratio_upper - sqrt_ratio_lower)
}

/// Token amounts held by `liquidity` over a price range at the current price,
/// rounded down
pub fn get_amounts_for_liquidity(
    sqrt_ratio_x96: U256,
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    liquidity: u128,
) -> LpResult<(U256, U256)> {
    let (sqrt_ratio_lower, sqrt_ratio_upper) = sorted(sqrt_ratio_a_x96, sqrt_ratio_b_x96);

    if sqrt_ratio_x96 <= sqrt_ratio_lower {
        // Below range - all token0
        let amount0 = get_amount0_delta(sqrt_ratio_lower, sqrt_ratio_upper, liquidity, false)?;
        Ok((amount0, U256::zero()))
    } else if sqrt_ratio_x96 < sqrt_ratio_upper {
        // In range - both tokens
        let amount0 = get_amount0_delta(sqrt_ratio_x96, sqrt_ratio_upper, liquidity, false)?;
        let amount1 = get_amount1_delta(sqrt_ratio_lower, sqrt_ratio_x96, liquidity, false)?;
        Ok((amount0, amount1))
    } else {
        // Above range - all token1
        let amount1 = get_amount1_delta(sqrt_ratio_lower, sqrt_ratio_upper, liquidity, false)?;
        Ok((U256::zero(), amount1))
    }
}

/// Add signed liquidity delta to unsigned liquidity
pub fn add_delta(liquidity: u128, delta: i128) -> LpResult<u128> {
    if delta < 0 {
        liquidity
            .checked_sub(delta.unsigned_abs())
            .ok_or(LpError::ArithmeticOverflow)
    } else {
        liquidity
            .checked_add(delta as u128)
            .ok_or(LpError::ArithmeticOverflow)
    }
}

/// Composition of a position at one tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickBalance {
    pub tick: i32,
    pub amount0: U256,
    pub amount1: U256,
}

/// Ticks from `range.lower` to `range.upper` in `step` increments, both
/// bounds included
pub(crate) fn range_ticks(range: &TickRange, step: i32) -> LpResult<Vec<i32>> {
    range.validate()?;
    if step <= 0 {
        return Err(LpError::InvalidTickSpacing(step));
    }

    let mut ticks = Vec::with_capacity((range.width() / step) as usize + 2);
    let mut tick = range.lower;
    loop {
        ticks.push(tick);
        if tick == range.upper {
            break;
        }
        tick = tick.saturating_add(step).min(range.upper);
    }
    Ok(ticks)
}

/// Amounts a position holds at every `step`-th tick across its range, both
/// bounds included
///
/// Walking the curve shows how the position converts from all token0 at the
/// lower bound to all token1 at the upper bound.
pub fn balances_across_range(
    range: &TickRange,
    liquidity: u128,
    step: i32,
) -> LpResult<Vec<TickBalance>> {
    let ticks = range_ticks(range, step)?;
    let sqrt_lower = get_sqrt_ratio_at_tick(range.lower)?;
    let sqrt_upper = get_sqrt_ratio_at_tick(range.upper)?;

    ticks
        .into_iter()
        .map(|tick| {
            let sqrt = get_sqrt_ratio_at_tick(tick)?;
            let (amount0, amount1) =
                get_amounts_for_liquidity(sqrt, sqrt_lower, sqrt_upper, liquidity)?;
            Ok(TickBalance {
                tick,
                amount0,
                amount1,
            })
        })
        .collect()
}

/// `balances_across_range` for the position `amount0` / `amount1` would mint
/// at `open_tick`
pub fn balances_for_amounts(
    range: &TickRange,
    open_tick: i32,
    amount0: U256,
    amount1: U256,
    step: i32,
) -> LpResult<Vec<TickBalance>> {
    range.validate()?;
    let liquidity = max_liquidity_for_amounts(
        get_sqrt_ratio_at_tick(open_tick)?,
        get_sqrt_ratio_at_tick(range.lower)?,
        get_sqrt_ratio_at_tick(range.upper)?,
        amount0,
        amount1,
        true,
    )?;
    balances_across_range(range, liquidity, step)
}
