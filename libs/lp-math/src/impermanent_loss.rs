//! Impermanent loss of single-sided positions.
//!
//! A single-sided deposit starts at the range bound where it holds only the
//! deposited token. Walking the price across the range shows how much of that
//! token has been converted and what the conversion cost once the other token
//! is swapped back at the walked price, less a swap cost in basis points.

use crate::full_math::{mul_div, to_u128};
use crate::liquidity_math::{get_amounts_for_liquidity, max_liquidity_for_amounts, range_ticks};
use crate::tick_math::get_sqrt_ratio_at_tick;
use lp_types::{LpError, LpResult, TickRange, BPS_DENOMINATOR, Q96, U256};

/// Position state at one tick of a single-sided walk
///
/// `delta` and `loss` are in units of the deposited token. A positive loss
/// means the position is worth less than the untouched deposit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickLoss {
    pub tick: i32,
    pub amount0: U256,
    pub amount1: U256,
    /// Deposited token converted away since the start bound
    pub delta: i128,
    /// `delta` minus the swapped-back value of the other token
    pub loss: i128,
}

fn to_i128(value: U256) -> LpResult<i128> {
    i128::try_from(to_u128(value)?).map_err(|_| LpError::ArithmeticOverflow)
}

fn signed_sub(a: U256, b: U256) -> LpResult<i128> {
    if a >= b {
        to_i128(a - b)
    } else {
        Ok(-to_i128(b - a)?)
    }
}

/// `value` after paying `swap_loss_bps` to convert it
fn after_swap_loss(value: U256, swap_loss_bps: u32) -> LpResult<U256> {
    let denominator = U256::from(BPS_DENOMINATOR) + U256::from(swap_loss_bps);
    mul_div(value, U256::from(BPS_DENOMINATOR), denominator)
}

fn single_side_liquidity(
    range: &TickRange,
    at_tick: i32,
    amount0: U256,
    amount1: U256,
) -> LpResult<u128> {
    range.validate()?;
    let liquidity = max_liquidity_for_amounts(
        get_sqrt_ratio_at_tick(at_tick)?,
        get_sqrt_ratio_at_tick(range.lower)?,
        get_sqrt_ratio_at_tick(range.upper)?,
        amount0,
        amount1,
        true,
    )?;
    if liquidity == 0 {
        return Err(LpError::EmptyBalances);
    }
    Ok(liquidity)
}

/// Walk a token1-only deposit, minted at the upper bound, down the range
pub fn single_side_token1_losses(
    range: &TickRange,
    amount1: U256,
    swap_loss_bps: u32,
    step: i32,
) -> LpResult<Vec<TickLoss>> {
    let liquidity = single_side_liquidity(range, range.upper, U256::zero(), amount1)?;
    let sqrt_lower = get_sqrt_ratio_at_tick(range.lower)?;
    let sqrt_upper = get_sqrt_ratio_at_tick(range.upper)?;
    let (_, start1) = get_amounts_for_liquidity(sqrt_upper, sqrt_lower, sqrt_upper, liquidity)?;

    range_ticks(range, step)?
        .into_iter()
        .map(|tick| {
            let sqrt = get_sqrt_ratio_at_tick(tick)?;
            let (amount0, amount1) =
                get_amounts_for_liquidity(sqrt, sqrt_lower, sqrt_upper, liquidity)?;
            let delta = signed_sub(start1, amount1)?;
            // token0 sold back for token1 at this tick's price
            let in_token1 = mul_div(mul_div(amount0, sqrt, Q96)?, sqrt, Q96)?;
            let recovered = to_i128(after_swap_loss(in_token1, swap_loss_bps)?)?;
            Ok(TickLoss {
                tick,
                amount0,
                amount1,
                delta,
                loss: delta.checked_sub(recovered).ok_or(LpError::ArithmeticOverflow)?,
            })
        })
        .collect()
}

/// Walk a token0-only deposit, minted at the lower bound, up the range
pub fn single_side_token0_losses(
    range: &TickRange,
    amount0: U256,
    swap_loss_bps: u32,
    step: i32,
) -> LpResult<Vec<TickLoss>> {
    let liquidity = single_side_liquidity(range, range.lower, amount0, U256::zero())?;
    let sqrt_lower = get_sqrt_ratio_at_tick(range.lower)?;
    let sqrt_upper = get_sqrt_ratio_at_tick(range.upper)?;
    let (start0, _) = get_amounts_for_liquidity(sqrt_lower, sqrt_lower, sqrt_upper, liquidity)?;

    range_ticks(range, step)?
        .into_iter()
        .map(|tick| {
            let sqrt = get_sqrt_ratio_at_tick(tick)?;
            let (amount0, amount1) =
                get_amounts_for_liquidity(sqrt, sqrt_lower, sqrt_upper, liquidity)?;
            let delta = signed_sub(start0, amount0)?;
            // token1 bought back into token0 at this tick's price
            let in_token0 = mul_div(mul_div(amount1, Q96, sqrt)?, Q96, sqrt)?;
            let recovered = to_i128(after_swap_loss(in_token0, swap_loss_bps)?)?;
            Ok(TickLoss {
                tick,
                amount0,
                amount1,
                delta,
                loss: delta.checked_sub(recovered).ok_or(LpError::ArithmeticOverflow)?,
            })
        })
        .collect()
}
