//! Fee growth accounting and APR estimation.
//!
//! Fee growth accumulators are Q128 per-unit-of-liquidity counters that only
//! ever increase modulo 2^256. The inside value of a range is derived from the
//! pool global and the two boundary ticks' "outside" values, and a position
//! earns `(inside_now - inside_before) * liquidity / 2^128`.

use crate::full_math::{mul_div, mul_div_rounding_up};
use crate::liquidity_math::{get_amounts_for_liquidity, max_liquidity_for_amounts};
use crate::tick_math::get_sqrt_ratio_at_tick;
use lp_types::{
    EngineConfig, FeeAmounts, FeeGrowthSnapshot, FeeWindow, LpError, LpResult, PoolSnapshot,
    TickRange, BPS_DENOMINATOR, Q128, Q96, U256,
};

/// Fee growth inside `range` for both tokens, as of the snapshot
///
/// Uses modular subtraction like the on-chain accumulator, so the result is
/// only meaningful as a difference between two snapshots.
pub fn fee_growth_inside(
    range: &TickRange,
    snapshot: &FeeGrowthSnapshot,
) -> LpResult<(U256, U256)> {
    range.validate()?;

    let inside_0 = growth_inside(
        range,
        snapshot.tick_current,
        snapshot.fee_growth_global_0_x128,
        snapshot.lower.fee_growth_outside_0_x128,
        snapshot.upper.fee_growth_outside_0_x128,
    )?;
    let inside_1 = growth_inside(
        range,
        snapshot.tick_current,
        snapshot.fee_growth_global_1_x128,
        snapshot.lower.fee_growth_outside_1_x128,
        snapshot.upper.fee_growth_outside_1_x128,
    )?;

    Ok((inside_0, inside_1))
}

fn growth_inside(
    range: &TickRange,
    tick_current: i32,
    global: U256,
    lower_outside: U256,
    upper_outside: U256,
) -> LpResult<U256> {
    // outside values are set from the global accumulator and can never lead it
    if lower_outside > global || upper_outside > global {
        return Err(LpError::StaleOrInconsistentSnapshot(
            "fee growth outside exceeds fee growth global",
        ));
    }

    // Fee growth below lower tick
    let below = if tick_current >= range.lower {
        lower_outside
    } else {
        global - lower_outside
    };

    // Fee growth above upper tick
    let above = if tick_current < range.upper {
        upper_outside
    } else {
        global - upper_outside
    };

    Ok(global.overflowing_sub(below).0.overflowing_sub(above).0)
}

/// Fees `liquidity` earned while fee growth inside moved from `before` to `now`
///
/// A token whose growth went backwards saturates at zero instead of being
/// read as a near-2^256 delta.
pub fn fees_earned_since(
    now: (U256, U256),
    before: (U256, U256),
    liquidity: u128,
) -> LpResult<FeeAmounts> {
    Ok(FeeAmounts {
        amount0: earned(now.0, before.0, liquidity, 0)?,
        amount1: earned(now.1, before.1, liquidity, 1)?,
    })
}

fn earned(now: U256, before: U256, liquidity: u128, token: u8) -> LpResult<U256> {
    if now < before {
        tracing::debug!(token, %now, %before, "fee growth went backwards, saturating to zero");
        return Ok(U256::zero());
    }
    mul_div(now - before, U256::from(liquidity), Q128)
}

/// Token0 price in token1 as Q96, rounded up
pub fn price_x96(sqrt_price_x96: U256) -> LpResult<U256> {
    mul_div_rounding_up(sqrt_price_x96, sqrt_price_x96, Q96)
}

/// Value of a token pair in token1 at `price_x96`
pub fn value_in_token1(amount0: U256, amount1: U256, price_x96: U256) -> LpResult<U256> {
    mul_div_rounding_up(amount0, price_x96, Q96)?
        .checked_add(amount1)
        .ok_or(LpError::ArithmeticOverflow)
}

/// Annualized return of `fees` on `principal` over `window_seconds`, in basis points
pub fn annualize(
    fees_in_token1: U256,
    principal_in_token1: U256,
    window_seconds: u64,
    seconds_per_year: u64,
) -> LpResult<U256> {
    if window_seconds == 0 || principal_in_token1.is_zero() {
        return Err(LpError::DivisionByZero);
    }
    let scale = U256::from(BPS_DENOMINATOR) * U256::from(seconds_per_year);
    let denominator = principal_in_token1
        .checked_mul(U256::from(window_seconds))
        .ok_or(LpError::ArithmeticOverflow)?;
    mul_div(fees_in_token1, scale, denominator)
}

/// Annualized fee yield of a range position
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AprEstimate {
    /// Fees earned over the window, valued in token1
    pub fees_in_token1: U256,
    /// Position value at the current price, in token1
    pub principal_in_token1: U256,
    /// Annualized rate in basis points
    pub rate_bps: U256,
}

impl AprEstimate {
    /// Nothing earned, used when the price sits outside the range
    pub fn zero() -> Self {
        Self {
            fees_in_token1: U256::zero(),
            principal_in_token1: U256::zero(),
            rate_bps: U256::zero(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.rate_bps.is_zero()
    }

    /// Rate as a percentage, e.g. `12.5` for 1250 bps
    pub fn percent(&self) -> f64 {
        if self.rate_bps > U256::from(u128::MAX) {
            return f64::INFINITY;
        }
        self.rate_bps.as_u128() as f64 / 100.0
    }
}

/// Estimate the APR `liquidity` would have earned in `window.range`
///
/// Returns `AprEstimate::zero()` when the current price is outside the range,
/// since no fees can be captured there.
pub fn estimate_apr(
    pool: &PoolSnapshot,
    window: &FeeWindow,
    liquidity: u128,
    seconds_per_year: u64,
) -> LpResult<AprEstimate> {
    window.range.validate_spacing(pool.tick_spacing)?;
    let sqrt_lower = get_sqrt_ratio_at_tick(window.range.lower)?;
    let sqrt_upper = get_sqrt_ratio_at_tick(window.range.upper)?;
    let sqrt_price = pool.sqrt_price_x96;

    if sqrt_price < sqrt_lower || sqrt_price > sqrt_upper {
        return Ok(AprEstimate::zero());
    }

    let inside_now = fee_growth_inside(&window.range, &window.now)?;
    let inside_before = fee_growth_inside(&window.range, &window.before)?;
    let fees = fees_earned_since(inside_now, inside_before, liquidity)?;

    let price = price_x96(sqrt_price)?;
    let fees_in_token1 = value_in_token1(fees.amount0, fees.amount1, price)?;

    let (amount0, amount1) = get_amounts_for_liquidity(sqrt_price, sqrt_lower, sqrt_upper, liquidity)?;
    let principal_in_token1 = value_in_token1(amount0, amount1, price)?;

    let rate_bps = annualize(
        fees_in_token1,
        principal_in_token1,
        window.window_seconds,
        seconds_per_year,
    )?;

    Ok(AprEstimate {
        fees_in_token1,
        principal_in_token1,
        rate_bps,
    })
}

/// APR of the position that `amount0` / `amount1` would mint at the current price
pub fn estimate_apr_for_amounts(
    pool: &PoolSnapshot,
    window: &FeeWindow,
    amount0: U256,
    amount1: U256,
    seconds_per_year: u64,
) -> LpResult<AprEstimate> {
    window.range.validate_spacing(pool.tick_spacing)?;
    let sqrt_lower = get_sqrt_ratio_at_tick(window.range.lower)?;
    let sqrt_upper = get_sqrt_ratio_at_tick(window.range.upper)?;
    if pool.sqrt_price_x96 < sqrt_lower || pool.sqrt_price_x96 > sqrt_upper {
        return Ok(AprEstimate::zero());
    }

    let liquidity = max_liquidity_for_amounts(
        pool.sqrt_price_x96,
        sqrt_lower,
        sqrt_upper,
        amount0,
        amount1,
        true,
    )?;
    estimate_apr(pool, window, liquidity, seconds_per_year)
}

/// APR of a token0-only deposit, sized as if minted at the range's lower bound
pub fn estimate_single_sided_token0_apr(
    pool: &PoolSnapshot,
    window: &FeeWindow,
    amount0: U256,
    seconds_per_year: u64,
) -> LpResult<AprEstimate> {
    let sqrt_lower = get_sqrt_ratio_at_tick(window.range.lower)?;
    let sqrt_upper = get_sqrt_ratio_at_tick(window.range.upper)?;
    let liquidity =
        max_liquidity_for_amounts(sqrt_lower, sqrt_lower, sqrt_upper, amount0, U256::zero(), true)?;
    estimate_apr(pool, window, liquidity, seconds_per_year)
}

/// APR of the range itself, priced with the configured probe liquidity
pub fn estimate_pool_range_apr(
    pool: &PoolSnapshot,
    window: &FeeWindow,
    config: &EngineConfig,
) -> LpResult<AprEstimate> {
    estimate_apr(pool, window, config.estimation_liquidity, config.seconds_per_year)
}
