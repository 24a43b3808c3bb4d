use crate::full_math::mul_div;
use crate::tick_math::{ceil_tick, floor_tick, get_tick_at_sqrt_ratio};
use lp_types::{
    max_usable_tick, min_usable_tick, LpError, LpResult, PoolSnapshot, TickRange, MAX_SQRT_RATIO,
    MIN_SQRT_RATIO, RANGE_DENOMINATOR, U256,
};

/// Sqrt price multipliers `(upper, lower)` for a range covering `coverage`
/// of the current price on each side
///
/// `coverage` and the results are in `RANGE_DENOMINATOR` units:
/// `upper = floor(sqrt(1 + f) * 1e5)`, `lower = floor(sqrt(1 - f) * 1e5)`.
pub fn range_multipliers(coverage: u64) -> LpResult<(u64, u64)> {
    if coverage == 0 || coverage >= RANGE_DENOMINATOR {
        return Err(LpError::InvalidCoverage(coverage));
    }
    let upper = isqrt((RANGE_DENOMINATOR + coverage) * RANGE_DENOMINATOR);
    let lower = isqrt((RANGE_DENOMINATOR - coverage) * RANGE_DENOMINATOR);
    Ok((upper, lower))
}

/// Tick range around `sqrt_price_x96` scaled by the two multipliers,
/// widened outward to the tick spacing
pub fn derive_tick_range(
    sqrt_price_x96: U256,
    upper_multiplier: u64,
    lower_multiplier: u64,
    tick_spacing: i32,
) -> LpResult<TickRange> {
    if tick_spacing <= 0 {
        return Err(LpError::InvalidTickSpacing(tick_spacing));
    }
    if lower_multiplier == 0 || lower_multiplier >= upper_multiplier {
        return Err(LpError::InvalidCoverage(lower_multiplier));
    }

    let denominator = U256::from(RANGE_DENOMINATOR);
    let sqrt_upper = mul_div(sqrt_price_x96, U256::from(upper_multiplier), denominator)?;
    let sqrt_lower = mul_div(sqrt_price_x96, U256::from(lower_multiplier), denominator)?;

    let tick_upper = get_tick_at_sqrt_ratio(clamp_sqrt(sqrt_upper))?;
    let tick_lower = get_tick_at_sqrt_ratio(clamp_sqrt(sqrt_lower))?;

    let mut lower = floor_tick(tick_lower, tick_spacing)?.max(min_usable_tick(tick_spacing));
    let mut upper = align_up(tick_upper, tick_spacing)?.min(max_usable_tick(tick_spacing));

    // Both bounds rounded onto the same tick
    if lower >= upper {
        if upper + tick_spacing <= max_usable_tick(tick_spacing) {
            upper = lower + tick_spacing;
        } else {
            lower = upper - tick_spacing;
        }
    }

    TickRange::new(lower, upper, tick_spacing)
}

/// Range covering `coverage` (in `RANGE_DENOMINATOR` units) around the pool price
pub fn symmetric_range(pool: &PoolSnapshot, coverage: u64) -> LpResult<TickRange> {
    let (upper, lower) = range_multipliers(coverage)?;
    derive_tick_range(pool.sqrt_price_x96, upper, lower, pool.tick_spacing)
}

/// Range from `tick_lower` up to just below `tick_current`
///
/// The lower bound is floored onto the spacing; the upper bound is the
/// highest aligned tick strictly below the current tick, so the position
/// holds only token1.
pub fn skewed_lower_range(tick_lower: i32, tick_current: i32, tick_spacing: i32) -> LpResult<TickRange> {
    let lower = floor_tick(tick_lower, tick_spacing)?;
    let upper = floor_tick(tick_current - 1, tick_spacing)?;
    TickRange::new(lower, upper, tick_spacing)
}

/// Range from just above `tick_current` up to `tick_upper`
///
/// The lower bound is the first aligned tick above the current tick's
/// spacing bucket; the upper bound goes through `ceil_tick`.
pub fn skewed_upper_range(tick_upper: i32, tick_current: i32, tick_spacing: i32) -> LpResult<TickRange> {
    let lower = floor_tick(tick_current, tick_spacing)? + tick_spacing;
    let upper = ceil_tick(tick_upper, tick_spacing)?;
    TickRange::new(lower, upper, tick_spacing)
}

/// Smallest aligned tick `>= tick`
fn align_up(tick: i32, tick_spacing: i32) -> LpResult<i32> {
    let floored = floor_tick(tick, tick_spacing)?;
    if floored == tick {
        Ok(tick)
    } else {
        Ok(floored + tick_spacing)
    }
}

fn clamp_sqrt(sqrt_price_x96: U256) -> U256 {
    sqrt_price_x96.max(MIN_SQRT_RATIO).min(MAX_SQRT_RATIO - 1)
}

fn isqrt(value: u64) -> u64 {
    U256::from(value).integer_sqrt().low_u64()
}
