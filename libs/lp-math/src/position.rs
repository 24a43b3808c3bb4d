//! Position checkpoint lifecycle.
//!
//! Every mutation first credits the fees earned since the last checkpoint to
//! `tokens_owed_*`, then records the new fee growth inside as the checkpoint.

use crate::fee_math::fees_earned_since;
use crate::liquidity_math::{add_delta, get_amounts_for_liquidity};
use crate::tick_math::get_sqrt_ratio_at_tick;
use lp_types::{FeeAmounts, LpError, LpResult, Position, TickRange, U256};

/// Create a position from a mint
///
/// `fee_growth_inside` is the range's fee growth at the mint and becomes the
/// first checkpoint.
pub fn open_position(
    range: TickRange,
    liquidity: u128,
    fee_growth_inside: (U256, U256),
    open_amounts: (U256, U256),
    open_tick: i32,
) -> LpResult<Position> {
    range.validate()?;
    Ok(Position {
        range,
        liquidity,
        fee_growth_inside_0_last_x128: fee_growth_inside.0,
        fee_growth_inside_1_last_x128: fee_growth_inside.1,
        tokens_owed_0: U256::zero(),
        tokens_owed_1: U256::zero(),
        open_amount0: open_amounts.0,
        open_amount1: open_amounts.1,
        open_tick,
    })
}

/// Credit fees earned since the last checkpoint and move the checkpoint to
/// `fee_growth_inside`
pub fn accrue_fees(position: &mut Position, fee_growth_inside: (U256, U256)) -> LpResult<FeeAmounts> {
    let fees = fees_earned_since(
        fee_growth_inside,
        (
            position.fee_growth_inside_0_last_x128,
            position.fee_growth_inside_1_last_x128,
        ),
        position.liquidity,
    )?;

    position.tokens_owed_0 = position
        .tokens_owed_0
        .checked_add(fees.amount0)
        .ok_or(LpError::ArithmeticOverflow)?;
    position.tokens_owed_1 = position
        .tokens_owed_1
        .checked_add(fees.amount1)
        .ok_or(LpError::ArithmeticOverflow)?;
    position.fee_growth_inside_0_last_x128 = fee_growth_inside.0;
    position.fee_growth_inside_1_last_x128 = fee_growth_inside.1;

    Ok(fees)
}

/// Add liquidity to an existing position
pub fn increase_liquidity(
    position: &mut Position,
    liquidity: u128,
    fee_growth_inside: (U256, U256),
) -> LpResult<()> {
    accrue_fees(position, fee_growth_inside)?;
    let delta = i128::try_from(liquidity).map_err(|_| LpError::ArithmeticOverflow)?;
    position.liquidity = add_delta(position.liquidity, delta)?;
    Ok(())
}

/// Remove liquidity at `sqrt_price_x96`
///
/// The burned principal is added to `tokens_owed_*` alongside the accrued
/// fees; nothing leaves the position until `collect`. Returns the principal.
pub fn decrease_liquidity(
    position: &mut Position,
    liquidity: u128,
    sqrt_price_x96: U256,
    fee_growth_inside: (U256, U256),
) -> LpResult<FeeAmounts> {
    if liquidity > position.liquidity {
        return Err(LpError::ArithmeticOverflow);
    }
    accrue_fees(position, fee_growth_inside)?;

    let sqrt_lower = get_sqrt_ratio_at_tick(position.range.lower)?;
    let sqrt_upper = get_sqrt_ratio_at_tick(position.range.upper)?;
    let (amount0, amount1) =
        get_amounts_for_liquidity(sqrt_price_x96, sqrt_lower, sqrt_upper, liquidity)?;

    position.liquidity -= liquidity;
    position.tokens_owed_0 = position
        .tokens_owed_0
        .checked_add(amount0)
        .ok_or(LpError::ArithmeticOverflow)?;
    position.tokens_owed_1 = position
        .tokens_owed_1
        .checked_add(amount1)
        .ok_or(LpError::ArithmeticOverflow)?;

    tracing::debug!(liquidity, %amount0, %amount1, "liquidity decreased");
    Ok(FeeAmounts::new(amount0, amount1))
}

/// Withdraw owed tokens, capped by what was requested
pub fn collect(position: &mut Position, amount0_requested: U256, amount1_requested: U256) -> FeeAmounts {
    let amount0 = amount0_requested.min(position.tokens_owed_0);
    let amount1 = amount1_requested.min(position.tokens_owed_1);

    position.tokens_owed_0 -= amount0;
    position.tokens_owed_1 -= amount1;

    FeeAmounts::new(amount0, amount1)
}

/// Burn all liquidity and collect everything owed
///
/// Returns principal plus fees. The position is consumed.
pub fn close(
    mut position: Position,
    sqrt_price_x96: U256,
    fee_growth_inside: (U256, U256),
) -> LpResult<FeeAmounts> {
    let liquidity = position.liquidity;
    decrease_liquidity(&mut position, liquidity, sqrt_price_x96, fee_growth_inside)?;
    Ok(collect(&mut position, U256::MAX, U256::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lp_types::{Q128, Q96};

    const LIQUIDITY: u128 = 1_000_000_000_000_000_000;

    fn range() -> TickRange {
        TickRange::new(-600, 600, 60).unwrap()
    }

    fn opened() -> Position {
        open_position(
            range(),
            LIQUIDITY,
            (Q128, Q128 * 2),
            (U256::from(1000u64), U256::from(2000u64)),
            0,
        )
        .unwrap()
    }

    // === open_position ===

    #[test]
    fn test_open_position_checkpoints() {
        let position = opened();
        assert_eq!(position.liquidity, LIQUIDITY);
        assert_eq!(position.fee_growth_inside_0_last_x128, Q128);
        assert_eq!(position.fee_growth_inside_1_last_x128, Q128 * 2);
        assert!(position.tokens_owed_0.is_zero());
        assert_eq!(position.open_amount1, U256::from(2000u64));
    }

    #[test]
    fn test_open_position_rejects_inverted_range() {
        let inverted = TickRange { lower: 600, upper: -600 };
        assert!(open_position(inverted, LIQUIDITY, (U256::zero(), U256::zero()), (U256::zero(), U256::zero()), 0).is_err());
    }

    // === accrue_fees ===

    #[test]
    fn test_accrue_fees_since_checkpoint() {
        let mut position = opened();
        // One unit of fee per unit of liquidity on token0, two on token1
        let fees = accrue_fees(&mut position, (Q128 * 2, Q128 * 4)).unwrap();
        assert_eq!(fees, FeeAmounts::new(U256::from(LIQUIDITY), U256::from(LIQUIDITY) * 2));
        assert_eq!(position.tokens_owed_0, U256::from(LIQUIDITY));
        assert_eq!(position.fee_growth_inside_0_last_x128, Q128 * 2);

        // Same growth again earns nothing
        let fees = accrue_fees(&mut position, (Q128 * 2, Q128 * 4)).unwrap();
        assert!(fees.is_zero());
        assert_eq!(position.tokens_owed_1, U256::from(LIQUIDITY) * 2);
    }

    // === increase_liquidity / decrease_liquidity ===

    #[test]
    fn test_increase_liquidity_accrues_first() {
        let mut position = opened();
        increase_liquidity(&mut position, LIQUIDITY, (Q128 * 2, Q128 * 2)).unwrap();
        assert_eq!(position.liquidity, LIQUIDITY * 2);
        // Fees were earned on the old liquidity only
        assert_eq!(position.tokens_owed_0, U256::from(LIQUIDITY));
        assert!(position.tokens_owed_1.is_zero());
    }

    #[test]
    fn test_decrease_liquidity_owes_principal() {
        let mut position = opened();
        let principal =
            decrease_liquidity(&mut position, LIQUIDITY / 2, Q96, (Q128, Q128 * 2)).unwrap();
        assert_eq!(position.liquidity, LIQUIDITY / 2);
        assert!(!principal.amount0.is_zero());
        assert!(!principal.amount1.is_zero());
        assert_eq!(position.tokens_owed_0, principal.amount0);
        assert_eq!(position.tokens_owed_1, principal.amount1);
    }

    #[test]
    fn test_decrease_liquidity_rejects_excess() {
        let mut position = opened();
        assert_eq!(
            decrease_liquidity(&mut position, LIQUIDITY + 1, Q96, (Q128, Q128 * 2)),
            Err(LpError::ArithmeticOverflow)
        );
        assert_eq!(position, opened());
    }

    // === collect / close ===

    #[test]
    fn test_collect_is_capped() {
        let mut position = opened();
        accrue_fees(&mut position, (Q128 * 2, Q128 * 2)).unwrap();
        let taken = collect(&mut position, U256::from(100u64), U256::from(100u64));
        assert_eq!(taken, FeeAmounts::new(U256::from(100u64), U256::zero()));
        assert_eq!(position.tokens_owed_0, U256::from(LIQUIDITY - 100));
    }

    #[test]
    fn test_close_returns_principal_and_fees() {
        let position = opened();
        let out = close(position, Q96, (Q128 * 2, Q128 * 2)).unwrap();

        let sqrt_lower = get_sqrt_ratio_at_tick(-600).unwrap();
        let sqrt_upper = get_sqrt_ratio_at_tick(600).unwrap();
        let (principal0, principal1) =
            get_amounts_for_liquidity(Q96, sqrt_lower, sqrt_upper, LIQUIDITY).unwrap();
        assert_eq!(out.amount0, principal0 + U256::from(LIQUIDITY));
        assert_eq!(out.amount1, principal1);
    }
}
