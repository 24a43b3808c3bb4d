//! Read-only view over a vault: the pool, the position it holds (if any) and
//! the idle wallet balances.

use crate::fee_math::{fee_growth_inside, fees_earned_since};
use crate::full_math::{mul_div, to_u128};
use crate::liquidity_math::get_amounts_for_liquidity;
use crate::tick_math::get_sqrt_ratio_at_tick;
use lp_types::{
    FeeAmounts, FeeGrowthSnapshot, LpError, LpResult, PoolSnapshot, Position, PositionStatus,
    TokenDelta, U256,
};

/// Parts-per-million scale of `TokenDelta::Open::delta_ratio_ppm`
pub const DELTA_RATIO_SCALE: u64 = 1_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PositionMonitor {
    pub pool: PoolSnapshot,
    pub position: Option<Position>,
    pub balance0: U256,
    pub balance1: U256,
}

impl PositionMonitor {
    pub fn new(pool: PoolSnapshot, position: Option<Position>, balance0: U256, balance1: U256) -> Self {
        Self {
            pool,
            position,
            balance0,
            balance1,
        }
    }

    pub fn status(&self) -> PositionStatus {
        match &self.position {
            None => PositionStatus::Closed,
            Some(position) if position.range.contains(self.pool.tick) => PositionStatus::Open,
            Some(_) => PositionStatus::OutOfRange,
        }
    }

    /// Token amounts the position is worth at the live price, or the wallet
    /// balances when no position is held
    pub fn current_amounts(&self) -> LpResult<(U256, U256)> {
        match &self.position {
            None => Ok((self.balance0, self.balance1)),
            Some(position) => self.amounts_at(position, self.pool.sqrt_price_x96),
        }
    }

    fn amounts_at(&self, position: &Position, sqrt_price_x96: U256) -> LpResult<(U256, U256)> {
        let sqrt_lower = get_sqrt_ratio_at_tick(position.range.lower)?;
        let sqrt_upper = get_sqrt_ratio_at_tick(position.range.upper)?;
        get_amounts_for_liquidity(sqrt_price_x96, sqrt_lower, sqrt_upper, position.liquidity)
    }

    /// How far the position's token1 holdings drifted since open
    ///
    /// A loss of token1 is measured against the opening amount; a gain is
    /// measured against the most the position can hold (everything converted
    /// to token1 at the upper bound). Both ends therefore map to ±1_000_000.
    pub fn token_amount_delta(&self) -> LpResult<TokenDelta> {
        let position = match &self.position {
            None => {
                return Ok(TokenDelta::Closed {
                    balance0: self.balance0,
                    balance1: self.balance1,
                })
            }
            Some(position) => position,
        };

        let (_, current1) = self.current_amounts()?;
        let open1 = position.open_amount1;
        let scale = U256::from(DELTA_RATIO_SCALE);

        let delta_ratio_ppm = if current1 < open1 {
            let magnitude = mul_div(open1 - current1, scale, open1)?;
            -i64::try_from(to_u128(magnitude)?).map_err(|_| LpError::ArithmeticOverflow)?
        } else {
            let sqrt_upper = get_sqrt_ratio_at_tick(position.range.upper)?;
            let (_, upper1) = self.amounts_at(position, sqrt_upper)?;
            if upper1 <= open1 {
                0
            } else {
                let magnitude = mul_div(current1 - open1, scale, upper1 - open1)?;
                i64::try_from(to_u128(magnitude)?).map_err(|_| LpError::ArithmeticOverflow)?
            }
        };

        Ok(TokenDelta::Open {
            open_amount1: open1,
            current_amount1: current1,
            delta_ratio_ppm,
        })
    }

    /// Tokens owed plus fees accrued since the position's last checkpoint
    pub fn unclaimed_fees(&self, snapshot: &FeeGrowthSnapshot) -> LpResult<FeeAmounts> {
        let position = match &self.position {
            None => return Ok(FeeAmounts::default()),
            Some(position) => position,
        };

        let inside = fee_growth_inside(&position.range, snapshot)?;
        let accrued = fees_earned_since(
            inside,
            (
                position.fee_growth_inside_0_last_x128,
                position.fee_growth_inside_1_last_x128,
            ),
            position.liquidity,
        )?;

        Ok(FeeAmounts::new(
            position
                .tokens_owed_0
                .checked_add(accrued.amount0)
                .ok_or(LpError::ArithmeticOverflow)?,
            position
                .tokens_owed_1
                .checked_add(accrued.amount1)
                .ok_or(LpError::ArithmeticOverflow)?,
        ))
    }

    /// Whether the token1 drift reached `threshold_ppm` in either direction
    pub fn needs_rebalance(&self, threshold_ppm: u64) -> LpResult<bool> {
        match self.token_amount_delta()? {
            TokenDelta::Closed { .. } => Ok(false),
            TokenDelta::Open {
                delta_ratio_ppm, ..
            } => {
                let needed = delta_ratio_ppm.unsigned_abs() >= threshold_ppm;
                if needed {
                    tracing::debug!(delta_ratio_ppm, threshold_ppm, "position drifted past threshold");
                }
                Ok(needed)
            }
        }
    }
}
