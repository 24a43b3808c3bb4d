use primitive_types::U256;

use crate::{LpError, LpResult, MAX_TICK, MIN_TICK};

/// Tick bounds of a position, `lower < upper`
///
/// `TickRange::new` checks alignment to the pool's tick spacing. A range built
/// as a literal is only checked for ordering and bounds until an operation
/// that knows the pool calls `validate_spacing`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TickRange {
    pub lower: i32,
    pub upper: i32,
}

impl TickRange {
    /// Build a range whose bounds are ordered, in bounds and aligned to `tick_spacing`
    pub fn new(lower: i32, upper: i32, tick_spacing: i32) -> LpResult<Self> {
        let range = Self { lower, upper };
        range.validate_spacing(tick_spacing)?;
        Ok(range)
    }

    /// Check ordering and tick bounds
    pub fn validate(&self) -> LpResult<()> {
        if self.lower >= self.upper || self.lower < MIN_TICK || self.upper > MAX_TICK {
            return Err(LpError::InvalidTickRange {
                lower: self.lower,
                upper: self.upper,
            });
        }
        Ok(())
    }

    /// `validate` plus alignment of both bounds to `tick_spacing`
    pub fn validate_spacing(&self, tick_spacing: i32) -> LpResult<()> {
        if tick_spacing <= 0 {
            return Err(LpError::InvalidTickSpacing(tick_spacing));
        }
        self.validate()?;
        if self.lower % tick_spacing != 0 || self.upper % tick_spacing != 0 {
            return Err(LpError::InvalidTickRange {
                lower: self.lower,
                upper: self.upper,
            });
        }
        Ok(())
    }

    /// True if `tick` is inside `[lower, upper)`, where the range earns fees
    pub fn contains(&self, tick: i32) -> bool {
        tick >= self.lower && tick < self.upper
    }

    pub fn width(&self) -> i32 {
        self.upper - self.lower
    }
}

/// Token amounts, one per side of the pool
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FeeAmounts {
    pub amount0: U256,
    pub amount1: U256,
}

impl FeeAmounts {
    pub fn new(amount0: U256, amount1: U256) -> Self {
        Self { amount0, amount1 }
    }

    pub fn is_zero(&self) -> bool {
        self.amount0.is_zero() && self.amount1.is_zero()
    }
}

/// A liquidity position and the snapshot taken when it was opened
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    pub range: TickRange,
    /// Liquidity in this position
    pub liquidity: u128,
    /// Fee growth inside at last update (token0)
    pub fee_growth_inside_0_last_x128: U256,
    /// Fee growth inside at last update (token1)
    pub fee_growth_inside_1_last_x128: U256,
    /// Uncollected token0 (fees and burned principal)
    pub tokens_owed_0: U256,
    /// Uncollected token1 (fees and burned principal)
    pub tokens_owed_1: U256,
    /// Token0 deposited at open
    pub open_amount0: U256,
    /// Token1 deposited at open
    pub open_amount1: U256,
    /// Pool tick at open
    pub open_tick: i32,
}

/// Whether a position exists and is earning fees
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PositionStatus {
    /// Position exists and the pool tick is inside its range
    Open,
    /// Position exists but the pool tick left its range
    OutOfRange,
    /// No position is held
    Closed,
}

/// Drift of a position's token1 exposure since it was opened
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenDelta {
    /// No position: raw wallet balances
    Closed { balance0: U256, balance1: U256 },
    Open {
        open_amount1: U256,
        current_amount1: U256,
        /// Signed drift in parts per million
        delta_ratio_ppm: i64,
    },
}
