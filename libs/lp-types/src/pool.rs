use primitive_types::U256;

use crate::{Fee, TickRange};

/// Read-only pool state captured once by the caller
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolSnapshot {
    /// Current sqrt(price) as Q64.96
    pub sqrt_price_x96: U256,
    /// Current tick index
    pub tick: i32,
    /// Tick spacing of the pool
    pub tick_spacing: i32,
    /// Liquidity currently in range
    pub liquidity: u128,
    /// Fee tier in hundredths of bps
    pub fee: Fee,
    /// Fee growth global for token0 (Q128.128)
    pub fee_growth_global_0_x128: U256,
    /// Fee growth global for token1 (Q128.128)
    pub fee_growth_global_1_x128: U256,
}

impl PoolSnapshot {
    pub fn new(sqrt_price_x96: U256, tick: i32, tick_spacing: i32, liquidity: u128) -> Self {
        Self {
            sqrt_price_x96,
            tick,
            tick_spacing,
            liquidity,
            fee: 0,
            fee_growth_global_0_x128: U256::zero(),
            fee_growth_global_1_x128: U256::zero(),
        }
    }

    pub fn with_fee(mut self, fee: Fee) -> Self {
        self.fee = fee;
        self
    }

    pub fn with_fee_growth(mut self, global_0_x128: U256, global_1_x128: U256) -> Self {
        self.fee_growth_global_0_x128 = global_0_x128;
        self.fee_growth_global_1_x128 = global_1_x128;
        self
    }
}

/// Fee growth recorded on the far side of an initialized tick
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickFeeSnapshot {
    pub fee_growth_outside_0_x128: U256,
    pub fee_growth_outside_1_x128: U256,
}

impl TickFeeSnapshot {
    pub fn new(fee_growth_outside_0_x128: U256, fee_growth_outside_1_x128: U256) -> Self {
        Self {
            fee_growth_outside_0_x128,
            fee_growth_outside_1_x128,
        }
    }
}

/// Fee accumulators for one tick range at one point in time.
///
/// Taking one of these at the current block and one at a historical block
/// gives the fee growth a range earned over the window between them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FeeGrowthSnapshot {
    pub tick_current: i32,
    pub fee_growth_global_0_x128: U256,
    pub fee_growth_global_1_x128: U256,
    /// Boundary state of the range's lower tick
    pub lower: TickFeeSnapshot,
    /// Boundary state of the range's upper tick
    pub upper: TickFeeSnapshot,
}

impl FeeGrowthSnapshot {
    /// Combine pool globals with the two boundary tick snapshots
    pub fn from_pool(pool: &PoolSnapshot, lower: TickFeeSnapshot, upper: TickFeeSnapshot) -> Self {
        Self {
            tick_current: pool.tick,
            fee_growth_global_0_x128: pool.fee_growth_global_0_x128,
            fee_growth_global_1_x128: pool.fee_growth_global_1_x128,
            lower,
            upper,
        }
    }
}

/// Two fee snapshots of the same range bracketing a time window
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeeWindow {
    pub range: TickRange,
    pub now: FeeGrowthSnapshot,
    pub before: FeeGrowthSnapshot,
    /// Elapsed seconds between `before` and `now`
    pub window_seconds: u64,
}
