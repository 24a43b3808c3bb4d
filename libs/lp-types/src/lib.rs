//! Plain data shared by the position and rebalance math: protocol constants,
//! pool and position snapshots, quotes, errors and engine configuration.

mod config;
mod error;
mod pool;
mod position;
mod quote;

pub use config::*;
pub use error::*;
pub use pool::*;
pub use position::*;
pub use quote::*;

pub use primitive_types::{U256, U512};

/// Q96 constant (2^96) for sqrt price fixed-point math
pub const Q96: U256 = U256([0, 1 << 32, 0, 0]);

/// Q128 constant (2^128) for fee growth fixed-point math
pub const Q128: U256 = U256([0, 0, 1, 0]);

/// Q192 constant (2^192), the scale of a squared Q96 value
pub const Q192: U256 = U256([0, 0, 0, 1]);

/// Minimum tick index, sqrt(1.0001^MIN_TICK) * 2^96 fits in 160 bits
pub const MIN_TICK: i32 = -887272;

/// Maximum tick index
pub const MAX_TICK: i32 = -MIN_TICK;

/// Minimum sqrt price (at MIN_TICK)
pub const MIN_SQRT_RATIO: U256 = U256([4295128739, 0, 0, 0]);

/// Maximum sqrt price (at MAX_TICK)
/// 1461446703485210103287273052203988822378723970342
pub const MAX_SQRT_RATIO: U256 = U256([0x5d951d5263988d26, 0xefd1fc6a50648849, 0xfffd8963, 0]);

/// Fee denominator, fees are expressed in hundredths of a basis point
pub const FEE_DENOMINATOR_PIPS: u32 = 1_000_000;

/// Basis point denominator for slippage, tolerance and APR values
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Denominator of range coverage fractions and range multipliers
pub const RANGE_DENOMINATOR: u64 = 100_000;

/// Scale of 1e18-denominated prices (`QuoteParams::price_limit`)
pub const PRICE_PRECISION: u128 = 1_000_000_000_000_000_000;

/// Seconds in a 365-day year
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Fee amount in hundredths of a basis point (1e-6)
/// 500 = 0.05%, 3000 = 0.3%, 10000 = 1%
pub type Fee = u32;

/// Get tick spacing for a given fee amount
pub fn fee_to_tick_spacing(fee: Fee) -> LpResult<i32> {
    match fee {
        100 => Ok(1),     // 0.01%
        500 => Ok(10),    // 0.05%
        3000 => Ok(60),   // 0.3%
        10000 => Ok(200), // 1%
        _ => Err(LpError::UnknownFeeTier(fee)),
    }
}

/// Lowest tick usable as a position boundary for the given spacing
pub fn min_usable_tick(tick_spacing: i32) -> i32 {
    (MIN_TICK / tick_spacing) * tick_spacing
}

/// Highest tick usable as a position boundary for the given spacing
pub fn max_usable_tick(tick_spacing: i32) -> i32 {
    (MAX_TICK / tick_spacing) * tick_spacing
}
