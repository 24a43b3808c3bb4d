use thiserror::Error;

/// Errors returned by the position and rebalance math
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LpError {
    // ========================================================================
    // Arithmetic
    // ========================================================================
    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    #[error("division by zero")]
    DivisionByZero,

    // ========================================================================
    // Ticks and prices
    // ========================================================================
    #[error("tick {0} outside [MIN_TICK, MAX_TICK]")]
    TickOutOfBounds(i32),

    #[error("sqrt price outside [MIN_SQRT_RATIO, MAX_SQRT_RATIO)")]
    SqrtPriceOutOfBounds,

    #[error("invalid tick spacing {0}")]
    InvalidTickSpacing(i32),

    #[error("invalid tick range [{lower}, {upper}]")]
    InvalidTickRange { lower: i32, upper: i32 },

    #[error("current price is at or above the upper bound of the range")]
    PriceOutsideRange,

    #[error("range coverage {0} must be strictly between 0 and RANGE_DENOMINATOR")]
    InvalidCoverage(u64),

    #[error("unknown fee tier {0}")]
    UnknownFeeTier(u32),

    // ========================================================================
    // Swap search
    // ========================================================================
    #[error("invalid search range")]
    InvalidSearchRange,

    #[error("price limit leaves no room to swap")]
    PriceLimitExceeded,

    #[error("closed-form swap needs a bounded price limit")]
    UnboundedPriceLimit,

    #[error("search budget exhausted after {iterations} iterations")]
    SearchExhausted { iterations: u32 },

    #[error("both token balances are zero")]
    EmptyBalances,

    // ========================================================================
    // Inputs
    // ========================================================================
    #[error("stale or inconsistent snapshot: {0}")]
    StaleOrInconsistentSnapshot(&'static str),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

pub type LpResult<T> = Result<T, LpError>;
