use primitive_types::U256;

use crate::{LpError, LpResult, MAX_SQRT_RATIO, MIN_SQRT_RATIO};

/// Swap direction and price limits derived from a slippage budget
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuoteParams {
    /// True if swapping token0 for token1
    pub zero_for_one: bool,
    /// Sqrt price the swap may not cross
    pub price_limit_sqrt: U256,
    /// Token0 price in token1 at the limit, scaled by 1e18
    pub price_limit: U256,
}

impl QuoteParams {
    /// Direction only, bounded by the protocol's extreme sqrt prices
    pub fn without_limit(zero_for_one: bool) -> Self {
        if zero_for_one {
            Self {
                zero_for_one,
                price_limit_sqrt: MIN_SQRT_RATIO + 1,
                price_limit: U256::zero(),
            }
        } else {
            Self {
                zero_for_one,
                price_limit_sqrt: MAX_SQRT_RATIO - 1,
                price_limit: U256::MAX,
            }
        }
    }
}

/// The swap to execute immediately before minting a rebalanced position
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RebalanceQuote {
    pub zero_for_one: bool,
    pub price_limit_sqrt: U256,
    pub price_limit: U256,
    /// Input token spent, fee included
    pub amount_in: U256,
    pub amount_out: U256,
    /// Sqrt price after the simulated swap
    pub sqrt_price_after_x96: U256,
}

/// Bounds of the swap-in amount search
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchRange {
    pub swap_in_low: U256,
    pub swap_in_high: U256,
    /// Maximum number of bisection steps
    pub loop_budget: u32,
}

impl SearchRange {
    pub fn new(swap_in_low: U256, swap_in_high: U256, loop_budget: u32) -> Self {
        Self {
            swap_in_low,
            swap_in_high,
            loop_budget,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchStatus {
    /// Realized ratio landed within tolerance of the target
    Converged,
    /// Budget ran out first; the quote is the last estimate
    Exhausted,
}

/// Result of a swap-amount search
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchOutcome {
    pub quote: RebalanceQuote,
    /// Post-swap token1/token0 ratio (Q96)
    pub realized_ratio_q96: U256,
    pub iterations: u32,
    pub status: SearchStatus,
}

impl SearchOutcome {
    pub fn is_converged(&self) -> bool {
        self.status == SearchStatus::Converged
    }

    /// The quote, or `SearchExhausted` if the search did not reach tolerance
    pub fn converged(self) -> LpResult<RebalanceQuote> {
        match self.status {
            SearchStatus::Converged => Ok(self.quote),
            SearchStatus::Exhausted => Err(LpError::SearchExhausted {
                iterations: self.iterations,
            }),
        }
    }
}
