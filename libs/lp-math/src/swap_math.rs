use crate::full_math::{mul_div, mul_div_rounding_up};
use crate::sqrt_price_math::{
    get_amount0_delta, get_amount1_delta, get_next_sqrt_price_from_input,
    get_next_sqrt_price_from_output,
};
use lp_types::{LpError, LpResult, PoolSnapshot, FEE_DENOMINATOR_PIPS, MAX_SQRT_RATIO, MIN_SQRT_RATIO, U256};

/// Amount driving a swap step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwapAmount {
    /// Spend exactly this much input, fee included
    ExactIn(U256),
    /// Receive exactly this much output
    ExactOut(U256),
}

/// Result of a single swap step computation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapStep {
    /// The sqrt price after this step
    pub sqrt_ratio_next_x96: U256,
    /// Amount of input token consumed, fee excluded
    pub amount_in: U256,
    /// Amount of output token produced
    pub amount_out: U256,
    /// Fee amount taken from input
    pub fee_amount: U256,
}

impl SwapStep {
    /// Input leaving the trader, fee included
    pub fn total_in(&self) -> U256 {
        self.amount_in + self.fee_amount
    }
}

/// Compute the result of swapping within a single constant-liquidity range
///
/// # Arguments
/// * `sqrt_ratio_current_x96` - Current sqrt price
/// * `sqrt_ratio_target_x96` - Target sqrt price (next tick boundary or price limit)
/// * `liquidity` - Available liquidity in this range
/// * `amount` - Exact input or exact output still to swap
/// * `fee_pips` - Fee in hundredths of a bip (e.g., 3000 = 0.3%)
pub fn compute_swap_step(
    sqrt_ratio_current_x96: U256,
    sqrt_ratio_target_x96: U256,
    liquidity: u128,
    amount: SwapAmount,
    fee_pips: u32,
) -> LpResult<SwapStep> {
    if fee_pips >= FEE_DENOMINATOR_PIPS {
        return Err(LpError::StaleOrInconsistentSnapshot("fee must be below 100%"));
    }
    let zero_for_one = sqrt_ratio_current_x96 >= sqrt_ratio_target_x96;
    let fee_denominator = U256::from(FEE_DENOMINATOR_PIPS);
    let fee_complement = U256::from(FEE_DENOMINATOR_PIPS - fee_pips);

    let mut amount_in = U256::zero();
    let mut amount_out = U256::zero();

    let sqrt_ratio_next_x96 = match amount {
        SwapAmount::ExactIn(remaining) => {
            let remaining_less_fee = mul_div(remaining, fee_complement, fee_denominator)?;
            // Input needed to reach the target
            amount_in = if zero_for_one {
                get_amount0_delta(sqrt_ratio_target_x96, sqrt_ratio_current_x96, liquidity, true)?
            } else {
                get_amount1_delta(sqrt_ratio_current_x96, sqrt_ratio_target_x96, liquidity, true)?
            };
            if remaining_less_fee >= amount_in {
                sqrt_ratio_target_x96
            } else {
                get_next_sqrt_price_from_input(
                    sqrt_ratio_current_x96,
                    liquidity,
                    remaining_less_fee,
                    zero_for_one,
                )?
            }
        }
        SwapAmount::ExactOut(wanted) => {
            amount_out = if zero_for_one {
                get_amount1_delta(sqrt_ratio_target_x96, sqrt_ratio_current_x96, liquidity, false)?
            } else {
                get_amount0_delta(sqrt_ratio_current_x96, sqrt_ratio_target_x96, liquidity, false)?
            };
            if wanted >= amount_out {
                sqrt_ratio_target_x96
            } else {
                get_next_sqrt_price_from_output(sqrt_ratio_current_x96, liquidity, wanted, zero_for_one)?
            }
        }
    };

    let max = sqrt_ratio_target_x96 == sqrt_ratio_next_x96;
    let exact_in = matches!(amount, SwapAmount::ExactIn(_));

    // Recompute the side that was not pinned by reaching the target
    if zero_for_one {
        if !max || !exact_in {
            amount_in =
                get_amount0_delta(sqrt_ratio_next_x96, sqrt_ratio_current_x96, liquidity, true)?;
        }
        if !max || exact_in {
            amount_out =
                get_amount1_delta(sqrt_ratio_next_x96, sqrt_ratio_current_x96, liquidity, false)?;
        }
    } else {
        if !max || !exact_in {
            amount_in =
                get_amount1_delta(sqrt_ratio_current_x96, sqrt_ratio_next_x96, liquidity, true)?;
        }
        if !max || exact_in {
            amount_out =
                get_amount0_delta(sqrt_ratio_current_x96, sqrt_ratio_next_x96, liquidity, false)?;
        }
    }

    let fee_amount = match amount {
        SwapAmount::ExactOut(wanted) => {
            // Cap output at the amount asked for
            amount_out = amount_out.min(wanted);
            mul_div_rounding_up(amount_in, U256::from(fee_pips), fee_complement)?
        }
        // Didn't reach target - the remainder is the fee
        SwapAmount::ExactIn(remaining) if !max => remaining
            .checked_sub(amount_in)
            .ok_or(LpError::ArithmeticOverflow)?,
        SwapAmount::ExactIn(_) => {
            mul_div_rounding_up(amount_in, U256::from(fee_pips), fee_complement)?
        }
    };

    Ok(SwapStep {
        sqrt_ratio_next_x96,
        amount_in,
        amount_out,
        fee_amount,
    })
}

/// Price limit used when the caller does not bound the swap
pub fn default_price_limit(zero_for_one: bool) -> U256 {
    if zero_for_one {
        MIN_SQRT_RATIO + 1
    } else {
        MAX_SQRT_RATIO - 1
    }
}

/// Reject a price limit that is on the wrong side of the current price or
/// outside the sqrt bounds
pub fn check_price_limit(
    sqrt_price_x96: U256,
    sqrt_price_limit_x96: U256,
    zero_for_one: bool,
) -> LpResult<()> {
    let valid = if zero_for_one {
        sqrt_price_limit_x96 < sqrt_price_x96 && sqrt_price_limit_x96 > MIN_SQRT_RATIO
    } else {
        sqrt_price_limit_x96 > sqrt_price_x96 && sqrt_price_limit_x96 < MAX_SQRT_RATIO
    };
    if valid {
        Ok(())
    } else {
        Err(LpError::PriceLimitExceeded)
    }
}

/// Swap `amount_in` through the pool's in-range liquidity, stopping at the
/// price limit
///
/// Liquidity is held constant for the whole swap, which is exact as long as
/// no initialized tick sits between the current price and where the swap
/// ends.
pub fn simulate_exact_input(
    pool: &PoolSnapshot,
    zero_for_one: bool,
    amount_in: U256,
    sqrt_price_limit_x96: U256,
) -> LpResult<SwapStep> {
    check_price_limit(pool.sqrt_price_x96, sqrt_price_limit_x96, zero_for_one)?;
    if amount_in.is_zero() {
        return Ok(SwapStep {
            sqrt_ratio_next_x96: pool.sqrt_price_x96,
            amount_in: U256::zero(),
            amount_out: U256::zero(),
            fee_amount: U256::zero(),
        });
    }
    compute_swap_step(
        pool.sqrt_price_x96,
        sqrt_price_limit_x96,
        pool.liquidity,
        SwapAmount::ExactIn(amount_in),
        pool.fee,
    )
}
