use crate::full_math::{div_rounding_up, mul_div, mul_div_rounding_up};
use lp_types::{LpError, LpResult, Q96, U256};

/// Largest value a sqrt price may take (uint160)
fn max_uint160() -> U256 {
    (U256::one() << 160) - 1
}

fn to_uint160(value: U256) -> LpResult<U256> {
    if value > max_uint160() {
        return Err(LpError::ArithmeticOverflow);
    }
    Ok(value)
}

fn sorted(a: U256, b: U256) -> (U256, U256) {
    if a > b {
        (b, a)
    } else {
        (a, b)
    }
}

/// Calculate amount0 delta for a price move from sqrt_ratio_a to sqrt_ratio_b
/// delta_x = L * (sqrt_pb - sqrt_pa) / (sqrt_pa * sqrt_pb)
pub fn get_amount0_delta(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    liquidity: u128,
    round_up: bool,
) -> LpResult<U256> {
    let (sqrt_ratio_lower, sqrt_ratio_upper) = sorted(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    if sqrt_ratio_lower.is_zero() {
        return Err(LpError::SqrtPriceOutOfBounds);
    }

    let numerator1 = U256::from(liquidity) << 96;
    let numerator2 = sqrt_ratio_upper - sqrt_ratio_lower;

    if round_up {
        div_rounding_up(
            mul_div_rounding_up(numerator1, numerator2, sqrt_ratio_upper)?,
            sqrt_ratio_lower,
        )
    } else {
        Ok(mul_div(numerator1, numerator2, sqrt_ratio_upper)? / sqrt_ratio_lower)
    }
}

/// Calculate amount1 delta for a price move from sqrt_ratio_a to sqrt_ratio_b
/// delta_y = L * (sqrt_pb - sqrt_pa)
pub fn get_amount1_delta(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    liquidity: u128,
    round_up: bool,
) -> LpResult<U256> {
    let (sqrt_ratio_lower, sqrt_ratio_upper) = sorted(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    let liquidity = U256::from(liquidity);

    if round_up {
        mul_div_rounding_up(liquidity, sqrt_ratio_upper - sqrt_ratio_lower, Q96)
    } else {
        mul_div(liquidity, sqrt_ratio_upper - sqrt_ratio_lower, Q96)
    }
}

/// Get next sqrt price from an input amount of token0 or token1
///
/// Rounds so the price never moves further than the input pays for.
pub fn get_next_sqrt_price_from_input(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount_in: U256,
    zero_for_one: bool,
) -> LpResult<U256> {
    check_inputs(sqrt_price_x96, liquidity)?;

    if zero_for_one {
        get_next_sqrt_price_from_amount0_rounding_up(sqrt_price_x96, liquidity, amount_in, true)
    } else {
        get_next_sqrt_price_from_amount1_rounding_down(sqrt_price_x96, liquidity, amount_in, true)
    }
}

/// Get next sqrt price from an output amount of token0 or token1
pub fn get_next_sqrt_price_from_output(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount_out: U256,
    zero_for_one: bool,
) -> LpResult<U256> {
    check_inputs(sqrt_price_x96, liquidity)?;

    if zero_for_one {
        get_next_sqrt_price_from_amount1_rounding_down(sqrt_price_x96, liquidity, amount_out, false)
    } else {
        get_next_sqrt_price_from_amount0_rounding_up(sqrt_price_x96, liquidity, amount_out, false)
    }
}

fn check_inputs(sqrt_price_x96: U256, liquidity: u128) -> LpResult<()> {
    if sqrt_price_x96.is_zero() {
        return Err(LpError::SqrtPriceOutOfBounds);
    }
    if liquidity == 0 {
        return Err(LpError::DivisionByZero);
    }
    Ok(())
}

/// Calculate next sqrt price given a token0 amount
/// sqrt_price_next = sqrt_price * L / (L + amount * sqrt_price)  [if add]
/// sqrt_price_next = sqrt_price * L / (L - amount * sqrt_price)  [if remove]
fn get_next_sqrt_price_from_amount0_rounding_up(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount: U256,
    add: bool,
) -> LpResult<U256> {
    if amount.is_zero() {
        return Ok(sqrt_price_x96);
    }
    let numerator1 = U256::from(liquidity) << 96;

    if add {
        if let Some(product) = amount.checked_mul(sqrt_price_x96) {
            if let Some(denominator) = numerator1.checked_add(product) {
                return mul_div_rounding_up(numerator1, sqrt_price_x96, denominator);
            }
        }
        // amount * price overflowed, use the less precise form
        let denominator = (numerator1 / sqrt_price_x96)
            .checked_add(amount)
            .ok_or(LpError::ArithmeticOverflow)?;
        div_rounding_up(numerator1, denominator)
    } else {
        let product = amount
            .checked_mul(sqrt_price_x96)
            .ok_or(LpError::ArithmeticOverflow)?;
        if numerator1 <= product {
            return Err(LpError::ArithmeticOverflow);
        }
        to_uint160(mul_div_rounding_up(numerator1, sqrt_price_x96, numerator1 - product)?)
    }
}

/// Calculate next sqrt price given a token1 amount
/// sqrt_price_next = sqrt_price + amount / L  [if add]
/// sqrt_price_next = sqrt_price - amount / L  [if remove]
fn get_next_sqrt_price_from_amount1_rounding_down(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount: U256,
    add: bool,
) -> LpResult<U256> {
    let liquidity = U256::from(liquidity);

    if add {
        let quotient = mul_div(amount, Q96, liquidity)?;
        let next = sqrt_price_x96
            .checked_add(quotient)
            .ok_or(LpError::ArithmeticOverflow)?;
        to_uint160(next)
    } else {
        let quotient = mul_div_rounding_up(amount, Q96, liquidity)?;
        if sqrt_price_x96 <= quotient {
            return Err(LpError::ArithmeticOverflow);
        }
        Ok(sqrt_price_x96 - quotient)
    }
}
