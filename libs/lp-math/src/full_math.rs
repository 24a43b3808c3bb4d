use lp_types::{LpError, LpResult, U256, U512};

/// Multiply and divide with 512-bit intermediate precision (rounds down)
/// Returns (a * b) / denominator
pub fn mul_div(a: U256, b: U256, denominator: U256) -> LpResult<U256> {
    if denominator.is_zero() {
        return Err(LpError::DivisionByZero);
    }

    let product = a.full_mul(b);
    let result = product / U512::from(denominator);

    U256::try_from(result).map_err(|_| LpError::ArithmeticOverflow)
}

/// Multiply and divide with 512-bit intermediate precision (rounds up)
/// Returns ceil((a * b) / denominator)
pub fn mul_div_rounding_up(a: U256, b: U256, denominator: U256) -> LpResult<U256> {
    if denominator.is_zero() {
        return Err(LpError::DivisionByZero);
    }

    let product = a.full_mul(b);
    let (quotient, remainder) = product.div_mod(U512::from(denominator));
    let result = U256::try_from(quotient).map_err(|_| LpError::ArithmeticOverflow)?;

    if remainder.is_zero() {
        Ok(result)
    } else {
        result.checked_add(U256::one()).ok_or(LpError::ArithmeticOverflow)
    }
}

/// Unsigned division with rounding up
pub fn div_rounding_up(a: U256, b: U256) -> LpResult<U256> {
    if b.is_zero() {
        return Err(LpError::DivisionByZero);
    }
    let (quotient, remainder) = a.div_mod(b);
    if remainder.is_zero() {
        Ok(quotient)
    } else {
        Ok(quotient + 1)
    }
}

/// Narrow to u128, failing instead of truncating
pub fn to_u128(value: U256) -> LpResult<u128> {
    if value > U256::from(u128::MAX) {
        return Err(LpError::ArithmeticOverflow);
    }
    Ok(value.as_u128())
}
