//! Swap sizing before a (re)mint.
//!
//! Given the wallet's token balances and a target range, these functions pick
//! the swap direction, bound it with a slippage-derived price limit, and size
//! it so the post-swap balances match the range's token1/token0 composition.
//! `search_swap_amount` bisects against a simulated swap; `calculate_swap_state`
//! is the closed form that assumes the whole swap fills at the limit price.

use crate::full_math::mul_div;
use crate::liquidity_math::get_amounts_for_liquidity;
use crate::swap_math::{check_price_limit, simulate_exact_input};
use crate::tick_math::get_sqrt_ratio_at_tick;
use lp_types::{
    EngineConfig, LpError, LpResult, PoolSnapshot, QuoteParams, RebalanceQuote, SearchOutcome,
    SearchRange, SearchStatus, TickRange, BPS_DENOMINATOR, PRICE_PRECISION, Q192, Q96, U256, U512,
};

/// Liquidity used to sample a range's composition
const PROBE_LIQUIDITY: u128 = 1_000_000_000_000_000_000;

/// Token1/token0 ratio (Q96) held by any position in `[sqrt_lower, sqrt_upper]`
/// at `sqrt_price_x96`
///
/// Zero at or below the range, where a position is all token0. At or above
/// the upper bound a position is all token1 and no finite ratio exists.
pub fn target_ratio_for_range(
    sqrt_price_x96: U256,
    sqrt_lower_x96: U256,
    sqrt_upper_x96: U256,
) -> LpResult<U256> {
    if sqrt_lower_x96 >= sqrt_upper_x96 {
        return Err(LpError::DivisionByZero);
    }
    if sqrt_price_x96 <= sqrt_lower_x96 {
        return Ok(U256::zero());
    }
    if sqrt_price_x96 >= sqrt_upper_x96 {
        return Err(LpError::PriceOutsideRange);
    }

    // (sp - sa) * sp * sb / ((sb - sp) * Q96)
    let scaled = mul_div(sqrt_price_x96 - sqrt_lower_x96, sqrt_price_x96, Q96)?;
    mul_div(scaled, sqrt_upper_x96, sqrt_upper_x96 - sqrt_price_x96)
}

/// Whether token0 must be sold to reach the range's composition
pub fn is_zero_for_one(
    sqrt_price_x96: U256,
    range: &TickRange,
    amount0: U256,
    amount1: U256,
) -> LpResult<bool> {
    if amount0.is_zero() && amount1.is_zero() {
        return Err(LpError::EmptyBalances);
    }
    if amount0.is_zero() {
        return Ok(false);
    }
    if amount1.is_zero() {
        return Ok(true);
    }

    let sqrt_lower = get_sqrt_ratio_at_tick(range.lower)?;
    let sqrt_upper = get_sqrt_ratio_at_tick(range.upper)?;
    let (position0, position1) =
        get_amounts_for_liquidity(sqrt_price_x96, sqrt_lower, sqrt_upper, PROBE_LIQUIDITY)?;

    // Range holds only one token
    if position1.is_zero() {
        return Ok(false);
    }
    if position0.is_zero() {
        return Ok(true);
    }

    // token0 the range wants alongside our token1
    let threshold0 = mul_div(position0, amount1, position1)?;
    Ok(threshold0 < amount0)
}

/// Price limits `slippage_bps` away from the current price in the swap direction
pub fn quote_params(
    sqrt_price_x96: U256,
    zero_for_one: bool,
    slippage_bps: u32,
) -> LpResult<QuoteParams> {
    let slippage = u64::from(slippage_bps);
    if slippage >= BPS_DENOMINATOR {
        return Err(LpError::InvalidConfig(format!(
            "slippage_bps must be below {}, got {}",
            BPS_DENOMINATOR, slippage_bps
        )));
    }

    let factor = if zero_for_one {
        BPS_DENOMINATOR - slippage
    } else {
        BPS_DENOMINATOR + slippage
    };
    // 1e18-scaled price multiplier; its square root is 1e9-scaled
    let num = U256::from(PRICE_PRECISION) * U256::from(factor);
    let sqrt_scale = U256::exp10(9) * U256::from(100u64);
    let price_limit_sqrt = mul_div(num.integer_sqrt(), sqrt_price_x96, sqrt_scale)?;

    // token0 price scaled by the multiplier: sqrt^2 * num / (Q192 * 10000)
    let numerator = sqrt_price_x96
        .full_mul(sqrt_price_x96)
        .checked_mul(U512::from(num))
        .ok_or(LpError::ArithmeticOverflow)?;
    let denominator = Q192.full_mul(U256::from(BPS_DENOMINATOR));
    let price_limit =
        U256::try_from(numerator / denominator).map_err(|_| LpError::ArithmeticOverflow)?;

    Ok(QuoteParams {
        zero_for_one,
        price_limit_sqrt,
        price_limit,
    })
}

/// True when `ratio` is within `tolerance_bps` of `target`, relative to `target`
fn within_tolerance(ratio: U256, target: U256, tolerance_bps: u32) -> bool {
    let diff = if ratio > target {
        ratio - target
    } else {
        target - ratio
    };
    diff.full_mul(U256::from(BPS_DENOMINATOR)) < target.full_mul(U256::from(tolerance_bps))
}

/// Whether `amount1 / amount0` is within `tolerance_bps` of `target_ratio_q96`
pub fn is_in_ratio(
    amount0: U256,
    amount1: U256,
    target_ratio_q96: U256,
    tolerance_bps: u32,
) -> LpResult<bool> {
    if amount0.is_zero() && amount1.is_zero() {
        return Err(LpError::EmptyBalances);
    }
    if amount0.is_zero() {
        return Ok(false);
    }
    let ratio = mul_div(amount1, Q96, amount0)?;
    Ok(within_tolerance(ratio, target_ratio_q96, tolerance_bps))
}

fn post_swap_ratio(post0: U256, post1: U256) -> LpResult<U256> {
    if post0.is_zero() {
        return Ok(U256::MAX);
    }
    mul_div(post1, Q96, post0)
}

/// Bisect the swap-in amount until the post-swap token1/token0 ratio lands
/// within `tolerance_bps` of `target_ratio_q96`
///
/// Each probe swaps `mid` through the pool's current liquidity in a single
/// constant-liquidity step, stopping at `params.price_limit_sqrt`. The ratio
/// rises with size for zero-for-one swaps and falls for one-for-zero swaps; the
/// search assumes that holds across the whole interval and does not check for
/// initialized ticks inside it.
///
/// Running out of budget is not an error: the outcome is marked
/// `SearchStatus::Exhausted` and carries the last probe.
pub fn search_swap_amount(
    pool: &PoolSnapshot,
    params: &QuoteParams,
    balances: (U256, U256),
    target_ratio_q96: U256,
    range: &SearchRange,
    tolerance_bps: u32,
) -> LpResult<SearchOutcome> {
    let zero_for_one = params.zero_for_one;
    let (amount0, amount1) = balances;
    let input_balance = if zero_for_one { amount0 } else { amount1 };

    if range.swap_in_low > range.swap_in_high
        || range.loop_budget == 0
        || range.swap_in_high > input_balance
    {
        return Err(LpError::InvalidSearchRange);
    }
    check_price_limit(pool.sqrt_price_x96, params.price_limit_sqrt, zero_for_one)?;

    let _span = tracing::debug_span!(
        "search_swap_amount",
        zero_for_one,
        budget = range.loop_budget
    )
    .entered();

    let mut low = range.swap_in_low;
    let mut high = range.swap_in_high;
    let mut last = None;

    for iteration in 0..range.loop_budget {
        let mid = low + (high - low) / 2;
        let step = simulate_exact_input(pool, zero_for_one, mid, params.price_limit_sqrt)?;
        let spent = step.total_in();

        // Clamped at the limit without moving
        if !mid.is_zero() && spent.is_zero() {
            return Err(LpError::PriceLimitExceeded);
        }

        let (post0, post1) = if zero_for_one {
            (amount0 - spent, amount1 + step.amount_out)
        } else {
            (amount0 + step.amount_out, amount1 - spent)
        };
        let ratio = post_swap_ratio(post0, post1)?;

        tracing::trace!(iteration, %mid, %spent, %ratio, "search probe");

        let quote = RebalanceQuote {
            zero_for_one,
            price_limit_sqrt: params.price_limit_sqrt,
            price_limit: params.price_limit,
            amount_in: spent,
            amount_out: step.amount_out,
            sqrt_price_after_x96: step.sqrt_ratio_next_x96,
        };
        last = Some((quote, ratio));

        if within_tolerance(ratio, target_ratio_q96, tolerance_bps) {
            tracing::debug!(iterations = iteration + 1, amount_in = %spent, "search converged");
            return Ok(SearchOutcome {
                quote,
                realized_ratio_q96: ratio,
                iterations: iteration + 1,
                status: SearchStatus::Converged,
            });
        }

        let go_higher = if zero_for_one {
            ratio < target_ratio_q96
        } else {
            ratio > target_ratio_q96
        };
        if go_higher {
            low = mid;
        } else {
            high = mid;
        }
    }

    // loop_budget > 0, so at least one probe ran
    let (quote, ratio) = last.ok_or(LpError::InvalidSearchRange)?;
    tracing::debug!(iterations = range.loop_budget, amount_in = %quote.amount_in, "search budget exhausted");
    Ok(SearchOutcome {
        quote,
        realized_ratio_q96: ratio,
        iterations: range.loop_budget,
        status: SearchStatus::Exhausted,
    })
}

/// Closed-form swap that leaves the balances at the range's ratio if the
/// whole swap fills at `params.price_limit`
///
/// Returns `(amount_in, amount_out)`; `(0, 0)` when the balances already sit
/// on the far side of the target for the requested direction. Needs a real
/// limit price such as one from `quote_params`.
pub fn calculate_swap_state(
    pool: &PoolSnapshot,
    params: &QuoteParams,
    range: &TickRange,
    amount0: U256,
    amount1: U256,
) -> LpResult<(U256, U256)> {
    range.validate_spacing(pool.tick_spacing)?;
    let sqrt_lower = get_sqrt_ratio_at_tick(range.lower)?;
    let sqrt_upper = get_sqrt_ratio_at_tick(range.upper)?;
    let ratio = target_ratio_for_range(pool.sqrt_price_x96, sqrt_lower, sqrt_upper)?;

    let precision = U256::from(PRICE_PRECISION);
    let price = params.price_limit;
    // `QuoteParams::without_limit` sentinels carry no execution price
    if price.is_zero() || price == U256::MAX {
        return Err(LpError::UnboundedPriceLimit);
    }
    // Ratio in the same 1e18 scale as the price
    let ratio_e18 = mul_div(ratio, precision, Q96)?;
    let denominator = price
        .checked_add(ratio_e18)
        .ok_or(LpError::ArithmeticOverflow)?;
    let wanted1 = mul_div(ratio, amount0, Q96)?;

    if params.zero_for_one {
        // Sell x token0: (a1 + x p) / (a0 - x) = R  =>  x = (R a0 - a1) / (p + R)
        if wanted1 <= amount1 {
            return Ok((U256::zero(), U256::zero()));
        }
        let amount_in = mul_div(wanted1 - amount1, precision, denominator)?;
        let amount_out = mul_div(amount_in, price, precision)?;
        Ok((amount_in, amount_out))
    } else {
        // Sell y token1: (a1 - y) / (a0 + y / p) = R  =>  y = (a1 - R a0) p / (p + R)
        if amount1 <= wanted1 {
            return Ok((U256::zero(), U256::zero()));
        }
        let amount_in = mul_div(amount1 - wanted1, price, denominator)?;
        let amount_out = mul_div(amount_in, precision, price)?;
        Ok((amount_in, amount_out))
    }
}

/// Full pre-mint plan for moving `balances` into `range`: direction, price
/// limits from the configured slippage, and the searched swap amount
pub fn plan_rebalance(
    pool: &PoolSnapshot,
    range: &TickRange,
    balances: (U256, U256),
    config: &EngineConfig,
) -> LpResult<SearchOutcome> {
    range.validate_spacing(pool.tick_spacing)?;
    let (amount0, amount1) = balances;
    let zero_for_one = is_zero_for_one(pool.sqrt_price_x96, range, amount0, amount1)?;
    let params = quote_params(pool.sqrt_price_x96, zero_for_one, config.slippage_bps)?;

    let sqrt_lower = get_sqrt_ratio_at_tick(range.lower)?;
    let sqrt_upper = get_sqrt_ratio_at_tick(range.upper)?;
    let target = target_ratio_for_range(pool.sqrt_price_x96, sqrt_lower, sqrt_upper)?;

    let input_balance = if zero_for_one { amount0 } else { amount1 };
    let search = SearchRange::new(U256::zero(), input_balance, config.search.loop_budget);

    search_swap_amount(
        pool,
        &params,
        balances,
        target,
        &search,
        config.search.tolerance_bps,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> U256 {
        U256::from_dec_str(s).unwrap()
    }

    fn e18(v: u128) -> U256 {
        U256::from(v) * U256::exp10(18)
    }

    fn rebalance_pool() -> PoolSnapshot {
        PoolSnapshot::new(dec("4436738577262596212334852517"), -57652, 60, 1_000_000_000_000_000_000)
    }

    fn rebalance_range() -> TickRange {
        TickRange::new(-58680, -56640, 60).unwrap()
    }

    // === target_ratio_for_range ===

    #[test]
    fn test_target_ratio_for_range() {
        let sqrt_lower = get_sqrt_ratio_at_tick(-58680).unwrap();
        let sqrt_upper = get_sqrt_ratio_at_tick(-56640).unwrap();
        let pool = rebalance_pool();
        assert_eq!(
            target_ratio_for_range(pool.sqrt_price_x96, sqrt_lower, sqrt_upper).unwrap(),
            dec("252704211259109296114979275")
        );
        assert!(target_ratio_for_range(sqrt_lower, sqrt_lower, sqrt_upper).unwrap().is_zero());
        assert_eq!(
            target_ratio_for_range(sqrt_upper, sqrt_lower, sqrt_upper),
            Err(LpError::PriceOutsideRange)
        );
    }

    #[test]
    fn test_target_ratio_matches_position_composition() {
        let sqrt_lower = get_sqrt_ratio_at_tick(-600).unwrap();
        let sqrt_upper = get_sqrt_ratio_at_tick(1200).unwrap();
        let ratio = target_ratio_for_range(Q96, sqrt_lower, sqrt_upper).unwrap();
        let (a0, a1) = get_amounts_for_liquidity(Q96, sqrt_lower, sqrt_upper, u128::MAX >> 8).unwrap();
        let held = mul_div(a1, Q96, a0).unwrap();
        assert!(within_tolerance(held, ratio, 1));
    }

    // === is_zero_for_one ===

    #[test]
    fn test_is_zero_for_one() {
        let sqrt = rebalance_pool().sqrt_price_x96;
        let range = rebalance_range();
        assert!(is_zero_for_one(sqrt, &range, e18(1), e18(1) / 1000).unwrap());
        assert!(is_zero_for_one(sqrt, &range, e18(1), U256::zero()).unwrap());
        assert!(!is_zero_for_one(sqrt, &range, U256::zero(), e18(1)).unwrap());
        assert!(!is_zero_for_one(sqrt, &range, e18(1) / 1000, e18(1)).unwrap());
        assert_eq!(
            is_zero_for_one(sqrt, &range, U256::zero(), U256::zero()),
            Err(LpError::EmptyBalances)
        );
    }

    #[test]
    fn test_is_zero_for_one_outside_range() {
        let range = TickRange::new(-60, 60, 60).unwrap();
        // Price above the range: the range wants token1 only
        let above = get_sqrt_ratio_at_tick(120).unwrap();
        assert!(is_zero_for_one(above, &range, e18(1), e18(1)).unwrap());
        // Price below the range: the range wants token0 only
        let below = get_sqrt_ratio_at_tick(-120).unwrap();
        assert!(!is_zero_for_one(below, &range, e18(1), e18(1)).unwrap());
    }

    // === quote_params ===

    #[test]
    fn test_quote_params() {
        let sqrt = rebalance_pool().sqrt_price_x96;
        let down = quote_params(sqrt, true, 50).unwrap();
        assert!(down.zero_for_one);
        assert_eq!(down.price_limit_sqrt, dec("4425632831227355330452097534"));
        assert_eq!(down.price_limit, dec("3120265814163792"));

        let up = quote_params(sqrt, false, 50).unwrap();
        assert_eq!(up.price_limit_sqrt, dec("4447816593415524888355524633"));
        assert_eq!(up.price_limit, dec("3151625269582524"));
    }

    #[test]
    fn test_quote_params_rejects_full_slippage() {
        assert!(matches!(quote_params(Q96, true, 10_000), Err(LpError::InvalidConfig(_))));
    }

    // === is_in_ratio ===

    #[test]
    fn test_is_in_ratio() {
        let target = Q96 / 2;
        assert!(is_in_ratio(e18(2), e18(1), target, 10).unwrap());
        assert!(is_in_ratio(e18(2), e18(1) + e18(1) / 2000, target, 10).unwrap());
        assert!(!is_in_ratio(e18(2), e18(1) + e18(1) / 500, target, 10).unwrap());
        assert!(!is_in_ratio(U256::zero(), e18(1), target, 10).unwrap());
        assert_eq!(
            is_in_ratio(U256::zero(), U256::zero(), target, 10),
            Err(LpError::EmptyBalances)
        );
    }

    // === search_swap_amount validation ===

    #[test]
    fn test_search_rejects_invalid_range() {
        let pool = rebalance_pool();
        let params = QuoteParams::without_limit(false);
        let balances = (e18(1), e18(1));
        let target = Q96;
        for range in [
            SearchRange::new(e18(1), U256::zero(), 10),
            SearchRange::new(U256::zero(), e18(1), 0),
            SearchRange::new(U256::zero(), e18(2), 10),
        ] {
            assert_eq!(
                search_swap_amount(&pool, &params, balances, target, &range, 10),
                Err(LpError::InvalidSearchRange)
            );
        }
    }

    #[test]
    fn test_search_rejects_limit_on_wrong_side() {
        let pool = rebalance_pool();
        let params = QuoteParams {
            zero_for_one: true,
            price_limit_sqrt: pool.sqrt_price_x96,
            price_limit: U256::zero(),
        };
        let range = SearchRange::new(U256::zero(), e18(1), 10);
        assert_eq!(
            search_swap_amount(&pool, &params, (e18(1), e18(1)), Q96, &range, 10),
            Err(LpError::PriceLimitExceeded)
        );
    }

    #[test]
    fn test_search_fails_when_clamp_makes_no_progress() {
        // No liquidity: every probe jumps straight to the limit and spends nothing
        let pool = PoolSnapshot::new(Q96, 0, 1, 0);
        let range = SearchRange::new(U256::zero(), U256::from(1000u64), 5);
        assert_eq!(
            search_swap_amount(
                &pool,
                &QuoteParams::without_limit(true),
                (U256::from(1000u64), U256::one()),
                Q96,
                &range,
                10
            ),
            Err(LpError::PriceLimitExceeded)
        );
    }

    #[test]
    fn test_search_clamps_at_price_limit() {
        // Thin pool: the limit is hit long before the target ratio
        let pool = PoolSnapshot::new(Q96, 0, 1, 1_000_000_000_000_000);
        let params = quote_params(Q96, true, 10).unwrap();
        let range = SearchRange::new(U256::zero(), e18(10), 30);
        let outcome =
            search_swap_amount(&pool, &params, (e18(10), U256::zero()), Q96, &range, 10).unwrap();
        assert_eq!(outcome.status, SearchStatus::Exhausted);
        assert_eq!(outcome.quote.sqrt_price_after_x96, params.price_limit_sqrt);
        assert!(outcome.quote.amount_in < e18(1));
        assert!(outcome.converged().is_err());
    }

    // === search_swap_amount scenarios ===

    #[test]
    fn test_search_one_for_zero_converges() {
        let pool = PoolSnapshot::new(
            dec("4551194197074107514614710272"),
            -57142,
            60,
            1_409_862_032_491_040_733_326_409,
        );
        let params = QuoteParams::without_limit(false);
        let target = dec("142246744265321288118042624");
        let balances = (e18(1000), e18(20));

        let outcome = search_swap_amount(
            &pool,
            &params,
            balances,
            target,
            &SearchRange::new(U256::zero(), e18(20), 20),
            10,
        )
        .unwrap();
        assert_eq!(outcome.status, SearchStatus::Converged);
        assert_eq!(outcome.iterations, 11);
        assert_eq!(outcome.quote.amount_in, dec("11787109375000000000"));
        assert_eq!(outcome.quote.amount_out, dec("3571515538282492507250"));
        assert_eq!(
            outcome.quote.sqrt_price_after_x96,
            dec("4551856581758292449728851053")
        );
        assert_eq!(outcome.realized_ratio_q96, dec("142336218197311766818894818"));

        let exhausted = search_swap_amount(
            &pool,
            &params,
            balances,
            target,
            &SearchRange::new(U256::zero(), e18(20), 5),
            10,
        )
        .unwrap();
        assert_eq!(exhausted.status, SearchStatus::Exhausted);
        assert_eq!(exhausted.iterations, 5);
        assert_eq!(exhausted.quote.amount_in, dec("11875000000000000000"));
        assert_eq!(exhausted.quote.amount_out, dec("3598142652979792948341"));
        assert_eq!(
            exhausted.quote.sqrt_price_after_x96,
            dec("4551861520832159611631110595")
        );
        assert_eq!(exhausted.realized_ratio_q96, dec("139997574892817637246875229"));
        assert_eq!(
            exhausted.converged(),
            Err(LpError::SearchExhausted { iterations: 5 })
        );
    }

    #[test]
    fn test_search_zero_for_one_converges() {
        let pool = PoolSnapshot::new(
            dec("4550228513169945223468417024"),
            -57146,
            60,
            1_440_406_078_728_975_522_569_307,
        );
        let params = QuoteParams::without_limit(true);
        let outcome = search_swap_amount(
            &pool,
            &params,
            (e18(1000), e18(1) / 10),
            dec("142246744265321288118042624"),
            &SearchRange::new(U256::zero(), e18(1000), 20),
            10,
        )
        .unwrap();
        assert_eq!(outcome.status, SearchStatus::Converged);
        assert_eq!(outcome.iterations, 10);
        assert_eq!(outcome.quote.amount_in, dec("333007812500000000000"));
        assert_eq!(outcome.quote.amount_out, dec("1098388313632070405"));
        assert_eq!(
            outcome.quote.sqrt_price_after_x96,
            dec("4550168097368386679378122539")
        );
        assert_eq!(outcome.realized_ratio_q96, dec("142349649436691272688387362"));
    }

    // === calculate_swap_state ===

    fn assert_close(actual: U256, expected: &str) {
        let expected = dec(expected);
        let diff = if actual > expected {
            actual - expected
        } else {
            expected - actual
        };
        // within 1e-12 relative
        assert!(
            diff * U256::exp10(12) <= expected,
            "{actual} too far from {expected}"
        );
    }

    #[test]
    fn test_calculate_swap_state_zero_for_one() {
        let params = QuoteParams {
            zero_for_one: true,
            price_limit_sqrt: dec("4425628983865130671419166046"),
            price_limit: dec("3120260389028180"),
        };
        let (amount_in, amount_out) =
            calculate_swap_state(&rebalance_pool(), &params, &rebalance_range(), e18(1), e18(1) / 1000)
                .unwrap();
        assert_eq!(amount_in, dec("347009903476629985"));
        assert_close(amount_in, "347009903476629996");
        assert_close(amount_out, "1082761256418620");

        let (amount_in, amount_out) =
            calculate_swap_state(&rebalance_pool(), &params, &rebalance_range(), e18(1), U256::zero())
                .unwrap();
        assert_close(amount_in, "505492629049560760");
        assert_close(amount_out, "1577268627369059");
    }

    #[test]
    fn test_calculate_swap_state_one_for_zero() {
        let params = QuoteParams {
            zero_for_one: false,
            price_limit_sqrt: dec("4447812676751443652480840308"),
            price_limit: dec("3151619719009090"),
        };
        let (amount_in, amount_out) =
            calculate_swap_state(&rebalance_pool(), &params, &rebalance_range(), U256::zero(), e18(1))
                .unwrap();
        assert_close(amount_in, "497007200942408836");
        assert_close(amount_out, "157698975528264028186");

        let (amount_in, amount_out) = calculate_swap_state(
            &rebalance_pool(),
            &params,
            &rebalance_range(),
            e18(1) / 1000,
            e18(1),
        )
        .unwrap();
        assert_close(amount_in, "497005615700384807");
        assert_close(amount_out, "157698472535464970595");
    }

    #[test]
    fn test_calculate_swap_state_requires_bounded_limit() {
        for zero_for_one in [true, false] {
            assert_eq!(
                calculate_swap_state(
                    &rebalance_pool(),
                    &QuoteParams::without_limit(zero_for_one),
                    &rebalance_range(),
                    e18(1),
                    e18(1),
                ),
                Err(LpError::UnboundedPriceLimit)
            );
        }
    }

    #[test]
    fn test_calculate_swap_state_rejects_misaligned_range() {
        let params = quote_params(rebalance_pool().sqrt_price_x96, true, 50).unwrap();
        let misaligned = TickRange { lower: -58700, upper: -56640 };
        assert_eq!(
            calculate_swap_state(&rebalance_pool(), &params, &misaligned, e18(1), U256::zero()),
            Err(LpError::InvalidTickRange { lower: -58700, upper: -56640 })
        );
        assert_eq!(
            plan_rebalance(&rebalance_pool(), &misaligned, (e18(1), U256::zero()), &EngineConfig::default()),
            Err(LpError::InvalidTickRange { lower: -58700, upper: -56640 })
        );
    }

    #[test]
    fn test_calculate_swap_state_already_past_target() {
        let params = QuoteParams {
            zero_for_one: true,
            price_limit_sqrt: dec("4425628983865130671419166046"),
            price_limit: dec("3120260389028180"),
        };
        let state =
            calculate_swap_state(&rebalance_pool(), &params, &rebalance_range(), e18(1) / 1000, e18(1))
                .unwrap();
        assert_eq!(state, (U256::zero(), U256::zero()));
    }

    // === plan_rebalance ===

    #[test]
    fn test_plan_rebalance_reaches_range_ratio() {
        let pool = PoolSnapshot::new(Q96, 0, 60, 100_000_000_000_000_000_000_000);
        let range = TickRange::new(-600, 1200, 60).unwrap();
        let config = EngineConfig::default();
        let outcome = plan_rebalance(&pool, &range, (e18(10), e18(1)), &config).unwrap();
        assert!(outcome.quote.zero_for_one);
        assert!(outcome.is_converged());
        assert_eq!(outcome.iterations, 10);
        assert_eq!(outcome.quote.amount_in, dec("2705078125000000000"));
        assert_eq!(outcome.quote.amount_out, dec("2705004952502749681"));

        let sqrt_lower = get_sqrt_ratio_at_tick(-600).unwrap();
        let sqrt_upper = get_sqrt_ratio_at_tick(1200).unwrap();
        let target = target_ratio_for_range(Q96, sqrt_lower, sqrt_upper).unwrap();
        assert!(within_tolerance(outcome.realized_ratio_q96, target, config.search.tolerance_bps));
    }
}
