use lp_types::{
    LpError, LpResult, PoolSnapshot, MAX_SQRT_RATIO, MAX_TICK, MIN_SQRT_RATIO, MIN_TICK, U256,
};

// sqrt(1.0001^-(2^i)) in Q128, i = 0..=19
const SQRT_1_0001_1: u128 = 0xfffcb933bd6fad37aa2d162d1a594001;
const SQRT_1_0001_2: u128 = 0xfff97272373d413259a46990580e213a;
const SQRT_1_0001_4: u128 = 0xfff2e50f5f656932ef12357cf3c7fdcc;
const SQRT_1_0001_8: u128 = 0xffe5caca7e10e4e61c3624eaa0941cd0;
const SQRT_1_0001_16: u128 = 0xffcb9843d60f6159c9db58835c926644;
const SQRT_1_0001_32: u128 = 0xff973b41fa98c081472e6896dfb254c0;
const SQRT_1_0001_64: u128 = 0xff2ea16466c96a3843ec78b326b52861;
const SQRT_1_0001_128: u128 = 0xfe5dee046a99a2a811c461f1969c3053;
const SQRT_1_0001_256: u128 = 0xfcbe86c7900a88aedcffc83b479aa3a4;
const SQRT_1_0001_512: u128 = 0xf987a7253ac413176f2b074cf7815e54;
const SQRT_1_0001_1024: u128 = 0xf3392b0822b70005940c7a398e4b70f3;
const SQRT_1_0001_2048: u128 = 0xe7159475a2c29b7443b29c7fa6e889d9;
const SQRT_1_0001_4096: u128 = 0xd097f3bdfd2022b8845ad8f792aa5825;
const SQRT_1_0001_8192: u128 = 0xa9f746462d870fdf8a65dc1f90e061e5;
const SQRT_1_0001_16384: u128 = 0x70d869a156d2a1b890bb3df62baf32f7;
const SQRT_1_0001_32768: u128 = 0x31be135f97d08fd981231505542fcfa6;
const SQRT_1_0001_65536: u128 = 0x9aa508b5b7a84e1c677de54f3e99bc9;
const SQRT_1_0001_131072: u128 = 0x5d6af8dedb81196699c329225ee604;
const SQRT_1_0001_262144: u128 = 0x2216e584f5fa1ea926041bedfe98;
const SQRT_1_0001_524288: u128 = 0x48a170391f7dc42444e8fa2;

const BIT_FACTORS: [(u32, u128); 19] = [
    (0x2, SQRT_1_0001_2),
    (0x4, SQRT_1_0001_4),
    (0x8, SQRT_1_0001_8),
    (0x10, SQRT_1_0001_16),
    (0x20, SQRT_1_0001_32),
    (0x40, SQRT_1_0001_64),
    (0x80, SQRT_1_0001_128),
    (0x100, SQRT_1_0001_256),
    (0x200, SQRT_1_0001_512),
    (0x400, SQRT_1_0001_1024),
    (0x800, SQRT_1_0001_2048),
    (0x1000, SQRT_1_0001_4096),
    (0x2000, SQRT_1_0001_8192),
    (0x4000, SQRT_1_0001_16384),
    (0x8000, SQRT_1_0001_32768),
    (0x10000, SQRT_1_0001_65536),
    (0x20000, SQRT_1_0001_131072),
    (0x40000, SQRT_1_0001_262144),
    (0x80000, SQRT_1_0001_524288),
];

/// Calculate sqrt(1.0001^tick) * 2^96, rounded up
///
/// Bit-exact with the on-chain tick math for every tick in
/// `[MIN_TICK, MAX_TICK]`.
pub fn get_sqrt_ratio_at_tick(tick: i32) -> LpResult<U256> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(LpError::TickOutOfBounds(tick));
    }

    let abs_tick = tick.unsigned_abs();

    // Ratio for the negative tick in Q128
    let mut ratio = if abs_tick & 0x1 != 0 {
        U256::from(SQRT_1_0001_1)
    } else {
        U256::one() << 128
    };
    for (bit, factor) in BIT_FACTORS {
        if abs_tick & bit != 0 {
            ratio = mul_shift_128(ratio, factor);
        }
    }

    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Q128 -> Q96, rounding up so the inverse lookup stays consistent
    let rounding = if (ratio & U256::from(u32::MAX)).is_zero() {
        U256::zero()
    } else {
        U256::one()
    };
    Ok((ratio >> 32) + rounding)
}

/// Greatest tick whose sqrt ratio is less than or equal to `sqrt_price_x96`
pub fn get_tick_at_sqrt_ratio(sqrt_price_x96: U256) -> LpResult<i32> {
    if sqrt_price_x96 < MIN_SQRT_RATIO || sqrt_price_x96 >= MAX_SQRT_RATIO {
        return Err(LpError::SqrtPriceOutOfBounds);
    }

    // Binary search for the tick
    let mut low = MIN_TICK;
    let mut high = MAX_TICK;

    while low < high {
        let mid = low + (high - low + 1) / 2;
        if get_sqrt_ratio_at_tick(mid)? <= sqrt_price_x96 {
            low = mid;
        } else {
            high = mid - 1;
        }
    }

    Ok(low)
}

/// Largest multiple of `tick_spacing` that is `<= tick`
pub fn floor_tick(tick: i32, tick_spacing: i32) -> LpResult<i32> {
    if tick_spacing <= 0 {
        return Err(LpError::InvalidTickSpacing(tick_spacing));
    }
    Ok(tick.div_euclid(tick_spacing) * tick_spacing)
}

/// Multiple of `tick_spacing` nearest to zero from `tick`
///
/// Negative ticks move up (`-10 -> -9` for spacing 3) while positive ticks
/// move down (`10 -> 9`), matching the range helpers of the position manager
/// contract this engine feeds.
pub fn ceil_tick(tick: i32, tick_spacing: i32) -> LpResult<i32> {
    if tick_spacing <= 0 {
        return Err(LpError::InvalidTickSpacing(tick_spacing));
    }
    Ok((tick / tick_spacing) * tick_spacing)
}

/// Check that a pool snapshot is internally consistent
pub fn validate_pool(pool: &PoolSnapshot) -> LpResult<()> {
    if pool.tick_spacing <= 0 {
        return Err(LpError::InvalidTickSpacing(pool.tick_spacing));
    }
    if pool.sqrt_price_x96 < MIN_SQRT_RATIO || pool.sqrt_price_x96 > MAX_SQRT_RATIO {
        return Err(LpError::SqrtPriceOutOfBounds);
    }
    if !(MIN_TICK..=MAX_TICK).contains(&pool.tick) {
        return Err(LpError::TickOutOfBounds(pool.tick));
    }

    let at_tick = get_sqrt_ratio_at_tick(pool.tick)?;
    let at_next = if pool.tick == MAX_TICK {
        MAX_SQRT_RATIO
    } else {
        get_sqrt_ratio_at_tick(pool.tick + 1)?
    };
    if pool.sqrt_price_x96 < at_tick || pool.sqrt_price_x96 > at_next {
        return Err(LpError::StaleOrInconsistentSnapshot(
            "pool tick does not match sqrt price",
        ));
    }
    Ok(())
}

/// Helper: multiply a Q128 ratio by a Q128 factor, keep Q128
fn mul_shift_128(x: U256, y: u128) -> U256 {
    // x <= 2^128 and y < 2^128, so the product fits in 256 bits
    (x * U256::from(y)) >> 128
}

#[cfg(test)]
mod tests {
    use super::*;
    use lp_types::Q96;

    fn dec(s: &str) -> U256 {
        U256::from_dec_str(s).unwrap()
    }

    // === get_sqrt_ratio_at_tick tests ===

    #[test]
    fn test_get_sqrt_ratio_at_tick_zero() {
        assert_eq!(get_sqrt_ratio_at_tick(0).unwrap(), Q96);
    }

    #[test]
    fn test_get_sqrt_ratio_at_tick_bounds() {
        assert_eq!(get_sqrt_ratio_at_tick(MIN_TICK).unwrap(), MIN_SQRT_RATIO);
        assert_eq!(get_sqrt_ratio_at_tick(MAX_TICK).unwrap(), MAX_SQRT_RATIO);
        assert_eq!(
            get_sqrt_ratio_at_tick(MAX_TICK - 1).unwrap(),
            dec("1461373636630004318706518188784493106690254656249")
        );
    }

    #[test]
    fn test_get_sqrt_ratio_at_tick_reference_values() {
        assert_eq!(get_sqrt_ratio_at_tick(1).unwrap(), dec("79232123823359799118286999568"));
        assert_eq!(get_sqrt_ratio_at_tick(-1).unwrap(), dec("79224201403219477170569942574"));
        assert_eq!(get_sqrt_ratio_at_tick(60).unwrap(), dec("79466191966197645195421774833"));
        assert_eq!(get_sqrt_ratio_at_tick(-60).unwrap(), dec("78990846045029531151608375686"));
        assert_eq!(get_sqrt_ratio_at_tick(10000).unwrap(), dec("130621891405341611593710811006"));
        assert_eq!(get_sqrt_ratio_at_tick(-10000).unwrap(), dec("48055510970269007215549348797"));
        assert_eq!(
            get_sqrt_ratio_at_tick(200000).unwrap(),
            dec("1744244129640337381386292603617838")
        );
        assert_eq!(get_sqrt_ratio_at_tick(-58680).unwrap(), dec("4214278966569797897404660827"));
        assert_eq!(get_sqrt_ratio_at_tick(-56640).unwrap(), dec("4666799073680703239212730060"));
    }

    #[test]
    fn test_get_sqrt_ratio_at_tick_out_of_bounds() {
        assert_eq!(
            get_sqrt_ratio_at_tick(MIN_TICK - 1),
            Err(LpError::TickOutOfBounds(MIN_TICK - 1))
        );
        assert_eq!(
            get_sqrt_ratio_at_tick(MAX_TICK + 1),
            Err(LpError::TickOutOfBounds(MAX_TICK + 1))
        );
    }

    // === get_tick_at_sqrt_ratio tests ===

    #[test]
    fn test_get_tick_at_sqrt_ratio_exact_ticks() {
        for tick in [MIN_TICK, -58680, -60, -1, 0, 1, 60, 10000, 200000, MAX_TICK - 1] {
            let sqrt = get_sqrt_ratio_at_tick(tick).unwrap();
            assert_eq!(get_tick_at_sqrt_ratio(sqrt).unwrap(), tick);
        }
    }

    #[test]
    fn test_get_tick_at_sqrt_ratio_between_ticks() {
        let sqrt = get_sqrt_ratio_at_tick(100).unwrap();
        assert_eq!(get_tick_at_sqrt_ratio(sqrt - 1).unwrap(), 99);
        assert_eq!(get_tick_at_sqrt_ratio(sqrt + 1).unwrap(), 100);
    }

    #[test]
    fn test_get_tick_at_sqrt_ratio_out_of_bounds() {
        assert_eq!(
            get_tick_at_sqrt_ratio(MIN_SQRT_RATIO - 1),
            Err(LpError::SqrtPriceOutOfBounds)
        );
        assert_eq!(get_tick_at_sqrt_ratio(MAX_SQRT_RATIO), Err(LpError::SqrtPriceOutOfBounds));
    }

    // === floor_tick / ceil_tick tests ===

    #[test]
    fn test_floor_tick() {
        assert_eq!(floor_tick(-10, 3).unwrap(), -12);
        assert_eq!(floor_tick(-11, 3).unwrap(), -12);
        assert_eq!(floor_tick(-12, 3).unwrap(), -12);
        assert_eq!(floor_tick(10, 3).unwrap(), 9);
        assert_eq!(floor_tick(9, 3).unwrap(), 9);
        assert_eq!(floor_tick(8, 3).unwrap(), 6);
    }

    #[test]
    fn test_ceil_tick() {
        assert_eq!(ceil_tick(-10, 3).unwrap(), -9);
        assert_eq!(ceil_tick(-12, 3).unwrap(), -12);
        assert_eq!(ceil_tick(10, 3).unwrap(), 9);
        assert_eq!(ceil_tick(0, 3).unwrap(), 0);
    }

    #[test]
    fn test_alignment_rejects_bad_spacing() {
        assert_eq!(floor_tick(5, 0), Err(LpError::InvalidTickSpacing(0)));
        assert_eq!(ceil_tick(5, -3), Err(LpError::InvalidTickSpacing(-3)));
    }

    // === validate_pool tests ===

    #[test]
    fn test_validate_pool() {
        let sqrt = get_sqrt_ratio_at_tick(-120).unwrap();
        assert!(validate_pool(&PoolSnapshot::new(sqrt, -120, 60, 1)).is_ok());
        assert!(validate_pool(&PoolSnapshot::new(sqrt + 10, -120, 60, 1)).is_ok());
        // Swap that stopped exactly on a boundary moving down
        assert!(validate_pool(&PoolSnapshot::new(sqrt, -121, 60, 1)).is_ok());
        assert_eq!(
            validate_pool(&PoolSnapshot::new(sqrt, 0, 60, 1)),
            Err(LpError::StaleOrInconsistentSnapshot("pool tick does not match sqrt price"))
        );
        assert_eq!(
            validate_pool(&PoolSnapshot::new(sqrt, -120, 0, 1)),
            Err(LpError::InvalidTickSpacing(0))
        );
    }
}
