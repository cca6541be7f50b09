//! Stable pool math, based on the `StableMath` library of the Balancer V2
//! contracts.
//!
//! The invariant mirrors the on-chain Newton iteration. The BPT spot price is
//! the closed-form derivative of the invariant with respect to one token
//! balance and is only used for off-chain estimates.

use {
    super::{error::Error, fixed_point::Bfp, math::BalU256},
    alloy::primitives::U256,
    num::{BigInt, Signed, Zero},
    number::conversions::{big_int_to_u256, u256_to_big_int},
    std::sync::LazyLock,
};

/// Amplification parameters are stored multiplied by this value.
pub const AMP_PRECISION: U256 = U256::from_limbs([1_000, 0, 0, 0]);

static ONE_18: LazyLock<BigInt> = LazyLock::new(|| BigInt::from(10).pow(18));

/// Computes the stable invariant `D` for upscaled balances.
///
/// `amplification_parameter` is `A * AMP_PRECISION`.
pub fn calculate_invariant(amplification_parameter: U256, balances: &[Bfp]) -> Result<U256, Error> {
    let num_tokens = U256::from(balances.len());
    let mut sum = U256::ZERO;
    for balance in balances {
        sum = sum.badd(balance.as_uint256())?;
    }
    if sum.is_zero() {
        return Ok(U256::ZERO);
    }

    let mut invariant = sum;
    let amp_times_total = amplification_parameter.bmul(num_tokens)?;

    for _ in 0..255 {
        let mut d_p = invariant;
        for balance in balances {
            d_p = d_p
                .bmul(invariant)?
                .bdiv_down(balance.as_uint256().bmul(num_tokens)?)?;
        }

        let previous_invariant = invariant;
        let numerator = amp_times_total
            .bmul(sum)?
            .bdiv_down(AMP_PRECISION)?
            .badd(d_p.bmul(num_tokens)?)?
            .bmul(invariant)?;
        let denominator = amp_times_total
            .bsub(AMP_PRECISION)?
            .bmul(invariant)?
            .bdiv_down(AMP_PRECISION)?
            .badd(num_tokens.badd(U256::ONE)?.bmul(d_p)?)?;
        invariant = numerator.bdiv_down(denominator)?;

        if invariant.abs_diff(previous_invariant) <= U256::ONE {
            return Ok(invariant);
        }
    }

    Err(Error::StableInvariantDidntConverge)
}

/// Spot price of the pool's BPT in terms of the token at `token_index`, as an
/// 18 decimal fixed point number: the amount of BPT minted for an
/// infinitesimal amount of that token.
pub fn bpt_spot_price(
    amplification_parameter: U256,
    balances: &[Bfp],
    bpt_supply: U256,
    token_index: usize,
) -> Result<Bfp, Error> {
    let x = balances.get(token_index).ok_or(Error::InvalidToken)?;
    if balances.iter().any(Bfp::is_zero) {
        return Err(Error::ZeroDivision);
    }

    let n = BigInt::from(balances.len());
    let d = u256_to_big_int(&calculate_invariant(amplification_parameter, balances)?);

    // `d_p` is `D^n / (n^n * prod(balances except x))`.
    let mut sum = BigInt::zero();
    let mut d_p = &d / &n;
    for (i, balance) in balances.iter().enumerate() {
        if i != token_index {
            let balance = u256_to_big_int(&balance.as_uint256());
            d_p = d_p * &d / (&n * &balance);
            sum += balance;
        }
    }

    let x = u256_to_big_int(&x.as_uint256());
    let amp_precision = u256_to_big_int(&AMP_PRECISION);
    let alpha = u256_to_big_int(&amplification_parameter) * &n;
    let beta = &alpha * &sum;
    let gamma = &amp_precision - &alpha;

    let partial_x = BigInt::from(2) * &alpha * &x + beta + &gamma * &d;
    let minus_partial_d: BigInt = &d_p * (&n + 1) * &amp_precision - &gamma * &x;
    if !minus_partial_d.is_positive() || !d.is_positive() {
        return Err(Error::ZeroDivision);
    }

    let ratio = partial_x * u256_to_big_int(&bpt_supply) / minus_partial_d;
    let price = if ratio.is_zero() {
        BigInt::zero()
    } else {
        (ratio * &*ONE_18 - 1) / &d + 1
    };
    big_int_to_u256(&price)
        .map(Bfp::from_wei)
        .ok_or(Error::MulOverflow)
}
