//! Price impact of joins and exits on stable pools.
//!
//! The zero impact baseline is the BPT amount that a join (or exit) would mint
//! (or burn) if every token traded at its current spot price. Comparing it to
//! the actual BPT amount yields the price impact as an 18 decimal fraction.

use {
    crate::{
        Error,
        error::Result,
        pools::{PoolSnapshot, stable::StablePool},
        swap::{self, fixed_point::Bfp, stable_math},
    },
    alloy::primitives::{I256, U256},
};

/// The BPT amount equivalent to `amounts` at current spot prices. `amounts`
/// are raw token amounts in the order of the pool's math tokens.
pub fn compute_zero_impact_baseline_amount(pool: &StablePool, amounts: &[U256]) -> Result<U256> {
    if amounts.len() != pool.tokens.len() {
        return Err(Error::InputLengthMismatch {
            expected: pool.tokens.len(),
            actual: amounts.len(),
        });
    }

    let amp = pool.amp()?;
    let balances = pool.upscaled_balances()?;
    let mut baseline = Bfp::zero();
    for (index, (token, amount)) in pool.tokens.iter().zip(amounts).enumerate() {
        if amount.is_zero() {
            continue;
        }
        let price = stable_math::bpt_spot_price(amp, &balances, pool.total_supply, index)?;
        baseline = baseline.add(token.upscale(*amount)?.mul_down(price)?)?;
    }
    Ok(baseline.as_uint256())
}

/// Signed price impact as an 18 decimal fraction.
///
/// For joins this is `1 - actual / baseline`, for exits `1 - baseline /
/// actual`, so that a worse than spot execution is positive in both
/// directions.
pub fn price_impact(actual: U256, baseline: U256, is_join: bool) -> Result<I256> {
    let (numerator, denominator) = if is_join {
        (actual, baseline)
    } else {
        (baseline, actual)
    };
    if baseline.is_zero() || denominator.is_zero() {
        return Err(Error::DivisionByZero);
    }

    let ratio = Bfp::from_wei(numerator).div_down(Bfp::from_wei(denominator))?;
    let ratio = I256::try_from(ratio.as_uint256()).map_err(|_| swap::Error::MulOverflow)?;
    let one = I256::from_raw(Bfp::one().as_uint256());
    Ok(one - ratio)
}

/// Price impact calculations for one stable family pool.
#[derive(Clone, Debug)]
pub struct StablePriceImpact {
    pool: StablePool,
}

impl StablePriceImpact {
    pub fn try_new(pool: &PoolSnapshot) -> Result<Self> {
        Ok(Self {
            pool: StablePool::try_from_snapshot(pool)?,
        })
    }

    pub fn bpt_zero_price_impact(&self, amounts: &[U256]) -> Result<U256> {
        compute_zero_impact_baseline_amount(&self.pool, amounts)
    }

    /// Price impact of joining with (or exiting to) `amounts` for
    /// `bpt_amount` BPT.
    pub fn calc_price_impact(&self, amounts: &[U256], bpt_amount: U256, is_join: bool) -> Result<I256> {
        let baseline = self.bpt_zero_price_impact(amounts)?;
        let impact = price_impact(bpt_amount, baseline, is_join)?;
        tracing::debug!(%baseline, %bpt_amount, is_join, %impact, "computed price impact");
        Ok(impact)
    }
}
