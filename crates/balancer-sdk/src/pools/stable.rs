//! Stable pool family (stable, meta stable and composable stable pools).

use {
    super::{PoolSnapshot, common::TokenState},
    crate::{
        Error,
        swap::{self, fixed_point::Bfp, stable_math::AMP_PRECISION},
    },
    alloy::primitives::U256,
    anyhow::{Result, ensure},
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AmplificationParameter {
    factor: U256,
    precision: U256,
}

impl AmplificationParameter {
    pub fn try_new(factor: U256, precision: U256) -> Result<Self> {
        ensure!(!precision.is_zero(), "Zero precision not allowed");
        Ok(Self { factor, precision })
    }

    /// This is the format used to pass into smart contracts.
    pub fn with_base(&self, base: U256) -> Option<U256> {
        Some(self.factor.checked_mul(base)? / self.precision)
    }

    pub fn factor(&self) -> U256 {
        self.factor
    }

    pub fn precision(&self) -> U256 {
        self.precision
    }
}

/// The math view of a stable pool: the pool's own BPT is removed from the
/// token list and balances are ready to be upscaled.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StablePool {
    pub tokens: Vec<TokenState>,
    pub amplification_parameter: AmplificationParameter,
    pub total_supply: U256,
}

impl StablePool {
    pub fn try_from_snapshot(pool: &PoolSnapshot) -> Result<Self, Error> {
        if !pool.pool_type.is_stable_family() {
            return Err(Error::UnsupportedPoolType(pool.pool_type));
        }
        let amplification_parameter = pool
            .amplification_parameter
            .ok_or(Error::MissingAmplificationParameter(pool.id))?;

        Ok(Self {
            tokens: pool.math_tokens().map(|token| token.state).collect(),
            amplification_parameter,
            total_supply: pool.total_shares,
        })
    }

    /// The amplification parameter multiplied by `AMP_PRECISION`, the unit
    /// the stable math expects.
    pub fn amp(&self) -> Result<U256, swap::Error> {
        self.amplification_parameter
            .with_base(AMP_PRECISION)
            .ok_or(swap::Error::MulOverflow)
    }

    pub fn upscaled_balances(&self) -> Result<Vec<Bfp>, swap::Error> {
        self.tokens
            .iter()
            .map(TokenState::upscaled_balance)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::pools::{PoolToken, PoolType},
        alloy::primitives::{Address, B256},
    };

    #[test]
    fn amplification_parameter_conversions() {
        assert_eq!(
            AmplificationParameter::try_new(U256::from(2), U256::from(3))
                .unwrap()
                .with_base(U256::from(1000))
                .unwrap(),
            U256::from(666)
        );
        assert_eq!(
            AmplificationParameter::try_new(U256::ONE, U256::ZERO)
                .unwrap_err()
                .to_string(),
            "Zero precision not allowed"
        );
    }

    fn composable_stable_pool() -> PoolSnapshot {
        let address = Address::repeat_byte(0xbb);
        PoolSnapshot {
            id: B256::repeat_byte(0x01),
            address,
            pool_type: PoolType::ComposableStable,
            factory: None,
            tokens: vec![
                PoolToken::try_new(Address::repeat_byte(0x11), U256::from(1_000_000), 6, Bfp::one())
                    .unwrap(),
                PoolToken::try_new(address, U256::MAX, 18, Bfp::one()).unwrap(),
                PoolToken::try_new(Address::repeat_byte(0x22), U256::from(2_000_000), 6, Bfp::one())
                    .unwrap(),
            ],
            amplification_parameter: Some(
                AmplificationParameter::try_new(U256::from(200_000), AMP_PRECISION).unwrap(),
            ),
            total_shares: U256::from(3_000_000_000_000_000_000_u128),
            main_index: None,
            wrapped_index: None,
        }
    }

    #[test]
    fn excludes_own_bpt() {
        let pool = StablePool::try_from_snapshot(&composable_stable_pool()).unwrap();
        assert_eq!(pool.tokens.len(), 2);
        assert_eq!(
            pool.upscaled_balances().unwrap(),
            vec!["1".parse().unwrap(), "2".parse().unwrap()]
        );
        assert_eq!(pool.amp().unwrap(), U256::from(200_000));
    }

    #[test]
    fn rejects_non_stable_pools() {
        let mut pool = composable_stable_pool();
        pool.pool_type = PoolType::Weighted;
        assert!(matches!(
            StablePool::try_from_snapshot(&pool),
            Err(Error::UnsupportedPoolType(PoolType::Weighted))
        ));

        let mut pool = composable_stable_pool();
        pool.amplification_parameter = None;
        assert!(matches!(
            StablePool::try_from_snapshot(&pool),
            Err(Error::MissingAmplificationParameter(_))
        ));
    }
}
