//! Linear pools pairing a main token with its yield-bearing wrapped form.

use {
    super::{PoolSnapshot, PoolType},
    crate::swap::fixed_point::Bfp,
    alloy::primitives::{Address, B256},
    serde::{Deserialize, Serialize},
    strum::{Display, EnumString},
};

/// The protocol issuing a linear pool's wrapped token. Each protocol has its
/// own relayer library entry point for unwrapping.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Display, EnumString, Eq, Hash, PartialEq, Serialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WrappingProtocol {
    #[default]
    Aave,
    Erc4626,
    Euler,
    Gearbox,
    Reaper,
    Tetu,
    Yearn,
}

impl WrappingProtocol {
    /// Protocol implied by a linear pool's type tag, if it names one.
    pub fn from_pool_type(pool_type: PoolType) -> Option<Self> {
        Some(match pool_type {
            PoolType::AaveLinear => Self::Aave,
            PoolType::Erc4626Linear => Self::Erc4626,
            PoolType::EulerLinear => Self::Euler,
            PoolType::GearboxLinear => Self::Gearbox,
            PoolType::ReaperLinear => Self::Reaper,
            PoolType::TetuLinear => Self::Tetu,
            PoolType::YearnLinear => Self::Yearn,
            _ => return None,
        })
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LinearPoolDescriptor {
    pub pool_id: B256,
    pub address: Address,
    pub main_token: Address,
    pub wrapped_token: Address,
    /// Underlying amount per wrapped token.
    pub wrapped_token_rate: Bfp,
    pub protocol: WrappingProtocol,
}

impl LinearPoolDescriptor {
    /// Returns `None` for pools that are not linear or lack main and wrapped
    /// token indices.
    pub fn from_snapshot(pool: &PoolSnapshot, protocol: WrappingProtocol) -> Option<Self> {
        if !pool.pool_type.is_linear() {
            return None;
        }
        let main = pool.tokens.get(pool.main_index?)?;
        let wrapped = pool.tokens.get(pool.wrapped_index?)?;
        Some(Self {
            pool_id: pool.id,
            address: pool.address,
            main_token: main.address,
            wrapped_token: wrapped.address,
            wrapped_token_rate: wrapped.price_rate,
            protocol,
        })
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::pools::PoolToken, alloy::primitives::U256};

    #[test]
    fn protocol_names() {
        assert_eq!(WrappingProtocol::Erc4626.to_string(), "erc4626");
        assert_eq!("yearn".parse::<WrappingProtocol>().unwrap(), WrappingProtocol::Yearn);
        assert_eq!(
            serde_json::from_str::<WrappingProtocol>("\"gearbox\"").unwrap(),
            WrappingProtocol::Gearbox
        );
        assert_eq!(WrappingProtocol::default(), WrappingProtocol::Aave);
        assert_eq!(
            WrappingProtocol::from_pool_type(PoolType::Erc4626Linear),
            Some(WrappingProtocol::Erc4626)
        );
        assert_eq!(WrappingProtocol::from_pool_type(PoolType::Linear), None);
    }

    #[test]
    fn descriptor_from_linear_pool() {
        let address = Address::repeat_byte(0xaa);
        let rate = "1.05".parse().unwrap();
        let pool = PoolSnapshot {
            id: B256::repeat_byte(0x0a),
            address,
            pool_type: PoolType::AaveLinear,
            factory: None,
            tokens: vec![
                PoolToken::try_new(Address::repeat_byte(1), U256::ZERO, 18, Bfp::one()).unwrap(),
                PoolToken::try_new(address, U256::ZERO, 18, Bfp::one()).unwrap(),
                PoolToken::try_new(Address::repeat_byte(2), U256::ZERO, 18, rate).unwrap(),
            ],
            amplification_parameter: None,
            total_shares: U256::ZERO,
            main_index: Some(0),
            wrapped_index: Some(2),
        };

        let descriptor = LinearPoolDescriptor::from_snapshot(&pool, WrappingProtocol::Aave).unwrap();
        assert_eq!(descriptor.main_token, Address::repeat_byte(1));
        assert_eq!(descriptor.wrapped_token, Address::repeat_byte(2));
        assert_eq!(descriptor.wrapped_token_rate, rate);

        let pool = PoolSnapshot {
            wrapped_index: None,
            ..pool
        };
        assert_eq!(LinearPoolDescriptor::from_snapshot(&pool, WrappingProtocol::Aave), None);
    }
}
