//! Point-in-time pool snapshots and the math views derived from them.

pub mod common;
pub mod linear;
pub mod stable;

use {
    self::{
        common::{TokenState, scaling_factor_from_decimals},
        stable::AmplificationParameter,
    },
    crate::swap::fixed_point::Bfp,
    alloy::primitives::{Address, B256, U256},
    anyhow::Result,
    serde::{Deserialize, Serialize},
};

/// Supported pool kinds, named as in the Balancer API.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum PoolType {
    Weighted,
    Stable,
    MetaStable,
    ComposableStable,
    AaveLinear,
    #[serde(rename = "ERC4626Linear")]
    Erc4626Linear,
    EulerLinear,
    GearboxLinear,
    ReaperLinear,
    TetuLinear,
    YearnLinear,
    Linear,
    #[serde(other)]
    Other,
}

impl PoolType {
    pub fn is_stable_family(self) -> bool {
        matches!(self, Self::Stable | Self::MetaStable | Self::ComposableStable)
    }

    pub fn is_linear(self) -> bool {
        matches!(
            self,
            Self::AaveLinear
                | Self::Erc4626Linear
                | Self::EulerLinear
                | Self::GearboxLinear
                | Self::ReaperLinear
                | Self::TetuLinear
                | Self::YearnLinear
                | Self::Linear
        )
    }

    /// Pools that register their own BPT as one of the pool tokens.
    pub fn holds_own_bpt(self) -> bool {
        self == Self::ComposableStable || self.is_linear()
    }

    /// Pools whose BPT can be reached by swapping one of their tokens in,
    /// which is how nested joins enter them.
    pub fn is_nestable(self) -> bool {
        self.holds_own_bpt()
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolToken {
    pub address: Address,
    pub decimals: u8,
    pub price_rate: Bfp,
    pub state: TokenState,
}

impl PoolToken {
    pub fn try_new(address: Address, balance: U256, decimals: u8, price_rate: Bfp) -> Result<Self> {
        let scaling_factor = scaling_factor_from_decimals(decimals)?.mul_down(price_rate)?;
        Ok(Self {
            address,
            decimals,
            price_rate,
            state: TokenState {
                balance,
                scaling_factor,
            },
        })
    }
}

/// Immutable view of one pool at query time.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolSnapshot {
    pub id: B256,
    pub address: Address,
    pub pool_type: PoolType,
    pub factory: Option<Address>,
    /// Pool tokens in vault order, including the pool's own BPT for pools
    /// that hold it.
    pub tokens: Vec<PoolToken>,
    pub amplification_parameter: Option<AmplificationParameter>,
    pub total_shares: U256,
    pub main_index: Option<usize>,
    pub wrapped_index: Option<usize>,
}

impl PoolSnapshot {
    /// Tokens taking part in the pool math, i.e. without the self-held BPT.
    pub fn math_tokens(&self) -> impl Iterator<Item = &PoolToken> + '_ {
        let skip_bpt = self.pool_type.holds_own_bpt();
        self.tokens
            .iter()
            .filter(move |token| !(skip_bpt && token.address == self.address))
    }

    /// All token addresses in vault order, as expected by join and exit
    /// requests.
    pub fn token_addresses(&self) -> Vec<Address> {
        self.tokens.iter().map(|token| token.address).collect()
    }

    pub fn bpt_index(&self) -> Option<usize> {
        self.tokens
            .iter()
            .position(|token| token.address == self.address)
    }
}
