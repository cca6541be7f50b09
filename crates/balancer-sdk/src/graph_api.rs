//! Pool data in the shape served by the Balancer API and subgraph.
//!
//! Amounts are human readable decimal strings here and are converted into raw
//! token units when building a [`PoolSnapshot`].

use {
    crate::{
        pools::{PoolSnapshot, PoolToken, PoolType, stable::AmplificationParameter},
        swap::{fixed_point::Bfp, stable_math::AMP_PRECISION},
    },
    alloy::primitives::{Address, B256},
    anyhow::{Context, Result},
    number::units::parse_units,
    serde::Deserialize,
    serde_with::{DisplayFromStr, serde_as},
};

/// Amplification parameters are reported with this many decimals.
const AMP_DECIMALS: u8 = 3;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PoolData {
    pub id: B256,
    pub address: Address,
    pub pool_type: PoolType,
    #[serde(default)]
    pub factory: Option<Address>,
    #[serde(default)]
    pub amp: Option<String>,
    pub total_shares: String,
    pub tokens: Vec<Token>,
    #[serde(default)]
    pub main_index: Option<usize>,
    #[serde(default)]
    pub wrapped_index: Option<usize>,
}

#[serde_as]
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub address: Address,
    pub balance: String,
    pub decimals: u8,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub price_rate: Option<Bfp>,
}

impl PoolData {
    pub fn into_snapshot(self) -> Result<PoolSnapshot> {
        let tokens = self
            .tokens
            .into_iter()
            .map(|token| {
                let balance = parse_units(&token.balance, token.decimals)
                    .with_context(|| format!("balance of token {}", token.address))?;
                PoolToken::try_new(
                    token.address,
                    balance,
                    token.decimals,
                    token.price_rate.unwrap_or_else(Bfp::one),
                )
            })
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("tokens of pool {}", self.id))?;

        let amplification_parameter = self
            .amp
            .map(|amp| {
                AmplificationParameter::try_new(parse_units(&amp, AMP_DECIMALS)?, AMP_PRECISION)
            })
            .transpose()
            .with_context(|| format!("amplification parameter of pool {}", self.id))?;

        Ok(PoolSnapshot {
            id: self.id,
            address: self.address,
            pool_type: self.pool_type,
            factory: self.factory,
            tokens,
            amplification_parameter,
            // BPT always has 18 decimals.
            total_shares: parse_units(&self.total_shares, 18)
                .with_context(|| format!("total shares of pool {}", self.id))?,
            main_index: self.main_index,
            wrapped_index: self.wrapped_index,
        })
    }
}
