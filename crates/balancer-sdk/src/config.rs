//! Relayer configuration loaded from a TOML file.
//!
//! ```toml
//! relayer = "0xBA12222222228d8Ba445958a75a0704d566BF2C8"
//! default-wrapping-protocol = "aave"
//!
//! [linear-pool-factories]
//! "0x4E11AEec21baF1660b1a46472963cB3DA7811C89" = "erc4626"
//! ```

use {
    crate::pools::{PoolSnapshot, linear::WrappingProtocol},
    alloy::primitives::Address,
    anyhow::{Context, Result},
    serde::Deserialize,
    serde_with::{DisplayFromStr, serde_as},
    std::{collections::HashMap, path::Path},
};

#[serde_as]
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RelayerConfig {
    /// Address of the batch relayer contract the multicall is sent to.
    pub relayer: Address,
    /// Wrapping protocol of the linear pools created by each factory.
    #[serde_as(as = "HashMap<DisplayFromStr, _>")]
    #[serde(default)]
    pub linear_pool_factories: HashMap<Address, WrappingProtocol>,
    /// Protocol assumed for linear pools whose factory and type are unknown.
    #[serde(default)]
    pub default_wrapping_protocol: WrappingProtocol,
}

impl RelayerConfig {
    pub fn new(relayer: Address) -> Self {
        Self {
            relayer,
            ..Default::default()
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading relayer config {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("parsing relayer config {}", path.display()))
    }

    /// Wrapping protocol of a linear pool: the protocol registered for its
    /// factory, else the one named by its pool type, else the default.
    pub fn wrapping_protocol(&self, pool: &PoolSnapshot) -> WrappingProtocol {
        pool.factory
            .and_then(|factory| self.linear_pool_factories.get(&factory).copied())
            .or_else(|| WrappingProtocol::from_pool_type(pool.pool_type))
            .unwrap_or(self.default_wrapping_protocol)
    }
}
