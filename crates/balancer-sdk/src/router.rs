//! The swap router the composer relies on for path finding.
//!
//! Routing itself lives outside of this crate: implementations query the
//! smart order router or an API and report the paths and on-chain balances
//! they found.

use {
    crate::pools::PoolSnapshot,
    alloy::primitives::{Address, I256, U256},
    anyhow::Result,
    contracts::alloy::BatchSwapStep,
};

/// Vault swap kinds, with their on-chain discriminants.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[repr(u8)]
pub enum SwapKind {
    #[default]
    GivenIn = 0,
    GivenOut = 1,
}

/// Whether the router should refresh its pool data before answering.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FetchOptions {
    /// Reload the pool list from the pool data source.
    pub fetch_pools: bool,
    /// Refresh balances with on-chain queries.
    pub fetch_on_chain: bool,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BatchSwapQuery {
    pub tokens_in: Vec<Address>,
    pub tokens_out: Vec<Address>,
    pub kind: SwapKind,
    /// One amount per input token for `GivenIn`, per output token for
    /// `GivenOut`.
    pub amounts: Vec<U256>,
    pub fetch_options: FetchOptions,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchSwapQueryResult {
    pub swaps: Vec<BatchSwapStep>,
    pub assets: Vec<Address>,
    /// Vault deltas per asset: positive amounts are sent to the vault.
    pub deltas: Vec<I256>,
    /// Amount received per output token for `GivenIn`, amount paid per input
    /// token for `GivenOut`.
    pub return_amounts: Vec<U256>,
}

#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait::async_trait]
pub trait SwapRouting: Send + Sync {
    async fn query_batch_swap(&self, query: BatchSwapQuery) -> Result<BatchSwapQueryResult>;

    /// Reloads the pool list. Returns whether any pools are known afterwards.
    async fn fetch_pools(&self) -> Result<bool>;

    /// The pools as of the last fetch.
    fn get_pools(&self) -> Vec<PoolSnapshot>;
}
