//! Composition of batch relayer multicalls.
//!
//! Every composition builds its own [`PoolIndex`] from the router's pool list
//! and only suspends while waiting for the router. Amounts only known once an
//! earlier call has executed are passed on with chained references.

pub mod chained_reference;
pub mod encoding;
mod exit_swap;
mod nested_join;
pub mod slippage;
mod unwrap;

pub use self::{
    exit_swap::ExitAndBatchSwapInput,
    nested_join::NestedJoinInput,
    unwrap::{SwapUnwrapInput, UnwrapCalls, compose_unwrap_calls},
};
use {
    self::chained_reference::ChainedReference,
    crate::{
        Error,
        config::RelayerConfig,
        error::Result,
        pools::PoolSnapshot,
        router::{BatchSwapQuery, BatchSwapQueryResult, FetchOptions, SwapKind, SwapRouting},
    },
    alloy::{
        primitives::{Address, Bytes, I256, U256},
        sol_types::SolInterface,
    },
    contracts::alloy::BatchRelayerLibrary::BatchRelayerLibraryCalls,
    serde::Serialize,
    serde_with::{DisplayFromStr, serde_as},
    std::sync::Arc,
};

pub struct Relayer {
    config: RelayerConfig,
    router: Arc<dyn SwapRouting>,
}

impl Relayer {
    pub fn new(config: RelayerConfig, router: Arc<dyn SwapRouting>) -> Self {
        Self { config, router }
    }

    /// Address of the relayer contract.
    pub fn address(&self) -> Address {
        self.config.relayer
    }

    async fn pools(&self, fetch_options: FetchOptions) -> Result<Vec<PoolSnapshot>> {
        if fetch_options.fetch_pools {
            let found = self.router.fetch_pools().await.map_err(Error::Router)?;
            tracing::debug!(found, "fetched pools");
        }
        Ok(self.router.get_pools())
    }

    async fn query_batch_swap(&self, query: BatchSwapQuery) -> Result<BatchSwapQueryResult> {
        tracing::debug!(?query, "querying batch swap");
        // One return amount per token with an unknown amount.
        let expected = match query.kind {
            SwapKind::GivenIn => query.tokens_out.len(),
            SwapKind::GivenOut => query.tokens_in.len(),
        };
        let result = self
            .router
            .query_batch_swap(query)
            .await
            .map_err(Error::Router)?;
        tracing::debug!(
            swaps = result.swaps.len(),
            return_amounts = ?result.return_amounts,
            "batch swap query result"
        );
        if result.return_amounts.len() != expected {
            return Err(Error::InputLengthMismatch {
                expected,
                actual: result.return_amounts.len(),
            });
        }
        Ok(result)
    }
}

/// Hands out chained reference keys that are unique within one multicall.
#[derive(Debug, Default)]
pub struct KeyAllocator {
    next: u64,
}

impl KeyAllocator {
    pub fn starting_at(key: u64) -> Self {
        Self { next: key }
    }

    pub fn next(&mut self) -> ChainedReference {
        let reference = ChainedReference::temporary(self.next);
        self.next += 1;
        reference
    }
}

/// A relayer multicall together with the amounts it is expected to produce.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionData {
    pub function: String,
    /// The encoded library calls, in execution order.
    pub params: Vec<Bytes>,
    pub outputs: Outputs,
}

impl TransactionData {
    pub fn new(calls: &[BatchRelayerLibraryCalls], outputs: Outputs) -> Self {
        Self {
            function: "multicall".to_owned(),
            params: calls.iter().map(|call| call.abi_encode().into()).collect(),
            outputs,
        }
    }

    /// Calldata for the relayer's `multicall`.
    pub fn calldata(&self) -> Bytes {
        encoding::multicall(&self.params)
    }

    pub fn decode_calls(&self) -> Result<Vec<BatchRelayerLibraryCalls>, alloy::sol_types::Error> {
        encoding::decode_calls(&self.params)
    }
}

/// Named outputs of a composition, as decimal strings of raw amounts.
#[serde_as]
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Outputs {
    #[serde_as(as = "Option<Vec<DisplayFromStr>>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amounts_out: Option<Vec<U256>>,
    #[serde_as(as = "Option<Vec<DisplayFromStr>>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_amounts_out: Option<Vec<U256>>,
    #[serde_as(as = "Option<Vec<DisplayFromStr>>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amounts_in: Option<Vec<U256>>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_bpt_out: Option<U256>,
    /// Price impact as an 18 decimal fraction.
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_impact: Option<I256>,
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn allocates_distinct_keys() {
        let mut keys = KeyAllocator::starting_at(2);
        assert_eq!(keys.next(), ChainedReference::temporary(2));
        assert_eq!(keys.next(), ChainedReference::temporary(3));
    }

    #[test]
    fn serializes_transaction_data() {
        let data = TransactionData {
            function: "multicall".to_owned(),
            params: vec![Bytes::from_static(&[0x12, 0x34])],
            outputs: Outputs {
                amounts_out: Some(vec![U256::from(101), U256::from(202)]),
                min_bpt_out: Some(U256::from(7)),
                ..Default::default()
            },
        };
        assert_eq!(
            serde_json::to_value(&data).unwrap(),
            json!({
                "function": "multicall",
                "params": ["0x1234"],
                "outputs": {
                    "amountsOut": ["101", "202"],
                    "minBptOut": "7",
                },
            })
        );
    }
}
