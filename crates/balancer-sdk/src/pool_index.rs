//! Read-only lookup tables over one snapshot of the known pools.
//!
//! An index is built once per composition call from the router's current pool
//! list, so that a call only ever sees a single consistent view.

use {
    crate::{
        Error,
        config::RelayerConfig,
        error::Result,
        pools::{PoolSnapshot, linear::LinearPoolDescriptor},
    },
    alloy::primitives::{Address, B256},
    std::collections::{HashMap, HashSet},
};

#[derive(Debug)]
pub struct PoolIndex<'a> {
    by_id: HashMap<B256, &'a PoolSnapshot>,
    by_address: HashMap<Address, &'a PoolSnapshot>,
    linear_by_wrapped_token: HashMap<Address, LinearPoolDescriptor>,
}

impl<'a> PoolIndex<'a> {
    pub fn new(pools: &'a [PoolSnapshot], config: &RelayerConfig) -> Self {
        let linear_by_wrapped_token = pools
            .iter()
            .filter_map(|pool| {
                LinearPoolDescriptor::from_snapshot(pool, config.wrapping_protocol(pool))
            })
            .map(|linear| (linear.wrapped_token, linear))
            .collect();

        Self {
            by_id: pools.iter().map(|pool| (pool.id, pool)).collect(),
            by_address: pools.iter().map(|pool| (pool.address, pool)).collect(),
            linear_by_wrapped_token,
        }
    }

    pub fn pool_by_id(&self, id: B256) -> Result<&'a PoolSnapshot> {
        self.by_id.get(&id).copied().ok_or(Error::PoolNotFound(id))
    }

    /// The pool whose BPT is `address`, if any.
    pub fn pool_by_address(&self, address: Address) -> Option<&'a PoolSnapshot> {
        self.by_address.get(&address).copied()
    }

    pub fn linear_pool_by_wrapped_token(&self, token: Address) -> Result<&LinearPoolDescriptor> {
        self.linear_by_wrapped_token
            .get(&token)
            .ok_or(Error::LinearPoolNotFound(token))
    }

    pub fn is_wrapped_token(&self, token: Address) -> bool {
        self.linear_by_wrapped_token.contains_key(&token)
    }

    /// Finds the token of `pool` through whose nested pools `token` can be
    /// swapped into `pool`. Nesting is followed to any depth.
    pub fn find_parent_token(&self, pool: &PoolSnapshot, token: Address) -> Result<Address> {
        let mut visited = HashSet::from([pool.address]);
        pool.math_tokens()
            .map(|candidate| candidate.address)
            .find(|candidate| self.nested_pool_contains(*candidate, token, &mut visited))
            .ok_or(Error::TokenNotFound(token))
    }

    fn nested_pool_contains(
        &self,
        bpt: Address,
        token: Address,
        visited: &mut HashSet<Address>,
    ) -> bool {
        if !visited.insert(bpt) {
            return false;
        }
        let Some(pool) = self.pool_by_address(bpt) else {
            return false;
        };
        if !pool.pool_type.is_nestable() {
            return false;
        }
        pool.math_tokens().any(|nested| {
            nested.address == token || self.nested_pool_contains(nested.address, token, visited)
        })
    }
}
