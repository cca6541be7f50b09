use {
    super::{
        KeyAllocator,
        Outputs,
        Relayer,
        TransactionData,
        chained_reference::is_chained_reference,
        encoding::{self, BatchSwapData, JoinPoolData, PoolKind},
        slippage::{Slippage, limits_for_slippage},
    },
    crate::{
        Error,
        error::Result,
        pool_index::PoolIndex,
        price_impact::StablePriceImpact,
        router::{BatchSwapQuery, FetchOptions, SwapKind},
        swap,
    },
    alloy::primitives::{Address, B256, Bytes, U256},
    contracts::alloy::{FundManagement, OutputReference},
    futures::future::try_join_all,
    std::collections::HashMap,
    tracing::instrument,
};

/// Join a pool with any mix of its own tokens and tokens of pools nested
/// inside it. Nested tokens are swapped into the pool token containing them
/// first.
#[derive(Clone, Debug, Default)]
pub struct NestedJoinInput {
    pub pool_id: B256,
    pub tokens_in: Vec<Address>,
    pub amounts_in: Vec<U256>,
    pub expected_bpt_out: U256,
    pub sender: Address,
    pub recipient: Address,
    pub slippage: Slippage,
    pub fetch_options: FetchOptions,
    pub authorisation: Option<Bytes>,
}

/// Input tokens that reach the joined pool through the same pool token.
struct NestedLeg {
    parent: Address,
    tokens: Vec<Address>,
    amounts: Vec<U256>,
}

impl Relayer {
    #[instrument(skip_all, fields(pool_id = %input.pool_id))]
    pub async fn join_nested_pool(&self, input: NestedJoinInput) -> Result<TransactionData> {
        if input.tokens_in.len() != input.amounts_in.len() {
            return Err(Error::InputLengthMismatch {
                expected: input.tokens_in.len(),
                actual: input.amounts_in.len(),
            });
        }

        let pools = self.pools(input.fetch_options).await?;
        let index = PoolIndex::new(&pools, &self.config);
        let pool = index.pool_by_id(input.pool_id)?;
        let join_tokens = pool
            .math_tokens()
            .map(|token| token.address)
            .collect::<Vec<_>>();

        let mut direct = HashMap::<Address, U256>::new();
        let mut legs = Vec::<NestedLeg>::new();
        for (token, amount) in input.tokens_in.iter().zip(&input.amounts_in) {
            if join_tokens.contains(token) {
                let total = direct.entry(*token).or_default();
                *total = total.checked_add(*amount).ok_or(swap::Error::AddOverflow)?;
                continue;
            }
            let parent = index.find_parent_token(pool, *token)?;
            match legs.iter_mut().find(|leg| leg.parent == parent) {
                Some(leg) => {
                    leg.tokens.push(*token);
                    leg.amounts.push(*amount);
                }
                None => legs.push(NestedLeg {
                    parent,
                    tokens: vec![*token],
                    amounts: vec![*amount],
                }),
            }
        }
        if let Some(leg) = legs.iter().find(|leg| direct.contains_key(&leg.parent)) {
            return Err(Error::AmbiguousJoinToken(leg.parent));
        }

        let queries = try_join_all(legs.iter().map(|leg| {
            self.query_batch_swap(BatchSwapQuery {
                tokens_in: leg.tokens.clone(),
                tokens_out: vec![leg.parent],
                kind: SwapKind::GivenIn,
                amounts: leg.amounts.clone(),
                fetch_options: input.fetch_options,
            })
        }))
        .await?;

        let mut calls = Vec::new();
        if let Some(authorisation) = input.authorisation.clone() {
            calls.push(encoding::set_relayer_approval(self.address(), authorisation));
        }

        // Join amount per pool token: a literal or a reference to the output
        // of the nested swap. Estimates are only used for the price impact.
        let mut nested_amounts = HashMap::<Address, U256>::new();
        let mut estimates = HashMap::<Address, U256>::new();
        let mut keys = KeyAllocator::default();
        for (leg, query) in legs.iter().zip(queries) {
            let estimate = query.return_amounts.first().copied().unwrap_or_default();
            estimates.insert(leg.parent, estimate);
            if estimate.is_zero() {
                tracing::debug!(parent = %leg.parent, "nested swap returns nothing, joining with zero");
                nested_amounts.insert(leg.parent, U256::ZERO);
                continue;
            }

            let parent_index = query
                .assets
                .iter()
                .position(|asset| *asset == leg.parent)
                .ok_or(Error::TokenNotFound(leg.parent))?;
            let reference = keys.next();
            let limits = limits_for_slippage(
                &leg.tokens,
                &[leg.parent],
                SwapKind::GivenIn,
                &query.deltas,
                &query.assets,
                input.slippage,
            )?;
            calls.push(encoding::batch_swap(BatchSwapData {
                kind: SwapKind::GivenIn,
                swaps: query.swaps,
                assets: query.assets,
                funds: FundManagement {
                    sender: input.sender,
                    fromInternalBalance: false,
                    recipient: input.sender,
                    toInternalBalance: false,
                },
                limits,
                output_references: vec![OutputReference {
                    index: U256::from(parent_index),
                    key: reference.into(),
                }],
            }));
            nested_amounts.insert(leg.parent, reference.into());
        }

        let join_amount = |token: &Address| {
            direct
                .get(token)
                .or_else(|| nested_amounts.get(token))
                .copied()
                .unwrap_or_default()
        };
        let assets = pool.token_addresses();
        // The vault checks the resolved amounts against these limits, which
        // cannot be known for referenced amounts.
        let max_amounts_in = assets
            .iter()
            .map(|asset| match join_amount(asset) {
                amount if is_chained_reference(amount) => U256::MAX,
                amount => amount,
            })
            .collect();
        let amounts_in = join_tokens.iter().map(join_amount).collect::<Vec<_>>();
        let min_bpt_out = input.slippage.subtract_from(input.expected_bpt_out)?;

        calls.push(encoding::join_pool(JoinPoolData {
            pool_id: pool.id,
            pool_kind: PoolKind::for_pool_type(pool.pool_type),
            sender: input.sender,
            recipient: input.recipient,
            assets,
            max_amounts_in,
            user_data: encoding::exact_tokens_in_for_bpt_out(&amounts_in, min_bpt_out),
            from_internal_balance: false,
            output_reference: U256::ZERO,
        }));

        let price_impact = if pool.pool_type.is_stable_family() {
            let estimated_amounts = join_tokens
                .iter()
                .map(|token| {
                    direct
                        .get(token)
                        .or_else(|| estimates.get(token))
                        .copied()
                        .unwrap_or_default()
                })
                .collect::<Vec<_>>();
            match StablePriceImpact::try_new(pool).and_then(|impact| {
                impact.calc_price_impact(&estimated_amounts, input.expected_bpt_out, true)
            }) {
                Ok(impact) => Some(impact),
                Err(err) => {
                    tracing::debug!(?err, "price impact unavailable");
                    None
                }
            }
        } else {
            None
        };

        // Inputs of dropped nested swaps stay with the sender.
        let spent_amounts = input
            .tokens_in
            .iter()
            .zip(&input.amounts_in)
            .map(|(token, amount)| {
                let dropped = legs.iter().any(|leg| {
                    leg.tokens.contains(token)
                        && estimates.get(&leg.parent).is_some_and(U256::is_zero)
                });
                if dropped { U256::ZERO } else { *amount }
            })
            .collect();

        Ok(TransactionData::new(
            &calls,
            Outputs {
                amounts_in: Some(spent_amounts),
                min_bpt_out: Some(min_bpt_out),
                price_impact,
                ..Default::default()
            },
        ))
    }
}
