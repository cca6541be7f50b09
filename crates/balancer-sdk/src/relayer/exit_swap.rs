use {
    super::{
        KeyAllocator,
        Outputs,
        Relayer,
        TransactionData,
        chained_reference::ChainedReference,
        compose_unwrap_calls,
        encoding::{self, BatchSwapData, ExitPoolData, PoolKind},
        slippage::{Slippage, limits_for_slippage},
    },
    crate::{
        Error,
        error::Result,
        pool_index::PoolIndex,
        router::{BatchSwapQuery, FetchOptions, SwapKind},
        swap::{self, fixed_point::Bfp},
    },
    alloy::primitives::{Address, B256, Bytes, I256, U256},
    contracts::alloy::{FundManagement, OutputReference},
    tracing::instrument,
};

/// Exit a pool into the exiter's internal balance and swap the exited tokens
/// into `final_tokens_out` within the same multicall.
#[derive(Clone, Debug, Default)]
pub struct ExitAndBatchSwapInput {
    pub exiter: Address,
    pub swap_recipient: Address,
    pub pool_id: B256,
    /// Tokens received from the exit, a subset of the pool tokens.
    pub exit_tokens: Vec<Address>,
    /// Exit user data, passed to the pool unchanged.
    pub user_data: Bytes,
    /// Expected exit amount per exit token.
    pub expected_amounts_out: Vec<U256>,
    pub final_tokens_out: Vec<Address>,
    pub slippage: Slippage,
    pub fetch_options: FetchOptions,
    /// Unwrap the final tokens, which then all have to be linear pool wrapped
    /// tokens, into their main tokens.
    pub unwrap_tokens_out: bool,
    /// Signature approving the relayer, if the exiter has not done so yet.
    pub authorisation: Option<Bytes>,
}

impl Relayer {
    #[instrument(skip_all, fields(pool_id = %input.pool_id))]
    pub async fn exit_pool_and_batch_swap(
        &self,
        input: ExitAndBatchSwapInput,
    ) -> Result<TransactionData> {
        if input.exit_tokens.len() != input.expected_amounts_out.len() {
            return Err(Error::InputLengthMismatch {
                expected: input.exit_tokens.len(),
                actual: input.expected_amounts_out.len(),
            });
        }

        let pools = self.pools(input.fetch_options).await?;
        let index = PoolIndex::new(&pools, &self.config);
        let pool = index.pool_by_id(input.pool_id)?;

        // The exit's worst case is what the swap is sized with.
        let min_amounts_out = input
            .expected_amounts_out
            .iter()
            .map(|amount| input.slippage.subtract_from(*amount))
            .collect::<Result<Vec<_>, _>>()?;

        let pool_tokens = pool.token_addresses();
        let mut exit_min_amounts_out = vec![U256::ZERO; pool_tokens.len()];
        let mut exit_output_references = Vec::with_capacity(input.exit_tokens.len());
        for (i, (token, min_amount)) in input.exit_tokens.iter().zip(&min_amounts_out).enumerate() {
            let position = pool_tokens
                .iter()
                .position(|pool_token| pool_token == token)
                .ok_or(Error::TokenNotFound(*token))?;
            exit_min_amounts_out[position] = *min_amount;
            exit_output_references.push(OutputReference {
                index: U256::from(position),
                key: exit_reference(i).into(),
            });
        }

        let mut calls = Vec::new();
        if let Some(authorisation) = input.authorisation.clone() {
            calls.push(encoding::set_relayer_approval(self.address(), authorisation));
        }
        calls.push(encoding::exit_pool(ExitPoolData {
            pool_id: pool.id,
            pool_kind: PoolKind::for_pool_type(pool.pool_type),
            sender: input.exiter,
            recipient: input.exiter,
            assets: pool_tokens,
            min_amounts_out: exit_min_amounts_out,
            user_data: input.user_data.clone(),
            to_internal_balance: true,
            output_references: exit_output_references,
        }));

        let mut query = self
            .query_batch_swap(BatchSwapQuery {
                tokens_in: input.exit_tokens.clone(),
                tokens_out: input.final_tokens_out.clone(),
                kind: SwapKind::GivenIn,
                amounts: min_amounts_out.clone(),
                fetch_options: input.fetch_options,
            })
            .await?;
        if query.return_amounts.iter().any(U256::is_zero) {
            return Err(Error::SwapZeroReturnAmount);
        }

        // Legs starting from an exited token spend whatever the exit actually
        // returned. Multi-hop legs with a zero amount keep consuming the
        // previous leg's output.
        for step in &mut query.swaps {
            let asset_in = usize::try_from(step.assetInIndex)
                .ok()
                .and_then(|i| query.assets.get(i));
            let exit_index = asset_in
                .and_then(|asset| input.exit_tokens.iter().position(|token| token == asset));
            if let Some(exit_index) = exit_index.filter(|_| !step.amount.is_zero()) {
                step.amount = exit_reference(exit_index).into();
            }
        }

        // The literal worst case amounts the path was found with would make
        // for limits that are too tight.
        for (asset, delta) in query.assets.iter().zip(&mut query.deltas) {
            if let Some(i) = input.exit_tokens.iter().position(|token| token == asset) {
                let max_in = input.slippage.add_to(input.expected_amounts_out[i])?;
                *delta = I256::try_from(max_in).map_err(|_| swap::Error::MulOverflow)?;
            }
        }
        let limits = limits_for_slippage(
            &input.exit_tokens,
            &input.final_tokens_out,
            SwapKind::GivenIn,
            &query.deltas,
            &query.assets,
            Slippage::zero(),
        )?;

        let mut keys = KeyAllocator::starting_at(input.exit_tokens.len() as u64);
        let unwraps = if input.unwrap_tokens_out {
            compose_unwrap_calls(
                &index,
                &query.assets,
                &input.final_tokens_out,
                self.address(),
                input.swap_recipient,
                &mut keys,
            )?
        } else {
            Default::default()
        };

        calls.push(encoding::batch_swap(BatchSwapData {
            kind: SwapKind::GivenIn,
            swaps: query.swaps,
            assets: query.assets,
            funds: FundManagement {
                sender: input.exiter,
                fromInternalBalance: true,
                recipient: if input.unwrap_tokens_out {
                    self.address()
                } else {
                    input.swap_recipient
                },
                toInternalBalance: false,
            },
            limits,
            output_references: unwraps.swap_output_references,
        }));
        calls.extend(unwraps.calls);

        let amounts_out = input
            .final_tokens_out
            .iter()
            .zip(&query.return_amounts)
            .map(|(token, amount)| {
                let expected = input.slippage.add_to(*amount)?;
                let rate = unwraps
                    .unwrapped
                    .iter()
                    .find(|linear| linear.wrapped_token == *token)
                    .map(|linear| linear.wrapped_token_rate);
                Ok(match rate {
                    Some(rate) => Bfp::from_wei(expected).mul_down(rate)?.as_uint256(),
                    None => expected,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(?min_amounts_out, ?amounts_out, "composed exit and batch swap");

        Ok(TransactionData::new(
            &calls,
            Outputs {
                amounts_out: Some(amounts_out),
                min_amounts_out: Some(min_amounts_out),
                ..Default::default()
            },
        ))
    }
}

/// The exit stores its output for the `i`th exit token under key `i`.
fn exit_reference(i: usize) -> ChainedReference {
    ChainedReference::temporary(i as u64)
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            config::RelayerConfig,
            pool_index::tests::{addr, nested_pools},
            relayer::chained_reference::to_chained_reference,
            router::{BatchSwapQueryResult, MockSwapRouting},
        },
        contracts::alloy::{BatchRelayerLibrary::BatchRelayerLibraryCalls, BatchSwapStep},
        std::sync::Arc,
    };

    /// Exits the 0xb1 stable pool into its two linear pool BPTs (0xd1, 0xc1)
    /// and swaps those into the wrapped tokens 0xdb and 0xcb.
    fn input() -> ExitAndBatchSwapInput {
        ExitAndBatchSwapInput {
            exiter: addr(0x99),
            swap_recipient: addr(0x98),
            pool_id: B256::repeat_byte(0xb1),
            exit_tokens: vec![addr(0xd1), addr(0xc1)],
            user_data: Bytes::from_static(&[0xee]),
            expected_amounts_out: vec![U256::from(100), U256::from(200)],
            final_tokens_out: vec![addr(0xdb), addr(0xcb)],
            slippage: Slippage::from_bps(100),
            fetch_options: FetchOptions {
                fetch_pools: true,
                fetch_on_chain: false,
            },
            ..Default::default()
        }
    }

    fn router() -> MockSwapRouting {
        let mut router = MockSwapRouting::new();
        router.expect_fetch_pools().times(1).returning(|| Ok(true));
        router.expect_get_pools().returning(nested_pools);
        router
            .expect_query_batch_swap()
            .times(1)
            .withf(|query| {
                query.tokens_in == [addr(0xd1), addr(0xc1)]
                    && query.kind == SwapKind::GivenIn
                    && query.amounts == [U256::from(99), U256::from(198)]
                    && query.fetch_options.fetch_pools
            })
            .returning(|_| {
                Ok(BatchSwapQueryResult {
                    swaps: vec![
                        BatchSwapStep {
                            poolId: B256::repeat_byte(0xd1),
                            assetInIndex: U256::ZERO,
                            assetOutIndex: U256::from(2),
                            amount: U256::from(99),
                            userData: Bytes::new(),
                        },
                        BatchSwapStep {
                            poolId: B256::repeat_byte(0xc1),
                            assetInIndex: U256::ONE,
                            assetOutIndex: U256::from(3),
                            amount: U256::from(198),
                            userData: Bytes::new(),
                        },
                    ],
                    assets: vec![addr(0xd1), addr(0xc1), addr(0xdb), addr(0xcb)],
                    deltas: vec![
                        I256::try_from(99).unwrap(),
                        I256::try_from(198).unwrap(),
                        I256::try_from(-90).unwrap(),
                        I256::try_from(-165).unwrap(),
                    ],
                    return_amounts: vec![U256::from(90), U256::from(165)],
                })
            });
        router
    }

    #[tokio::test]
    async fn exit_then_swap() {
        let relayer = Relayer::new(RelayerConfig::new(addr(0xff)), Arc::new(router()));
        let tx = relayer.exit_pool_and_batch_swap(input()).await.unwrap();

        assert_eq!(tx.function, "multicall");
        assert_eq!(
            tx.outputs.min_amounts_out,
            Some(vec![U256::from(99), U256::from(198)])
        );
        // 90 * 1.01 and 165 * 1.01, rounded down.
        assert_eq!(
            tx.outputs.amounts_out,
            Some(vec![U256::from(90), U256::from(166)])
        );

        let calls = tx.decode_calls().unwrap();
        assert_eq!(calls.len(), 2);

        let BatchRelayerLibraryCalls::exitPool(exit) = &calls[0] else {
            panic!("expected exit, got {:?}", calls[0]);
        };
        assert_eq!(exit.poolId, B256::repeat_byte(0xb1));
        assert_eq!(exit.kind, PoolKind::ComposableStableV2 as u8);
        assert!(exit.request.toInternalBalance);
        assert_eq!(
            exit.request.assets,
            vec![addr(0xb1), addr(0xd1), addr(0xc1)]
        );
        assert_eq!(
            exit.request.minAmountsOut,
            vec![U256::ZERO, U256::from(99), U256::from(198)]
        );
        assert_eq!(
            exit.outputReferences,
            vec![
                OutputReference {
                    index: U256::ONE,
                    key: to_chained_reference(0),
                },
                OutputReference {
                    index: U256::from(2),
                    key: to_chained_reference(1),
                },
            ]
        );

        let BatchRelayerLibraryCalls::batchSwap(swap) = &calls[1] else {
            panic!("expected batch swap, got {:?}", calls[1]);
        };
        assert_eq!(swap.swaps[0].amount, to_chained_reference(0));
        assert_eq!(swap.swaps[1].amount, to_chained_reference(1));
        assert!(swap.funds.fromInternalBalance);
        assert_eq!(swap.funds.sender, addr(0x99));
        assert_eq!(swap.funds.recipient, addr(0x98));
        assert_eq!(
            swap.limits,
            vec![
                I256::try_from(101).unwrap(),
                I256::try_from(202).unwrap(),
                I256::try_from(-90).unwrap(),
                I256::try_from(-165).unwrap(),
            ]
        );
        assert!(swap.outputReferences.is_empty());
    }

    #[tokio::test]
    async fn exit_then_swap_and_unwrap() {
        let relayer = Relayer::new(RelayerConfig::new(addr(0xff)), Arc::new(router()));
        let tx = relayer
            .exit_pool_and_batch_swap(ExitAndBatchSwapInput {
                unwrap_tokens_out: true,
                authorisation: Some(Bytes::from_static(&[0xaa])),
                ..input()
            })
            .await
            .unwrap();

        // 90 and 166 after slippage, unwrapped at rates of 1.1 and 1.2.
        assert_eq!(
            tx.outputs.amounts_out,
            Some(vec![U256::from(99), U256::from(199)])
        );

        let calls = tx.decode_calls().unwrap();
        assert_eq!(calls.len(), 5);
        assert!(matches!(
            &calls[0],
            BatchRelayerLibraryCalls::setRelayerApproval(call)
                if call.relayer == addr(0xff) && call.approved
        ));
        let BatchRelayerLibraryCalls::batchSwap(swap) = &calls[2] else {
            panic!("expected batch swap, got {:?}", calls[2]);
        };
        assert_eq!(swap.funds.recipient, addr(0xff));
        assert_eq!(
            swap.outputReferences,
            vec![
                OutputReference {
                    index: U256::from(2),
                    key: to_chained_reference(2),
                },
                OutputReference {
                    index: U256::from(3),
                    key: to_chained_reference(4),
                },
            ]
        );
        assert!(matches!(
            &calls[3],
            BatchRelayerLibraryCalls::unwrapAaveStaticToken(call)
                if call.amount == to_chained_reference(2)
                    && call.outputReference == to_chained_reference(3)
                    && call.recipient == addr(0x98)
        ));
        assert!(matches!(
            &calls[4],
            BatchRelayerLibraryCalls::unwrapAaveStaticToken(call)
                if call.staticToken == addr(0xcb) && call.amount == to_chained_reference(4)
        ));
    }

    #[tokio::test]
    async fn unknown_pool() {
        let mut router = MockSwapRouting::new();
        router.expect_get_pools().returning(nested_pools);
        let relayer = Relayer::new(RelayerConfig::new(addr(0xff)), Arc::new(router));

        let result = relayer
            .exit_pool_and_batch_swap(ExitAndBatchSwapInput {
                pool_id: B256::repeat_byte(0x42),
                fetch_options: FetchOptions::default(),
                ..input()
            })
            .await;
        assert!(matches!(result, Err(Error::PoolNotFound(_))));
    }

    #[tokio::test]
    async fn router_failures_abort() {
        let mut router = MockSwapRouting::new();
        router.expect_get_pools().returning(nested_pools);
        router
            .expect_query_batch_swap()
            .returning(|_| Err(anyhow::anyhow!("no route")));
        let relayer = Relayer::new(RelayerConfig::new(addr(0xff)), Arc::new(router));

        let result = relayer
            .exit_pool_and_batch_swap(ExitAndBatchSwapInput {
                fetch_options: FetchOptions::default(),
                ..input()
            })
            .await;
        assert!(matches!(result, Err(Error::Router(err)) if err.to_string() == "no route"));
    }

    #[tokio::test]
    async fn missing_return_amounts_abort() {
        let mut router = MockSwapRouting::new();
        router.expect_get_pools().returning(nested_pools);
        router.expect_query_batch_swap().returning(|_| {
            Ok(BatchSwapQueryResult {
                swaps: vec![],
                assets: vec![addr(0xd1), addr(0xc1), addr(0xdb), addr(0xcb)],
                deltas: vec![I256::ZERO; 4],
                return_amounts: vec![U256::from(90)],
            })
        });
        let relayer = Relayer::new(RelayerConfig::new(addr(0xff)), Arc::new(router));

        let result = relayer
            .exit_pool_and_batch_swap(ExitAndBatchSwapInput {
                fetch_options: FetchOptions::default(),
                ..input()
            })
            .await;
        assert!(matches!(
            result,
            Err(Error::InputLengthMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn length_mismatch_is_checked_first() {
        let relayer = Relayer::new(
            RelayerConfig::new(addr(0xff)),
            Arc::new(MockSwapRouting::new()),
        );
        let result = futures::executor::block_on(relayer.exit_pool_and_batch_swap(
            ExitAndBatchSwapInput {
                expected_amounts_out: vec![U256::ONE],
                ..input()
            },
        ));
        assert!(matches!(
            result,
            Err(Error::InputLengthMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }
}
