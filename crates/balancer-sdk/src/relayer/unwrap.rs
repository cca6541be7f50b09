//! Unwrapping of linear pool wrapped tokens into their main tokens.

use {
    super::{
        KeyAllocator,
        Outputs,
        Relayer,
        TransactionData,
        encoding::{self, BatchSwapData},
        slippage::{Slippage, limits_for_slippage},
    },
    crate::{
        Error,
        error::Result,
        pool_index::PoolIndex,
        pools::linear::{LinearPoolDescriptor, WrappingProtocol},
        router::{BatchSwapQuery, FetchOptions, SwapKind},
        swap::fixed_point::Bfp,
    },
    alloy::primitives::{Address, Bytes, U256},
    contracts::alloy::{
        BatchRelayerLibrary::{self, BatchRelayerLibraryCalls},
        FundManagement,
        OutputReference,
    },
    tracing::instrument,
};

impl WrappingProtocol {
    /// The relayer library call unwrapping `amount` of `wrapped_token`.
    pub fn encode_unwrap(
        self,
        wrapped_token: Address,
        sender: Address,
        recipient: Address,
        amount: U256,
        output_reference: U256,
    ) -> BatchRelayerLibraryCalls {
        match self {
            Self::Aave => BatchRelayerLibraryCalls::unwrapAaveStaticToken(
                BatchRelayerLibrary::unwrapAaveStaticTokenCall {
                    staticToken: wrapped_token,
                    sender,
                    recipient,
                    amount,
                    toUnderlying: true,
                    outputReference: output_reference,
                },
            ),
            Self::Erc4626 => BatchRelayerLibraryCalls::unwrapERC4626(
                BatchRelayerLibrary::unwrapERC4626Call {
                    wrappedToken: wrapped_token,
                    sender,
                    recipient,
                    amount,
                    outputReference: output_reference,
                },
            ),
            Self::Euler => {
                BatchRelayerLibraryCalls::unwrapEuler(BatchRelayerLibrary::unwrapEulerCall {
                    wrappedToken: wrapped_token,
                    sender,
                    recipient,
                    amount,
                    outputReference: output_reference,
                })
            }
            Self::Gearbox => {
                BatchRelayerLibraryCalls::unwrapGearbox(BatchRelayerLibrary::unwrapGearboxCall {
                    dieselToken: wrapped_token,
                    sender,
                    recipient,
                    dieselAmount: amount,
                    outputReference: output_reference,
                })
            }
            Self::Reaper => BatchRelayerLibraryCalls::unwrapReaperVaultToken(
                BatchRelayerLibrary::unwrapReaperVaultTokenCall {
                    vaultToken: wrapped_token,
                    sender,
                    recipient,
                    amount,
                    outputReference: output_reference,
                },
            ),
            Self::Tetu => {
                BatchRelayerLibraryCalls::unwrapTetu(BatchRelayerLibrary::unwrapTetuCall {
                    wrappedToken: wrapped_token,
                    sender,
                    recipient,
                    amount,
                    outputReference: output_reference,
                })
            }
            Self::Yearn => {
                BatchRelayerLibraryCalls::unwrapYearn(BatchRelayerLibrary::unwrapYearnCall {
                    wrappedToken: wrapped_token,
                    sender,
                    recipient,
                    amount,
                    outputReference: output_reference,
                })
            }
        }
    }
}

/// Unwrap calls consuming the outputs of a batch swap.
#[derive(Clone, Debug, Default)]
pub struct UnwrapCalls {
    /// Output references to register on the batch swap.
    pub swap_output_references: Vec<OutputReference>,
    pub calls: Vec<BatchRelayerLibraryCalls>,
    /// The linear pool of each emitted unwrap call, in call order.
    pub unwrapped: Vec<LinearPoolDescriptor>,
}

/// Unwraps every wrapped token in `wrapped_tokens` that the swap with
/// `assets` produces. Tokens the swap does not touch are skipped.
pub fn compose_unwrap_calls(
    index: &PoolIndex,
    assets: &[Address],
    wrapped_tokens: &[Address],
    sender: Address,
    recipient: Address,
    keys: &mut KeyAllocator,
) -> Result<UnwrapCalls> {
    let mut unwraps = UnwrapCalls::default();
    for wrapped_token in wrapped_tokens {
        let linear = index.linear_pool_by_wrapped_token(*wrapped_token)?;
        let Some(asset_index) = assets.iter().position(|asset| asset == wrapped_token) else {
            tracing::debug!(%wrapped_token, "wrapped token not part of the swap");
            continue;
        };

        let swap_output = keys.next();
        let unwrap_output = keys.next();
        unwraps.swap_output_references.push(OutputReference {
            index: U256::from(asset_index),
            key: swap_output.into(),
        });
        unwraps.calls.push(linear.protocol.encode_unwrap(
            *wrapped_token,
            sender,
            recipient,
            swap_output.into(),
            unwrap_output.into(),
        ));
        unwraps.unwrapped.push(linear.clone());
    }
    Ok(unwraps)
}

/// Swap into wrapped tokens and unwrap them to their main tokens in a single
/// multicall.
#[derive(Clone, Debug, Default)]
pub struct SwapUnwrapInput {
    pub sender: Address,
    pub recipient: Address,
    pub tokens_in: Vec<Address>,
    pub wrapped_tokens: Vec<Address>,
    /// Amounts in per input token for exact in swaps, main token amounts out
    /// per wrapped token for exact out swaps.
    pub amounts: Vec<U256>,
    pub slippage: Slippage,
    pub fetch_options: FetchOptions,
    pub authorisation: Option<Bytes>,
}

impl Relayer {
    #[instrument(skip_all)]
    pub async fn swap_unwrap_exact_in(&self, input: SwapUnwrapInput) -> Result<TransactionData> {
        check_length(input.tokens_in.len(), input.amounts.len())?;
        self.swap_unwrap(input, SwapKind::GivenIn).await
    }

    #[instrument(skip_all)]
    pub async fn swap_unwrap_exact_out(&self, input: SwapUnwrapInput) -> Result<TransactionData> {
        check_length(input.wrapped_tokens.len(), input.amounts.len())?;
        self.swap_unwrap(input, SwapKind::GivenOut).await
    }

    async fn swap_unwrap(&self, input: SwapUnwrapInput, kind: SwapKind) -> Result<TransactionData> {
        let pools = self.pools(input.fetch_options).await?;
        let index = PoolIndex::new(&pools, &self.config);
        let linear_pools = input
            .wrapped_tokens
            .iter()
            .map(|token| index.linear_pool_by_wrapped_token(*token))
            .collect::<Result<Vec<_>>>()?;

        let amounts = match kind {
            SwapKind::GivenIn => input.amounts.clone(),
            // Wrapped amounts that unwrap to at least the requested amounts.
            SwapKind::GivenOut => linear_pools
                .iter()
                .zip(&input.amounts)
                .map(|(linear, amount)| {
                    Ok(Bfp::from_wei(*amount)
                        .div_up(linear.wrapped_token_rate)?
                        .as_uint256())
                })
                .collect::<Result<Vec<_>>>()?,
        };

        let query = self
            .query_batch_swap(BatchSwapQuery {
                tokens_in: input.tokens_in.clone(),
                tokens_out: input.wrapped_tokens.clone(),
                kind,
                amounts,
                fetch_options: input.fetch_options,
            })
            .await?;
        if query.return_amounts.iter().any(U256::is_zero) {
            return Err(Error::SwapZeroReturnAmount);
        }

        let mut calls = Vec::new();
        if let Some(authorisation) = input.authorisation.clone() {
            calls.push(encoding::set_relayer_approval(self.address(), authorisation));
        }

        let mut keys = KeyAllocator::default();
        let unwraps = compose_unwrap_calls(
            &index,
            &query.assets,
            &input.wrapped_tokens,
            self.address(),
            input.recipient,
            &mut keys,
        )?;
        let limits = limits_for_slippage(
            &input.tokens_in,
            &input.wrapped_tokens,
            kind,
            &query.deltas,
            &query.assets,
            input.slippage,
        )?;
        calls.push(encoding::batch_swap(BatchSwapData {
            kind,
            swaps: query.swaps,
            assets: query.assets,
            funds: FundManagement {
                sender: input.sender,
                fromInternalBalance: false,
                recipient: self.address(),
                toInternalBalance: false,
            },
            limits,
            output_references: unwraps.swap_output_references,
        }));
        calls.extend(unwraps.calls);

        let outputs = match kind {
            SwapKind::GivenIn => {
                let amounts_out = linear_pools
                    .iter()
                    .zip(&query.return_amounts)
                    .map(|(linear, amount)| {
                        Ok(Bfp::from_wei(*amount)
                            .mul_down(linear.wrapped_token_rate)?
                            .as_uint256())
                    })
                    .collect::<Result<Vec<_>>>()?;
                let min_amounts_out = amounts_out
                    .iter()
                    .map(|amount| input.slippage.subtract_from(*amount))
                    .collect::<Result<Vec<_>, _>>()?;
                Outputs {
                    amounts_out: Some(amounts_out),
                    min_amounts_out: Some(min_amounts_out),
                    ..Default::default()
                }
            }
            SwapKind::GivenOut => Outputs {
                amounts_in: Some(
                    query
                        .return_amounts
                        .iter()
                        .map(|amount| input.slippage.add_to(*amount))
                        .collect::<Result<Vec<_>, _>>()?,
                ),
                amounts_out: Some(input.amounts),
                ..Default::default()
            },
        };

        Ok(TransactionData::new(&calls, outputs))
    }
}

fn check_length(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::InputLengthMismatch { expected, actual });
    }
    Ok(())
}
