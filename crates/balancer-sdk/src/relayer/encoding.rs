//! Encoding of the individual batch relayer library calls.

use {
    crate::{pools::PoolType, router::SwapKind},
    alloy::{
        primitives::{Address, B256, Bytes, I256, U256},
        sol_types::{SolCall, SolInterface, SolValue},
    },
    contracts::alloy::{
        BalancerRelayer,
        BatchRelayerLibrary::{self, BatchRelayerLibraryCalls},
        BatchSwapStep,
        ExitPoolRequest,
        FundManagement,
        JoinPoolRequest,
        OutputReference,
    },
};

/// The relayer needs to know the pool kind to find chained references inside
/// join and exit user data.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum PoolKind {
    Weighted = 0,
    LegacyStable = 1,
    ComposableStable = 2,
    ComposableStableV2 = 3,
}

impl PoolKind {
    pub fn for_pool_type(pool_type: PoolType) -> Self {
        match pool_type {
            PoolType::Stable | PoolType::MetaStable => Self::LegacyStable,
            PoolType::ComposableStable => Self::ComposableStableV2,
            _ => Self::Weighted,
        }
    }
}

/// `EXACT_TOKENS_IN_FOR_BPT_OUT` for both weighted and composable stable
/// pools.
const JOIN_KIND_EXACT_TOKENS_IN_FOR_BPT_OUT: u8 = 1;

#[derive(Clone, Debug)]
pub struct ExitPoolData {
    pub pool_id: B256,
    pub pool_kind: PoolKind,
    pub sender: Address,
    pub recipient: Address,
    pub assets: Vec<Address>,
    pub min_amounts_out: Vec<U256>,
    pub user_data: Bytes,
    pub to_internal_balance: bool,
    pub output_references: Vec<OutputReference>,
}

#[derive(Clone, Debug)]
pub struct JoinPoolData {
    pub pool_id: B256,
    pub pool_kind: PoolKind,
    pub sender: Address,
    pub recipient: Address,
    pub assets: Vec<Address>,
    pub max_amounts_in: Vec<U256>,
    pub user_data: Bytes,
    pub from_internal_balance: bool,
    pub output_reference: U256,
}

#[derive(Clone, Debug)]
pub struct BatchSwapData {
    pub kind: SwapKind,
    pub swaps: Vec<BatchSwapStep>,
    pub assets: Vec<Address>,
    pub funds: FundManagement,
    pub limits: Vec<I256>,
    pub output_references: Vec<OutputReference>,
}

pub fn exit_pool(data: ExitPoolData) -> BatchRelayerLibraryCalls {
    BatchRelayerLibraryCalls::exitPool(BatchRelayerLibrary::exitPoolCall {
        poolId: data.pool_id,
        kind: data.pool_kind as u8,
        sender: data.sender,
        recipient: data.recipient,
        request: ExitPoolRequest {
            assets: data.assets,
            minAmountsOut: data.min_amounts_out,
            userData: data.user_data,
            toInternalBalance: data.to_internal_balance,
        },
        outputReferences: data.output_references,
    })
}

pub fn join_pool(data: JoinPoolData) -> BatchRelayerLibraryCalls {
    BatchRelayerLibraryCalls::joinPool(BatchRelayerLibrary::joinPoolCall {
        poolId: data.pool_id,
        kind: data.pool_kind as u8,
        sender: data.sender,
        recipient: data.recipient,
        request: JoinPoolRequest {
            assets: data.assets,
            maxAmountsIn: data.max_amounts_in,
            userData: data.user_data,
            fromInternalBalance: data.from_internal_balance,
        },
        value: U256::ZERO,
        outputReference: data.output_reference,
    })
}

pub fn batch_swap(data: BatchSwapData) -> BatchRelayerLibraryCalls {
    BatchRelayerLibraryCalls::batchSwap(BatchRelayerLibrary::batchSwapCall {
        kind: data.kind as u8,
        swaps: data.swaps,
        assets: data.assets,
        funds: data.funds,
        limits: data.limits,
        deadline: U256::MAX,
        value: U256::ZERO,
        outputReferences: data.output_references,
    })
}

/// Lets the relayer act on behalf of the signer of `authorisation`.
pub fn set_relayer_approval(relayer: Address, authorisation: Bytes) -> BatchRelayerLibraryCalls {
    BatchRelayerLibraryCalls::setRelayerApproval(BatchRelayerLibrary::setRelayerApprovalCall {
        relayer,
        approved: true,
        authorisation,
    })
}

/// Join user data. Amounts may contain chained references, which the relayer
/// resolves before forwarding the join to the vault.
pub fn exact_tokens_in_for_bpt_out(amounts_in: &[U256], min_bpt_out: U256) -> Bytes {
    (
        U256::from(JOIN_KIND_EXACT_TOKENS_IN_FOR_BPT_OUT),
        amounts_in.to_vec(),
        min_bpt_out,
    )
        .abi_encode_params()
        .into()
}

pub fn multicall(calls: &[Bytes]) -> Bytes {
    BalancerRelayer::multicallCall {
        data: calls.to_vec(),
    }
    .abi_encode()
    .into()
}

pub fn decode_calls(calls: &[Bytes]) -> alloy::sol_types::Result<Vec<BatchRelayerLibraryCalls>> {
    calls
        .iter()
        .map(|call| BatchRelayerLibraryCalls::abi_decode(call))
        .collect()
}

#[cfg(test)]
mod tests {
    use {super::*, hex_literal::hex};

    #[test]
    fn pool_kinds() {
        assert_eq!(PoolKind::for_pool_type(PoolType::MetaStable), PoolKind::LegacyStable);
        assert_eq!(
            PoolKind::for_pool_type(PoolType::ComposableStable),
            PoolKind::ComposableStableV2
        );
        assert_eq!(PoolKind::for_pool_type(PoolType::Weighted), PoolKind::Weighted);
    }

    #[test]
    fn join_user_data() {
        let user_data = exact_tokens_in_for_bpt_out(&[U256::from(5), U256::from(6)], U256::from(7));
        assert_eq!(
            user_data.as_ref(),
            hex!(
                "0000000000000000000000000000000000000000000000000000000000000001"
                "0000000000000000000000000000000000000000000000000000000000000060"
                "0000000000000000000000000000000000000000000000000000000000000007"
                "0000000000000000000000000000000000000000000000000000000000000002"
                "0000000000000000000000000000000000000000000000000000000000000005"
                "0000000000000000000000000000000000000000000000000000000000000006"
            )
        );
    }

    #[test]
    fn batch_swap_round_trip() {
        let call = batch_swap(BatchSwapData {
            kind: SwapKind::GivenIn,
            swaps: vec![BatchSwapStep {
                poolId: B256::repeat_byte(1),
                assetInIndex: U256::ZERO,
                assetOutIndex: U256::ONE,
                amount: U256::from(1000),
                userData: Bytes::new(),
            }],
            assets: vec![Address::repeat_byte(2), Address::repeat_byte(3)],
            funds: FundManagement {
                sender: Address::repeat_byte(4),
                fromInternalBalance: true,
                recipient: Address::repeat_byte(5),
                toInternalBalance: false,
            },
            limits: vec![I256::try_from(1000).unwrap(), I256::try_from(-990).unwrap()],
            output_references: vec![],
        });

        let encoded = [Bytes::from(call.abi_encode())];
        assert_eq!(decode_calls(&encoded).unwrap(), vec![call]);
        assert!(decode_calls(&[Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef])]).is_err());
    }
}
