//! Off-chain estimates and batch relayer calldata for Balancer V2 pools.
//!
//! The SDK computes stable pool price impacts and composes relayer
//! multicalls (exit, swap, join, unwrap) whose steps consume each other's
//! outputs through chained references. It never signs or sends transactions.

pub mod cli;
pub mod config;
mod error;
pub mod graph_api;
pub mod pool_index;
pub mod pools;
pub mod price_impact;
pub mod relayer;
pub mod router;
pub mod swap;

pub use self::{
    config::RelayerConfig,
    error::{Error, Result},
    relayer::{ExitAndBatchSwapInput, NestedJoinInput, Relayer, SwapUnwrapInput, TransactionData},
    router::SwapRouting,
};
