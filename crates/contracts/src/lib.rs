//! Solidity bindings for the Balancer V2 batch relayer.
//!
//! The relayer is made of two contracts: the relayer entry point exposing
//! `multicall`, and the relayer library whose functions are the individual
//! sub-calls passed to `multicall`.

pub mod alloy;
