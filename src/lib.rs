//! Stakehub engine - cross-chain execution for a liquid-staking hub
//!
//! Drives deposits, delegations, rebalances and unbonding sweeps on remote
//! host chains through interchain accounts, reads host state through
//! proof-backed interchain queries, and reconciles the hub ledger when
//! outcomes come back.

pub mod api;
pub mod callbacks;
pub mod config;
pub mod engine;
pub mod epochs;
pub mod error;
pub mod handlers;
pub mod ica;
pub mod icq;
pub mod keeper;
pub mod metrics;
pub mod outbox;
pub mod ratelimit;
pub mod state;
pub mod types;

#[cfg(test)]
mod testutil;

pub use error::{EngineError, EngineResult};
