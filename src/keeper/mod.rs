//! The stakeibc keeper
//!
//! Owns the ledger and the two outbound collaborators (channel transport and
//! query layer) and exposes every operation that issues a remote call or
//! reacts to one. All methods run inside a single block step; the engine
//! serializes access.

mod accounts;
mod deposits;
mod dispatch;
mod hooks;
mod params;
mod queries;
pub mod rebalance;
mod submit;
mod unbonding;

pub use params::Params;
pub use rebalance::{compute_rebalancings, get_target_val_amts};

use crate::callbacks::{CallbackTable, IcaCallbackFn, IcqCallbackFn};
use crate::epochs;
use crate::error::{EngineError, EngineResult};
use crate::ica::IbcTransport;
use crate::icq::InterchainQuerier;
use crate::state::Ledger;

use std::sync::Arc;
use tracing::info;

pub struct Keeper {
    ledger: Ledger,
    params: Params,
    transport: Arc<dyn IbcTransport>,
    querier: Arc<dyn InterchainQuerier>,
    ica_callbacks: CallbackTable<IcaCallbackFn>,
    icq_callbacks: CallbackTable<IcqCallbackFn>,
}

impl Keeper {
    /// Build a keeper and its callback tables
    pub fn new(
        ledger: Ledger,
        params: Params,
        transport: Arc<dyn IbcTransport>,
        querier: Arc<dyn InterchainQuerier>,
    ) -> EngineResult<Self> {
        let mut ica_callbacks = CallbackTable::new();
        crate::handlers::register_ica_callbacks(&mut ica_callbacks)?;

        let mut icq_callbacks = CallbackTable::new();
        crate::handlers::register_icq_callbacks(&mut icq_callbacks)?;

        info!(
            "Keeper ready with ICA callbacks {:?} and ICQ callbacks {:?}",
            ica_callbacks.ids(),
            icq_callbacks.ids()
        );

        Ok(Self {
            ledger,
            params,
            transport,
            querier,
            ica_callbacks,
            icq_callbacks,
        })
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn ica_callback_ids(&self) -> Vec<&'static str> {
        self.ica_callbacks.ids()
    }

    pub fn icq_callback_ids(&self) -> Vec<&'static str> {
        self.icq_callbacks.ids()
    }

    pub fn get_start_time_next_epoch(&self, identifier: &str) -> EngineResult<u64> {
        epochs::get_start_time_next_epoch(&self.ledger, identifier)
    }

    pub fn ica_timeout_nanos(&self, identifier: &str) -> EngineResult<u64> {
        epochs::ica_timeout_nanos(&self.ledger, identifier, self.params.buffer_size)
    }

    pub fn is_within_buffer_window(&self, now: u64) -> EngineResult<bool> {
        epochs::is_within_buffer_window(&self.ledger, self.params.buffer_size, now)
    }

    pub fn current_epoch_number(&self, identifier: &str) -> EngineResult<u64> {
        epochs::get_epoch_tracker(&self.ledger, identifier)
            .map(|tracker| tracker.epoch_number)
            .ok_or_else(|| EngineError::EpochTrackerNotFound(identifier.to_string()))
    }

    /// `now + offset`, failing rather than wrapping
    fn offset_timeout(now: u64, offset: u64) -> EngineResult<u64> {
        now.checked_add(offset)
            .ok_or_else(|| EngineError::Overflow(format!("timeout {} + {}", now, offset)))
    }
}
