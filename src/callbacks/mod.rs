//! Callback registry
//!
//! A submitted call that wants to hear about its outcome leaves a
//! `CallbackData` entry keyed by (port, channel, sequence). When the outcome
//! arrives the entry is taken exactly once and routed by callback id through
//! a static table built when the keeper is constructed.

pub mod args;
pub mod outcome;
pub mod registry;

pub use args::{
    CallbackArgs, DelegateCallback, RateLimitedSend, RebalanceCallback, Rebalancing, RedemptionCallback,
    ReinvestCallback, SplitDelegation, TransferCallback,
};
pub use outcome::{AckResponse, AckStatus, Packet};
pub use registry::{
    delete_callback_data, get_callback_data, set_callback_data, CallbackData, CallbackTable, IcaCallbackFn,
    IcqCallbackFn, PacketKey,
};
