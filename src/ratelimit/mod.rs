//! Per-channel, per-denom flow quotas
//!
//! A pure guard: consulted right before value crosses a channel, it never
//! issues calls or registers callbacks itself.

pub mod flow;
pub mod types;

pub use flow::{
    add_rate_limit, check_and_update_flow, preview_flow, remove_rate_limit, reset_rate_limit, undo_outflow,
    update_rate_limit,
};
pub use types::{
    is_valid_channel_id, validate_update, Flow, FlowDirection, Quota, RateLimit, RateLimitPath,
    RateLimitProposal,
};
