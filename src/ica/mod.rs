//! Interchain accounts
//!
//! The hub controls one account per (host zone, role) on each host chain.
//! Messages for an account are batched into a single execute-tx packet sent
//! over the account's controller port. The channel layer itself is an
//! external collaborator reached through `IbcTransport`.

pub mod transport;

pub use transport::{
    ica_owner, ica_port_id, FungibleTokenPacketData, IbcTransport, InterchainAccountPacketData, TRANSFER_PORT,
};

#[cfg(test)]
pub use transport::MockIbcTransport;
