//! Client side helpers.
//!
//! This module provides:
//! - [`RequestTracker`]: correlates sent requests with their responses.
//! - [`ExternalAddressDiscovery`]: matches connectionless address replies with queries.
//! - [`FeatureTable`]: negotiates feature versions with a server.
//!
//! None of them touch a socket, the transport hands them buffers and packets.
pub mod discovery;
pub mod features;
pub mod tracker;

pub use self::discovery::{ExternalAddress, ExternalAddressDiscovery};
pub use self::features::FeatureTable;
pub use self::tracker::{PendingRequest, RequestTracker};
