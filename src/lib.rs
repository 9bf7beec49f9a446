//! The packet framework of the Oxygen online services.
//!
//! Two kinds of messages travel between a game client and its server:
//! - connectionless packets, identified by a 16-bit signature and carrying no
//!   session state (see [`protocol::packet`]),
//! - requests, pairing a query with a response under a correlation id once a
//!   session exists (see [`protocol::request`]).
//!
//! Both are described with the same [`protocol::BinarySerializer`], which reads
//! untrusted buffers with every length bounded, and both are dispatched through
//! a [`protocol::PacketCatalog`] built once at startup.
//!
//! Sockets, retries and timeouts are left to the transport: everything here
//! works on byte buffers.
//!
//! ```rust
//! use oxygen_netcore::client::RequestTracker;
//! use oxygen_netcore::config::ProtocolConfig;
//! use oxygen_netcore::protocol::packet::online::*;
//! use oxygen_netcore::protocol::VersionRange;
//! use oxygen_netcore::server::RequestCatalog;
//!
//! let config = ProtocolConfig::default();
//! let mut tracker = RequestTracker::new(config);
//! let catalog = RequestCatalog::standard(config).unwrap();
//!
//! // client
//! let request = GetServerFeaturesRequest::new(GetServerFeaturesQuery);
//! let (query, mut pending) = tracker.send(request, 1).unwrap();
//!
//! // server
//! let incoming = catalog.read_query(&query).unwrap();
//! let mut features = GetServerFeaturesResponse {
//!     features: vec![Feature::new("chat", VersionRange::new(1, 3).unwrap())],
//! };
//! let reply = incoming.respond::<GetServerFeaturesQuery>(&mut features, 1).unwrap();
//!
//! // client again
//! tracker.handle_response(&reply, 1).unwrap();
//! let request = pending.try_take().unwrap().unwrap();
//! assert_eq!(request.response().unwrap().features[0].identifier, "chat");
//! ```

/// Client side helpers: request correlation, address discovery and feature negotiation.
pub mod client;
pub mod config;
pub mod error;
/// Home of the wire protocol.
pub mod protocol;
/// Server side helpers: query dispatch and the relay half of address discovery.
pub mod server;
pub mod util;

pub use config::ProtocolConfig;
pub use error::{CatalogError, ProtocolError, ProtocolResult, RequestError};
