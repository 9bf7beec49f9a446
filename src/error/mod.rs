//! Error types of the packet framework.
//!
//! - [`ProtocolError`]: anything that goes wrong while encoding or decoding a packet.
//! - [`CatalogError`]: registration mistakes, raised once while building a catalog.
//! - [`RequestError`]: a pending request whose tracker went away.
pub mod catalog;
pub mod protocol;
pub mod request;

pub use self::catalog::CatalogError;
pub use self::protocol::{ProtocolError, ProtocolResult};
pub use self::request::RequestError;
