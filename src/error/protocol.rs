//! # Protocol Error
//! Errors produced while reading or writing packets.
//!
//! None of these are fatal. A receiver that hits one of them drops the buffer it was
//! reading and carries on, the only question is whether the drop is worth reporting:
//! - [`ProtocolError::MalformedPacket`] and [`ProtocolError::UnknownSignature`] on a
//!   connectionless channel are dropped silently.
//! - [`ProtocolError::CorrelationMismatch`] is expected on unreliable channels and is dropped.
//! - [`ProtocolError::UnknownSignature`] for an awaited response is reported to the caller.
use thiserror::Error;

use crate::protocol::request::RequestState;
use crate::protocol::signature::Signature;
use crate::protocol::version::VersionRange;

/// Result type for encode and decode operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The buffer is truncated or a declared length is out of bounds.
    /// The whole packet must be discarded.
    #[error("malformed packet: {0}")]
    MalformedPacket(&'static str),

    /// No packet type is registered under this signature.
    #[error("unknown packet signature {0}")]
    UnknownSignature(Signature),

    /// A response arrived for a correlation id nobody is waiting on.
    #[error("no pending request with correlation id {0}")]
    CorrelationMismatch(u32),

    /// The version lies outside of what this endpoint supports.
    #[error("version {version} is outside of the supported range {supported}")]
    VersionUnsupported {
        version: u8,
        supported: VersionRange<u8>,
    },

    /// Two version ranges share no version at all.
    #[error("no common version between {local} and {remote}")]
    NoCommonVersion {
        local: VersionRange<u8>,
        remote: VersionRange<u8>,
    },

    /// A feature the remote side never advertised.
    #[error("feature '{0}' is not supported by both endpoints")]
    FeatureUnsupported(String),

    /// A string or array is longer than its wire bound allows.
    #[error("length {length} exceeds the wire limit of {max}")]
    LengthExceeded { length: usize, max: usize },

    /// A whole packet is larger than the configured maximum.
    #[error("packet of {size} bytes exceeds the limit of {max} bytes")]
    PacketTooLarge { size: usize, max: usize },

    /// Only a freshly created request can be sent.
    #[error("request '{name}' can not be sent from state {state:?}")]
    RequestNotSendable {
        name: &'static str,
        state: RequestState,
    },

    /// `min > max` when constructing a version range.
    #[error("invalid version range: {min} > {max}")]
    InvalidVersionRange { min: u64, max: u64 },
}

impl ProtocolError {
    /// Whether a receiver should drop this silently instead of surfacing it.
    pub fn is_silent_drop(&self) -> bool {
        matches!(
            self,
            ProtocolError::MalformedPacket(_)
                | ProtocolError::UnknownSignature(_)
                | ProtocolError::CorrelationMismatch(_)
        )
    }
}
