//! Home of the wire protocol.
//!
//! Everything in here is a pure transformation over in-memory buffers: the
//! [`serializer`] reads and writes fields, [`packet`] frames connectionless
//! packets, [`request`] frames session-correlated requests and [`catalog`]
//! maps wire signatures back to the types that parse them.
pub mod catalog;
pub mod packet;
pub mod request;
pub mod serializer;
pub mod signature;
pub mod version;

pub use self::catalog::PacketCatalog;
pub use self::serializer::BinarySerializer;
pub use self::signature::Signature;
pub use self::version::VersionRange;

/// Byte order of every multi-byte integer on the wire.
pub type Endian = byteorder::LittleEndian;

/// Oldest protocol version this release can still talk.
pub const LOWEST_SUPPORTED_PROTOCOL_VERSION: u8 = 1;
/// Newest protocol version this release knows about.
pub const HIGHEST_SUPPORTED_PROTOCOL_VERSION: u8 = 1;

/// Upper bound for a single packet, on both encode and decode.
///
/// Large enough for the biggest payload the built-in packets can declare: a
/// features response holding 255 features with 255 byte identifiers.
pub const MAX_PACKET_SIZE: usize = 128 * 1024;

/// The range of protocol versions this release supports.
pub const fn supported_protocol_versions() -> VersionRange<u8> {
    VersionRange::new_unchecked(
        LOWEST_SUPPORTED_PROTOCOL_VERSION,
        HIGHEST_SUPPORTED_PROTOCOL_VERSION,
    )
}
