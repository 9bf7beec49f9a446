//! This module contains the connectionless packet framework and its packets.
//! Packets are split into two submodules:
//! - [`offline`]: connectionless packets, sent before or outside of any session.
//! - [`online`]: payloads of session-correlated requests, see [`crate::protocol::request`].
//!
//! On the wire a connectionless packet is its 16-bit [`Signature`] followed by
//! its content:
//!
//! ```text
//! +-----------------+----------------------+
//! | signature (u16) |  serialize_content   |
//! +-----------------+----------------------+
//! ```
//!
//! [`offline`]: crate::protocol::packet::offline
//! [`online`]: crate::protocol::packet::online
pub mod offline;
pub mod online;

use std::fmt::Debug;

use crate::config::ProtocolConfig;
use crate::error::{CatalogError, ProtocolResult};
use crate::protocol::catalog::PacketCatalog;
use crate::protocol::serializer::BinarySerializer;
use crate::protocol::signature::Signature;
use crate::util::debug::{netcore_debug, netcore_debug_buffers};

use self::offline::LowLevelPacket;

/// A connectionless packet type.
///
/// The content is described once in [`Packet::serialize_content`] and used in
/// both directions, so encode and decode can not drift apart.
pub trait Packet: Default + Debug {
    /// The wire signature of this packet type.
    const SIGNATURE: Signature;
    /// Name used for diagnostics and duplicate detection.
    const NAME: &'static str;

    fn serialize_content(
        &mut self,
        serializer: &mut BinarySerializer<'_>,
        protocol_version: u8,
    ) -> ProtocolResult<()>;
}

/// Builds an empty packet of a registered type, ready to be read into.
pub type PacketFactory = fn() -> LowLevelPacket;

/// A utility macro that turns an enum of packets into a packet family.
///
/// For every listed packet `Pk` this generates `From<Pk>` for the family and
/// `TryFrom<Family>` for `Pk`, and on the family itself:
/// - `signature()` and `name()` of the contained packet,
/// - `serialize_content()` dispatching to the contained packet,
/// - `register_all()`, filling a [`PacketCatalog`] with one factory per packet.
///
/// Families other than [`LowLevelPacket`] (channel broadcasts, file transfers)
/// can be declared the same way:
/// ```rust ignore
/// register_packets! {
///     LowLevelPacket,
///     GetExternalAddressConnectionless,
///     ReplyExternalAddressConnectionless
/// }
/// ```
#[macro_export]
macro_rules! register_packets {
    ($kind: ident, $($packet: ident),*) => {
        impl $kind {
            pub fn signature(&self) -> $crate::protocol::signature::Signature {
                match self {
                    $(
                        $kind::$packet(_) => {
                            <$packet as $crate::protocol::packet::Packet>::SIGNATURE
                        }
                    )*
                }
            }

            pub fn name(&self) -> &'static str {
                match self {
                    $( $kind::$packet(_) => <$packet as $crate::protocol::packet::Packet>::NAME, )*
                }
            }

            pub fn serialize_content(
                &mut self,
                serializer: &mut $crate::protocol::serializer::BinarySerializer<'_>,
                protocol_version: u8,
            ) -> $crate::error::ProtocolResult<()> {
                match self {
                    $(
                        $kind::$packet(packet) => {
                            $crate::protocol::packet::Packet::serialize_content(
                                packet,
                                serializer,
                                protocol_version,
                            )
                        }
                    )*
                }
            }

            /// Registers a factory for every packet of this family.
            pub fn register_all(
                catalog: &mut $crate::protocol::catalog::PacketCatalog<fn() -> $kind>,
            ) -> Result<(), $crate::error::CatalogError> {
                $(
                    catalog.register(
                        <$packet as $crate::protocol::packet::Packet>::SIGNATURE,
                        <$packet as $crate::protocol::packet::Packet>::NAME,
                        || $kind::$packet(<$packet as Default>::default()),
                    )?;
                )*
                Ok(())
            }
        }

        $(
            impl From<$packet> for $kind {
                fn from(packet: $packet) -> Self {
                    $kind::$packet(packet)
                }
            }

            impl TryFrom<$kind> for $packet {
                type Error = $kind;

                fn try_from(packet: $kind) -> Result<Self, Self::Error> {
                    match packet {
                        $kind::$packet(packet) => Ok(packet),
                        #[allow(unreachable_patterns)]
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

/// Encodes and decodes connectionless packets.
///
/// The codec owns the catalog used for dispatch. Decoding reads the signature,
/// asks the catalog for a factory and lets the packet read the rest; an
/// unknown signature or a malformed body is expected on a public channel and
/// [`PacketCodec::receive`] drops those buffers without surfacing anything.
#[derive(Debug, Clone)]
pub struct PacketCodec {
    catalog: PacketCatalog<PacketFactory>,
    config: ProtocolConfig,
}

impl PacketCodec {
    /// A codec knowing every connectionless packet of this crate.
    pub fn new(config: ProtocolConfig) -> Result<Self, CatalogError> {
        let mut catalog = PacketCatalog::new();
        LowLevelPacket::register_all(&mut catalog)?;
        Ok(Self::with_catalog(catalog, config))
    }

    pub fn with_catalog(catalog: PacketCatalog<PacketFactory>, config: ProtocolConfig) -> Self {
        Self { catalog, config }
    }

    pub fn catalog(&self) -> &PacketCatalog<PacketFactory> {
        &self.catalog
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Writes the signature of `packet` followed by its content.
    pub fn encode<P: Packet>(
        &self,
        packet: &mut P,
        protocol_version: u8,
    ) -> ProtocolResult<Vec<u8>> {
        self.write_envelope(P::SIGNATURE, |serializer| {
            packet.serialize_content(serializer, protocol_version)
        })
    }

    /// Same as [`PacketCodec::encode`], for a packet already wrapped in its family.
    pub fn encode_packet(
        &self,
        packet: &mut LowLevelPacket,
        protocol_version: u8,
    ) -> ProtocolResult<Vec<u8>> {
        let signature = packet.signature();
        self.write_envelope(signature, |serializer| {
            packet.serialize_content(serializer, protocol_version)
        })
    }

    /// Decodes `buffer` into whichever packet its signature names.
    pub fn decode(&self, buffer: &[u8], protocol_version: u8) -> ProtocolResult<LowLevelPacket> {
        self.config.check_size(buffer.len())?;
        let mut reader = BinarySerializer::reader(buffer);
        let mut signature = 0u16;
        reader.serialize(&mut signature)?;

        let factory = self.catalog.dispatch(Signature::new(signature))?;
        let mut packet = factory();
        packet.serialize_content(&mut reader, protocol_version)?;
        Ok(packet)
    }

    /// Decodes `buffer`, dropping it silently if it is not a packet we understand.
    pub fn receive(&self, buffer: &[u8], protocol_version: u8) -> Option<LowLevelPacket> {
        netcore_debug_buffers!(true, "connectionless {:?}", buffer);
        match self.decode(buffer, protocol_version) {
            Ok(packet) => {
                netcore_debug!(true, "Received '{}' ({} bytes)", packet.name(), buffer.len());
                Some(packet)
            }
            Err(e) => {
                netcore_debug!("Dropped connectionless packet of {} bytes: {}", buffer.len(), e);
                None
            }
        }
    }

    fn write_envelope<F>(&self, signature: Signature, content: F) -> ProtocolResult<Vec<u8>>
    where
        F: FnOnce(&mut BinarySerializer<'_>) -> ProtocolResult<()>,
    {
        let mut buffer = Vec::new();
        {
            let mut writer = BinarySerializer::writer(&mut buffer);
            writer.serialize(&mut signature.raw())?;
            content(&mut writer)?;
        }
        self.config.check_size(buffer.len())?;
        netcore_debug_buffers!(false, "{} {:?}", signature, buffer);
        Ok(buffer)
    }
}
