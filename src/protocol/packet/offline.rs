//! Offline packets are connectionless packets, exchanged before or outside of any session.
//! This crate provides:
//! - [`GetExternalAddressConnectionless`]
//! - [`ReplyExternalAddressConnectionless`]
//!
//! Together they discover the external address of a peer behind NAT: the peer asks
//! a relay, and the relay answers with the address it saw the query come from.
use crate::error::ProtocolResult;
use crate::protocol::packet::Packet;
use crate::protocol::serializer::BinarySerializer;
use crate::protocol::signature::Signature;
use crate::register_packets;

/// Longest IP string accepted in an address reply.
pub const MAX_IP_LENGTH: usize = 64;

/// An enum of all offline packets.
///
/// Receivers get one of these out of [`PacketCodec::decode`](super::PacketCodec::decode).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LowLevelPacket {
    GetExternalAddressConnectionless(GetExternalAddressConnectionless),
    ReplyExternalAddressConnectionless(ReplyExternalAddressConnectionless),
}

register_packets! {
    LowLevelPacket,
    GetExternalAddressConnectionless,
    ReplyExternalAddressConnectionless
}

/// Sent to a relay, expecting a [`ReplyExternalAddressConnectionless`].
///
/// The `query_id` is picked by the sender and echoed by the relay, a reply with
/// an id the sender is not waiting on gets ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetExternalAddressConnectionless {
    pub packet_version: u8,
    pub query_id: u64,
}

impl Default for GetExternalAddressConnectionless {
    fn default() -> Self {
        Self {
            packet_version: 1,
            query_id: 0,
        }
    }
}

impl Packet for GetExternalAddressConnectionless {
    const SIGNATURE: Signature = Signature::new(0x3bcf);
    const NAME: &'static str = "GetExternalAddressConnectionless";

    fn serialize_content(
        &mut self,
        serializer: &mut BinarySerializer<'_>,
        _protocol_version: u8,
    ) -> ProtocolResult<()> {
        serializer.serialize(&mut self.packet_version)?;
        serializer.serialize(&mut self.query_id)
    }
}

/// Sent by the relay in response to a [`GetExternalAddressConnectionless`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyExternalAddressConnectionless {
    pub packet_version: u8,
    /// The `query_id` of the query, unchanged.
    pub query_id: u64,
    /// The address the query was seen coming from, as text.
    pub ip: String,
    pub port: u16,
}

impl Default for ReplyExternalAddressConnectionless {
    fn default() -> Self {
        Self {
            packet_version: 1,
            query_id: 0,
            ip: String::new(),
            port: 0,
        }
    }
}

impl Packet for ReplyExternalAddressConnectionless {
    const SIGNATURE: Signature = Signature::new(0xf151);
    const NAME: &'static str = "ReplyExternalAddressConnectionless";

    fn serialize_content(
        &mut self,
        serializer: &mut BinarySerializer<'_>,
        _protocol_version: u8,
    ) -> ProtocolResult<()> {
        serializer.serialize(&mut self.packet_version)?;
        serializer.serialize(&mut self.query_id)?;
        serializer.serialize_string(&mut self.ip, MAX_IP_LENGTH)?;
        serializer.serialize(&mut self.port)
    }
}
