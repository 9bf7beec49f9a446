//! Server side helpers.
//!
//! This module provides the [`RequestCatalog`], which turns an incoming query
//! buffer into an [`IncomingRequest`], and the relay half of connectionless
//! address discovery.
use std::net::SocketAddr;

use crate::config::ProtocolConfig;
use crate::error::{CatalogError, ProtocolError, ProtocolResult};
use crate::protocol::catalog::PacketCatalog;
use crate::protocol::packet::offline::{
    GetExternalAddressConnectionless, LowLevelPacket, ReplyExternalAddressConnectionless,
};
use crate::protocol::packet::online::{
    AppUpdateCheckQuery, GetExternalAddressQuery, GetServerFeaturesQuery,
};
use crate::protocol::packet::PacketCodec;
use crate::protocol::request::{write_message, MessageHeader, QueryPayload, RequestDescriptor};
use crate::protocol::serializer::BinarySerializer;
use crate::util::debug::{netcore_debug, netcore_debug_buffers};

/// The requests a server understands, keyed by signature.
///
/// Both signatures of every request are registered, so a name clash between a
/// query and some other request's response is caught as well.
#[derive(Debug, Clone)]
pub struct RequestCatalog {
    catalog: PacketCatalog<RequestDescriptor>,
    config: ProtocolConfig,
}

impl RequestCatalog {
    pub fn new(config: ProtocolConfig) -> Self {
        Self {
            catalog: PacketCatalog::new(),
            config,
        }
    }

    /// A catalog holding every request of this crate.
    pub fn standard(config: ProtocolConfig) -> Result<Self, CatalogError> {
        let mut catalog = Self::new(config);
        catalog.register::<GetServerFeaturesQuery>()?;
        catalog.register::<GetExternalAddressQuery>()?;
        catalog.register::<AppUpdateCheckQuery>()?;
        Ok(catalog)
    }

    pub fn register<Q: QueryPayload>(&mut self) -> Result<(), CatalogError> {
        let descriptor = Q::DESCRIPTOR;
        self.catalog
            .register(descriptor.query_signature, descriptor.name, descriptor)?;
        self.catalog
            .register(descriptor.response_signature, descriptor.name, descriptor)
    }

    pub fn catalog(&self) -> &PacketCatalog<RequestDescriptor> {
        &self.catalog
    }

    /// Reads the header of an incoming query and looks its request up.
    ///
    /// A signature that is unknown, or that belongs to a response, is an
    /// [`ProtocolError::UnknownSignature`].
    pub fn read_query<'a>(&self, buffer: &'a [u8]) -> ProtocolResult<IncomingRequest<'a>> {
        netcore_debug_buffers!(true, "query {:?}", buffer);
        self.config.check_size(buffer.len())?;

        let mut reader = BinarySerializer::reader(buffer);
        let header = MessageHeader::read(&mut reader)?;
        let descriptor = *self.catalog.dispatch(header.signature)?;
        if descriptor.query_signature != header.signature {
            return Err(ProtocolError::UnknownSignature(header.signature));
        }
        Ok(IncomingRequest {
            descriptor,
            correlation_id: header.correlation_id,
            payload: reader.remaining_bytes(),
            config: self.config,
        })
    }
}

/// A query received by the server, not decoded yet.
#[derive(Debug, Clone, Copy)]
pub struct IncomingRequest<'a> {
    descriptor: RequestDescriptor,
    correlation_id: u32,
    payload: &'a [u8],
    config: ProtocolConfig,
}

impl<'a> IncomingRequest<'a> {
    pub fn descriptor(&self) -> RequestDescriptor {
        self.descriptor
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    pub fn correlation_id(&self) -> u32 {
        self.correlation_id
    }

    /// Whether this is a query of `Q`.
    pub fn is<Q: QueryPayload>(&self) -> bool {
        self.descriptor == Q::DESCRIPTOR
    }

    /// Decodes the query payload as `Q`.
    pub fn decode<Q: QueryPayload>(&self, protocol_version: u8) -> ProtocolResult<Q> {
        if !self.is::<Q>() {
            return Err(ProtocolError::UnknownSignature(self.descriptor.query_signature));
        }
        let mut query = Q::default();
        query.serialize_data(&mut BinarySerializer::reader(self.payload), protocol_version)?;
        Ok(query)
    }

    /// Encodes the response to this query, under the same correlation id.
    pub fn respond<Q: QueryPayload>(
        &self,
        response: &mut Q::Response,
        protocol_version: u8,
    ) -> ProtocolResult<Vec<u8>> {
        if !self.is::<Q>() {
            return Err(ProtocolError::UnknownSignature(self.descriptor.query_signature));
        }
        let bytes = write_message(
            Q::DESCRIPTOR.response_signature,
            self.correlation_id,
            response,
            protocol_version,
        )?;
        self.config.check_size(bytes.len())?;
        Ok(bytes)
    }
}

/// The relay's answer to an address query: the query id echoed, and `peer`.
pub fn reply_external_address(
    query: &GetExternalAddressConnectionless,
    peer: SocketAddr,
) -> ReplyExternalAddressConnectionless {
    ReplyExternalAddressConnectionless {
        query_id: query.query_id,
        ip: peer.ip().to_string(),
        port: peer.port(),
        ..Default::default()
    }
}

/// Answers a connectionless datagram received from `peer`, if it deserves an answer.
///
/// Anything but a well-formed address query yields `None`.
pub fn respond_connectionless(
    codec: &PacketCodec,
    buffer: &[u8],
    peer: SocketAddr,
    protocol_version: u8,
) -> Option<Vec<u8>> {
    match codec.receive(buffer, protocol_version)? {
        LowLevelPacket::GetExternalAddressConnectionless(query) => {
            let mut reply = reply_external_address(&query, peer);
            match codec.encode(&mut reply, protocol_version) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    netcore_debug!("Could not encode address reply for {}: {}", peer, e);
                    None
                }
            }
        }
        other => {
            netcore_debug!("No answer for connectionless '{}' from {}", other.name(), peer);
            None
        }
    }
}
