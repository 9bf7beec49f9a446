//! Session-correlated requests.
//!
//! A request pairs a query payload with a response payload under one human
//! readable name. Both payloads travel inside the same envelope, the only
//! difference being which of the request's two signatures leads it:
//!
//! ```text
//! +-----------------+----------------------+------------------+
//! | signature (u16) | correlation id (u32) |  serialize_data  |
//! +-----------------+----------------------+------------------+
//! ```
//!
//! The correlation id is picked by the side sending the query and echoed in the
//! response. Requests are declared with [`highlevel_request!`](crate::highlevel_request).
use std::fmt::Debug;

use crate::error::{ProtocolError, ProtocolResult};
use crate::protocol::serializer::BinarySerializer;
use crate::protocol::signature::Signature;

/// One half of a request, serializable in both directions.
pub trait Payload: Default + Debug + Send + 'static {
    fn serialize_data(
        &mut self,
        serializer: &mut BinarySerializer<'_>,
        protocol_version: u8,
    ) -> ProtocolResult<()>;
}

/// Name and signatures of a request type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestDescriptor {
    pub name: &'static str,
    pub query_signature: Signature,
    pub response_signature: Signature,
}

impl RequestDescriptor {
    /// Derives both signatures from `name`.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            query_signature: Signature::derive(name, "/query"),
            response_signature: Signature::derive(name, "/response"),
        }
    }
}

/// The query half of a request, bound to its response type and descriptor.
pub trait QueryPayload: Payload {
    type Response: Payload;
    const DESCRIPTOR: RequestDescriptor;
}

/// Lifecycle of a single request.
///
/// `Created -> Sent -> {Responded | Failed | Cancelled | TimedOut}`, with
/// exactly one terminal transition per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestState {
    Created,
    Sent,
    Responded,
    Failed,
    Cancelled,
    TimedOut,
}

impl RequestState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestState::Responded
                | RequestState::Failed
                | RequestState::Cancelled
                | RequestState::TimedOut
        )
    }
}

/// Header of every request message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageHeader {
    pub signature: Signature,
    pub correlation_id: u32,
}

impl MessageHeader {
    pub fn serialize(&mut self, serializer: &mut BinarySerializer<'_>) -> ProtocolResult<()> {
        let mut signature = self.signature.raw();
        serializer.serialize(&mut signature)?;
        self.signature = Signature::new(signature);
        serializer.serialize(&mut self.correlation_id)
    }

    pub fn read(serializer: &mut BinarySerializer<'_>) -> ProtocolResult<Self> {
        let mut header = Self::default();
        header.serialize(serializer)?;
        Ok(header)
    }
}

/// Writes a complete request message: header, then `payload`.
pub fn write_message<P: Payload>(
    signature: Signature,
    correlation_id: u32,
    payload: &mut P,
    protocol_version: u8,
) -> ProtocolResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut writer = BinarySerializer::writer(&mut buffer);
    MessageHeader {
        signature,
        correlation_id,
    }
    .serialize(&mut writer)?;
    payload.serialize_data(&mut writer, protocol_version)?;
    Ok(buffer)
}

/// A request instance, from creation to its terminal state.
///
/// The request owns its query until it is sent and its response once received.
/// After a terminal transition, [`Request::response`] tells "data present"
/// (`Responded`) apart from every outcome without data.
#[derive(Debug)]
pub struct Request<Q, R> {
    query: Q,
    response: Option<R>,
    state: RequestState,
    correlation_id: Option<u32>,
}

impl<Q, R> Request<Q, R>
where
    Q: QueryPayload<Response = R>,
    R: Payload,
{
    pub fn new(query: Q) -> Self {
        Self {
            query,
            response: None,
            state: RequestState::Created,
            correlation_id: None,
        }
    }

    pub fn descriptor() -> RequestDescriptor {
        Q::DESCRIPTOR
    }

    pub fn name(&self) -> &'static str {
        Q::DESCRIPTOR.name
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    /// The id assigned when the request was sent.
    pub fn correlation_id(&self) -> Option<u32> {
        self.correlation_id
    }

    pub fn query(&self) -> &Q {
        &self.query
    }

    pub fn response(&self) -> Option<&R> {
        self.response.as_ref()
    }

    pub fn into_response(self) -> Option<R> {
        self.response
    }

    /// Encodes the query under `correlation_id`.
    pub fn encode_query(
        &mut self,
        correlation_id: u32,
        protocol_version: u8,
    ) -> ProtocolResult<Vec<u8>> {
        write_message(
            Q::DESCRIPTOR.query_signature,
            correlation_id,
            &mut self.query,
            protocol_version,
        )
    }

    pub(crate) fn mark_sent(&mut self, correlation_id: u32) -> ProtocolResult<()> {
        if self.state != RequestState::Created {
            return Err(ProtocolError::RequestNotSendable {
                name: Q::DESCRIPTOR.name,
                state: self.state,
            });
        }
        self.state = RequestState::Sent;
        self.correlation_id = Some(correlation_id);
        Ok(())
    }

    /// Stores the response. Ignored unless the request is still in flight.
    pub(crate) fn complete(&mut self, response: R) -> bool {
        if self.state != RequestState::Sent {
            return false;
        }
        self.response = Some(response);
        self.state = RequestState::Responded;
        true
    }

    /// Ends the request without a response. Ignored once terminal.
    pub(crate) fn terminate(&mut self, state: RequestState) -> bool {
        if self.state.is_terminal() || !state.is_terminal() || state == RequestState::Responded {
            return false;
        }
        self.state = state;
        true
    }
}

/// Declares a request type.
///
/// Binds a name to a query and a response payload, and generates the alias
/// `Request<Query, Response>` under the given identifier:
/// ```rust ignore
/// highlevel_request!(
///     /// Asks the server which optional features it supports.
///     GetServerFeaturesRequest = "GetServerFeaturesRequest",
///     GetServerFeaturesQuery => GetServerFeaturesResponse
/// );
/// ```
#[macro_export]
macro_rules! highlevel_request {
    ($(#[$meta: meta])* $alias: ident = $name: literal, $query: ty => $response: ty) => {
        impl $crate::protocol::request::QueryPayload for $query {
            type Response = $response;
            const DESCRIPTOR: $crate::protocol::request::RequestDescriptor =
                $crate::protocol::request::RequestDescriptor::new($name);
        }

        $(#[$meta])*
        pub type $alias = $crate::protocol::request::Request<$query, $response>;
    };
}
