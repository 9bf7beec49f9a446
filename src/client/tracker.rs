//! Correlation of sent requests with their responses.
//!
//! The [`RequestTracker`] is the table a transport keeps per session: every
//! sent request gets a fresh correlation id and an entry holding its
//! continuation. The entry leaves the table on exactly one terminal transition,
//! so a late or duplicated response finds nothing and is dropped.
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::channel::oneshot;

use crate::config::ProtocolConfig;
use crate::error::{ProtocolError, ProtocolResult, RequestError};
use crate::protocol::request::{
    MessageHeader, Payload, QueryPayload, Request, RequestDescriptor, RequestState,
};
use crate::protocol::serializer::BinarySerializer;
use crate::util::debug::{netcore_debug, netcore_debug_buffers};
use crate::util::{current_epoch, IdGenerator};

/// What a pending entry is completed with.
enum Completion<'a> {
    Response { payload: &'a [u8], protocol_version: u8 },
    Terminated(RequestState),
}

type Continuation = Box<dyn FnOnce(Completion<'_>) -> ProtocolResult<()> + Send>;

struct PendingEntry {
    descriptor: RequestDescriptor,
    created: u64,
    continuation: Continuation,
}

/// Tracks requests in flight for one session.
///
/// ```rust
/// use oxygen_netcore::client::RequestTracker;
/// use oxygen_netcore::config::ProtocolConfig;
/// use oxygen_netcore::protocol::packet::online::*;
///
/// let mut tracker = RequestTracker::new(ProtocolConfig::default());
/// let request = GetExternalAddressRequest::new(GetExternalAddressQuery);
/// let (bytes, pending) = tracker.send(request, 1).unwrap();
/// assert!(tracker.is_pending(pending.correlation_id()));
/// assert!(!bytes.is_empty());
/// ```
pub struct RequestTracker {
    ids: IdGenerator,
    pending: HashMap<u32, PendingEntry>,
    config: ProtocolConfig,
}

impl RequestTracker {
    pub fn new(config: ProtocolConfig) -> Self {
        Self::with_ids(IdGenerator::new(), config)
    }

    /// A tracker drawing correlation ids from `ids`.
    pub fn with_ids(ids: IdGenerator, config: ProtocolConfig) -> Self {
        Self {
            ids,
            pending: HashMap::new(),
            config,
        }
    }

    /// Assigns a correlation id to `request`, encodes its query and starts tracking it.
    ///
    /// Returns the bytes to hand to the transport and a future resolving to the
    /// request once it reached a terminal state.
    pub fn send<Q, R>(
        &mut self,
        mut request: Request<Q, R>,
        protocol_version: u8,
    ) -> ProtocolResult<(Vec<u8>, PendingRequest<Q, R>)>
    where
        Q: QueryPayload<Response = R>,
        R: Payload,
    {
        if request.state() != RequestState::Created {
            return Err(ProtocolError::RequestNotSendable {
                name: request.name(),
                state: request.state(),
            });
        }
        self.config.check_version(protocol_version)?;

        let mut correlation_id = self.ids.next();
        while self.pending.contains_key(&correlation_id) {
            correlation_id = self.ids.next();
        }

        let bytes = request.encode_query(correlation_id, protocol_version)?;
        self.config.check_size(bytes.len())?;
        request.mark_sent(correlation_id)?;

        let (sender, receiver) = oneshot::channel();
        let continuation: Continuation = Box::new(move |completion| {
            let mut request = request;
            let result = match completion {
                Completion::Response {
                    payload,
                    protocol_version,
                } => {
                    let mut response = R::default();
                    let mut reader = BinarySerializer::reader(payload);
                    match response.serialize_data(&mut reader, protocol_version) {
                        Ok(()) => {
                            request.complete(response);
                            Ok(())
                        }
                        Err(e) => {
                            request.terminate(RequestState::Failed);
                            Err(e)
                        }
                    }
                }
                Completion::Terminated(state) => {
                    request.terminate(state);
                    Ok(())
                }
            };
            // the caller may have stopped waiting, that is fine.
            let _ = sender.send(request);
            result
        });

        self.pending.insert(
            correlation_id,
            PendingEntry {
                descriptor: Q::DESCRIPTOR,
                created: current_epoch(),
                continuation,
            },
        );
        netcore_debug!("Sent '{}' as request {}", Q::DESCRIPTOR.name, correlation_id);
        netcore_debug_buffers!(false, "request {}: {:?}", correlation_id, bytes);

        Ok((
            bytes,
            PendingRequest {
                correlation_id,
                receiver,
            },
        ))
    }

    /// Routes a response buffer to the request waiting on its correlation id.
    ///
    /// Returns the completed correlation id. Errors mean the buffer was dropped:
    /// - [`ProtocolError::CorrelationMismatch`]: nobody waits on that id, a late
    ///   or duplicated delivery. Safe to ignore.
    /// - [`ProtocolError::UnknownSignature`]: the response is not of the expected
    ///   type. The request failed and this should be reported.
    /// - [`ProtocolError::MalformedPacket`]: the header or the payload could not
    ///   be read. If the id was known, the request failed without data.
    pub fn handle_response(&mut self, buffer: &[u8], protocol_version: u8) -> ProtocolResult<u32> {
        netcore_debug_buffers!(true, "response {:?}", buffer);
        self.config.check_size(buffer.len())?;

        let mut reader = BinarySerializer::reader(buffer);
        let header = MessageHeader::read(&mut reader)?;
        let entry = match self.pending.remove(&header.correlation_id) {
            Some(entry) => entry,
            None => {
                netcore_debug!(
                    "Dropped response {} with signature {}, nothing pending",
                    header.correlation_id,
                    header.signature
                );
                return Err(ProtocolError::CorrelationMismatch(header.correlation_id));
            }
        };

        if header.signature != entry.descriptor.response_signature {
            netcore_debug!(
                "Response {} to '{}' has signature {}, expected {}",
                header.correlation_id,
                entry.descriptor.name,
                header.signature,
                entry.descriptor.response_signature
            );
            (entry.continuation)(Completion::Terminated(RequestState::Failed))?;
            return Err(ProtocolError::UnknownSignature(header.signature));
        }

        (entry.continuation)(Completion::Response {
            payload: reader.remaining_bytes(),
            protocol_version,
        })?;
        netcore_debug!(
            true,
            "Request {} ('{}') responded",
            header.correlation_id,
            entry.descriptor.name
        );
        Ok(header.correlation_id)
    }

    /// Cancels a pending request. Returns `false` if it was not pending.
    pub fn cancel(&mut self, correlation_id: u32) -> bool {
        self.terminate(correlation_id, RequestState::Cancelled)
    }

    /// Fails a pending request, for instance when the session broke down.
    pub fn fail(&mut self, correlation_id: u32) -> bool {
        self.terminate(correlation_id, RequestState::Failed)
    }

    /// Times out a pending request. The transport owns the clock and decides when.
    pub fn time_out(&mut self, correlation_id: u32) -> bool {
        self.terminate(correlation_id, RequestState::TimedOut)
    }

    /// Times out every request pending for longer than `max_age`.
    pub fn expire(&mut self, max_age: Duration) -> Vec<u32> {
        self.expire_at(current_epoch(), max_age)
    }

    /// Like [`RequestTracker::expire`], with `now` in milliseconds since the unix epoch.
    pub fn expire_at(&mut self, now: u64, max_age: Duration) -> Vec<u32> {
        let max_age = max_age.as_millis() as u64;
        let expired: Vec<u32> = self
            .pending
            .iter()
            .filter(|(_, entry)| now.saturating_sub(entry.created) >= max_age)
            .map(|(id, _)| *id)
            .collect();
        for id in expired.iter() {
            self.time_out(*id);
        }
        expired
    }

    pub fn is_pending(&self, correlation_id: u32) -> bool {
        self.pending.contains_key(&correlation_id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Name of the request pending under `correlation_id`, for diagnostics.
    pub fn name_of(&self, correlation_id: u32) -> Option<&'static str> {
        self.pending
            .get(&correlation_id)
            .map(|entry| entry.descriptor.name)
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    fn terminate(&mut self, correlation_id: u32, state: RequestState) -> bool {
        match self.pending.remove(&correlation_id) {
            Some(entry) => {
                netcore_debug!(
                    "Request {} ('{}') ended as {:?}",
                    correlation_id,
                    entry.descriptor.name,
                    state
                );
                // terminal completions never decode anything
                let _ = (entry.continuation)(Completion::Terminated(state));
                true
            }
            None => false,
        }
    }
}

impl Drop for RequestTracker {
    fn drop(&mut self) {
        for (_, entry) in self.pending.drain() {
            let _ = (entry.continuation)(Completion::Terminated(RequestState::Cancelled));
        }
    }
}

/// Resolves to a request once it reached a terminal state.
///
/// Check [`Request::state`] and [`Request::response`] on the result: only
/// `Responded` requests carry a response.
pub struct PendingRequest<Q, R> {
    correlation_id: u32,
    receiver: oneshot::Receiver<Request<Q, R>>,
}

impl<Q, R> PendingRequest<Q, R> {
    pub fn correlation_id(&self) -> u32 {
        self.correlation_id
    }

    /// Takes the finished request without blocking, `None` while still pending.
    pub fn try_take(&mut self) -> Option<Result<Request<Q, R>, RequestError>> {
        match self.receiver.try_recv() {
            Ok(Some(request)) => Some(Ok(request)),
            Ok(None) => None,
            Err(_) => Some(Err(RequestError::Abandoned)),
        }
    }
}

impl<Q, R> Future for PendingRequest<Q, R> {
    type Output = Result<Request<Q, R>, RequestError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|result| result.map_err(|_| RequestError::Abandoned))
    }
}
