//! External address discovery over the connectionless channel.
//!
//! The client sends a [`GetExternalAddressConnectionless`] to a relay and waits
//! for a [`ReplyExternalAddressConnectionless`] echoing its query id. Replies
//! are matched against the outstanding ids only: anything else (a duplicate, a
//! reply to a forgotten query, a stray datagram) is ignored.
//!
//! Retries and timeouts belong to the transport, which calls
//! [`ExternalAddressDiscovery::forget`] or [`ExternalAddressDiscovery::expire_at`]
//! when it gives up on a query.
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::protocol::packet::offline::{
    GetExternalAddressConnectionless, ReplyExternalAddressConnectionless,
};
use crate::util::current_epoch;
use crate::util::debug::netcore_debug;

/// The address a relay saw our query coming from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalAddress {
    pub ip: String,
    pub port: u16,
}

impl ExternalAddress {
    /// Parses the address, `None` if the relay sent something that is not an IP.
    pub fn to_socket_addr(&self) -> Option<SocketAddr> {
        self.ip
            .parse::<IpAddr>()
            .ok()
            .map(|ip| SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Default)]
pub struct ExternalAddressDiscovery {
    /// query id -> time the query was built
    outstanding: HashMap<u64, u64>,
}

impl ExternalAddressDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a new query with a fresh, random query id.
    pub fn begin(&mut self) -> GetExternalAddressConnectionless {
        let mut query_id = rand::random::<u64>();
        while query_id == 0 || self.outstanding.contains_key(&query_id) {
            query_id = rand::random::<u64>();
        }
        self.outstanding.insert(query_id, current_epoch());
        GetExternalAddressConnectionless {
            query_id,
            ..Default::default()
        }
    }

    /// Accepts `reply` if it answers an outstanding query.
    ///
    /// The query is settled by its first matching reply, later copies are ignored.
    pub fn handle_reply(
        &mut self,
        reply: &ReplyExternalAddressConnectionless,
    ) -> Option<ExternalAddress> {
        if self.outstanding.remove(&reply.query_id).is_none() {
            netcore_debug!("Ignored address reply for unknown query {:#x}", reply.query_id);
            return None;
        }
        Some(ExternalAddress {
            ip: reply.ip.clone(),
            port: reply.port,
        })
    }

    /// Stops waiting for the reply to `query_id`.
    pub fn forget(&mut self, query_id: u64) -> bool {
        self.outstanding.remove(&query_id).is_some()
    }

    /// Forgets every query older than `max_age`, `now` being milliseconds since the unix epoch.
    pub fn expire_at(&mut self, now: u64, max_age: Duration) -> Vec<u64> {
        let max_age = max_age.as_millis() as u64;
        let expired: Vec<u64> = self
            .outstanding
            .iter()
            .filter(|(_, sent)| now.saturating_sub(**sent) >= max_age)
            .map(|(id, _)| *id)
            .collect();
        for id in expired.iter() {
            self.outstanding.remove(id);
        }
        expired
    }

    pub fn is_outstanding(&self, query_id: u64) -> bool {
        self.outstanding.contains_key(&query_id)
    }

    pub fn outstanding_count(&self) -> usize {
        self.outstanding.len()
    }
}
