//! The signature to packet mapping used by receivers.
//!
//! A catalog is built once at startup and then shared by reference with
//! whatever decodes incoming buffers. It owns no packet instances, only the
//! entry registered for each signature: a factory for connectionless packets,
//! a [`RequestDescriptor`] for requests.
//!
//! [`RequestDescriptor`]: crate::protocol::request::RequestDescriptor
use std::collections::HashMap;

use crate::error::{CatalogError, ProtocolError, ProtocolResult};
use crate::protocol::signature::Signature;

#[derive(Debug, Clone)]
struct CatalogEntry<E> {
    name: &'static str,
    entry: E,
}

#[derive(Debug, Clone)]
pub struct PacketCatalog<E> {
    entries: HashMap<Signature, CatalogEntry<E>>,
}

impl<E> PacketCatalog<E> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Registers `entry` under `signature`.
    ///
    /// Registering a signature twice is a programming error and is reported
    /// here, at initialization, never while packets are flowing.
    pub fn register(
        &mut self,
        signature: Signature,
        name: &'static str,
        entry: E,
    ) -> Result<(), CatalogError> {
        if let Some(existing) = self.entries.get(&signature) {
            return Err(CatalogError::DuplicateSignature {
                signature,
                existing: existing.name,
                duplicate: name,
            });
        }
        self.entries.insert(signature, CatalogEntry { name, entry });
        Ok(())
    }

    /// Looks up the entry for an incoming signature.
    pub fn dispatch(&self, signature: Signature) -> ProtocolResult<&E> {
        self.entries
            .get(&signature)
            .map(|e| &e.entry)
            .ok_or(ProtocolError::UnknownSignature(signature))
    }

    /// The human readable name registered with `signature`.
    pub fn name_of(&self, signature: Signature) -> Option<&'static str> {
        self.entries.get(&signature).map(|e| e.name)
    }

    pub fn contains(&self, signature: Signature) -> bool {
        self.entries.contains_key(&signature)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E> Default for PacketCatalog<E> {
    fn default() -> Self {
        Self::new()
    }
}
