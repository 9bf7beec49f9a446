//! # Catalog Error
//! Raised while registering packet types, never while packets are flowing.
use thiserror::Error;

use crate::protocol::signature::Signature;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Two packet types share a wire signature. This is a programming error and
    /// must be fixed by changing one of the signatures.
    #[error("signature {signature} registered twice ('{existing}' and '{duplicate}')")]
    DuplicateSignature {
        signature: Signature,
        existing: &'static str,
        duplicate: &'static str,
    },
}
