use std::fmt;

/// The 16-bit tag that identifies a packet type on the wire.
///
/// Connectionless packets pick theirs by hand, requests derive theirs from
/// their name with [`Signature::derive`]. Either way a signature is a
/// compile-time constant and collisions are caught when a
/// [`PacketCatalog`](crate::protocol::PacketCatalog) is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Signature(u16);

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

const fn fnv1a(mut hash: u32, bytes: &[u8]) -> u32 {
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

impl Signature {
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    /// Hashes `name` followed by `suffix` (32-bit FNV-1a) and folds the
    /// result down to 16 bits.
    pub const fn derive(name: &str, suffix: &str) -> Self {
        let hash = fnv1a(fnv1a(FNV_OFFSET, name.as_bytes()), suffix.as_bytes());
        Self(((hash >> 16) ^ (hash & 0xffff)) as u16)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl From<u16> for Signature {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<Signature> for u16 {
    fn from(signature: Signature) -> Self {
        signature.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}
