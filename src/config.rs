//! Protocol configuration shared by codecs, trackers and catalogs.
use crate::error::{ProtocolError, ProtocolResult};
use crate::protocol::{supported_protocol_versions, VersionRange, MAX_PACKET_SIZE};

/// Limits and versions an endpoint is willing to work with.
///
/// ```rust
/// use oxygen_netcore::config::ProtocolConfig;
///
/// let config = ProtocolConfig::default().with_max_packet_size(1200);
/// assert_eq!(config.max_packet_size, 1200);
/// assert!(config.check_version(1).is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolConfig {
    /// Protocol versions this endpoint can speak.
    pub versions: VersionRange<u8>,
    /// Packets larger than this are refused when encoding and dropped when decoding.
    pub max_packet_size: usize,
}

impl ProtocolConfig {
    pub fn with_versions(mut self, versions: VersionRange<u8>) -> Self {
        self.versions = versions;
        self
    }

    pub fn with_max_packet_size(mut self, max_packet_size: usize) -> Self {
        self.max_packet_size = max_packet_size;
        self
    }

    /// Picks the protocol version for a session with a peer advertising `remote`.
    pub fn negotiate(&self, remote: VersionRange<u8>) -> ProtocolResult<u8> {
        self.versions
            .negotiate(&remote)
            .ok_or(ProtocolError::NoCommonVersion {
                local: self.versions,
                remote,
            })
    }

    pub fn check_version(&self, version: u8) -> ProtocolResult<()> {
        if self.versions.contains(version) {
            Ok(())
        } else {
            Err(ProtocolError::VersionUnsupported {
                version,
                supported: self.versions,
            })
        }
    }

    pub fn check_size(&self, size: usize) -> ProtocolResult<()> {
        if size > self.max_packet_size {
            return Err(ProtocolError::PacketTooLarge {
                size,
                max: self.max_packet_size,
            });
        }
        Ok(())
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            versions: supported_protocol_versions(),
            max_packet_size: MAX_PACKET_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negotiates_highest_common_version() {
        let config = ProtocolConfig::default().with_versions(VersionRange::new(1, 3).unwrap());
        assert_eq!(config.negotiate(VersionRange::new(2, 9).unwrap()), Ok(3));
        assert!(matches!(
            config.negotiate(VersionRange::new(4, 9).unwrap()),
            Err(ProtocolError::NoCommonVersion { .. })
        ));
    }

    #[test]
    fn version_outside_range_is_unsupported() {
        let config = ProtocolConfig::default();
        assert_eq!(
            config.check_version(7),
            Err(ProtocolError::VersionUnsupported {
                version: 7,
                supported: supported_protocol_versions(),
            })
        );
    }

    #[test]
    fn size_limit() {
        let config = ProtocolConfig::default().with_max_packet_size(4);
        assert!(config.check_size(4).is_ok());
        assert_eq!(
            config.check_size(5),
            Err(ProtocolError::PacketTooLarge { size: 5, max: 4 })
        );
    }
}
