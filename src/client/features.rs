//! Per-feature version negotiation.
//!
//! Each endpoint knows which optional features it implements and at which
//! versions. After a [`GetServerFeaturesRequest`] the client intersects its own
//! ranges with the advertised ones; a feature is only used at a version both
//! sides cover. The check is explicit, nothing in the framework infers it.
//!
//! [`GetServerFeaturesRequest`]: crate::protocol::packet::online::GetServerFeaturesRequest
use std::collections::HashMap;

use crate::error::{ProtocolError, ProtocolResult};
use crate::protocol::packet::online::{Feature, GetServerFeaturesResponse};
use crate::protocol::version::VersionRange;
use crate::util::debug::netcore_debug;

#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    /// Local features, in registration order.
    local: Vec<Feature>,
    /// Versions usable with the remote side, filled by [`FeatureTable::apply`].
    negotiated: HashMap<String, VersionRange<u8>>,
}

impl FeatureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a locally supported feature, replacing an earlier declaration.
    pub fn with_feature(
        mut self,
        identifier: impl Into<String>,
        versions: VersionRange<u8>,
    ) -> Self {
        let identifier = identifier.into();
        self.local.retain(|f| f.identifier != identifier);
        self.local.push(Feature::new(identifier, versions));
        self
    }

    /// The local range of `identifier`.
    pub fn local(&self, identifier: &str) -> Option<VersionRange<u8>> {
        self.local
            .iter()
            .find(|f| f.identifier == identifier)
            .map(|f| f.versions)
    }

    /// What a server answers a [`GetServerFeaturesRequest`] with.
    ///
    /// [`GetServerFeaturesRequest`]: crate::protocol::packet::online::GetServerFeaturesRequest
    pub fn to_response(&self) -> GetServerFeaturesResponse {
        GetServerFeaturesResponse {
            features: self.local.clone(),
        }
    }

    /// Intersects the local features with the ones the server advertised.
    /// Returns how many features are usable.
    pub fn apply(&mut self, response: &GetServerFeaturesResponse) -> usize {
        self.negotiated.clear();
        for remote in response.features.iter() {
            let Some(local) = self.local(&remote.identifier) else {
                continue;
            };
            match local.intersect(&remote.versions) {
                Some(common) => {
                    self.negotiated.insert(remote.identifier.clone(), common);
                }
                None => netcore_debug!(
                    "Feature '{}' unusable: local {} vs remote {}",
                    remote.identifier,
                    local,
                    remote.versions
                ),
            }
        }
        self.negotiated.len()
    }

    /// Versions of `identifier` both sides support.
    pub fn common(&self, identifier: &str) -> Option<VersionRange<u8>> {
        self.negotiated.get(identifier).copied()
    }

    /// Highest version of `identifier` both sides support.
    pub fn negotiated(&self, identifier: &str) -> Option<u8> {
        self.common(identifier).map(|range| range.max())
    }

    /// Checks that `identifier` can be used at `version`.
    pub fn require(&self, identifier: &str, version: u8) -> ProtocolResult<()> {
        let common = self
            .common(identifier)
            .ok_or_else(|| ProtocolError::FeatureUnsupported(identifier.to_owned()))?;
        if !common.contains(version) {
            return Err(ProtocolError::VersionUnsupported {
                version,
                supported: common,
            });
        }
        Ok(())
    }
}
