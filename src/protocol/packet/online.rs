//! Online packets are the payloads of requests exchanged once a session exists.
//!
//! The following requests are provided:
//! - [`GetServerFeaturesRequest`]
//! - [`GetExternalAddressRequest`]
//! - [`AppUpdateCheckRequest`]
//!
//! Fields that only exist under some condition (see [`AppUpdateCheckResponse`])
//! are skipped entirely on the wire when the condition does not hold. Any field
//! added later must be gated the same way, by a flag or by the protocol version,
//! and never be assumed present.
use crate::error::ProtocolResult;
use crate::highlevel_request;
use crate::protocol::packet::offline::MAX_IP_LENGTH;
use crate::protocol::request::Payload;
use crate::protocol::serializer::BinarySerializer;
use crate::protocol::version::VersionRange;

/// Bound of every plain string in request payloads.
pub const MAX_STRING_LENGTH: usize = 0xff;
/// Most features a server can advertise.
pub const MAX_FEATURES: usize = 0xff;

// ----- GetServerFeatures -----

/// Empty query of [`GetServerFeaturesRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GetServerFeaturesQuery;

impl Payload for GetServerFeaturesQuery {
    fn serialize_data(&mut self, _: &mut BinarySerializer<'_>, _: u8) -> ProtocolResult<()> {
        Ok(())
    }
}

/// An optional protocol feature and the versions of it a server supports.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Feature {
    pub identifier: String,
    pub versions: VersionRange<u8>,
}

impl Feature {
    pub fn new(identifier: impl Into<String>, versions: VersionRange<u8>) -> Self {
        Self {
            identifier: identifier.into(),
            versions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GetServerFeaturesResponse {
    /// Advertised features, in the server's order.
    pub features: Vec<Feature>,
}

impl Payload for GetServerFeaturesResponse {
    fn serialize_data(
        &mut self,
        serializer: &mut BinarySerializer<'_>,
        _protocol_version: u8,
    ) -> ProtocolResult<()> {
        serializer.serialize_array_size(&mut self.features, MAX_FEATURES)?;
        for feature in self.features.iter_mut() {
            serializer.serialize_string(&mut feature.identifier, MAX_STRING_LENGTH)?;
            feature.versions.serialize(serializer)?;
        }
        Ok(())
    }
}

highlevel_request!(
    /// Lets a client discover which optional features a server supports, and
    /// at which versions, before using any of them.
    GetServerFeaturesRequest = "GetServerFeaturesRequest",
    GetServerFeaturesQuery => GetServerFeaturesResponse
);

// ----- GetExternalAddress -----

/// Empty query of [`GetExternalAddressRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GetExternalAddressQuery;

impl Payload for GetExternalAddressQuery {
    fn serialize_data(&mut self, _: &mut BinarySerializer<'_>, _: u8) -> ProtocolResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GetExternalAddressResponse {
    pub ip: String,
    pub port: u16,
}

impl Payload for GetExternalAddressResponse {
    fn serialize_data(
        &mut self,
        serializer: &mut BinarySerializer<'_>,
        _protocol_version: u8,
    ) -> ProtocolResult<()> {
        serializer.serialize_string(&mut self.ip, MAX_IP_LENGTH)?;
        serializer.serialize(&mut self.port)
    }
}

highlevel_request!(
    /// The in-session equivalent of [`GetExternalAddressConnectionless`].
    ///
    /// [`GetExternalAddressConnectionless`]: super::offline::GetExternalAddressConnectionless
    GetExternalAddressRequest = "GetExternalAddressRequest",
    GetExternalAddressQuery => GetExternalAddressResponse
);

// ----- AppUpdateCheck -----

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppUpdateCheckQuery {
    pub app_name: String,
    pub platform: String,
    pub release_channel: String,
    pub installed_app_version: u32,
    pub installed_content_version: u32,
}

impl Payload for AppUpdateCheckQuery {
    fn serialize_data(
        &mut self,
        serializer: &mut BinarySerializer<'_>,
        _protocol_version: u8,
    ) -> ProtocolResult<()> {
        serializer.serialize_string(&mut self.app_name, MAX_STRING_LENGTH)?;
        serializer.serialize_string(&mut self.platform, MAX_STRING_LENGTH)?;
        serializer.serialize_string(&mut self.release_channel, MAX_STRING_LENGTH)?;
        serializer.serialize(&mut self.installed_app_version)?;
        serializer.serialize(&mut self.installed_content_version)
    }
}

/// Answer to an update check.
///
/// Everything after `has_update` is only on the wire when `has_update` is set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppUpdateCheckResponse {
    pub has_update: bool,
    pub available_app_version: u32,
    pub available_content_version: u32,
    pub update_info_url: String,
}

impl AppUpdateCheckResponse {
    pub fn no_update() -> Self {
        Self::default()
    }

    pub fn update(app_version: u32, content_version: u32, info_url: impl Into<String>) -> Self {
        Self {
            has_update: true,
            available_app_version: app_version,
            available_content_version: content_version,
            update_info_url: info_url.into(),
        }
    }
}

impl Payload for AppUpdateCheckResponse {
    fn serialize_data(
        &mut self,
        serializer: &mut BinarySerializer<'_>,
        _protocol_version: u8,
    ) -> ProtocolResult<()> {
        serializer.serialize(&mut self.has_update)?;
        if self.has_update {
            serializer.serialize(&mut self.available_app_version)?;
            serializer.serialize(&mut self.available_content_version)?;
            serializer.serialize_string(&mut self.update_info_url, MAX_STRING_LENGTH)?;
        }
        Ok(())
    }
}

highlevel_request!(
    /// Asks whether a newer build or content pack is available for an installation.
    AppUpdateCheckRequest = "AppUpdateCheck",
    AppUpdateCheckQuery => AppUpdateCheckResponse
);
