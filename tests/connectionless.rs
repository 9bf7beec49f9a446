use std::net::SocketAddr;
use std::time::Duration;

use oxygen_netcore::client::ExternalAddressDiscovery;
use oxygen_netcore::config::ProtocolConfig;
use oxygen_netcore::error::{CatalogError, ProtocolError};
use oxygen_netcore::protocol::packet::offline::{
    GetExternalAddressConnectionless, LowLevelPacket, ReplyExternalAddressConnectionless,
    MAX_IP_LENGTH,
};
use oxygen_netcore::protocol::packet::{Packet, PacketCodec};
use oxygen_netcore::protocol::{PacketCatalog, Signature};
use oxygen_netcore::server::{reply_external_address, respond_connectionless};

fn codec() -> PacketCodec {
    PacketCodec::new(ProtocolConfig::default()).unwrap()
}

#[test]
fn query_layout() {
    let mut query = GetExternalAddressConnectionless {
        packet_version: 1,
        query_id: 0x0102030405060708,
    };
    let bytes = codec().encode(&mut query, 1).unwrap();
    assert_eq!(
        bytes,
        vec![0xcf, 0x3b, 1, 0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]
    );
}

#[test]
fn reply_with_longest_ip_decodes() {
    let codec = codec();
    let mut reply = ReplyExternalAddressConnectionless {
        query_id: 42,
        ip: "f".repeat(MAX_IP_LENGTH),
        port: 19132,
        ..Default::default()
    };
    let bytes = codec.encode(&mut reply, 1).unwrap();
    let decoded = codec.decode(&bytes, 1).unwrap();
    assert_eq!(decoded, LowLevelPacket::ReplyExternalAddressConnectionless(reply));
}

#[test]
fn reply_with_ip_too_long_is_refused() {
    let mut reply = ReplyExternalAddressConnectionless {
        ip: "f".repeat(MAX_IP_LENGTH + 1),
        ..Default::default()
    };
    assert!(matches!(
        codec().encode(&mut reply, 1),
        Err(ProtocolError::LengthExceeded { .. })
    ));
}

#[test]
fn unknown_signature_is_dropped() {
    let codec = codec();
    let buffer = [0x34, 0x12, 1, 2, 3];
    assert_eq!(
        codec.decode(&buffer, 1),
        Err(ProtocolError::UnknownSignature(Signature::new(0x1234)))
    );
    assert_eq!(codec.receive(&buffer, 1), None);
}

#[test]
fn truncated_packet_is_dropped() {
    let codec = codec();
    let mut query = GetExternalAddressConnectionless::default();
    let mut bytes = codec.encode(&mut query, 1).unwrap();
    bytes.pop();
    assert!(matches!(codec.decode(&bytes, 1), Err(ProtocolError::MalformedPacket(_))));
    assert_eq!(codec.receive(&bytes, 1), None);
    assert_eq!(codec.receive(&[0xcf], 1), None);
}

#[test]
fn oversized_buffer_is_dropped() {
    let codec = PacketCodec::new(ProtocolConfig::default().with_max_packet_size(8)).unwrap();
    let mut query = GetExternalAddressConnectionless::default();
    assert!(matches!(
        codec.encode(&mut query, 1),
        Err(ProtocolError::PacketTooLarge { size: 11, max: 8 })
    ));
}

#[test]
fn duplicate_registration_is_rejected() {
    let mut catalog = PacketCatalog::new();
    LowLevelPacket::register_all(&mut catalog).unwrap();
    let result = catalog.register(
        GetExternalAddressConnectionless::SIGNATURE,
        "Impostor",
        || LowLevelPacket::GetExternalAddressConnectionless(Default::default()),
    );
    assert_eq!(
        result,
        Err(CatalogError::DuplicateSignature {
            signature: Signature::new(0x3bcf),
            existing: "GetExternalAddressConnectionless",
            duplicate: "Impostor",
        })
    );
    assert_eq!(catalog.len(), 2);
}

#[test]
fn family_conversions() {
    let query = GetExternalAddressConnectionless {
        query_id: 9,
        ..Default::default()
    };
    let packet = LowLevelPacket::from(query.clone());
    assert_eq!(packet.name(), "GetExternalAddressConnectionless");
    assert_eq!(packet.signature(), Signature::new(0x3bcf));
    assert_eq!(GetExternalAddressConnectionless::try_from(packet.clone()), Ok(query));
    assert!(ReplyExternalAddressConnectionless::try_from(packet).is_err());
}

#[test]
fn relay_echoes_query_id_and_peer() {
    let peer: SocketAddr = "203.0.113.7:50123".parse().unwrap();
    let query = GetExternalAddressConnectionless {
        query_id: 77,
        ..Default::default()
    };
    let reply = reply_external_address(&query, peer);
    assert_eq!(reply.query_id, 77);
    assert_eq!(reply.ip, "203.0.113.7");
    assert_eq!(reply.port, 50123);
}

#[test]
fn discovery_round_trip_through_relay() {
    let codec = codec();
    let peer: SocketAddr = "198.51.100.1:4000".parse().unwrap();
    let mut discovery = ExternalAddressDiscovery::new();

    let mut query = discovery.begin();
    assert_ne!(query.query_id, 0);
    let datagram = codec.encode(&mut query, 1).unwrap();

    let answer = respond_connectionless(&codec, &datagram, peer, 1).unwrap();
    let reply = match codec.receive(&answer, 1) {
        Some(LowLevelPacket::ReplyExternalAddressConnectionless(reply)) => reply,
        other => panic!("unexpected packet {:?}", other),
    };

    let address = discovery.handle_reply(&reply).unwrap();
    assert_eq!(address.to_socket_addr(), Some(peer));
    // a duplicate of the same reply is ignored
    assert_eq!(discovery.handle_reply(&reply), None);
}

#[test]
fn relay_does_not_answer_replies() {
    let codec = codec();
    let peer: SocketAddr = "198.51.100.1:4000".parse().unwrap();
    let mut reply = ReplyExternalAddressConnectionless::default();
    let datagram = codec.encode(&mut reply, 1).unwrap();
    assert_eq!(respond_connectionless(&codec, &datagram, peer, 1), None);
}

#[test]
fn discovery_ignores_unknown_query_ids() {
    let mut discovery = ExternalAddressDiscovery::new();
    let query = discovery.begin();
    let stray = ReplyExternalAddressConnectionless {
        query_id: query.query_id.wrapping_add(1),
        ip: "10.0.0.1".into(),
        port: 1,
        ..Default::default()
    };
    assert_eq!(discovery.handle_reply(&stray), None);
    assert!(discovery.is_outstanding(query.query_id));
}

#[test]
fn discovery_expires_old_queries() {
    let mut discovery = ExternalAddressDiscovery::new();
    let query = discovery.begin();
    let far_future = u64::MAX;
    let expired = discovery.expire_at(far_future, Duration::from_secs(5));
    assert_eq!(expired, vec![query.query_id]);
    assert_eq!(discovery.outstanding_count(), 0);
    assert!(!discovery.forget(query.query_id));
}
