use std::time::Duration;

use futures_executor::block_on;
use oxygen_netcore::client::{FeatureTable, RequestTracker};
use oxygen_netcore::config::ProtocolConfig;
use oxygen_netcore::error::{CatalogError, ProtocolError};
use oxygen_netcore::protocol::packet::online::*;
use oxygen_netcore::protocol::request::{write_message, QueryPayload, RequestState};
use oxygen_netcore::protocol::VersionRange;
use oxygen_netcore::server::RequestCatalog;
use oxygen_netcore::util::IdGenerator;
use tracing_subscriber::EnvFilter;

// RUST_LOG=netcore=trace with `--features debug,debug_all` shows the tracker at work
fn tracker() -> RequestTracker {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    RequestTracker::with_ids(IdGenerator::starting_at(100), ProtocolConfig::default())
}

fn address_response(correlation_id: u32) -> Vec<u8> {
    let mut response = GetExternalAddressResponse {
        ip: "192.0.2.10".into(),
        port: 7777,
    };
    write_message(
        GetExternalAddressQuery::DESCRIPTOR.response_signature,
        correlation_id,
        &mut response,
        1,
    )
    .unwrap()
}

#[test]
fn response_with_other_id_leaves_request_pending() {
    let mut tracker = tracker();
    let (_, mut pending) = tracker
        .send(GetExternalAddressRequest::new(GetExternalAddressQuery), 1)
        .unwrap();
    let id = pending.correlation_id();

    assert_eq!(
        tracker.handle_response(&address_response(id + 1), 1),
        Err(ProtocolError::CorrelationMismatch(id + 1))
    );
    assert!(tracker.is_pending(id));
    assert!(pending.try_take().is_none());
}

#[test]
fn matching_response_completes_exactly_once() {
    let mut tracker = tracker();
    let (_, pending) = tracker
        .send(GetExternalAddressRequest::new(GetExternalAddressQuery), 1)
        .unwrap();
    let id = pending.correlation_id();

    assert_eq!(tracker.handle_response(&address_response(id), 1), Ok(id));
    assert_eq!(
        tracker.handle_response(&address_response(id), 1),
        Err(ProtocolError::CorrelationMismatch(id))
    );

    let request = block_on(pending).unwrap();
    assert_eq!(request.state(), RequestState::Responded);
    assert_eq!(request.correlation_id(), Some(id));
    let response = request.into_response().unwrap();
    assert_eq!(response.ip, "192.0.2.10");
    assert_eq!(response.port, 7777);
}

#[test]
fn wrong_response_type_fails_the_request() {
    let mut tracker = tracker();
    let (_, pending) = tracker
        .send(GetExternalAddressRequest::new(GetExternalAddressQuery), 1)
        .unwrap();
    let id = pending.correlation_id();

    let mut other = AppUpdateCheckResponse::no_update();
    let signature = AppUpdateCheckQuery::DESCRIPTOR.response_signature;
    let bytes = write_message(signature, id, &mut other, 1).unwrap();
    assert_eq!(
        tracker.handle_response(&bytes, 1),
        Err(ProtocolError::UnknownSignature(
            AppUpdateCheckQuery::DESCRIPTOR.response_signature
        ))
    );

    let request = block_on(pending).unwrap();
    assert_eq!(request.state(), RequestState::Failed);
    assert!(request.response().is_none());
}

#[test]
fn malformed_response_fails_the_request() {
    let mut tracker = tracker();
    let (_, pending) = tracker
        .send(GetExternalAddressRequest::new(GetExternalAddressQuery), 1)
        .unwrap();
    let id = pending.correlation_id();

    let mut bytes = address_response(id);
    bytes.truncate(bytes.len() - 1);
    assert!(matches!(
        tracker.handle_response(&bytes, 1),
        Err(ProtocolError::MalformedPacket(_))
    ));
    assert!(!tracker.is_pending(id));
    assert_eq!(block_on(pending).unwrap().state(), RequestState::Failed);
}

#[test]
fn cancel_and_time_out_are_terminal() {
    let mut tracker = tracker();
    let (_, cancelled) = tracker
        .send(GetExternalAddressRequest::new(GetExternalAddressQuery), 1)
        .unwrap();
    let (_, timed_out) = tracker
        .send(GetServerFeaturesRequest::new(GetServerFeaturesQuery), 1)
        .unwrap();
    assert_ne!(cancelled.correlation_id(), timed_out.correlation_id());
    assert_eq!(tracker.name_of(timed_out.correlation_id()), Some("GetServerFeaturesRequest"));

    assert!(tracker.cancel(cancelled.correlation_id()));
    assert!(!tracker.cancel(cancelled.correlation_id()));
    assert!(tracker.time_out(timed_out.correlation_id()));

    // a late response finds nothing
    assert_eq!(
        tracker.handle_response(&address_response(cancelled.correlation_id()), 1),
        Err(ProtocolError::CorrelationMismatch(cancelled.correlation_id()))
    );

    assert_eq!(block_on(cancelled).unwrap().state(), RequestState::Cancelled);
    assert_eq!(block_on(timed_out).unwrap().state(), RequestState::TimedOut);
    assert_eq!(tracker.pending_count(), 0);
}

#[test]
fn expire_times_out_old_requests() {
    let mut tracker = tracker();
    let (_, pending) = tracker
        .send(GetExternalAddressRequest::new(GetExternalAddressQuery), 1)
        .unwrap();
    assert!(tracker.expire_at(0, Duration::from_secs(30)).is_empty());
    assert_eq!(
        tracker.expire_at(u64::MAX, Duration::from_secs(30)),
        vec![pending.correlation_id()]
    );
    assert_eq!(block_on(pending).unwrap().state(), RequestState::TimedOut);
}

#[test]
fn dropping_the_tracker_cancels_pending_requests() {
    let mut tracker = tracker();
    let (_, pending) = tracker
        .send(GetExternalAddressRequest::new(GetExternalAddressQuery), 1)
        .unwrap();
    drop(tracker);
    assert_eq!(block_on(pending).unwrap().state(), RequestState::Cancelled);
}

#[test]
fn dropped_request_future_does_not_break_completion() {
    let mut tracker = tracker();
    let (_, pending) = tracker
        .send(GetExternalAddressRequest::new(GetExternalAddressQuery), 1)
        .unwrap();
    let id = pending.correlation_id();
    drop(pending);
    assert_eq!(tracker.handle_response(&address_response(id), 1), Ok(id));
}

#[test]
fn request_is_sent_once() {
    let mut tracker = tracker();
    let (_, mut pending) = tracker
        .send(GetExternalAddressRequest::new(GetExternalAddressQuery), 1)
        .unwrap();
    tracker.cancel(pending.correlation_id());
    let finished = pending.try_take().unwrap().unwrap();
    assert!(matches!(
        tracker.send(finished, 1),
        Err(ProtocolError::RequestNotSendable {
            state: RequestState::Cancelled,
            ..
        })
    ));
}

#[test]
fn unsupported_protocol_version_is_refused() {
    let mut tracker = tracker();
    assert!(matches!(
        tracker.send(GetExternalAddressRequest::new(GetExternalAddressQuery), 9),
        Err(ProtocolError::VersionUnsupported { version: 9, .. })
    ));
    assert_eq!(tracker.pending_count(), 0);
}

#[test]
fn correlation_ids_skip_zero() {
    let mut tracker =
        RequestTracker::with_ids(IdGenerator::starting_at(u32::MAX), ProtocolConfig::default());
    let (_, first) = tracker
        .send(GetExternalAddressRequest::new(GetExternalAddressQuery), 1)
        .unwrap();
    let (_, second) = tracker
        .send(GetExternalAddressRequest::new(GetExternalAddressQuery), 1)
        .unwrap();
    assert_eq!(first.correlation_id(), u32::MAX);
    assert_eq!(second.correlation_id(), 1);
}

#[test]
fn server_features_end_to_end() {
    let config = ProtocolConfig::default();
    let server_features = FeatureTable::new()
        .with_feature("chat", VersionRange::new(1, 3).unwrap())
        .with_feature("voice", VersionRange::single(2));
    let catalog = RequestCatalog::standard(config).unwrap();
    let mut tracker = tracker();

    let (query, pending) = tracker
        .send(GetServerFeaturesRequest::new(GetServerFeaturesQuery), 1)
        .unwrap();

    let incoming = catalog.read_query(&query).unwrap();
    assert_eq!(incoming.name(), "GetServerFeaturesRequest");
    assert!(incoming.is::<GetServerFeaturesQuery>());
    incoming.decode::<GetServerFeaturesQuery>(1).unwrap();
    let reply = incoming
        .respond::<GetServerFeaturesQuery>(&mut server_features.to_response(), 1)
        .unwrap();

    tracker.handle_response(&reply, 1).unwrap();
    let response = block_on(pending).unwrap().into_response().unwrap();
    assert_eq!(
        response.features,
        vec![
            Feature::new("chat", VersionRange::new(1, 3).unwrap()),
            Feature::new("voice", VersionRange::new(2, 2).unwrap()),
        ]
    );

    let mut client_features = FeatureTable::new()
        .with_feature("chat", VersionRange::new(2, 5).unwrap())
        .with_feature("voice", VersionRange::single(1))
        .with_feature("trade", VersionRange::single(1));
    assert_eq!(client_features.apply(&response), 1);
    assert_eq!(client_features.negotiated("chat"), Some(3));
    assert!(client_features.require("chat", 2).is_ok());
    assert!(matches!(
        client_features.require("chat", 4),
        Err(ProtocolError::VersionUnsupported { version: 4, .. })
    ));
    assert_eq!(
        client_features.require("voice", 1),
        Err(ProtocolError::FeatureUnsupported("voice".into()))
    );
    assert_eq!(
        client_features.require("trade", 1),
        Err(ProtocolError::FeatureUnsupported("trade".into()))
    );
}

#[test]
fn app_update_check_end_to_end() {
    let catalog = RequestCatalog::standard(ProtocolConfig::default()).unwrap();
    let mut tracker = tracker();
    let query = AppUpdateCheckQuery {
        app_name: "oxygen".into(),
        platform: "win64".into(),
        release_channel: "beta".into(),
        installed_app_version: 10,
        installed_content_version: 4,
    };
    let (bytes, pending) = tracker.send(AppUpdateCheckRequest::new(query.clone()), 1).unwrap();

    let incoming = catalog.read_query(&bytes).unwrap();
    assert!(!incoming.is::<GetServerFeaturesQuery>());
    assert_eq!(incoming.decode::<AppUpdateCheckQuery>(1).unwrap(), query);
    let mut answer = AppUpdateCheckResponse::update(11, 4, "https://updates.example.org/11");
    let reply = incoming.respond::<AppUpdateCheckQuery>(&mut answer, 1).unwrap();

    tracker.handle_response(&reply, 1).unwrap();
    let request = block_on(pending).unwrap();
    assert_eq!(request.query(), &query);
    assert_eq!(request.response(), Some(&answer));
}

#[test]
fn server_refuses_responses_as_queries() {
    let catalog = RequestCatalog::standard(ProtocolConfig::default()).unwrap();
    let bytes = address_response(5);
    assert!(matches!(
        catalog.read_query(&bytes),
        Err(ProtocolError::UnknownSignature(_))
    ));
}

#[test]
fn request_registered_twice_is_rejected() {
    let mut catalog = RequestCatalog::standard(ProtocolConfig::default()).unwrap();
    assert!(matches!(
        catalog.register::<AppUpdateCheckQuery>(),
        Err(CatalogError::DuplicateSignature {
            existing: "AppUpdateCheck",
            ..
        })
    ));
}

#[test]
fn request_signatures_are_distinct() {
    let descriptors = [
        GetServerFeaturesQuery::DESCRIPTOR,
        GetExternalAddressQuery::DESCRIPTOR,
        AppUpdateCheckQuery::DESCRIPTOR,
    ];
    let mut signatures: Vec<_> = descriptors
        .iter()
        .flat_map(|d| [d.query_signature, d.response_signature])
        .collect();
    signatures.sort_by_key(|s| s.raw());
    signatures.dedup();
    assert_eq!(signatures.len(), 6);
}

#[test]
fn largest_features_response_fits_default_config() {
    let config = ProtocolConfig::default();
    let catalog = RequestCatalog::standard(config).unwrap();
    let mut tracker = RequestTracker::with_ids(IdGenerator::starting_at(1), config);

    let mut largest = GetServerFeaturesResponse {
        features: (0..MAX_FEATURES)
            .map(|i| {
                Feature::new(
                    format!("{:0>width$}", i, width = MAX_STRING_LENGTH),
                    VersionRange::single(1),
                )
            })
            .collect(),
    };

    let (query, pending) = tracker
        .send(GetServerFeaturesRequest::new(GetServerFeaturesQuery), 1)
        .unwrap();
    let incoming = catalog.read_query(&query).unwrap();
    let reply = incoming
        .respond::<GetServerFeaturesQuery>(&mut largest, 1)
        .unwrap();
    // header, count, then per feature: length, identifier, min, max
    assert_eq!(reply.len(), 6 + 1 + MAX_FEATURES * (1 + MAX_STRING_LENGTH + 2));

    tracker.handle_response(&reply, 1).unwrap();
    let response = block_on(pending).unwrap().into_response().unwrap();
    assert_eq!(response, largest);
}
