//! Write command send and echo verification.

mod common;

use common::ScriptedTransport;
use pretty_assertions::assert_eq;
use spalink_core::protocol::{command, ProtocolError, WriteRequest};
use spalink_core::registers::{DecodedValue, PropertyId, WriteValue};
use spalink_core::store::PropertyStore;

#[test]
fn acknowledged_write_updates_store_and_marks_dirty() {
    let mut transport = ScriptedTransport::new();
    transport.push_response(b"215\r".to_vec());
    let mut store = PropertyStore::new();
    let mut request =
        WriteRequest::for_property(PropertyId::TargetTemperature, &WriteValue::Raw(215)).unwrap();

    command::send(&mut transport, &mut store, &mut request).unwrap();

    assert_eq!(transport.writes, vec!["W40:215".to_string()]);
    assert_eq!(
        store.get(PropertyId::TargetTemperature),
        Some(&DecodedValue::Scaled {
            raw: 215,
            divisor: 10
        })
    );
    assert!(store.is_dirty(PropertyId::TargetTemperature));
    assert_eq!(request.attempts, 1);
}

#[test]
fn echo_mismatch_returns_nak_and_leaves_store_untouched() {
    let mut transport = ScriptedTransport::new();
    transport.push_response(b"ERR\r".to_vec());
    let mut store = PropertyStore::new();
    let mut request =
        WriteRequest::for_property(PropertyId::TargetTemperature, &WriteValue::Raw(215)).unwrap();

    let err = command::send(&mut transport, &mut store, &mut request).unwrap_err();

    match err {
        ProtocolError::WriteNotAcknowledged { expected, actual } => {
            assert_eq!(expected, "215");
            assert_eq!(actual, "ERR");
        }
        other => panic!("expected WriteNotAcknowledged, got {other}"),
    }
    assert_eq!(store.get(PropertyId::TargetTemperature), None);
    assert!(!store.is_dirty(PropertyId::TargetTemperature));
}

#[test]
fn silent_controller_returns_timeout() {
    let mut transport = ScriptedTransport::new();
    // No scripted response at all
    let mut store = PropertyStore::new();
    let mut request =
        WriteRequest::for_property(PropertyId::LightsOn, &WriteValue::Boolean(true)).unwrap();

    let err = command::send(&mut transport, &mut store, &mut request).unwrap_err();
    assert!(matches!(err, ProtocolError::Timeout), "{err}");
    assert_eq!(store.get(PropertyId::LightsOn), None);
}

#[test]
fn fixed_token_acknowledgment() {
    let mut transport = ScriptedTransport::new();
    transport.push_response(b"OK\r".to_vec());
    let mut store = PropertyStore::new();
    let mut request = WriteRequest::for_property(
        PropertyId::ClockTime,
        &WriteValue::Text("13:50".to_string()),
    )
    .unwrap();

    command::send(&mut transport, &mut store, &mut request).unwrap();
    assert_eq!(transport.writes, vec!["W41:13:50".to_string()]);
    assert_eq!(
        store.get(PropertyId::ClockTime).unwrap().to_string(),
        "13:50"
    );
}

#[test]
fn raw_request_does_not_touch_store() {
    let mut transport = ScriptedTransport::new();
    transport.push_response(b"1\r".to_vec());
    let mut store = PropertyStore::new();
    let mut request = WriteRequest::raw("W104:1", "1");

    command::send(&mut transport, &mut store, &mut request).unwrap();
    assert_eq!(store.get(PropertyId::Pump1Status), None);
}

#[test]
fn attempts_accumulate_across_sends() {
    let mut transport = ScriptedTransport::new();
    transport.push_response(b"ERR\r".to_vec());
    transport.push_response(b"215\r".to_vec());
    let mut store = PropertyStore::new();
    let mut request =
        WriteRequest::for_property(PropertyId::TargetTemperature, &WriteValue::Raw(215)).unwrap();

    assert!(command::send(&mut transport, &mut store, &mut request).is_err());
    assert!(command::send(&mut transport, &mut store, &mut request).is_ok());
    assert_eq!(request.attempts, 2);
}
