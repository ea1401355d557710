//! End-to-end engine behavior: readiness, write scheduling, debounce,
//! and failure backoff.

mod common;

use common::{valid_response, ScriptedTransport};
use pretty_assertions::assert_eq;
use spalink_core::demo::DemoController;
use spalink_core::engine::{EngineConfig, SpaLink, TickOutcome};
use spalink_core::protocol::ProtocolError;
use spalink_core::registers::{DecodedValue, PropertyId};
use spalink_core::scheduler::{DEBOUNCE_WINDOW, SHORT_RETRY_INTERVAL};
use std::time::{Duration, Instant};

fn engine_with_demo() -> SpaLink<DemoController> {
    SpaLink::new(DemoController::with_seed(42), EngineConfig::default())
}

#[test]
fn first_valid_poll_makes_engine_ready() {
    let mut engine = engine_with_demo();
    assert!(!engine.is_ready());

    let outcome = engine.tick(Instant::now());
    assert!(matches!(outcome, TickOutcome::Polled { .. }));
    assert!(engine.is_ready());

    let target = engine.get_value(PropertyId::TargetTemperature).unwrap();
    assert_eq!(
        target,
        DecodedValue::Scaled {
            raw: 380,
            divisor: 10
        }
    );
    assert_eq!(engine.counters().polls_ok, 1);
}

#[test]
fn rejected_first_frame_keeps_engine_not_ready() {
    let mut transport = ScriptedTransport::new();
    let mut bad = common::frame_fields("SV2");
    bad[0] = "XX".to_string();
    transport.push_response(common::render(&bad));

    let mut engine = SpaLink::new(transport, EngineConfig::default());
    let outcome = engine.tick(Instant::now());
    assert!(matches!(outcome, TickOutcome::PollFailed(_)));
    assert!(!engine.is_ready());
    assert_eq!(engine.get_value(PropertyId::WaterTemperature), None);
}

#[test]
fn acknowledged_write_applies_immediately_and_defers_poll() {
    let mut engine = engine_with_demo();
    let start = Instant::now();
    engine.tick(start); // initial poll

    engine
        .request_write(PropertyId::TargetTemperature, 215)
        .unwrap();
    assert_eq!(engine.pending_writes(), 1);

    let now = start + Duration::from_millis(100);
    let outcome = engine.tick(now);
    assert!(matches!(
        outcome,
        TickOutcome::Wrote(Some(PropertyId::TargetTemperature))
    ));
    assert_eq!(
        engine.get_value(PropertyId::TargetTemperature),
        Some(DecodedValue::Scaled {
            raw: 215,
            divisor: 10
        })
    );
    assert!(engine.is_dirty(PropertyId::TargetTemperature));

    // Next poll is deferred by the debounce window, not the steady interval
    assert!(matches!(
        engine.tick(now + DEBOUNCE_WINDOW - Duration::from_millis(1)),
        TickOutcome::Idle
    ));
    let outcome = engine.tick(now + DEBOUNCE_WINDOW);
    assert!(matches!(outcome, TickOutcome::Polled { .. }));
    // The confirming frame clears the dirty flag
    assert!(!engine.is_dirty(PropertyId::TargetTemperature));
    assert_eq!(
        engine.get_value(PropertyId::TargetTemperature),
        Some(DecodedValue::Scaled {
            raw: 215,
            divisor: 10
        })
    );
}

#[test]
fn nak_write_leaves_value_unchanged() {
    let mut engine = engine_with_demo();
    let start = Instant::now();
    engine.tick(start);
    let before = engine.get_value(PropertyId::TargetTemperature);

    // Demo controller refuses out-of-range writes with "ERR"
    engine.request_raw_write("W40:999", "999");
    let outcome = engine.tick(start + Duration::from_millis(100));
    match outcome {
        TickOutcome::WriteFailed(None, ProtocolError::WriteNotAcknowledged { actual, .. }) => {
            assert_eq!(actual, "ERR");
        }
        other => panic!("expected WriteFailed, got {other:?}"),
    }
    assert_eq!(engine.get_value(PropertyId::TargetTemperature), before);
    assert_eq!(engine.counters().writes_failed, 1);
}

#[test]
fn burst_of_writes_drains_fifo_before_polling() {
    let mut engine = engine_with_demo();
    let start = Instant::now();
    engine.tick(start);

    engine
        .request_write(PropertyId::TargetTemperature, 210)
        .unwrap();
    engine.request_write(PropertyId::LightsOn, true).unwrap();

    let t1 = start + Duration::from_millis(50);
    assert!(matches!(
        engine.tick(t1),
        TickOutcome::Wrote(Some(PropertyId::TargetTemperature))
    ));
    // Second write drains inside the first write's debounce window
    let t2 = t1 + Duration::from_millis(50);
    assert!(matches!(
        engine.tick(t2),
        TickOutcome::Wrote(Some(PropertyId::LightsOn))
    ));
    assert_eq!(engine.pending_writes(), 0);
    assert_eq!(engine.counters().writes_ok, 2);
}

#[test]
fn consecutive_timeouts_use_short_retry_interval() {
    // Transport that never answers anything
    let transport = ScriptedTransport::new();
    let mut engine = SpaLink::new(transport, EngineConfig::default());

    let mut now = Instant::now();
    for expected in 1..=3u32 {
        let outcome = engine.tick(now);
        assert!(matches!(
            outcome,
            TickOutcome::PollFailed(ProtocolError::Timeout)
        ));
        assert_eq!(engine.consecutive_failures(), expected);

        // Not due again before the short retry interval...
        assert!(matches!(
            engine.tick(now + SHORT_RETRY_INTERVAL - Duration::from_millis(1)),
            TickOutcome::Idle
        ));
        // ...but due exactly at it, well before the steady interval
        now += SHORT_RETRY_INTERVAL;
    }
    assert_eq!(engine.counters().polls_failed, 3);
}

#[test]
fn recovery_resets_failure_count_and_steady_interval() {
    let mut transport = ScriptedTransport::new();
    // First poll times out (no response), second succeeds
    transport.push_response(Vec::new());
    transport.push_response(valid_response("SV2"));

    let mut engine = SpaLink::new(transport, EngineConfig::default());
    let start = Instant::now();

    assert!(matches!(engine.tick(start), TickOutcome::PollFailed(_)));
    assert_eq!(engine.consecutive_failures(), 1);

    let retry = start + SHORT_RETRY_INTERVAL;
    assert!(matches!(engine.tick(retry), TickOutcome::Polled { .. }));
    assert_eq!(engine.consecutive_failures(), 0);

    // Next poll now follows the steady-state interval
    assert!(matches!(
        engine.tick(retry + Duration::from_secs(29)),
        TickOutcome::Idle
    ));
    assert!(!matches!(
        engine.tick(retry + Duration::from_secs(30)),
        TickOutcome::Idle
    ));
}

#[test]
fn listener_sees_write_then_confirmation_once() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let mut engine = engine_with_demo();
    let fired = Arc::new(AtomicUsize::new(0));
    let fired2 = fired.clone();
    engine.subscribe(
        PropertyId::TargetTemperature,
        Box::new(move |_, _| {
            fired2.fetch_add(1, Ordering::SeqCst);
        }),
    );

    let start = Instant::now();
    engine.tick(start); // poll: 380 -> one notification
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    engine
        .request_write(PropertyId::TargetTemperature, 215)
        .unwrap();
    engine.tick(start + Duration::from_millis(10)); // ack: 215 -> second
    assert_eq!(fired.load(Ordering::SeqCst), 2);

    // Confirming poll carries the same 215: no third notification
    engine.tick(start + Duration::from_millis(10) + DEBOUNCE_WINDOW);
    assert_eq!(fired.load(Ordering::SeqCst), 2);
}

#[test]
fn byte_counters_accumulate_over_traffic() {
    let mut engine = engine_with_demo();
    let start = Instant::now();

    engine.tick(start); // initial poll
    let after_poll = engine.counters();
    assert_eq!(after_poll.tx_bytes, 4); // "RF:\n"
    // A full SV3 frame plus the flushed tail: well over 200 bytes
    assert!(after_poll.rx_bytes > 200, "rx={}", after_poll.rx_bytes);

    engine
        .request_write(PropertyId::TargetTemperature, 215)
        .unwrap();
    engine.tick(start + Duration::from_millis(10));
    let after_write = engine.counters();
    assert_eq!(after_write.tx_bytes, after_poll.tx_bytes + 8); // "W40:215\n"
    assert_eq!(after_write.rx_bytes, after_poll.rx_bytes + 4); // "215\r"
}

#[test]
fn invalid_write_requests_are_rejected_up_front() {
    let mut engine = engine_with_demo();
    let err = engine
        .request_write(PropertyId::WaterTemperature, 300)
        .unwrap_err();
    assert!(matches!(err, ProtocolError::InvalidWrite(_)), "{err}");

    let err = engine
        .request_write(PropertyId::TargetTemperature, 999)
        .unwrap_err();
    assert!(matches!(err, ProtocolError::InvalidWrite(_)), "{err}");
    assert_eq!(engine.pending_writes(), 0);
}
