//! Outbound envelope shape tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use serde_json::{json, Value};

use amonitor_core::protocol::payload::ActionOutcome;
use amonitor_core::protocol::{decode, encode};
use amonitor_core::Envelope;

fn to_value(env: &Envelope) -> Value {
    serde_json::from_str(&encode(env).unwrap()).unwrap()
}

#[test]
fn heartbeat_has_required_fields() {
    let v = to_value(&Envelope::heartbeat("svc-a"));
    assert_eq!(v["type"], "heartbeat");
    assert_eq!(v["target_id"], "svc-a");
    assert_eq!(v["payload"], json!({"target_id": "svc-a", "status": "up"}));
    assert!(!v["msg_id"].as_str().unwrap().is_empty());
    assert!(v["timestamp"].as_i64().unwrap() > 0);
    assert!(v.get("trace_id").is_none(), "absent trace_id must be omitted");
}

#[test]
fn ack_echoes_request_ids() {
    let req = decode(
        r#"{"msg_id":"m1","trace_id":"t1","type":"action","payload":{"action":"restart","params":{}}}"#,
    )
    .unwrap();
    let ack = Envelope::action_ack("svc-a", &req, &ActionOutcome::success("done"));
    let v = to_value(&ack);

    assert_eq!(v["type"], "action_ack");
    assert_eq!(v["trace_id"], "t1");
    assert_eq!(
        v["payload"],
        json!({"action_msg_id": "m1", "success": true, "message": "done"})
    );
    assert_ne!(v["msg_id"], "m1", "ack carries its own msg_id");
}

#[test]
fn event_and_error_payloads() {
    let ev = to_value(&Envelope::event("svc-a", "deploy_done", json!({"v": "1.2"})));
    assert_eq!(ev["type"], "event");
    assert_eq!(
        ev["payload"],
        json!({"target_id": "svc-a", "event_name": "deploy_done", "data": {"v": "1.2"}})
    );

    let err = to_value(&Envelope::error("svc-a", "invalid envelope: eof"));
    assert_eq!(err["type"], "error");
    assert_eq!(err["payload"]["message"], "invalid envelope: eof");
}

#[test]
fn msg_ids_are_unique_per_envelope() {
    let a = Envelope::heartbeat("svc-a");
    let b = Envelope::heartbeat("svc-a");
    assert_ne!(a.msg_id, b.msg_id);
}
