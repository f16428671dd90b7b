//! Inbound envelope vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use amonitor_core::protocol::decode;
use amonitor_core::protocol::payload::ActionRequest;

mod vector_loader;
use vector_loader::load;

#[test]
fn decode_vectors() {
    let files = [
        "action_min.json",
        "action_full.json",
        "action_no_payload.json",
        "action_params_not_object.json",
        "chat.json",
        "missing_type.json",
        "action_ts_float.json",
        "action_ts_null.json",
        "action_ts_string.json",
        "action_ts_garbage.json",
        "action_msg_id_null.json",
        "action_msg_id_number.json",
        "type_null.json",
        "bad_not_json.json",
        "bad_truncated.json",
        "bad_array.json",
        "bad_payload_scalar.json",
    ];

    for f in files {
        let v = load(f);
        let res = decode(&v.text);

        if let Some(err) = v.expect_error {
            let e = res.expect_err("expected error");
            assert_eq!(e.client_code().as_str(), err.code, "vector={}", v.description);
            continue;
        }

        let env = res.expect("expected ok envelope");
        let ex = v.expect.expect("missing expect block");
        let req = ActionRequest::from_envelope(&env);

        assert_eq!(env.msg_id, ex["msg_id"].as_str().unwrap(), "vector={}", v.description);
        assert_eq!(env.msg_type.as_str(), ex["type"].as_str().unwrap(), "vector={}", v.description);
        assert_eq!(req.action, ex["action"].as_str().unwrap(), "vector={}", v.description);
        assert_eq!(
            req.params.len() as u64,
            ex["params_len"].as_u64().unwrap(),
            "vector={}",
            v.description
        );
        assert_eq!(env.trace_id.as_deref(), ex["trace_id"].as_str(), "vector={}", v.description);
        assert_eq!(env.target_id.as_deref(), ex["target_id"].as_str(), "vector={}", v.description);

        if let Some(ts) = ex.get("timestamp") {
            assert_eq!(env.timestamp, ts.as_i64().unwrap(), "vector={}", v.description);
        }
        if let Some(keys) = ex.get("payload_keys") {
            let mut got: Vec<&str> = env.payload.keys().map(String::as_str).collect();
            got.sort_unstable();
            let want: Vec<&str> = keys
                .as_array()
                .unwrap()
                .iter()
                .map(|k| k.as_str().unwrap())
                .collect();
            assert_eq!(got, want, "vector={}", v.description);
        }
    }
}

#[test]
fn only_action_type_is_action() {
    let action = load("action_min.json");
    assert!(decode(&action.text).unwrap().is_action());

    let chat = load("chat.json");
    assert!(!decode(&chat.text).unwrap().is_action());
}

#[test]
fn odd_header_types_still_yield_an_action() {
    for f in ["action_ts_float.json", "action_ts_string.json", "action_msg_id_number.json"] {
        let env = decode(&load(f).text).unwrap();
        assert!(env.is_action(), "{f}");
        assert_eq!(ActionRequest::from_envelope(&env).action, "restart", "{f}");
    }
    assert!(!decode(&load("type_null.json").text).unwrap().is_action());
}
