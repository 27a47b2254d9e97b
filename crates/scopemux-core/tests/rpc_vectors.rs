//! JSON-RPC envelope vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;

use serde_json::json;

use scopemux_core::error::RpcCode;
use scopemux_core::protocol::{RpcRequest, RpcResponse, Scope, ScopedRequest};
use scopemux_core::ScopeMuxError;

fn load(name: &str) -> String {
    fs::read_to_string(format!("tests/vectors/{name}")).unwrap()
}

#[test]
fn parse_request_min() {
    let req: RpcRequest = serde_json::from_str(&load("request_min.json")).unwrap();
    assert_eq!(req.jsonrpc, "2.0");
    assert_eq!(req.method, "eth_chainId");
    assert!(req.id.is_null());
    assert!(req.params.is_none());
    assert!(ScopedRequest::scope(&req).is_none());
}

#[test]
fn parse_request_full() {
    let req: RpcRequest = serde_json::from_str(&load("request_full.json")).unwrap();
    assert_eq!(req.id, json!(42));
    assert_eq!(ScopedRequest::scope(&req), Some(&Scope::new("eip155:1")));
    assert_eq!(req.origin.as_deref(), Some("https://site-a.example"));
    let raw = req.params.unwrap();
    assert!(raw.get().contains("latest"));
}

#[test]
fn unknown_fields_are_rejected() {
    let res = serde_json::from_str::<RpcRequest>(&load("request_unknown_field.json"));
    assert!(res.is_err());
}

#[test]
fn response_serializes_only_filled_member() {
    let req = RpcRequest::new(7, "eth_chainId");
    let mut res = RpcResponse::for_request(&req);
    assert!(!res.is_complete());

    res.set_result(json!("0x1"));
    assert_eq!(
        serde_json::to_value(&res).unwrap(),
        json!({"jsonrpc": "2.0", "id": 7, "result": "0x1"})
    );

    res.set_error(&ScopeMuxError::MethodNotFound("eth_foo".into()));
    let v = serde_json::to_value(&res).unwrap();
    assert!(v.get("result").is_none());
    assert_eq!(v["error"]["code"], json!(-32601));
}

#[test]
fn error_codes_are_stable() {
    assert_eq!(ScopeMuxError::BadRequest("x".into()).rpc_code(), RpcCode::InvalidRequest);
    assert_eq!(ScopeMuxError::InvalidScope("x".into()).rpc_code().as_i64(), -32602);
    assert_eq!(
        ScopeMuxError::UnregisteredRelease { scope: "eip155:1".into(), domain: "a".into() }
            .rpc_code()
            .as_i64(),
        -32603
    );
}
