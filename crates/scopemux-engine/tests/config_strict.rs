#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use scopemux_engine::config;
use scopemux_engine::ReleasePolicy;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
engine:
  release_polcy: lenient # typo should fail
scopes:
  - scope: "eip155:1"
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.rpc_code().as_i64(), -32600);
}

#[test]
fn ok_minimal_config() {
    let ok = r#"
version: 1
scopes:
  - scope: "eip155:1"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.engine.release_policy, ReleasePolicy::Strict);
    assert!(cfg.scope("eip155:1").unwrap().results.is_empty());
    assert!(cfg.sessions.is_empty());
}

#[test]
fn lenient_policy_and_results() {
    let ok = r#"
version: 1
engine:
  release_policy: lenient
scopes:
  - scope: "eip155:1"
    results: { eth_chainId: "0x1", eth_accounts: [] }
sessions:
  - domain: "https://site-a.example"
    scopes: ["eip155:1"]
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.engine.release_policy, ReleasePolicy::Lenient);
    assert_eq!(cfg.scope("eip155:1").unwrap().results.len(), 2);
    assert_eq!(cfg.sessions[0].scopes, vec!["eip155:1".to_string()]);
}

#[test]
fn rejects_bad_version() {
    let bad = r#"
version: 2
scopes:
  - scope: "eip155:1"
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert!(matches!(err, scopemux_core::ScopeMuxError::UnsupportedVersion));
}

#[test]
fn rejects_empty_or_invalid_scopes() {
    let empty = "version: 1\n";
    assert!(config::load_from_str(empty).is_err());

    let malformed = r#"
version: 1
scopes:
  - scope: "EIP155-1"
"#;
    let err = config::load_from_str(malformed).expect_err("must fail");
    assert_eq!(err.rpc_code().as_i64(), -32602);

    let dup = r#"
version: 1
scopes:
  - scope: "eip155:1"
  - scope: "eip155:1"
"#;
    assert!(config::load_from_str(dup).is_err());
}

#[test]
fn rejects_session_on_unconfigured_scope() {
    let bad = r#"
version: 1
scopes:
  - scope: "eip155:1"
sessions:
  - domain: "https://site-a.example"
    scopes: ["eip155:10"]
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert!(err.to_string().contains("eip155:10"));
}
