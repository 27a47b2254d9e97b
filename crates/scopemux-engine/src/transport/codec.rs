//! Decode-once codec for the line transport.
//!
//! - Ordinary calls => `Inbound::Call` (params stay raw)
//! - Host control methods => `Inbound::Connect` / `Inbound::Revoke`
//!
//! Control methods name their domain with `params.origin`, falling back to
//! the request's own `origin` member.

use serde::Deserialize;

use scopemux_core::{
    error::{Result, ScopeMuxError},
    protocol::{rpc::JSONRPC_VERSION, Domain, RpcRequest, Scope},
};

/// Register `origin` on `scopes` using the configured middleware.
pub const CONTROL_CONNECT: &str = "scopemux_connect";
/// Release every reference `origin` holds.
pub const CONTROL_REVOKE_SESSION: &str = "scopemux_revokeSession";

#[derive(Debug)]
pub enum Inbound {
    Call(RpcRequest),
    Connect {
        req: RpcRequest,
        domain: Domain,
        scopes: Vec<Scope>,
    },
    Revoke {
        req: RpcRequest,
        domain: Domain,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SessionParams {
    #[serde(default)]
    origin: Option<String>,
    #[serde(default)]
    scopes: Vec<String>,
}

pub fn decode(line: &str) -> Result<Inbound> {
    let req: RpcRequest = serde_json::from_str(line)
        .map_err(|e| ScopeMuxError::BadRequest(format!("invalid request json: {e}")))?;

    if req.jsonrpc != JSONRPC_VERSION {
        return Err(ScopeMuxError::BadRequest(format!(
            "unsupported jsonrpc version: {}",
            req.jsonrpc
        )));
    }

    match req.method.as_str() {
        CONTROL_CONNECT => {
            let p = session_params(&req)?;
            let scopes = p
                .scopes
                .iter()
                .map(|s| Scope::parse(s))
                .collect::<Result<Vec<_>>>()?;
            if scopes.is_empty() {
                return Err(ScopeMuxError::InvalidScope(format!(
                    "{CONTROL_CONNECT} requires at least one scope"
                )));
            }
            let domain = session_domain(&req, p.origin)?;
            Ok(Inbound::Connect { req, domain, scopes })
        }
        CONTROL_REVOKE_SESSION => {
            let origin = match req.params {
                Some(_) => session_params(&req)?.origin,
                None => None,
            };
            let domain = session_domain(&req, origin)?;
            Ok(Inbound::Revoke { req, domain })
        }
        _ => Ok(Inbound::Call(req)),
    }
}

fn session_params(req: &RpcRequest) -> Result<SessionParams> {
    let raw = req.params.as_ref().ok_or_else(|| {
        ScopeMuxError::BadRequest(format!("{} requires params", req.method))
    })?;
    serde_json::from_str(raw.get())
        .map_err(|e| ScopeMuxError::BadRequest(format!("{} invalid params: {e}", req.method)))
}

fn session_domain(req: &RpcRequest, from_params: Option<String>) -> Result<Domain> {
    from_params
        .or_else(|| req.origin.clone())
        .filter(|o| !o.is_empty())
        .map(Domain::new)
        .ok_or_else(|| ScopeMuxError::BadRequest(format!("{} requires origin", req.method)))
}
