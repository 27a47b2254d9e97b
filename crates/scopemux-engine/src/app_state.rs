//! Shared application state for the scopemux host.
//!
//! - Build the registry with the configured release policy.
//! - Build the static middleware factory and connect configured sessions.
//! - Startup errors are explicit (Result instead of panic).

use std::sync::Arc;

use serde_json::{json, Value};

use scopemux_core::error::{Result, ScopeMuxError};
use scopemux_core::protocol::rpc::JSONRPC_VERSION;
use scopemux_core::protocol::{Domain, RpcResponse, Scope};

use crate::config::EngineConfig;
use crate::pipeline::Pipeline;
use crate::registry::ScopedMiddlewareRegistry;
use crate::services::StaticResultFactory;
use crate::transport::codec::{decode, Inbound};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: EngineConfig,
    pipeline: Pipeline,
    factory: StaticResultFactory,
}

impl AppState {
    pub fn new(cfg: EngineConfig) -> Result<Self> {
        let registry = Arc::new(ScopedMiddlewareRegistry::new(cfg.engine.release_policy));
        let pipeline = Pipeline::new(registry);
        let factory = StaticResultFactory::from_config(&cfg)?;

        for sess in &cfg.sessions {
            let scopes = sess
                .scopes
                .iter()
                .map(|s| Scope::parse(s))
                .collect::<Result<Vec<_>>>()?;
            pipeline
                .connect(&Domain::new(sess.domain.as_str()), &scopes, &factory)
                .map_err(|e| {
                    ScopeMuxError::BadRequest(format!(
                        "session connect failed (domain={}): {e}",
                        sess.domain
                    ))
                })?;
        }

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg, pipeline, factory }),
        })
    }

    pub fn cfg(&self) -> &EngineConfig {
        &self.inner.cfg
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.inner.pipeline
    }

    pub async fn handle_inbound(&self, inbound: Inbound) -> RpcResponse {
        let pipeline = &self.inner.pipeline;
        match inbound {
            Inbound::Call(req) => pipeline.handle(&req).await,
            Inbound::Connect { req, domain, scopes } => {
                let mut res = RpcResponse::for_request(&req);
                match pipeline.connect(&domain, &scopes, &self.inner.factory) {
                    Ok(n) => res.set_result(json!({ "connected": n })),
                    Err(e) => res.set_error(&e),
                }
                res
            }
            Inbound::Revoke { req, domain } => {
                let mut res = RpcResponse::for_request(&req);
                let n = pipeline.disconnect(domain.as_str());
                res.set_result(json!({ "released": n }));
                res
            }
        }
    }

    /// Decode one line, run it, and encode the response.
    pub async fn handle_text(&self, line: &str) -> Result<String> {
        let res = match decode(line) {
            Ok(inbound) => self.handle_inbound(inbound).await,
            Err(e) => {
                tracing::debug!(error=%e, "undecodable request");
                decode_failure(line, &e)
            }
        };
        encode(&res)
    }

    /// Encode an error response for a line that could not be read as a request.
    pub fn reject_line(&self, e: &ScopeMuxError) -> Result<String> {
        encode(&decode_failure("", e))
    }

    /// Release every middleware. Returns how many were released.
    pub fn shutdown(&self) -> usize {
        self.inner.pipeline.shutdown()
    }
}

fn encode(res: &RpcResponse) -> Result<String> {
    serde_json::to_string(res)
        .map_err(|e| ScopeMuxError::Internal(format!("response encode failed: {e}")))
}

// Best effort: echo the id back if the line is at least a JSON object.
fn decode_failure(line: &str, e: &ScopeMuxError) -> RpcResponse {
    let id = serde_json::from_str::<Value>(line)
        .ok()
        .and_then(|v| v.get("id").cloned())
        .unwrap_or(Value::Null);
    let mut res = RpcResponse {
        jsonrpc: JSONRPC_VERSION.to_string(),
        id,
        result: None,
        error: None,
    };
    res.set_error(e);
    res
}
