//! Per-consumer request pipeline.
//!
//! A `Pipeline` owns the registry handle, the terminal stage, and metrics.
//! Construct one per consumer (connection, host process) and pass it to
//! whatever drives requests; there is no global instance.

use std::sync::Arc;
use std::time::Instant;

use scopemux_core::error::Result;
use scopemux_core::protocol::{Domain, RpcRequest, RpcResponse, Scope};

use crate::middleware::{Downstream, MiddlewareFactory};
use crate::obs::EngineMetrics;
use crate::registry::ScopedMiddlewareRegistry;
use crate::services::MethodNotFound;

pub struct Pipeline {
    registry: Arc<ScopedMiddlewareRegistry>,
    terminal: Arc<dyn Downstream>,
    metrics: Arc<EngineMetrics>,
}

impl Pipeline {
    pub fn new(registry: Arc<ScopedMiddlewareRegistry>) -> Self {
        let metrics = registry.metrics();
        Self {
            registry,
            terminal: Arc::new(MethodNotFound),
            metrics,
        }
    }

    /// Replace the stage that runs when no middleware answers.
    pub fn with_terminal(mut self, terminal: Arc<dyn Downstream>) -> Self {
        self.terminal = terminal;
        self
    }

    pub fn registry(&self) -> Arc<ScopedMiddlewareRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn metrics(&self) -> Arc<EngineMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Run one request through the registry. Errors become JSON-RPC error objects.
    pub async fn handle(&self, req: &RpcRequest) -> RpcResponse {
        let started = Instant::now();
        let mut res = RpcResponse::for_request(req);

        if let Err(e) = self.registry.dispatch(req, &mut res, self.terminal.as_ref()).await {
            tracing::debug!(method=%req.method, error=%e, "dispatch failed");
            res.set_error(&e);
        }

        self.metrics.dispatch_duration.observe(&[], started.elapsed());
        res
    }

    /// Register `domain` on each scope with a handle built by `factory`.
    ///
    /// All-or-nothing: if the factory fails, references already taken by this
    /// call are released before the error is returned.
    pub fn connect(
        &self,
        domain: &Domain,
        scopes: &[Scope],
        factory: &dyn MiddlewareFactory,
    ) -> Result<usize> {
        let mut taken: Vec<&Scope> = Vec::with_capacity(scopes.len());
        for scope in scopes {
            match factory.build(scope) {
                Ok(handle) => {
                    self.registry.register(scope.clone(), domain.clone(), handle);
                    taken.push(scope);
                }
                Err(e) => {
                    for s in taken {
                        if let Err(re) = self.registry.release(s.as_str(), domain.as_str()) {
                            tracing::warn!(scope=%s, %domain, error=%re, "rollback release failed");
                        }
                    }
                    return Err(e);
                }
            }
        }
        tracing::info!(%domain, scopes = scopes.len(), "domain connected");
        Ok(scopes.len())
    }

    /// Drop every reference `domain` holds.
    pub fn disconnect(&self, domain: &str) -> usize {
        let n = self.registry.release_all_for_domain(domain);
        tracing::info!(%domain, scopes = n, "domain disconnected");
        n
    }

    /// Release every handler in the registry.
    pub fn shutdown(&self) -> usize {
        self.registry.release_all()
    }
}
