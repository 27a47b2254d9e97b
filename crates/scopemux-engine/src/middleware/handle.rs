use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use scopemux_core::error::Result;
use scopemux_core::protocol::{RpcRequest, RpcResponse, Scope};

/// Next stage of a request pipeline.
#[async_trait]
pub trait Downstream: Send + Sync {
    async fn run(&self, req: &RpcRequest, res: &mut RpcResponse) -> Result<()>;
}

/// Per-scope middleware: an invoke capability plus a teardown capability.
///
/// `handle` may answer the request by filling `res`, or pass it on through
/// `next`. `release` is called by the registry exactly once, when the last
/// reference to the scope goes away.
#[async_trait]
pub trait ScopedMiddleware: Send + Sync {
    async fn handle(
        &self,
        req: &RpcRequest,
        res: &mut RpcResponse,
        next: &dyn Downstream,
    ) -> Result<()>;

    fn release(&self);
}

/// A middleware bound to the scope it serves.
pub struct MiddlewareHandle {
    scope: Scope,
    inner: Arc<dyn ScopedMiddleware>,
}

impl MiddlewareHandle {
    pub fn new(scope: Scope, inner: Arc<dyn ScopedMiddleware>) -> Self {
        Self { scope, inner }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub(crate) fn middleware(&self) -> Arc<dyn ScopedMiddleware> {
        Arc::clone(&self.inner)
    }

    /// Consumes the handle so a retired entry cannot be released twice.
    pub(crate) fn release(self) {
        self.inner.release();
    }
}

impl fmt::Debug for MiddlewareHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareHandle")
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// Builds the middleware for a scope. The registry never constructs handlers.
pub trait MiddlewareFactory: Send + Sync {
    fn build(&self, scope: &Scope) -> Result<MiddlewareHandle>;
}
