use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use scopemux_core::error::{Result, ScopeMuxError};
use scopemux_core::protocol::{RpcRequest, RpcResponse, Scope};

use crate::config::EngineConfig;
use crate::middleware::{Downstream, MiddlewareFactory, MiddlewareHandle, ScopedMiddleware};

/// Answers a fixed set of methods for one scope; everything else goes to `next`.
pub struct StaticResultMiddleware {
    scope: Scope,
    results: BTreeMap<String, Value>,
    released: AtomicBool,
}

impl StaticResultMiddleware {
    pub fn new(scope: Scope, results: BTreeMap<String, Value>) -> Self {
        Self {
            scope,
            results,
            released: AtomicBool::new(false),
        }
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

#[async_trait]
impl ScopedMiddleware for StaticResultMiddleware {
    async fn handle(
        &self,
        req: &RpcRequest,
        res: &mut RpcResponse,
        next: &dyn Downstream,
    ) -> Result<()> {
        if self.is_released() {
            return Err(ScopeMuxError::Internal(format!(
                "middleware for {} already released",
                self.scope
            )));
        }
        match self.results.get(&req.method) {
            Some(v) => {
                res.set_result(v.clone());
                Ok(())
            }
            None => next.run(req, res).await,
        }
    }

    fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            tracing::warn!(scope=%self.scope, "static middleware released twice");
        }
    }
}

/// Builds `StaticResultMiddleware` from the `scopes` section of the config.
#[derive(Default)]
pub struct StaticResultFactory {
    tables: HashMap<Scope, BTreeMap<String, Value>>,
}

impl StaticResultFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(cfg: &EngineConfig) -> Result<Self> {
        let mut f = Self::new();
        for s in &cfg.scopes {
            f.insert(Scope::parse(&s.scope)?, s.results.clone());
        }
        Ok(f)
    }

    pub fn insert(&mut self, scope: Scope, results: BTreeMap<String, Value>) {
        self.tables.insert(scope, results);
    }
}

impl MiddlewareFactory for StaticResultFactory {
    fn build(&self, scope: &Scope) -> Result<MiddlewareHandle> {
        let results = self.tables.get(scope).cloned().ok_or_else(|| {
            ScopeMuxError::InvalidScope(format!("no middleware configured for {scope}"))
        })?;
        let mw = Arc::new(StaticResultMiddleware::new(scope.clone(), results));
        Ok(MiddlewareHandle::new(scope.clone(), mw))
    }
}
