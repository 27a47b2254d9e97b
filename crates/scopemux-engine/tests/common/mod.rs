//! Test middleware and downstreams shared by engine tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use scopemux_core::error::Result;
use scopemux_core::protocol::{RpcRequest, RpcResponse, Scope};
use scopemux_engine::{Downstream, MiddlewareHandle, ScopedMiddleware};

/// Answers every request with its own tag and counts calls/releases.
pub struct Recorder {
    pub tag: &'static str,
    pub calls: AtomicUsize,
    pub releases: AtomicUsize,
}

impl Recorder {
    pub fn new(tag: &'static str) -> Arc<Self> {
        Arc::new(Self {
            tag,
            calls: AtomicUsize::new(0),
            releases: AtomicUsize::new(0),
        })
    }

    pub fn handle_for(self: &Arc<Self>, scope: &str) -> MiddlewareHandle {
        MiddlewareHandle::new(Scope::new(scope), self.clone())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScopedMiddleware for Recorder {
    async fn handle(
        &self,
        _req: &RpcRequest,
        res: &mut RpcResponse,
        _next: &dyn Downstream,
    ) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        res.set_result(json!(self.tag));
        Ok(())
    }

    fn release(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Counts how often the continuation runs.
#[derive(Default)]
pub struct CountingNext {
    pub runs: AtomicUsize,
}

impl CountingNext {
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Downstream for CountingNext {
    async fn run(&self, _req: &RpcRequest, res: &mut RpcResponse) -> Result<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        res.set_result(json!("next"));
        Ok(())
    }
}

pub fn call(scope: &str) -> RpcRequest {
    RpcRequest::new(1, "eth_chainId").with_scope(scope)
}
