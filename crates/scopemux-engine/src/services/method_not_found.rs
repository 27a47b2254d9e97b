use async_trait::async_trait;

use scopemux_core::error::{Result, ScopeMuxError};
use scopemux_core::protocol::{RpcRequest, RpcResponse};

use crate::middleware::Downstream;

/// Terminal stage: anything that reaches it is answered with -32601.
#[derive(Debug, Default)]
pub struct MethodNotFound;

#[async_trait]
impl Downstream for MethodNotFound {
    async fn run(&self, req: &RpcRequest, res: &mut RpcResponse) -> Result<()> {
        if !res.is_complete() {
            res.set_error(&ScopeMuxError::MethodNotFound(req.method.clone()));
        }
        Ok(())
    }
}
