//! Line transport: one JSON-RPC request per input line, one response per
//! output line. Blank lines are skipped.
//!
//! Lines are read as raw bytes; a line that is not UTF-8 gets an
//! invalid-request response and the loop keeps going.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use scopemux_core::error::{Result, ScopeMuxError};

use crate::app_state::AppState;

fn io_err(e: std::io::Error) -> ScopeMuxError {
    ScopeMuxError::Internal(format!("stdio: {e}"))
}

/// Serve until `input` reaches EOF. Returns the number of requests answered.
pub async fn serve<R, W>(state: &AppState, mut input: R, mut output: W) -> Result<u64>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();
    let mut served = 0u64;

    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf).await.map_err(io_err)? == 0 {
            break;
        }

        let out = match std::str::from_utf8(&buf) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                state.handle_text(line).await?
            }
            Err(e) => {
                tracing::debug!(error=%e, "non-utf8 request line");
                let err = ScopeMuxError::BadRequest(format!("request is not utf-8: {e}"));
                state.reject_line(&err)?
            }
        };

        output.write_all(out.as_bytes()).await.map_err(io_err)?;
        output.write_all(b"\n").await.map_err(io_err)?;
        output.flush().await.map_err(io_err)?;
        served += 1;
    }

    tracing::debug!(served, "input closed");
    Ok(served)
}
