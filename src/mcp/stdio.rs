//! Newline-delimited JSON-RPC over stdin/stdout
//!
//! One message (or batch) per line in, one response line out. Notifications
//! produce no output.

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use crate::mcp::rpc::json_rpc_error;
use crate::mcp::server::handle_json_rpc_payload;
use crate::AppState;

pub async fn serve_stdio(state: AppState) -> std::io::Result<()> {
    info!("stdio transport starting");
    serve_lines(&state, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;
    info!("stdin closed, stdio transport stopping");
    Ok(())
}

pub async fn serve_lines<R, W>(state: &AppState, mut reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buffer = Vec::new();
    loop {
        buffer.clear();
        if reader.read_until(b'\n', &mut buffer).await? == 0 {
            return Ok(());
        }

        let response = match std::str::from_utf8(&buffer) {
            Ok(line) => handle_line(state, line).await,
            Err(err) => {
                warn!(error = %err, "discarding stdin line that is not utf-8");
                Some(json_rpc_error(None, -32700, "Parse error"))
            }
        };
        let Some(response) = response else {
            continue;
        };

        let mut encoded = serde_json::to_string(&response)?;
        encoded.push('\n');
        writer.write_all(encoded.as_bytes()).await?;
        writer.flush().await?;
    }
}

pub async fn handle_line(state: &AppState, line: &str) -> Option<Value> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(line) {
        Ok(payload) => handle_json_rpc_payload(state, payload).await,
        Err(_) => Some(json_rpc_error(None, -32700, "Parse error")),
    }
}
