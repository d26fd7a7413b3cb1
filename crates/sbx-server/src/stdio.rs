//! Newline-delimited JSON-RPC over stdio.
//!
//! Each input line is one request; each request with an `id` member, even
//! a `null` one, gets exactly one response line. Requests without an `id`
//! member are notifications and get no response. stdout carries nothing
//! but responses, so logging must go to stderr or a file.

use sbx_protocol::{HandlerResult, RpcError, RpcRequest, RpcResponse};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

/// Trait implemented by the server to handle incoming requests.
/// The transport calls this for every well-formed JSON-RPC request.
pub trait RequestHandler: Send + Sync {
    fn handle_request(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> impl std::future::Future<Output = HandlerResult> + Send;
}

/// Serve requests from stdin until it is closed.
pub async fn serve_stdio<H: RequestHandler>(handler: &H) -> std::io::Result<usize> {
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    info!("Serving JSON-RPC on stdio");
    serve_lines(handler, stdin, stdout).await
}

/// Serve requests from `reader` until EOF, writing responses to `writer`.
/// Returns the number of responses written.
pub async fn serve_lines<H, R, W>(handler: &H, reader: R, mut writer: W) -> std::io::Result<usize>
where
    H: RequestHandler,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut written = 0;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let Some(response) = handle_message(&line, handler).await else {
            continue;
        };
        writer.write_all(response.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        written += 1;
    }

    debug!("Input closed after {written} responses");
    Ok(written)
}

/// Handle one raw message. `None` for notifications.
pub async fn handle_message<H: RequestHandler>(text: &str, handler: &H) -> Option<String> {
    let parsed: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            warn!("Unparseable request: {e}");
            return Some(encode(RpcResponse::error(None, RpcError::parse_error("Failed to parse JSON"))));
        }
    };

    let request = match RpcRequest::from_value(parsed) {
        Ok(request) => request,
        Err((id, err)) => {
            warn!("Invalid request: {}", err.message);
            return Some(encode(RpcResponse::error(id, err)));
        }
    };

    let result = handler.handle_request(&request.method, request.params).await;
    if !request.expects_reply {
        return None;
    }
    Some(encode(RpcResponse::from_result(request.id, result)))
}

fn encode(response: RpcResponse) -> String {
    serde_json::to_string(&response).unwrap_or_else(|e| {
        format!(r#"{{"jsonrpc":"2.0","id":null,"error":{{"code":-32603,"message":"Failed to encode response: {e}"}}}}"#)
    })
}
