//! Bridge server over newline-delimited JSON
//!
//! Each stdin line is a `BridgeFrame`; each stdout line is a `BridgeMessage`.
//! Requests run concurrently, so a `cancel-launch` can reach a launch whose
//! `launch-agents` call is still pending. Output events are pushed as they
//! arrive, interleaved with responses. A launch's events are published
//! before its response is produced, but the two travel on different paths,
//! so clients should not rely on their relative order in the stream.

use agentdock_core::{
    Bridge, BridgeErrorBody, BridgeFrame, BridgeMessage, BridgeResponse, BRIDGE_VERSION,
};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

const OUTBOUND_BUFFER: usize = 256;

pub async fn serve(bridge: Bridge) -> anyhow::Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    serve_on(Arc::new(bridge), stdin, stdout).await
}

pub async fn serve_on<R, W>(bridge: Arc<Bridge>, input: R, output: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (out_tx, out_rx) = mpsc::channel::<BridgeMessage>(OUTBOUND_BUFFER);
    let writer = tokio::spawn(write_messages(output, out_rx));

    out_tx
        .send(BridgeMessage::Hello {
            version: BRIDGE_VERSION,
        })
        .await?;

    let mut subscription = bridge.subscribe_output();
    let events_tx = out_tx.clone();
    let forwarder = tokio::spawn(async move {
        while let Some(event) = subscription.recv().await {
            if events_tx.send(BridgeMessage::Output { event }).await.is_err() {
                break;
            }
        }
    });

    info!("Serving bridge v{} on stdio", BRIDGE_VERSION);

    let mut requests = JoinSet::new();
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let frame: BridgeFrame = match serde_json::from_str(line) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Rejecting malformed frame: {}", e);
                let id = frame_id(line);
                let response = BridgeResponse::Error(BridgeErrorBody {
                    kind: "malformed".to_string(),
                    message: format!("Invalid request: {}", e),
                    exit_code: None,
                });
                out_tx.send(BridgeMessage::Response { id, response }).await?;
                continue;
            }
        };

        let bridge = Arc::clone(&bridge);
        let tx = out_tx.clone();
        requests.spawn(async move {
            let id = frame.id;
            let response = bridge.dispatch(frame.request).await;
            let message = BridgeMessage::Response {
                id: Some(id),
                response,
            };
            if tx.send(message).await.is_err() {
                debug!("Response {} dropped, output closed", id);
            }
        });
    }

    debug!("Input closed, waiting for {} pending requests", requests.len());
    while let Some(joined) = requests.join_next().await {
        if let Err(e) = joined {
            error!("Request task failed: {}", e);
        }
    }

    // Dropping the last bridge handle closes the event channel, so the
    // forwarder flushes whatever is queued and then stops.
    drop(bridge);
    if let Err(e) = forwarder.await {
        error!("Output forwarder failed: {}", e);
    }
    drop(out_tx);
    writer.await??;
    info!("Bridge server stopped");
    Ok(())
}

/// Best-effort request id from a frame that failed to parse
fn frame_id(line: &str) -> Option<u64> {
    serde_json::from_str::<serde_json::Value>(line)
        .ok()?
        .get("id")?
        .as_u64()
}

async fn write_messages<W>(mut output: W, mut rx: mpsc::Receiver<BridgeMessage>) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = rx.recv().await {
        let mut line = serde_json::to_vec(&message)?;
        line.push(b'\n');
        output.write_all(&line).await?;
        output.flush().await?;
    }
    debug!("Writer task ended");
    Ok(())
}
