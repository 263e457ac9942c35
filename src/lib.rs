//! Nora POS backend.
//!
//! Holds the shop's catalog, cart, sale ledger, debts and shift drafts in one
//! in-process store mirrored to SQLite, and exposes it as named JSON commands
//! (see [`commands::COMMANDS`]). The binary serves those commands as
//! newline-delimited JSON over stdin/stdout.

use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod analytics;
mod backup;
mod cart;
mod catalog;
mod checkout;
pub mod commands;
mod data_helpers;
mod db;
mod debts;
mod diagnostics;
mod error;
mod models;
mod print;
mod receipt_renderer;
mod reducer;
mod reports;
mod settings;
mod shifts;
mod store;

pub use error::PosError;
pub use store::AppStore;

pub(crate) fn parse_channel_payload(arg0: Option<Value>, arg1: Option<Value>) -> Option<Value> {
    match (arg0, arg1) {
        (Some(Value::Object(mut obj0)), Some(Value::Object(obj1))) => {
            for (k, v) in obj1 {
                obj0.insert(k, v);
            }
            Some(Value::Object(obj0))
        }
        (Some(v), _) => Some(v),
        (None, v) => v,
    }
}

pub(crate) fn value_str(v: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(s) = v.get(*key).and_then(|x| x.as_str()) {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

/// One line on stdin.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BridgeRequest {
    #[serde(default)]
    id: Value,
    #[serde(alias = "cmd")]
    command: String,
    #[serde(default)]
    payload: Option<Value>,
    /// Extra fields merged over an object payload.
    #[serde(default)]
    options: Option<Value>,
}

async fn handle_line(store: &AppStore, line: &str) -> Value {
    let request: BridgeRequest = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "Malformed bridge request");
            return json!({ "id": Value::Null, "ok": false, "error": format!("Malformed request: {e}") });
        }
    };
    let payload = parse_channel_payload(request.payload, request.options);
    match commands::invoke(store, &request.command, payload).await {
        Ok(result) => json!({ "id": request.id, "ok": true, "result": result }),
        Err(error) => json!({ "id": request.id, "ok": false, "error": error }),
    }
}

/// Answer each request line with one response line until the reader closes.
pub async fn serve<R, W>(store: &AppStore, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(store, &line).await;
        writer.write_all(response.to_string().as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}

// ============================================================================
// App entry point
// ============================================================================

pub async fn run() -> anyhow::Result<()> {
    let data_dir = diagnostics::resolve_data_dir();

    // Initialize structured logging (stderr + rolling file); stdout carries
    // the command protocol.
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,nora_pos_lib=debug"));

    let log_dir = diagnostics::get_log_dir(&data_dir);
    diagnostics::prune_old_logs(&log_dir);
    std::fs::create_dir_all(&log_dir).ok();

    let file_appender =
        tracing_appender::rolling::daily(&log_dir, diagnostics::LOG_FILE_PREFIX);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!(
        data_dir = %data_dir.display(),
        "Starting Nora POS v{}",
        env!("CARGO_PKG_VERSION")
    );

    let db_state = db::init(&data_dir).map_err(anyhow::Error::msg)?;
    let store = AppStore::open(db_state, &data_dir);

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    serve(&store, stdin, tokio::io::stdout()).await?;

    info!("Input closed, shutting down");
    Ok(())
}
